use axum::{
    Json,
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use thiserror::Error;

use super::DALGURAK_STATUS_HEADER;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("batch of {size} questions exceeds the limit of {max}")]
    BatchTooLarge { size: usize, max: usize },
}

#[derive(serde::Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let (status, dalgurak_status) = match &self {
            GatewayError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            GatewayError::BatchTooLarge { .. } => (StatusCode::BAD_REQUEST, "batch_too_large"),
        };

        let mut headers = HeaderMap::new();
        headers.insert(
            DALGURAK_STATUS_HEADER,
            HeaderValue::from_static(dalgurak_status),
        );

        let body = Json(ErrorResponse {
            error: self.to_string(),
            code: status.as_u16(),
        });

        (status, headers, body).into_response()
    }
}

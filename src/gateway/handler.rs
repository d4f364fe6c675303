use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};
use tracing::{debug, instrument};

use super::DALGURAK_SOURCE_HEADER;
use crate::constants::MAX_BATCH_SIZE;
use crate::engine::{QueryRequest, QuerySource};
use crate::gateway::error::GatewayError;
use crate::gateway::payload::{AskResponse, BatchRequest, BatchResponse, StatsResponse};
use crate::gateway::state::HandlerState;

/// `POST /v1/ask`. Always 200 for well-formed JSON; failures travel in `source`/`error`.
#[instrument(skip(state, payload), fields(source = tracing::field::Empty))]
pub async fn ask_handler(
    State(state): State<HandlerState>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Response, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;

    let result = state.engine.ask(&request.question).await;
    tracing::Span::current().record("source", result.source.as_str());
    debug!(execution_ms = result.execution_time.as_millis() as u64, "Ask handled");

    Ok(make_response(result.source, AskResponse::from(result)))
}

/// `POST /v1/ask/batch`. Results keep the order of `questions`.
#[instrument(skip(state, payload), fields(batch_size = tracing::field::Empty))]
pub async fn batch_handler(
    State(state): State<HandlerState>,
    payload: Result<Json<BatchRequest>, JsonRejection>,
) -> Result<Json<BatchResponse>, GatewayError> {
    let Json(request) = payload.map_err(|e| GatewayError::InvalidRequest(e.body_text()))?;

    let size = request.questions.len();
    tracing::Span::current().record("batch_size", size);
    if size > MAX_BATCH_SIZE {
        return Err(GatewayError::BatchTooLarge {
            size,
            max: MAX_BATCH_SIZE,
        });
    }

    let results = state.engine.ask_batch(request.questions).await;
    Ok(Json(BatchResponse {
        results: results.into_iter().map(AskResponse::from).collect(),
    }))
}

/// `GET /v1/stats`.
#[instrument(skip(state))]
pub async fn stats_handler(State(state): State<HandlerState>) -> Json<StatsResponse> {
    let engine = &state.engine;
    Json(StatsResponse::new(
        engine.performance_stats(),
        engine.cache_stats(),
        engine.gate().stats(),
    ))
}

pub(crate) fn make_response(source: QuerySource, body: AskResponse) -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        DALGURAK_SOURCE_HEADER,
        HeaderValue::from_static(source.as_str()),
    );
    (StatusCode::OK, headers, Json(body)).into_response()
}

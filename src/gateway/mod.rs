//! HTTP gateway (Axum) over the query engine.
//!
//! This module is primarily used by the `dalgurak` server binary.

pub mod error;
pub mod handler;
pub mod payload;
pub mod state;

#[cfg(test)]
mod handler_tests;

use axum::{
    Json, Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::HeaderValue},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub use handler::{ask_handler, batch_handler, stats_handler};
pub use state::HandlerState;

/// Response header carrying the service status (`healthy`, `ready`, error codes).
pub const DALGURAK_STATUS_HEADER: &str = "X-Dalgurak-Status";
/// Response header carrying the [`QuerySource`](crate::engine::QuerySource) of an answer.
pub const DALGURAK_SOURCE_HEADER: &str = "X-Dalgurak-Source";

pub const DALGURAK_STATUS_HEALTHY: &str = "healthy";
pub const DALGURAK_STATUS_READY: &str = "ready";
pub const DALGURAK_STATUS_CLOSED: &str = "closed";

pub fn create_router(state: HandlerState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/ready", get(ready_handler))
        .route("/v1/ask", post(ask_handler))
        .route("/v1/ask/batch", post(batch_handler))
        .route("/v1/stats", get(stats_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(serde::Serialize)]
pub struct ReadyResponse {
    pub status: &'static str,
    pub components: ComponentStatus,
}

#[derive(serde::Serialize)]
pub struct ComponentStatus {
    pub http: &'static str,
    pub gate: &'static str,
    pub generator: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Response {
    let mut headers = HeaderMap::new();
    headers.insert(
        DALGURAK_STATUS_HEADER,
        HeaderValue::from_static(DALGURAK_STATUS_HEALTHY),
    );

    (
        StatusCode::OK,
        headers,
        Json(HealthResponse { status: "ok" }),
    )
        .into_response()
}

/// Ready while the gate admits queries; 503 once it has been closed for shutdown.
#[tracing::instrument(skip(state))]
pub async fn ready_handler(State(state): State<HandlerState>) -> Response {
    let gate_open = !state.engine.gate().is_closed();

    let components = ComponentStatus {
        http: DALGURAK_STATUS_READY,
        gate: if gate_open {
            DALGURAK_STATUS_READY
        } else {
            DALGURAK_STATUS_CLOSED
        },
        generator: state.generator_mode,
    };

    let (status_code, status_msg) = if gate_open {
        (StatusCode::OK, "ok")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "closed")
    };

    let mut headers = HeaderMap::new();
    headers.insert(DALGURAK_STATUS_HEADER, HeaderValue::from_static(status_msg));

    (
        status_code,
        headers,
        Json(ReadyResponse {
            status: status_msg,
            components,
        }),
    )
        .into_response()
}

//! API route handlers
//!
//! - `transform`: the JSON transcoding endpoint
//! - `health`: liveness and readiness probes

pub mod health;
pub mod transform;

use crate::error::{ServerError, ServerResult};
use crate::state::ServerState;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;
use std::sync::Arc;

/// API version and base info (`GET /`)
pub async fn api_info(State(state): State<Arc<ServerState>>) -> ServerResult<impl IntoResponse> {
    Ok(Json(json!({
        "name": "jqgate",
        "version": env!("CARGO_PKG_VERSION"),
        "policy": state.config.pipeline.policy,
        "endpoints": [
            "POST /?filter=<expr>",
            "POST /transform?filter=<expr>",
            "/health",
            "/ready"
        ]
    })))
}

/// 404 Not Found handler
pub async fn not_found() -> ServerError {
    ServerError::NotFound
}

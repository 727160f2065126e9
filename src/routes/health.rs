use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match tokio::time::timeout(state.config.query_timeout, state.store.ping()).await {
        Ok(Ok(())) => (
            StatusCode::OK,
            Json(json!({ "status": "ok", "db": "connected" })),
        ),
        Ok(Err(e)) => {
            tracing::warn!("Health check failed: {:#}", e);
            unavailable()
        }
        Err(_) => {
            tracing::warn!("Health check timed out");
            unavailable()
        }
    }
}

fn unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": "error", "db": "unavailable" })),
    )
}

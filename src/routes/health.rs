use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint, including a store round trip
pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Value>) {
    let connected = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Health check failed to reach the store: {}", e);
            false
        }
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    (
        status,
        Json(json!({
            "status": if connected { "ok" } else { "error" },
            "service": "tictactoe-backend",
            "version": env!("CARGO_PKG_VERSION"),
            "timestamp": chrono::Utc::now().to_rfc3339(),
            "database": { "connected": connected },
        })),
    )
}

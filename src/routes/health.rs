use axum::{extract::State, Json};
use chrono::Utc;
use serde_json::{json, Value};

use crate::AppState;

/// Health check endpoint
///
/// Served on `/health` and `/api/health`. Clients use it as a liveness probe
/// before attempting a mutation, so it answers `healthy` whenever the API can
/// serve requests, even if only the in-memory tier is left.
pub async fn health_check(State(state): State<AppState>) -> Json<Value> {
    let store = state.controller.store();
    let database = if store.primary_reachable().await {
        "connected"
    } else {
        "unavailable"
    };

    Json(json!({
        "status": "healthy",
        "message": "API is healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION"),
        "environment": state.config.environment,
        "storageMode": store.storage_mode().as_str(),
        "database": database,
    }))
}

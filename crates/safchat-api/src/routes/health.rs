use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;

use crate::state::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub services: HashMap<String, String>,
}

/// Liveness plus the provider endpoint this instance talks to.
///
/// The provider itself is not called. `status` turns to `draining` once
/// shutdown has started.
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let mut services = HashMap::new();
    services.insert(
        "assistant".to_string(),
        state.config.assistant.base_url.clone(),
    );

    let status = if state.shutdown.is_cancelled() {
        "draining"
    } else {
        "healthy"
    };

    Json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        services,
    })
}

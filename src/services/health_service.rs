use tracing::warn;

use crate::{dto::health::HealthResponse, state::SharedState};

/// Respond with the backend health, probing the state store.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    if let Err(err) = state.records().store().health_check().await {
        warn!(error = %err, "state store health check failed");
        return HealthResponse::degraded(err.to_string());
    }
    HealthResponse::ok()
}

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};

use crate::{dto::health::HealthResponse, services::health_service, state::SharedState};

#[utoipa::path(
    get,
    path = "/healthcheck",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse),
        (status = 503, description = "State store probe failed", body = HealthResponse)
    )
)]
/// Return the backend health, answering 503 when the state store probe fails
/// so chained store clients and load balancers see the outage directly.
pub async fn healthcheck(
    State(state): State<SharedState>,
) -> (StatusCode, Json<HealthResponse>) {
    let status = health_service::health_status(&state).await;
    let code = if status.detail.is_none() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (code, Json(status))
}

/// Configure the health routes subtree.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/healthcheck", get(healthcheck))
}

use axum::{
    Json, Router,
    body::Body,
    extract::{Path, State},
    http::{Request, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::admin::{
        ActionResponse, DashboardResponse, DrawingUpload, StartCompetitionRequest,
        SubmissionDetail,
    },
    error::AppError,
    services::admin_service,
    state::SharedState,
};

const ADMIN_TOKEN_HEADER: &str = "x-admin-token";

/// Coordinator-only endpoints for driving the competition lifecycle.
pub fn router(state: SharedState) -> Router<SharedState> {
    Router::new()
        .route("/admin/competition/start", post(start_competition))
        .route("/admin/competition/drawing", post(attach_drawing))
        .route("/admin/competition/reveal", post(reveal_drawing))
        .route("/admin/competition/stop", post(stop_competition))
        .route("/admin/competition/reset", post(reset_competition))
        .route("/admin/dashboard", get(dashboard))
        .route("/admin/export", get(export_results))
        .route("/admin/submissions/{email}", get(submission_detail))
        .route_layer(middleware::from_fn_with_state(state, require_admin_token))
}

/// Start the competition with a material, optionally seeding the drawing.
#[utoipa::path(
    post,
    path = "/admin/competition/start",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    request_body = StartCompetitionRequest,
    responses(
        (status = 200, description = "Competition started", body = ActionResponse),
        (status = 409, description = "Competition already started or stopped")
    )
)]
pub async fn start_competition(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<StartCompetitionRequest>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::start_competition(&state, payload).await?))
}

/// Attach or replace the hidden drawing on the active competition.
#[utoipa::path(
    post,
    path = "/admin/competition/drawing",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    request_body = DrawingUpload,
    responses(
        (status = 200, description = "Drawing attached", body = ActionResponse),
        (status = 409, description = "Competition not active or drawing already revealed")
    )
)]
pub async fn attach_drawing(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<DrawingUpload>>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::attach_drawing(&state, payload).await?))
}

/// Reveal the drawing to all racers; idempotent once revealed.
#[utoipa::path(
    post,
    path = "/admin/competition/reveal",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    responses(
        (status = 200, description = "Drawing revealed", body = ActionResponse),
        (status = 409, description = "Competition not active or no drawing uploaded")
    )
)]
pub async fn reveal_drawing(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::reveal_drawing(&state).await?))
}

/// Stop the competition; no further submissions are accepted.
#[utoipa::path(
    post,
    path = "/admin/competition/stop",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    responses(
        (status = 200, description = "Competition stopped", body = ActionResponse),
        (status = 409, description = "Competition is not active")
    )
)]
pub async fn stop_competition(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::stop_competition(&state).await?))
}

/// Wipe the competition, roster and submissions back to a blank slate.
#[utoipa::path(
    post,
    path = "/admin/competition/reset",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    responses((status = 200, description = "Competition reset", body = ActionResponse))
)]
pub async fn reset_competition(
    State(state): State<SharedState>,
) -> Result<Json<ActionResponse>, AppError> {
    Ok(Json(admin_service::reset_competition(&state).await?))
}

/// Aggregated coordinator view: phase, roster statuses and standings.
#[utoipa::path(
    get,
    path = "/admin/dashboard",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    responses((status = 200, description = "Dashboard projection", body = DashboardResponse))
)]
pub async fn dashboard(
    State(state): State<SharedState>,
) -> Result<Json<DashboardResponse>, AppError> {
    Ok(Json(admin_service::dashboard(&state).await?))
}

/// Download the ranked results as a CSV attachment.
#[utoipa::path(
    get,
    path = "/admin/export",
    tag = "admin",
    params(("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot")),
    responses(
        (status = 200, description = "CSV results export", content_type = "text/csv", body = String),
        (status = 404, description = "No submissions to export")
    )
)]
pub async fn export_results(State(state): State<SharedState>) -> Result<Response, AppError> {
    let document = admin_service::export_results(&state).await?;
    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.file_name),
        ),
    ];
    Ok((headers, document.content).into_response())
}

/// Inspect a single submission by participant email.
#[utoipa::path(
    get,
    path = "/admin/submissions/{email}",
    tag = "admin",
    params(
        ("X-Admin-Token" = String, Header, description = "Coordinator token issued at boot"),
        ("email" = String, Path, description = "Email of the submitting participant")
    ),
    responses(
        (status = 200, description = "Submission detail", body = SubmissionDetail),
        (status = 404, description = "No submission for this participant")
    )
)]
pub async fn submission_detail(
    State(state): State<SharedState>,
    Path(email): Path<String>,
) -> Result<Json<SubmissionDetail>, AppError> {
    Ok(Json(admin_service::submission_detail(&state, &email).await?))
}

async fn require_admin_token(
    State(state): State<SharedState>,
    req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let provided = req
        .headers()
        .get(ADMIN_TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.to_owned())
        .ok_or_else(|| {
            AppError::Unauthorized("missing admin token header `X-Admin-Token`".into())
        })?;

    if provided == state.admin_token() {
        Ok(next.run(req).await)
    } else {
        Err(AppError::Unauthorized("invalid admin token".into()))
    }
}

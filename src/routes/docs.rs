use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::state::SharedState;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the speedmodelling backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::public::register,
        crate::routes::public::get_competition,
        crate::routes::public::submit_model,
        crate::routes::public::get_leaderboard,
        crate::routes::admin::start_competition,
        crate::routes::admin::attach_drawing,
        crate::routes::admin::reveal_drawing,
        crate::routes::admin::stop_competition,
        crate::routes::admin::reset_competition,
        crate::routes::admin::dashboard,
        crate::routes::admin::export_results,
        crate::routes::admin::submission_detail,
        crate::routes::store::get_record,
        crate::routes::store::put_record,
        crate::routes::store::delete_record,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::phase::VisiblePhase,
            crate::dto::common::ParticipantStatus,
            crate::dto::common::RosterEntry,
            crate::dto::common::StatsSnapshot,
            crate::dto::common::LeaderboardRow,
            crate::dto::common::DrawingSnapshot,
            crate::dto::public::RegisterRequest,
            crate::dto::public::ParticipantProfile,
            crate::dto::public::CompetitionSnapshot,
            crate::dto::public::SubmitRequest,
            crate::dto::public::SubmissionReceipt,
            crate::dto::public::LeaderboardResponse,
            crate::dto::admin::DrawingUpload,
            crate::dto::admin::StartCompetitionRequest,
            crate::dto::admin::ActionResponse,
            crate::dto::admin::DashboardResponse,
            crate::dto::admin::SubmissionDetail,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "public", description = "Racer-facing registration, polling and submission endpoints"),
        (name = "admin", description = "Coordinator endpoints guarded by the admin token"),
        (name = "store", description = "Raw shared-record endpoints polled by racer clients"),
    )
)]
pub struct ApiDoc;

/// Serve the Swagger UI backed by the generated OpenAPI document.
pub fn router(state: SharedState) -> Router<SharedState> {
    let ui: Router<SharedState> = SwaggerUi::new("/docs")
        .url("/api-doc/openapi.json", ApiDoc::openapi())
        .into();

    ui.with_state(state)
}

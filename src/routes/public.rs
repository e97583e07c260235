use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use axum_valid::Valid;

use crate::{
    dto::public::{
        CompetitionSnapshot, LeaderboardResponse, ParticipantProfile, RegisterRequest,
        SubmissionReceipt, SubmitRequest,
    },
    error::AppError,
    services::participant_service,
    state::SharedState,
};

/// Racer-facing endpoints: registration, competition polling, submissions.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/participants", post(register))
        .route("/competition", get(get_competition))
        .route("/submissions", post(submit_model))
        .route("/leaderboard", get(get_leaderboard))
}

#[utoipa::path(
    post,
    path = "/participants",
    tag = "public",
    request_body = RegisterRequest,
    responses(
        (status = 200, description = "Participant registered", body = ParticipantProfile),
        (status = 400, description = "Invalid name or email")
    )
)]
/// Register a participant, replacing any previous entry for the same email.
pub async fn register(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<RegisterRequest>>,
) -> Result<Json<ParticipantProfile>, AppError> {
    let profile = participant_service::register(&state, payload).await?;
    Ok(Json(profile))
}

#[utoipa::path(
    get,
    path = "/competition",
    tag = "public",
    responses((status = 200, description = "Current competition snapshot", body = CompetitionSnapshot))
)]
/// Return the competition state as racers are allowed to see it.
pub async fn get_competition(
    State(state): State<SharedState>,
) -> Result<Json<CompetitionSnapshot>, AppError> {
    let snapshot = participant_service::competition_snapshot(&state).await?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    post,
    path = "/submissions",
    tag = "public",
    request_body = SubmitRequest,
    responses(
        (status = 200, description = "Submission recorded", body = SubmissionReceipt),
        (status = 400, description = "Invalid file or mass"),
        (status = 404, description = "Participant not registered"),
        (status = 409, description = "Submissions are not open")
    )
)]
/// Record a model submission and return its receipt.
pub async fn submit_model(
    State(state): State<SharedState>,
    Valid(Json(payload)): Valid<Json<SubmitRequest>>,
) -> Result<Json<SubmissionReceipt>, AppError> {
    let receipt = participant_service::submit(&state, payload).await?;
    Ok(Json(receipt))
}

#[utoipa::path(
    get,
    path = "/leaderboard",
    tag = "public",
    responses((status = 200, description = "Ranked standings and counters", body = LeaderboardResponse))
)]
/// Return the ranked standings alongside participation counters.
pub async fn get_leaderboard(
    State(state): State<SharedState>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let standings = participant_service::standings(&state).await?;
    Ok(Json(standings))
}

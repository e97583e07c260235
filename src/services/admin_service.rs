//! Business logic powering the coordinator REST routes. These helpers apply
//! the lifecycle guards against the shared records while honouring the
//! single-writer-per-process requirement: every mutation holds the write
//! gate from its first read to its last write.

use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        admin::{
            ActionResponse, DashboardResponse, DrawingUpload, ExportDocument,
            StartCompetitionRequest, SubmissionDetail,
        },
        format_hms, format_system_time,
        phase::VisiblePhase,
        validation::validate_drawing_media_type,
    },
    error::ServiceError,
    services::{export, leaderboard},
    state::{
        SharedState,
        registry::{Roster, SubmissionRegistry},
        state_machine::{CompetitionCommand, CompetitionState, DrawingRef, compute_transition},
    },
};

/// Fallback material label used on exports when the record carries none.
const UNSPECIFIED_MATERIAL: &str = "Not specified";

/// Start the race with the chosen material and an optional hidden drawing.
pub async fn start_competition(
    state: &SharedState,
    request: StartCompetitionRequest,
) -> Result<ActionResponse, ServiceError> {
    request.validate()?;

    let material = request.material.trim().to_owned();
    if state.config().material(&material).is_none() {
        return Err(ServiceError::Validation(format!(
            "unknown material `{material}`"
        )));
    }

    let drawing = match request.drawing {
        Some(upload) => Some(prepare_drawing(state, upload)?),
        None => None,
    };
    let with_drawing = drawing.is_some();

    let _gate = state.lock_writes().await;
    let current = state.load_competition().await?;
    let next = compute_transition(
        &current,
        CompetitionCommand::Start {
            material: material.clone(),
            started_at: state.now(),
            drawing,
        },
    )?;
    state.store_competition(&next).await?;

    info!(material, with_drawing, "competition started");
    let message = if with_drawing {
        "Competition started successfully!"
    } else {
        "Competition started successfully! (No drawing uploaded)"
    };
    Ok(ActionResponse::new(message))
}

/// Attach or replace the drawing while it is still hidden.
pub async fn attach_drawing(
    state: &SharedState,
    upload: DrawingUpload,
) -> Result<ActionResponse, ServiceError> {
    let drawing = prepare_drawing(state, upload)?;
    let file_name = drawing.file_name.clone();

    let _gate = state.lock_writes().await;
    let current = state.load_competition().await?;
    let next = compute_transition(&current, CompetitionCommand::AttachDrawing(drawing))?;
    state.store_competition(&next).await?;

    info!(file_name, "drawing attached");
    Ok(ActionResponse::new("Drawing uploaded successfully!"))
}

/// Expose the attached drawing to racers.
///
/// Revealing an already-revealed race acknowledges without touching the
/// record, so racers never observe a spurious change.
pub async fn reveal_drawing(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let _gate = state.lock_writes().await;
    let current = state.load_competition().await?;
    let next = compute_transition(&current, CompetitionCommand::Reveal)?;
    if next != current {
        state.store_competition(&next).await?;
        info!("drawing revealed");
    }
    Ok(ActionResponse::new("Drawing revealed to all participants!"))
}

/// End the race, freezing the shared record.
pub async fn stop_competition(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let _gate = state.lock_writes().await;
    let current = state.load_competition().await?;
    let next = compute_transition(
        &current,
        CompetitionCommand::Stop {
            stopped_at: state.now(),
        },
    )?;
    state.store_competition(&next).await?;

    info!("competition stopped");
    Ok(ActionResponse::new("Competition stopped successfully!"))
}

/// Wipe all three shared records back to their initial state.
///
/// Legal from any phase; this is a destructive wipe, not a transition, and
/// it takes the roster and the submissions with it.
pub async fn reset_competition(state: &SharedState) -> Result<ActionResponse, ServiceError> {
    let _gate = state.lock_writes().await;
    state.records().clear_all().await?;

    info!("competition reset; all shared records wiped");
    Ok(ActionResponse::new("Competition reset successfully!"))
}

/// Everything the coordinator dashboard polls in one round-trip.
pub async fn dashboard(state: &SharedState) -> Result<DashboardResponse, ServiceError> {
    let competition = state.load_competition().await?;
    let roster = Roster::from_entries(state.records().read_roster().await?);
    let registry = SubmissionRegistry::from_entries(state.records().read_submissions().await?);

    let projection = leaderboard::project(competition.tag(), &roster, &registry);
    let elapsed_display = coordinator_elapsed(state, &competition);

    Ok(DashboardResponse {
        phase: VisiblePhase::from(&competition),
        revealed: competition.revealed(),
        material: competition.material().map(str::to_owned),
        started_at: competition.started_at().map(format_system_time),
        stopped_at: competition.stopped_at().map(format_system_time),
        elapsed_display,
        stats: projection.stats,
        roster: projection.roster,
        standings: projection.standings,
    })
}

/// Render the ranked standings as a dated CSV document.
pub async fn export_results(state: &SharedState) -> Result<ExportDocument, ServiceError> {
    let competition = state.load_competition().await?;
    let registry = SubmissionRegistry::from_entries(state.records().read_submissions().await?);
    if registry.is_empty() {
        return Err(ServiceError::NotFound("no submissions to export".into()));
    }

    let material = competition
        .material()
        .map(|id| material_label(state, id))
        .unwrap_or_else(|| UNSPECIFIED_MATERIAL.to_owned());
    let ranked = registry.ranked();
    let content = export::csv_document(&ranked, &material);

    info!(rows = ranked.len(), "results exported");
    Ok(ExportDocument {
        file_name: export::export_file_name(state.now()),
        content,
    })
}

/// Full record behind a single standings line.
pub async fn submission_detail(
    state: &SharedState,
    email: &str,
) -> Result<SubmissionDetail, ServiceError> {
    let email = email.trim().to_lowercase();
    let registry = SubmissionRegistry::from_entries(state.records().read_submissions().await?);

    let rank = registry
        .rank_of(&email)
        .ok_or_else(|| ServiceError::NotFound(format!("no submission for `{email}`")))?;
    let submission = registry
        .get(&email)
        .ok_or_else(|| ServiceError::NotFound(format!("no submission for `{email}`")))?;

    Ok(SubmissionDetail {
        rank,
        participant_id: submission.participant_id.clone(),
        name: submission.name.clone(),
        email: submission.email.clone(),
        file_name: submission.file_name.clone(),
        file_size_bytes: submission.file_size_bytes,
        mass_grams: submission.mass_grams,
        race_started_at: format_system_time(submission.race_started_at),
        submitted_at: format_system_time(submission.submitted_at),
        elapsed_seconds: submission.elapsed_seconds,
        elapsed_display: format_hms(submission.elapsed_seconds),
    })
}

/// Validate a drawing upload and turn it into the shared representation.
fn prepare_drawing(
    state: &SharedState,
    upload: DrawingUpload,
) -> Result<DrawingRef, ServiceError> {
    upload.validate()?;
    validate_drawing_media_type(state.config().drawing_media_types(), &upload.media_type)?;
    Ok(upload.into())
}

/// Wall-clock race duration on the coordinator side.
///
/// Active races run against the coordinator clock; stopped races show the
/// frozen span. Racers keep their own local clocks and may disagree.
fn coordinator_elapsed(state: &SharedState, competition: &CompetitionState) -> Option<String> {
    let started_at = competition.started_at()?;
    let end = competition.stopped_at().unwrap_or_else(|| state.now());
    let seconds = end
        .duration_since(started_at)
        .unwrap_or_default()
        .as_secs();
    Some(format_hms(seconds))
}

fn material_label(state: &SharedState, id: &str) -> String {
    state
        .config()
        .material(id)
        .map(|material| material.label.clone())
        .unwrap_or_else(|| id.to_owned())
}

#[cfg(test)]
mod tests {
    use std::{
        sync::Arc,
        time::{Duration, SystemTime},
    };

    use super::*;
    use crate::{
        config::AppConfig,
        dao::state_store::memory::MemoryStateStore,
        dto::{
            common::ParticipantStatus,
            public::{RegisterRequest, SubmitRequest},
        },
        racer::clock::{Clock, ManualClock},
        services::participant_service,
        state::AppState,
    };

    fn instant(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn harness() -> (SharedState, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::starting_at(instant(1_000)));
        let state = AppState::with_clock(
            AppConfig::default(),
            Arc::new(MemoryStateStore::new()),
            "test-token".into(),
            Arc::clone(&clock) as Arc<dyn Clock>,
        );
        (state, clock)
    }

    fn drawing_upload() -> DrawingUpload {
        DrawingUpload {
            file_name: "bracket.pdf".into(),
            media_type: "application/pdf".into(),
            data: "data:application/pdf;base64,AAAA".into(),
        }
    }

    fn start_request(with_drawing: bool) -> StartCompetitionRequest {
        StartCompetitionRequest {
            material: "steel".into(),
            drawing: with_drawing.then(drawing_upload),
        }
    }

    async fn register(state: &SharedState, name: &str, email: &str) {
        participant_service::register(
            state,
            RegisterRequest {
                name: name.into(),
                email: email.into(),
            },
        )
        .await
        .unwrap();
    }

    async fn submit(state: &SharedState, email: &str) {
        participant_service::submit(
            state,
            SubmitRequest {
                email: email.into(),
                file_name: "part.step".into(),
                file_size_bytes: 4096,
                mass_grams: 120.0,
                race_started_at_ms: 1_000_000,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn lifecycle_messages_follow_the_drawing_presence() {
        let (state, _clock) = harness();

        let response = start_competition(&state, start_request(false))
            .await
            .unwrap();
        assert_eq!(
            response.message,
            "Competition started successfully! (No drawing uploaded)"
        );

        let err = reveal_drawing(&state).await.unwrap_err();
        assert!(matches!(err, ServiceError::Precondition(_)), "no drawing yet");

        let response = attach_drawing(&state, drawing_upload()).await.unwrap();
        assert_eq!(response.message, "Drawing uploaded successfully!");

        let response = reveal_drawing(&state).await.unwrap();
        assert_eq!(response.message, "Drawing revealed to all participants!");

        let response = stop_competition(&state).await.unwrap();
        assert_eq!(response.message, "Competition stopped successfully!");
    }

    #[tokio::test]
    async fn out_of_phase_commands_are_preconditions() {
        let (state, _clock) = harness();

        assert!(matches!(
            reveal_drawing(&state).await.unwrap_err(),
            ServiceError::Precondition(_)
        ));
        assert!(matches!(
            stop_competition(&state).await.unwrap_err(),
            ServiceError::Precondition(_)
        ));

        start_competition(&state, start_request(true)).await.unwrap();
        assert!(matches!(
            start_competition(&state, start_request(true))
                .await
                .unwrap_err(),
            ServiceError::Precondition(_)
        ));

        stop_competition(&state).await.unwrap();
        assert!(matches!(
            start_competition(&state, start_request(true))
                .await
                .unwrap_err(),
            ServiceError::Precondition(_)
        ));
        assert!(matches!(
            reveal_drawing(&state).await.unwrap_err(),
            ServiceError::Precondition(_)
        ));
        assert!(matches!(
            attach_drawing(&state, drawing_upload()).await.unwrap_err(),
            ServiceError::Precondition(_)
        ));
    }

    #[tokio::test]
    async fn start_rejects_unknown_material_and_bad_drawing_media() {
        let (state, _clock) = harness();

        let mut request = start_request(false);
        request.material = "titanium".into();
        assert!(matches!(
            start_competition(&state, request).await.unwrap_err(),
            ServiceError::Validation(_)
        ));

        let mut request = start_request(true);
        if let Some(drawing) = request.drawing.as_mut() {
            drawing.media_type = "image/gif".into();
        }
        assert!(matches!(
            start_competition(&state, request).await.unwrap_err(),
            ServiceError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn second_reveal_acknowledges_without_complaint() {
        let (state, _clock) = harness();
        start_competition(&state, start_request(true)).await.unwrap();
        reveal_drawing(&state).await.unwrap();

        let response = reveal_drawing(&state).await.unwrap();
        assert_eq!(response.message, "Drawing revealed to all participants!");
        assert!(dashboard(&state).await.unwrap().revealed);
    }

    #[tokio::test]
    async fn dashboard_tracks_phase_statuses_and_elapsed() {
        let (state, clock) = harness();
        register(&state, "Alice", "alice@example.com").await;

        let view = dashboard(&state).await.unwrap();
        assert_eq!(view.phase, VisiblePhase::NotStarted);
        assert_eq!(view.roster[0].status, ParticipantStatus::Waiting);
        assert!(view.elapsed_display.is_none());

        start_competition(&state, start_request(true)).await.unwrap();
        reveal_drawing(&state).await.unwrap();
        clock.set(instant(1_090));
        let view = dashboard(&state).await.unwrap();
        assert_eq!(view.phase, VisiblePhase::Active);
        assert_eq!(view.material.as_deref(), Some("steel"));
        assert_eq!(view.elapsed_display.as_deref(), Some("00:01:30"));
        assert_eq!(view.roster[0].status, ParticipantStatus::Modeling);

        submit(&state, "alice@example.com").await;
        let view = dashboard(&state).await.unwrap();
        assert_eq!(view.stats.submission_count, 1);
        assert_eq!(view.roster[0].status, ParticipantStatus::Completed);
        assert_eq!(view.standings[0].rank, 1);

        clock.set(instant(1_120));
        stop_competition(&state).await.unwrap();
        clock.set(instant(9_999));
        let view = dashboard(&state).await.unwrap();
        assert_eq!(view.phase, VisiblePhase::Stopped);
        assert_eq!(view.elapsed_display.as_deref(), Some("00:02:00"));
    }

    #[tokio::test]
    async fn reset_wipes_all_records_and_reopens_the_floor() {
        let (state, _clock) = harness();
        register(&state, "Alice", "alice@example.com").await;
        start_competition(&state, start_request(true)).await.unwrap();
        reveal_drawing(&state).await.unwrap();
        submit(&state, "alice@example.com").await;
        stop_competition(&state).await.unwrap();

        reset_competition(&state).await.unwrap();
        let view = dashboard(&state).await.unwrap();
        assert_eq!(view.phase, VisiblePhase::NotStarted);
        assert_eq!(view.stats.participant_count, 0);
        assert_eq!(view.stats.submission_count, 0);
        assert!(view.standings.is_empty());

        start_competition(&state, start_request(false))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn export_needs_submissions_and_stays_deterministic() {
        let (state, clock) = harness();
        start_competition(&state, start_request(true)).await.unwrap();
        reveal_drawing(&state).await.unwrap();

        assert!(matches!(
            export_results(&state).await.unwrap_err(),
            ServiceError::NotFound(_)
        ));

        register(&state, "Alice", "alice@example.com").await;
        register(&state, "Bob", "bob@example.com").await;
        clock.set(instant(1_040));
        submit(&state, "alice@example.com").await;
        clock.set(instant(1_070));
        submit(&state, "bob@example.com").await;

        let first = export_results(&state).await.unwrap();
        assert_eq!(first.file_name, "speedmodelling_results_1970-01-01.csv");
        assert!(first.content.starts_with("Rank,Participant Name,"));
        let lines: Vec<&str> = first.content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[1].starts_with("1,Alice,"));
        assert!(lines[2].starts_with("2,Bob,"));
        assert!(lines[1].contains(",Steel"), "catalog label, not the id");

        let second = export_results(&state).await.unwrap();
        assert_eq!(first.content, second.content);
    }

    #[tokio::test]
    async fn submission_detail_finds_by_email_case_insensitively() {
        let (state, _clock) = harness();
        start_competition(&state, start_request(true)).await.unwrap();
        reveal_drawing(&state).await.unwrap();
        register(&state, "Alice", "alice@example.com").await;
        submit(&state, "alice@example.com").await;

        let detail = submission_detail(&state, "Alice@Example.com").await.unwrap();
        assert_eq!(detail.rank, 1);
        assert_eq!(detail.email, "alice@example.com");
        assert_eq!(detail.file_name, "part.step");

        assert!(matches!(
            submission_detail(&state, "ghost@example.com")
                .await
                .unwrap_err(),
            ServiceError::NotFound(_)
        ));
    }
}

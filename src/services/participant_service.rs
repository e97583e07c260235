//! Racer-facing business logic: registration, poll snapshots, submissions
//! and the public leaderboard.

use tracing::info;
use validator::Validate;

use crate::{
    dto::{
        common::DrawingSnapshot,
        format_hms, format_system_time,
        phase::VisiblePhase,
        public::{
            CompetitionSnapshot, LeaderboardResponse, ParticipantProfile, RegisterRequest,
            SubmissionReceipt, SubmitRequest,
        },
        validation::validate_model_file,
    },
    error::ServiceError,
    services::leaderboard,
    state::{
        SharedState,
        registry::{Roster, SubmissionRegistry, derive_participant_id},
        state_machine::CompetitionState,
    },
};

/// Register (or re-register) a racer on the shared roster.
///
/// Registration is keyed by email: a known email is replaced in place with a
/// fresh identifier and registration instant, and the roster count does not
/// grow. Registration stays open in every phase, stopped included.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<ParticipantProfile, ServiceError> {
    request.validate()?;
    let name = request.name.trim().to_owned();
    let email = request.email.trim().to_lowercase();

    let _gate = state.lock_writes().await;
    let registered_at = state.now();
    let entity = crate::dao::models::ParticipantEntity {
        participant_id: derive_participant_id(&email, registered_at),
        name,
        email,
        registered_at,
    };

    let mut roster = Roster::from_entries(state.records().read_roster().await?);
    let replaced = roster.register(entity.clone());
    state.records().write_roster(&roster.into_entries()).await?;

    if replaced {
        info!(email = %entity.email, "participant re-registered");
    } else {
        info!(email = %entity.email, "participant registered");
    }
    Ok(ParticipantProfile::from(&entity))
}

/// Snapshot racers poll on their fixed cadence.
///
/// Before the reveal the snapshot only admits that the race is running; the
/// material and drawing stay withheld so no client renders them early.
pub async fn competition_snapshot(
    state: &SharedState,
) -> Result<CompetitionSnapshot, ServiceError> {
    let competition = state.load_competition().await?;
    let revealed = competition.revealed();

    let (material, material_info) = if revealed {
        match competition.material() {
            Some(id) => {
                let info = state
                    .config()
                    .material(id)
                    .map(|material| material.info())
                    .unwrap_or_else(|| "Material information will be announced".to_owned());
                (Some(id.to_owned()), Some(info))
            }
            None => (None, None),
        }
    } else {
        (None, None)
    };

    let drawing = if revealed {
        competition.drawing().map(DrawingSnapshot::from)
    } else {
        None
    };

    Ok(CompetitionSnapshot {
        phase: VisiblePhase::from(&competition),
        revealed,
        material,
        material_info,
        drawing,
        started_at: competition.started_at().map(format_system_time),
        stopped_at: competition.stopped_at().map(format_system_time),
        poll_interval_ms: state.config().poll_interval().as_millis() as u64,
    })
}

/// Record a racer's terminal submission and return the immediate receipt.
///
/// Guards, in order: the race must be active with the drawing revealed, the
/// racer must be registered, and the file must pass the upload gate. The
/// elapsed time derives from the racer's locally observed start carried in
/// the request, not from the coordinator's record.
pub async fn submit(
    state: &SharedState,
    request: SubmitRequest,
) -> Result<SubmissionReceipt, ServiceError> {
    request.validate()?;
    let email = request.email.trim().to_lowercase();

    let _gate = state.lock_writes().await;
    let competition = state.load_competition().await?;
    match &competition {
        CompetitionState::NotStarted => {
            return Err(ServiceError::Precondition(
                "the race has not started yet".into(),
            ));
        }
        CompetitionState::Stopped(_) => {
            return Err(ServiceError::Precondition(
                "the race is closed; submissions are no longer accepted".into(),
            ));
        }
        CompetitionState::Active(race) if !race.revealed => {
            return Err(ServiceError::Precondition(
                "the drawing has not been revealed yet".into(),
            ));
        }
        CompetitionState::Active(_) => {}
    }

    let roster = Roster::from_entries(state.records().read_roster().await?);
    let Some(participant) = roster.get(&email) else {
        return Err(ServiceError::NotFound(format!(
            "participant `{email}` is not registered"
        )));
    };

    validate_model_file(
        state.config().upload(),
        &request.file_name,
        request.file_size_bytes,
    )?;

    if request.race_started_at_ms < 0 {
        return Err(ServiceError::Validation(
            "race start instant must not precede the epoch".into(),
        ));
    }
    let race_started_at = std::time::SystemTime::UNIX_EPOCH
        + std::time::Duration::from_millis(request.race_started_at_ms as u64);
    let submitted_at = state.now();
    let elapsed_seconds = submitted_at
        .duration_since(race_started_at)
        .unwrap_or_default()
        .as_secs();

    let submission = crate::dao::models::SubmissionEntity {
        participant_id: participant.participant_id.clone(),
        name: participant.name.clone(),
        email: email.clone(),
        file_name: request.file_name.clone(),
        file_size_bytes: request.file_size_bytes,
        mass_grams: request.mass_grams,
        race_started_at,
        submitted_at,
        elapsed_seconds,
    };

    let mut registry = SubmissionRegistry::from_entries(state.records().read_submissions().await?);
    let replaced = registry.record(submission);
    let rank = registry.rank_of(&email).unwrap_or(registry.len());
    state
        .records()
        .write_submissions(&registry.into_entries())
        .await?;

    if replaced {
        info!(email = %email, rank, "submission replaced");
    } else {
        info!(email = %email, rank, "submission recorded");
    }

    Ok(SubmissionReceipt {
        rank,
        elapsed_seconds,
        elapsed_display: format_hms(elapsed_seconds),
        file_name: request.file_name,
        mass_grams: request.mass_grams,
        submitted_at: format_system_time(submitted_at),
    })
}

/// Ranked standings plus aggregate counters, as racers see them.
pub async fn standings(state: &SharedState) -> Result<LeaderboardResponse, ServiceError> {
    let competition = state.load_competition().await?;
    let roster = Roster::from_entries(state.records().read_roster().await?);
    let registry = SubmissionRegistry::from_entries(state.records().read_submissions().await?);

    let projection = leaderboard::project(competition.tag(), &roster, &registry);
    Ok(LeaderboardResponse {
        stats: projection.stats,
        standings: projection.standings,
    })
}

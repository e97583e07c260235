//! Read-side projection over the roster and the submission registry.
//!
//! Recomputed from scratch on every call, so a single poll always sees one
//! consistent ranking. The ordering comes from
//! [`SubmissionRegistry::ranked`]; dashboards, the public leaderboard and the
//! CSV export all consume the same ordering.

use crate::{
    dto::common::{LeaderboardRow, ParticipantStatus, RosterEntry, StatsSnapshot},
    state::{
        registry::{Roster, SubmissionRegistry},
        state_machine::PhaseTag,
    },
};

/// Full projection consumed by dashboards and standings responses.
#[derive(Debug, Clone)]
pub struct Projection {
    /// Aggregate counters.
    pub stats: StatsSnapshot,
    /// Roster lines with per-participant status, in registration order.
    pub roster: Vec<RosterEntry>,
    /// Ranked standings.
    pub standings: Vec<LeaderboardRow>,
}

/// Project the shared records into presentation form.
pub fn project(phase: PhaseTag, roster: &Roster, registry: &SubmissionRegistry) -> Projection {
    let stats = StatsSnapshot {
        participant_count: roster.len(),
        submission_count: registry.len(),
    };

    let roster_rows = roster
        .iter()
        .map(|participant| RosterEntry {
            name: participant.name.clone(),
            email: participant.email.clone(),
            participant_id: participant.participant_id.clone(),
            status: participant_status(phase, registry.get(&participant.email).is_some()),
        })
        .collect();

    let standings = registry
        .ranked()
        .into_iter()
        .enumerate()
        .map(|(index, submission)| LeaderboardRow::from_submission(index + 1, submission))
        .collect();

    Projection {
        stats,
        roster: roster_rows,
        standings,
    }
}

/// Status shown for a single participant.
///
/// A submission always reads as completed. Without one the status follows
/// the phase; a stopped race leaves non-submitters as modeling for good.
fn participant_status(phase: PhaseTag, has_submission: bool) -> ParticipantStatus {
    if has_submission {
        return ParticipantStatus::Completed;
    }
    match phase {
        PhaseTag::NotStarted => ParticipantStatus::Waiting,
        PhaseTag::Active | PhaseTag::Stopped => ParticipantStatus::Modeling,
    }
}

//! DTOs shared by the coordinator and racer surfaces.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::models::SubmissionEntity,
    dto::{format_hms, format_system_time},
    state::state_machine::DrawingRef,
};

/// Participant progress as projected on every poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantStatus {
    /// Registered, race not started yet.
    Waiting,
    /// Race started (or already over) and no submission recorded.
    Modeling,
    /// A submission is on file.
    Completed,
}

/// Roster line with per-participant status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RosterEntry {
    /// Display name.
    pub name: String,
    /// Registration identity.
    pub email: String,
    /// Derived public identifier.
    pub participant_id: String,
    /// Current progress.
    pub status: ParticipantStatus,
}

/// Aggregate counters recomputed on every projection.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct StatsSnapshot {
    /// Number of registered participants.
    pub participant_count: usize,
    /// Number of live submissions.
    pub submission_count: usize,
}

/// One ranked line of the standings.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// 1-based rank by ascending submission instant.
    pub rank: usize,
    /// Display name.
    pub name: String,
    /// Submission identity.
    pub email: String,
    /// Whole seconds between the racer's local start and the submission.
    pub elapsed_seconds: u64,
    /// HH:MM:SS rendering of `elapsed_seconds`.
    pub elapsed_display: String,
    /// Declared mass in grams.
    pub mass_grams: f64,
    /// Name of the uploaded model file.
    pub file_name: String,
    /// Size of the uploaded model file in bytes.
    pub file_size_bytes: u64,
    /// Instant the submission was recorded, RFC 3339.
    pub submitted_at: String,
}

impl LeaderboardRow {
    /// Build a row for `submission` at `rank`.
    pub fn from_submission(rank: usize, submission: &SubmissionEntity) -> Self {
        Self {
            rank,
            name: submission.name.clone(),
            email: submission.email.clone(),
            elapsed_seconds: submission.elapsed_seconds,
            elapsed_display: format_hms(submission.elapsed_seconds),
            mass_grams: submission.mass_grams,
            file_name: submission.file_name.clone(),
            file_size_bytes: submission.file_size_bytes,
            submitted_at: format_system_time(submission.submitted_at),
        }
    }
}

/// Drawing payload exposed to racers once revealed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DrawingSnapshot {
    /// Original file name of the upload.
    pub file_name: String,
    /// Declared media type.
    pub media_type: String,
    /// Fully resolved payload (base64 data URL).
    pub data: String,
}

impl From<&DrawingRef> for DrawingSnapshot {
    fn from(drawing: &DrawingRef) -> Self {
        Self {
            file_name: drawing.file_name.clone(),
            media_type: drawing.media_type.clone(),
            data: drawing.data.clone(),
        }
    }
}

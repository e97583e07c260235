//! Persistence entities mirroring the JSON documents kept in the state store.
//!
//! Each of the three shared records serializes to a standalone document and is
//! overwritten wholesale on every mutation. Timestamps travel as epoch
//! milliseconds so records stay readable by non-Rust tooling.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};
use serde_with::{TimestampMilliSeconds, serde_as};

/// Lifecycle tag stored on the competition record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompetitionPhase {
    /// No race has been started since the last reset.
    #[default]
    NotStarted,
    /// The race is running.
    Active,
    /// The race has ended.
    Stopped,
}

/// Drawing payload stored on the competition record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DrawingEntity {
    /// Original file name of the upload.
    pub file_name: String,
    /// Declared media type of the payload.
    pub media_type: String,
    /// Fully resolved payload (base64 data URL), never a partial reference.
    pub data: String,
}

/// Competition record shared by the coordinator and every racer.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompetitionEntity {
    /// Current lifecycle phase.
    pub phase: CompetitionPhase,
    /// Material selected at start; absent before the first start.
    #[serde(default)]
    pub material: Option<String>,
    /// Whether the drawing has been exposed to racers.
    #[serde(default)]
    pub revealed: bool,
    /// Attached drawing, if any.
    #[serde(default)]
    pub drawing: Option<DrawingEntity>,
    /// Coordinator-side instant of the start transition.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub started_at: Option<SystemTime>,
    /// Coordinator-side instant of the stop transition.
    #[serde_as(as = "Option<TimestampMilliSeconds<i64>>")]
    #[serde(default)]
    pub stopped_at: Option<SystemTime>,
}

/// Roster entry for one registered racer.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantEntity {
    /// Derived identifier, stable for the lifetime of the registration.
    pub participant_id: String,
    /// Display name.
    pub name: String,
    /// Registration identity; at most one roster entry per email.
    pub email: String,
    /// Instant of the most recent registration under this email.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub registered_at: SystemTime,
}

/// Terminal submission of one racer; at most one live entry per email.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionEntity {
    /// Identifier copied from the roster entry at submission time.
    pub participant_id: String,
    /// Display name copied from the roster entry at submission time.
    pub name: String,
    /// Submission identity, matching the roster email.
    pub email: String,
    /// Name of the uploaded model file.
    pub file_name: String,
    /// Size of the uploaded model file in bytes.
    pub file_size_bytes: u64,
    /// Declared mass of the modeled part in grams.
    pub mass_grams: f64,
    /// The racer's locally observed race start.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub race_started_at: SystemTime,
    /// Instant the submission was recorded.
    #[serde_as(as = "TimestampMilliSeconds<i64>")]
    pub submitted_at: SystemTime,
    /// Whole seconds between the local race start and the submission.
    pub elapsed_seconds: u64,
}

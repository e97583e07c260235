//! Racer-facing request and response payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::models::ParticipantEntity,
    dto::{
        common::{DrawingSnapshot, LeaderboardRow, StatsSnapshot},
        format_system_time,
        phase::VisiblePhase,
    },
};

/// Payload a racer sends to join (or rejoin) the roster.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
}

/// Profile returned on registration.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantProfile {
    pub participant_id: String,
    pub name: String,
    pub email: String,
    pub registered_at: String,
}

impl From<&ParticipantEntity> for ParticipantProfile {
    fn from(entity: &ParticipantEntity) -> Self {
        Self {
            participant_id: entity.participant_id.clone(),
            name: entity.name.clone(),
            email: entity.email.clone(),
            registered_at: format_system_time(entity.registered_at),
        }
    }
}

/// Snapshot racers poll on their fixed cadence.
///
/// The material and drawing appear only once revealed; before that the
/// snapshot admits the race is running and nothing more.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CompetitionSnapshot {
    pub phase: VisiblePhase,
    pub revealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    /// Material display line with density, once revealed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawing: Option<DrawingSnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
    /// Cadence the server recommends for polling this endpoint.
    pub poll_interval_ms: u64,
}

/// Submission payload for a completed model.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitRequest {
    #[validate(email(message = "Enter a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, message = "File name is required"))]
    pub file_name: String,
    pub file_size_bytes: u64,
    #[validate(custom(function = "crate::dto::validation::validate_mass"))]
    pub mass_grams: f64,
    /// The racer's locally observed race start, epoch milliseconds.
    pub race_started_at_ms: i64,
}

/// Receipt returned as soon as a submission is recorded.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SubmissionReceipt {
    /// 1-based rank at the moment of recording.
    pub rank: usize,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
    pub file_name: String,
    pub mass_grams: f64,
    pub submitted_at: String,
}

/// Ranked standings plus aggregate counters.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardResponse {
    pub stats: StatsSnapshot,
    pub standings: Vec<LeaderboardRow>,
}

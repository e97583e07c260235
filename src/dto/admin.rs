//! Coordinator-facing request and response payloads.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dto::{
        common::{LeaderboardRow, RosterEntry, StatsSnapshot},
        phase::VisiblePhase,
    },
    state::state_machine::DrawingRef,
};

/// Drawing upload, attached at start or later while still hidden.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct DrawingUpload {
    #[validate(length(min = 1, message = "Drawing file name is required"))]
    pub file_name: String,
    #[validate(length(min = 1, message = "Drawing media type is required"))]
    pub media_type: String,
    /// Fully resolved payload (base64 data URL).
    #[validate(length(min = 1, message = "Drawing payload is required"))]
    pub data: String,
}

impl From<DrawingUpload> for DrawingRef {
    fn from(upload: DrawingUpload) -> Self {
        DrawingRef {
            file_name: upload.file_name,
            media_type: upload.media_type,
            data: upload.data,
        }
    }
}

/// Payload starting the race.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct StartCompetitionRequest {
    /// Identifier of a catalog material.
    #[validate(length(min = 1, message = "Select a material before starting"))]
    pub material: String,
    /// Optional drawing to attach immediately, still hidden.
    #[serde(default)]
    #[validate(nested)]
    pub drawing: Option<DrawingUpload>,
}

/// Generic acknowledgement for lifecycle actions.
#[derive(Debug, Serialize, ToSchema)]
pub struct ActionResponse {
    pub message: String,
}

impl ActionResponse {
    /// Wrap a human-readable acknowledgement.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Everything the coordinator dashboard polls in one round-trip.
#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardResponse {
    pub phase: VisiblePhase,
    pub revealed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stopped_at: Option<String>,
    /// Wall-clock race duration on the coordinator side, HH:MM:SS.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed_display: Option<String>,
    pub stats: StatsSnapshot,
    pub roster: Vec<RosterEntry>,
    pub standings: Vec<LeaderboardRow>,
}

/// Full record behind a single standings line.
#[derive(Debug, Serialize, ToSchema)]
pub struct SubmissionDetail {
    pub rank: usize,
    pub participant_id: String,
    pub name: String,
    pub email: String,
    pub file_name: String,
    pub file_size_bytes: u64,
    pub mass_grams: f64,
    /// The racer's locally observed race start, RFC 3339.
    pub race_started_at: String,
    pub submitted_at: String,
    pub elapsed_seconds: u64,
    pub elapsed_display: String,
}

/// CSV document produced by the export surface.
#[derive(Debug, Serialize, ToSchema)]
pub struct ExportDocument {
    /// Dated download name for the document.
    pub file_name: String,
    /// Full CSV content, header row included.
    pub content: String,
}

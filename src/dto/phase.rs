use serde::Serialize;
use utoipa::ToSchema;

use crate::state::state_machine::{CompetitionState, PhaseTag};

/// Competition phase as exposed to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    /// The coordinator has not started the race yet.
    NotStarted,
    /// The race is running.
    Active,
    /// The race has ended.
    Stopped,
}

impl From<PhaseTag> for VisiblePhase {
    fn from(tag: PhaseTag) -> Self {
        match tag {
            PhaseTag::NotStarted => VisiblePhase::NotStarted,
            PhaseTag::Active => VisiblePhase::Active,
            PhaseTag::Stopped => VisiblePhase::Stopped,
        }
    }
}

impl From<&CompetitionState> for VisiblePhase {
    fn from(state: &CompetitionState) -> Self {
        state.tag().into()
    }
}

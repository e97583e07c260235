use std::fmt;
use std::time::SystemTime;

use thiserror::Error;

use crate::dao::models::{CompetitionEntity, CompetitionPhase, DrawingEntity};

/// Drawing shared with racers once revealed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DrawingRef {
    /// Original file name of the upload.
    pub file_name: String,
    /// Declared media type of the payload.
    pub media_type: String,
    /// Fully resolved payload (base64 data URL). Racers receive the complete
    /// drawing on the reveal tick, never a reference they would have to chase.
    pub data: String,
}

/// Data carried while the race is running.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRace {
    /// Material every racer must model with.
    pub material: String,
    /// Coordinator-side instant of the start transition.
    pub started_at: SystemTime,
    /// Whether the drawing has been exposed to racers.
    pub revealed: bool,
    /// The shared drawing, if one has been attached.
    pub drawing: Option<DrawingRef>,
}

/// Data frozen once the race has been stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinishedRace {
    /// Material the race was run with.
    pub material: String,
    /// Coordinator-side instant of the start transition.
    pub started_at: SystemTime,
    /// Coordinator-side instant of the stop transition.
    pub stopped_at: SystemTime,
    /// Whether the drawing had been revealed before the stop.
    pub revealed: bool,
    /// The shared drawing, if one was attached.
    pub drawing: Option<DrawingRef>,
}

/// Lifecycle of the shared competition record.
///
/// A single tagged phase carries the data valid for that phase, so a record
/// claiming to be stopped without ever having started cannot be represented.
/// `Stopped` is terminal; the only way back is a full reset, which wipes the
/// record rather than transitioning it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompetitionState {
    /// No race has been started since the last reset.
    NotStarted,
    /// The race is running.
    Active(ActiveRace),
    /// The race has ended.
    Stopped(FinishedRace),
}

impl Default for CompetitionState {
    fn default() -> Self {
        CompetitionState::NotStarted
    }
}

/// Coarse phase tag used for projections and diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseTag {
    /// No race has been started since the last reset.
    NotStarted,
    /// The race is running.
    Active,
    /// The race has ended.
    Stopped,
}

impl fmt::Display for PhaseTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PhaseTag::NotStarted => "not started",
            PhaseTag::Active => "active",
            PhaseTag::Stopped => "stopped",
        };
        f.write_str(label)
    }
}

impl CompetitionState {
    /// Coarse tag for the current phase.
    pub fn tag(&self) -> PhaseTag {
        match self {
            CompetitionState::NotStarted => PhaseTag::NotStarted,
            CompetitionState::Active(_) => PhaseTag::Active,
            CompetitionState::Stopped(_) => PhaseTag::Stopped,
        }
    }

    /// Whether the drawing has been revealed.
    pub fn revealed(&self) -> bool {
        match self {
            CompetitionState::NotStarted => false,
            CompetitionState::Active(race) => race.revealed,
            CompetitionState::Stopped(race) => race.revealed,
        }
    }

    /// Material of the current or finished race, if any.
    pub fn material(&self) -> Option<&str> {
        match self {
            CompetitionState::NotStarted => None,
            CompetitionState::Active(race) => Some(&race.material),
            CompetitionState::Stopped(race) => Some(&race.material),
        }
    }

    /// Attached drawing, if any.
    pub fn drawing(&self) -> Option<&DrawingRef> {
        match self {
            CompetitionState::NotStarted => None,
            CompetitionState::Active(race) => race.drawing.as_ref(),
            CompetitionState::Stopped(race) => race.drawing.as_ref(),
        }
    }

    /// Coordinator-side start instant, if the race has started.
    pub fn started_at(&self) -> Option<SystemTime> {
        match self {
            CompetitionState::NotStarted => None,
            CompetitionState::Active(race) => Some(race.started_at),
            CompetitionState::Stopped(race) => Some(race.started_at),
        }
    }

    /// Coordinator-side stop instant, if the race has ended.
    pub fn stopped_at(&self) -> Option<SystemTime> {
        match self {
            CompetitionState::Stopped(race) => Some(race.stopped_at),
            _ => None,
        }
    }
}

/// Commands a coordinator can apply to the lifecycle.
///
/// Reset is deliberately absent: it wipes the shared records instead of
/// transitioning this one, and so never passes through the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompetitionCommand {
    /// Begin the race with the chosen material and an optional hidden drawing.
    Start {
        /// Material every racer must model with.
        material: String,
        /// Coordinator-side start instant.
        started_at: SystemTime,
        /// Drawing to attach immediately, still hidden.
        drawing: Option<DrawingRef>,
    },
    /// Attach or replace the drawing while it is still hidden.
    AttachDrawing(DrawingRef),
    /// Expose the attached drawing to racers.
    Reveal,
    /// End the race, freezing the record.
    Stop {
        /// Coordinator-side stop instant.
        stopped_at: SystemTime,
    },
}

impl CompetitionCommand {
    /// Short command name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            CompetitionCommand::Start { .. } => "start",
            CompetitionCommand::AttachDrawing(_) => "attach a drawing",
            CompetitionCommand::Reveal => "reveal the drawing",
            CompetitionCommand::Stop { .. } => "stop",
        }
    }
}

/// Error returned when a command cannot be applied to the current record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    /// The command is not legal in the current phase.
    #[error("cannot {command} while the competition is {from}")]
    InvalidPhase {
        /// Phase the record was in when the command arrived.
        from: PhaseTag,
        /// Name of the rejected command.
        command: &'static str,
    },
    /// Reveal was attempted with no drawing attached.
    #[error("no drawing uploaded; attach a drawing before revealing")]
    DrawingMissing,
    /// The drawing can no longer be replaced once racers have seen it.
    #[error("the drawing has already been revealed and can no longer be replaced")]
    DrawingLocked,
}

/// Compute the record that results from applying `command` to `state`.
///
/// Pure: the caller decides whether and where to persist the result.
/// Revealing an already-revealed race returns a value equal to the input,
/// letting callers skip the store write.
pub fn compute_transition(
    state: &CompetitionState,
    command: CompetitionCommand,
) -> Result<CompetitionState, TransitionError> {
    let next = match (state, command) {
        (
            CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material,
                started_at,
                drawing,
            },
        ) => CompetitionState::Active(ActiveRace {
            material,
            started_at,
            revealed: false,
            drawing,
        }),
        (CompetitionState::Active(race), CompetitionCommand::AttachDrawing(drawing)) => {
            if race.revealed {
                return Err(TransitionError::DrawingLocked);
            }
            CompetitionState::Active(ActiveRace {
                drawing: Some(drawing),
                ..race.clone()
            })
        }
        (CompetitionState::Active(race), CompetitionCommand::Reveal) => {
            if race.drawing.is_none() {
                return Err(TransitionError::DrawingMissing);
            }
            CompetitionState::Active(ActiveRace {
                revealed: true,
                ..race.clone()
            })
        }
        (CompetitionState::Active(race), CompetitionCommand::Stop { stopped_at }) => {
            CompetitionState::Stopped(FinishedRace {
                material: race.material.clone(),
                started_at: race.started_at,
                stopped_at,
                revealed: race.revealed,
                drawing: race.drawing.clone(),
            })
        }
        (state, command) => {
            return Err(TransitionError::InvalidPhase {
                from: state.tag(),
                command: command.name(),
            });
        }
    };

    Ok(next)
}

/// Error produced when a stored competition record violates the phase shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed competition record: {0}")]
pub struct MalformedRecord(String);

impl MalformedRecord {
    fn new(detail: impl Into<String>) -> Self {
        MalformedRecord(detail.into())
    }
}

impl From<DrawingEntity> for DrawingRef {
    fn from(entity: DrawingEntity) -> Self {
        DrawingRef {
            file_name: entity.file_name,
            media_type: entity.media_type,
            data: entity.data,
        }
    }
}

impl From<DrawingRef> for DrawingEntity {
    fn from(drawing: DrawingRef) -> Self {
        DrawingEntity {
            file_name: drawing.file_name,
            media_type: drawing.media_type,
            data: drawing.data,
        }
    }
}

impl From<&CompetitionState> for CompetitionEntity {
    fn from(state: &CompetitionState) -> Self {
        match state {
            CompetitionState::NotStarted => CompetitionEntity::default(),
            CompetitionState::Active(race) => CompetitionEntity {
                phase: CompetitionPhase::Active,
                material: Some(race.material.clone()),
                revealed: race.revealed,
                drawing: race.drawing.clone().map(DrawingEntity::from),
                started_at: Some(race.started_at),
                stopped_at: None,
            },
            CompetitionState::Stopped(race) => CompetitionEntity {
                phase: CompetitionPhase::Stopped,
                material: Some(race.material.clone()),
                revealed: race.revealed,
                drawing: race.drawing.clone().map(DrawingEntity::from),
                started_at: Some(race.started_at),
                stopped_at: Some(race.stopped_at),
            },
        }
    }
}

impl TryFrom<CompetitionEntity> for CompetitionState {
    type Error = MalformedRecord;

    fn try_from(entity: CompetitionEntity) -> Result<Self, Self::Error> {
        match entity.phase {
            CompetitionPhase::NotStarted => Ok(CompetitionState::NotStarted),
            CompetitionPhase::Active => {
                let material = entity
                    .material
                    .ok_or_else(|| MalformedRecord::new("active race without a material"))?;
                let started_at = entity
                    .started_at
                    .ok_or_else(|| MalformedRecord::new("active race without a start instant"))?;
                let drawing = entity.drawing.map(DrawingRef::from);
                if entity.revealed && drawing.is_none() {
                    return Err(MalformedRecord::new("revealed race without a drawing"));
                }
                Ok(CompetitionState::Active(ActiveRace {
                    material,
                    started_at,
                    revealed: entity.revealed,
                    drawing,
                }))
            }
            CompetitionPhase::Stopped => {
                let material = entity
                    .material
                    .ok_or_else(|| MalformedRecord::new("stopped race without a material"))?;
                let started_at = entity
                    .started_at
                    .ok_or_else(|| MalformedRecord::new("stopped race without a start instant"))?;
                let stopped_at = entity
                    .stopped_at
                    .ok_or_else(|| MalformedRecord::new("stopped race without a stop instant"))?;
                Ok(CompetitionState::Stopped(FinishedRace {
                    material,
                    started_at,
                    stopped_at,
                    revealed: entity.revealed,
                    drawing: entity.drawing.map(DrawingRef::from),
                }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn instant(secs: u64) -> SystemTime {
        SystemTime::UNIX_EPOCH + Duration::from_secs(secs)
    }

    fn drawing() -> DrawingRef {
        DrawingRef {
            file_name: "bracket.png".into(),
            media_type: "image/png".into(),
            data: "data:image/png;base64,AAAA".into(),
        }
    }

    fn apply(state: &CompetitionState, command: CompetitionCommand) -> CompetitionState {
        compute_transition(state, command).unwrap()
    }

    #[test]
    fn initial_state_is_not_started() {
        assert_eq!(CompetitionState::default(), CompetitionState::NotStarted);
    }

    #[test]
    fn full_happy_path_through_a_race() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: None,
            },
        );
        assert_eq!(started.tag(), PhaseTag::Active);
        assert!(!started.revealed());
        assert!(started.drawing().is_none());

        let attached = apply(&started, CompetitionCommand::AttachDrawing(drawing()));
        assert!(attached.drawing().is_some());
        assert!(!attached.revealed());

        let revealed = apply(&attached, CompetitionCommand::Reveal);
        assert!(revealed.revealed());

        let stopped = apply(
            &revealed,
            CompetitionCommand::Stop {
                stopped_at: instant(400),
            },
        );
        assert_eq!(stopped.tag(), PhaseTag::Stopped);
        assert_eq!(stopped.started_at(), Some(instant(100)));
        assert_eq!(stopped.stopped_at(), Some(instant(400)));
        assert!(stopped.revealed());
        assert!(stopped.drawing().is_some());
    }

    #[test]
    fn start_can_carry_the_drawing() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "aluminum".into(),
                started_at: instant(100),
                drawing: Some(drawing()),
            },
        );
        assert!(started.drawing().is_some());
        assert!(!started.revealed(), "drawing must stay hidden at start");
    }

    #[test]
    fn reveal_without_drawing_is_rejected() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: None,
            },
        );
        let err = compute_transition(&started, CompetitionCommand::Reveal).unwrap_err();
        assert_eq!(err, TransitionError::DrawingMissing);
    }

    #[test]
    fn reveal_is_idempotent() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: Some(drawing()),
            },
        );
        let revealed = apply(&started, CompetitionCommand::Reveal);
        let revealed_again = apply(&revealed, CompetitionCommand::Reveal);
        assert_eq!(revealed_again, revealed);
    }

    #[test]
    fn drawing_cannot_be_replaced_after_reveal() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: Some(drawing()),
            },
        );
        let revealed = apply(&started, CompetitionCommand::Reveal);

        let err =
            compute_transition(&revealed, CompetitionCommand::AttachDrawing(drawing()))
                .unwrap_err();
        assert_eq!(err, TransitionError::DrawingLocked);
    }

    #[test]
    fn drawing_can_be_replaced_before_reveal() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: Some(drawing()),
            },
        );
        let replacement = DrawingRef {
            file_name: "bracket-v2.pdf".into(),
            media_type: "application/pdf".into(),
            data: "data:application/pdf;base64,BBBB".into(),
        };
        let attached = apply(
            &started,
            CompetitionCommand::AttachDrawing(replacement.clone()),
        );
        assert_eq!(attached.drawing(), Some(&replacement));
    }

    #[test]
    fn commands_out_of_phase_are_rejected() {
        let not_started = CompetitionState::NotStarted;
        let started = apply(
            &not_started,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: Some(drawing()),
            },
        );
        let stopped = apply(
            &started,
            CompetitionCommand::Stop {
                stopped_at: instant(200),
            },
        );

        let cases = [
            (&not_started, CompetitionCommand::Reveal),
            (
                &not_started,
                CompetitionCommand::Stop {
                    stopped_at: instant(200),
                },
            ),
            (&not_started, CompetitionCommand::AttachDrawing(drawing())),
            (
                &started,
                CompetitionCommand::Start {
                    material: "abs".into(),
                    started_at: instant(300),
                    drawing: None,
                },
            ),
            (&stopped, CompetitionCommand::Reveal),
            (
                &stopped,
                CompetitionCommand::Stop {
                    stopped_at: instant(300),
                },
            ),
            (
                &stopped,
                CompetitionCommand::Start {
                    material: "brass".into(),
                    started_at: instant(300),
                    drawing: None,
                },
            ),
        ];

        for (state, command) in cases {
            let name = command.name();
            let err = compute_transition(state, command).unwrap_err();
            match err {
                TransitionError::InvalidPhase { from, command } => {
                    assert_eq!(from, state.tag());
                    assert_eq!(command, name);
                }
                other => panic!("expected InvalidPhase, got {other:?}"),
            }
        }
    }

    #[test]
    fn stopped_is_terminal_even_when_unrevealed() {
        let started = apply(
            &CompetitionState::NotStarted,
            CompetitionCommand::Start {
                material: "steel".into(),
                started_at: instant(100),
                drawing: None,
            },
        );
        let stopped = apply(
            &started,
            CompetitionCommand::Stop {
                stopped_at: instant(200),
            },
        );
        assert!(!stopped.revealed());

        let err = compute_transition(&stopped, CompetitionCommand::Reveal).unwrap_err();
        assert!(matches!(err, TransitionError::InvalidPhase { .. }));
    }

    #[test]
    fn entity_roundtrip_preserves_every_phase() {
        let states = [
            CompetitionState::NotStarted,
            CompetitionState::Active(ActiveRace {
                material: "steel".into(),
                started_at: instant(100),
                revealed: true,
                drawing: Some(drawing()),
            }),
            CompetitionState::Stopped(FinishedRace {
                material: "abs".into(),
                started_at: instant(100),
                stopped_at: instant(500),
                revealed: false,
                drawing: None,
            }),
        ];

        for state in states {
            let entity = CompetitionEntity::from(&state);
            let back = CompetitionState::try_from(entity).unwrap();
            assert_eq!(back, state);
        }
    }

    #[test]
    fn malformed_entities_are_rejected() {
        let active_without_material = CompetitionEntity {
            phase: CompetitionPhase::Active,
            started_at: Some(instant(100)),
            ..CompetitionEntity::default()
        };
        assert!(CompetitionState::try_from(active_without_material).is_err());

        let stopped_without_stop = CompetitionEntity {
            phase: CompetitionPhase::Stopped,
            material: Some("steel".into()),
            started_at: Some(instant(100)),
            ..CompetitionEntity::default()
        };
        assert!(CompetitionState::try_from(stopped_without_stop).is_err());

        let revealed_without_drawing = CompetitionEntity {
            phase: CompetitionPhase::Active,
            material: Some("steel".into()),
            revealed: true,
            started_at: Some(instant(100)),
            ..CompetitionEntity::default()
        };
        assert!(CompetitionState::try_from(revealed_without_drawing).is_err());
    }
}

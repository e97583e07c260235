//! Racer-side observation loop over the shared state store.
//!
//! Racers learn everything by polling the competition record on a fixed
//! cadence; nothing is pushed at them. The instant a racer first observes
//! the race active becomes its local race start, and every elapsed time it
//! reports derives from that local instant. A racer that polls late starts
//! its clock late and is measured kindly for it; that bias is part of the
//! protocol, not an accident.

pub mod clock;
pub mod ticker;
pub mod timer;

use std::sync::Arc;

use tracing::{debug, info, warn};
use validator::ValidateEmail;

use crate::{
    config::UploadPolicy,
    dao::{
        models::{ParticipantEntity, SubmissionEntity},
        records::SharedRecords,
        state_store::{COMPETITION_KEY, StateStore},
        storage::StorageError,
    },
    dto::{
        format_hms, format_system_time,
        public::{LeaderboardResponse, SubmissionReceipt},
        validation::{validate_mass, validate_model_file},
    },
    error::ServiceError,
    services::leaderboard,
    state::{
        registry::{Roster, SubmissionRegistry, derive_participant_id},
        state_machine::{CompetitionState, DrawingRef},
    },
};

use self::{clock::Clock, ticker::Ticker, timer::ElapsedTimer};

/// What a single poll tick observed, for callers driving a display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing relevant changed since the previous tick.
    Unchanged,
    /// First tick seeing the race active; the local clock is now anchored.
    RaceStarted,
    /// The drawing became visible on this tick.
    DrawingRevealed,
    /// The race was observed stopped; the timer display halted.
    RaceStopped,
    /// The shared records were wiped; all local race state cleared.
    CompetitionReset,
}

/// Locally observed race state. Never authoritative; the store is.
#[derive(Debug, Clone, Default)]
pub struct RaceView {
    /// Local instant at which this racer first observed the race active.
    pub race_started_at: Option<std::time::SystemTime>,
    /// Whether the reveal edge has been observed.
    pub revealed: bool,
    /// Drawing materialized on the reveal tick.
    pub drawing: Option<DrawingRef>,
    /// Material announced with the reveal.
    pub material: Option<String>,
    /// Whether the race has been observed stopped.
    pub stopped: bool,
    /// Whether this racer recorded a submission in the current epoch.
    pub submitted: bool,
}

/// A participating agent: registers once, polls the shared record, and
/// submits at most one model per race.
pub struct RacerAgent {
    records: SharedRecords,
    clock: Arc<dyn Clock>,
    upload_policy: UploadPolicy,
    profile: ParticipantEntity,
    view: RaceView,
    timer: ElapsedTimer,
}

impl std::fmt::Debug for RacerAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RacerAgent")
            .field("upload_policy", &self.upload_policy)
            .field("profile", &self.profile)
            .field("view", &self.view)
            .field("timer", &self.timer)
            .finish_non_exhaustive()
    }
}

impl RacerAgent {
    /// Register (or re-register) `name`/`email` on the shared roster and
    /// return an agent ready to poll.
    pub async fn login(
        store: Arc<dyn StateStore>,
        clock: Arc<dyn Clock>,
        upload_policy: UploadPolicy,
        name: &str,
        email: &str,
    ) -> Result<Self, ServiceError> {
        let name = name.trim();
        let email = email.trim().to_lowercase();
        if name.is_empty() {
            return Err(ServiceError::Validation("Name is required".into()));
        }
        if !email.validate_email() {
            return Err(ServiceError::Validation(
                "Enter a valid email address".into(),
            ));
        }

        let records = SharedRecords::new(store);
        let registered_at = clock.now();
        let profile = ParticipantEntity {
            participant_id: derive_participant_id(&email, registered_at),
            name: name.to_owned(),
            email,
            registered_at,
        };

        let mut roster = Roster::from_entries(records.read_roster().await?);
        roster.register(profile.clone());
        records.write_roster(&roster.into_entries()).await?;

        info!(email = %profile.email, participant_id = %profile.participant_id, "racer registered");
        Ok(Self {
            records,
            clock,
            upload_policy,
            profile,
            view: RaceView::default(),
            timer: ElapsedTimer::new(),
        })
    }

    /// Roster identity of this racer.
    pub fn profile(&self) -> &ParticipantEntity {
        &self.profile
    }

    /// Current locally observed race state.
    pub fn view(&self) -> &RaceView {
        &self.view
    }

    /// Elapsed seconds on the local display.
    pub fn elapsed_seconds(&self) -> u64 {
        self.timer.elapsed_seconds(self.clock.now())
    }

    /// HH:MM:SS local display.
    pub fn timer_display(&self) -> String {
        self.timer.display(self.clock.now())
    }

    /// Apply one observation tick against the shared record.
    pub async fn poll_once(&mut self) -> Result<PollOutcome, ServiceError> {
        let competition = self.load_competition().await?;
        Ok(self.observe(&competition))
    }

    /// Drive the observation loop until the ticker tears down.
    ///
    /// Store failures are logged and swallowed; the next tick is the retry.
    pub async fn run(&mut self, ticker: &mut dyn Ticker) {
        while ticker.wait().await {
            if let Err(err) = self.poll_once().await {
                warn!(error = %err, "poll tick failed; retrying on next tick");
            }
        }
        debug!(email = %self.profile.email, "observation loop torn down");
    }

    /// Record this racer's terminal submission and return the receipt.
    ///
    /// The guards here are the agent's own, not the registry's: the race
    /// must have been observed started with the drawing revealed and not
    /// stopped, and this agent refuses to double-submit. The registry
    /// itself would happily upsert; a resubmission is a coordinator-side
    /// affair through the server surface.
    pub async fn submit(
        &mut self,
        file_name: &str,
        file_size_bytes: u64,
        mass_grams: f64,
    ) -> Result<SubmissionReceipt, ServiceError> {
        let Some(race_started_at) = self.view.race_started_at else {
            return Err(ServiceError::Precondition(
                "the race has not started yet".into(),
            ));
        };
        if self.view.stopped {
            return Err(ServiceError::Precondition(
                "the race is closed; submissions are no longer accepted".into(),
            ));
        }
        if !self.view.revealed {
            return Err(ServiceError::Precondition(
                "the drawing has not been revealed yet".into(),
            ));
        }
        if self.view.submitted {
            return Err(ServiceError::Precondition(
                "you have already submitted your model".into(),
            ));
        }

        validate_mass(mass_grams)?;
        validate_model_file(&self.upload_policy, file_name, file_size_bytes)?;

        let submitted_at = self.clock.now();
        let elapsed_seconds = submitted_at
            .duration_since(race_started_at)
            .unwrap_or_default()
            .as_secs();

        let submission = SubmissionEntity {
            participant_id: self.profile.participant_id.clone(),
            name: self.profile.name.clone(),
            email: self.profile.email.clone(),
            file_name: file_name.to_owned(),
            file_size_bytes,
            mass_grams,
            race_started_at,
            submitted_at,
            elapsed_seconds,
        };

        let mut registry =
            SubmissionRegistry::from_entries(self.records.read_submissions().await?);
        registry.record(submission);
        let rank = registry
            .rank_of(&self.profile.email)
            .unwrap_or(registry.len());
        self.records
            .write_submissions(&registry.into_entries())
            .await?;

        self.view.submitted = true;
        self.timer.freeze(submitted_at);

        info!(email = %self.profile.email, rank, elapsed_seconds, "submission recorded");
        Ok(SubmissionReceipt {
            rank,
            elapsed_seconds,
            elapsed_display: format_hms(elapsed_seconds),
            file_name: file_name.to_owned(),
            mass_grams,
            submitted_at: format_system_time(submitted_at),
        })
    }

    /// Ranked standings plus counters, projected from the racer's side.
    pub async fn standings(&self) -> Result<LeaderboardResponse, ServiceError> {
        let competition = self.load_competition().await?;
        let roster = Roster::from_entries(self.records.read_roster().await?);
        let registry = SubmissionRegistry::from_entries(self.records.read_submissions().await?);

        let projection = leaderboard::project(competition.tag(), &roster, &registry);
        Ok(LeaderboardResponse {
            stats: projection.stats,
            standings: projection.standings,
        })
    }

    async fn load_competition(&self) -> Result<CompetitionState, ServiceError> {
        let entity = self.records.read_competition().await?;
        CompetitionState::try_from(entity)
            .map_err(|err| ServiceError::Unavailable(StorageError::corrupt(COMPETITION_KEY, err)))
    }

    /// Pure observation step: fold the fetched record into the local view.
    fn observe(&mut self, competition: &CompetitionState) -> PollOutcome {
        match competition {
            CompetitionState::NotStarted => {
                if self.has_local_race_state() {
                    self.view = RaceView::default();
                    self.timer.reset();
                    info!("competition reset observed; local race state cleared");
                    return PollOutcome::CompetitionReset;
                }
                PollOutcome::Unchanged
            }
            CompetitionState::Active(race) => {
                // An active record after an observed stop means the reset
                // slipped between two ticks; open a fresh epoch.
                if self.view.stopped {
                    self.view = RaceView::default();
                    self.timer.reset();
                }

                let mut outcome = PollOutcome::Unchanged;
                if self.view.race_started_at.is_none() {
                    let now = self.clock.now();
                    self.view.race_started_at = Some(now);
                    self.timer.start(now);
                    info!("race start observed; local clock anchored");
                    outcome = PollOutcome::RaceStarted;
                }
                if race.revealed && !self.view.revealed {
                    self.view.revealed = true;
                    self.view.drawing = race.drawing.clone();
                    self.view.material = Some(race.material.clone());
                    info!(material = %race.material, "drawing revealed; submissions unlocked");
                    outcome = PollOutcome::DrawingRevealed;
                }
                outcome
            }
            CompetitionState::Stopped(_) => {
                if !self.view.stopped {
                    self.view.stopped = true;
                    self.timer.freeze(self.clock.now());
                    info!("race stop observed; timer halted");
                    return PollOutcome::RaceStopped;
                }
                PollOutcome::Unchanged
            }
        }
    }

    fn has_local_race_state(&self) -> bool {
        self.view.race_started_at.is_some()
            || self.view.revealed
            || self.view.stopped
            || self.view.submitted
    }
}

pub mod registry;
pub mod state_machine;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::{
    config::AppConfig,
    dao::{
        records::SharedRecords,
        state_store::{COMPETITION_KEY, StateStore},
        storage::StorageError,
    },
    error::ServiceError,
    racer::clock::{Clock, SystemClock},
    state::state_machine::CompetitionState,
};

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Central application state shared by routes and services.
pub struct AppState {
    records: SharedRecords,
    config: AppConfig,
    clock: Arc<dyn Clock>,
    admin_token: String,
    write_gate: Mutex<()>,
}

impl AppState {
    /// Assemble the shared state for a server instance.
    pub fn new(config: AppConfig, store: Arc<dyn StateStore>, admin_token: String) -> SharedState {
        Self::with_clock(config, store, admin_token, Arc::new(SystemClock))
    }

    /// Same as [`AppState::new`] with an injected clock, for tests and tools.
    pub fn with_clock(
        config: AppConfig,
        store: Arc<dyn StateStore>,
        admin_token: String,
        clock: Arc<dyn Clock>,
    ) -> SharedState {
        Arc::new(Self {
            records: SharedRecords::new(store),
            config,
            clock,
            admin_token,
            write_gate: Mutex::new(()),
        })
    }

    /// Typed access to the three shared records.
    pub fn records(&self) -> &SharedRecords {
        &self.records
    }

    /// Runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Current instant on the coordinator clock.
    pub fn now(&self) -> std::time::SystemTime {
        self.clock.now()
    }

    /// Token expected on coordinator routes.
    pub fn admin_token(&self) -> &str {
        &self.admin_token
    }

    /// Serialize read-modify-write cycles against the shared records.
    ///
    /// Every service mutation holds this guard from its first read to its
    /// last write, so two HTTP-driven mutations in this process can never
    /// interleave. Agents outside the process are not covered; last write
    /// wins there, as the medium dictates.
    pub async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_gate.lock().await
    }

    /// Load and decode the competition record.
    pub async fn load_competition(&self) -> Result<CompetitionState, ServiceError> {
        let entity = self.records.read_competition().await?;
        CompetitionState::try_from(entity)
            .map_err(|err| ServiceError::Unavailable(StorageError::corrupt(COMPETITION_KEY, err)))
    }

    /// Persist the competition record wholesale.
    pub async fn store_competition(&self, state: &CompetitionState) -> Result<(), ServiceError> {
        self.records.write_competition(&state.into()).await?;
        Ok(())
    }
}

//! Typed access to the three shared records kept in the state store.
//!
//! Each record serializes to a standalone JSON document and is overwritten
//! wholesale, matching the per-key atomicity of the medium. A missing record
//! reads as its initial value, so a freshly wiped store behaves exactly like
//! one that has never been written.

use std::sync::Arc;

use serde::{Serialize, de::DeserializeOwned};

use crate::dao::{
    models::{CompetitionEntity, ParticipantEntity, SubmissionEntity},
    state_store::{COMPETITION_KEY, ROSTER_KEY, SUBMISSIONS_KEY, StateStore},
    storage::{StorageError, StorageResult},
};

/// Handle bundling a store with the JSON codec for its records.
#[derive(Clone)]
pub struct SharedRecords {
    store: Arc<dyn StateStore>,
}

impl SharedRecords {
    /// Wrap a store handle.
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        Self { store }
    }

    /// The underlying raw store.
    pub fn store(&self) -> &Arc<dyn StateStore> {
        &self.store
    }

    async fn read<T: DeserializeOwned>(&self, key: &str) -> StorageResult<Option<T>> {
        let Some(bytes) = self.store.get(key).await? else {
            return Ok(None);
        };
        serde_json::from_slice(&bytes)
            .map(Some)
            .map_err(|err| StorageError::corrupt(key, err))
    }

    async fn write<T: Serialize>(&self, key: &str, value: &T) -> StorageResult<()> {
        let bytes = serde_json::to_vec(value).map_err(|err| StorageError::corrupt(key, err))?;
        self.store.set(key, bytes).await
    }

    /// Read the competition record; absent reads as a not-started race.
    pub async fn read_competition(&self) -> StorageResult<CompetitionEntity> {
        Ok(self.read(COMPETITION_KEY).await?.unwrap_or_default())
    }

    /// Overwrite the competition record wholesale.
    pub async fn write_competition(&self, entity: &CompetitionEntity) -> StorageResult<()> {
        self.write(COMPETITION_KEY, entity).await
    }

    /// Read the participant roster; absent reads as empty.
    pub async fn read_roster(&self) -> StorageResult<Vec<ParticipantEntity>> {
        Ok(self.read(ROSTER_KEY).await?.unwrap_or_default())
    }

    /// Overwrite the participant roster wholesale.
    pub async fn write_roster(&self, roster: &[ParticipantEntity]) -> StorageResult<()> {
        self.write(ROSTER_KEY, &roster).await
    }

    /// Read the submission list; absent reads as empty.
    pub async fn read_submissions(&self) -> StorageResult<Vec<SubmissionEntity>> {
        Ok(self.read(SUBMISSIONS_KEY).await?.unwrap_or_default())
    }

    /// Overwrite the submission list wholesale.
    pub async fn write_submissions(&self, submissions: &[SubmissionEntity]) -> StorageResult<()> {
        self.write(SUBMISSIONS_KEY, &submissions).await
    }

    /// Wipe all three records back to their initial absent state.
    pub async fn clear_all(&self) -> StorageResult<()> {
        self.store.remove(COMPETITION_KEY).await?;
        self.store.remove(ROSTER_KEY).await?;
        self.store.remove(SUBMISSIONS_KEY).await?;
        Ok(())
    }
}

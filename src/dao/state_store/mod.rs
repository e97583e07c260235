//! Abstraction over the shared key-value medium every agent observes.
//!
//! The medium offers atomic reads and writes of whole records under fixed
//! keys, and nothing else: no transactions across keys and no change
//! notifications. Observers poll. Backends are selected at composition time
//! and injected as trait objects, so services and racer agents never know
//! which medium they are running against.

#[cfg(feature = "http-store")]
pub mod http;
pub mod memory;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

/// Store key holding the competition lifecycle record.
pub const COMPETITION_KEY: &str = "competition_state";
/// Store key holding the participant roster record.
pub const ROSTER_KEY: &str = "participants";
/// Store key holding the submission list record.
pub const SUBMISSIONS_KEY: &str = "submissions";

/// Shared key-value store.
///
/// Writes replace the record under a key wholesale; partial updates do not
/// exist at this level.
pub trait StateStore: Send + Sync {
    /// Fetch the raw record stored under `key`, if any.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>>;

    /// Overwrite the record stored under `key` wholesale.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'static, StorageResult<()>>;

    /// Delete the record stored under `key`; deleting an absent key is a no-op.
    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;

    /// Probe the backing medium.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}

//! Process-local store backed by a concurrent map.

use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;

use crate::dao::{state_store::StateStore, storage::StorageResult};

/// In-memory state store.
///
/// This is the medium a single-host deployment runs on and the backbone of
/// the test suite. Clones share the same underlying records, so handing a
/// clone to each agent models several processes around one shared store.
#[derive(Clone, Default)]
pub struct MemoryStateStore {
    records: Arc<DashMap<String, Vec<u8>>>,
}

impl MemoryStateStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

impl StateStore for MemoryStateStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let records = Arc::clone(&self.records);
        let key = key.to_owned();
        Box::pin(async move { Ok(records.get(&key).map(|entry| entry.value().clone())) })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'static, StorageResult<()>> {
        let records = Arc::clone(&self.records);
        let key = key.to_owned();
        Box::pin(async move {
            records.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let records = Arc::clone(&self.records);
        let key = key.to_owned();
        Box::pin(async move {
            records.remove(&key);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_remove_roundtrip() {
        let store = MemoryStateStore::new();

        assert_eq!(store.get("competition_state").await.unwrap(), None);

        store
            .set("competition_state", b"{\"phase\":\"active\"}".to_vec())
            .await
            .unwrap();
        assert_eq!(
            store.get("competition_state").await.unwrap(),
            Some(b"{\"phase\":\"active\"}".to_vec())
        );

        store.remove("competition_state").await.unwrap();
        assert_eq!(store.get("competition_state").await.unwrap(), None);
    }

    #[tokio::test]
    async fn removing_an_absent_key_is_a_noop() {
        let store = MemoryStateStore::new();
        store.remove("participants").await.unwrap();
    }

    #[tokio::test]
    async fn clones_share_the_same_records() {
        let store = MemoryStateStore::new();
        let observer = store.clone();

        store.set("participants", b"[]".to_vec()).await.unwrap();
        assert_eq!(
            observer.get("participants").await.unwrap(),
            Some(b"[]".to_vec())
        );
    }
}

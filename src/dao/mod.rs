/// Persistence entities for the shared records.
pub mod models;
/// Typed access to the three shared records.
pub mod records;
/// Shared key-value store abstraction and backends.
pub mod state_store;
/// Storage error types shared by every backend.
pub mod storage;

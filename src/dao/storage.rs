use std::error::Error;
use thiserror::Error;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by store backends regardless of the underlying medium.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backing medium could not be reached or refused the operation.
    #[error("store unavailable: {message}")]
    Unavailable {
        /// Description of the operation that failed.
        message: String,
        /// Backend failure that triggered this error.
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// A record was present but could not be decoded.
    #[error("corrupt record `{key}`: {message}")]
    Corrupt {
        /// Store key holding the undecodable record.
        key: String,
        /// Decoder diagnostic.
        message: String,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }

    /// Construct a corrupt-record error for the record stored under `key`.
    pub fn corrupt(key: &str, detail: impl std::fmt::Display) -> Self {
        StorageError::Corrupt {
            key: key.to_owned(),
            message: detail.to_string(),
        }
    }
}

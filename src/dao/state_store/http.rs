//! Network-backed store client for agents running outside the host process.
//!
//! Speaks the raw `/store/{key}` surface served by `routes::store`, so a
//! racer on another machine observes exactly the same records as the
//! in-process services. Every failure maps to [`StorageError::Unavailable`];
//! callers treat the next poll tick as the retry.

use std::sync::Arc;

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use thiserror::Error;

use crate::dao::{
    state_store::StateStore,
    storage::{StorageError, StorageResult},
};

/// Failures specific to the HTTP store backend.
#[derive(Debug, Error)]
pub enum HttpStoreError {
    /// Building the HTTP client failed.
    #[error("failed to build store client")]
    ClientBuilder {
        /// Underlying client construction failure.
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent or its body could not be read.
    #[error("store request `{operation}` failed")]
    Transport {
        /// Description of the attempted operation.
        operation: String,
        /// Underlying transport failure.
        #[source]
        source: reqwest::Error,
    },
    /// The remote store answered with an unexpected status code.
    #[error("store request `{operation}` returned status {status}")]
    Status {
        /// Description of the attempted operation.
        operation: String,
        /// Status code the remote store answered with.
        status: StatusCode,
    },
}

impl From<HttpStoreError> for StorageError {
    fn from(err: HttpStoreError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}

/// Configuration for the remote store client.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    /// Base URL of the instance exposing the raw store surface.
    pub base_url: String,
}

/// Client of a remote instance's `/store/{key}` surface.
#[derive(Clone)]
pub struct HttpStateStore {
    client: Client,
    base_url: Arc<str>,
}

impl HttpStateStore {
    /// Build a client against `config`, normalizing the base URL.
    pub fn new(config: HttpStoreConfig) -> StorageResult<Self> {
        let client = Client::builder()
            .build()
            .map_err(|source| HttpStoreError::ClientBuilder { source })?;
        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
        })
    }

    fn record_url(&self, key: &str) -> String {
        format!("{}/store/{key}", self.base_url)
    }
}

impl StateStore for HttpStateStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<Vec<u8>>>> {
        let client = self.client.clone();
        let url = self.record_url(key);
        let operation = format!("get `{key}`");
        Box::pin(async move {
            let response = client.get(&url).send().await.map_err(|source| {
                HttpStoreError::Transport {
                    operation: operation.clone(),
                    source,
                }
            })?;
            match response.status() {
                StatusCode::NOT_FOUND => Ok(None),
                status if status.is_success() => {
                    let bytes =
                        response
                            .bytes()
                            .await
                            .map_err(|source| HttpStoreError::Transport {
                                operation: operation.clone(),
                                source,
                            })?;
                    Ok(Some(bytes.to_vec()))
                }
                status => Err(HttpStoreError::Status { operation, status }.into()),
            }
        })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'static, StorageResult<()>> {
        let client = self.client.clone();
        let url = self.record_url(key);
        let operation = format!("set `{key}`");
        Box::pin(async move {
            let response = client.put(&url).body(value).send().await.map_err(|source| {
                HttpStoreError::Transport {
                    operation: operation.clone(),
                    source,
                }
            })?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(HttpStoreError::Status { operation, status }.into())
            }
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let client = self.client.clone();
        let url = self.record_url(key);
        let operation = format!("remove `{key}`");
        Box::pin(async move {
            let response = client.delete(&url).send().await.map_err(|source| {
                HttpStoreError::Transport {
                    operation: operation.clone(),
                    source,
                }
            })?;
            let status = response.status();
            if status.is_success() || status == StatusCode::NOT_FOUND {
                Ok(())
            } else {
                Err(HttpStoreError::Status { operation, status }.into())
            }
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let client = self.client.clone();
        let url = format!("{}/healthcheck", self.base_url);
        Box::pin(async move {
            let response =
                client
                    .get(&url)
                    .send()
                    .await
                    .map_err(|source| HttpStoreError::Transport {
                        operation: "health check".into(),
                        source,
                    })?;
            let status = response.status();
            if status.is_success() {
                Ok(())
            } else {
                Err(HttpStoreError::Status {
                    operation: "health check".into(),
                    status,
                }
                .into())
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slash_is_normalized_away() {
        let store = HttpStateStore::new(HttpStoreConfig {
            base_url: "http://localhost:8080/".into(),
        })
        .unwrap();
        assert_eq!(
            store.record_url("competition_state"),
            "http://localhost:8080/store/competition_state"
        );
    }
}

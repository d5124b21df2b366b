//! Timeout-bounded store client.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::StoreError;
use crate::remote::RemoteStore;

/// Default bound on a single store call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_millis(5000);

/// Shared handle to a [`RemoteStore`] with a per-call timeout.
///
/// The plain methods treat any failure, including a timeout, as "the call
/// did not happen": `get` yields `None`, `put`/`delete` yield `false`.
/// The `try_*` variants keep the error for callers that surface it.
#[derive(Clone)]
pub struct Client {
    store: Arc<dyn RemoteStore>,
    timeout: Duration,
}

impl Client {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self {
            store,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn try_get(&self, path: &str) -> Result<String, StoreError> {
        tokio::time::timeout(self.timeout, self.store.get(path))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    pub async fn try_put(&self, path: &str, json: &str) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.store.put(path, json))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    pub async fn try_delete(&self, path: &str) -> Result<(), StoreError> {
        tokio::time::timeout(self.timeout, self.store.delete(path))
            .await
            .map_err(|_| StoreError::Timeout)?
    }

    /// Reads `path`. Absent keys come back as `Some("null")`.
    pub async fn get(&self, path: &str) -> Option<String> {
        match self.try_get(path).await {
            Ok(body) => Some(body),
            Err(e) => {
                warn!(%path, error = %e, "get failed");
                None
            }
        }
    }

    pub async fn put(&self, path: &str, json: &str) -> bool {
        match self.try_put(path, json).await {
            Ok(()) => true,
            Err(e) => {
                warn!(%path, error = %e, "put failed");
                false
            }
        }
    }

    pub async fn delete(&self, path: &str) -> bool {
        match self.try_delete(path).await {
            Ok(()) => true,
            Err(e) => {
                debug!(%path, error = %e, "delete failed");
                false
            }
        }
    }
}

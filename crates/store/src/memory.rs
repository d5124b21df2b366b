//! In-process document store.
//!
//! Keeps the whole tree as one `serde_json::Value` behind a mutex. Used by
//! tests and local play; latency and outages can be injected to exercise
//! the timeout paths.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use serde_json::{Map, Value};
use tracing::debug;

use crate::ABSENT;
use crate::error::StoreError;
use crate::remote::{RemoteStore, StoreFuture};

/// [`RemoteStore`] backed by an in-memory JSON tree.
#[derive(Default)]
pub struct MemoryStore {
    root: Mutex<Value>,
    latency_ms: AtomicU64,
    offline: AtomicBool,
}

fn segments(path: &str) -> Vec<&str> {
    path.split('/').filter(|s| !s.is_empty()).collect()
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store that delays every call by `latency`.
    pub fn with_latency(latency: Duration) -> Self {
        let store = Self::new();
        store.set_latency(latency);
        store
    }

    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::Relaxed);
    }

    /// While offline every call fails with [`StoreError::Offline`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Copy of the whole tree.
    pub fn dump(&self) -> Value {
        self.root.lock().map(|root| root.clone()).unwrap_or(Value::Null)
    }

    async fn round_trip(&self) -> Result<(), StoreError> {
        let latency = self.latency_ms.load(Ordering::Relaxed);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.offline.load(Ordering::Relaxed) {
            return Err(StoreError::Offline);
        }
        Ok(())
    }

    fn with_root<T>(&self, f: impl FnOnce(&mut Value) -> T) -> Result<T, StoreError> {
        let mut root = self
            .root
            .lock()
            .map_err(|_| StoreError::Rejected("store lock poisoned".into()))?;
        Ok(f(&mut root))
    }

    fn read(root: &Value, path: &str) -> String {
        let mut node = root;
        for segment in segments(path) {
            match node.get(segment) {
                Some(child) => node = child,
                None => return ABSENT.to_string(),
            }
        }
        node.to_string()
    }

    fn write(root: &mut Value, path: &str, value: Value) {
        if value.is_null() {
            Self::remove(root, path);
            return;
        }

        let mut node = root;
        for segment in segments(path) {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            let Some(map) = node.as_object_mut() else {
                return;
            };
            node = map.entry(segment).or_insert(Value::Null);
        }
        *node = value;
    }

    fn remove(root: &mut Value, path: &str) {
        let parts = segments(path);
        if parts.is_empty() {
            *root = Value::Null;
            return;
        }
        remove_at(root, &parts);
        if root.as_object().is_some_and(Map::is_empty) {
            *root = Value::Null;
        }
    }
}

/// Removes `parts` below `node`, pruning objects left empty.
fn remove_at(node: &mut Value, parts: &[&str]) {
    let Some(map) = node.as_object_mut() else {
        return;
    };
    let (first, rest) = (parts[0], &parts[1..]);
    if rest.is_empty() {
        map.remove(first);
        return;
    }
    if let Some(child) = map.get_mut(first) {
        remove_at(child, rest);
        if child.as_object().is_some_and(Map::is_empty) {
            map.remove(first);
        }
    }
}

impl RemoteStore for MemoryStore {
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, String> {
        Box::pin(async move {
            self.round_trip().await?;
            let body = self.with_root(|root| Self::read(root, path))?;
            debug!(%path, bytes = body.len(), "fetched");
            Ok(body)
        })
    }

    fn put<'a>(&'a self, path: &'a str, json: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            let value: Value = serde_json::from_str(json)?;
            self.round_trip().await?;
            self.with_root(|root| Self::write(root, path, value))?;
            debug!(%path, "uploaded");
            Ok(())
        })
    }

    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()> {
        Box::pin(async move {
            self.round_trip().await?;
            self.with_root(|root| Self::remove(root, path))?;
            debug!(%path, "deleted");
            Ok(())
        })
    }
}

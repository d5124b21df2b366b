//! Transport trait for the document store.

use std::future::Future;
use std::pin::Pin;

use crate::error::StoreError;

/// Boxed future returned by [`RemoteStore`] calls.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Abstract document store.
///
/// Values are UTF-8 JSON text. Implementations do not bound their own
/// latency; [`Client`](crate::Client) adds the per-call timeout.
pub trait RemoteStore: Send + Sync {
    /// Reads the JSON text stored at `path`, or [`ABSENT`](crate::ABSENT)
    /// when nothing is stored there.
    fn get<'a>(&'a self, path: &'a str) -> StoreFuture<'a, String>;

    /// Replaces the value at `path` with `json`.
    fn put<'a>(&'a self, path: &'a str, json: &'a str) -> StoreFuture<'a, ()>;

    /// Removes the value at `path` and everything below it.
    fn delete<'a>(&'a self, path: &'a str) -> StoreFuture<'a, ()>;
}

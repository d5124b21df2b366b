//! Path-addressed JSON document store used as the rendezvous point between
//! the two players of a duel.
//!
//! The store is a tree of JSON values addressed by `/`-separated paths.
//! [`RemoteStore`] is the transport seam; [`HttpStore`] talks to a REST
//! document database (`GET/PUT/DELETE {base}/{path}.json`) and
//! [`MemoryStore`] keeps the tree in process. [`Client`] wraps either one
//! with a bounded wait per call.

pub mod client;
pub mod error;
pub mod http;
pub mod memory;
pub mod remote;

pub use client::{Client, DEFAULT_TIMEOUT};
pub use error::StoreError;
pub use http::HttpStore;
pub use memory::MemoryStore;
pub use remote::{RemoteStore, StoreFuture};

/// Body returned for a path that holds no value.
pub const ABSENT: &str = "null";

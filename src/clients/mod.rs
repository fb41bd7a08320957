// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Capability traits for the external stores.
//!
//! The replicator never talks to a concrete SDK. The host builds one
//! implementation of each trait at process start, bundles them into
//! [`Clients`], and hands that to the [`Dispatcher`](crate::coordinator::Dispatcher).
//! Connections are reused across invocations without any hidden globals.
//!
//! # Example
//!
//! ```rust,no_run
//! use prod_replicator::clients::{BoxFuture, ObjectStore};
//! use prod_replicator::types::ObjectPayload;
//!
//! struct MyBucketClient { /* ... */ }
//!
//! impl ObjectStore for MyBucketClient {
//!     fn get_object(&self, _bucket: &str, _key: &str) -> BoxFuture<'_, Option<ObjectPayload>> {
//!         Box::pin(async move { Ok(None) })
//!     }
//!
//!     fn put_object(&self, _bucket: &str, _key: &str, _payload: ObjectPayload) -> BoxFuture<'_, ()> {
//!         Box::pin(async move { Ok(()) })
//!     }
//! }
//! ```

mod memory;

pub use memory::{InMemoryObjectStore, InMemoryPublisher, InMemoryQueue, InMemoryRecordStore, PublishedMessage};

use crate::types::{Item, ObjectPayload, RecordKey};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Type alias for boxed async futures (keeps the traits object safe).
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = ClientResult<T>> + Send + 'a>>;

/// Failure reported by a capability client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientError(pub String);

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::error::Error for ClientError {}

/// Object-store access: read from the source bucket, write to targets.
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch an object. `Ok(None)` means the key does not exist.
    fn get_object(&self, bucket: &str, key: &str) -> BoxFuture<'_, Option<ObjectPayload>>;

    /// Unconditionally overwrite an object.
    fn put_object(&self, bucket: &str, key: &str, payload: ObjectPayload) -> BoxFuture<'_, ()>;
}

/// Structured-record access: read from the source table, write to targets.
pub trait RecordStore: Send + Sync + 'static {
    /// Fetch a record by key. `Ok(None)` means no record matches.
    fn get_item(&self, table: &str, key: &RecordKey) -> BoxFuture<'_, Option<Item>>;

    /// Unconditionally overwrite a record.
    fn put_item(&self, table: &str, item: Item) -> BoxFuture<'_, ()>;
}

/// Pub/sub topic publishing.
pub trait NotificationPublisher: Send + Sync + 'static {
    fn publish(&self, topic: &str, subject: &str, message: String) -> BoxFuture<'_, ()>;
}

/// Parking-queue access.
pub trait MessageQueue: Send + Sync + 'static {
    fn enqueue(&self, queue: &str, body: String) -> BoxFuture<'_, ()>;
}

/// The set of clients one dispatcher uses.
///
/// Cloning is cheap; every field is shared.
#[derive(Clone)]
pub struct Clients {
    pub objects: Arc<dyn ObjectStore>,
    pub records: Arc<dyn RecordStore>,
    pub publisher: Arc<dyn NotificationPublisher>,
    pub queue: Arc<dyn MessageQueue>,
}

impl Clients {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        records: Arc<dyn RecordStore>,
        publisher: Arc<dyn NotificationPublisher>,
        queue: Arc<dyn MessageQueue>,
    ) -> Self {
        Self {
            objects,
            records,
            publisher,
            queue,
        }
    }

    /// Clients backed entirely by in-memory stores (standalone mode).
    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(InMemoryObjectStore::new()),
            Arc::new(InMemoryRecordStore::new()),
            Arc::new(InMemoryPublisher::new()),
            Arc::new(InMemoryQueue::new()),
        )
    }
}

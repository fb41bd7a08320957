// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! In-memory client implementations for standalone mode and tests.
//!
//! Stores keep the last written value per location. Publisher and queue
//! record every message in arrival order.

use super::{BoxFuture, MessageQueue, NotificationPublisher, ObjectStore, RecordStore};
use crate::types::{Item, ObjectPayload, RecordKey};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Object store keyed by `(bucket, key)`.
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: RwLock<HashMap<(String, String), ObjectPayload>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object without going through the trait.
    pub async fn insert(&self, bucket: &str, key: &str, payload: ObjectPayload) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), payload);
    }

    /// Read back an object without going through the trait.
    pub async fn object(&self, bucket: &str, key: &str) -> Option<ObjectPayload> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }
}

impl ObjectStore for InMemoryObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> BoxFuture<'_, Option<ObjectPayload>> {
        let location = (bucket.to_string(), key.to_string());
        Box::pin(async move { Ok(self.objects.read().await.get(&location).cloned()) })
    }

    fn put_object(&self, bucket: &str, key: &str, payload: ObjectPayload) -> BoxFuture<'_, ()> {
        let location = (bucket.to_string(), key.to_string());
        Box::pin(async move {
            tracing::trace!(bucket = %location.0, key = %location.1, len = payload.len(), "InMemory: put object");
            self.objects.write().await.insert(location, payload);
            Ok(())
        })
    }
}

/// Record store holding a list of items per table.
///
/// Lookups match an item when every key attribute is present with an equal
/// value. Writes replace any item that matches on the store's key attribute
/// names, fixed at construction (`id` unless given).
pub struct InMemoryRecordStore {
    tables: RwLock<HashMap<String, Vec<Item>>>,
    key_attributes: Vec<String>,
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::with_key_attributes(["id"])
    }
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store whose tables are keyed on `names`.
    pub fn with_key_attributes<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tables: RwLock::new(HashMap::new()),
            key_attributes: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn key_attributes(&self) -> &[String] {
        &self.key_attributes
    }

    /// Seed a record without going through the trait.
    pub async fn insert(&self, table: &str, item: Item) {
        self.tables
            .write()
            .await
            .entry(table.to_string())
            .or_default()
            .push(item);
    }

    /// All records currently stored in `table`.
    pub async fn items(&self, table: &str) -> Vec<Item> {
        self.tables.read().await.get(table).cloned().unwrap_or_default()
    }
}

fn matches_key(item: &Item, key: &RecordKey) -> bool {
    key.iter().all(|(name, value)| item.get(name) == Some(value))
}

impl RecordStore for InMemoryRecordStore {
    fn get_item(&self, table: &str, key: &RecordKey) -> BoxFuture<'_, Option<Item>> {
        let table = table.to_string();
        let key = key.clone();
        Box::pin(async move {
            let tables = self.tables.read().await;
            Ok(tables
                .get(&table)
                .and_then(|items| items.iter().find(|item| matches_key(item, &key)))
                .cloned())
        })
    }

    fn put_item(&self, table: &str, item: Item) -> BoxFuture<'_, ()> {
        let table = table.to_string();
        Box::pin(async move {
            let key: RecordKey = self
                .key_attributes
                .iter()
                .filter_map(|name| item.get(name).map(|v| (name.clone(), v.clone())))
                .collect();
            let mut tables = self.tables.write().await;
            let items = tables.entry(table).or_default();
            match items.iter_mut().find(|existing| !key.is_empty() && matches_key(existing, &key)) {
                Some(existing) => *existing = item,
                None => items.push(item),
            }
            Ok(())
        })
    }
}

/// A message captured by [`InMemoryPublisher`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedMessage {
    pub topic: String,
    pub subject: String,
    pub message: String,
}

/// Publisher that records every message.
#[derive(Default)]
pub struct InMemoryPublisher {
    messages: RwLock<Vec<PublishedMessage>>,
}

impl InMemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<PublishedMessage> {
        self.messages.read().await.clone()
    }
}

impl NotificationPublisher for InMemoryPublisher {
    fn publish(&self, topic: &str, subject: &str, message: String) -> BoxFuture<'_, ()> {
        let published = PublishedMessage {
            topic: topic.to_string(),
            subject: subject.to_string(),
            message,
        };
        Box::pin(async move {
            self.messages.write().await.push(published);
            Ok(())
        })
    }
}

/// Queue that records every enqueued body as `(queue, body)`.
#[derive(Default)]
pub struct InMemoryQueue {
    messages: RwLock<Vec<(String, String)>>,
}

impl InMemoryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn messages(&self) -> Vec<(String, String)> {
        self.messages.read().await.clone()
    }
}

impl MessageQueue for InMemoryQueue {
    fn enqueue(&self, queue: &str, body: String) -> BoxFuture<'_, ()> {
        let queue = queue.to_string();
        Box::pin(async move {
            self.messages.write().await.push((queue, body));
            Ok(())
        })
    }
}

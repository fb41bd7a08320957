//! Mock capability clients for testing.
//!
//! Every mock records its calls for assertions and can be told to fail,
//! either for a number of leading calls or for a specific bucket or table.

use prod_replicator::clients::{
    BoxFuture, ClientError, MessageQueue, NotificationPublisher, ObjectStore, RecordStore,
};
use prod_replicator::types::{AttributeValue, Item, ObjectPayload, RecordKey};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// Consume one unit of a "fail the next N calls" budget.
fn take_failure(budget: &AtomicUsize) -> bool {
    budget
        .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
        .is_ok()
}

// =============================================================================
// Object store
// =============================================================================

/// Object store that records every call.
#[derive(Default)]
pub struct MockObjectStore {
    objects: RwLock<HashMap<(String, String), ObjectPayload>>,
    gets: RwLock<Vec<(String, String)>>,
    puts: RwLock<Vec<(String, String)>>,
    /// Fail this many leading reads
    failing_reads: AtomicUsize,
    /// Writes to these buckets always fail
    failing_buckets: RwLock<HashSet<String>>,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, bucket: &str, key: &str, payload: ObjectPayload) {
        self.objects
            .write()
            .await
            .insert((bucket.to_string(), key.to_string()), payload);
    }

    pub fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    pub async fn fail_writes_to(&self, bucket: &str) {
        self.failing_buckets.write().await.insert(bucket.to_string());
    }

    pub async fn object(&self, bucket: &str, key: &str) -> Option<ObjectPayload> {
        self.objects
            .read()
            .await
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }

    pub async fn get_calls(&self) -> Vec<(String, String)> {
        self.gets.read().await.clone()
    }

    pub async fn put_calls(&self) -> Vec<(String, String)> {
        self.puts.read().await.clone()
    }
}

impl ObjectStore for MockObjectStore {
    fn get_object(&self, bucket: &str, key: &str) -> BoxFuture<'_, Option<ObjectPayload>> {
        let location = (bucket.to_string(), key.to_string());
        Box::pin(async move {
            self.gets.write().await.push(location.clone());
            if take_failure(&self.failing_reads) {
                return Err(ClientError("SlowDown".into()));
            }
            Ok(self.objects.read().await.get(&location).cloned())
        })
    }

    fn put_object(&self, bucket: &str, key: &str, payload: ObjectPayload) -> BoxFuture<'_, ()> {
        let location = (bucket.to_string(), key.to_string());
        Box::pin(async move {
            self.puts.write().await.push(location.clone());
            if self.failing_buckets.read().await.contains(&location.0) {
                return Err(ClientError("AccessDenied".into()));
            }
            self.objects.write().await.insert(location, payload);
            Ok(())
        })
    }
}

// =============================================================================
// Record store
// =============================================================================

/// Record store keyed on a single string attribute named `id`.
#[derive(Default)]
pub struct MockRecordStore {
    tables: RwLock<HashMap<String, HashMap<String, Item>>>,
    gets: RwLock<Vec<(String, RecordKey)>>,
    puts: RwLock<Vec<(String, Item)>>,
    failing_reads: AtomicUsize,
    failing_tables: RwLock<HashSet<String>>,
}

fn id_of(attributes: &HashMap<String, AttributeValue>) -> Option<String> {
    attributes.get("id").and_then(|v| v.as_s()).map(str::to_string)
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn seed(&self, table: &str, item: Item) {
        if let Some(id) = id_of(&item) {
            self.tables
                .write()
                .await
                .entry(table.to_string())
                .or_default()
                .insert(id, item);
        }
    }

    pub fn fail_next_reads(&self, n: usize) {
        self.failing_reads.store(n, Ordering::SeqCst);
    }

    pub async fn fail_writes_to(&self, table: &str) {
        self.failing_tables.write().await.insert(table.to_string());
    }

    pub async fn item(&self, table: &str, id: &str) -> Option<Item> {
        self.tables.read().await.get(table).and_then(|t| t.get(id)).cloned()
    }

    pub async fn get_calls(&self) -> Vec<(String, RecordKey)> {
        self.gets.read().await.clone()
    }

    pub async fn put_calls(&self) -> Vec<(String, Item)> {
        self.puts.read().await.clone()
    }
}

impl RecordStore for MockRecordStore {
    fn get_item(&self, table: &str, key: &RecordKey) -> BoxFuture<'_, Option<Item>> {
        let table = table.to_string();
        let key = key.clone();
        Box::pin(async move {
            self.gets.write().await.push((table.clone(), key.clone()));
            if take_failure(&self.failing_reads) {
                return Err(ClientError("ProvisionedThroughputExceededException".into()));
            }
            let found = match id_of(&key) {
                Some(id) => self.item(&table, &id).await,
                None => None,
            };
            Ok(found)
        })
    }

    fn put_item(&self, table: &str, item: Item) -> BoxFuture<'_, ()> {
        let table = table.to_string();
        Box::pin(async move {
            self.puts.write().await.push((table.clone(), item.clone()));
            if self.failing_tables.read().await.contains(&table) {
                return Err(ClientError("ResourceNotFoundException".into()));
            }
            self.seed(&table, item).await;
            Ok(())
        })
    }
}

// =============================================================================
// Publisher and queue
// =============================================================================

/// A recorded publish() call.
#[derive(Debug, Clone)]
pub struct PublishCall {
    pub topic: String,
    pub subject: String,
    pub message: String,
}

impl PublishCall {
    /// The message body decoded as JSON.
    pub fn body(&self) -> serde_json::Value {
        serde_json::from_str(&self.message).unwrap()
    }
}

#[derive(Default)]
pub struct MockPublisher {
    calls: RwLock<Vec<PublishCall>>,
    failing: AtomicBool,
}

impl MockPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every publish fail. Calls are still recorded.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<PublishCall> {
        self.calls.read().await.clone()
    }
}

impl NotificationPublisher for MockPublisher {
    fn publish(&self, topic: &str, subject: &str, message: String) -> BoxFuture<'_, ()> {
        let call = PublishCall {
            topic: topic.to_string(),
            subject: subject.to_string(),
            message,
        };
        Box::pin(async move {
            self.calls.write().await.push(call);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError("AuthorizationError".into()));
            }
            Ok(())
        })
    }
}

/// A recorded enqueue() call.
#[derive(Debug, Clone)]
pub struct EnqueueCall {
    pub queue: String,
    pub body: String,
}

impl EnqueueCall {
    pub fn body(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap()
    }
}

#[derive(Default)]
pub struct MockQueue {
    calls: RwLock<Vec<EnqueueCall>>,
    failing: AtomicBool,
}

impl MockQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<EnqueueCall> {
        self.calls.read().await.clone()
    }
}

impl MessageQueue for MockQueue {
    fn enqueue(&self, queue: &str, body: String) -> BoxFuture<'_, ()> {
        let call = EnqueueCall {
            queue: queue.to_string(),
            body,
        };
        Box::pin(async move {
            self.calls.write().await.push(call);
            if self.failing.load(Ordering::SeqCst) {
                return Err(ClientError("QueueDoesNotExist".into()));
            }
            Ok(())
        })
    }
}

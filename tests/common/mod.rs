//! Shared test utilities for dispatch and chaos tests.
//!
//! This module provides:
//! - Recording, failure-injecting mock clients
//! - A [`TestHarness`] wiring them into a dispatcher
//! - Event and record helpers

#![allow(dead_code)]

pub mod mock_clients;

pub use mock_clients::*;

use prod_replicator::event::{OBJECT_STORE_EVENT_SOURCE, RECORD_STORE_EVENT_SOURCE};
use prod_replicator::{AttributeValue, Clients, Dispatcher, Item, ReplicationEvent, ReplicatorConfig, RequestParameters};
use std::collections::HashMap;
use std::sync::Arc;

pub const SOURCE_BUCKET: &str = "company-data-prod";
pub const SOURCE_TABLE: &str = "pipeline-metadata-prod";
pub const DEV_BUCKET: &str = "company-data-dev-us-east-1-test";
pub const STAGING_BUCKET: &str = "company-data-staging-us-east-1-test";
pub const DEV_TABLE: &str = "pipeline-metadata-dev-test";
pub const STAGING_TABLE: &str = "pipeline-metadata-staging-test";
pub const SUCCESS_TOPIC: &str = "arn:aws:sns:us-east-1:000000000000:replication-success";
pub const FAILURE_TOPIC: &str = "arn:aws:sns:us-east-1:000000000000:replication-failure";

/// A dispatcher over mock clients, with handles to every mock.
pub struct TestHarness {
    pub objects: Arc<MockObjectStore>,
    pub records: Arc<MockRecordStore>,
    pub publisher: Arc<MockPublisher>,
    pub queue: Arc<MockQueue>,
    pub dispatcher: Dispatcher,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_config(ReplicatorConfig::for_testing())
    }

    pub fn with_config(config: ReplicatorConfig) -> Self {
        let objects = Arc::new(MockObjectStore::new());
        let records = Arc::new(MockRecordStore::new());
        let publisher = Arc::new(MockPublisher::new());
        let queue = Arc::new(MockQueue::new());
        let clients = Clients::new(objects.clone(), records.clone(), publisher.clone(), queue.clone());
        let dispatcher = Dispatcher::new(config, clients).expect("test config is valid");
        Self {
            objects,
            records,
            publisher,
            queue,
            dispatcher,
        }
    }
}

pub fn object_event(key: &str) -> ReplicationEvent {
    ReplicationEvent::new(OBJECT_STORE_EVENT_SOURCE, RequestParameters::with_key(key))
}

pub fn record_event(key: &str) -> ReplicationEvent {
    ReplicationEvent::new(RECORD_STORE_EVENT_SOURCE, RequestParameters::with_key(key))
}

pub fn record(id: &str, fields: &[(&str, &str)]) -> Item {
    let mut item: Item = HashMap::from([("id".to_string(), AttributeValue::S(id.to_string()))]);
    for (name, value) in fields {
        item.insert(name.to_string(), AttributeValue::S(value.to_string()));
    }
    item
}

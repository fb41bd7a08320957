//! # Prod Replicator
//!
//! An event-driven agent that copies production data to lower environments.
//!
//! ## Architecture
//!
//! Each invocation receives one change event. The dispatcher classifies it by
//! source system, replicates the referenced object or record to every target
//! environment and reports the outcome:
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────────────┐
//! │                             prod-replicator                               │
//! │                                                                           │
//! │  ┌────────────┐    ┌────────────────────┐    ┌─────────────────────────┐  │
//! │  │ Dispatcher │───►│ ObjectReplicator / │───►│ OutcomeReporter         │  │
//! │  │ (classify) │    │ RecordReplicator   │    │ (success / failure)     │  │
//! │  └────────────┘    └────────────────────┘    └─────────────────────────┘  │
//! │         │                    │                            ▲               │
//! │         │                    ▼                            │               │
//! │         │          ┌────────────────────┐    ┌─────────────────────────┐  │
//! │         │          │ retry_with_backoff │    │ DeadLetterSink          │  │
//! │         └─────────►│ (every transfer)   │    │ (failed events)         │  │
//! │                    └────────────────────┘    └─────────────────────────┘  │
//! └───────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All external systems sit behind the traits in [`clients`], so the host
//! decides which SDKs back them. [`Clients::in_memory`] runs everything
//! against in-process stores.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use prod_replicator::{Clients, Dispatcher, ReplicationEvent, ReplicatorConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let config = ReplicatorConfig::from_env().expect("Invalid configuration");
//!     let dispatcher = Dispatcher::new(config, Clients::in_memory()).expect("Failed to start");
//!
//!     let raw = r#"{"detail":{"eventSource":"s3.amazonaws.com","requestParameters":{"key":"a/b.json"}}}"#;
//!     let event = ReplicationEvent::from_json(raw).expect("Malformed event");
//!     match dispatcher.handle(&event).await {
//!         Ok(response) => println!("{}", response.body),
//!         Err(e) => eprintln!("replication failed: {}", e),
//!     }
//! }
//! ```

pub mod clients;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod event;
pub mod metrics;
pub mod notify;
pub mod replicator;
pub mod resilience;
pub mod types;

// Re-exports for convenience
pub use clients::{BoxFuture, ClientError, ClientResult, Clients};
pub use config::{NamingConfig, RecordKeyConfig, ReplicatorConfig, RetrySettings};
pub use coordinator::{DispatchReport, DispatchState, Dispatcher, InvocationResponse, OperationOutcome};
pub use error::{ReplicationError, Result};
pub use event::{ReplicationEvent, RequestParameters, SourceSystem};
pub use notify::{DeadLetterEntry, DeadLetterSink, NotificationMessage, OutcomeReporter};
pub use replicator::{augment_record, ObjectReplicator, RecordReplicator};
pub use resilience::{retry_with_backoff, RetryConfig};
pub use types::{AttributeValue, Item, ObjectPayload, RecordKey};

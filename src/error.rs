// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Error types for the replicator.
//!
//! Every failure an invocation can surface is a [`ReplicationError`].
//! Capability clients report their own failures as a plain
//! [`ClientError`](crate::clients::ClientError); the replicators classify
//! those into [`ReplicationError::Transfer`] once the backoff executor has
//! given up.
//!
//! # Error Categories
//!
//! | Error Type | Retryable | Description |
//! |------------|-----------|-------------|
//! | `NotFound` | No | Source object or record does not exist |
//! | `EmptyPayload` | No | Source object read returned no bytes |
//! | `MissingKey` | No | Event lacks a required identifier |
//! | `Transfer` | Yes | Downstream read/write failed after all retries |
//! | `Notification` | Yes | Publishing the outcome notification failed |
//! | `DeadLetter` | Yes | Enqueueing the parked event failed |
//! | `Config` | No | Configuration invalid or incomplete |
//! | `InvalidEvent` | No | Inbound payload could not be parsed |
//! | `Serialization` | No | Outbound message could not be encoded |
//!
//! # Retry Behavior
//!
//! [`ReplicationError::is_retryable()`] answers whether a *redelivery* of the
//! whole event by the external trigger could succeed. Local retries of single
//! reads and writes have already happened by the time one of these errors is
//! visible.

use crate::clients::ClientError;
use thiserror::Error;

/// Result type alias for replication operations.
pub type Result<T> = std::result::Result<T, ReplicationError>;

/// Errors that can occur while replicating one event.
#[derive(Error, Debug)]
pub enum ReplicationError {
    /// The source object or record does not exist.
    #[error("{resource} not found: {location}")]
    NotFound { resource: String, location: String },

    /// The source object was read but carried no content.
    #[error("Empty object body: {location}")]
    EmptyPayload { location: String },

    /// The event does not name the item to replicate.
    #[error("{0}")]
    MissingKey(String),

    /// A downstream read or write failed after exhausting retries.
    ///
    /// `location` is the `bucket/key` or table the call addressed.
    #[error("Transfer error ({operation} {location}): {source}")]
    Transfer {
        operation: String,
        location: String,
        #[source]
        source: ClientError,
    },

    /// Publishing to a notification channel failed. Never retried locally.
    #[error("Notification error ({channel}): {source}")]
    Notification {
        channel: String,
        #[source]
        source: ClientError,
    },

    /// Enqueueing to the dead-letter destination failed.
    #[error("Dead-letter error ({queue}): {source}")]
    DeadLetter {
        queue: String,
        #[source]
        source: ClientError,
    },

    /// Invalid or missing configuration.
    ///
    /// Raised at startup; fix the configuration and restart.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The inbound payload is not a replication event.
    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    /// Encoding an outbound message failed.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ReplicationError {
    /// Create a transfer error for a failed client call.
    pub fn transfer(
        operation: impl Into<String>,
        location: impl Into<String>,
        source: ClientError,
    ) -> Self {
        Self::Transfer {
            operation: operation.into(),
            location: location.into(),
            source,
        }
    }

    /// Create a not-found error for a source object.
    pub fn object_not_found(bucket: &str, key: &str) -> Self {
        Self::NotFound {
            resource: "Object".to_string(),
            location: format!("{}/{}", bucket, key),
        }
    }

    /// Create a not-found error for a source record.
    pub fn record_not_found(table: &str) -> Self {
        Self::NotFound {
            resource: "Item".to_string(),
            location: table.to_string(),
        }
    }

    /// Check if redelivering the event could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Transfer { .. } => true,
            Self::Notification { .. } => true,
            Self::DeadLetter { .. } => true,
            Self::NotFound { .. } => false,
            Self::EmptyPayload { .. } => false,
            Self::MissingKey(_) => false,
            Self::Config(_) => false,
            Self::InvalidEvent(_) => false,
            Self::Serialization(_) => false,
        }
    }

    /// Stable label for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::EmptyPayload { .. } => "empty_payload",
            Self::MissingKey(_) => "missing_key",
            Self::Transfer { .. } => "transfer",
            Self::Notification { .. } => "notification",
            Self::DeadLetter { .. } => "dead_letter",
            Self::Config(_) => "config",
            Self::InvalidEvent(_) => "invalid_event",
            Self::Serialization(_) => "serialization",
        }
    }
}

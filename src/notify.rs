// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Outcome reporting and dead-letter parking.
//!
//! [`OutcomeReporter`] publishes one structured message per invocation to
//! the success or failure channel. [`DeadLetterSink`] parks a failed event,
//! together with the error text, on the dead-letter queue for replay.
//!
//! Neither goes through the backoff executor. A failed publish or enqueue is
//! returned to the caller as a
//! [`Notification`](crate::error::ReplicationError::Notification) or
//! [`DeadLetter`](crate::error::ReplicationError::DeadLetter) error.

use crate::clients::{MessageQueue, NotificationPublisher};
use crate::error::{ReplicationError, Result};
use crate::event::ReplicationEvent;
use crate::metrics;
use crate::types::SOURCE_ENVIRONMENT;
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Subject of success notifications.
pub const SUCCESS_SUBJECT: &str = "Replication Success";

/// Subject of failure notifications.
pub const FAILURE_SUBJECT: &str = "Replication Failure";

/// ISO-8601 UTC timestamp with millisecond precision (`2025-01-01T00:00:00.000Z`).
pub fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Body of an outcome notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub success: bool,
    pub message: String,
    pub timestamp: String,
    /// Origin of the replicated data; always `prod`.
    pub environment: String,
}

impl NotificationMessage {
    pub fn new(success: bool, message: impl Into<String>) -> Self {
        Self {
            success,
            message: message.into(),
            timestamp: iso_timestamp(),
            environment: SOURCE_ENVIRONMENT.to_string(),
        }
    }
}

/// Publishes outcome notifications.
pub struct OutcomeReporter {
    publisher: Arc<dyn NotificationPublisher>,
    success_topic: String,
    failure_topic: String,
}

impl OutcomeReporter {
    pub fn new(
        publisher: Arc<dyn NotificationPublisher>,
        success_topic: impl Into<String>,
        failure_topic: impl Into<String>,
    ) -> Self {
        Self {
            publisher,
            success_topic: success_topic.into(),
            failure_topic: failure_topic.into(),
        }
    }

    /// Channel an outcome is published to.
    pub fn topic_for(&self, success: bool) -> &str {
        if success {
            &self.success_topic
        } else {
            &self.failure_topic
        }
    }

    /// Publish `{success, message, timestamp, environment}` to the channel
    /// matching `success`. Attempted exactly once.
    pub async fn report(&self, success: bool, message: &str) -> Result<()> {
        let topic = self.topic_for(success);
        let subject = if success { SUCCESS_SUBJECT } else { FAILURE_SUBJECT };
        let body = serde_json::to_string_pretty(&NotificationMessage::new(success, message))?;
        let channel = if success { "success" } else { "failure" };

        debug!(topic, subject, "Publishing outcome notification");
        let result = self
            .publisher
            .publish(topic, subject, body)
            .await
            .map_err(|source| ReplicationError::Notification {
                channel: topic.to_string(),
                source,
            });
        metrics::record_notification(channel, result.is_ok());
        result
    }
}

/// Body of a parked event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeadLetterEntry {
    pub event: ReplicationEvent,
    pub error: String,
    pub timestamp: String,
}

/// Parks failed events on the dead-letter queue.
pub struct DeadLetterSink {
    queue: Arc<dyn MessageQueue>,
    queue_id: String,
}

impl DeadLetterSink {
    pub fn new(queue: Arc<dyn MessageQueue>, queue_id: impl Into<String>) -> Self {
        Self {
            queue,
            queue_id: queue_id.into(),
        }
    }

    /// Enqueue `{event, error, timestamp}`.
    pub async fn park(&self, event: &ReplicationEvent, error_message: &str) -> Result<()> {
        let entry = DeadLetterEntry {
            event: event.clone(),
            error: error_message.to_string(),
            timestamp: iso_timestamp(),
        };
        let body = serde_json::to_string(&entry)?;

        let result = self
            .queue
            .enqueue(&self.queue_id, body)
            .await
            .map_err(|source| ReplicationError::DeadLetter {
                queue: self.queue_id.clone(),
                source,
            });
        metrics::record_dead_letter(result.is_ok());
        if result.is_ok() {
            info!(queue = %self.queue_id, error = error_message, "Event parked on dead-letter queue");
        }
        result
    }
}

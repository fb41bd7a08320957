// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Dispatch controller.
//!
//! The orchestrator that ties together:
//! - Object replication via [`crate::replicator::ObjectReplicator`]
//! - Record replication via [`crate::replicator::RecordReplicator`]
//! - Outcome notifications via [`crate::notify::OutcomeReporter`]
//! - Dead-letter parking via [`crate::notify::DeadLetterSink`]
//!
//! # Flow
//!
//! For each event:
//! 1. Classifies it by `detail.eventSource`
//! 2. Replicates to the target environments, one at a time, stopping at the
//!    first failure
//! 3. On success, publishes a success notification
//! 4. On any failure, parks the event, publishes a failure notification and
//!    returns the original error. If parking or the failure notification
//!    fails, that error is returned instead
//!
//! Invocations share no state, so one `Dispatcher` may serve many events
//! concurrently.

mod types;

pub use types::{DispatchReport, DispatchState, InvocationResponse, OperationOutcome};

use crate::clients::Clients;
use crate::config::ReplicatorConfig;
use crate::error::{ReplicationError, Result};
use crate::event::{ReplicationEvent, SourceSystem};
use crate::metrics;
use crate::notify::{DeadLetterSink, OutcomeReporter};
use crate::replicator::{ObjectReplicator, RecordReplicator};
use crate::types::{AttributeValue, RecordKey};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// What a classified event asks for.
#[derive(Debug)]
enum Plan {
    Object { key: String },
    Record { key: RecordKey, label: String },
    PassThrough { event_source: String },
}

/// Routes events to the matching replicator and reports the outcome.
///
/// # Example
///
/// ```rust,no_run
/// # async fn example() -> prod_replicator::Result<()> {
/// use prod_replicator::{Clients, Dispatcher, ReplicationEvent, ReplicatorConfig};
///
/// let config = ReplicatorConfig::from_env()?;
/// let dispatcher = Dispatcher::new(config, Clients::in_memory())?;
///
/// let event = ReplicationEvent::from_json(r#"{"detail":{"eventSource":"unknown.service"}}"#)?;
/// let response = dispatcher.handle(&event).await?;
/// assert_eq!(response.status_code, 200);
/// # Ok(())
/// # }
/// ```
pub struct Dispatcher {
    config: Arc<ReplicatorConfig>,
    objects: ObjectReplicator,
    records: RecordReplicator,
    reporter: OutcomeReporter,
    dead_letters: DeadLetterSink,
}

impl Dispatcher {
    /// Validate `config` and build a dispatcher over `clients`.
    pub fn new(config: ReplicatorConfig, clients: Clients) -> Result<Self> {
        config.validate()?;
        let config = Arc::new(config);

        info!(
            source_bucket = %config.source_bucket,
            source_table = %config.source_table,
            targets = %config.target_environments.join(", "),
            "Dispatcher configured"
        );

        Ok(Self {
            objects: ObjectReplicator::new(clients.objects, Arc::clone(&config)),
            records: RecordReplicator::new(clients.records, Arc::clone(&config)),
            reporter: OutcomeReporter::new(
                clients.publisher,
                config.success_topic.clone(),
                config.failure_topic.clone(),
            ),
            dead_letters: DeadLetterSink::new(clients.queue, config.dead_letter_queue.clone()),
            config,
        })
    }

    pub fn config(&self) -> &ReplicatorConfig {
        &self.config
    }

    /// Handle one event: the harness-facing entry point.
    ///
    /// Returns `{statusCode: 200}` on success. On failure the event has
    /// already been parked and reported, and the original error is returned.
    /// A failure to park or report replaces the original error.
    pub async fn handle(&self, event: &ReplicationEvent) -> Result<InvocationResponse> {
        self.dispatch(event).await.result
    }

    /// Handle one event and return the full report.
    pub async fn dispatch(&self, event: &ReplicationEvent) -> DispatchReport {
        let started = Instant::now();
        let source = event.source_system();
        let mut trail = vec![DispatchState::Received];

        debug!(
            event = %serde_json::to_string_pretty(event).unwrap_or_default(),
            "Received event"
        );

        match self.run(event, &mut trail).await {
            Ok((response, outcome)) => {
                advance(&mut trail, DispatchState::Done);
                let label = if outcome.is_some() { "success" } else { "pass_through" };
                metrics::record_invocation(source.label(), label, started.elapsed());
                DispatchReport {
                    result: Ok(response),
                    outcome,
                    transitions: trail,
                }
            }
            Err(err) => {
                error!(source = %source, error = %err, "Replication failed");
                metrics::record_error(err.kind());

                let message = err.to_string();
                let result = match self.dead_letter(event, &message, &mut trail).await {
                    Ok(()) => {
                        metrics::record_invocation(source.label(), "dead_lettered", started.elapsed());
                        Err(err)
                    }
                    Err(reporting_err) => {
                        error!(
                            error = %reporting_err,
                            original_error = %message,
                            "Failed to report replication failure"
                        );
                        metrics::record_error(reporting_err.kind());
                        metrics::record_invocation(source.label(), "report_failed", started.elapsed());
                        Err(reporting_err)
                    }
                };

                DispatchReport {
                    result,
                    outcome: Some(OperationOutcome::Failure {
                        message,
                        event: Box::new(event.clone()),
                    }),
                    transitions: trail,
                }
            }
        }
    }

    /// Everything up to and including the success notification.
    async fn run(
        &self,
        event: &ReplicationEvent,
        trail: &mut Vec<DispatchState>,
    ) -> Result<(InvocationResponse, Option<OperationOutcome>)> {
        let plan = self.classify(event)?;
        advance(trail, DispatchState::Classified);

        let targets = &self.config.target_environments;
        let message = match plan {
            Plan::PassThrough { event_source } => {
                info!(event_source = %event_source, "Event source is not replicated, nothing to do");
                let message = format!("No replication required for event source {}", event_source);
                return Ok((InvocationResponse::ok(&message), None));
            }
            Plan::Object { key } => {
                advance(trail, DispatchState::Replicating);
                for target_env in targets {
                    self.objects.replicate(&key, target_env).await?;
                }
                format!("Successfully replicated S3 object {} to {}", key, targets.join(", "))
            }
            Plan::Record { key, label } => {
                advance(trail, DispatchState::Replicating);
                self.records.replicate(&key).await?;
                format!(
                    "Successfully replicated DynamoDB item {} to {}",
                    label,
                    targets.join(", ")
                )
            }
        };

        advance(trail, DispatchState::Reporting);
        self.reporter.report(true, &message).await?;

        Ok((
            InvocationResponse::ok(&message),
            Some(OperationOutcome::Success { message }),
        ))
    }

    fn classify(&self, event: &ReplicationEvent) -> Result<Plan> {
        let source = event.source_system();
        debug!(source = %source, "Classifying event");

        match source {
            SourceSystem::ObjectStore => {
                let key = event
                    .key()
                    .ok_or_else(|| ReplicationError::MissingKey("S3 key not found in event".to_string()))?;
                Ok(Plan::Object { key: key.to_string() })
            }
            SourceSystem::RecordStore => {
                let (key, label) = self.record_key(event)?;
                Ok(Plan::Record { key, label })
            }
            SourceSystem::Other(event_source) => Ok(Plan::PassThrough { event_source }),
        }
    }

    /// Lookup key for a record-store event, plus a `name=value` label.
    fn record_key(&self, event: &ReplicationEvent) -> Result<(RecordKey, String)> {
        let key_config = &self.config.record_key;

        let value = match (event.key(), &key_config.placeholder) {
            (Some(key), _) => key.to_string(),
            (None, Some(placeholder)) => {
                // The event does not identify the record; the placeholder may
                // match nothing or the wrong record.
                warn!(
                    attribute = %key_config.attribute,
                    placeholder = %placeholder,
                    "DynamoDB key not found in event, using placeholder"
                );
                placeholder.clone()
            }
            (None, None) => {
                return Err(ReplicationError::MissingKey(
                    "DynamoDB key not found in event".to_string(),
                ))
            }
        };

        let label = format!("{}={}", key_config.attribute, value);
        let key = HashMap::from([(key_config.attribute.clone(), AttributeValue::S(value))]);
        Ok((key, label))
    }

    /// Park the event, then publish the failure notification.
    ///
    /// `DeadLettered` is entered once the event is parked. A failed park
    /// aborts before the notification; either failure is returned in place
    /// of the original error.
    async fn dead_letter(
        &self,
        event: &ReplicationEvent,
        message: &str,
        trail: &mut Vec<DispatchState>,
    ) -> Result<()> {
        self.dead_letters.park(event, message).await?;
        advance(trail, DispatchState::DeadLettered);

        let notification = format!("Replication failed: {}", message);
        self.reporter.report(false, &notification).await
    }
}

fn advance(trail: &mut Vec<DispatchState>, next: DispatchState) {
    if let Some(current) = trail.last() {
        debug_assert!(
            current.can_transition_to(next),
            "illegal dispatch transition {} -> {}",
            current,
            next
        );
    }
    debug!(state = %next, "Dispatch state");
    trail.push(next);
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Retries taken by the backoff executor
//! - Per-target replication results
//! - Invocation outcomes and latency
//! - Notification and dead-letter delivery
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `replicator_`:
//! - Counters end in `_total`
//! - Histograms track durations in seconds
//!
//! Nothing is recorded unless the host installs a `metrics` recorder.

use metrics::{counter, histogram};
use std::time::Duration;

fn status(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "failure"
    }
}

/// Record one retry (a failed attempt that will be tried again).
pub fn record_retry(operation: &str) {
    counter!("replicator_retries_total", "operation" => operation.to_string()).increment(1);
}

/// Record the result of replicating one resource to one target.
pub fn record_replication(resource: &str, target: &str, success: bool) {
    counter!(
        "replicator_replications_total",
        "resource" => resource.to_string(),
        "target" => target.to_string(),
        "status" => status(success)
    )
    .increment(1);
}

/// Record a finished invocation.
pub fn record_invocation(source: &str, outcome: &str, duration: Duration) {
    counter!(
        "replicator_invocations_total",
        "source" => source.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
    histogram!("replicator_invocation_duration_seconds", "source" => source.to_string())
        .record(duration.as_secs_f64());
}

/// Record an outcome notification publish.
pub fn record_notification(channel: &str, success: bool) {
    counter!(
        "replicator_notifications_total",
        "channel" => channel.to_string(),
        "status" => status(success)
    )
    .increment(1);
}

/// Record a dead-letter enqueue.
pub fn record_dead_letter(success: bool) {
    counter!("replicator_dead_letters_total", "status" => status(success)).increment(1);
}

/// Record an error by kind.
pub fn record_error(kind: &str) {
    counter!("replicator_errors_total", "kind" => kind.to_string()).increment(1);
}

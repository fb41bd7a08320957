// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Chaos tests: inject store and channel failures and verify the invocation
//! still ends in exactly one clear outcome.
//!
//! These tests verify the dispatcher handles failures without panics and
//! never reports success for a partial replication.
//!
//! Run with: cargo test --test chaos_tests -- --nocapture

mod common;

use common::*;
use prod_replicator::{DispatchState, ObjectPayload, ReplicationError};
use std::sync::Arc;
use tokio::time::{Duration, Instant};

// =============================================================================
// Transient store failures
// =============================================================================

/// Test: reads that fail a few times are retried and then succeed
#[tokio::test(start_paused = true)]
async fn flaky_reads_recover() {
    let h = TestHarness::new();
    h.objects.seed(SOURCE_BUCKET, "k", ObjectPayload::new(b"v".to_vec())).await;
    h.objects.fail_next_reads(2);

    let start = Instant::now();
    let response = h.dispatcher.handle(&object_event("k")).await.unwrap();

    assert_eq!(response.status_code, 200);
    // Two failures for dev, then one clean read for staging
    assert_eq!(h.objects.get_calls().await.len(), 4);
    // 1ms + 2ms of backoff
    assert!(start.elapsed() >= Duration::from_millis(3));
    assert!(h.queue.calls().await.is_empty());
}

/// Test: a read that never succeeds is attempted five times, then parked
#[tokio::test(start_paused = true)]
async fn exhausted_reads_dead_letter() {
    let h = TestHarness::new();
    h.objects.seed(SOURCE_BUCKET, "k", ObjectPayload::new(b"v".to_vec())).await;
    h.objects.fail_next_reads(usize::MAX);

    let start = Instant::now();
    let err = h.dispatcher.handle(&object_event("k")).await.unwrap_err();

    match &err {
        ReplicationError::Transfer { operation, source, .. } => {
            assert_eq!(operation, "get_object");
            assert_eq!(source.0, "SlowDown");
        }
        other => panic!("expected transfer error, got {:?}", other),
    }
    assert_eq!(h.objects.get_calls().await.len(), 5);
    assert!(h.objects.put_calls().await.is_empty());
    assert!(start.elapsed() >= Duration::from_millis(15));
    assert_eq!(h.queue.calls().await.len(), 1);
}

/// Test: flaky record reads recover without extra writes
#[tokio::test(start_paused = true)]
async fn flaky_record_reads_recover() {
    let h = TestHarness::new();
    h.records.seed(SOURCE_TABLE, record("r", &[])).await;
    h.records.fail_next_reads(3);

    h.dispatcher.handle(&record_event("r")).await.unwrap();

    assert_eq!(h.records.get_calls().await.len(), 4);
    assert_eq!(h.records.put_calls().await.len(), 2);
}

// =============================================================================
// Partial fan-out
// =============================================================================

/// Test: first target failure stops the fan-out
#[tokio::test(start_paused = true)]
async fn first_target_failure_skips_remaining() {
    let h = TestHarness::new();
    h.objects.seed(SOURCE_BUCKET, "k", ObjectPayload::new(b"v".to_vec())).await;
    h.objects.fail_writes_to(DEV_BUCKET).await;

    let err = h.dispatcher.handle(&object_event("k")).await.unwrap_err();

    assert!(err.to_string().contains(DEV_BUCKET));
    let puts = h.objects.put_calls().await;
    assert_eq!(puts.len(), 5);
    assert!(puts.iter().all(|(bucket, _)| bucket == DEV_BUCKET));
    assert!(h.objects.object(STAGING_BUCKET, "k").await.is_none());
}

/// Test: second target failure is a total failure, even though dev was written
#[tokio::test(start_paused = true)]
async fn second_target_failure_reports_failure() {
    let h = TestHarness::new();
    h.objects.seed(SOURCE_BUCKET, "k", ObjectPayload::new(b"v".to_vec())).await;
    h.objects.fail_writes_to(STAGING_BUCKET).await;

    let report = h.dispatcher.dispatch(&object_event("k")).await;

    assert!(report.result.is_err());
    assert_eq!(report.final_state(), Some(DispatchState::DeadLettered));
    // Dev copy stays; nothing rolls it back
    assert!(h.objects.object(DEV_BUCKET, "k").await.is_some());

    let calls = h.publisher.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].topic, FAILURE_TOPIC);
    assert_eq!(h.queue.calls().await.len(), 1);
}

/// Test: a failing record table aborts the remaining targets
#[tokio::test(start_paused = true)]
async fn record_target_failure_skips_remaining() {
    let h = TestHarness::new();
    h.records.seed(SOURCE_TABLE, record("r", &[])).await;
    h.records.fail_writes_to(DEV_TABLE).await;

    let err = h.dispatcher.handle(&record_event("r")).await.unwrap_err();

    assert!(matches!(err, ReplicationError::Transfer { .. }));
    assert!(h.records.item(STAGING_TABLE, "r").await.is_none());
    assert!(h
        .records
        .put_calls()
        .await
        .iter()
        .all(|(table, _)| table == DEV_TABLE));
}

// =============================================================================
// Channel failures
// =============================================================================

/// Test: success notification failure fails the invocation
#[tokio::test]
async fn success_notification_failure_is_dead_lettered() {
    let h = TestHarness::new();
    h.objects.seed(SOURCE_BUCKET, "k", ObjectPayload::new(b"v".to_vec())).await;
    h.publisher.set_failing(true);

    let report = h.dispatcher.dispatch(&object_event("k")).await;

    assert!(matches!(report.result, Err(ReplicationError::Notification { .. })));
    assert_eq!(
        report.transitions,
        vec![
            DispatchState::Received,
            DispatchState::Classified,
            DispatchState::Replicating,
            DispatchState::Reporting,
            DispatchState::DeadLettered,
        ]
    );
    // Success attempt, then failure attempt; neither is retried
    let calls = h.publisher.calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].topic, SUCCESS_TOPIC);
    assert_eq!(calls[1].topic, FAILURE_TOPIC);
    assert_eq!(h.queue.calls().await.len(), 1);
}

/// Test: a failed park aborts before the failure notification
#[tokio::test]
async fn queue_failure_aborts_failure_path() {
    let h = TestHarness::new();
    h.queue.set_failing(true);

    let report = h.dispatcher.dispatch(&object_event("missing")).await;

    match &report.result {
        Err(ReplicationError::DeadLetter { queue, source }) => {
            assert_eq!(queue, &prod_replicator::ReplicatorConfig::for_testing().dead_letter_queue);
            assert_eq!(source.0, "QueueDoesNotExist");
        }
        other => panic!("expected dead-letter error, got {:?}", other),
    }
    assert_eq!(h.queue.calls().await.len(), 1);
    assert!(h.publisher.calls().await.is_empty());
    // Never parked, so never dead-lettered
    assert_eq!(
        report.transitions,
        vec![DispatchState::Received, DispatchState::Classified, DispatchState::Replicating]
    );
    assert!(!report.final_state().unwrap().is_terminal());
}

/// Test: a failed failure notification replaces the original error
#[tokio::test]
async fn failure_notification_error_propagates() {
    let h = TestHarness::new();
    h.publisher.set_failing(true);

    let report = h.dispatcher.dispatch(&record_event("missing")).await;

    match &report.result {
        Err(ReplicationError::Notification { channel, source }) => {
            assert_eq!(channel, FAILURE_TOPIC);
            assert_eq!(source.0, "AuthorizationError");
        }
        other => panic!("expected notification error, got {:?}", other),
    }
    // Parked before the notification was attempted
    assert_eq!(h.queue.calls().await.len(), 1);
    assert_eq!(h.publisher.calls().await.len(), 1);
    assert_eq!(report.final_state(), Some(DispatchState::DeadLettered));
}

/// Test: with every channel down the park error wins and nothing is published
#[tokio::test]
async fn all_channels_down_returns_park_error() {
    let h = TestHarness::new();
    h.queue.set_failing(true);
    h.publisher.set_failing(true);

    let err = h.dispatcher.handle(&record_event("missing")).await.unwrap_err();

    assert!(matches!(err, ReplicationError::DeadLetter { .. }));
    assert_eq!(h.queue.calls().await.len(), 1);
    assert!(h.publisher.calls().await.is_empty());
}

// =============================================================================
// Concurrency
// =============================================================================

/// Test: concurrent invocations share no state
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_invocations_are_independent() {
    let h = Arc::new(TestHarness::new());
    for i in 0..16 {
        let key = format!("obj-{}", i);
        h.objects
            .seed(SOURCE_BUCKET, &key, ObjectPayload::new(key.clone().into_bytes()))
            .await;
    }

    let mut handles = Vec::new();
    for i in 0..20 {
        let h = Arc::clone(&h);
        handles.push(tokio::spawn(async move {
            // Keys 16..20 do not exist
            h.dispatcher.handle(&object_event(&format!("obj-{}", i))).await
        }));
    }

    let mut ok = 0;
    let mut failed = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(_) => failed += 1,
        }
    }

    assert_eq!(ok, 16);
    assert_eq!(failed, 4);
    assert_eq!(h.queue.calls().await.len(), 4);
    assert_eq!(h.publisher.calls().await.len(), 20);
    for i in 0..16 {
        let key = format!("obj-{}", i);
        let copy = h.objects.object(STAGING_BUCKET, &key).await.unwrap();
        assert_eq!(copy.body, key.into_bytes());
    }
}

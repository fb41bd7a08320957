// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Object-store replication.

use crate::clients::ObjectStore;
use crate::config::ReplicatorConfig;
use crate::error::{ReplicationError, Result};
use crate::metrics;
use crate::resilience::{retry_with_backoff, RetryConfig};
use std::sync::Arc;
use tracing::{info, instrument};

/// Copies one object from the production bucket to a target environment.
///
/// The target write is an unconditional overwrite of the same key, so
/// replaying `replicate(key, env)` leaves the target unchanged.
pub struct ObjectReplicator {
    store: Arc<dyn ObjectStore>,
    config: Arc<ReplicatorConfig>,
    retry: RetryConfig,
}

impl ObjectReplicator {
    pub fn new(store: Arc<dyn ObjectStore>, config: Arc<ReplicatorConfig>) -> Self {
        let retry = config.retry_config();
        Self {
            store,
            config,
            retry,
        }
    }

    /// Replicate `key` to `target_env`.
    ///
    /// 1. Read from the source bucket (retried). Missing objects fail with
    ///    `NotFound`; objects without content fail with `EmptyPayload`.
    /// 2. Write body and metadata to the target bucket (retried).
    ///
    /// A failed read aborts before any write.
    #[instrument(skip(self), fields(source_bucket = %self.config.source_bucket))]
    pub async fn replicate(&self, key: &str, target_env: &str) -> Result<()> {
        info!("Replicating S3 object {} to {}", key, target_env);
        let result = self.copy(key, target_env).await;
        metrics::record_replication("object", target_env, result.is_ok());
        result
    }

    async fn copy(&self, key: &str, target_env: &str) -> Result<()> {
        let source_bucket = self.config.source_bucket.as_str();
        let source_location = format!("{}/{}", source_bucket, key);

        let payload = retry_with_backoff(&self.retry, "get_object", || {
            self.store.get_object(source_bucket, key)
        })
        .await
        .map_err(|e| ReplicationError::transfer("get_object", &source_location, e))?
        .ok_or_else(|| ReplicationError::object_not_found(source_bucket, key))?;

        if payload.is_empty() {
            return Err(ReplicationError::EmptyPayload {
                location: source_location,
            });
        }

        let target_bucket = self.config.target_bucket(target_env);
        let target_location = format!("{}/{}", target_bucket, key);
        let size = payload.len();

        retry_with_backoff(&self.retry, "put_object", || {
            self.store.put_object(&target_bucket, key, payload.clone())
        })
        .await
        .map_err(|e| ReplicationError::transfer("put_object", &target_location, e))?;

        info!(bytes = size, "Successfully replicated S3 object to {}", target_location);
        Ok(())
    }
}

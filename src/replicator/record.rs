// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Record-store replication.
//!
//! A record is read once and written to every target environment in
//! configuration order. Each written copy is annotated with the target name,
//! the source environment and the write time.

use crate::clients::RecordStore;
use crate::config::ReplicatorConfig;
use crate::error::{ReplicationError, Result};
use crate::metrics;
use crate::resilience::{retry_with_backoff, RetryConfig};
use crate::types::{AttributeValue, Item, RecordKey, SOURCE_ENVIRONMENT};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Field holding the target environment name.
pub const ENVIRONMENT_FIELD: &str = "environment";

/// Field holding the source environment (always `prod`).
pub const REPLICATED_FROM_FIELD: &str = "replicatedFrom";

/// Field holding the write time in epoch milliseconds.
pub const REPLICATION_TIMESTAMP_FIELD: &str = "replicationTimestamp";

/// Copy of `source` annotated for `target_env`.
///
/// The three annotation fields always replace whatever the source carries.
pub fn augment_record(source: &Item, target_env: &str, timestamp_ms: i64) -> Item {
    let mut item = source.clone();
    item.insert(
        ENVIRONMENT_FIELD.to_string(),
        AttributeValue::S(target_env.to_string()),
    );
    item.insert(
        REPLICATED_FROM_FIELD.to_string(),
        AttributeValue::S(SOURCE_ENVIRONMENT.to_string()),
    );
    item.insert(
        REPLICATION_TIMESTAMP_FIELD.to_string(),
        AttributeValue::N(timestamp_ms.to_string()),
    );
    item
}

/// Copies one record from the production table to every target table.
pub struct RecordReplicator {
    store: Arc<dyn RecordStore>,
    config: Arc<ReplicatorConfig>,
    retry: RetryConfig,
}

impl RecordReplicator {
    pub fn new(store: Arc<dyn RecordStore>, config: Arc<ReplicatorConfig>) -> Self {
        let retry = config.retry_config();
        Self {
            store,
            config,
            retry,
        }
    }

    /// Replicate the record at `key` to all configured targets.
    ///
    /// Targets are written one after another; the first write that still
    /// fails after retries aborts the rest.
    #[instrument(skip(self, key), fields(source_table = %self.config.source_table))]
    pub async fn replicate(&self, key: &RecordKey) -> Result<()> {
        info!("Replicating DynamoDB item to target environments");
        let source_table = self.config.source_table.as_str();

        let source = retry_with_backoff(&self.retry, "get_item", || {
            self.store.get_item(source_table, key)
        })
        .await
        .map_err(|e| ReplicationError::transfer("get_item", source_table, e))?
        .ok_or_else(|| ReplicationError::record_not_found(source_table))?;

        for target_env in &self.config.target_environments {
            let result = self.write_target(&source, target_env).await;
            metrics::record_replication("record", target_env, result.is_ok());
            if let Err(e) = result {
                warn!(target_env = %target_env, error = %e, "Record replication aborted");
                return Err(e);
            }
        }
        Ok(())
    }

    async fn write_target(&self, source: &Item, target_env: &str) -> Result<()> {
        let target_table = self.config.target_table(target_env);

        retry_with_backoff(&self.retry, "put_item", || {
            // Stamped per attempt so the timestamp reflects the actual write
            let item = augment_record(source, target_env, chrono::Utc::now().timestamp_millis());
            self.store.put_item(&target_table, item)
        })
        .await
        .map_err(|e| ReplicationError::transfer("put_item", &target_table, e))?;

        info!("Successfully replicated DynamoDB item to {}", target_table);
        Ok(())
    }
}

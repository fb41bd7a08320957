// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Per-resource replication.
//!
//! - [`ObjectReplicator`]: one object to one target environment
//! - [`RecordReplicator`]: one record to every target environment, in order
//!
//! Both read once from the production source and overwrite the target, with
//! every store call wrapped in [`retry_with_backoff`](crate::resilience::retry_with_backoff).

mod object;
mod record;

pub use object::ObjectReplicator;
pub use record::{augment_record, RecordReplicator, ENVIRONMENT_FIELD, REPLICATED_FROM_FIELD, REPLICATION_TIMESTAMP_FIELD};

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Inbound change notifications.
//!
//! A [`ReplicationEvent`] is the parsed trigger payload:
//!
//! ```json
//! {
//!   "detail": {
//!     "eventSource": "s3.amazonaws.com",
//!     "eventName": "PutObject",
//!     "requestParameters": { "bucketName": "company-data-prod", "key": "a/b.json" }
//!   }
//! }
//! ```
//!
//! Fields the replicator does not use are kept, so a parked event is the
//! complete original.

use crate::error::{ReplicationError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `eventSource` value of object-store notifications.
pub const OBJECT_STORE_EVENT_SOURCE: &str = "s3.amazonaws.com";

/// `eventSource` value of record-store notifications.
pub const RECORD_STORE_EVENT_SOURCE: &str = "dynamodb.amazonaws.com";

/// The inbound trigger for one invocation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplicationEvent {
    pub detail: EventDetail,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The `detail` section of an event.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventDetail {
    pub event_source: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_name: Option<String>,

    #[serde(default)]
    pub request_parameters: RequestParameters,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Identifiers of the changed item. All optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Which store an event came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceSystem {
    ObjectStore,
    RecordStore,
    /// Anything else; replicated as a no-op.
    Other(String),
}

impl SourceSystem {
    pub fn from_event_source(event_source: &str) -> Self {
        match event_source {
            OBJECT_STORE_EVENT_SOURCE => Self::ObjectStore,
            RECORD_STORE_EVENT_SOURCE => Self::RecordStore,
            other => Self::Other(other.to_string()),
        }
    }

    /// Stable label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            Self::ObjectStore => "object-store",
            Self::RecordStore => "record-store",
            Self::Other(_) => "other",
        }
    }
}

impl std::fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Other(source) => write!(f, "other ({})", source),
            known => write!(f, "{}", known.label()),
        }
    }
}

impl ReplicationEvent {
    /// Build an event with the given source and parameters.
    pub fn new(event_source: impl Into<String>, request_parameters: RequestParameters) -> Self {
        Self {
            detail: EventDetail {
                event_source: event_source.into(),
                event_name: None,
                request_parameters,
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Parse a raw trigger payload.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| ReplicationError::InvalidEvent(e.to_string()))
    }

    /// Parse an already-decoded JSON value.
    pub fn from_value(value: Value) -> Result<Self> {
        serde_json::from_value(value).map_err(|e| ReplicationError::InvalidEvent(e.to_string()))
    }

    pub fn source_system(&self) -> SourceSystem {
        SourceSystem::from_event_source(&self.detail.event_source)
    }

    pub fn request_parameters(&self) -> &RequestParameters {
        &self.detail.request_parameters
    }

    /// The `key` request parameter, if present and non-empty.
    pub fn key(&self) -> Option<&str> {
        self.detail
            .request_parameters
            .key
            .as_deref()
            .filter(|k| !k.is_empty())
    }
}

impl RequestParameters {
    pub fn with_key(key: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            ..Self::default()
        }
    }
}

// Copyright (c) 2025-2026 Adrian Robinson. Licensed under the AGPL-3.0.
// See LICENSE file in the project root for full license text.

//! Payload types moved between the source and target stores.
//!
//! - [`ObjectPayload`]: raw bytes plus user metadata of one object-store item
//! - [`Item`]: one structured record, field name to [`AttributeValue`]
//! - [`RecordKey`]: the key attributes identifying a record
//!
//! All of these are transient: they live for one replication attempt.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Environment tag describing where replicated data comes from.
pub const SOURCE_ENVIRONMENT: &str = "prod";

/// One object read from the source bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectPayload {
    /// Object content.
    pub body: Vec<u8>,
    /// User metadata, written verbatim to every target.
    pub metadata: HashMap<String, String>,
}

impl ObjectPayload {
    pub fn new(body: impl Into<Vec<u8>>) -> Self {
        Self {
            body: body.into(),
            metadata: HashMap::new(),
        }
    }

    /// Attach one metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A typed record field value.
///
/// Serializes in the tagged shape used by DynamoDB (`{"S": "..."}`,
/// `{"N": "42"}`, ...). Numbers are carried as strings so no precision is
/// lost on the way through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttributeValue {
    #[serde(rename = "S")]
    S(String),
    #[serde(rename = "N")]
    N(String),
    #[serde(rename = "B")]
    B(Vec<u8>),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    L(Vec<AttributeValue>),
    #[serde(rename = "M")]
    M(HashMap<String, AttributeValue>),
    #[serde(rename = "SS")]
    Ss(Vec<String>),
    #[serde(rename = "NS")]
    Ns(Vec<String>),
}

impl AttributeValue {
    /// String value, if this is an `S`.
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    /// Number value as its decimal string, if this is an `N`.
    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }
}

/// One structured record.
pub type Item = HashMap<String, AttributeValue>;

/// Key attributes that identify a record in a table.
pub type RecordKey = HashMap<String, AttributeValue>;

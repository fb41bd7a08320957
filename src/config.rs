//! Configuration for the replicator.
//!
//! The host builds one [`ReplicatorConfig`] at startup, either from the
//! process environment with [`ReplicatorConfig::from_env()`] or by
//! deserializing JSON/YAML, and passes it to the
//! [`Dispatcher`](crate::coordinator::Dispatcher). The config is validated
//! before use; a missing required value stops the process.
//!
//! # Quick Start
//!
//! ```rust
//! use prod_replicator::config::ReplicatorConfig;
//!
//! let config = ReplicatorConfig {
//!     source_bucket: "company-data-prod".into(),
//!     ..ReplicatorConfig::for_testing()
//! };
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Configuration Structure
//!
//! ```text
//! ReplicatorConfig
//! ├── region: String                  # Deployment region
//! ├── source_bucket / source_table    # Production sources
//! ├── success_topic / failure_topic   # Outcome channels (distinct)
//! ├── dead_letter_queue: String       # Parking queue
//! ├── environment_suffix: String      # Naming suffix for targets
//! ├── target_environments: Vec<String> # Ordered, non-empty
//! ├── naming: NamingConfig            # Target name templates
//! ├── retry: RetrySettings            # Backoff executor policy
//! └── record_key: RecordKeyConfig     # Record key derivation
//! ```
//!
//! # Environment Variables
//!
//! | Variable | Required | Field |
//! |----------|----------|-------|
//! | `REGION` / `AWS_REGION` | No (`us-east-1`) | `region` |
//! | `PROD_BUCKET` | Yes | `source_bucket` |
//! | `PROD_TABLE` | Yes | `source_table` |
//! | `SUCCESS_TOPIC_ARN` | Yes | `success_topic` |
//! | `FAILURE_TOPIC_ARN` | Yes | `failure_topic` |
//! | `DLQ_URL` | Yes | `dead_letter_queue` |
//! | `ENVIRONMENT_SUFFIX` | Yes | `environment_suffix` |
//! | `TARGET_ENVIRONMENTS` | No (`dev,staging`) | `target_environments` |
//! | `MAX_RETRIES` | No (`5`) | `retry.max_attempts` |
//! | `INITIAL_DELAY` | No (`1s`) | `retry.initial_delay` |
//! | `RECORD_KEY_ATTRIBUTE` | No (`id`) | `record_key.attribute` |
//! | `RECORD_KEY_PLACEHOLDER` | No (`unknown`) | `record_key.placeholder` |
//! | `REQUIRE_RECORD_KEY` | No (`false`) | clears `record_key.placeholder` |

use crate::error::{ReplicationError, Result};
use crate::resilience::{RetryConfig, DEFAULT_MAX_ATTEMPTS};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;

/// Region used when neither `REGION` nor `AWS_REGION` is set.
pub const DEFAULT_REGION: &str = "us-east-1";

// ═══════════════════════════════════════════════════════════════════════════════
// Top-level config
// ═══════════════════════════════════════════════════════════════════════════════

/// Static configuration for one replicator process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReplicatorConfig {
    /// Deployment region, used in target bucket names.
    #[serde(default = "default_region")]
    pub region: String,

    /// Production bucket objects are read from.
    pub source_bucket: String,

    /// Production table records are read from.
    pub source_table: String,

    /// Channel for success notifications.
    pub success_topic: String,

    /// Channel for failure notifications. Must differ from `success_topic`.
    pub failure_topic: String,

    /// Parking queue for events that failed to replicate.
    pub dead_letter_queue: String,

    /// Suffix appended to every target bucket and table name.
    pub environment_suffix: String,

    /// Downstream environments, in replication order.
    #[serde(default = "default_target_environments")]
    pub target_environments: Vec<String>,

    #[serde(default)]
    pub naming: NamingConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub record_key: RecordKeyConfig,
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_target_environments() -> Vec<String> {
    vec!["dev".to_string(), "staging".to_string()]
}

impl ReplicatorConfig {
    /// Create a complete config for testing (1ms initial backoff).
    pub fn for_testing() -> Self {
        Self {
            region: DEFAULT_REGION.to_string(),
            source_bucket: "company-data-prod".to_string(),
            source_table: "pipeline-metadata-prod".to_string(),
            success_topic: "arn:aws:sns:us-east-1:000000000000:replication-success".to_string(),
            failure_topic: "arn:aws:sns:us-east-1:000000000000:replication-failure".to_string(),
            dead_letter_queue: "https://sqs.us-east-1.amazonaws.com/000000000000/replication-dlq"
                .to_string(),
            environment_suffix: "test".to_string(),
            target_environments: default_target_environments(),
            naming: NamingConfig::default(),
            retry: RetrySettings {
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                initial_delay: "1ms".to_string(),
            },
            record_key: RecordKeyConfig::default(),
        }
    }

    /// Load from the process environment and validate.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load using `lookup` to resolve variable names, then validate.
    ///
    /// Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let require = |name: &str| {
            get(name).ok_or_else(|| ReplicationError::Config(format!("{} is not set", name)))
        };

        let region = get("REGION")
            .or_else(|| get("AWS_REGION"))
            .unwrap_or_else(default_region);

        let target_environments = match get("TARGET_ENVIRONMENTS") {
            Some(list) => list
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect(),
            None => default_target_environments(),
        };

        let mut retry = RetrySettings::default();
        if let Some(raw) = get("MAX_RETRIES") {
            retry.max_attempts = raw.trim().parse().map_err(|_| {
                ReplicationError::Config(format!("MAX_RETRIES is not a number: {}", raw))
            })?;
        }
        if let Some(raw) = get("INITIAL_DELAY") {
            retry.initial_delay = raw;
        }

        let mut record_key = RecordKeyConfig::default();
        if let Some(attribute) = get("RECORD_KEY_ATTRIBUTE") {
            record_key.attribute = attribute;
        }
        if let Some(placeholder) = get("RECORD_KEY_PLACEHOLDER") {
            record_key.placeholder = Some(placeholder);
        }
        if let Some(raw) = get("REQUIRE_RECORD_KEY") {
            if parse_bool("REQUIRE_RECORD_KEY", &raw)? {
                record_key.placeholder = None;
            }
        }

        let config = Self {
            region,
            source_bucket: require("PROD_BUCKET")?,
            source_table: require("PROD_TABLE")?,
            success_topic: require("SUCCESS_TOPIC_ARN")?,
            failure_topic: require("FAILURE_TOPIC_ARN")?,
            dead_letter_queue: require("DLQ_URL")?,
            environment_suffix: require("ENVIRONMENT_SUFFIX")?,
            target_environments,
            naming: NamingConfig::default(),
            retry,
            record_key,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check every invariant the dispatcher relies on.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("region", &self.region),
            ("source_bucket", &self.source_bucket),
            ("source_table", &self.source_table),
            ("success_topic", &self.success_topic),
            ("failure_topic", &self.failure_topic),
            ("dead_letter_queue", &self.dead_letter_queue),
            ("environment_suffix", &self.environment_suffix),
            ("record_key.attribute", &self.record_key.attribute),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                return Err(ReplicationError::Config(format!("{} must not be empty", name)));
            }
        }

        if self.target_environments.is_empty() {
            return Err(ReplicationError::Config(
                "target_environments must name at least one environment".to_string(),
            ));
        }
        let mut seen = HashSet::new();
        for env in &self.target_environments {
            if env.trim().is_empty() {
                return Err(ReplicationError::Config(
                    "target_environments contains an empty name".to_string(),
                ));
            }
            if !seen.insert(env.as_str()) {
                return Err(ReplicationError::Config(format!(
                    "target environment listed twice: {}",
                    env
                )));
            }
        }

        if self.success_topic == self.failure_topic {
            return Err(ReplicationError::Config(
                "success_topic and failure_topic must be different channels".to_string(),
            ));
        }

        if self.retry.max_attempts == 0 {
            return Err(ReplicationError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        self.retry.initial_delay_duration()?;

        Ok(())
    }

    /// Bucket an object is written to for `target_env`.
    pub fn target_bucket(&self, target_env: &str) -> String {
        self.naming.render_bucket(target_env, &self.region, &self.environment_suffix)
    }

    /// Table a record is written to for `target_env`.
    pub fn target_table(&self, target_env: &str) -> String {
        self.naming.render_table(target_env, &self.region, &self.environment_suffix)
    }

    /// Backoff executor policy for store calls.
    ///
    /// Falls back to the default delay if the setting does not parse;
    /// [`validate()`](Self::validate) rejects such configs up front.
    pub fn retry_config(&self) -> RetryConfig {
        RetryConfig::new(
            self.retry.max_attempts,
            self.retry
                .initial_delay_duration()
                .unwrap_or(crate::resilience::DEFAULT_INITIAL_DELAY),
        )
    }
}

fn parse_bool(name: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ReplicationError::Config(format!("{} is not a boolean: {}", name, raw))),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// NamingConfig: target location templates
// ═══════════════════════════════════════════════════════════════════════════════

/// Templates for target bucket and table names.
///
/// Placeholders: `{env}`, `{region}`, `{suffix}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NamingConfig {
    #[serde(default = "default_bucket_template")]
    pub bucket_template: String,

    #[serde(default = "default_table_template")]
    pub table_template: String,
}

fn default_bucket_template() -> String {
    "company-data-{env}-{region}-{suffix}".to_string()
}

fn default_table_template() -> String {
    "pipeline-metadata-{env}-{suffix}".to_string()
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            bucket_template: default_bucket_template(),
            table_template: default_table_template(),
        }
    }
}

impl NamingConfig {
    pub fn render_bucket(&self, env: &str, region: &str, suffix: &str) -> String {
        render(&self.bucket_template, env, region, suffix)
    }

    pub fn render_table(&self, env: &str, region: &str, suffix: &str) -> String {
        render(&self.table_template, env, region, suffix)
    }
}

fn render(template: &str, env: &str, region: &str, suffix: &str) -> String {
    template
        .replace("{env}", env)
        .replace("{region}", region)
        .replace("{suffix}", suffix)
}

// ═══════════════════════════════════════════════════════════════════════════════
// RetrySettings: backoff executor policy
// ═══════════════════════════════════════════════════════════════════════════════

/// Serializable form of [`RetryConfig`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RetrySettings {
    /// Total attempts per store call, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,

    /// Wait after the first failure as a duration string (e.g., "1s").
    #[serde(default = "default_initial_delay")]
    pub initial_delay: String,
}

fn default_max_attempts() -> usize {
    DEFAULT_MAX_ATTEMPTS
}

fn default_initial_delay() -> String {
    "1s".to_string()
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay: default_initial_delay(),
        }
    }
}

impl RetrySettings {
    /// Parse the initial_delay string to a Duration.
    pub fn initial_delay_duration(&self) -> Result<Duration> {
        humantime::parse_duration(&self.initial_delay).map_err(|e| {
            ReplicationError::Config(format!(
                "retry.initial_delay is not a duration ({}): {}",
                self.initial_delay, e
            ))
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RecordKeyConfig: record-store key derivation
// ═══════════════════════════════════════════════════════════════════════════════

/// How a record-store event is turned into a lookup key.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordKeyConfig {
    /// Key attribute name in the source table.
    #[serde(default = "default_key_attribute")]
    pub attribute: String,

    /// Key used when the event carries none. `None` makes such events fail
    /// with a missing-key error instead.
    #[serde(default = "default_key_placeholder")]
    pub placeholder: Option<String>,
}

fn default_key_attribute() -> String {
    "id".to_string()
}

fn default_key_placeholder() -> Option<String> {
    Some("unknown".to_string())
}

impl Default for RecordKeyConfig {
    fn default() -> Self {
        Self {
            attribute: default_key_attribute(),
            placeholder: default_key_placeholder(),
        }
    }
}

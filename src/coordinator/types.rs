//! Dispatch state machine and invocation results.
//!
//! # State Transitions
//!
//! ```text
//! Received ──→ Classified ──→ Replicating ──→ Reporting ──→ Done
//!    │             │               │               │
//!    │             └── (other      │               │
//!    │                 source) ──→ Done            │
//!    │                             │               │
//!    └─────────────────────────────┴───────────────┴──→ DeadLettered
//! ```
//!
//! # State Descriptions
//!
//! - **Received**: Event accepted for this invocation.
//! - **Classified**: Source system known, identifiers extracted.
//! - **Replicating**: Copying to target environments.
//! - **Reporting**: Publishing the success notification.
//! - **Done**: Invocation succeeded (including no-op pass-through).
//! - **DeadLettered**: Event parked; the error goes to the caller. A dispatch
//!   whose event could not be parked never reaches this state.

use crate::error::Result;
use crate::event::ReplicationEvent;
use serde::{Deserialize, Serialize};

/// State of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Classified,
    Replicating,
    Reporting,
    Done,
    DeadLettered,
}

impl DispatchState {
    /// Whether the dispatcher may move from `self` to `next`.
    pub fn can_transition_to(self, next: DispatchState) -> bool {
        use DispatchState::*;
        matches!(
            (self, next),
            (Received, Classified)
                | (Classified, Replicating)
                | (Classified, Done)
                | (Replicating, Reporting)
                | (Reporting, Done)
                | (Received | Classified | Replicating | Reporting, DeadLettered)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, DispatchState::Done | DispatchState::DeadLettered)
    }
}

impl std::fmt::Display for DispatchState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DispatchState::Received => write!(f, "Received"),
            DispatchState::Classified => write!(f, "Classified"),
            DispatchState::Replicating => write!(f, "Replicating"),
            DispatchState::Reporting => write!(f, "Reporting"),
            DispatchState::Done => write!(f, "Done"),
            DispatchState::DeadLettered => write!(f, "DeadLettered"),
        }
    }
}

/// What an invocation concluded. Drives exactly one notification and, on
/// failure, exactly one dead-letter entry.
#[derive(Debug, Clone, PartialEq)]
pub enum OperationOutcome {
    Success {
        message: String,
    },
    Failure {
        message: String,
        event: Box<ReplicationEvent>,
    },
}

impl OperationOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, OperationOutcome::Success { .. })
    }

    pub fn message(&self) -> &str {
        match self {
            OperationOutcome::Success { message } | OperationOutcome::Failure { message, .. } => message,
        }
    }
}

/// Result handed back to the invoking harness on success.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvocationResponse {
    pub status_code: u16,
    /// JSON object `{"message": ...}`.
    pub body: String,
}

impl InvocationResponse {
    pub fn ok(message: &str) -> Self {
        Self {
            status_code: 200,
            body: serde_json::json!({ "message": message }).to_string(),
        }
    }
}

/// Everything one dispatch produced.
#[derive(Debug)]
pub struct DispatchReport {
    /// What the harness sees: a response, or the original error.
    pub result: Result<InvocationResponse>,
    /// `None` for pass-through events, which report nothing.
    pub outcome: Option<OperationOutcome>,
    /// Every state entered, starting with `Received`. Ends in a
    /// non-terminal state when a failed event could not be parked.
    pub transitions: Vec<DispatchState>,
}

impl DispatchReport {
    pub fn final_state(&self) -> Option<DispatchState> {
        self.transitions.last().copied()
    }
}

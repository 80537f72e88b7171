//! # Runtime Module
//!
//! The host model a contract executes in: receipts, outbound calls, and the
//! scheduler that carries an outcome from one receipt to the next.
//!
//! ## Receipt Lifecycle
//!
//! ```text
//! entry call ──► Promise ──► CallScheduler::schedule ──► CallId
//!                                                          │
//!                    (external effect happens here)        │
//!                                                          ▼
//! callback  ◄── CallbackInvocation ◄── resolve(CallId, CallStatus)
//! ```
//!
//! Every receipt runs to completion before the next one starts. Between the
//! entry call and its callback, any number of other receipts may run.
//!
//! ## Modules
//!
//! - **context** — [`ExecutionContext`]: who called, with what, when.
//! - **promise** — [`Promise`]: a description of an outbound call and its continuation.
//! - **scheduler** — [`LocalScheduler`]: an in-process scheduler that holds
//!   calls open until they are resolved.

pub mod context;
pub mod promise;
pub mod scheduler;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub use context::ExecutionContext;
pub use promise::{FunctionCall, Promise, PromiseAction};
pub use scheduler::{CallbackInvocation, LocalScheduler, ScheduledCall};

use crate::types::Gas;

// ---------------------------------------------------------------------------
// Call Status
// ---------------------------------------------------------------------------

/// Outcome of an external call as seen by its continuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallStatus {
    /// Not yet settled. Callbacks are normally only delivered once a call is
    /// terminal, so contracts seeing this should change nothing.
    Pending,
    /// The call executed successfully.
    Success,
    /// The call was rejected or panicked on the receiver side.
    Failure,
}

impl CallStatus {
    /// `Success` or `Failure`.
    pub fn is_terminal(self) -> bool {
        !matches!(self, CallStatus::Pending)
    }
}

impl fmt::Display for CallStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallStatus::Pending => write!(f, "pending"),
            CallStatus::Success => write!(f, "success"),
            CallStatus::Failure => write!(f, "failure"),
        }
    }
}

// ---------------------------------------------------------------------------
// Call Identifiers
// ---------------------------------------------------------------------------

/// Handle to a scheduled external call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CallId(pub u64);

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "call-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors raised while building or scheduling outbound calls.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerError {
    /// The argument payload could not be serialized.
    #[error("invalid call arguments: {0}")]
    InvalidArguments(String),

    /// The gas budget is above what a single call may carry.
    #[error("gas budget {requested} exceeds the per-call limit of {limit}")]
    GasExceeded {
        /// Gas the caller asked for.
        requested: Gas,
        /// Per-call maximum.
        limit: Gas,
    },

    /// No open call with this id.
    #[error("unknown call: {0}")]
    UnknownCall(CallId),

    /// A call can only be resolved with a terminal status.
    #[error("cannot resolve {0} with a non-terminal status")]
    NotTerminal(CallId),
}

// ---------------------------------------------------------------------------
// Scheduler Port
// ---------------------------------------------------------------------------

/// Accepts outbound calls from a contract.
///
/// Scheduling is the only way a contract reaches the outside world. The
/// scheduler owns the promise from here on; the contract learns the outcome
/// only through the continuation it chained.
pub trait CallScheduler {
    /// Queues `promise` on behalf of the receipt described by `origin`.
    fn schedule(
        &mut self,
        origin: &ExecutionContext,
        promise: Promise,
    ) -> Result<CallId, SchedulerError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_pending_is_non_terminal() {
        assert!(!CallStatus::Pending.is_terminal());
        assert!(CallStatus::Success.is_terminal());
        assert!(CallStatus::Failure.is_terminal());
    }

    #[test]
    fn status_serializes_snake_case() {
        let json = serde_json::to_string(&CallStatus::Failure).unwrap();
        assert_eq!(json, "\"failure\"");
        let back: CallStatus = serde_json::from_str("\"success\"").unwrap();
        assert_eq!(back, CallStatus::Success);
    }

    #[test]
    fn call_id_display() {
        assert_eq!(CallId(7).to_string(), "call-7");
    }
}

//! Two-phase flow outcomes.
//!
//! Both confirmation flows follow the same shape:
//!
//! ```text
//!               ┌──── Success ───► Confirmed
//! Initiated ────┼──── Failure ───► Reverted
//!               └──── Pending ───► Unresolved (no state change)
//! ```
//!
//! `Initiated` is the window between Phase 1 and Phase 2 and is not stored
//! anywhere: the scheduler's open call is the only record of it.

use serde::{Deserialize, Serialize};
use std::fmt;

use ledger_protocol::CallStatus;

/// What Phase 2 of a flow decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowOutcome {
    /// The external call succeeded and its effect is now reflected in state.
    Confirmed,
    /// The external call failed; the flow was unwound (or never applied).
    Reverted,
    /// The callback saw a non-terminal status and left state alone.
    Unresolved,
}

impl From<CallStatus> for FlowOutcome {
    fn from(status: CallStatus) -> Self {
        match status {
            CallStatus::Success => FlowOutcome::Confirmed,
            CallStatus::Failure => FlowOutcome::Reverted,
            CallStatus::Pending => FlowOutcome::Unresolved,
        }
    }
}

impl fmt::Display for FlowOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FlowOutcome::Confirmed => write!(f, "confirmed"),
            FlowOutcome::Reverted => write!(f, "reverted"),
            FlowOutcome::Unresolved => write!(f, "unresolved"),
        }
    }
}

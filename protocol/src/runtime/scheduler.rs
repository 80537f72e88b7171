//! # Local Call Scheduler
//!
//! An in-process [`CallScheduler`] that holds every outbound call open until
//! someone reports its outcome with [`LocalScheduler::resolve`]. In the node
//! that someone is an operator hitting the HTTP API; in tests it is the test.
//!
//! Resolving a call consumes it. If the call had a continuation that targets
//! the contract that scheduled it, the continuation comes back as a
//! [`CallbackInvocation`] for the host to execute as the next receipt. Any
//! other continuation becomes a new open call. [`LocalScheduler::callback_for`]
//! previews that callback without consuming the call.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::{CallId, CallScheduler, CallStatus, ExecutionContext, Promise, PromiseAction, SchedulerError};
use crate::identity::AccountId;
use crate::types::{Balance, Timestamp};

/// An open external call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledCall {
    /// Handle returned to the scheduling contract.
    pub id: CallId,
    /// Contract whose receipt scheduled the call.
    pub origin: AccountId,
    /// Signer of the originating transaction.
    pub signer: AccountId,
    /// Block timestamp of the scheduling receipt.
    pub scheduled_at: Timestamp,
    /// Account the action runs against.
    pub receiver: AccountId,
    /// The action awaiting an outcome.
    pub action: PromiseAction,
    /// What runs once the action is resolved.
    pub continuation: Option<Box<Promise>>,
}

impl ScheduledCall {
    /// Method name of the pending action, if it is a function call.
    pub fn method(&self) -> Option<&str> {
        match &self.action {
            PromiseAction::FunctionCall(call) => Some(&call.method),
            PromiseAction::Transfer { .. } => None,
        }
    }

    /// Value the action moves out of the origin contract.
    pub fn attached_value(&self) -> Balance {
        self.action.attached_value()
    }
}

/// A callback ready to be executed against the origin contract.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackInvocation {
    /// The call whose resolution produced this callback.
    pub resolved: CallId,
    /// The contract to invoke (always the origin).
    pub receiver: AccountId,
    /// Signer of the originating transaction.
    pub signer: AccountId,
    /// Callback method name.
    pub method: String,
    /// JSON-encoded callback arguments.
    pub args: Vec<u8>,
    /// Outcome of the resolved call.
    pub status: CallStatus,
}

/// In-process scheduler with an explicit resolution step.
#[derive(Debug, Default)]
pub struct LocalScheduler {
    open: BTreeMap<CallId, ScheduledCall>,
    next_id: u64,
}

impl LocalScheduler {
    /// Creates an empty scheduler.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open calls, oldest first.
    pub fn pending(&self) -> impl Iterator<Item = &ScheduledCall> {
        self.open.values()
    }

    /// Number of open calls.
    pub fn pending_count(&self) -> usize {
        self.open.len()
    }

    /// Looks up an open call.
    pub fn get(&self, id: CallId) -> Option<&ScheduledCall> {
        self.open.get(&id)
    }

    /// The callback that resolving `id` with `status` would release, without
    /// resolving it. The call stays open.
    ///
    /// A host runs this callback first and calls [`resolve`](Self::resolve)
    /// only once the callback has committed, so a failed callback leaves the
    /// call open for another attempt.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn callback_for(
        &self,
        id: CallId,
        status: CallStatus,
    ) -> Result<Option<CallbackInvocation>, SchedulerError> {
        if !status.is_terminal() {
            return Err(SchedulerError::NotTerminal(id));
        }
        let call = self.open.get(&id).ok_or(SchedulerError::UnknownCall(id))?;

        let Some(next) = call.continuation.as_deref() else {
            return Ok(None);
        };
        match &next.action {
            PromiseAction::FunctionCall(callback) if next.receiver == call.origin => {
                Ok(Some(CallbackInvocation {
                    resolved: id,
                    receiver: call.origin.clone(),
                    signer: call.signer.clone(),
                    method: callback.method.clone(),
                    args: callback.args.clone(),
                    status,
                }))
            }
            _ => Ok(None),
        }
    }

    /// Reports the outcome of an open call and releases its continuation.
    ///
    /// # Errors
    ///
    /// - [`SchedulerError::NotTerminal`] if `status` is `Pending`; the call stays open.
    /// - [`SchedulerError::UnknownCall`] if no open call has this id.
    pub fn resolve(
        &mut self,
        id: CallId,
        status: CallStatus,
    ) -> Result<Option<CallbackInvocation>, SchedulerError> {
        let invocation = self.callback_for(id, status)?;
        let call = self.open.remove(&id).ok_or(SchedulerError::UnknownCall(id))?;

        tracing::debug!(call = %id, receiver = %call.receiver, %status, "external call resolved");

        // A released callback passes on whatever it chained; any other
        // continuation is itself the next open call.
        let follow_up = match call.continuation {
            Some(next) if invocation.is_some() => next.continuation.map(|rest| *rest),
            Some(next) => Some(*next),
            None => None,
        };
        if let Some(promise) = follow_up {
            self.enqueue(call.origin, call.signer, call.scheduled_at, promise);
        }
        Ok(invocation)
    }

    fn enqueue(
        &mut self,
        origin: AccountId,
        signer: AccountId,
        scheduled_at: Timestamp,
        promise: Promise,
    ) -> CallId {
        self.next_id += 1;
        let id = CallId(self.next_id);
        self.open.insert(
            id,
            ScheduledCall {
                id,
                origin,
                signer,
                scheduled_at,
                receiver: promise.receiver,
                action: promise.action,
                continuation: promise.continuation,
            },
        );
        id
    }
}

impl CallScheduler for LocalScheduler {
    fn schedule(
        &mut self,
        origin: &ExecutionContext,
        promise: Promise,
    ) -> Result<CallId, SchedulerError> {
        let id = self.enqueue(
            origin.current_account_id.clone(),
            origin.signer_account_id.clone(),
            origin.block_timestamp,
            promise,
        );
        tracing::debug!(call = %id, origin = %origin.current_account_id, "external call scheduled");
        Ok(id)
    }
}

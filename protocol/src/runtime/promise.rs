//! Outbound calls and their continuations.
//!
//! A [`Promise`] is a description, not an effect: building one does nothing.
//! It only becomes an external call once handed to a
//! [`CallScheduler`](super::CallScheduler).
//!
//! ```text
//! Promise { receiver: factory.near, FunctionCall("deposit_fee", fee) }
//!     .then(Promise { receiver: <self>, FunctionCall("on_donation_sent", 0) })
//! ```

use serde::{Deserialize, Serialize};

use super::SchedulerError;
use crate::config::MAX_GAS_PER_CALL;
use crate::identity::AccountId;
use crate::types::{Balance, Gas};

/// A function call on a receiver account.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Method to invoke on the receiver.
    pub method: String,
    /// JSON-encoded argument payload.
    pub args: Vec<u8>,
    /// Value attached to the call.
    pub deposit: Balance,
    /// Gas budget for the call.
    pub gas: Gas,
}

/// What a promise does once executed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum PromiseAction {
    /// Invoke a method on the receiver.
    FunctionCall(FunctionCall),
    /// Move value to the receiver. No code runs on the receiver side.
    Transfer {
        /// Amount moved.
        amount: Balance,
    },
}

impl PromiseAction {
    /// Value this action takes out of the calling contract.
    pub fn attached_value(&self) -> Balance {
        match self {
            PromiseAction::FunctionCall(call) => call.deposit,
            PromiseAction::Transfer { amount } => *amount,
        }
    }
}

/// An outbound call plus, optionally, what to run after it settles.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Promise {
    /// Account the action is executed against.
    pub receiver: AccountId,
    /// The action itself.
    pub action: PromiseAction,
    /// Runs once `action` has a terminal outcome, and receives that outcome.
    pub continuation: Option<Box<Promise>>,
}

impl Promise {
    /// A function call with a JSON-encoded argument payload.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::InvalidArguments`] if `args` cannot be
    /// serialized and [`SchedulerError::GasExceeded`] if `gas` is above
    /// [`MAX_GAS_PER_CALL`].
    pub fn function_call<A: Serialize>(
        receiver: AccountId,
        method: impl Into<String>,
        args: &A,
        deposit: Balance,
        gas: Gas,
    ) -> Result<Self, SchedulerError> {
        if gas > MAX_GAS_PER_CALL {
            return Err(SchedulerError::GasExceeded {
                requested: gas,
                limit: MAX_GAS_PER_CALL,
            });
        }
        let args =
            serde_json::to_vec(args).map_err(|e| SchedulerError::InvalidArguments(e.to_string()))?;

        Ok(Self {
            receiver,
            action: PromiseAction::FunctionCall(FunctionCall {
                method: method.into(),
                args,
                deposit,
                gas,
            }),
            continuation: None,
        })
    }

    /// A plain value transfer.
    pub fn transfer(receiver: AccountId, amount: Balance) -> Self {
        Self {
            receiver,
            action: PromiseAction::Transfer { amount },
            continuation: None,
        }
    }

    /// Chains `next` to run after this promise settles.
    ///
    /// If a continuation already exists, `next` is appended to the end of the
    /// chain.
    pub fn then(mut self, next: Promise) -> Self {
        self.continuation = Some(Box::new(match self.continuation.take() {
            Some(existing) => existing.then(next),
            None => next,
        }));
        self
    }

    /// Method name if this is a function call.
    pub fn method(&self) -> Option<&str> {
        match &self.action {
            PromiseAction::FunctionCall(call) => Some(&call.method),
            PromiseAction::Transfer { .. } => None,
        }
    }
}

//! Errors returned by the donation escrow contract.
//!
//! Every variant except the infrastructure ones (`Storage`, `Scheduler`) is a
//! precondition violation: the receipt aborts and storage is left untouched.

use ledger_protocol::{AccountId, AccountIdError, Balance, SchedulerError, StorageError};
use thiserror::Error;

/// Errors that can occur during escrow operations.
#[derive(Debug, Error)]
pub enum ContractError {
    /// The contract has not been initialized yet.
    #[error("contract is not initialized")]
    NotInitialized,

    /// `init` was called on an initialized contract.
    #[error("contract is already initialized")]
    AlreadyInitialized,

    /// `init` was called without enough deposit to cover storage staking.
    #[error("insufficient stake: attached {attached}, required {required}")]
    InsufficientStake {
        /// Deposit attached to `init`.
        attached: Balance,
        /// Minimum stake.
        required: Balance,
    },

    /// An account id argument is malformed.
    #[error("invalid account id: {0}")]
    InvalidAccountId(#[from] AccountIdError),

    /// A donation below the minimum was attempted.
    #[error("donation too small: attached {attached}, minimum {minimum}")]
    DonationTooSmall {
        /// Deposit attached to `send_donation`.
        attached: Balance,
        /// Minimum donation.
        minimum: Balance,
    },

    /// The contract is a top-level account and has nowhere to send fees.
    #[error("no fee collector: {0} has no parent account")]
    NoFeeCollector(AccountId),

    /// A non-owner tried an owner-only operation.
    #[error("unauthorized: {caller} is not the owner")]
    NotOwner {
        /// Account that made the call.
        caller: AccountId,
    },

    /// A withdrawal below the minimum was attempted.
    #[error("withdrawal too small: requested {requested}, minimum {minimum}")]
    WithdrawalTooSmall {
        /// Amount asked for.
        requested: Balance,
        /// Minimum withdrawal.
        minimum: Balance,
    },

    /// A withdrawal larger than the held balance was attempted.
    #[error("insufficient balance: requested {requested}, available {available}")]
    InsufficientBalance {
        /// Amount asked for.
        requested: Balance,
        /// Current balance.
        available: Balance,
    },

    /// A credit would push the balance past `u128::MAX`.
    #[error("balance overflow: current {current}, credit {credit}")]
    BalanceOverflow {
        /// Balance before the failed credit.
        current: Balance,
        /// Amount that caused the overflow.
        credit: Balance,
    },

    /// A callback was invoked by someone other than the contract itself.
    #[error("method {method} is private; called by {predecessor}")]
    PrivateMethod {
        /// Callback name.
        method: &'static str,
        /// Account that invoked it.
        predecessor: AccountId,
    },

    /// The scheduler delivered a callback this contract does not define.
    #[error("unknown callback method: {0}")]
    UnknownMethod(String),

    /// A callback payload could not be decoded.
    #[error("invalid callback arguments: {0}")]
    InvalidArguments(String),

    /// Reading or writing contract storage failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// An outbound call could not be built or scheduled.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),
}

impl ContractError {
    /// Returns `true` for errors the caller caused (bad input, wrong state,
    /// wrong account), as opposed to infrastructure failures.
    pub fn is_precondition(&self) -> bool {
        !matches!(self, ContractError::Storage(_) | ContractError::Scheduler(_))
    }
}

pub type ContractResult<T> = Result<T, ContractError>;

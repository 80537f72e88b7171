//! # Withdrawal Confirmation Flow
//!
//! 1. **Phase 1** (`withdraw_donations`) — check the caller and the amount,
//!    debit the balance immediately, and schedule a transfer to the owner
//!    chained to a callback.
//! 2. **Phase 2** (`on_donations_withdrawn`) — on failure, put the amount
//!    back. On success there is nothing left to do.
//!
//! The debit happens before the transfer is known to succeed. While the
//! transfer is in flight the amount is missing from the balance, which is
//! what prevents a second withdrawal from spending it again.

use serde::{Deserialize, Serialize};

use ledger_protocol::{AccountId, Balance, CallId, CallStatus, Promise};

use crate::config::{CALLBACK_GAS, MIN_WITHDRAWAL_AMOUNT, ON_DONATIONS_WITHDRAWN};
use crate::error::{ContractError, ContractResult};
use crate::flow::FlowOutcome;
use crate::state::LedgerState;

/// Payload of the `on_donations_withdrawn` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalArgs {
    /// Amount debited in Phase 1.
    pub amount: Balance,
}

/// Returned by `withdraw_donations`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WithdrawalReceipt {
    /// Amount debited and in flight.
    pub amount: Balance,
    /// Balance right after the debit.
    pub remaining_balance: Balance,
    /// Handle of the transfer call.
    pub call: CallId,
}

/// Phase 1 checks and debit, in order: owner, minimum, balance.
///
/// On error `state` is unchanged.
pub fn begin_withdrawal(
    state: &mut LedgerState,
    caller: &AccountId,
    amount: Balance,
) -> ContractResult<Balance> {
    if !state.is_owner(caller) {
        return Err(ContractError::NotOwner {
            caller: caller.clone(),
        });
    }
    if amount < MIN_WITHDRAWAL_AMOUNT {
        return Err(ContractError::WithdrawalTooSmall {
            requested: amount,
            minimum: MIN_WITHDRAWAL_AMOUNT,
        });
    }
    state.debit(amount)
}

/// Builds the transfer to `owner`, chained to `on_donations_withdrawn` on
/// `contract`.
pub fn transfer_promise(
    contract: &AccountId,
    owner: &AccountId,
    amount: Balance,
) -> ContractResult<Promise> {
    let callback = Promise::function_call(
        contract.clone(),
        ON_DONATIONS_WITHDRAWN,
        &WithdrawalArgs { amount },
        0,
        CALLBACK_GAS,
    )?;
    Ok(Promise::transfer(owner.clone(), amount).then(callback))
}

/// Phase 2. Restores the debit if the transfer failed.
pub fn settle_withdrawal(
    state: &mut LedgerState,
    status: CallStatus,
    args: WithdrawalArgs,
) -> ContractResult<FlowOutcome> {
    match status {
        CallStatus::Success => {
            tracing::info!(
                owner = %state.owner,
                amount = %args.amount,
                "withdrawal confirmed"
            );
        }
        CallStatus::Failure => {
            let balance = state.credit(args.amount)?;
            tracing::warn!(
                owner = %state.owner,
                amount = %args.amount,
                balance = %balance,
                "withdrawal transfer failed; balance restored"
            );
        }
        CallStatus::Pending => {
            tracing::warn!(amount = %args.amount, "withdrawal callback saw a pending transfer");
        }
    }
    Ok(status.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_protocol::PromiseAction;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn funded(balance: Balance) -> LedgerState {
        let mut state = LedgerState::new(id("alice.near"));
        state.credit(balance).unwrap();
        state
    }

    #[test]
    fn owner_debit_applies_immediately() {
        let mut state = funded(MIN_WITHDRAWAL_AMOUNT * 5);
        let remaining = begin_withdrawal(&mut state, &id("alice.near"), MIN_WITHDRAWAL_AMOUNT * 2)
            .unwrap();
        assert_eq!(remaining, MIN_WITHDRAWAL_AMOUNT * 3);
        assert_eq!(state.balance, MIN_WITHDRAWAL_AMOUNT * 3);
    }

    #[test]
    fn non_owner_is_rejected_before_amount_checks() {
        let mut state = funded(0);
        let err = begin_withdrawal(&mut state, &id("mallory.near"), 1).unwrap_err();
        assert!(matches!(err, ContractError::NotOwner { .. }));
    }

    #[test]
    fn below_minimum_is_rejected() {
        let mut state = funded(MIN_WITHDRAWAL_AMOUNT * 5);
        let err =
            begin_withdrawal(&mut state, &id("alice.near"), MIN_WITHDRAWAL_AMOUNT - 1).unwrap_err();
        assert!(matches!(err, ContractError::WithdrawalTooSmall { .. }));
        assert_eq!(state.balance, MIN_WITHDRAWAL_AMOUNT * 5);
    }

    #[test]
    fn above_balance_is_rejected() {
        let mut state = funded(MIN_WITHDRAWAL_AMOUNT);
        let err =
            begin_withdrawal(&mut state, &id("alice.near"), MIN_WITHDRAWAL_AMOUNT + 1).unwrap_err();
        assert!(matches!(err, ContractError::InsufficientBalance { .. }));
        assert_eq!(state.balance, MIN_WITHDRAWAL_AMOUNT);
    }

    #[test]
    fn transfer_promise_targets_owner_then_contract() {
        let p = transfer_promise(&id("donations.factory.near"), &id("alice.near"), 42).unwrap();
        assert_eq!(p.receiver, id("alice.near"));
        assert_eq!(p.action, PromiseAction::Transfer { amount: 42 });

        let cb = p.continuation.as_ref().unwrap();
        assert_eq!(cb.receiver, id("donations.factory.near"));
        assert_eq!(cb.method(), Some(ON_DONATIONS_WITHDRAWN));
        assert_eq!(cb.action.attached_value(), 0);
    }

    #[test]
    fn failure_restores_the_debit() {
        let mut state = funded(100);
        state.debit(60).unwrap();
        let outcome =
            settle_withdrawal(&mut state, CallStatus::Failure, WithdrawalArgs { amount: 60 }).unwrap();
        assert_eq!(outcome, FlowOutcome::Reverted);
        assert_eq!(state.balance, 100);
    }

    #[test]
    fn success_and_pending_leave_the_debit() {
        for (status, expected) in [
            (CallStatus::Success, FlowOutcome::Confirmed),
            (CallStatus::Pending, FlowOutcome::Unresolved),
        ] {
            let mut state = funded(100);
            state.debit(60).unwrap();
            let outcome =
                settle_withdrawal(&mut state, status, WithdrawalArgs { amount: 60 }).unwrap();
            assert_eq!(outcome, expected);
            assert_eq!(state.balance, 40);
        }
    }
}

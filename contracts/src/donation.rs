//! # Donation Confirmation Flow
//!
//! 1. **Phase 1** (`send_donation`) — split the attached deposit into a fee
//!    and a net amount, forward the fee to the fee collector, and chain a
//!    callback carrying the net amount. Nothing is credited yet.
//! 2. **Phase 2** (`on_donation_sent`) — credit the net amount and record the
//!    donation if, and only if, the fee forward succeeded.
//!
//! A failed fee forward is not compensated: the fee is already with the
//! collector, and the net amount is simply never credited.

use serde::{Deserialize, Serialize};

use ledger_protocol::{AccountId, Balance, CallId, CallStatus, Promise, Timestamp};

use crate::config::{
    CALLBACK_GAS, FEE_DEPOSIT_METHOD, FEE_DIVISOR, FEE_FORWARD_GAS, ON_DONATION_SENT,
};
use crate::error::ContractResult;
use crate::flow::FlowOutcome;
use crate::state::{Donation, LedgerState};

/// A deposit split into platform fee and net donation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeSplit {
    /// `floor(deposit / FEE_DIVISOR)`, forwarded to the fee collector.
    pub fee: Balance,
    /// `deposit - fee`, credited on confirmation.
    pub net: Balance,
}

impl FeeSplit {
    /// The deposit this split came from.
    pub fn total(&self) -> Balance {
        self.fee + self.net
    }
}

/// Splits `deposit` into fee and net. Truncating division means the fee
/// never exceeds `deposit / FEE_DIVISOR`, and `fee + net == deposit`.
pub fn split_fee(deposit: Balance) -> FeeSplit {
    let fee = deposit / FEE_DIVISOR;
    FeeSplit {
        fee,
        net: deposit - fee,
    }
}

/// Payload of the `on_donation_sent` callback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationSentArgs {
    /// Net amount to credit.
    pub amount: Balance,
    /// Signer of `send_donation`.
    pub donor: AccountId,
    /// Block timestamp of the `send_donation` receipt.
    pub donated_at: Timestamp,
}

impl DonationSentArgs {
    /// The record stored once the donation is confirmed.
    pub fn to_donation(&self) -> Donation {
        Donation {
            donor: self.donor.clone(),
            amount: self.amount,
            timestamp: self.donated_at,
        }
    }
}

/// Returned by `send_donation`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DonationReceipt {
    /// Fee forwarded to the collector.
    pub fee: Balance,
    /// Net amount awaiting confirmation.
    pub net: Balance,
    /// Collector the fee was sent to.
    pub fee_collector: AccountId,
    /// Handle of the fee-forward call.
    pub call: CallId,
}

/// Builds `deposit_fee(fee)` on the collector, chained to
/// `on_donation_sent(args)` on `contract`.
pub fn fee_forward_promise(
    contract: &AccountId,
    fee_collector: &AccountId,
    fee: Balance,
    args: &DonationSentArgs,
) -> ContractResult<Promise> {
    let forward = Promise::function_call(
        fee_collector.clone(),
        FEE_DEPOSIT_METHOD,
        &serde_json::json!({}),
        fee,
        FEE_FORWARD_GAS,
    )?;
    let callback = Promise::function_call(contract.clone(), ON_DONATION_SENT, args, 0, CALLBACK_GAS)?;
    Ok(forward.then(callback))
}

/// Phase 2. Applies the fee-forward outcome to `state`.
pub fn confirm_donation(
    state: &mut LedgerState,
    status: CallStatus,
    args: &DonationSentArgs,
) -> ContractResult<FlowOutcome> {
    match status {
        CallStatus::Success => {
            let balance = state.credit(args.amount)?;
            let new_record = state.record_donation(args.to_donation());
            tracing::info!(
                donor = %args.donor,
                amount = %args.amount,
                timestamp = args.donated_at,
                balance = %balance,
                new_record,
                "donation confirmed"
            );
        }
        CallStatus::Failure => {
            tracing::warn!(
                donor = %args.donor,
                amount = %args.amount,
                "fee forward failed; donation not credited"
            );
        }
        CallStatus::Pending => {
            tracing::warn!(donor = %args.donor, "donation callback saw a pending fee forward");
        }
    }
    Ok(status.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_protocol::config::tokens;
    use ledger_protocol::PromiseAction;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn args(amount: Balance) -> DonationSentArgs {
        DonationSentArgs {
            amount,
            donor: id("bob.near"),
            donated_at: 1_700_000_000_000_000_000,
        }
    }

    #[test]
    fn split_conserves_the_deposit() {
        for deposit in [
            tokens(1),
            tokens(1) + 1,
            tokens(7) + 99,
            FEE_DIVISOR - 1,
            FEE_DIVISOR,
            Balance::MAX,
        ] {
            let split = split_fee(deposit);
            assert_eq!(split.fee, deposit / FEE_DIVISOR);
            assert_eq!(split.total(), deposit);
            assert!(split.fee <= split.net);
        }
    }

    #[test]
    fn split_of_one_token_is_one_percent() {
        let split = split_fee(tokens(1));
        assert_eq!(split.fee, tokens(1) / 100);
        assert_eq!(split.net, tokens(1) - tokens(1) / 100);
    }

    #[test]
    fn small_deposit_truncates_fee_to_zero() {
        let split = split_fee(FEE_DIVISOR - 1);
        assert_eq!(split.fee, 0);
        assert_eq!(split.net, FEE_DIVISOR - 1);
    }

    #[test]
    fn promise_chains_fee_forward_into_callback() {
        let contract = id("donations.factory.near");
        let collector = id("factory.near");
        let p = fee_forward_promise(&contract, &collector, 10, &args(990)).unwrap();

        assert_eq!(p.receiver, collector);
        assert_eq!(p.method(), Some(FEE_DEPOSIT_METHOD));
        assert_eq!(p.action.attached_value(), 10);

        let cb = p.continuation.as_ref().unwrap();
        assert_eq!(cb.receiver, contract);
        assert_eq!(cb.method(), Some(ON_DONATION_SENT));
        assert_eq!(cb.action.attached_value(), 0);
        match &cb.action {
            PromiseAction::FunctionCall(call) => {
                let decoded: DonationSentArgs = serde_json::from_slice(&call.args).unwrap();
                assert_eq!(decoded, args(990));
                assert_eq!(call.gas, CALLBACK_GAS);
            }
            PromiseAction::Transfer { .. } => panic!("callback must be a function call"),
        }
    }

    #[test]
    fn success_credits_and_records() {
        let mut state = LedgerState::new(id("alice.near"));
        let outcome = confirm_donation(&mut state, CallStatus::Success, &args(990)).unwrap();
        assert_eq!(outcome, FlowOutcome::Confirmed);
        assert_eq!(state.balance, 990);
        assert!(state.donations.contains(&args(990).to_donation()));
    }

    #[test]
    fn failure_changes_nothing() {
        let mut state = LedgerState::new(id("alice.near"));
        let before = state.clone();
        let outcome = confirm_donation(&mut state, CallStatus::Failure, &args(990)).unwrap();
        assert_eq!(outcome, FlowOutcome::Reverted);
        assert_eq!(state, before);
    }

    #[test]
    fn pending_changes_nothing() {
        let mut state = LedgerState::new(id("alice.near"));
        let before = state.clone();
        let outcome = confirm_donation(&mut state, CallStatus::Pending, &args(990)).unwrap();
        assert_eq!(outcome, FlowOutcome::Unresolved);
        assert_eq!(state, before);
    }
}

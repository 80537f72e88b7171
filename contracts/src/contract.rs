//! # Donation Escrow Contract
//!
//! Entry points of the contract, bound to a [`KeyValueStore`]. Each method is
//! one receipt: it loads a [`LedgerState`] snapshot, runs its checks, and
//! saves once at the end. A method that returns `Err` leaves storage as it
//! found it.
//!
//! ## Entry Points
//!
//! | Method                   | Caller           | Effect                                    |
//! |--------------------------|------------------|-------------------------------------------|
//! | `init`                   | anyone, once     | owner set, balance zero                   |
//! | `send_donation`          | any donor        | fee forward scheduled, nothing credited   |
//! | `on_donation_sent`       | the contract     | net credited and recorded on success      |
//! | `withdraw_donations`     | the owner        | balance debited, transfer scheduled       |
//! | `on_donations_withdrawn` | the contract     | debit restored on failure                 |
//!
//! Callbacks reach the contract through [`DonationContract::dispatch_callback`],
//! which decodes the JSON payload the scheduler carried from Phase 1.

use ledger_protocol::{
    AccountId, Balance, CallScheduler, CallStatus, ExecutionContext, KeyValueStore,
};

use crate::config::{
    MIN_DONATION_AMOUNT, MIN_STAKE_AMOUNT, ON_DONATIONS_WITHDRAWN, ON_DONATION_SENT,
};
use crate::donation::{self, DonationReceipt, DonationSentArgs};
use crate::error::{ContractError, ContractResult};
use crate::flow::FlowOutcome;
use crate::state::{Donation, LedgerState};
use crate::withdrawal::{self, WithdrawalArgs, WithdrawalReceipt};

/// The escrow contract over its storage.
#[derive(Debug)]
pub struct DonationContract<S> {
    store: S,
}

impl<S: KeyValueStore> DonationContract<S> {
    /// Binds the contract to `store`. Existing state in the store is picked
    /// up as-is.
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Returns `true` once `init` has succeeded.
    pub fn is_initialized(&self) -> ContractResult<bool> {
        LedgerState::is_initialized(&self.store)
    }

    // -----------------------------------------------------------------------
    // Initialization
    // -----------------------------------------------------------------------

    /// Sets the owner and a zero balance.
    ///
    /// # Errors
    ///
    /// Checked in this order: [`ContractError::AlreadyInitialized`],
    /// [`ContractError::InsufficientStake`], [`ContractError::InvalidAccountId`].
    pub fn init(&mut self, ctx: &ExecutionContext, owner: &str) -> ContractResult<()> {
        if self.is_initialized()? {
            return Err(ContractError::AlreadyInitialized);
        }
        if ctx.attached_deposit < MIN_STAKE_AMOUNT {
            return Err(ContractError::InsufficientStake {
                attached: ctx.attached_deposit,
                required: MIN_STAKE_AMOUNT,
            });
        }
        let owner = AccountId::new(owner)?;

        LedgerState::new(owner.clone()).save(&mut self.store)?;
        tracing::info!(
            contract = %ctx.current_account_id,
            %owner,
            stake = %ctx.attached_deposit,
            "contract initialized"
        );
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Donations
    // -----------------------------------------------------------------------

    /// Phase 1 of a donation. Forwards the fee to the parent account and
    /// chains `on_donation_sent` with the net amount.
    pub fn send_donation<C: CallScheduler + ?Sized>(
        &mut self,
        ctx: &ExecutionContext,
        scheduler: &mut C,
    ) -> ContractResult<DonationReceipt> {
        if !self.is_initialized()? {
            return Err(ContractError::NotInitialized);
        }
        let deposit = ctx.attached_deposit;
        if deposit < MIN_DONATION_AMOUNT {
            return Err(ContractError::DonationTooSmall {
                attached: deposit,
                minimum: MIN_DONATION_AMOUNT,
            });
        }
        let fee_collector = ctx
            .current_account_id
            .parent()
            .ok_or_else(|| ContractError::NoFeeCollector(ctx.current_account_id.clone()))?;

        let split = donation::split_fee(deposit);
        let args = DonationSentArgs {
            amount: split.net,
            donor: ctx.signer_account_id.clone(),
            donated_at: ctx.block_timestamp,
        };
        let promise =
            donation::fee_forward_promise(&ctx.current_account_id, &fee_collector, split.fee, &args)?;
        let call = scheduler.schedule(ctx, promise)?;

        tracing::info!(
            donor = %args.donor,
            deposit = %deposit,
            fee = %split.fee,
            net = %split.net,
            %fee_collector,
            %call,
            "donation scheduled"
        );
        Ok(DonationReceipt {
            fee: split.fee,
            net: split.net,
            fee_collector,
            call,
        })
    }

    /// Phase 2 of a donation.
    pub fn on_donation_sent(
        &mut self,
        ctx: &ExecutionContext,
        status: CallStatus,
        args: &DonationSentArgs,
    ) -> ContractResult<FlowOutcome> {
        require_self_call(ctx, ON_DONATION_SENT)?;
        let mut state = LedgerState::load(&self.store)?;
        let outcome = donation::confirm_donation(&mut state, status, args)?;
        if outcome == FlowOutcome::Confirmed {
            state.save(&mut self.store)?;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Withdrawals
    // -----------------------------------------------------------------------

    /// Phase 1 of a withdrawal. Debits `amount` now and transfers it to the
    /// owner, chained to `on_donations_withdrawn`.
    ///
    /// The debit is saved before the transfer is scheduled. If scheduling
    /// fails the debit is written back, so an `Err` never leaves a transfer
    /// open against an undebited balance.
    ///
    /// # Errors
    ///
    /// Checked in this order: [`ContractError::NotInitialized`],
    /// [`ContractError::NotOwner`], [`ContractError::WithdrawalTooSmall`],
    /// [`ContractError::InsufficientBalance`].
    pub fn withdraw_donations<C: CallScheduler + ?Sized>(
        &mut self,
        ctx: &ExecutionContext,
        scheduler: &mut C,
        amount: Balance,
    ) -> ContractResult<WithdrawalReceipt> {
        let mut state = LedgerState::load(&self.store)?;
        let remaining_balance =
            withdrawal::begin_withdrawal(&mut state, &ctx.predecessor_account_id, amount)?;

        let promise = withdrawal::transfer_promise(&ctx.current_account_id, &state.owner, amount)?;

        // The debit is durable before any transfer exists.
        state.save_balance(&mut self.store)?;
        let call = match scheduler.schedule(ctx, promise) {
            Ok(call) => call,
            Err(err) => {
                state.credit(amount)?;
                state.save_balance(&mut self.store)?;
                tracing::warn!(amount = %amount, error = %err, "withdrawal not scheduled; debit restored");
                return Err(err.into());
            }
        };

        tracing::info!(
            owner = %state.owner,
            amount = %amount,
            balance = %remaining_balance,
            %call,
            "withdrawal scheduled"
        );
        Ok(WithdrawalReceipt {
            amount,
            remaining_balance,
            call,
        })
    }

    /// Phase 2 of a withdrawal.
    pub fn on_donations_withdrawn(
        &mut self,
        ctx: &ExecutionContext,
        status: CallStatus,
        args: WithdrawalArgs,
    ) -> ContractResult<FlowOutcome> {
        require_self_call(ctx, ON_DONATIONS_WITHDRAWN)?;
        let mut state = LedgerState::load(&self.store)?;
        let outcome = withdrawal::settle_withdrawal(&mut state, status, args)?;
        if outcome == FlowOutcome::Reverted {
            state.save_balance(&mut self.store)?;
        }
        Ok(outcome)
    }

    // -----------------------------------------------------------------------
    // Callback Dispatch
    // -----------------------------------------------------------------------

    /// Routes a scheduler-delivered callback to its handler.
    ///
    /// # Errors
    ///
    /// [`ContractError::UnknownMethod`] for a method this contract does not
    /// define, [`ContractError::InvalidArguments`] if `args` does not decode.
    pub fn dispatch_callback(
        &mut self,
        ctx: &ExecutionContext,
        method: &str,
        args: &[u8],
        status: CallStatus,
    ) -> ContractResult<FlowOutcome> {
        match method {
            ON_DONATION_SENT => {
                let args: DonationSentArgs = decode_args(args)?;
                self.on_donation_sent(ctx, status, &args)
            }
            ON_DONATIONS_WITHDRAWN => {
                let args: WithdrawalArgs = decode_args(args)?;
                self.on_donations_withdrawn(ctx, status, args)
            }
            other => Err(ContractError::UnknownMethod(other.to_string())),
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Confirmed donations in `(donor, amount, timestamp)` order.
    pub fn get_donations(&self) -> ContractResult<Vec<Donation>> {
        Ok(LedgerState::load(&self.store)?.donations.into_iter().collect())
    }

    /// The owner.
    pub fn get_owner(&self) -> ContractResult<AccountId> {
        Ok(LedgerState::load(&self.store)?.owner)
    }

    /// The held balance, excluding amounts in flight to the owner.
    pub fn get_balance(&self) -> ContractResult<Balance> {
        Ok(LedgerState::load(&self.store)?.balance)
    }
}

fn require_self_call(ctx: &ExecutionContext, method: &'static str) -> ContractResult<()> {
    if ctx.is_self_call() {
        Ok(())
    } else {
        Err(ContractError::PrivateMethod {
            method,
            predecessor: ctx.predecessor_account_id.clone(),
        })
    }
}

fn decode_args<T: serde::de::DeserializeOwned>(args: &[u8]) -> ContractResult<T> {
    serde_json::from_slice(args).map_err(|e| ContractError::InvalidArguments(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ledger_protocol::config::tokens;
    use ledger_protocol::storage::{MemoryStore, StorageError, StorageResult};
    use ledger_protocol::{CallId, LocalScheduler, Promise, SchedulerError};
    use std::cell::Cell;
    use std::rc::Rc;

    const CONTRACT: &str = "donations.factory.near";
    const NOW: u64 = 1_700_000_000_000_000_000;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    fn call(caller: &str, deposit: Balance) -> ExecutionContext {
        ExecutionContext::call(id(CONTRACT), id(caller), deposit, NOW)
    }

    fn callback(signer: &str) -> ExecutionContext {
        ExecutionContext::callback(id(CONTRACT), id(signer), NOW + 1)
    }

    /// Memory store whose writes fail while `fail_writes` is set.
    #[derive(Default)]
    struct FlakyStore {
        inner: MemoryStore,
        fail_writes: Rc<Cell<bool>>,
    }

    impl FlakyStore {
        fn check(&self) -> StorageResult<()> {
            if self.fail_writes.get() {
                Err(StorageError::Serialization("write refused".into()))
            } else {
                Ok(())
            }
        }
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> StorageResult<Option<Vec<u8>>> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: Vec<u8>) -> StorageResult<()> {
            self.check()?;
            self.inner.set(key, value)
        }

        fn write_batch(&mut self, entries: Vec<(&str, Vec<u8>)>) -> StorageResult<()> {
            self.check()?;
            self.inner.write_batch(entries)
        }
    }

    /// Scheduler that accepts nothing.
    struct RefusingScheduler;

    impl CallScheduler for RefusingScheduler {
        fn schedule(&mut self, _: &ExecutionContext, _: Promise) -> Result<CallId, SchedulerError> {
            Err(SchedulerError::InvalidArguments("scheduler unavailable".into()))
        }
    }

    /// Initializes `contract` for alice and credits `amount` as if a
    /// donation had been confirmed.
    fn fund<S: KeyValueStore>(contract: &mut DonationContract<S>, amount: Balance) {
        contract
            .init(&call("alice.near", MIN_STAKE_AMOUNT), "alice.near")
            .unwrap();
        let args = DonationSentArgs {
            amount,
            donor: id("bob.near"),
            donated_at: NOW,
        };
        contract
            .on_donation_sent(&callback("bob.near"), CallStatus::Success, &args)
            .unwrap();
    }

    fn initialized() -> DonationContract<MemoryStore> {
        let mut contract = DonationContract::new(MemoryStore::new());
        contract
            .init(&call("alice.near", MIN_STAKE_AMOUNT), "alice.near")
            .unwrap();
        contract
    }

    #[test]
    fn init_sets_owner_and_zero_balance() {
        let contract = initialized();
        assert_eq!(contract.get_owner().unwrap(), id("alice.near"));
        assert_eq!(contract.get_balance().unwrap(), 0);
        assert!(contract.get_donations().unwrap().is_empty());
    }

    #[test]
    fn init_twice_fails() {
        let mut contract = initialized();
        let err = contract
            .init(&call("bob.near", MIN_STAKE_AMOUNT), "bob.near")
            .unwrap_err();
        assert!(matches!(err, ContractError::AlreadyInitialized));
        assert_eq!(contract.get_owner().unwrap(), id("alice.near"));
    }

    #[test]
    fn init_checks_stake_before_owner_id() {
        let mut contract = DonationContract::new(MemoryStore::new());
        let err = contract
            .init(&call("alice.near", MIN_STAKE_AMOUNT - 1), "NOT VALID")
            .unwrap_err();
        assert!(matches!(err, ContractError::InsufficientStake { .. }));

        let err = contract
            .init(&call("alice.near", MIN_STAKE_AMOUNT), "NOT VALID")
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidAccountId(_)));
        assert!(!contract.is_initialized().unwrap());
    }

    #[test]
    fn queries_require_init() {
        let contract = DonationContract::new(MemoryStore::new());
        assert!(matches!(contract.get_owner(), Err(ContractError::NotInitialized)));
        assert!(matches!(contract.get_balance(), Err(ContractError::NotInitialized)));
        assert!(matches!(contract.get_donations(), Err(ContractError::NotInitialized)));
    }

    #[test]
    fn send_donation_before_init_fails() {
        let mut contract = DonationContract::new(MemoryStore::new());
        let mut scheduler = LocalScheduler::new();
        let err = contract
            .send_donation(&call("bob.near", tokens(1)), &mut scheduler)
            .unwrap_err();
        assert!(matches!(err, ContractError::NotInitialized));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn send_donation_schedules_without_crediting() {
        let mut contract = initialized();
        let mut scheduler = LocalScheduler::new();
        let receipt = contract
            .send_donation(&call("bob.near", tokens(2)), &mut scheduler)
            .unwrap();

        assert_eq!(receipt.fee, tokens(2) / 100);
        assert_eq!(receipt.fee + receipt.net, tokens(2));
        assert_eq!(receipt.fee_collector, id("factory.near"));
        assert_eq!(contract.get_balance().unwrap(), 0);

        let open = scheduler.get(receipt.call).unwrap();
        assert_eq!(open.receiver, id("factory.near"));
        assert_eq!(open.attached_value(), receipt.fee);
    }

    #[test]
    fn donation_below_minimum_is_rejected() {
        let mut contract = initialized();
        let mut scheduler = LocalScheduler::new();
        let err = contract
            .send_donation(&call("bob.near", MIN_DONATION_AMOUNT - 1), &mut scheduler)
            .unwrap_err();
        assert!(matches!(err, ContractError::DonationTooSmall { .. }));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn top_level_contract_has_no_fee_collector() {
        let mut contract = DonationContract::new(MemoryStore::new());
        let ctx = ExecutionContext::call(id("donations"), id("alice.near"), MIN_STAKE_AMOUNT, NOW);
        contract.init(&ctx, "alice.near").unwrap();

        let ctx = ExecutionContext::call(id("donations"), id("bob.near"), tokens(1), NOW);
        let err = contract
            .send_donation(&ctx, &mut LocalScheduler::new())
            .unwrap_err();
        assert!(matches!(err, ContractError::NoFeeCollector(_)));
    }

    #[test]
    fn callbacks_are_private() {
        let mut contract = initialized();
        let args = DonationSentArgs {
            amount: 1,
            donor: id("bob.near"),
            donated_at: NOW,
        };
        let err = contract
            .on_donation_sent(&call("mallory.near", 0), CallStatus::Success, &args)
            .unwrap_err();
        assert!(matches!(err, ContractError::PrivateMethod { .. }));

        let err = contract
            .on_donations_withdrawn(
                &call("mallory.near", 0),
                CallStatus::Failure,
                WithdrawalArgs { amount: 1 },
            )
            .unwrap_err();
        assert!(matches!(err, ContractError::PrivateMethod { .. }));
        assert_eq!(contract.get_balance().unwrap(), 0);
    }

    #[test]
    fn dispatch_rejects_unknown_method_and_bad_payload() {
        let mut contract = initialized();
        let err = contract
            .dispatch_callback(&callback("bob.near"), "on_something_else", b"{}", CallStatus::Success)
            .unwrap_err();
        assert!(matches!(err, ContractError::UnknownMethod(_)));

        let err = contract
            .dispatch_callback(&callback("bob.near"), ON_DONATION_SENT, b"not json", CallStatus::Success)
            .unwrap_err();
        assert!(matches!(err, ContractError::InvalidArguments(_)));
        assert_eq!(contract.get_balance().unwrap(), 0);
    }

    #[test]
    fn dispatch_runs_donation_callback() {
        let mut contract = initialized();
        let payload = serde_json::to_vec(&DonationSentArgs {
            amount: 990,
            donor: id("bob.near"),
            donated_at: NOW,
        })
        .unwrap();
        let outcome = contract
            .dispatch_callback(&callback("bob.near"), ON_DONATION_SENT, &payload, CallStatus::Success)
            .unwrap();
        assert_eq!(outcome, FlowOutcome::Confirmed);
        assert_eq!(contract.get_balance().unwrap(), 990);
    }

    #[test]
    fn withdrawal_by_non_owner_is_rejected() {
        let mut contract = initialized();
        let mut scheduler = LocalScheduler::new();
        let err = contract
            .withdraw_donations(&call("bob.near", 0), &mut scheduler, tokens(1))
            .unwrap_err();
        assert!(matches!(err, ContractError::NotOwner { .. }));
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn withdrawal_that_cannot_save_schedules_nothing() {
        let store = FlakyStore::default();
        let fail_writes = Rc::clone(&store.fail_writes);
        let mut contract = DonationContract::new(store);
        fund(&mut contract, tokens(1));
        let mut scheduler = LocalScheduler::new();

        fail_writes.set(true);
        let err = contract
            .withdraw_donations(&call("alice.near", 0), &mut scheduler, tokens(1))
            .unwrap_err();
        assert!(matches!(err, ContractError::Storage(_)));
        assert_eq!(scheduler.pending_count(), 0);
        assert_eq!(contract.get_balance().unwrap(), tokens(1));

        // Once storage recovers the balance can be withdrawn exactly once.
        fail_writes.set(false);
        contract
            .withdraw_donations(&call("alice.near", 0), &mut scheduler, tokens(1))
            .unwrap();
        assert_eq!(scheduler.pending_count(), 1);
        assert_eq!(contract.get_balance().unwrap(), 0);
        let err = contract
            .withdraw_donations(&call("alice.near", 0), &mut scheduler, tokens(1))
            .unwrap_err();
        assert!(matches!(err, ContractError::InsufficientBalance { .. }));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn withdrawal_that_cannot_schedule_restores_the_debit() {
        let mut contract = DonationContract::new(MemoryStore::new());
        fund(&mut contract, tokens(1));

        let err = contract
            .withdraw_donations(&call("alice.near", 0), &mut RefusingScheduler, tokens(1))
            .unwrap_err();
        assert!(matches!(err, ContractError::Scheduler(_)));
        assert_eq!(contract.get_balance().unwrap(), tokens(1));
    }
}

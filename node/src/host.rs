//! # Contract Host
//!
//! Runs the donation contract the way a chain would: every entry call and
//! every callback is one receipt with its own [`ExecutionContext`], and the
//! scheduler carries outcomes from one receipt to the next.
//!
//! The host is not thread-safe by itself. The API wraps it in a single
//! [`parking_lot::Mutex`] so receipts execute one at a time.

use std::sync::Arc;

use chrono::Utc;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use ledger_contracts::{
    ContractResult, DonationContract, DonationReceipt, FlowOutcome, WithdrawalReceipt,
};
use ledger_protocol::{
    AccountId, Balance, CallId, CallStatus, ExecutionContext, KeyValueStore, LocalScheduler,
    ScheduledCall, Timestamp,
};

/// Storage the node hosts the contract on.
pub type DynStore = Box<dyn KeyValueStore + Send>;

/// The host shared between request handlers.
pub type SharedHost = Arc<Mutex<LedgerHost<DynStore>>>;

/// What resolving an external call did.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    /// The call that was resolved.
    pub call: CallId,
    /// Status it was resolved with.
    pub status: CallStatus,
    /// Callback that ran as a result, if any.
    pub callback: Option<String>,
    /// What the callback decided.
    pub outcome: Option<FlowOutcome>,
}

/// A contract deployed on `account_id`, with its scheduler.
pub struct LedgerHost<S> {
    account_id: AccountId,
    contract: DonationContract<S>,
    scheduler: LocalScheduler,
}

impl<S: KeyValueStore> LedgerHost<S> {
    /// Deploys the contract on `account_id` over `store`.
    pub fn new(account_id: AccountId, store: S) -> Self {
        Self {
            account_id,
            contract: DonationContract::new(store),
            scheduler: LocalScheduler::new(),
        }
    }

    /// Account the contract is deployed on.
    pub fn account_id(&self) -> &AccountId {
        &self.account_id
    }

    /// The hosted contract, for queries.
    pub fn contract(&self) -> &DonationContract<S> {
        &self.contract
    }

    /// Open external calls, oldest first.
    pub fn pending_calls(&self) -> Vec<ScheduledCall> {
        self.scheduler.pending().cloned().collect()
    }

    /// Number of open external calls.
    pub fn pending_count(&self) -> usize {
        self.scheduler.pending_count()
    }

    fn entry_context(&self, signer: &str, deposit: Balance) -> ContractResult<ExecutionContext> {
        let signer = AccountId::new(signer)?;
        Ok(ExecutionContext::call(
            self.account_id.clone(),
            signer,
            deposit,
            block_timestamp(),
        ))
    }

    /// `init`, signed by `signer` with `deposit` attached.
    pub fn init(&mut self, signer: &str, owner: &str, deposit: Balance) -> ContractResult<()> {
        let ctx = self.entry_context(signer, deposit)?;
        self.contract.init(&ctx, owner)
    }

    /// `send_donation`, signed by `signer` with `deposit` attached.
    pub fn send_donation(&mut self, signer: &str, deposit: Balance) -> ContractResult<DonationReceipt> {
        let ctx = self.entry_context(signer, deposit)?;
        self.contract.send_donation(&ctx, &mut self.scheduler)
    }

    /// `withdraw_donations`, signed by `signer`.
    pub fn withdraw_donations(
        &mut self,
        signer: &str,
        amount: Balance,
    ) -> ContractResult<WithdrawalReceipt> {
        let ctx = self.entry_context(signer, 0)?;
        self.contract
            .withdraw_donations(&ctx, &mut self.scheduler, amount)
    }

    /// Reports the outcome of an open call and runs the callback it
    /// releases as the next receipt.
    ///
    /// The call is consumed only after its callback has committed. If the
    /// callback fails the call stays open and can be resolved again.
    pub fn resolve(&mut self, call: CallId, status: CallStatus) -> ContractResult<Resolution> {
        let ran = match self.scheduler.callback_for(call, status)? {
            Some(invocation) => {
                let ctx = ExecutionContext::callback(
                    invocation.receiver,
                    invocation.signer,
                    block_timestamp(),
                );
                let outcome = self
                    .contract
                    .dispatch_callback(&ctx, &invocation.method, &invocation.args, invocation.status)
                    .map_err(|e| {
                        tracing::warn!(%call, %status, callback = %invocation.method, error = %e, "callback failed; call left open");
                        e
                    })?;
                tracing::info!(%call, %status, callback = %invocation.method, %outcome, "callback executed");
                Some((invocation.method, outcome))
            }
            None => None,
        };
        self.scheduler.resolve(call, status)?;

        let (callback, outcome) = ran.unzip();
        Ok(Resolution {
            call,
            status,
            callback,
            outcome,
        })
    }
}

/// Current wall-clock time in nanoseconds since the epoch.
fn block_timestamp() -> Timestamp {
    Utc::now()
        .timestamp_nanos_opt()
        .and_then(|ns| Timestamp::try_from(ns).ok())
        .unwrap_or_default()
}

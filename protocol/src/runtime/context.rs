//! Execution context of a single receipt.

use serde::{Deserialize, Serialize};

use crate::identity::AccountId;
use crate::types::{Balance, Timestamp};

/// Everything a contract may know about the receipt it is executing in.
///
/// For an entry call, `signer` and `predecessor` are the same account. For a
/// callback, `predecessor` is the contract itself (it scheduled the callback)
/// while `signer` is still whoever signed the original transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// The account the contract is deployed on.
    pub current_account_id: AccountId,
    /// The account that signed the originating transaction.
    pub signer_account_id: AccountId,
    /// The account that directly invoked this receipt.
    pub predecessor_account_id: AccountId,
    /// Value attached to this receipt.
    pub attached_deposit: Balance,
    /// Block timestamp of this receipt, nanoseconds since the epoch.
    pub block_timestamp: Timestamp,
}

impl ExecutionContext {
    /// Context of a user-signed entry call: the caller signs and invokes.
    pub fn call(
        contract: AccountId,
        caller: AccountId,
        attached_deposit: Balance,
        block_timestamp: Timestamp,
    ) -> Self {
        Self {
            current_account_id: contract,
            signer_account_id: caller.clone(),
            predecessor_account_id: caller,
            attached_deposit,
            block_timestamp,
        }
    }

    /// Context of a callback the contract scheduled on itself.
    pub fn callback(contract: AccountId, signer: AccountId, block_timestamp: Timestamp) -> Self {
        Self {
            current_account_id: contract.clone(),
            signer_account_id: signer,
            predecessor_account_id: contract,
            attached_deposit: 0,
            block_timestamp,
        }
    }

    /// Returns `true` if the contract invoked itself, i.e. this is one of its
    /// own callbacks.
    pub fn is_self_call(&self) -> bool {
        self.predecessor_account_id == self.current_account_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> AccountId {
        AccountId::new(s).unwrap()
    }

    #[test]
    fn entry_call_is_not_self_call() {
        let ctx = ExecutionContext::call(id("donations.near"), id("alice.near"), 5, 1);
        assert_eq!(ctx.signer_account_id, ctx.predecessor_account_id);
        assert!(!ctx.is_self_call());
    }

    #[test]
    fn callback_preserves_signer_and_attaches_nothing() {
        let ctx = ExecutionContext::callback(id("donations.near"), id("alice.near"), 7);
        assert!(ctx.is_self_call());
        assert_eq!(ctx.signer_account_id, id("alice.near"));
        assert_eq!(ctx.attached_deposit, 0);
    }
}

//! # Ledger State
//!
//! Owner, held balance, and the set of confirmed donations, plus the mapping
//! of each onto a storage slot:
//!
//! | Slot        | Value                |
//! |-------------|----------------------|
//! | `owner`     | `AccountId`          |
//! | `balance`   | `Balance`            |
//! | `donations` | `BTreeSet<Donation>` |
//!
//! The contract is initialized exactly when both `owner` and `balance` exist.
//! `donations` is written lazily; an absent slot reads as the empty set.
//!
//! Operations load a [`LedgerState`], mutate it in memory, and
//! [`save`](LedgerState::save) it in one batch once every check has passed.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use ledger_protocol::storage::codec;
use ledger_protocol::{AccountId, Balance, KeyValueStore, Timestamp};

use crate::error::{ContractError, ContractResult};

/// Storage slot of the owner id.
pub const OWNER_KEY: &str = "owner";
/// Storage slot of the held balance.
pub const BALANCE_KEY: &str = "balance";
/// Storage slot of the donation set.
pub const DONATIONS_KEY: &str = "donations";

/// A confirmed donation.
///
/// Equality covers all three fields, and donations are kept in a set: two
/// donations by the same donor, of the same amount, at the same timestamp are
/// stored once.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Donation {
    /// Signer of the `send_donation` transaction.
    pub donor: AccountId,
    /// Net amount credited (deposit minus fee).
    pub amount: Balance,
    /// Block timestamp of the `send_donation` receipt.
    pub timestamp: Timestamp,
}

/// In-memory snapshot of the contract's persistent state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerState {
    /// The only account allowed to withdraw.
    pub owner: AccountId,
    /// Funds held and not yet withdrawn (or in flight to the owner).
    pub balance: Balance,
    /// Confirmed donations.
    pub donations: BTreeSet<Donation>,
}

impl LedgerState {
    /// Fresh state for a newly initialized contract.
    pub fn new(owner: AccountId) -> Self {
        Self {
            owner,
            balance: 0,
            donations: BTreeSet::new(),
        }
    }

    /// Returns `true` if both the owner and balance slots exist.
    pub fn is_initialized<S: KeyValueStore + ?Sized>(store: &S) -> ContractResult<bool> {
        Ok(store.has_key(OWNER_KEY)? && store.has_key(BALANCE_KEY)?)
    }

    /// Loads the full state.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::NotInitialized`] if the contract has not been
    /// initialized, or a storage error if a slot cannot be decoded.
    pub fn load<S: KeyValueStore + ?Sized>(store: &S) -> ContractResult<Self> {
        if !Self::is_initialized(store)? {
            return Err(ContractError::NotInitialized);
        }
        Ok(Self {
            owner: codec::read_required(store, OWNER_KEY)?,
            balance: codec::read_required(store, BALANCE_KEY)?,
            donations: codec::read(store, DONATIONS_KEY)?.unwrap_or_default(),
        })
    }

    /// Persists every slot in one batch.
    pub fn save<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> ContractResult<()> {
        store.write_batch(vec![
            (OWNER_KEY, codec::encode(&self.owner)?),
            (BALANCE_KEY, codec::encode(&self.balance)?),
            (DONATIONS_KEY, codec::encode(&self.donations)?),
        ])?;
        Ok(())
    }

    /// Persists only the balance slot.
    pub fn save_balance<S: KeyValueStore + ?Sized>(&self, store: &mut S) -> ContractResult<()> {
        codec::write(store, BALANCE_KEY, &self.balance)?;
        Ok(())
    }

    /// Returns `true` if `account` is the owner.
    pub fn is_owner(&self, account: &AccountId) -> bool {
        &self.owner == account
    }

    /// Adds `amount` to the balance. Returns the new balance.
    pub fn credit(&mut self, amount: Balance) -> ContractResult<Balance> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or(ContractError::BalanceOverflow {
                current: self.balance,
                credit: amount,
            })?;
        Ok(self.balance)
    }

    /// Subtracts `amount` from the balance. Returns the new balance.
    pub fn debit(&mut self, amount: Balance) -> ContractResult<Balance> {
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or(ContractError::InsufficientBalance {
                requested: amount,
                available: self.balance,
            })?;
        Ok(self.balance)
    }

    /// Inserts a donation. Returns `false` if an identical one was already
    /// stored.
    pub fn record_donation(&mut self, donation: Donation) -> bool {
        self.donations.insert(donation)
    }
}

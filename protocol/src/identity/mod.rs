//! # Identity Module
//!
//! Every participant in the ledger, the contract included, is addressed by a
//! hierarchical [`AccountId`]. Validation happens once, at construction, so the
//! rest of the workspace passes `AccountId` values around instead of strings.
//!
//! ## Design Decisions
//!
//! - Ids are ASCII lowercase only. No normalization is attempted; `Alice` is
//!   rejected rather than silently lowered, because two spellings of one
//!   account would break owner comparisons.
//! - Parent derivation is purely syntactic. Whether the parent account exists
//!   is the host's concern, not ours.

pub mod account_id;

pub use account_id::{AccountId, AccountIdError};

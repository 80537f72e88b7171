//! # Host Configuration & Constants
//!
//! Units, gas budgets, account-id limits, and node defaults. Contract policy
//! (minimum amounts, fee divisor) lives with the contract itself in
//! `ledger-contracts`; this module only describes the host the contract runs on.

use crate::types::{Balance, Gas};

// ---------------------------------------------------------------------------
// Units
// ---------------------------------------------------------------------------

/// Number of base units in one whole token. Balances are always held in base
/// units; this constant exists for humans and tests.
pub const ONE_TOKEN: Balance = 1_000_000_000_000_000_000_000_000;

/// One milli-token (10^-3 of a token).
pub const ONE_MILLI_TOKEN: Balance = ONE_TOKEN / 1_000;

/// Gas units in one teragas.
pub const GAS_PER_TGAS: u64 = 1_000_000_000_000;

/// Upper bound on gas a single function call may carry.
pub const MAX_GAS_PER_CALL: Gas = Gas::from_tgas(300);

// ---------------------------------------------------------------------------
// Account Identifiers
// ---------------------------------------------------------------------------

/// Shortest valid account id.
pub const MIN_ACCOUNT_ID_LEN: usize = 2;

/// Longest valid account id.
pub const MAX_ACCOUNT_ID_LEN: usize = 64;

// ---------------------------------------------------------------------------
// Node Defaults
// ---------------------------------------------------------------------------

/// Default HTTP API port of the ledger node.
pub const DEFAULT_API_PORT: u16 = 9841;

/// Default Prometheus metrics port.
pub const DEFAULT_METRICS_PORT: u16 = 9842;

/// Default account id the node hosts the contract under.
pub const DEFAULT_CONTRACT_ACCOUNT: &str = "donations.factory.near";

/// Name of the sled tree that holds contract storage.
pub const STORAGE_TREE_NAME: &str = "ledger";

/// Crate version, reported by the node's `version` subcommand.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Converts whole tokens to base units. Saturates instead of overflowing.
pub const fn tokens(n: u128) -> Balance {
    n.saturating_mul(ONE_TOKEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unit_relationships() {
        assert_eq!(ONE_MILLI_TOKEN * 1_000, ONE_TOKEN);
        assert_eq!(tokens(3), 3 * ONE_TOKEN);
        assert_eq!(tokens(u128::MAX), u128::MAX);
    }

    #[test]
    fn test_account_limits_sanity() {
        assert!(MIN_ACCOUNT_ID_LEN < MAX_ACCOUNT_ID_LEN);
        assert!(DEFAULT_CONTRACT_ACCOUNT.len() <= MAX_ACCOUNT_ID_LEN);
    }

    #[test]
    fn test_ports_are_distinct() {
        assert_ne!(DEFAULT_API_PORT, DEFAULT_METRICS_PORT);
    }
}

//! # Contract Policy
//!
//! Amounts and budgets the escrow contract enforces. These are fixed: the fee
//! rate in particular is not configurable at runtime.

use ledger_protocol::config::{tokens, ONE_MILLI_TOKEN};
use ledger_protocol::{Balance, Gas};

/// Deposit `init` must carry to cover the contract's storage stake.
pub const MIN_STAKE_AMOUNT: Balance = tokens(3);

/// Smallest accepted donation.
pub const MIN_DONATION_AMOUNT: Balance = tokens(1);

/// Smallest accepted withdrawal.
pub const MIN_WITHDRAWAL_AMOUNT: Balance = ONE_MILLI_TOKEN;

/// Platform fee is `floor(deposit / FEE_DIVISOR)`: 1%.
pub const FEE_DIVISOR: Balance = 100;

/// Method invoked on the fee collector.
pub const FEE_DEPOSIT_METHOD: &str = "deposit_fee";

/// Gas attached to the fee-forward call.
pub const FEE_FORWARD_GAS: Gas = Gas::from_tgas(10);

/// Gas attached to each callback this contract schedules on itself.
pub const CALLBACK_GAS: Gas = Gas::from_tgas(10);

/// Callback confirming the fee-forward call.
pub const ON_DONATION_SENT: &str = "on_donation_sent";

/// Callback confirming the withdrawal transfer.
pub const ON_DONATIONS_WITHDRAWN: &str = "on_donations_withdrawn";

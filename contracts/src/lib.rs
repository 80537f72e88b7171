//! # Donation Escrow Contract
//!
//! Holds donations for a single owner. Every donation pays a 1% fee to the
//! contract's parent account, and the net amount is credited only once that
//! fee transfer is confirmed. The owner can withdraw the held balance; a
//! withdrawal is debited up front and put back if the transfer fails.
//!
//! - **state** — Owner, balance, donation set, and their storage slots.
//! - **donation** — Fee split and the donation confirmation flow.
//! - **withdrawal** — Owner-gated debit and its compensation.
//! - **contract** — [`DonationContract`]: entry points, callbacks, queries.
//!
//! ## Design Principles
//!
//! 1. Balance arithmetic is checked. Overflow is an error, never a wrap.
//! 2. Phase 2 of each flow is a plain function of `(state, status, args)`,
//!    so it can be exercised without a scheduler.
//! 3. A failing entry point writes nothing.
//! 4. Every public type is serializable (serde) for call payloads, the HTTP
//!    API, and storage.

pub mod config;
pub mod contract;
pub mod donation;
pub mod error;
pub mod flow;
pub mod state;
pub mod withdrawal;

pub use contract::DonationContract;
pub use donation::{DonationReceipt, DonationSentArgs, FeeSplit};
pub use error::{ContractError, ContractResult};
pub use flow::FlowOutcome;
pub use state::{Donation, LedgerState};
pub use withdrawal::{WithdrawalArgs, WithdrawalReceipt};

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Protocol — Host Primitives
//!
//! Everything a contract needs from its host and nothing it doesn't: who is
//! calling, where state lives, and how to reach other accounts. The contract
//! logic in `ledger-contracts` is written against these ports only, so it can
//! run on the node, in tests, or on any other host that implements them.
//!
//! ## Architecture
//!
//! - **config** — Units, gas budgets, account-id limits, node defaults.
//! - **types** — `Balance`, `Gas`, `Timestamp`.
//! - **identity** — Validated hierarchical account ids.
//! - **storage** — The key-value port, its bincode codec, memory and sled backends.
//! - **runtime** — Execution context, promises, the call scheduler port and a
//!   local scheduler.
//!
//! ## Design Philosophy
//!
//! 1. Ports are narrow. A contract gets `get/set/has_key` and `schedule`, and
//!    has to express everything else in those terms.
//! 2. Validation happens at construction. An `AccountId` is always valid.
//! 3. Side effects are values. A `Promise` describes a call; only a scheduler
//!    makes it happen.

pub mod config;
pub mod identity;
pub mod runtime;
pub mod storage;
pub mod types;

pub use identity::{AccountId, AccountIdError};
pub use runtime::{
    CallId, CallScheduler, CallStatus, CallbackInvocation, ExecutionContext, LocalScheduler,
    Promise, PromiseAction, ScheduledCall, SchedulerError,
};
pub use storage::{KeyValueStore, MemoryStore, SledStore, StorageError};
pub use types::{Balance, Gas, Timestamp};

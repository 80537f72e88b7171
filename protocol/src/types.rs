//! Scalar types shared by every layer: balances, gas, timestamps.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::GAS_PER_TGAS;

/// Amount of value in base units. 128 bits covers the full token supply at
/// 10^24 base units per token with plenty of headroom.
pub type Balance = u128;

/// Block timestamp in nanoseconds since the Unix epoch.
pub type Timestamp = u64;

/// Gas attached to a function call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gas(pub u64);

impl Gas {
    /// No gas at all. Valid for plain transfers, which need none.
    pub const ZERO: Gas = Gas(0);

    /// Builds a gas amount from teragas.
    pub const fn from_tgas(tgas: u64) -> Self {
        Gas(tgas * GAS_PER_TGAS)
    }

    /// Raw gas units.
    pub const fn as_gas(self) -> u64 {
        self.0
    }

    /// Whole teragas, rounded down.
    pub const fn as_tgas(self) -> u64 {
        self.0 / GAS_PER_TGAS
    }
}

impl fmt::Display for Gas {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} TGas", self.as_tgas())
    }
}

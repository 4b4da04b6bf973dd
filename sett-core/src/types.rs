//! Core types for ledger addressing and accounting.
//!
//! - [`Address`]: opaque 160-bit-style account identifier
//! - [`Amount`]: unsigned base-unit quantity (want units or vault shares)

use serde::{Deserialize, Serialize};

/// Unsigned quantity in base units.
///
/// Wide enough for wei-scale balances. Balances are never negative, so the
/// type itself carries the `balance >= 0` half of every precondition.
pub type Amount = u128;

/// Allowance value treated as "unlimited" (the `MaxUint256` approval idiom).
pub const MAX_ALLOWANCE: Amount = Amount::MAX;

/// Account identifier on the ledger.
///
/// Addresses are plain integers rendered as zero-padded hex. Simulated users
/// live at or above [`Address::USER_BASE`]; fixture contracts and sinks use
/// raw values below it, so the two ranges never meet.
///
/// # Examples
///
/// ```
/// use sett_core::Address;
///
/// let alice = Address::user(0);
/// assert_ne!(alice, Address::user(1));
/// assert!(alice.to_string().starts_with("0x"));
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Address(pub u64);

impl Address {
    /// First simulated user address. Every `u32` index maps above it.
    pub const USER_BASE: u64 = 1 << 32;

    /// Create an address from a raw value.
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Deterministic address for the `index`-th simulated user.
    pub const fn user(index: u32) -> Self {
        Self(Self::USER_BASE + index as u64)
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "0x{:040x}", self.0)
    }
}

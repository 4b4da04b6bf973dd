//! Fixed-point helpers shared by share accounting and its checks.

use alloy_primitives::U256;

use crate::Amount;

/// Scale used for price-per-full-share values (1e18, as vaults report it).
pub const PRICE_PRECISION: Amount = 1_000_000_000_000_000_000;

/// Multiply two amounts and divide by a third, rounding down.
///
/// The product is carried in 256 bits, so `a * b` never overflows; only a
/// quotient that does not fit an [`Amount`] does. Returns `None` in that case
/// or when `c == 0`.
pub fn mul_div_down(a: Amount, b: Amount, c: Amount) -> Option<Amount> {
    if c == 0 {
        return None;
    }
    let quotient = U256::from(a) * U256::from(b) / U256::from(c);
    Amount::try_from(quotient).ok()
}

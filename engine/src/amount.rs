//! # Amount Math
//!
//! All balances, caps, and NAV figures in Meridian are unsigned 256-bit
//! integers in smallest-unit denomination. This module is the only place
//! that multiplies and divides them.
//!
//! Two rules govern every formula:
//!
//! 1. **Multiply before dividing.** The full numerator is computed in 512
//!    bits via [`U256::full_mul`], so precision is never lost before the
//!    single division.
//! 2. **Floor everything.** Truncating division is the universal rounding
//!    rule. Value may round toward the pool, never toward the caller.

pub use primitive_types::{U256, U512};

use crate::error::VaultError;

/// Computes `a * b / divisor` with a 512-bit numerator and floor division.
///
/// # Errors
///
/// Returns [`VaultError::Overflow`] if `divisor` is zero or the quotient
/// does not fit back into 256 bits.
pub fn mul_div(a: U256, b: U256, divisor: U256) -> Result<U256, VaultError> {
    if divisor.is_zero() {
        return Err(VaultError::Overflow {
            op: "division by zero",
        });
    }
    let numerator: U512 = a.full_mul(b);
    let quotient = numerator / U512::from(divisor);
    U256::try_from(quotient).map_err(|_| VaultError::Overflow {
        op: "mul_div quotient",
    })
}

/// Computes an integer-percent cut of `amount`, floored.
///
/// Fee percentages are whole numbers in `0..=100`; the cut is always
/// `<= amount`, so the result cannot overflow.
pub fn percent_of(amount: U256, percent: u8) -> Result<U256, VaultError> {
    debug_assert!(percent <= 100);
    mul_div(amount, U256::from(percent), U256::from(100u8))
}

/// Rescales an amount between decimal precisions (e.g. a 6-decimal stable
/// unit to an 18-decimal share unit).
///
/// Scaling up multiplies by a power of ten; scaling down floors.
///
/// # Errors
///
/// Returns [`VaultError::Overflow`] if scaling up exceeds 256 bits.
pub fn rescale(amount: U256, from_decimals: u8, to_decimals: u8) -> Result<U256, VaultError> {
    if to_decimals >= from_decimals {
        let factor = U256::exp10((to_decimals - from_decimals) as usize);
        amount
            .checked_mul(factor)
            .ok_or(VaultError::Overflow { op: "rescale" })
    } else {
        let factor = U256::exp10((from_decimals - to_decimals) as usize);
        Ok(amount / factor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mul_div_floors() {
        // 7 * 3 / 2 = 10 (floor of 10.5)
        let q = mul_div(U256::from(7u64), U256::from(3u64), U256::from(2u64)).unwrap();
        assert_eq!(q, U256::from(10u64));
    }

    #[test]
    fn mul_div_wide_numerator_does_not_truncate() {
        // a * b overflows 256 bits, but a * b / b == a must still hold.
        let a = U256::MAX / U256::from(2u64);
        let b = U256::from(1_000_000_000u64);
        let q = mul_div(a, b, b).unwrap();
        assert_eq!(q, a);
    }

    #[test]
    fn mul_div_zero_divisor_rejected() {
        let result = mul_div(U256::from(1u64), U256::from(1u64), U256::zero());
        assert!(matches!(result, Err(VaultError::Overflow { .. })));
    }

    #[test]
    fn mul_div_quotient_overflow_rejected() {
        let result = mul_div(U256::MAX, U256::from(2u64), U256::from(1u64));
        assert!(matches!(result, Err(VaultError::Overflow { .. })));
    }

    #[test]
    fn percent_of_floors() {
        // 1% of 199 = 1 (floor of 1.99)
        assert_eq!(
            percent_of(U256::from(199u64), 1).unwrap(),
            U256::from(1u64)
        );
        assert_eq!(percent_of(U256::from(100u64), 0).unwrap(), U256::zero());
        assert_eq!(
            percent_of(U256::from(100u64), 100).unwrap(),
            U256::from(100u64)
        );
    }

    #[test]
    fn rescale_up_and_down() {
        // 5,000,000 six-decimal units -> 5e18 eighteen-decimal units.
        let up = rescale(U256::from(5_000_000u64), 6, 18).unwrap();
        assert_eq!(up, U256::from(5u64) * U256::exp10(18));

        let down = rescale(up, 18, 6).unwrap();
        assert_eq!(down, U256::from(5_000_000u64));
    }

    #[test]
    fn rescale_down_floors() {
        // 1.5 units at 18 decimals floors to 1 unit at 0 decimals.
        let amount = U256::exp10(18) + U256::exp10(17) * U256::from(5u64);
        assert_eq!(rescale(amount, 18, 0).unwrap(), U256::from(1u64));
    }

    #[test]
    fn rescale_same_precision_is_identity() {
        let amount = U256::from(42u64);
        assert_eq!(rescale(amount, 6, 6).unwrap(), amount);
    }

    #[test]
    fn rescale_overflow_rejected() {
        let result = rescale(U256::MAX, 6, 18);
        assert!(matches!(result, Err(VaultError::Overflow { .. })));
    }
}

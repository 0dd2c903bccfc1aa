//! # Share Pricing
//!
//! The two conversions between stable value and vault shares. Both are
//! pure functions of the pool NAV and the share supply at the instant of
//! the operation; the vault computes NAV and passes it in.
//!
//! The bootstrap case is special: with zero shares outstanding there is
//! no price, so the first conversion is fixed at one share per stable
//! unit, rescaled between the two precisions.

use crate::amount::{mul_div, rescale, U256};
use crate::config::VaultParams;
use crate::error::VaultError;

/// Converts a stable amount to the shares it buys at the given NAV and
/// supply.
///
/// With zero supply the conversion bootstraps at 1:1 across precisions.
/// With supply outstanding the price is proportional:
/// `shares = usd * supply / nav`, floored.
///
/// # Errors
///
/// Returns [`VaultError::DegenerateNav`] when shares are outstanding but
/// the pool is worthless, since any positive deposit would then buy an
/// unbounded number of shares.
pub fn usd_to_shares(
    usd: U256,
    nav: U256,
    supply: U256,
    params: &VaultParams,
) -> Result<U256, VaultError> {
    if supply.is_zero() {
        return rescale(usd, params.stable_decimals, params.share_decimals);
    }
    if nav.is_zero() {
        return Err(VaultError::DegenerateNav { supply });
    }
    mul_div(usd, supply, nav)
}

/// Converts a share amount to the stable value it represents at the given
/// NAV and supply: `usd = shares * nav / supply`, floored.
///
/// With no shares outstanding, or a worthless pool, shares are worth
/// nothing.
pub fn shares_to_usd(shares: U256, nav: U256, supply: U256) -> Result<U256, VaultError> {
    if supply.is_zero() || nav.is_zero() {
        return Ok(U256::zero());
    }
    mul_div(shares, nav, supply)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(n: u64) -> U256 {
        U256::from(n) * U256::exp10(6)
    }

    fn shares(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn bootstrap_mints_one_share_per_stable_unit() {
        let params = VaultParams::default();
        let minted = usd_to_shares(usd(1_000), U256::zero(), U256::zero(), &params).unwrap();
        assert_eq!(minted, shares(1_000));
    }

    #[test]
    fn conversion_tracks_nav_per_share() {
        let params = VaultParams::default();
        // Pool worth 2,000 USD backing 1,000 shares: each share is 2 USD.
        let minted = usd_to_shares(usd(100), usd(2_000), shares(1_000), &params).unwrap();
        assert_eq!(minted, shares(50));

        let value = shares_to_usd(shares(50), usd(2_000), shares(1_000)).unwrap();
        assert_eq!(value, usd(100));
    }

    #[test]
    fn conversion_floors_toward_the_pool() {
        let params = VaultParams::default();
        // 3 shares backed by 10 stable units: 1 unit buys 0.3 shares,
        // floored by the integer math.
        let minted = usd_to_shares(
            U256::from(1u64),
            U256::from(10u64),
            U256::from(3u64),
            &params,
        )
        .unwrap();
        assert_eq!(minted, U256::zero());
    }

    #[test]
    fn degenerate_nav_with_outstanding_supply_rejected() {
        let params = VaultParams::default();
        let err = usd_to_shares(usd(1), U256::zero(), shares(1_000), &params).unwrap_err();
        assert!(matches!(err, VaultError::DegenerateNav { .. }));
    }

    #[test]
    fn shares_are_worthless_in_degenerate_states() {
        assert_eq!(
            shares_to_usd(shares(10), U256::zero(), shares(100)).unwrap(),
            U256::zero()
        );
        assert_eq!(
            shares_to_usd(shares(10), usd(100), U256::zero()).unwrap(),
            U256::zero()
        );
    }

    #[test]
    fn round_trip_never_creates_value() {
        let params = VaultParams::default();
        let nav = usd(1_234_567);
        let supply = shares(999_999);
        let deposit = usd(777);
        let minted = usd_to_shares(deposit, nav, supply, &params).unwrap();
        let back = shares_to_usd(minted, nav, supply).unwrap();
        assert!(back <= deposit);
    }
}

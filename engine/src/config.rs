//! # Protocol Configuration & Constants
//!
//! Every magic number in Meridian lives here. Decimal precisions, the fee
//! schedule, the reward rate — if a formula needs a constant, it reads it
//! from this module or from a [`VaultParams`] passed in explicitly.
//!
//! There is deliberately no global mutable registry: components receive a
//! `VaultParams` (or a reference to one) at construction or call time, so
//! every knob is visible in the call graph and testable without ambient
//! state.

use serde::{Deserialize, Serialize};

use crate::error::VaultError;

// ---------------------------------------------------------------------------
// Denominations
// ---------------------------------------------------------------------------

/// Decimal precision of the stable reference currency (USDC-style).
pub const STABLE_DECIMALS: u8 = 6;

/// Decimal precision of the vault share token.
pub const SHARE_DECIMALS: u8 = 18;

/// Decimal precision of the staking reward token.
pub const REWARD_DECIMALS: u8 = 18;

// ---------------------------------------------------------------------------
// Time
// ---------------------------------------------------------------------------

/// Seconds per accrual year. 365 days flat — no leap-day accounting, the
/// same convention the reward rate is quoted against.
pub const SECONDS_PER_YEAR: u64 = 365 * 24 * 60 * 60;

// ---------------------------------------------------------------------------
// Well-known addresses
// ---------------------------------------------------------------------------

/// The vault's own treasury address. Bootstrap shares are minted here, the
/// pooled stable balance lives here, and fee buckets are paid from here.
pub const VAULT_ADDRESS: &str = "mrdn:vault";

// ---------------------------------------------------------------------------
// Default fee schedule
// ---------------------------------------------------------------------------

/// Fee on share redemption, percent of gross USD value.
pub const DEFAULT_REDEMPTION_FEE_PERCENT: u8 = 1;

/// Fee on value realized from external positions, percent.
pub const DEFAULT_REPAYMENT_FEE_PERCENT: u8 = 2;

/// Fee on claimed rewards, percent of the gross reward.
pub const DEFAULT_EARNING_FEE_PERCENT: u8 = 10;

/// Reward accrued on staked principal, percent per year, linear.
pub const DEFAULT_REWARD_RATE_PERCENT: u8 = 2;

/// Upper bound for every integer percentage parameter.
pub const MAX_PERCENT: u8 = 100;

// ---------------------------------------------------------------------------
// VaultParams
// ---------------------------------------------------------------------------

/// The complete tunable parameter set for one vault instance.
///
/// Constructed once at vault creation and mutated only through the
/// capability-gated setters on the vault itself. Every percentage is a
/// whole number in `0..=100`, applied with floor division.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Fee on share redemption, percent of gross USD value.
    pub redemption_fee_percent: u8,
    /// Fee on value realized from selling/withdrawing external positions.
    pub repayment_fee_percent: u8,
    /// Fee deducted from gross reward claims.
    pub earning_fee_percent: u8,
    /// Linear reward accrual on staked principal, percent per year.
    pub reward_rate_percent: u8,
    /// Decimal precision of the stable reference currency.
    pub stable_decimals: u8,
    /// Decimal precision of the share token.
    pub share_decimals: u8,
}

impl VaultParams {
    /// Validates that every percentage is within `0..=100`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidAmount`] naming the first out-of-range
    /// parameter.
    pub fn validate(&self) -> Result<(), VaultError> {
        if self.redemption_fee_percent > MAX_PERCENT {
            return Err(VaultError::InvalidAmount {
                reason: "redemption fee percent exceeds 100",
            });
        }
        if self.repayment_fee_percent > MAX_PERCENT {
            return Err(VaultError::InvalidAmount {
                reason: "repayment fee percent exceeds 100",
            });
        }
        if self.earning_fee_percent > MAX_PERCENT {
            return Err(VaultError::InvalidAmount {
                reason: "earning fee percent exceeds 100",
            });
        }
        if self.reward_rate_percent > MAX_PERCENT {
            return Err(VaultError::InvalidAmount {
                reason: "reward rate percent exceeds 100",
            });
        }
        Ok(())
    }
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            redemption_fee_percent: DEFAULT_REDEMPTION_FEE_PERCENT,
            repayment_fee_percent: DEFAULT_REPAYMENT_FEE_PERCENT,
            earning_fee_percent: DEFAULT_EARNING_FEE_PERCENT,
            reward_rate_percent: DEFAULT_REWARD_RATE_PERCENT,
            stable_decimals: STABLE_DECIMALS,
            share_decimals: SHARE_DECIMALS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(VaultParams::default().validate().is_ok());
    }

    #[test]
    fn default_schedule_matches_constants() {
        let p = VaultParams::default();
        assert_eq!(p.redemption_fee_percent, 1);
        assert_eq!(p.repayment_fee_percent, 2);
        assert_eq!(p.earning_fee_percent, 10);
        assert_eq!(p.reward_rate_percent, 2);
    }

    #[test]
    fn out_of_range_percent_rejected() {
        let mut p = VaultParams::default();
        p.earning_fee_percent = 101;
        assert!(matches!(
            p.validate(),
            Err(VaultError::InvalidAmount { .. })
        ));
    }

    #[test]
    fn seconds_per_year_sanity() {
        assert_eq!(SECONDS_PER_YEAR, 31_536_000);
    }

    #[test]
    fn share_token_is_finer_than_stable() {
        // The bootstrap conversion scales up; the precisions must allow it.
        assert!(SHARE_DECIMALS >= STABLE_DECIMALS);
    }

    #[test]
    fn params_serialization_roundtrip() {
        let p = VaultParams::default();
        let json = serde_json::to_string(&p).expect("serialize");
        let recovered: VaultParams = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(p, recovered);
    }
}

//! # Stake Accrual Ledger
//!
//! Per-holder staked principal and linear time-weighted reward accrual.
//!
//! Accrual is folded into a position's claim cap lazily, on every
//! principal mutation (rebase-on-mutation): before any stake, unstake, or
//! claim touches a position, the reward earned since `last_update` is
//! added to `claim_cap` and the timestamp advances. Between mutations the
//! pending accrual is only computed, never stored, so reads stay pure.
//!
//! The accrual formula is a single floored division over the whole
//! elapsed interval:
//!
//! ```text
//! accrual = amount * rate_percent * elapsed / (SECONDS_PER_YEAR * 100)
//! ```
//!
//! One division per fold means rounding loss is bounded by one smallest
//! unit per mutation, not one per second.
//!
//! `claim_cap` only ever grows and `redeemed` only ever grows, with
//! `redeemed <= claim_cap` after every fold. Unstaking principal slows
//! future accrual but never claws back what was already earned.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::{mul_div, U256};
use crate::config::SECONDS_PER_YEAR;
use crate::error::VaultError;

/// One holder's staking position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakePosition {
    /// Staked principal, in share smallest units.
    pub amount: U256,
    /// Lifetime reward earned through `last_update`, in reward smallest
    /// units. Monotone non-decreasing.
    pub claim_cap: U256,
    /// Lifetime reward paid out. Monotone non-decreasing, never exceeds
    /// the folded claim cap.
    pub redeemed: U256,
    /// Timestamp of the last fold, seconds since epoch.
    pub last_update: u64,
}

impl StakePosition {
    fn new(now: u64) -> Self {
        Self {
            amount: U256::zero(),
            claim_cap: U256::zero(),
            redeemed: U256::zero(),
            last_update: now,
        }
    }
}

/// Reward accrued by `amount` of principal over `elapsed` seconds at
/// `rate_percent` per year, floored.
fn accrual(amount: U256, rate_percent: u8, elapsed: u64) -> Result<U256, VaultError> {
    let numerator_factor = U256::from(rate_percent) * U256::from(elapsed);
    let denominator = U256::from(SECONDS_PER_YEAR) * U256::from(100u8);
    mul_div(amount, numerator_factor, denominator)
}

/// All staking positions for one vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeAccrualLedger {
    positions: HashMap<String, StakePosition>,
}

impl StakeAccrualLedger {
    /// Creates an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds pending accrual into `holder`'s claim cap and advances the
    /// position's timestamp to `now`. Creates the position if absent.
    ///
    /// Idempotent for a fixed `now`. A `now` earlier than `last_update`
    /// is treated as zero elapsed time.
    pub fn rebase(&mut self, holder: &str, rate_percent: u8, now: u64) -> Result<(), VaultError> {
        let position = self
            .positions
            .entry(holder.to_string())
            .or_insert_with(|| StakePosition::new(now));
        let elapsed = now.saturating_sub(position.last_update);
        let earned = accrual(position.amount, rate_percent, elapsed)?;
        position.claim_cap = position
            .claim_cap
            .checked_add(earned)
            .ok_or(VaultError::Overflow { op: "claim cap" })?;
        position.last_update = now;
        Ok(())
    }

    /// Adds `amount` to `holder`'s staked principal, folding accrual at
    /// the old principal first.
    pub fn stake(
        &mut self,
        holder: &str,
        amount: U256,
        rate_percent: u8,
        now: u64,
    ) -> Result<(), VaultError> {
        self.rebase(holder, rate_percent, now)?;
        let position = self.positions.get_mut(holder).expect("rebased above");
        position.amount = position
            .amount
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "stake amount" })?;
        Ok(())
    }

    /// Removes `amount` from `holder`'s staked principal, folding accrual
    /// at the old principal first. Earned rewards are unaffected.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if less than `amount`
    /// is staked.
    pub fn unstake(
        &mut self,
        holder: &str,
        amount: U256,
        rate_percent: u8,
        now: u64,
    ) -> Result<(), VaultError> {
        self.rebase(holder, rate_percent, now)?;
        let position = self.positions.get_mut(holder).expect("rebased above");
        if position.amount < amount {
            return Err(VaultError::InsufficientBalance {
                available: position.amount,
                requested: amount,
            });
        }
        position.amount -= amount;
        Ok(())
    }

    /// Marks `amount` of reward as paid out of `holder`'s position.
    ///
    /// Folds accrual first, so rewards earned up to `now` are claimable
    /// in the same call.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InvalidAmount`] for a zero claim and
    /// [`VaultError::InsufficientClaimable`] if `amount` exceeds what is
    /// redeemable.
    pub fn claim(
        &mut self,
        holder: &str,
        amount: U256,
        rate_percent: u8,
        now: u64,
    ) -> Result<(), VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount {
                reason: "claim amount must be positive",
            });
        }
        self.rebase(holder, rate_percent, now)?;
        let position = self.positions.get_mut(holder).expect("rebased above");
        let redeemable = position.claim_cap - position.redeemed;
        if amount > redeemable {
            return Err(VaultError::InsufficientClaimable {
                redeemable,
                requested: amount,
            });
        }
        position.redeemed += amount;
        Ok(())
    }

    /// The reward `holder` could claim at `now`: the folded headroom plus
    /// accrual pending since the last fold. Does not mutate the position.
    pub fn redeemable(&self, holder: &str, rate_percent: u8, now: u64) -> Result<U256, VaultError> {
        let Some(position) = self.positions.get(holder) else {
            return Ok(U256::zero());
        };
        let elapsed = now.saturating_sub(position.last_update);
        let pending = accrual(position.amount, rate_percent, elapsed)?;
        let folded = position.claim_cap - position.redeemed;
        folded
            .checked_add(pending)
            .ok_or(VaultError::Overflow { op: "redeemable" })
    }

    /// `holder`'s staked principal.
    pub fn staked_amount(&self, holder: &str) -> U256 {
        self.positions
            .get(holder)
            .map(|p| p.amount)
            .unwrap_or_default()
    }

    /// Sum of all staked principal. Must equal the share ledger's escrow
    /// total at all times.
    pub fn total_staked(&self) -> U256 {
        self.positions
            .values()
            .fold(U256::zero(), |acc, p| acc + p.amount)
    }

    /// Sum of every holder's redeemable reward at `now`.
    pub fn total_redeemable(&self, rate_percent: u8, now: u64) -> Result<U256, VaultError> {
        let mut total = U256::zero();
        for holder in self.positions.keys() {
            let amount = self.redeemable(holder, rate_percent, now)?;
            total = total
                .checked_add(amount)
                .ok_or(VaultError::Overflow { op: "redeemable sum" })?;
        }
        Ok(total)
    }

    /// Sum of every holder's lifetime redeemed reward.
    pub fn total_redeemed(&self) -> U256 {
        self.positions
            .values()
            .fold(U256::zero(), |acc, p| acc + p.redeemed)
    }

    /// Iterates over holders with live positions (non-zero principal or
    /// unclaimed reward headroom).
    pub fn holders(&self) -> impl Iterator<Item = &str> {
        self.positions
            .iter()
            .filter(|(_, p)| !p.amount.is_zero() || p.claim_cap > p.redeemed)
            .map(|(holder, _)| holder.as_str())
    }

    /// Read access to a raw position, for inspection.
    pub fn position(&self, holder: &str) -> Option<&StakePosition> {
        self.positions.get(holder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const T0: u64 = 1_700_000_000;
    const RATE: u8 = 2;

    fn shares(n: u64) -> U256 {
        U256::from(n) * U256::exp10(18)
    }

    #[test]
    fn accrual_over_one_year_is_rate_percent() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let redeemable = ledger
            .redeemable("mrdn:alice", RATE, T0 + SECONDS_PER_YEAR)
            .unwrap();
        // 2% of 100 staked units.
        assert_eq!(redeemable, shares(2));
    }

    #[test]
    fn accrual_over_half_year_is_half() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let redeemable = ledger
            .redeemable("mrdn:alice", RATE, T0 + SECONDS_PER_YEAR / 2)
            .unwrap();
        assert_eq!(redeemable, shares(1));
    }

    #[test]
    fn redeemable_is_idempotent_for_fixed_now() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(50), RATE, T0).unwrap();
        let now = T0 + 12_345_678;
        let first = ledger.redeemable("mrdn:alice", RATE, now).unwrap();
        let second = ledger.redeemable("mrdn:alice", RATE, now).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn rebase_is_idempotent_for_fixed_now() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(50), RATE, T0).unwrap();
        let now = T0 + SECONDS_PER_YEAR;
        ledger.rebase("mrdn:alice", RATE, now).unwrap();
        let cap_after_first = ledger.position("mrdn:alice").unwrap().claim_cap;
        ledger.rebase("mrdn:alice", RATE, now).unwrap();
        assert_eq!(ledger.position("mrdn:alice").unwrap().claim_cap, cap_after_first);
    }

    #[test]
    fn unstake_preserves_earned_rewards() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let year = T0 + SECONDS_PER_YEAR;
        ledger.unstake("mrdn:alice", shares(100), RATE, year).unwrap();
        // Principal gone, reward earned while staked remains claimable.
        assert_eq!(ledger.staked_amount("mrdn:alice"), U256::zero());
        assert_eq!(
            ledger.redeemable("mrdn:alice", RATE, year).unwrap(),
            shares(2)
        );
        // No further accrual on zero principal.
        assert_eq!(
            ledger
                .redeemable("mrdn:alice", RATE, year + SECONDS_PER_YEAR)
                .unwrap(),
            shares(2)
        );
    }

    #[test]
    fn stake_increase_accrues_at_old_principal_first() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let year = T0 + SECONDS_PER_YEAR;
        ledger.stake("mrdn:alice", shares(100), RATE, year).unwrap();
        // First year earned on 100; second year earns on 200.
        assert_eq!(
            ledger
                .redeemable("mrdn:alice", RATE, year + SECONDS_PER_YEAR)
                .unwrap(),
            shares(2) + shares(4)
        );
    }

    #[test]
    fn claim_reduces_redeemable() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let year = T0 + SECONDS_PER_YEAR;
        ledger.claim("mrdn:alice", shares(1), RATE, year).unwrap();
        assert_eq!(
            ledger.redeemable("mrdn:alice", RATE, year).unwrap(),
            shares(1)
        );
        assert_eq!(ledger.total_redeemed(), shares(1));
    }

    #[test]
    fn zero_claim_rejected() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let err = ledger
            .claim("mrdn:alice", U256::zero(), RATE, T0)
            .unwrap_err();
        assert!(matches!(err, VaultError::InvalidAmount { .. }));
    }

    #[test]
    fn overclaim_rejected_and_state_unchanged() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        let year = T0 + SECONDS_PER_YEAR;
        let err = ledger
            .claim("mrdn:alice", shares(3), RATE, year)
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::InsufficientClaimable { redeemable, .. } if redeemable == shares(2)
        ));
        assert_eq!(ledger.total_redeemed(), U256::zero());
    }

    #[test]
    fn unknown_holder_has_zero_redeemable() {
        let ledger = StakeAccrualLedger::new();
        assert_eq!(
            ledger.redeemable("mrdn:nobody", RATE, T0).unwrap(),
            U256::zero()
        );
        assert_eq!(ledger.staked_amount("mrdn:nobody"), U256::zero());
    }

    #[test]
    fn clock_rewind_accrues_nothing() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        assert_eq!(
            ledger.redeemable("mrdn:alice", RATE, T0 - 1000).unwrap(),
            U256::zero()
        );
    }

    #[test]
    fn single_division_bounds_rounding_loss() {
        // 1 smallest unit staked for just under the time needed to earn
        // one reward unit accrues zero, then exactly one at the boundary.
        let mut ledger = StakeAccrualLedger::new();
        ledger
            .stake("mrdn:alice", U256::from(1u64), RATE, T0)
            .unwrap();
        // One smallest unit at 2%/yr earns 1 unit after 50 years.
        let fifty_years = 50 * SECONDS_PER_YEAR;
        assert_eq!(
            ledger
                .redeemable("mrdn:alice", RATE, T0 + fifty_years - 1)
                .unwrap(),
            U256::zero()
        );
        assert_eq!(
            ledger
                .redeemable("mrdn:alice", RATE, T0 + fifty_years)
                .unwrap(),
            U256::from(1u64)
        );
    }

    #[test]
    fn total_staked_sums_all_holders() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(10), RATE, T0).unwrap();
        ledger.stake("mrdn:bob", shares(5), RATE, T0).unwrap();
        assert_eq!(ledger.total_staked(), shares(15));
    }

    #[test]
    fn total_redeemable_sums_pending_accrual() {
        let mut ledger = StakeAccrualLedger::new();
        ledger.stake("mrdn:alice", shares(100), RATE, T0).unwrap();
        ledger.stake("mrdn:bob", shares(200), RATE, T0).unwrap();
        let year = T0 + SECONDS_PER_YEAR;
        assert_eq!(
            ledger.total_redeemable(RATE, year).unwrap(),
            shares(2) + shares(4)
        );
    }
}

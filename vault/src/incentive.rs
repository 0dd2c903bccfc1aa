//! # Incentive Pool
//!
//! An optional distribution layer on top of the reward token. A sponsor
//! funds the pool with an external incentive asset; holders convert their
//! claimed reward tokens into a proportional cut of it:
//!
//! ```text
//! payout = amount * (pool_balance - accrued_fee) / total_entitled
//! ```
//!
//! where `total_entitled` is every reward token in circulation plus every
//! reward still redeemable from the stake ledger. Burning the converted
//! reward tokens shrinks the denominator in step with the balance, so
//! later claimants are neither diluted nor enriched by earlier ones.
//!
//! The earning fee applies on the payout leg and stays in the pool until
//! swept. The core accrual and claim paths know nothing about this
//! module.

use tracing::info;

use meridian_engine::amount::{mul_div, percent_of, U256};
use meridian_engine::auth::Action;
use meridian_engine::error::VaultError;

use crate::operations::VaultOperations;

/// Balance and unswept fees of one incentive pool.
#[derive(Debug, Clone, Default)]
pub struct IncentivePool {
    pool_balance: U256,
    accrued_fee: U256,
}

impl IncentivePool {
    /// Creates an empty pool.
    pub fn new() -> Self {
        Self::default()
    }

    /// The pool's total balance, unswept fees included.
    pub fn balance(&self) -> U256 {
        self.pool_balance
    }

    /// Fees accrued on past payouts, not yet swept.
    pub fn accrued_fee(&self) -> U256 {
        self.accrued_fee
    }

    /// The portion of the pool distributable to claimants.
    pub fn distributable(&self) -> U256 {
        self.pool_balance - self.accrued_fee
    }

    /// Adds sponsor funding to the pool.
    pub fn fund(&mut self, amount: U256) -> Result<(), VaultError> {
        self.pool_balance = self
            .pool_balance
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "pool funding" })?;
        Ok(())
    }

    /// Converts `amount` of the caller's reward tokens into the
    /// proportional incentive payout, net of the earning fee. The reward
    /// tokens are burned.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidAmount`] for a zero amount or an empty pool,
    /// [`VaultError::InsufficientBalance`] if the caller holds fewer
    /// reward tokens than `amount`.
    pub fn claim_incentive(
        &mut self,
        vault: &mut VaultOperations,
        caller: &str,
        amount: U256,
    ) -> Result<U256, VaultError> {
        if amount.is_zero() {
            return Err(VaultError::InvalidAmount {
                reason: "incentive claim must be positive",
            });
        }
        let distributable = self.distributable();
        if distributable.is_zero() {
            return Err(VaultError::InvalidAmount {
                reason: "incentive pool is empty",
            });
        }
        let held = vault.reward_balance_of(caller);
        if held < amount {
            return Err(VaultError::InsufficientBalance {
                available: held,
                requested: amount,
            });
        }
        let total_entitled = vault
            .reward_supply()
            .checked_add(vault.total_redeemable_rewards()?)
            .ok_or(VaultError::Overflow { op: "entitlement sum" })?;
        let gross = mul_div(amount, distributable, total_entitled)?;
        let fee = percent_of(gross, vault.params().earning_fee_percent)?;
        let net = gross - fee;

        vault.burn_reward(caller, amount)?;
        self.pool_balance -= net;
        self.accrued_fee = self
            .accrued_fee
            .checked_add(fee)
            .ok_or(VaultError::Overflow { op: "incentive fee" })?;
        info!(caller, amount = %amount, net = %net, fee = %fee, "incentive claimed");
        Ok(net)
    }

    /// Sweeps the accrued fee out of the pool. Requires the same
    /// capability as the vault's own fee sweeps.
    pub fn sweep_fee(
        &mut self,
        vault: &VaultOperations,
        caller: &str,
    ) -> Result<U256, VaultError> {
        vault.authorize(caller, Action::SweepFees)?;
        let amount = self.accrued_fee;
        self.accrued_fee = U256::zero();
        self.pool_balance -= amount;
        info!(caller, amount = %amount, "incentive fee swept");
        Ok(amount)
    }
}

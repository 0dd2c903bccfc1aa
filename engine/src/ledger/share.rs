//! # Share Ledger
//!
//! The vault share token, plus the staking escrow pool. Staked shares
//! leave the holder's free balance and enter a single vault-held escrow
//! total; they keep counting toward total supply (and therefore toward
//! NAV-per-share) the whole time.
//!
//! Invariant: `sum(free balances) + escrow_total == total_supply`, always.
//! Per-holder staked principal is tracked in the stake ledger; this ledger
//! only knows the aggregate.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::U256;
use crate::error::VaultError;

/// Free balances, escrowed total, and supply for the share token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShareLedger {
    balances: HashMap<String, U256>,
    escrow_total: U256,
    total_supply: U256,
}

impl ShareLedger {
    /// Creates an empty share ledger.
    pub fn new() -> Self {
        Self {
            balances: HashMap::new(),
            escrow_total: U256::zero(),
            total_supply: U256::zero(),
        }
    }

    /// The free (unstaked) balance of `holder`.
    pub fn balance_of(&self, holder: &str) -> U256 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    /// Aggregate shares currently held in the staking escrow.
    pub fn escrow_total(&self) -> U256 {
        self.escrow_total
    }

    /// Total shares in existence, free and escrowed together.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Mints `amount` new shares into `holder`'s free balance.
    pub fn mint(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "share supply" })?;
        let balance = self.balances.entry(holder.to_string()).or_default();
        *balance = balance.checked_add(amount).ok_or(VaultError::Overflow {
            op: "share balance",
        })?;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Mints `amount` new shares directly into escrow, bypassing any free
    /// balance. Used when a deposit is staked in the same operation.
    pub fn mint_to_escrow(&mut self, amount: U256) -> Result<(), VaultError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "share supply" })?;
        self.escrow_total = self
            .escrow_total
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "share escrow" })?;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burns `amount` shares from `holder`'s free balance.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if the free balance is
    /// short. Escrowed shares cannot be burned this way.
    pub fn burn(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances
            .insert(holder.to_string(), available - amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Burns `amount` shares straight out of escrow.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if escrow holds less
    /// than `amount`.
    pub fn burn_from_escrow(&mut self, amount: U256) -> Result<(), VaultError> {
        if self.escrow_total < amount {
            return Err(VaultError::InsufficientBalance {
                available: self.escrow_total,
                requested: amount,
            });
        }
        self.escrow_total -= amount;
        self.total_supply -= amount;
        Ok(())
    }

    /// Moves `amount` free shares between holders. Supply is unchanged.
    pub fn transfer(&mut self, from: &str, to: &str, amount: U256) -> Result<(), VaultError> {
        let available = self.balance_of(from);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        if from == to {
            return Ok(());
        }
        self.balances.insert(from.to_string(), available - amount);
        let to_balance = self.balances.entry(to.to_string()).or_default();
        *to_balance += amount;
        Ok(())
    }

    /// Moves `amount` shares from `holder`'s free balance into escrow.
    ///
    /// The per-holder staked bookkeeping happens in the stake ledger; the
    /// caller performs both moves under one operation.
    pub fn stake_to_escrow(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        let available = self.balance_of(holder);
        if available < amount {
            return Err(VaultError::InsufficientBalance {
                available,
                requested: amount,
            });
        }
        self.balances
            .insert(holder.to_string(), available - amount);
        // Supply-bounded, cannot overflow.
        self.escrow_total += amount;
        Ok(())
    }

    /// Moves `amount` shares out of escrow back to `holder`'s free balance.
    pub fn release_from_escrow(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        if self.escrow_total < amount {
            return Err(VaultError::InsufficientBalance {
                available: self.escrow_total,
                requested: amount,
            });
        }
        self.escrow_total -= amount;
        let balance = self.balances.entry(holder.to_string()).or_default();
        *balance += amount;
        Ok(())
    }
}

impl Default for ShareLedger {
    fn default() -> Self {
        Self::new()
    }
}

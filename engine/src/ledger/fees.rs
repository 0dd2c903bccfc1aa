//! # Fee Buckets
//!
//! Protocol fees accumulate in per-category buckets until an admin sweeps
//! them. Accrual happens at the operation that earned the fee; the funds
//! themselves stay in the vault's balances (stable for redemption and
//! repayment fees, reward token for earning fees) until sweep time, so an
//! unswept bucket still counts toward NAV.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::U256;
use crate::error::VaultError;

/// The fee categories a vault accrues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeeKind {
    /// Charged on share redemption, denominated in stable units.
    Redemption,
    /// Charged on value realized from external positions, stable units.
    Repayment,
    /// Charged on reward claims, denominated in reward token units.
    Earning,
}

impl FeeKind {
    /// All categories, for iteration.
    pub const ALL: [FeeKind; 3] = [FeeKind::Redemption, FeeKind::Repayment, FeeKind::Earning];
}

/// Accumulated, not-yet-swept fees by category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeeLedger {
    accrued: HashMap<FeeKind, U256>,
}

impl FeeLedger {
    /// Creates an empty fee ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `amount` to the `kind` bucket.
    pub fn accrue(&mut self, kind: FeeKind, amount: U256) -> Result<(), VaultError> {
        let bucket = self.accrued.entry(kind).or_default();
        *bucket = bucket
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "fee bucket" })?;
        Ok(())
    }

    /// The unswept balance of the `kind` bucket.
    pub fn accrued(&self, kind: FeeKind) -> U256 {
        self.accrued.get(&kind).copied().unwrap_or_default()
    }

    /// Drains the `kind` bucket to zero, returning what it held.
    pub fn sweep(&mut self, kind: FeeKind) -> U256 {
        self.accrued.remove(&kind).unwrap_or_default()
    }
}

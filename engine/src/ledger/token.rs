//! # Fungible Token Ledger
//!
//! A plain balances-and-supply ledger for the stable currency and the
//! reward token. Mint and burn model value crossing the vault boundary:
//! an inflow from the outside world is a mint to the receiving address,
//! an outflow is a burn from the paying address. Inside the boundary,
//! `transfer` moves value between addresses without touching supply.
//!
//! Zero-amount moves are permitted here. Entry-point validation belongs
//! to the vault orchestrator, not the books.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::amount::U256;
use crate::error::VaultError;

/// Balances and total supply for one fungible token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger {
    symbol: String,
    decimals: u8,
    balances: HashMap<String, U256>,
    total_supply: U256,
}

impl TokenLedger {
    /// Creates an empty ledger for a token named `symbol` with the given
    /// decimal precision.
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            balances: HashMap::new(),
            total_supply: U256::zero(),
        }
    }

    /// The token's display symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// The token's decimal precision.
    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    /// The balance held by `holder`, zero if the address is unknown.
    pub fn balance_of(&self, holder: &str) -> U256 {
        self.balances.get(holder).copied().unwrap_or_default()
    }

    /// Total units in circulation.
    pub fn total_supply(&self) -> U256 {
        self.total_supply
    }

    /// Iterates over every non-zero balance.
    pub fn all_balances(&self) -> impl Iterator<Item = (&str, U256)> {
        self.balances
            .iter()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(holder, amount)| (holder.as_str(), *amount))
    }

    /// Creates `amount` new units in `holder`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Overflow`] if supply or the balance would
    /// exceed 256 bits.
    pub fn mint(&mut self, holder: &str, amount: U256) -> Result<(), VaultError> {
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "mint supply" })?;
        let balance = self.balances.entry(holder.to_string()).or_default();
        *balance = balance
            .checked_add(amount)
            .ok_or(VaultError::Overflow { op: "mint balance" })?;
        self.total_supply = new_supply;
        Ok(())
    }

    /// Destroys `amount` units from `holder`'s balance.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if `holder` does not
    /// hold at least `amount`.
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

    /// Moves `amount` units from `from` to `to`. Supply is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::InsufficientBalance`] if `from` does not hold
    /// at least `amount`.
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
        // Cannot overflow: `from` held the amount under the same supply.
        *to_balance += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usd(amount: u64) -> U256 {
        U256::from(amount)
    }

    #[test]
    fn mint_increases_balance_and_supply() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(1_000_000)).unwrap();
        assert_eq!(ledger.balance_of("mrdn:alice"), usd(1_000_000));
        assert_eq!(ledger.total_supply(), usd(1_000_000));
    }

    #[test]
    fn burn_requires_sufficient_balance() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(100)).unwrap();
        let err = ledger.burn("mrdn:alice", usd(101)).unwrap_err();
        assert!(matches!(err, VaultError::InsufficientBalance { .. }));
        // Nothing changed.
        assert_eq!(ledger.balance_of("mrdn:alice"), usd(100));
        assert_eq!(ledger.total_supply(), usd(100));
    }

    #[test]
    fn transfer_conserves_supply() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(500)).unwrap();
        ledger.transfer("mrdn:alice", "mrdn:bob", usd(200)).unwrap();
        assert_eq!(ledger.balance_of("mrdn:alice"), usd(300));
        assert_eq!(ledger.balance_of("mrdn:bob"), usd(200));
        assert_eq!(ledger.total_supply(), usd(500));
    }

    #[test]
    fn self_transfer_is_a_noop() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(500)).unwrap();
        ledger
            .transfer("mrdn:alice", "mrdn:alice", usd(500))
            .unwrap();
        assert_eq!(ledger.balance_of("mrdn:alice"), usd(500));
    }

    #[test]
    fn transfer_from_unknown_address_fails() {
        let mut ledger = TokenLedger::new("USDm", 6);
        let err = ledger
            .transfer("mrdn:nobody", "mrdn:bob", usd(1))
            .unwrap_err();
        assert!(matches!(
            err,
            VaultError::InsufficientBalance { available, .. } if available.is_zero()
        ));
    }

    #[test]
    fn zero_amount_moves_are_permitted() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", U256::zero()).unwrap();
        ledger.burn("mrdn:alice", U256::zero()).unwrap();
        ledger
            .transfer("mrdn:alice", "mrdn:bob", U256::zero())
            .unwrap();
        assert_eq!(ledger.total_supply(), U256::zero());
    }

    #[test]
    fn all_balances_skips_emptied_accounts() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(10)).unwrap();
        ledger.mint("mrdn:bob", usd(20)).unwrap();
        ledger.burn("mrdn:alice", usd(10)).unwrap();
        let holders: Vec<&str> = ledger.all_balances().map(|(h, _)| h).collect();
        assert_eq!(holders, vec!["mrdn:bob"]);
    }

    #[test]
    fn ledger_serialization_roundtrip() {
        let mut ledger = TokenLedger::new("USDm", 6);
        ledger.mint("mrdn:alice", usd(42)).unwrap();
        let json = serde_json::to_string(&ledger).expect("serialize");
        let recovered: TokenLedger = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(recovered.balance_of("mrdn:alice"), usd(42));
        assert_eq!(recovered.total_supply(), usd(42));
        assert_eq!(recovered.symbol(), "USDm");
    }
}

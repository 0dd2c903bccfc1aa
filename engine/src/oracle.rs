//! # External Position Interfaces
//!
//! The vault holds opaque references to yield-bearing positions that live
//! in external systems. Two seams connect the books to those systems:
//!
//! * [`ValuationOracle`] prices a position in stable units. NAV is
//!   recomputed from it on every operation; nothing is cached.
//! * [`PositionCustody`] moves the positions themselves: in, out,
//!   purchased with pooled capital, or sold back for stable value.
//!
//! Both are injected as trait objects. External calls can fail; the vault
//! treats any failure as grounds to abort the whole operation before its
//! own ledgers change.
//!
//! [`StaticOracle`] and [`StaticCustody`] are the in-memory doubles used
//! by tests and the CLI simulator, with valuation control and failure
//! injection.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::amount::U256;
use crate::error::VaultError;

// ---------------------------------------------------------------------------
// Position references
// ---------------------------------------------------------------------------

/// An opaque handle to one external position. The vault never inspects
/// what is behind the handle; it only prices and transfers it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PositionRef(Uuid);

impl PositionRef {
    /// Mints a fresh, globally unique handle.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for PositionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pos:{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Seams
// ---------------------------------------------------------------------------

/// Prices external positions in stable smallest units.
pub trait ValuationOracle: Send + Sync {
    /// The current stable value of `position`.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::ExternalCallFailed`] if the position cannot
    /// be priced.
    fn value_of_position(&self, position: &PositionRef) -> Result<U256, VaultError>;
}

/// Moves positions between the vault and the outside world.
///
/// Every method models an external call: it may fail, and the vault must
/// not have mutated its own state when it does.
pub trait PositionCustody: Send + Sync {
    /// Takes custody of `position` from `from` on the vault's behalf.
    fn transfer_position_in(&self, from: &str, position: &PositionRef) -> Result<(), VaultError>;

    /// Releases custody of `position` to `to`.
    fn transfer_position_out(&self, to: &str, position: &PositionRef) -> Result<(), VaultError>;

    /// Spends `usd` of pooled capital in `pool` to acquire a new position,
    /// returning its handle.
    fn purchase_position(&self, usd: U256, pool: &str) -> Result<PositionRef, VaultError>;

    /// Liquidates `position`, returning the stable value realized.
    fn sell_position(&self, position: &PositionRef) -> Result<U256, VaultError>;
}

// ---------------------------------------------------------------------------
// In-memory doubles
// ---------------------------------------------------------------------------

/// A valuation oracle backed by a hash map. Tests move prices by writing
/// to it directly.
#[derive(Debug, Default)]
pub struct StaticOracle {
    values: RwLock<HashMap<PositionRef, U256>>,
}

impl StaticOracle {
    /// Creates an oracle that knows no positions.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or overwrites) the price of `position`.
    pub fn set_value(&self, position: PositionRef, value: U256) {
        self.values
            .write()
            .expect("oracle lock poisoned")
            .insert(position, value);
    }

    /// Forgets `position`, making future valuations fail.
    pub fn remove(&self, position: &PositionRef) {
        self.values
            .write()
            .expect("oracle lock poisoned")
            .remove(position);
    }
}

impl ValuationOracle for StaticOracle {
    fn value_of_position(&self, position: &PositionRef) -> Result<U256, VaultError> {
        self.values
            .read()
            .expect("oracle lock poisoned")
            .get(position)
            .copied()
            .ok_or_else(|| VaultError::ExternalCallFailed(format!("no valuation for {position}")))
    }
}

/// An in-memory custody double tracking which address owns each position,
/// priced by a shared [`StaticOracle`].
///
/// `fail_next` arms a one-shot failure: the next custody call returns
/// [`VaultError::ExternalCallFailed`] without moving anything, which is
/// how atomicity tests exercise the abort paths.
#[derive(Debug)]
pub struct StaticCustody {
    vault: String,
    owners: RwLock<HashMap<PositionRef, String>>,
    oracle: Arc<StaticOracle>,
    fail_next: AtomicBool,
}

impl StaticCustody {
    /// Creates a custody double that credits acquisitions to `vault` and
    /// prices positions through `oracle`.
    pub fn new(vault: &str, oracle: Arc<StaticOracle>) -> Self {
        Self {
            vault: vault.to_string(),
            owners: RwLock::new(HashMap::new()),
            oracle,
            fail_next: AtomicBool::new(false),
        }
    }

    /// Registers a position owned by `owner` and priced at `value`.
    pub fn seed_position(&self, owner: &str, value: U256) -> PositionRef {
        let position = PositionRef::generate();
        self.oracle.set_value(position, value);
        self.owners
            .write()
            .expect("custody lock poisoned")
            .insert(position, owner.to_string());
        position
    }

    /// Arms a one-shot failure on the next custody call.
    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    /// The current owner of `position`, if known.
    pub fn owner_of(&self, position: &PositionRef) -> Option<String> {
        self.owners
            .read()
            .expect("custody lock poisoned")
            .get(position)
            .cloned()
    }

    fn check_armed_failure(&self, call: &str) -> Result<(), VaultError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(VaultError::ExternalCallFailed(format!(
                "injected failure in {call}"
            )));
        }
        Ok(())
    }

    fn move_position(
        &self,
        position: &PositionRef,
        expected_owner: &str,
        new_owner: &str,
    ) -> Result<(), VaultError> {
        let mut owners = self.owners.write().expect("custody lock poisoned");
        match owners.get(position) {
            Some(owner) if owner == expected_owner => {
                owners.insert(*position, new_owner.to_string());
                Ok(())
            }
            Some(owner) => Err(VaultError::ExternalCallFailed(format!(
                "{position} is owned by {owner}, not {expected_owner}"
            ))),
            None => Err(VaultError::ExternalCallFailed(format!(
                "unknown position {position}"
            ))),
        }
    }
}

impl PositionCustody for StaticCustody {
    fn transfer_position_in(&self, from: &str, position: &PositionRef) -> Result<(), VaultError> {
        self.check_armed_failure("transfer_position_in")?;
        self.move_position(position, from, &self.vault)
    }

    fn transfer_position_out(&self, to: &str, position: &PositionRef) -> Result<(), VaultError> {
        self.check_armed_failure("transfer_position_out")?;
        self.move_position(position, &self.vault, to)
    }

    fn purchase_position(&self, usd: U256, _pool: &str) -> Result<PositionRef, VaultError> {
        self.check_armed_failure("purchase_position")?;
        if usd.is_zero() {
            return Err(VaultError::ExternalCallFailed(
                "cannot purchase a position for zero".to_string(),
            ));
        }
        let position = PositionRef::generate();
        self.oracle.set_value(position, usd);
        self.owners
            .write()
            .expect("custody lock poisoned")
            .insert(position, self.vault.clone());
        Ok(position)
    }

    fn sell_position(&self, position: &PositionRef) -> Result<U256, VaultError> {
        self.check_armed_failure("sell_position")?;
        let value = self.oracle.value_of_position(position)?;
        let mut owners = self.owners.write().expect("custody lock poisoned");
        match owners.remove(position) {
            Some(owner) if owner == self.vault => {
                drop(owners);
                self.oracle.remove(position);
                Ok(value)
            }
            Some(owner) => {
                owners.insert(*position, owner.clone());
                Err(VaultError::ExternalCallFailed(format!(
                    "{position} is owned by {owner}, not the vault"
                )))
            }
            None => Err(VaultError::ExternalCallFailed(format!(
                "unknown position {position}"
            ))),
        }
    }
}

//! # Error Surface
//!
//! Every fallible operation in the engine and the vault orchestrator speaks
//! [`VaultError`]. One enum, one meaning per variant, with the offending
//! values carried along so a failed call explains itself without a debugger.
//!
//! The propagation policy is all-or-nothing: an error from any step of a
//! multi-ledger operation means no ledger was mutated. Callers may retry;
//! the engine never retries internally.

use thiserror::Error;

use crate::amount::U256;
use crate::auth::Action;

/// Errors that can occur during vault operations.
#[derive(Debug, Error)]
pub enum VaultError {
    /// The vault has not been started yet — capital must be seeded and
    /// `start_vault_operation` invoked before user operations are accepted.
    #[error("vault is not operating yet")]
    NotOperating,

    /// The vault has already been started; starting is one-way and once.
    #[error("vault is already operating")]
    AlreadyOperating,

    /// The vault is administratively paused. Only migration/rescue
    /// operations are accepted until unpause.
    #[error("vault is paused")]
    Paused,

    /// A debit exceeds the available balance.
    #[error("insufficient balance: available {available}, requested {requested}")]
    InsufficientBalance {
        /// The balance available to the debit.
        available: U256,
        /// The amount that was requested.
        requested: U256,
    },

    /// A reward claim exceeds the holder's redeemable amount.
    #[error("insufficient claimable reward: redeemable {redeemable}, requested {requested}")]
    InsufficientClaimable {
        /// The holder's currently redeemable reward.
        redeemable: U256,
        /// The amount that was requested.
        requested: U256,
    },

    /// The pool NAV is zero while shares are outstanding. Conversions that
    /// require nonzero USD backing cannot proceed.
    #[error("degenerate NAV: {supply} shares outstanding with zero backing")]
    DegenerateNav {
        /// The outstanding share supply.
        supply: U256,
    },

    /// The caller lacks the capability required for this action.
    #[error("unauthorized: {caller} may not perform {action}")]
    Unauthorized {
        /// The caller that was rejected.
        caller: String,
        /// The action that was attempted.
        action: Action,
    },

    /// A call to the custody protocol or valuation oracle failed. The
    /// enclosing operation was aborted with no ledger changes.
    #[error("external call failed: {0}")]
    ExternalCallFailed(String),

    /// A zero or otherwise nonsensical input amount.
    #[error("invalid amount: {reason}")]
    InvalidAmount {
        /// What made the amount invalid.
        reason: &'static str,
    },

    /// Checked arithmetic failed. With 256-bit amounts this indicates
    /// corrupted inputs or an attack, not ordinary use.
    #[error("arithmetic overflow during {op}")]
    Overflow {
        /// The operation that overflowed.
        op: &'static str,
    },
}

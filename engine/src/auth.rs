//! # Capability Checks
//!
//! Administrative entry points are gated by an injected predicate rather
//! than any ambient notion of "the caller". Every privileged operation
//! takes an explicit `caller` string and asks the [`Authorizer`] whether
//! that caller may perform a named [`Action`]. The engine does not decide
//! who is an admin; it only enforces the answer.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The privileged actions a vault exposes to its access-control layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Transition the vault from `Uninitialized` to `Operating`.
    StartOperation,
    /// Set the paused flag.
    Pause,
    /// Clear the paused flag.
    Unpause,
    /// Sweep an accumulated fee bucket to a recipient.
    SweepFees,
    /// Change fee percentages or the reward rate.
    SetParameters,
    /// Deploy pooled capital into (or out of) external positions.
    ManagePositions,
    /// Rescue operations: migrate positions or stable balance out.
    Migrate,
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::StartOperation => write!(f, "StartOperation"),
            Action::Pause => write!(f, "Pause"),
            Action::Unpause => write!(f, "Unpause"),
            Action::SweepFees => write!(f, "SweepFees"),
            Action::SetParameters => write!(f, "SetParameters"),
            Action::ManagePositions => write!(f, "ManagePositions"),
            Action::Migrate => write!(f, "Migrate"),
        }
    }
}

/// The capability predicate supplied by the (out-of-scope) access-control
/// layer. Implementations decide; the vault enforces.
pub trait Authorizer: Send + Sync {
    /// Returns `true` if `caller` may perform `action`.
    fn is_authorized(&self, caller: &str, action: Action) -> bool;
}

/// The simplest useful authorizer: one admin address may do everything,
/// everyone else may do nothing privileged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SingleAdmin {
    admin: String,
}

impl SingleAdmin {
    /// Creates an authorizer recognizing `admin` as the sole privileged
    /// caller.
    pub fn new(admin: &str) -> Self {
        Self {
            admin: admin.to_string(),
        }
    }
}

impl Authorizer for SingleAdmin {
    fn is_authorized(&self, caller: &str, _action: Action) -> bool {
        caller == self.admin
    }
}

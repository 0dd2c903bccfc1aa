//! # Meridian Vault
//!
//! Orchestration for the Meridian investment vault. The engine crate
//! provides the ledgers and math; this crate composes them into the
//! operations depositors and admins actually invoke:
//!
//! - **Operations** — the `VaultOperations` state machine: deposits,
//!   redemptions, staking, reward claims, external-position flows,
//!   fee sweeps, pause and migration.
//! - **Incentive** — an optional distribution pool that converts reward
//!   claims into a proportional cut of an external incentive asset.
//!
//! ## Design Principles
//!
//! 1. Every entry point takes an explicit `caller`; privileged ones ask
//!    the injected authorizer, nothing reads ambient identity.
//! 2. NAV and conversion rates are recomputed inside each call from the
//!    live ledgers, never carried across calls.
//! 3. All-or-nothing: validation and external calls come before the
//!    first ledger write, so a failed operation leaves no trace.

pub mod incentive;
pub mod operations;

pub use incentive::IncentivePool;
pub use operations::{VaultOperations, VaultState};

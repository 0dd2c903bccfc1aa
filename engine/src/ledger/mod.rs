//! # Ledger Module
//!
//! Four ledgers, one invariant web:
//!
//! ```text
//! token.rs — plain fungible ledger (stable coin, reward token)
//! share.rs — the vault share token, with a staking escrow pool folded
//!            into its supply accounting
//! stake.rs — per-holder staked principal and time-weighted reward accrual
//! fees.rs  — per-category fee accumulators with sweep-to-recipient
//! ```
//!
//! The binding invariant: the share ledger's free balances plus its escrow
//! pool always equal its total supply, and the escrow pool always equals
//! the sum of staked principal in the stake ledger. The orchestrator keeps
//! the two in lockstep by rebasing the stake ledger immediately before any
//! principal-affecting escrow move.
//!
//! All amounts are `U256` in smallest-unit denomination; all arithmetic is
//! checked; all state derives `Serialize`/`Deserialize` for persistence.

pub mod fees;
pub mod share;
pub mod stake;
pub mod token;

pub use fees::{FeeKind, FeeLedger};
pub use share::ShareLedger;
pub use stake::{StakeAccrualLedger, StakePosition};
pub use token::TokenLedger;

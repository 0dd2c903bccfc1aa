// Copyright (c) 2026 Meridian Labs. MIT License.
// See LICENSE for details.

//! # Meridian Engine — Core Accounting Library
//!
//! This is the part of Meridian that must never be wrong: the ledgers and
//! integer math behind a pooled investment vault. Depositors hand over a
//! stable coin, receive a share token priced against the pool's live net
//! asset value, and may park those shares in a staking escrow that accrues
//! a separate reward token by the second.
//!
//! Everything here is deterministic integer arithmetic. Every division
//! floors, every addition is checked, and every derived value is
//! recomputed from the source ledgers at the moment it is needed.
//!
//! ## Architecture
//!
//! The engine is split into modules that mirror the accounting concerns:
//!
//! - **config** — Protocol constants and the `VaultParams` knob set.
//! - **amount** — 256-bit amount math: multiply-then-divide, fee percent.
//! - **error** — The one typed error surface every operation speaks.
//! - **clock** — Injected time. Tests own the clock; the ledger obeys it.
//! - **auth** — Capability checks as an injected predicate, not ambient magic.
//! - **ledger** — Fungible ledgers, the share ledger with its staking
//!   escrow, the time-weighted stake accrual ledger, and fee buckets.
//! - **exchange** — USD ⇄ share conversion against live NAV and supply.
//! - **oracle** — Traits for the external valuation oracle and position
//!   custody protocol, plus in-memory doubles for tests and simulation.
//!
//! ## Design Philosophy
//!
//! 1. Correctness over cleverness. Money code reads boring on purpose.
//! 2. Derived values (NAV, conversion rates) are never cached across calls.
//! 3. Every mutation validates first, commits second — no partial state.
//! 4. If it touches a balance, it has tests. Plural.

pub mod amount;
pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod exchange;
pub mod ledger;
pub mod oracle;

pub use amount::{U256, U512};
pub use error::VaultError;

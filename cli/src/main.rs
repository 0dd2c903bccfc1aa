// Copyright (c) 2026 Meridian Labs. MIT License.
// See LICENSE for details.

//! # Meridian Simulator
//!
//! Entry point for the `meridian` binary. Parses CLI arguments,
//! initializes logging, and drives a scripted vault lifecycle under a
//! hand-cranked clock: bootstrap, deposits (plain and staked), a
//! position purchase-and-sale round trip, a year of reward accrual,
//! claims, and fee sweeps. The final books go to stdout as JSON.
//!
//! The binary supports three subcommands:
//!
//! - `simulate` — run the scripted lifecycle and print the books
//! - `params`   — print the default vault parameters
//! - `version`  — print build version information

mod cli;
mod logging;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;

use meridian_engine::amount::U256;
use meridian_engine::auth::SingleAdmin;
use meridian_engine::clock::{Clock, ManualClock};
use meridian_engine::config::{VaultParams, VAULT_ADDRESS};
use meridian_engine::ledger::FeeKind;
use meridian_engine::oracle::{PositionCustody, StaticCustody, StaticOracle, ValuationOracle};
use meridian_vault::{VaultOperations, VaultState};

use cli::{Commands, MeridianCli};

/// The administrator address used by every simulation run.
const ADMIN: &str = "mrdn:admin";

/// Address receiving swept fees.
const TREASURY: &str = "mrdn:treasury";

/// Simulation epoch: 2025-01-01T00:00:00Z.
const SIM_START: u64 = 1_735_689_600;

fn main() -> Result<()> {
    let cli = MeridianCli::parse();

    match cli.command {
        Commands::Simulate(args) => run_simulation(args),
        Commands::Params => print_params(),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// One holder's final balances in the simulation report.
#[derive(Debug, Serialize)]
struct HolderReport {
    address: String,
    stable: U256,
    free_shares: U256,
    staked_shares: U256,
    reward: U256,
}

/// The final books of a simulation run.
#[derive(Debug, Serialize)]
struct SimulationReport {
    state: VaultState,
    paused: bool,
    pool_nav: U256,
    share_supply: U256,
    vault_stable: U256,
    holders: Vec<HolderReport>,
    swept_redemption_fee: U256,
    swept_repayment_fee: U256,
    swept_earning_fee: U256,
    treasury_stable: U256,
    treasury_reward: U256,
}

/// Converts whole stable units to six-decimal smallest units.
fn usd(whole: u64) -> U256 {
    U256::from(whole) * U256::exp10(6)
}

/// Runs the scripted lifecycle and prints the final books.
fn run_simulation(args: cli::SimulateArgs) -> Result<()> {
    logging::init_logging(
        "meridian=info,meridian_vault=info,meridian_engine=info",
        args.log_format,
    );

    tracing::info!(
        seed_usd = args.seed_usd,
        depositors = args.depositors,
        deposit_usd = args.deposit_usd,
        days = args.days,
        "starting simulation"
    );

    let clock = Arc::new(ManualClock::new(SIM_START));
    let oracle = Arc::new(StaticOracle::new());
    let custody = Arc::new(StaticCustody::new(VAULT_ADDRESS, Arc::clone(&oracle)));

    let mut vault = VaultOperations::new(
        VaultParams::default(),
        Arc::clone(&oracle) as Arc<dyn ValuationOracle>,
        Arc::clone(&custody) as Arc<dyn PositionCustody>,
        Arc::new(SingleAdmin::new(ADMIN)),
        Arc::clone(&clock) as Arc<dyn Clock>,
    )
    .context("invalid vault parameters")?;

    // --- Bootstrap ---
    vault.credit_stable(VAULT_ADDRESS, usd(args.seed_usd))?;
    vault.start_vault_operation(ADMIN)?;

    // --- Depositors: half the deposit held free, half staked ---
    let holders: Vec<String> = (0..args.depositors)
        .map(|i| format!("mrdn:holder-{i}"))
        .collect();
    let half = args.deposit_usd / 2;
    if args.deposit_usd > 0 {
        for holder in &holders {
            vault.credit_stable(holder, usd(args.deposit_usd))?;
            vault.deposit_stable(holder, usd(args.deposit_usd - half))?;
            if half > 0 {
                vault.deposit_stable_with_stake(holder, usd(half))?;
            }
        }
    }

    // --- Deploy a quarter of the pool, let it appreciate 10%, sell ---
    let deploy = vault.stable_balance_of(VAULT_ADDRESS) / U256::from(4u64);
    if !deploy.is_zero() {
        let position = vault.purchase_position(ADMIN, deploy, "senior")?;
        let appreciated = deploy * U256::from(110u64) / U256::from(100u64);
        oracle.set_value(position, appreciated);
        vault.sell_position(ADMIN, position, deploy)?;
    }

    // --- Accrue, claim, redeem ---
    clock.advance(args.days * 86_400);
    for holder in &holders {
        vault.claim_all_rewards(holder)?;
        let free = vault.share_balance_of(holder);
        if !free.is_zero() {
            vault.redeem_shares(holder, free / U256::from(2u64))?;
        }
    }

    // --- Sweep every bucket to the treasury ---
    let swept_redemption = vault.sweep_fees(ADMIN, FeeKind::Redemption, TREASURY)?;
    let swept_repayment = vault.sweep_fees(ADMIN, FeeKind::Repayment, TREASURY)?;
    let swept_earning = vault.sweep_fees(ADMIN, FeeKind::Earning, TREASURY)?;

    let report = SimulationReport {
        state: vault.state(),
        paused: vault.is_paused(),
        pool_nav: vault.pool_nav()?,
        share_supply: vault.share_supply(),
        vault_stable: vault.stable_balance_of(VAULT_ADDRESS),
        holders: holders
            .iter()
            .map(|holder| HolderReport {
                address: holder.clone(),
                stable: vault.stable_balance_of(holder),
                free_shares: vault.share_balance_of(holder),
                staked_shares: vault.staked_amount(holder),
                reward: vault.reward_balance_of(holder),
            })
            .collect(),
        swept_redemption_fee: swept_redemption,
        swept_repayment_fee: swept_repayment,
        swept_earning_fee: swept_earning,
        treasury_stable: vault.stable_balance_of(TREASURY),
        treasury_reward: vault.reward_balance_of(TREASURY),
    };

    let rendered =
        serde_json::to_string_pretty(&report).context("failed to render simulation report")?;
    println!("{rendered}");
    Ok(())
}

/// Prints the default vault parameters as JSON.
fn print_params() -> Result<()> {
    let rendered = serde_json::to_string_pretty(&VaultParams::default())
        .context("failed to render parameters")?;
    println!("{rendered}");
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("meridian {}", env!("CARGO_PKG_VERSION"));
}

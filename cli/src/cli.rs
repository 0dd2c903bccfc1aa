//! # CLI Interface
//!
//! Defines the command-line argument structure for `meridian` using
//! `clap` derive. Supports three subcommands: `simulate`, `params`,
//! and `version`.

use clap::{Parser, Subcommand};

use crate::logging::LogFormat;

/// Meridian vault simulator.
///
/// Drives a complete vault lifecycle under a hand-cranked clock:
/// bootstrap, deposits, staking, external position flows, reward claims,
/// and fee sweeps. Prints the resulting books as JSON on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "meridian",
    about = "Meridian vault simulation driver",
    version,
    propagate_version = true
)]
pub struct MeridianCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `meridian` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scripted vault lifecycle and print the final books.
    Simulate(SimulateArgs),
    /// Print the default vault parameters as JSON.
    Params,
    /// Print version information and exit.
    Version,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Treasury seed, in whole stable units.
    #[arg(long, env = "MERIDIAN_SEED_USD", default_value_t = 1_000)]
    pub seed_usd: u64,

    /// Number of simulated depositors.
    #[arg(long, env = "MERIDIAN_DEPOSITORS", default_value_t = 3)]
    pub depositors: u32,

    /// Per-depositor deposit, in whole stable units.
    #[arg(long, default_value_t = 100)]
    pub deposit_usd: u64,

    /// Days to let staking rewards accrue before claims.
    #[arg(long, default_value_t = 365)]
    pub days: u64,

    /// Log output format.
    #[arg(long, value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        MeridianCli::command().debug_assert();
    }
}

//! # CLI Interface
//!
//! Defines the command-line argument structure for `ledger-node` using
//! `clap` derive. Supports three subcommands: `run`, `inspect`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use ledger_protocol::config::{DEFAULT_API_PORT, DEFAULT_CONTRACT_ACCOUNT, DEFAULT_METRICS_PORT};

use crate::logging::LogFormat;

/// Escrowed donation ledger node.
///
/// Hosts the donation contract on a local account, persists its storage in
/// sled, serves the HTTP API, and exposes Prometheus metrics.
#[derive(Parser, Debug)]
#[command(
    name = "ledger-node",
    about = "Escrowed donation ledger node",
    version,
    propagate_version = true
)]
pub struct LedgerNodeCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the ledger node binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the node.
    Run(RunArgs),
    /// Open a data directory offline and print the contract state.
    Inspect(InspectArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Directory holding the contract's sled database.
    ///
    /// Created on first run if it does not exist.
    #[arg(long, short = 'd', env = "LEDGER_DATA_DIR", default_value = "./ledger-data")]
    pub data_dir: PathBuf,

    /// Account id the contract is deployed on. Its parent account receives
    /// donation fees.
    #[arg(long, env = "LEDGER_ACCOUNT_ID", default_value = DEFAULT_CONTRACT_ACCOUNT)]
    pub account_id: String,

    /// Port for the HTTP API.
    #[arg(long, env = "LEDGER_API_PORT", default_value_t = DEFAULT_API_PORT)]
    pub api_port: u16,

    /// Port for the Prometheus metrics endpoint.
    #[arg(long, env = "LEDGER_METRICS_PORT", default_value_t = DEFAULT_METRICS_PORT)]
    pub metrics_port: u16,

    /// Log output format.
    #[arg(long, env = "LEDGER_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

/// Arguments for the `inspect` subcommand.
#[derive(Parser, Debug)]
pub struct InspectArgs {
    /// Directory holding the contract's sled database.
    #[arg(long, short = 'd', env = "LEDGER_DATA_DIR", default_value = "./ledger-data")]
    pub data_dir: PathBuf,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        LedgerNodeCli::command().debug_assert();
    }

    #[test]
    fn run_defaults() {
        let cli = LedgerNodeCli::try_parse_from(["ledger-node", "run"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.account_id, DEFAULT_CONTRACT_ACCOUNT);
        assert_eq!(args.api_port, DEFAULT_API_PORT);
        assert_eq!(args.log_format, LogFormat::Pretty);
    }

    #[test]
    fn log_format_parses_json() {
        let cli =
            LedgerNodeCli::try_parse_from(["ledger-node", "run", "--log-format", "json"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.log_format, LogFormat::Json);
    }
}

// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Ledger Node
//!
//! Entry point for the `ledger-node` binary. Parses CLI arguments,
//! initializes logging and metrics, opens the contract's storage, and serves
//! the HTTP API.
//!
//! The binary supports three subcommands:
//!
//! - `run`     — host the contract and serve the API
//! - `inspect` — print the contract state from a data directory
//! - `version` — print build version information

mod api;
mod cli;
mod host;
mod logging;
mod metrics;

use anyhow::{Context, Result};
use clap::Parser;
use parking_lot::Mutex;
use std::sync::Arc;
use tokio::signal;

use ledger_contracts::DonationContract;
use ledger_protocol::storage::SledStore;
use ledger_protocol::AccountId;

use cli::{Commands, LedgerNodeCli};
use host::{DynStore, LedgerHost};
use metrics::LedgerMetrics;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = LedgerNodeCli::parse();

    match cli.command {
        Commands::Run(args) => run_node(args).await,
        Commands::Inspect(args) => inspect(args),
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Hosts the contract: API server and metrics endpoint.
async fn run_node(args: cli::RunArgs) -> Result<()> {
    logging::init_logging(logging::DEFAULT_FILTER, args.log_format);

    let account_id = AccountId::new(args.account_id.as_str())
        .with_context(|| format!("invalid contract account id: {}", args.account_id))?;
    if account_id.is_top_level() {
        tracing::warn!(%account_id, "top-level account has no fee collector; donations will be rejected");
    }

    tracing::info!(
        %account_id,
        api_port = args.api_port,
        metrics_port = args.metrics_port,
        data_dir = %args.data_dir.display(),
        "starting ledger-node"
    );

    // --- Persistent storage ---
    let store = open_store(&args.data_dir)?;
    let store: DynStore = Box::new(store);
    let host = LedgerHost::new(account_id, store);
    if !host.contract().is_initialized()? {
        tracing::info!("contract is not initialized yet; waiting for POST /init");
    }

    // --- Metrics ---
    let ledger_metrics =
        Arc::new(LedgerMetrics::new().context("failed to create prometheus registry")?);
    ledger_metrics.observe(host.pending_count(), host.contract().get_balance().ok());

    // --- Application state ---
    let app_state = api::AppState {
        version: format!(
            "{} (protocol {})",
            env!("CARGO_PKG_VERSION"),
            ledger_protocol::config::PROTOCOL_VERSION,
        ),
        host: Arc::new(Mutex::new(host)),
        metrics: Arc::clone(&ledger_metrics),
    };

    // --- API server ---
    let api_router = api::create_router(app_state);
    let api_addr = format!("0.0.0.0:{}", args.api_port);
    let api_listener = tokio::net::TcpListener::bind(&api_addr)
        .await
        .with_context(|| format!("failed to bind API listener on {}", api_addr))?;
    tracing::info!("API server listening on {}", api_addr);

    // --- Metrics server ---
    let metrics_router = axum::Router::new()
        .route("/metrics", axum::routing::get(metrics::metrics_handler))
        .with_state(Arc::clone(&ledger_metrics));
    let metrics_addr = format!("0.0.0.0:{}", args.metrics_port);
    let metrics_listener = tokio::net::TcpListener::bind(&metrics_addr)
        .await
        .with_context(|| format!("failed to bind metrics listener on {}", metrics_addr))?;
    tracing::info!("Metrics server listening on {}", metrics_addr);

    // --- Serve ---
    tokio::select! {
        res = axum::serve(api_listener, api_router) => {
            if let Err(e) = res {
                tracing::error!("API server error: {}", e);
            }
        }
        res = axum::serve(metrics_listener, metrics_router) => {
            if let Err(e) = res {
                tracing::error!("Metrics server error: {}", e);
            }
        }
        _ = shutdown_signal() => {
            tracing::info!("shutdown signal received, draining connections");
        }
    }

    // Open calls live only in memory; their callbacks will never run.
    tracing::info!("ledger-node stopped");
    Ok(())
}

/// Opens the sled database under `data_dir`, creating it if needed.
fn open_store(data_dir: &std::path::Path) -> Result<SledStore> {
    let db_path = data_dir.join("db");
    std::fs::create_dir_all(&db_path)
        .with_context(|| format!("failed to create database directory: {}", db_path.display()))?;
    let store = SledStore::open(&db_path)
        .with_context(|| format!("failed to open database at {}", db_path.display()))?;
    tracing::info!(path = %db_path.display(), "database opened");
    Ok(store)
}

/// Prints owner, balance, and donations from a data directory.
fn inspect(args: cli::InspectArgs) -> Result<()> {
    let contract = DonationContract::new(open_store(&args.data_dir)?);

    if !contract.is_initialized()? {
        println!("Contract not initialized ({})", args.data_dir.display());
        return Ok(());
    }

    let owner = contract.get_owner()?;
    let balance = contract.get_balance()?;
    let donations = contract.get_donations()?;

    println!("Owner     : {}", owner);
    println!("Balance   : {}", balance);
    println!("Donations : {}", donations.len());
    for donation in &donations {
        println!(
            "  {:<32} {:>40} @ {}",
            donation.donor.as_str(),
            donation.amount,
            donation.timestamp
        );
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("ledger-node {}", env!("CARGO_PKG_VERSION"));
    println!("protocol    {}", ledger_protocol::config::PROTOCOL_VERSION);
}

/// Waits for SIGINT (Ctrl+C) or SIGTERM, whichever comes first.
///
/// On non-Unix platforms, only Ctrl+C is supported. If a handler cannot be
/// installed, that signal is never observed.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::error!("failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}

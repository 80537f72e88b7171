//! # Structured Logging
//!
//! The node logs every receipt it executes: `ledger_contracts` emits one
//! event per state transition (initialized, donation scheduled, confirmed or
//! reverted, withdrawal scheduled, confirmed or restored), `ledger_protocol`
//! logs scheduler traffic at `debug`, and `tower_http` traces each API
//! request. Callbacks that observe a `Pending` status or fail to commit are
//! logged at `warn`.
//!
//! Everything goes to stderr. `inspect` and `version` print to stdout and
//! never install a subscriber.

use clap::ValueEnum;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used by `run` when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "ledger_node=info,ledger_contracts=info,ledger_protocol=info,tower_http=debug";

/// Log output format, selected with `--log-format` or `LEDGER_LOG_FORMAT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    /// Human-readable, with source locations.
    Pretty,
    /// One JSON object per event, for log shippers.
    Json,
}

/// Installs the global subscriber for `run`.
///
/// Panics if a subscriber is already installed, so call it once. `RUST_LOG`
/// replaces `default_filter` entirely, e.g. to follow a flow end to end:
///
/// ```text
/// RUST_LOG=ledger_contracts=debug,ledger_protocol=debug ledger-node run
/// ```
pub fn init_logging(default_filter: &str, format: LogFormat) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Pretty => registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(false),
            )
            .init(),
    }

    tracing::debug!(?format, "log subscriber installed");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_filter_parses() {
        assert!(DEFAULT_FILTER.parse::<EnvFilter>().is_ok());
    }

    #[test]
    fn log_format_names() {
        assert_eq!(LogFormat::from_str("json", true), Ok(LogFormat::Json));
        assert_eq!(LogFormat::from_str("PRETTY", true), Ok(LogFormat::Pretty));
        assert!(LogFormat::from_str("xml", true).is_err());
    }
}

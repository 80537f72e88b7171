//! # Prometheus Metrics
//!
//! Counters for both confirmation flows and gauges for the ledger itself.
//! Scraped by Prometheus at `/metrics` on the configured metrics port.
//!
//! All metrics are registered in a dedicated [`prometheus::Registry`] under
//! the `ledger` namespace so they do not collide with the default registry.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use ledger_contracts::FlowOutcome;
use ledger_protocol::Balance;

/// Which two-phase flow a metric sample belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Donation,
    Withdrawal,
}

impl Flow {
    fn label(self) -> &'static str {
        match self {
            Flow::Donation => "donation",
            Flow::Withdrawal => "withdrawal",
        }
    }
}

/// Holds all Prometheus metric handles for the node.
#[derive(Clone)]
pub struct LedgerMetrics {
    registry: Registry,
    /// Flows whose Phase 1 succeeded, by flow.
    pub flows_initiated_total: IntCounterVec,
    /// Flows whose callback saw `Success`, by flow.
    pub flows_confirmed_total: IntCounterVec,
    /// Flows whose callback saw `Failure`, by flow.
    pub flows_reverted_total: IntCounterVec,
    /// Entry calls rejected with a contract error.
    pub rejected_calls_total: IntCounter,
    /// External calls awaiting resolution.
    pub pending_calls: IntGauge,
    /// Held balance in whole tokens, truncated.
    pub balance_tokens: IntGauge,
}

impl LedgerMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new_custom(Some("ledger".into()), None)?;

        let flows_initiated_total = IntCounterVec::new(
            Opts::new("flows_initiated_total", "Two-phase flows scheduled"),
            &["flow"],
        )?;
        registry.register(Box::new(flows_initiated_total.clone()))?;

        let flows_confirmed_total = IntCounterVec::new(
            Opts::new("flows_confirmed_total", "Two-phase flows confirmed by their callback"),
            &["flow"],
        )?;
        registry.register(Box::new(flows_confirmed_total.clone()))?;

        let flows_reverted_total = IntCounterVec::new(
            Opts::new("flows_reverted_total", "Two-phase flows whose external call failed"),
            &["flow"],
        )?;
        registry.register(Box::new(flows_reverted_total.clone()))?;

        let rejected_calls_total = IntCounter::new(
            "rejected_calls_total",
            "Entry calls rejected with a contract error",
        )?;
        registry.register(Box::new(rejected_calls_total.clone()))?;

        let pending_calls = IntGauge::new("pending_calls", "External calls awaiting resolution")?;
        registry.register(Box::new(pending_calls.clone()))?;

        let balance_tokens = IntGauge::new("balance_tokens", "Held balance in whole tokens")?;
        registry.register(Box::new(balance_tokens.clone()))?;

        Ok(Self {
            registry,
            flows_initiated_total,
            flows_confirmed_total,
            flows_reverted_total,
            rejected_calls_total,
            pending_calls,
            balance_tokens,
        })
    }

    pub fn record_initiated(&self, flow: Flow) {
        self.flows_initiated_total
            .with_label_values(&[flow.label()])
            .inc();
    }

    /// Counts a callback outcome. `Unresolved` is not counted.
    pub fn record_outcome(&self, flow: Flow, outcome: FlowOutcome) {
        let counter = match outcome {
            FlowOutcome::Confirmed => &self.flows_confirmed_total,
            FlowOutcome::Reverted => &self.flows_reverted_total,
            FlowOutcome::Unresolved => return,
        };
        counter.with_label_values(&[flow.label()]).inc();
    }

    /// Refreshes the gauges from the host's current view.
    pub fn observe(&self, pending_calls: usize, balance: Option<Balance>) {
        self.pending_calls
            .set(i64::try_from(pending_calls).unwrap_or(i64::MAX));
        if let Some(balance) = balance {
            let whole = balance / ledger_protocol::config::ONE_TOKEN;
            self.balance_tokens
                .set(i64::try_from(whole).unwrap_or(i64::MAX));
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<LedgerMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}

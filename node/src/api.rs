//! # REST API
//!
//! Builds the axum router that exposes the hosted contract over HTTP. All
//! endpoints share application state through axum's `State` extractor.
//!
//! ## Endpoints
//!
//! | Method | Path                 | Description                                 |
//! |--------|----------------------|---------------------------------------------|
//! | GET    | `/health`            | Liveness probe                              |
//! | POST   | `/init`              | Initialize the contract                     |
//! | POST   | `/donations`         | Send a donation (Phase 1)                   |
//! | GET    | `/donations`         | Confirmed donations                         |
//! | POST   | `/withdrawals`       | Withdraw as the owner (Phase 1)             |
//! | GET    | `/owner`             | Contract owner                              |
//! | GET    | `/balance`           | Held balance                                |
//! | GET    | `/calls`             | External calls awaiting an outcome          |
//! | POST   | `/calls/:id/resolve` | Report an outcome and run the callback      |
//!
//! Amounts are JSON integers in base units.

use axum::{
    extract::{Path, State},
    http::{Method, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use ledger_contracts::config::{ON_DONATIONS_WITHDRAWN, ON_DONATION_SENT};
use ledger_contracts::{ContractError, Donation, DonationReceipt, WithdrawalReceipt};
use ledger_protocol::{AccountId, Balance, CallId, CallStatus, SchedulerError, Timestamp};

use crate::host::{DynStore, LedgerHost, Resolution, SharedHost};
use crate::metrics::{Flow, SharedMetrics};

// ---------------------------------------------------------------------------
// Application State
// ---------------------------------------------------------------------------

/// Shared application state available to all request handlers.
///
/// Cheap to clone; everything behind `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// The node's reported version string.
    pub version: String,
    /// The contract host. Every handler holds the lock for one receipt and
    /// never across an await point.
    pub host: SharedHost,
    /// Reference to Prometheus metrics for in-handler recording.
    pub metrics: SharedMetrics,
}

impl AppState {
    /// Refreshes the gauges from `host`.
    fn observe(&self, host: &LedgerHost<DynStore>) {
        self.metrics
            .observe(host.pending_count(), host.contract().get_balance().ok());
    }

    fn reject(&self, err: ContractError) -> ApiError {
        if err.is_precondition() {
            self.metrics.rejected_calls_total.inc();
        }
        tracing::debug!(error = %err, "call rejected");
        ApiError(err)
    }
}

// ---------------------------------------------------------------------------
// Router Construction
// ---------------------------------------------------------------------------

/// Builds the full axum [`Router`] with all API routes, CORS, and tracing.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/init", post(init_handler))
        .route("/donations", post(donate_handler).get(donations_handler))
        .route("/withdrawals", post(withdraw_handler))
        .route("/owner", get(owner_handler))
        .route("/balance", get(balance_handler))
        .route("/calls", get(calls_handler))
        .route("/calls/:id/resolve", post(resolve_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Request / Response Types
// ---------------------------------------------------------------------------

/// Body of `POST /init`.
#[derive(Debug, Serialize, Deserialize)]
pub struct InitRequest {
    /// Signer of the transaction.
    pub signer: String,
    /// Account that will own the contract.
    pub owner: String,
    /// Stake attached.
    pub deposit: Balance,
}

/// Body of `POST /donations`.
#[derive(Debug, Serialize, Deserialize)]
pub struct DonationRequest {
    /// The donor.
    pub signer: String,
    /// Amount attached, fee included.
    pub deposit: Balance,
}

/// Body of `POST /withdrawals`.
#[derive(Debug, Serialize, Deserialize)]
pub struct WithdrawalRequest {
    /// Must be the owner.
    pub signer: String,
    /// Amount to withdraw.
    pub amount: Balance,
}

/// Body of `POST /calls/:id/resolve`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ResolveRequest {
    /// `success` or `failure`.
    pub status: CallStatus,
}

/// Response payload for `GET /owner`.
#[derive(Debug, Serialize, Deserialize)]
pub struct OwnerResponse {
    /// The only account allowed to withdraw.
    pub owner: AccountId,
}

/// Response payload for `GET /balance`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    /// Held balance in base units, excluding withdrawals in flight.
    pub balance: Balance,
}

/// One entry of `GET /calls`.
#[derive(Debug, Serialize, Deserialize)]
pub struct PendingCallResponse {
    /// Numeric call id, as used in `/calls/:id/resolve`.
    pub id: u64,
    /// Account the call runs against.
    pub receiver: AccountId,
    /// Method name, or `None` for a plain transfer.
    pub method: Option<String>,
    /// Value moving out of the contract.
    pub attached_value: Balance,
    /// Signer of the transaction that scheduled the call.
    pub signer: AccountId,
    /// When it was scheduled, nanoseconds since the epoch.
    pub scheduled_at: Timestamp,
}

/// Generic error body returned by REST endpoints on failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message.
    pub error: String,
}

/// A contract error on its way to becoming an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub ContractError);

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            ContractError::NotInitialized | ContractError::AlreadyInitialized => {
                StatusCode::CONFLICT
            }
            ContractError::NotOwner { .. } | ContractError::PrivateMethod { .. } => {
                StatusCode::FORBIDDEN
            }
            ContractError::Scheduler(SchedulerError::UnknownCall(_)) => StatusCode::NOT_FOUND,
            ContractError::Scheduler(SchedulerError::NotTerminal(_)) => StatusCode::BAD_REQUEST,
            ContractError::Storage(_) | ContractError::Scheduler(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self.0, "internal error");
        }
        let body = ErrorResponse {
            error: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// `GET /health` — returns 200 if the node is alive.
async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let account_id = state.host.lock().account_id().to_string();
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "version": state.version,
            "account_id": account_id,
        })),
    )
}

/// `POST /init`
async fn init_handler(
    State(state): State<AppState>,
    Json(req): Json<InitRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let mut host = state.host.lock();
    host.init(&req.signer, &req.owner, req.deposit)
        .map_err(|e| state.reject(e))?;
    state.observe(&host);
    Ok((
        StatusCode::CREATED,
        Json(OwnerResponse {
            owner: host.contract().get_owner().map_err(ApiError)?,
        }),
    ))
}

/// `POST /donations` — Phase 1 of a donation. Nothing is credited until the
/// returned call is resolved.
async fn donate_handler(
    State(state): State<AppState>,
    Json(req): Json<DonationRequest>,
) -> Result<Json<DonationReceipt>, ApiError> {
    let mut host = state.host.lock();
    let receipt = host
        .send_donation(&req.signer, req.deposit)
        .map_err(|e| state.reject(e))?;
    state.metrics.record_initiated(Flow::Donation);
    state.observe(&host);
    Ok(Json(receipt))
}

/// `GET /donations`
async fn donations_handler(State(state): State<AppState>) -> Result<Json<Vec<Donation>>, ApiError> {
    let host = state.host.lock();
    Ok(Json(host.contract().get_donations().map_err(ApiError)?))
}

/// `POST /withdrawals` — Phase 1 of a withdrawal. The balance is debited
/// immediately.
async fn withdraw_handler(
    State(state): State<AppState>,
    Json(req): Json<WithdrawalRequest>,
) -> Result<Json<WithdrawalReceipt>, ApiError> {
    let mut host = state.host.lock();
    let receipt = host
        .withdraw_donations(&req.signer, req.amount)
        .map_err(|e| state.reject(e))?;
    state.metrics.record_initiated(Flow::Withdrawal);
    state.observe(&host);
    Ok(Json(receipt))
}

/// `GET /owner`
async fn owner_handler(State(state): State<AppState>) -> Result<Json<OwnerResponse>, ApiError> {
    let host = state.host.lock();
    let owner = host.contract().get_owner().map_err(ApiError)?;
    Ok(Json(OwnerResponse { owner }))
}

/// `GET /balance`
async fn balance_handler(State(state): State<AppState>) -> Result<Json<BalanceResponse>, ApiError> {
    let host = state.host.lock();
    let balance = host.contract().get_balance().map_err(ApiError)?;
    Ok(Json(BalanceResponse { balance }))
}

/// `GET /calls`
async fn calls_handler(State(state): State<AppState>) -> Json<Vec<PendingCallResponse>> {
    let host = state.host.lock();
    let calls = host
        .pending_calls()
        .into_iter()
        .map(|call| PendingCallResponse {
            id: call.id.0,
            method: call.method().map(str::to_string),
            attached_value: call.attached_value(),
            receiver: call.receiver,
            signer: call.signer,
            scheduled_at: call.scheduled_at,
        })
        .collect();
    Json(calls)
}

/// `POST /calls/:id/resolve` — reports the outcome of an external call and
/// runs the contract callback chained to it.
async fn resolve_handler(
    Path(id): Path<u64>,
    State(state): State<AppState>,
    Json(req): Json<ResolveRequest>,
) -> Result<Json<Resolution>, ApiError> {
    let mut host = state.host.lock();
    let resolution = host
        .resolve(CallId(id), req.status)
        .map_err(|e| state.reject(e))?;

    let flow = match resolution.callback.as_deref() {
        Some(ON_DONATION_SENT) => Some(Flow::Donation),
        Some(ON_DONATIONS_WITHDRAWN) => Some(Flow::Withdrawal),
        _ => None,
    };
    if let (Some(flow), Some(outcome)) = (flow, resolution.outcome) {
        state.metrics.record_outcome(flow, outcome);
    }
    state.observe(&host);
    Ok(Json(resolution))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

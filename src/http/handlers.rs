//! Request handlers for the two public endpoints.
//!
//! # Responsibilities
//! - Decode request bodies into ledger types
//! - Invoke the transfer service
//! - Map outcomes and errors onto HTTP status codes and JSON bodies

use std::sync::Arc;
use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::ledger::types::NONCE_RACE_NOTICE;
use crate::ledger::{LedgerError, TransferOutcome, TransferRequest, TransferService};
use crate::observability::metrics;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<TransferService>,
}

/// Body returned by `POST /transaction`.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum TransferResponse {
    /// The transaction was submitted and confirmed.
    Submitted { signature: String },
    /// The durable nonce advanced first; benign race, reported as a notice.
    Notice { message: String },
}

/// Body returned by `POST /create-nonce-acct`.
#[derive(Debug, Serialize)]
pub struct CreateNonceAccountResponse {
    pub address: String,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// `POST /transaction` — submit a transfer.
pub async fn create_transfer(
    State(state): State<AppState>,
    Json(request): Json<TransferRequest>,
) -> Response {
    let start = Instant::now();

    let response = match state.service.create_transfer(&request).await {
        Ok(TransferOutcome::Submitted(signature)) => (
            StatusCode::OK,
            Json(TransferResponse::Submitted {
                signature: signature.to_string(),
            }),
        )
            .into_response(),
        Ok(TransferOutcome::NonceAdvanced) => (
            StatusCode::OK,
            Json(TransferResponse::Notice {
                message: NONCE_RACE_NOTICE.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Transfer failed");
            error_response(&err)
        }
    };

    metrics::record_request("/transaction", response.status().as_u16(), start);
    response
}

/// `POST /create-nonce-acct` — create and initialize a nonce account.
pub async fn create_nonce_account(State(state): State<AppState>) -> Response {
    let start = Instant::now();

    let response = match state.service.create_nonce_account().await {
        Ok(address) => (
            StatusCode::OK,
            Json(CreateNonceAccountResponse {
                address: address.to_string(),
            }),
        )
            .into_response(),
        Err(err) => {
            tracing::error!(error = %err, "Nonce account creation failed");
            error_response(&err)
        }
    };

    metrics::record_request("/create-nonce-acct", response.status().as_u16(), start);
    response
}

/// Map a ledger error onto an HTTP status.
///
/// Input constraint violations (bad addresses, nonce accounts that cannot be
/// read) are the caller's fault; network and submission failures surface as
/// gateway errors.
fn error_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::InvalidAddress { .. } | LedgerError::NonceUnreadable => {
            StatusCode::BAD_REQUEST
        }
        // The transfer path converts `NonceAdvanced` into an outcome before
        // it can reach a handler; the arm only keeps the mapping total.
        LedgerError::Rpc(_) | LedgerError::Execution(_) | LedgerError::NonceAdvanced => {
            StatusCode::BAD_GATEWAY
        }
        LedgerError::ConfirmationTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
        LedgerError::Key(_) | LedgerError::Compile(_) | LedgerError::Signing(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(err: &LedgerError) -> Response {
    (
        error_status(err),
        Json(ErrorBody {
            error: err.to_string(),
        }),
    )
        .into_response()
}

//! Server error types

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use slotledger_core::LedgerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServerError {
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// JSON body of every error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Machine-readable kind, e.g. `already_reserved`
    pub error: String,
    pub message: String,
}

impl ServerError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServerError::Ledger(err) => ledger_status(err),
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServerError::Ledger(err) => err.code(),
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Io(_) => "io",
            ServerError::Internal(_) => "internal",
        }
    }
}

fn ledger_status(err: &LedgerError) -> StatusCode {
    match err {
        LedgerError::UnknownRoom { .. } => StatusCode::NOT_FOUND,
        LedgerError::AlreadyReserved { .. } => StatusCode::CONFLICT,
        LedgerError::NotOwner { .. } | LedgerError::Unauthorized { .. } => StatusCode::FORBIDDEN,
        LedgerError::InsufficientPayment { .. } => StatusCode::PAYMENT_REQUIRED,
        LedgerError::TokenNotYetRedeemable { .. } => StatusCode::CONFLICT,
        LedgerError::InvalidSlot { .. }
        | LedgerError::OutOfWindow { .. }
        | LedgerError::SlotDisabled { .. }
        | LedgerError::InvalidTime
        | LedgerError::InsufficientSupply { .. }
        | LedgerError::ZeroHolder
        | LedgerError::InvalidHolder(_)
        | LedgerError::SlotDataTooLong { .. }
        | LedgerError::Overflow(_) => StatusCode::BAD_REQUEST,
        LedgerError::RingExhausted
        | LedgerError::InvalidConfig(_)
        | LedgerError::InvalidSnapshot(_)
        | LedgerError::Io(_)
        | LedgerError::Json(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        let body = ErrorBody {
            error: self.code().to_string(),
            message: self.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;

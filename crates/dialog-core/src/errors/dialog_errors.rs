//! Dialog-specific error types.
//!
//! Covers both the RFC-mandated rejection kinds the dialog state machine
//! itself produces (`no_transaction`, `request_pending`, `retry`,
//! `internal_error`) and the broader collaborator-facing errors the store
//! and decorator layers raise (dialog not found, invalid state, …).

use thiserror::Error;

use sip_types::StatusCode;

/// Result type for dialog operations.
pub type DialogResult<T> = Result<T, DialogError>;

/// Main error type for dialog operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DialogError {
    /// No matching dialog/transaction for this request — surfaces as 481.
    #[error("no matching dialog or transaction")]
    NoTransaction,

    /// Offer/answer glare: a new offer arrived while one is outstanding —
    /// surfaces as 491.
    #[error("request pending: offer/answer exchange in progress")]
    RequestPending,

    /// Transient busy condition; caller should retry after `retry_after`
    /// seconds — surfaces as 500 + `Retry-After`.
    #[error("processing previous INVITE, retry after {retry_after}s")]
    Retry { retry_after: u32 },

    /// CSeq regression, store failure, or other internal inconsistency —
    /// surfaces as 500.
    #[error("internal error: {message}")]
    InternalError { message: String },

    /// Dialog not found in the store.
    #[error("dialog not found: {id}")]
    DialogNotFound { id: String },

    /// Operation required a different dialog/invite state.
    #[error("invalid dialog state: expected {expected}, got {actual}")]
    InvalidState { expected: String, actual: String },

    /// Attempted to create a dialog that already exists.
    #[error("dialog already exists: {id}")]
    DialogAlreadyExists { id: String },

    /// SDP offer/answer bookkeeping error.
    #[error("SDP negotiation error: {message}")]
    SdpError { message: String },

    /// Configuration error (collaborator misconfiguration).
    #[error("configuration error: {message}")]
    ConfigError { message: String },
}

impl DialogError {
    pub fn internal_error(message: impl Into<String>) -> Self {
        DialogError::InternalError {
            message: message.into(),
        }
    }

    pub fn dialog_not_found(id: impl Into<String>) -> Self {
        DialogError::DialogNotFound { id: id.into() }
    }

    pub fn invalid_state(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        DialogError::InvalidState {
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    pub fn retry(retry_after: u32) -> Self {
        DialogError::Retry {
            retry_after: retry_after.min(10),
        }
    }

    /// The SIP status this error surfaces as, per §7 of the dialog spec.
    pub fn status_code(&self) -> StatusCode {
        match self {
            DialogError::NoTransaction => StatusCode::CallOrTransactionDoesNotExist,
            DialogError::RequestPending => StatusCode::RequestPending,
            DialogError::Retry { .. } => StatusCode::ServerInternalError,
            DialogError::InternalError { .. } => StatusCode::ServerInternalError,
            DialogError::DialogNotFound { .. } => StatusCode::CallOrTransactionDoesNotExist,
            DialogError::InvalidState { .. } => StatusCode::ServerInternalError,
            DialogError::DialogAlreadyExists { .. } => StatusCode::ServerInternalError,
            DialogError::SdpError { .. } => StatusCode::ServerInternalError,
            DialogError::ConfigError { .. } => StatusCode::ServerInternalError,
        }
    }

    /// `Retry-After` value, when this error carries one.
    pub fn retry_after(&self) -> Option<u32> {
        match self {
            DialogError::Retry { retry_after } => Some(*retry_after),
            _ => None,
        }
    }

    /// Reason phrase to use for the 500 "busy with previous INVITE" case.
    pub fn reason_phrase(&self) -> Option<&'static str> {
        match self {
            DialogError::Retry { .. } => Some("Processing Previous INVITE"),
            _ => None,
        }
    }
}

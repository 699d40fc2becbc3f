//! The module contains the errors the engine can throw.
//!
//! Every failure of a transfer is reported as one of these variants and
//! converted to a response at the server boundary:
//!
//! - [`InvalidRequest`] malformed or self-referential input.
//! - [`Unauthorized`] missing, malformed or unknown bearer credential.
//! - [`Forbidden`] the caller is authenticated but may not use the account.
//! - [`RecipientNotFound`] the recipient email resolves to no account.
//! - [`LedgerWriteFailed`] the atomic write was rolled back; safe to retry.
//! - [`UpstreamTimeout`] the identity provider or the store did not answer in
//!   time; safe to retry.
//!
//!  [`InvalidRequest`]: EngineError::InvalidRequest
//!  [`Unauthorized`]: EngineError::Unauthorized
//!  [`Forbidden`]: EngineError::Forbidden
//!  [`RecipientNotFound`]: EngineError::RecipientNotFound
//!  [`LedgerWriteFailed`]: EngineError::LedgerWriteFailed
//!  [`UpstreamTimeout`]: EngineError::UpstreamTimeout
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Recipient not found: {0}")]
    RecipientNotFound(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Ledger write failed: {0}")]
    LedgerWriteFailed(String),
    #[error("Upstream timeout: {0}")]
    UpstreamTimeout(String),
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether the caller may safely repeat the same request.
    ///
    /// Only failures that leave no partial state qualify.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::LedgerWriteFailed(_) | Self::UpstreamTimeout(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::InvalidRequest(a), Self::InvalidRequest(b)) => a == b,
            (Self::Unauthorized(a), Self::Unauthorized(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::RecipientNotFound(a), Self::RecipientNotFound(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::LedgerWriteFailed(a), Self::LedgerWriteFailed(b)) => a == b,
            (Self::UpstreamTimeout(a), Self::UpstreamTimeout(b)) => a == b,
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}

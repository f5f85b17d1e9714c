//! Shared primitives for all Rust crates in Postbox.

#![forbid(unsafe_code)]

use thiserror::Error;

/// Result type used across Postbox crates.
pub type AppResult<T> = Result<T, AppError>;

/// Common application error categories.
///
/// Validation and rate limiting are reported as structured results by the
/// services that own them; these variants exist so that every failure the
/// API boundary has to map onto a status code lives in one taxonomy.
#[derive(Debug, Error)]
pub enum AppError {
    /// Invalid input or violated invariant. User-correctable.
    #[error("validation error: {0}")]
    Validation(String),

    /// Submission frequency exceeded for an identifier.
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// The mail provider rejected our credentials. Operator-correctable.
    #[error("provider authentication failed: {0}")]
    ProviderAuth(String),

    /// Malformed sender or recipient address in the outbound envelope.
    #[error("invalid envelope address: {0}")]
    Envelope(String),

    /// Generic mail transport failure.
    #[error("dispatch failed: {0}")]
    Dispatch(String),

    /// Missing or invalid configuration value. Fails at startup, never
    /// per-request.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal unexpected error.
    #[error("internal error: {0}")]
    Internal(String),
}

//! Expiry parsing error types.

use thiserror::Error;

/// Expiry parsing error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExpiryParseError {
    /// The raw expiry was missing or blank
    #[error("Expiry value is empty")]
    Empty,

    /// No supported format matched
    #[error("Unparseable expiry: {0}")]
    Unparseable(String),
}

/// Result type alias using ExpiryParseError.
pub type ExpiryResult<T> = Result<T, ExpiryParseError>;

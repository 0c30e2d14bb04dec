//! Authentication flow error types.

use auth_bridge_types::{AuthErrorKind, AuthErrorPayload, ConfigError};
use thiserror::Error;

/// Authentication flow error type.
///
/// `Busy` and `InvalidConfig` are returned synchronously from
/// [`crate::AuthFlowEngine::start`]. Every other variant is delivered through
/// the pending operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Another flow holds the web surface
    #[error("An authentication flow is already in progress")]
    Busy,

    /// The configuration was rejected before navigation
    #[error("Invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// A page failed to load or a failure page was reached
    #[error("Load failed: {reason}")]
    LoadFailed { reason: String },

    /// Cancelled by the caller
    #[error("Authentication cancelled")]
    Cancelled,

    /// No terminal page before the timeout
    #[error("Authentication timed out")]
    TimedOut,

    /// Success page reached without a usable artifact
    #[error("Missing artifact: {0}")]
    MissingArtifact(String),

    /// Expiry value present but in no supported format
    #[error("Unparseable expiry: {0}")]
    UnparseableExpiry(String),
}

impl AuthError {
    pub fn load_failed(reason: impl Into<String>) -> Self {
        AuthError::LoadFailed {
            reason: reason.into(),
        }
    }

    pub fn kind(&self) -> AuthErrorKind {
        match self {
            AuthError::Busy => AuthErrorKind::Busy,
            AuthError::InvalidConfig(_) => AuthErrorKind::InvalidConfig,
            AuthError::LoadFailed { .. } => AuthErrorKind::LoadFailed,
            AuthError::Cancelled => AuthErrorKind::Cancelled,
            AuthError::TimedOut => AuthErrorKind::TimedOut,
            AuthError::MissingArtifact(_) => AuthErrorKind::MissingArtifact,
            AuthError::UnparseableExpiry(_) => AuthErrorKind::UnparseableExpiry,
        }
    }

    /// The `{kind, detail}` object handed back across the bridge.
    pub fn to_payload(&self) -> AuthErrorPayload {
        let detail = match self {
            AuthError::InvalidConfig(e) => Some(e.to_string()),
            AuthError::LoadFailed { reason } => Some(reason.clone()),
            AuthError::MissingArtifact(detail) => Some(detail.clone()),
            AuthError::UnparseableExpiry(raw) => Some(raw.clone()),
            AuthError::Busy | AuthError::Cancelled | AuthError::TimedOut => None,
        };
        AuthErrorPayload {
            kind: self.kind(),
            detail,
        }
    }
}

/// Result type alias using AuthError.
pub type FlowResult<T> = Result<T, AuthError>;

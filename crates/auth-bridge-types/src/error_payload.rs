//! Wire shape of a failed authentication.

use serde::{Deserialize, Serialize};

/// Failure kinds as the host application sees them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthErrorKind {
    /// A flow is already running on this surface.
    Busy,
    /// The configuration was missing or malformed.
    InvalidConfig,
    /// A page failed to load, or a failure page was reached.
    LoadFailed,
    /// The caller cancelled the flow.
    Cancelled,
    /// No terminal page was reached before the timeout.
    TimedOut,
    /// A success page was reached without a usable artifact.
    MissingArtifact,
    /// The artifact's expiry could not be parsed.
    UnparseableExpiry,
}

impl AuthErrorKind {
    /// Returns true for kinds raised synchronously, before any navigation.
    pub fn is_synchronous(&self) -> bool {
        matches!(self, AuthErrorKind::Busy | AuthErrorKind::InvalidConfig)
    }
}

/// `{ "kind": ..., "detail": ... }` as returned across the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthErrorPayload {
    pub kind: AuthErrorKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

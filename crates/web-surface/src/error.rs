//! Web surface error types.

use thiserror::Error;

/// Web surface error type.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SurfaceError {
    /// The surface was already disposed
    #[error("Web surface already disposed")]
    AlreadyDisposed,

    /// `load` was called a second time on the same instance
    #[error("Web surface already loaded; create a new instance to navigate again")]
    AlreadyLoaded,

    /// A Set-Cookie value could not be applied
    #[error("Invalid cookie: {0}")]
    InvalidCookie(String),

    /// Platform-specific rendering failure
    #[error("Platform error: {0}")]
    Platform(String),
}

/// Result type alias using SurfaceError.
pub type SurfaceResult<T> = Result<T, SurfaceError>;

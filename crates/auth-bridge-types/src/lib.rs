//! Shared data types for the auth bridge.
//!
//! Everything in this crate is plain data: the per-invocation [`AuthConfig`],
//! the [`NavigationEvent`]s a web surface reports, the [`SessionArtifact`]
//! pulled out of a finished flow, and the wire payloads handed back to the
//! host application.

mod artifact;
mod config;
mod error_payload;
mod navigation;

pub use artifact::{AuthResult, SessionArtifact};
pub use config::{AuthConfig, ConfigError, ConfigResult};
pub use error_payload::{AuthErrorKind, AuthErrorPayload};
pub use navigation::NavigationEvent;

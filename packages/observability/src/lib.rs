//! # Observability
//!
//! Centralized logging for the auth bridge workspace.
//!
//! ## Design Philosophy
//!
//! Crates are **log producers**. They use standard `tracing` macros and
//! never decide where logs go. Binaries call `observability::init()` once at
//! startup.
//!
//! ## Dev Mode
//!
//! All processes write structured JSONL to a single central file:
//! `~/.webauth-bridge/logs/dev.jsonl`
//!
//! - `tail -f ~/.webauth-bridge/logs/dev.jsonl | jq` for pretty JSON
//! - `lnav ~/.webauth-bridge/logs/dev.jsonl` for interactive exploration
//!
//! Multi-process safety comes from append-only writes flushed per line.
//! Field values that look like credentials (cookies, tokens, bearer headers)
//! are replaced with `[REDACTED]` before they reach the file.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("authbridge");
//!
//!     tracing::info!("started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! observability::init_with_config(observability::LogConfig {
//!     service_name: "authbridge".into(),
//!     default_level: "debug".into(),
//!     also_stderr: true,
//!     ..Default::default()
//! });
//! ```

#[cfg(feature = "dev")]
mod dev;

mod json_layer;
mod redact;

pub use json_layer::LogEntry;
pub use redact::{is_sensitive_key, sanitize_value, REDACTED};

use std::path::PathBuf;

/// Directory under the home directory holding all bridge runtime files.
pub const BASE_DIR_NAME: &str = ".webauth-bridge";

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the process (e.g., "authbridge", "host-plugin").
    /// Included in every log line for filtering.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path.
    /// Defaults to `~/.webauth-bridge/logs/dev.jsonl` in dev mode.
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr for immediate feedback.
    pub also_stderr: bool,

    /// Replace credential-looking field values with `[REDACTED]`.
    pub redact_sensitive: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            redact_sensitive: true,
        }
    }
}

/// Central log file location, if a home directory exists.
pub fn default_log_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(BASE_DIR_NAME).join("logs").join("dev.jsonl"))
}

/// Initialize logging with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize logging with custom configuration.
///
/// Only the first call in a process installs a subscriber; later calls are
/// ignored. If the central log file cannot be opened, logging falls back to
/// stderr.
pub fn init_with_config(config: LogConfig) {
    #[cfg(feature = "dev")]
    {
        if let Err(e) = dev::init_dev_subscriber(&config) {
            eprintln!("observability: central log unavailable ({e}), logging to stderr");
            init_stderr(&config);
        }
    }

    #[cfg(not(feature = "dev"))]
    init_stderr(&config);
}

fn init_stderr(config: &LogConfig) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.default_level)),
        )
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .try_init();
}

/// Re-export tracing macros for convenience.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export the span macro for structured context.
pub use tracing::span;

/// Re-export Level for advanced filtering.
pub use tracing::Level;

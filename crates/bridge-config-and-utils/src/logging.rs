//! Logging initialization for bridge processes.
//!
//! Thin wrapper over the observability crate. Every process writes
//! structured JSONL to `~/.webauth-bridge/logs/dev.jsonl`.

/// Set to `0`, `false` or `off` to keep logs out of stderr.
pub const LOG_STDERR_ENV: &str = "WEBAUTH_BRIDGE_LOG_STDERR";

const DEFAULT_SERVICE_NAME: &str = "auth-bridge";

/// Initialize the logging system under the `auth-bridge` service name.
///
/// This sets up tracing with:
/// - Structured JSONL output to `~/.webauth-bridge/logs/dev.jsonl`
/// - Log level from RUST_LOG env var or the provided default
/// - Service name included in every log line
///
/// ```ignore
/// init_logging("info");
/// tracing::info!("Bridge started");
/// ```
pub fn init_logging(level: &str) {
    init_logging_for_service(DEFAULT_SERVICE_NAME, level);
}

/// Initialize logging with a custom service name.
///
/// Use this to tell host plugins and CLI runs apart in the central stream.
pub fn init_logging_for_service(service_name: &str, level: &str) {
    let also_stderr = std::env::var(LOG_STDERR_ENV)
        .ok()
        .and_then(non_empty_env)
        .map(|raw| parse_flag(&raw))
        .unwrap_or(true);

    observability::init_with_config(observability::LogConfig {
        service_name: service_name.into(),
        default_level: level.into(),
        also_stderr,
        ..Default::default()
    });
}

fn non_empty_env(raw: String) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_flag(raw: &str) -> bool {
    !matches!(
        raw.to_ascii_lowercase().as_str(),
        "0" | "false" | "off" | "no"
    )
}

//! Subcommand implementations.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use auth_bridge::{AuthBridge, BridgeDefaults, BridgeResponse};
use bridge_config_and_utils::Config;
use chrono::SecondsFormat;
use expiry_parser::StandardExpiryParser;
use tracing::info;
use web_surface::{ScriptStep, ScriptedSurfaceFactory};

fn bridge_defaults(config: &Config) -> BridgeDefaults {
    BridgeDefaults {
        timeout_ms: Some(config.default_timeout_ms),
        expiry_required: Some(config.expiry_required_default),
    }
}

/// Run one flow over the recorded `script` and return the settled response.
///
/// Configuration errors and a busy engine are reported as a rejected
/// response, the same way the host would see them.
pub async fn replay(
    config: &Config,
    auth_config: &Path,
    script: &Path,
    cancel_after_ms: Option<u64>,
) -> anyhow::Result<BridgeResponse> {
    let raw_config = std::fs::read_to_string(auth_config)
        .with_context(|| format!("reading auth config {}", auth_config.display()))?;
    let raw_script = std::fs::read_to_string(script)
        .with_context(|| format!("reading script {}", script.display()))?;
    let steps: Vec<ScriptStep> = serde_json::from_str(&raw_script)
        .with_context(|| format!("parsing script {}", script.display()))?;

    info!(steps = steps.len(), "Replaying recorded navigation");

    let bridge = AuthBridge::new(
        Arc::new(ScriptedSurfaceFactory::new(steps)),
        Arc::new(StandardExpiryParser),
    )
    .with_defaults(bridge_defaults(config));

    let (handle, pending) = match bridge.start_auth_json(&raw_config) {
        Ok(started) => started,
        Err(e) => return Ok(BridgeResponse::from(&e)),
    };

    let response = match cancel_after_ms {
        Some(ms) => {
            let wait = pending.wait_response();
            tokio::pin!(wait);
            tokio::select! {
                response = &mut wait => response,
                _ = tokio::time::sleep(Duration::from_millis(ms)) => {
                    bridge.cancel_auth(&handle);
                    wait.await
                }
            }
        }
        None => pending.wait_response().await,
    };

    Ok(response)
}

/// Normalize `raw` to an RFC 3339 UTC timestamp.
pub fn parse_expiry(raw: &str) -> anyhow::Result<String> {
    let parsed = expiry_parser::parse_expiry(raw)
        .with_context(|| format!("could not parse expiry {raw:?}"))?;
    Ok(parsed.to_rfc3339_opts(SecondsFormat::AutoSi, true))
}

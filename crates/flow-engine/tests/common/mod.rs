#![allow(dead_code)]

use auth_bridge_types::{AuthConfig, NavigationEvent};
use expiry_parser::StandardExpiryParser;
use flow_engine::AuthFlowEngine;
use std::sync::Arc;
use std::time::Duration;
use web_surface::{ScriptStep, ScriptedSurfaceFactory, SurfaceProbe};

pub const ENTRY: &str = "https://app.example/start";
pub const IDP: &str = "https://idp.example/authorize";
pub const DONE: &str = "https://idp.example/done";
pub const ERROR_PAGE: &str = "https://idp.example/error";

/// Config with a success pattern on [`DONE`] and a failure pattern on
/// [`ERROR_PAGE`].
pub fn config(timeout_ms: i64) -> AuthConfig {
    AuthConfig::new(ENTRY, "session", "exp", timeout_ms)
        .with_success_pattern(DONE)
        .with_failure_pattern(ERROR_PAGE)
}

/// Engine backed by a scripted surface factory.
pub fn engine(script: Vec<ScriptStep>) -> (AuthFlowEngine, Arc<ScriptedSurfaceFactory>) {
    let factory = Arc::new(ScriptedSurfaceFactory::new(script));
    let engine = AuthFlowEngine::new(factory.clone(), Arc::new(StandardExpiryParser));
    (engine, factory)
}

pub fn step(event: NavigationEvent) -> ScriptStep {
    ScriptStep::new(event)
}

pub fn loaded(url: &str, cookies: &[(&str, &str)]) -> NavigationEvent {
    NavigationEvent::loaded(
        url,
        cookies.iter().map(|(k, v)| (k.to_string(), v.to_string())),
        [],
    )
}

/// Give the flow task a chance to dispose its surface.
pub async fn wait_for_dispose(probe: &SurfaceProbe) -> bool {
    for _ in 0..100 {
        if probe.is_disposed() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

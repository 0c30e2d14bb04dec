//! Handle registry around the flow engine.

use crate::BridgeResponse;
use auth_bridge_types::{AuthConfig, AuthResult, ConfigError};
use expiry_parser::ExpiryParser;
use flow_engine::{AuthError, AuthFlowEngine, FlowHandle, FlowResult, PendingAuth};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};
use web_surface::SurfaceFactory;

/// Opaque identifier the host uses to cancel a call.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AuthHandle(String);

impl AuthHandle {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AuthHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for AuthHandle {
    fn from(raw: &str) -> Self {
        Self(raw.to_string())
    }
}

/// Values filled into JSON configs that leave them out.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BridgeDefaults {
    /// Used when `timeoutMs` is absent. Without it a missing timeout is
    /// rejected as invalid.
    pub timeout_ms: Option<i64>,
    /// Used when `expiryRequired` is absent.
    pub expiry_required: Option<bool>,
}

type Registry = Arc<Mutex<HashMap<AuthHandle, FlowHandle>>>;

/// Promise-style facade over [`AuthFlowEngine`].
pub struct AuthBridge {
    engine: AuthFlowEngine,
    defaults: BridgeDefaults,
    flows: Registry,
}

impl AuthBridge {
    pub fn new(surfaces: Arc<dyn SurfaceFactory>, parser: Arc<dyn ExpiryParser>) -> Self {
        Self::with_engine(AuthFlowEngine::new(surfaces, parser))
    }

    pub fn with_engine(engine: AuthFlowEngine) -> Self {
        Self {
            engine,
            defaults: BridgeDefaults::default(),
            flows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn with_defaults(mut self, defaults: BridgeDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Number of calls that have not settled yet.
    pub fn active_count(&self) -> usize {
        let mut flows = self.flows.lock();
        flows.retain(|_, flow| !flow.is_finished());
        flows.len()
    }

    /// Start an authentication call.
    ///
    /// Only [`AuthError::Busy`] and [`AuthError::InvalidConfig`] are returned
    /// here; everything else settles the returned [`BridgePending`].
    pub fn start_auth(&self, config: AuthConfig) -> FlowResult<(AuthHandle, BridgePending)> {
        let pending = self.engine.start(config)?;
        let flow = pending.handle();
        let handle = AuthHandle(flow.flow_id().to_string());

        {
            let mut flows = self.flows.lock();
            flows.retain(|_, flow| !flow.is_finished());
            flows.insert(handle.clone(), flow);
        }

        debug!(handle = %handle, "Registered auth call");
        Ok((
            handle.clone(),
            BridgePending {
                handle,
                pending,
                flows: self.flows.clone(),
            },
        ))
    }

    /// [`AuthBridge::start_auth`] for the host's camelCase JSON config.
    pub fn start_auth_json(&self, raw: &str) -> FlowResult<(AuthHandle, BridgePending)> {
        let config = self.decode_config(raw)?;
        self.start_auth(config)
    }

    /// Cancel a call. Unknown or already settled handles are ignored.
    pub fn cancel_auth(&self, handle: &AuthHandle) {
        let flow = self.flows.lock().get(handle).cloned();
        match flow {
            Some(flow) if !flow.is_finished() => {
                info!(handle = %handle, "Cancelling auth call");
                flow.cancel();
            }
            Some(_) => debug!(handle = %handle, "Cancel for settled auth call ignored"),
            None => debug!(handle = %handle, "Cancel for unknown auth call ignored"),
        }
    }

    fn decode_config(&self, raw: &str) -> FlowResult<AuthConfig> {
        let mut value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| AuthError::InvalidConfig(ConfigError::Malformed(e.to_string())))?;

        if let Some(object) = value.as_object_mut() {
            if let Some(timeout_ms) = self.defaults.timeout_ms {
                object
                    .entry("timeoutMs")
                    .or_insert_with(|| timeout_ms.into());
            }
            if let Some(required) = self.defaults.expiry_required {
                object
                    .entry("expiryRequired")
                    .or_insert_with(|| required.into());
            }
        }

        serde_json::from_value(value)
            .map_err(|e| AuthError::InvalidConfig(ConfigError::Malformed(e.to_string())))
    }
}

/// A started call the host awaits.
pub struct BridgePending {
    handle: AuthHandle,
    pending: PendingAuth,
    flows: Registry,
}

impl BridgePending {
    pub fn handle(&self) -> &AuthHandle {
        &self.handle
    }

    pub async fn wait(self) -> FlowResult<AuthResult> {
        let outcome = self.pending.wait().await;
        self.flows.lock().remove(&self.handle);
        outcome
    }

    /// [`BridgePending::wait`] in the host's wire shape.
    pub async fn wait_response(self) -> BridgeResponse {
        BridgeResponse::from(self.wait().await)
    }
}

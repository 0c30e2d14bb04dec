//! What the host receives when a pending call settles.

use auth_bridge_types::{AuthErrorPayload, AuthResult};
use flow_engine::{AuthError, FlowResult};
use serde::{Deserialize, Serialize};

/// Settled value of a bridge call, as serialized for the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BridgeResponse {
    Resolved { result: AuthResult },
    Rejected { error: AuthErrorPayload },
}

impl BridgeResponse {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BridgeResponse::Resolved { .. })
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl From<FlowResult<AuthResult>> for BridgeResponse {
    fn from(outcome: FlowResult<AuthResult>) -> Self {
        match outcome {
            Ok(result) => BridgeResponse::Resolved { result },
            Err(error) => BridgeResponse::from(&error),
        }
    }
}

impl From<&AuthError> for BridgeResponse {
    fn from(error: &AuthError) -> Self {
        BridgeResponse::Rejected {
            error: error.to_payload(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auth_bridge_types::SessionArtifact;

    #[test]
    fn test_resolved_shape() {
        let artifact = SessionArtifact {
            cookie_name: "FedAuth".into(),
            value: "abc".into(),
            raw_expiry: None,
            source_url: "https://app.example/".into(),
            subject: None,
            companions: vec![("rtFa".into(), "xyz".into())],
        };
        let response = BridgeResponse::from(Ok(AuthResult::from_artifact(artifact, None)));
        let json: serde_json::Value =
            serde_json::from_str(&response.to_json().unwrap()).unwrap();

        assert_eq!(json["status"], "resolved");
        assert_eq!(json["result"]["artifactValue"], "abc");
        assert_eq!(json["result"]["cookieHeader"], "FedAuth=abc; rtFa=xyz");
        assert!(json["result"].get("expiresAt").is_none());
    }

    #[test]
    fn test_rejected_shape() {
        let response = BridgeResponse::from(Err(AuthError::load_failed("network-timeout")));
        assert!(!response.is_resolved());

        let json: serde_json::Value =
            serde_json::from_str(&response.to_json().unwrap()).unwrap();
        assert_eq!(json["status"], "rejected");
        assert_eq!(json["error"]["kind"], "load_failed");
        assert_eq!(json["error"]["detail"], "network-timeout");
    }
}

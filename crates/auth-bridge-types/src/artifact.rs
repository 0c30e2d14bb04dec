//! Session artifact and the terminal success value.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Credential extracted from the web surface after a successful flow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionArtifact {
    /// Name of the cookie the artifact was read from.
    pub cookie_name: String,
    /// Opaque token or cookie value.
    pub value: String,
    /// Raw expiry string as the identity provider emitted it.
    pub raw_expiry: Option<String>,
    /// URL of the page the artifact was found on.
    pub source_url: String,
    /// Account identifier reported by the identity provider.
    pub subject: Option<String>,
    /// Companion cookies found next to the artifact, in configured order.
    pub companions: Vec<(String, String)>,
}

impl SessionArtifact {
    /// `name=value; name2=value2` for the artifact and its companions.
    pub fn cookie_header(&self) -> String {
        std::iter::once((self.cookie_name.as_str(), self.value.as_str()))
            .chain(
                self.companions
                    .iter()
                    .map(|(name, value)| (name.as_str(), value.as_str())),
            )
            .map(|(name, value)| format!("{name}={value}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Value delivered to the caller when a flow resolves.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResult {
    pub artifact_value: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_expiry",
        deserialize_with = "deserialize_expiry"
    )]
    pub expires_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub cookie_header: String,
    pub source_url: String,
}

impl AuthResult {
    /// Build the terminal value from an artifact and its normalized expiry.
    pub fn from_artifact(artifact: SessionArtifact, expires_at: Option<DateTime<Utc>>) -> Self {
        let cookie_header = artifact.cookie_header();
        Self {
            artifact_value: artifact.value,
            expires_at,
            subject: artifact.subject,
            cookie_header,
            source_url: artifact.source_url,
        }
    }

    /// Expiry as an ISO-8601 string with a `Z` suffix.
    pub fn expires_at_iso(&self) -> Option<String> {
        self.expires_at
            .map(|t| t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
    }
}

fn serialize_expiry<S>(value: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(t) => serializer.serialize_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
        None => serializer.serialize_none(),
    }
}

fn deserialize_expiry<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| {
        DateTime::parse_from_rfc3339(&s)
            .map(|t| t.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    })
    .transpose()
}

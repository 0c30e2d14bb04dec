//! Per-invocation authentication configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Reasons an [`AuthConfig`] is rejected before any navigation begins.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// `entryUrl` missing or blank
    #[error("entryUrl is required")]
    MissingEntryUrl,

    /// `entryUrl` is not an absolute URL
    #[error("entryUrl is not a valid absolute URL: {0}")]
    InvalidEntryUrl(String),

    /// `timeoutMs` must be strictly positive
    #[error("timeoutMs must be greater than zero (got {0})")]
    NonPositiveTimeout(i64),

    /// `artifactCookieName` missing or blank
    #[error("artifactCookieName is required")]
    MissingArtifactName,

    /// `expiryFieldName` missing while expiry is required
    #[error("expiryFieldName is required when expiryRequired is true")]
    MissingExpiryField,

    /// No success pattern configured, so the flow could never resolve
    #[error("successUrlPatterns must contain at least one pattern")]
    MissingSuccessPatterns,

    /// The JSON payload could not be decoded at all
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

/// Result type alias using ConfigError.
pub type ConfigResult<T> = Result<T, ConfigError>;

fn default_expiry_required() -> bool {
    true
}

/// Configuration for a single authentication flow.
///
/// Supplied once per invocation and never mutated afterwards. Field names
/// follow the host scripting layer's camelCase convention on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthConfig {
    /// URL the web surface loads first.
    #[serde(default)]
    pub entry_url: String,
    /// URL patterns marking a page where the artifact may be present.
    #[serde(default)]
    pub success_url_patterns: Vec<String>,
    /// URL patterns marking a failed or cancelled login.
    #[serde(default)]
    pub failure_url_patterns: Vec<String>,
    /// Cookie carrying the session artifact.
    #[serde(default)]
    pub artifact_cookie_name: String,
    /// Cookie or header carrying the raw expiry timestamp.
    #[serde(default)]
    pub expiry_field_name: String,
    /// Overall flow timeout in milliseconds.
    #[serde(default)]
    pub timeout_ms: i64,
    /// Headers that must be present on the success page.
    #[serde(default)]
    pub required_header_names: Vec<String>,
    /// Cookie or header carrying the account identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_field_name: Option<String>,
    /// Extra cookies returned alongside the artifact in the cookie header.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub companion_cookie_names: Vec<String>,
    /// Whether a success page without an expiry value fails the flow.
    #[serde(default = "default_expiry_required")]
    pub expiry_required: bool,
}

impl AuthConfig {
    /// Create a config with the mandatory fields and empty pattern lists.
    pub fn new(
        entry_url: impl Into<String>,
        artifact_cookie_name: impl Into<String>,
        expiry_field_name: impl Into<String>,
        timeout_ms: i64,
    ) -> Self {
        Self {
            entry_url: entry_url.into(),
            success_url_patterns: Vec::new(),
            failure_url_patterns: Vec::new(),
            artifact_cookie_name: artifact_cookie_name.into(),
            expiry_field_name: expiry_field_name.into(),
            timeout_ms,
            required_header_names: Vec::new(),
            subject_field_name: None,
            companion_cookie_names: Vec::new(),
            expiry_required: true,
        }
    }

    pub fn with_success_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.success_url_patterns.push(pattern.into());
        self
    }

    pub fn with_failure_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.failure_url_patterns.push(pattern.into());
        self
    }

    pub fn with_required_header(mut self, name: impl Into<String>) -> Self {
        self.required_header_names.push(name.into());
        self
    }

    pub fn with_subject_field(mut self, name: impl Into<String>) -> Self {
        self.subject_field_name = Some(name.into());
        self
    }

    pub fn with_companion_cookie(mut self, name: impl Into<String>) -> Self {
        self.companion_cookie_names.push(name.into());
        self
    }

    pub fn with_expiry_required(mut self, required: bool) -> Self {
        self.expiry_required = required;
        self
    }

    /// Decode a config from the host's JSON payload.
    ///
    /// Decoding errors are reported as [`ConfigError::Malformed`]; semantic
    /// checks are left to [`AuthConfig::validate`].
    pub fn from_json(raw: &str) -> ConfigResult<Self> {
        serde_json::from_str(raw).map_err(|e| ConfigError::Malformed(e.to_string()))
    }

    /// Check every field needed before a flow may start.
    pub fn validate(&self) -> ConfigResult<()> {
        self.entry_url()?;
        if self.timeout_ms <= 0 {
            return Err(ConfigError::NonPositiveTimeout(self.timeout_ms));
        }
        if self.artifact_cookie_name.trim().is_empty() {
            return Err(ConfigError::MissingArtifactName);
        }
        if self.expiry_required && self.expiry_field_name.trim().is_empty() {
            return Err(ConfigError::MissingExpiryField);
        }
        if self
            .success_url_patterns
            .iter()
            .all(|pattern| pattern.trim().is_empty())
        {
            return Err(ConfigError::MissingSuccessPatterns);
        }
        Ok(())
    }

    /// The parsed entry URL.
    pub fn entry_url(&self) -> ConfigResult<Url> {
        let raw = self.entry_url.trim();
        if raw.is_empty() {
            return Err(ConfigError::MissingEntryUrl);
        }
        Url::parse(raw).map_err(|e| ConfigError::InvalidEntryUrl(format!("{raw}: {e}")))
    }

    /// The flow timeout. Non-positive values clamp to zero; call
    /// [`AuthConfig::validate`] first.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms.max(0) as u64)
    }
}

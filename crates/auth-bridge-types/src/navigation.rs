//! Navigation events reported by a web surface.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One observation of the embedded web surface.
///
/// Events for a single invocation arrive strictly in the order the
/// underlying navigation happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NavigationEvent {
    /// Navigation to `url` began.
    Started { url: String },
    /// The surface followed a redirect to `url`.
    Redirected { url: String },
    /// `url` finished loading; cookies visible to it and the response headers.
    Loaded {
        url: String,
        #[serde(default)]
        cookies: BTreeMap<String, String>,
        #[serde(default)]
        headers: BTreeMap<String, String>,
    },
    /// `url` failed to load.
    LoadFailed { url: String, error_kind: String },
}

impl NavigationEvent {
    pub fn started(url: impl Into<String>) -> Self {
        Self::Started { url: url.into() }
    }

    pub fn redirected(url: impl Into<String>) -> Self {
        Self::Redirected { url: url.into() }
    }

    pub fn loaded<C, H>(url: impl Into<String>, cookies: C, headers: H) -> Self
    where
        C: IntoIterator<Item = (String, String)>,
        H: IntoIterator<Item = (String, String)>,
    {
        Self::Loaded {
            url: url.into(),
            cookies: cookies.into_iter().collect(),
            headers: headers.into_iter().collect(),
        }
    }

    pub fn load_failed(url: impl Into<String>, error_kind: impl Into<String>) -> Self {
        Self::LoadFailed {
            url: url.into(),
            error_kind: error_kind.into(),
        }
    }

    /// The URL this event refers to.
    pub fn url(&self) -> &str {
        match self {
            Self::Started { url }
            | Self::Redirected { url }
            | Self::Loaded { url, .. }
            | Self::LoadFailed { url, .. } => url,
        }
    }

    /// Short name for logging.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::Redirected { .. } => "redirected",
            Self::Loaded { .. } => "loaded",
            Self::LoadFailed { .. } => "load_failed",
        }
    }
}

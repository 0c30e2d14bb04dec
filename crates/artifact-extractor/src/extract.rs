//! Artifact extraction from a single navigation event.

use crate::{matches_any, parse_cookie_header};
use auth_bridge_types::{AuthConfig, NavigationEvent, SessionArtifact};
use std::collections::BTreeMap;
use tracing::trace;

/// Whether the event's URL matches one of the configured failure patterns.
///
/// Applies to every event kind, so a redirect to an error page is caught
/// before the page ever loads.
pub fn is_failure(event: &NavigationEvent, config: &AuthConfig) -> bool {
    matches_any(event.url(), &config.failure_url_patterns)
}

/// Try to read the session artifact from `event`.
///
/// Returns `None`, meaning the flow should keep waiting, unless all of these
/// hold:
/// - the event is [`NavigationEvent::Loaded`]
/// - its URL matches a success pattern
/// - the artifact cookie is present and non-empty
/// - every required header is present
///
/// The expiry value is captured raw when present; whether it is mandatory
/// and whether it parses is decided by the caller.
pub fn try_extract(event: &NavigationEvent, config: &AuthConfig) -> Option<SessionArtifact> {
    let NavigationEvent::Loaded {
        url,
        cookies,
        headers,
    } = event
    else {
        return None;
    };

    if !matches_any(url, &config.success_url_patterns) {
        return None;
    }

    let fields = PageFields::new(cookies, headers);

    let Some(value) = fields
        .lookup(&config.artifact_cookie_name)
        .filter(|v| !v.is_empty())
    else {
        trace!(url = %url, "Success page without artifact yet");
        return None;
    };

    if let Some(missing) = config
        .required_header_names
        .iter()
        .find(|name| fields.header(name).is_none())
    {
        trace!(url = %url, header = %missing, "Success page missing required header");
        return None;
    }

    let raw_expiry = if config.expiry_field_name.trim().is_empty() {
        None
    } else {
        fields.lookup(&config.expiry_field_name)
    };

    let subject = config
        .subject_field_name
        .as_deref()
        .and_then(|name| fields.lookup(name))
        .filter(|s| !s.is_empty());

    let companions = config
        .companion_cookie_names
        .iter()
        .filter(|name| **name != config.artifact_cookie_name)
        .filter_map(|name| fields.cookie(name).map(|v| (name.clone(), v)))
        .collect();

    Some(SessionArtifact {
        cookie_name: config.artifact_cookie_name.clone(),
        value,
        raw_expiry,
        source_url: url.clone(),
        subject,
        companions,
    })
}

/// Cookie and header view of one loaded page.
struct PageFields<'a> {
    cookies: &'a BTreeMap<String, String>,
    headers: &'a BTreeMap<String, String>,
    header_cookies: Vec<(String, String)>,
}

impl<'a> PageFields<'a> {
    fn new(
        cookies: &'a BTreeMap<String, String>,
        headers: &'a BTreeMap<String, String>,
    ) -> Self {
        let header_cookies = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("cookie"))
            .map(|(_, value)| parse_cookie_header(value))
            .unwrap_or_default();
        Self {
            cookies,
            headers,
            header_cookies,
        }
    }

    /// Cookie names are case-sensitive.
    fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned().or_else(|| {
            self.header_cookies
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, v)| v.clone())
        })
    }

    /// Header names are not.
    fn header(&self, name: &str) -> Option<String> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.clone())
    }

    fn lookup(&self, name: &str) -> Option<String> {
        self.cookie(name).or_else(|| self.header(name))
    }
}

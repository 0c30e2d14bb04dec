//! Per-surface cookie jar.
//!
//! Each web surface keeps its own jar so two flows can never observe each
//! other's session cookies. Cookies are keyed by `(domain, path, name)` and
//! follow the usual Set-Cookie rules: a past `Expires` or a non-positive
//! `Max-Age` deletes the cookie instead of storing it.

use crate::{SurfaceError, SurfaceResult};
use chrono::{DateTime, TimeDelta, Utc};
use expiry_parser::parse_expiry;
use std::collections::BTreeMap;
use tracing::debug;
use url::Url;

/// A cookie as held by the jar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,
    /// Lower-case domain without a leading dot.
    pub domain: String,
    /// True when no `Domain` attribute was given; only the exact host matches.
    pub host_only: bool,
    pub path: String,
    pub expires: Option<DateTime<Utc>>,
    pub secure: bool,
    pub http_only: bool,
}

impl StoredCookie {
    fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires.is_some_and(|expires| expires <= now)
    }

    fn matches_host(&self, host: &str) -> bool {
        domain_matches(host, &self.domain, self.host_only)
    }

    fn matches_path(&self, request_path: &str) -> bool {
        path_matches(request_path, &self.path)
    }
}

/// Cookie store owned by one surface.
#[derive(Debug, Clone, Default)]
pub struct CookieJar {
    cookies: Vec<StoredCookie>,
}

impl CookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Apply a Set-Cookie value received while loading `url`.
    pub fn set(&mut self, url: &Url, set_cookie: &str) -> SurfaceResult<()> {
        self.set_at(url, set_cookie, Utc::now())
    }

    /// [`CookieJar::set`] with an explicit clock.
    pub fn set_at(&mut self, url: &Url, set_cookie: &str, now: DateTime<Utc>) -> SurfaceResult<()> {
        let host = url
            .host_str()
            .ok_or_else(|| SurfaceError::InvalidCookie(format!("URL has no host: {url}")))?
            .to_ascii_lowercase();
        let cookie = parse_set_cookie(&host, url.path(), set_cookie, now)?;

        self.cookies.retain(|existing| {
            !(existing.name == cookie.name
                && existing.domain == cookie.domain
                && existing.path == cookie.path)
        });

        if cookie.is_expired(now) {
            debug!(name = %cookie.name, domain = %cookie.domain, "Cookie expired on set, removed");
            return Ok(());
        }

        self.cookies.push(cookie);
        Ok(())
    }

    /// Cookies visible to `url`, by name.
    pub fn get(&self, url: &Url) -> BTreeMap<String, String> {
        self.get_at(url, Utc::now())
    }

    /// [`CookieJar::get`] with an explicit clock.
    ///
    /// When two visible cookies share a name, the one with the longer path wins.
    pub fn get_at(&self, url: &Url, now: DateTime<Utc>) -> BTreeMap<String, String> {
        let Some(host) = url.host_str().map(str::to_ascii_lowercase) else {
            return BTreeMap::new();
        };
        let secure_request = url.scheme() == "https";

        let mut visible: Vec<&StoredCookie> = self
            .cookies
            .iter()
            .filter(|c| !c.is_expired(now))
            .filter(|c| c.matches_host(&host) && c.matches_path(url.path()))
            .filter(|c| secure_request || !c.secure)
            .collect();
        visible.sort_by_key(|c| c.path.len());

        visible
            .into_iter()
            .map(|c| (c.name.clone(), c.value.clone()))
            .collect()
    }

    /// Drop everything.
    pub fn clear(&mut self) {
        self.cookies.clear();
    }
}

fn parse_set_cookie(
    host: &str,
    request_path: &str,
    raw: &str,
    now: DateTime<Utc>,
) -> SurfaceResult<StoredCookie> {
    let mut parts = raw.split(';');
    let pair = parts.next().unwrap_or_default();
    let (name, value) = pair
        .split_once('=')
        .ok_or_else(|| SurfaceError::InvalidCookie("missing '=' in name/value pair".to_string()))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(SurfaceError::InvalidCookie("empty cookie name".to_string()));
    }

    let mut cookie = StoredCookie {
        name: name.to_string(),
        value: value.trim().to_string(),
        domain: host.to_string(),
        host_only: true,
        path: default_path(request_path),
        expires: None,
        secure: false,
        http_only: false,
    };
    let mut max_age: Option<i64> = None;

    for attribute in parts {
        let (key, attr_value) = match attribute.split_once('=') {
            Some((k, v)) => (k.trim(), v.trim()),
            None => (attribute.trim(), ""),
        };

        match key.to_ascii_lowercase().as_str() {
            "domain" if !attr_value.is_empty() => {
                let domain = attr_value.trim_start_matches('.').to_ascii_lowercase();
                if !domain_matches(host, &domain, false) {
                    return Err(SurfaceError::InvalidCookie(format!(
                        "domain {domain} does not match host {host}"
                    )));
                }
                cookie.domain = domain;
                cookie.host_only = false;
            }
            "path" if attr_value.starts_with('/') => {
                cookie.path = attr_value.to_string();
            }
            "expires" => {
                // Unparseable dates leave the cookie as a session cookie.
                cookie.expires = parse_expiry(attr_value).ok();
            }
            "max-age" => {
                max_age = attr_value.parse().ok();
            }
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            _ => {}
        }
    }

    if let Some(seconds) = max_age {
        cookie.expires = Some(max_age_expiry(now, seconds));
    }

    Ok(cookie)
}

/// Expiry for a `Max-Age` attribute. Lifetimes past the representable
/// range saturate instead of overflowing.
fn max_age_expiry(now: DateTime<Utc>, seconds: i64) -> DateTime<Utc> {
    if seconds <= 0 {
        return DateTime::<Utc>::UNIX_EPOCH;
    }
    TimeDelta::try_seconds(seconds)
        .and_then(|lifetime| now.checked_add_signed(lifetime))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}

fn domain_matches(host: &str, domain: &str, host_only: bool) -> bool {
    if host == domain {
        return true;
    }
    !host_only && host.len() > domain.len() && host.ends_with(domain) && {
        let boundary = host.len() - domain.len() - 1;
        host.as_bytes()[boundary] == b'.'
    }
}

fn path_matches(request_path: &str, cookie_path: &str) -> bool {
    if request_path == cookie_path {
        return true;
    }
    request_path.starts_with(cookie_path)
        && (cookie_path.ends_with('/')
            || request_path.as_bytes().get(cookie_path.len()) == Some(&b'/'))
}

fn default_path(request_path: &str) -> String {
    match request_path.rfind('/') {
        Some(0) | None => "/".to_string(),
        Some(idx) => request_path[..idx].to_string(),
    }
}

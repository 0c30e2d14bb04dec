//! Session-expiry timestamp parsing.
//!
//! Identity providers disagree on how they spell an expiry: RFC 3339 with or
//! without fractional seconds, naive ISO-8601, HTTP cookie dates, or a bare
//! epoch-seconds number. [`parse_expiry`] tries a fixed list of formats in
//! priority order and returns the first match, normalized to UTC.
//!
//! Parsing is a pure function. There is no shared formatter instance, so
//! concurrent flows never interfere with each other.

mod error;
mod formats;

pub use error::{ExpiryParseError, ExpiryResult};
pub use formats::ExpiryFormat;

use chrono::{DateTime, Utc};

/// Parse a raw expiry string.
///
/// Empty or whitespace-only input is reported as [`ExpiryParseError::Empty`],
/// distinct from a value that is present but in no known format.
pub fn parse_expiry(raw: &str) -> ExpiryResult<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ExpiryParseError::Empty);
    }

    ExpiryFormat::PRIORITY
        .iter()
        .find_map(|format| format.parse(trimmed))
        .ok_or_else(|| ExpiryParseError::Unparseable(raw.to_string()))
}

/// Parser seam injected into the flow engine.
pub trait ExpiryParser: Send + Sync {
    fn parse(&self, raw: &str) -> ExpiryResult<DateTime<Utc>>;
}

/// The default parser, backed by [`parse_expiry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardExpiryParser;

impl ExpiryParser for StandardExpiryParser {
    fn parse(&self, raw: &str) -> ExpiryResult<DateTime<Utc>> {
        parse_expiry(raw)
    }
}

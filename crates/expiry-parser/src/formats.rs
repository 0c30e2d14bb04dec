//! The supported expiry formats, in parse priority order.

use chrono::{DateTime, FixedOffset, NaiveDateTime, SecondsFormat, Utc};
use std::borrow::Cow;

const NAIVE_ISO_T: &str = "%Y-%m-%dT%H:%M:%S%.f";
const NAIVE_ISO_SPACE: &str = "%Y-%m-%d %H:%M:%S%.f";
const ISO_NUMERIC_OFFSET: &str = "%Y-%m-%dT%H:%M:%S%.f%z";
const HTTP_DATE: &str = "%a, %d %b %Y %H:%M:%S GMT";
const COOKIE_DATE: &str = "%a, %d-%b-%Y %H:%M:%S GMT";

/// A timestamp format identity providers are known to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryFormat {
    /// `2025-01-01T00:00:00Z`, `2025-01-01T00:00:00.123+02:00`
    Rfc3339,
    /// `2025-01-01T00:00:00` (interpreted as UTC)
    NaiveIso8601,
    /// `Wed, 01 Jan 2025 00:00:00 GMT`
    HttpDate,
    /// `Wed, 01-Jan-2025 00:00:00 GMT`
    CookieDate,
    /// `1735689600` or `1735689600.5`
    EpochSeconds,
}

impl ExpiryFormat {
    /// Fixed order in which [`crate::parse_expiry`] tries formats.
    pub const PRIORITY: [ExpiryFormat; 5] = [
        ExpiryFormat::Rfc3339,
        ExpiryFormat::NaiveIso8601,
        ExpiryFormat::HttpDate,
        ExpiryFormat::CookieDate,
        ExpiryFormat::EpochSeconds,
    ];

    /// Try to parse `raw` (already trimmed) in this format.
    pub fn parse(&self, raw: &str) -> Option<DateTime<Utc>> {
        match self {
            ExpiryFormat::Rfc3339 => DateTime::parse_from_rfc3339(raw)
                .ok()
                .or_else(|| parse_iso_with_offset(raw))
                .map(|t| t.with_timezone(&Utc)),
            ExpiryFormat::NaiveIso8601 => NaiveDateTime::parse_from_str(raw, NAIVE_ISO_T)
                .or_else(|_| NaiveDateTime::parse_from_str(raw, NAIVE_ISO_SPACE))
                .ok()
                .map(|t| t.and_utc()),
            ExpiryFormat::HttpDate => NaiveDateTime::parse_from_str(raw, HTTP_DATE)
                .map(|t| t.and_utc())
                .or_else(|_| DateTime::parse_from_rfc2822(raw).map(|t| t.with_timezone(&Utc)))
                .ok(),
            ExpiryFormat::CookieDate => NaiveDateTime::parse_from_str(raw, COOKIE_DATE)
                .ok()
                .map(|t| t.and_utc()),
            ExpiryFormat::EpochSeconds => parse_epoch_seconds(raw),
        }
    }

    /// Render `t` in this format.
    ///
    /// `HttpDate` and `CookieDate` carry whole seconds only. Years outside
    /// `0..=9999` are written with an explicit sign (`+10000`, `-0001`), which
    /// [`ExpiryFormat::parse`] reads back.
    pub fn format(&self, t: &DateTime<Utc>) -> String {
        match self {
            ExpiryFormat::Rfc3339 => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ExpiryFormat::NaiveIso8601 => t.format(NAIVE_ISO_T).to_string(),
            ExpiryFormat::HttpDate => t.format(HTTP_DATE).to_string(),
            ExpiryFormat::CookieDate => t.format(COOKIE_DATE).to_string(),
            ExpiryFormat::EpochSeconds => format_epoch_seconds(t),
        }
    }
}

/// ISO-8601 with a `Z` or numeric offset, including signed years that
/// `parse_from_rfc3339` rejects.
fn parse_iso_with_offset(raw: &str) -> Option<DateTime<FixedOffset>> {
    let numeric = match raw.strip_suffix(['Z', 'z']) {
        Some(local) => Cow::Owned(format!("{local}+00:00")),
        None => Cow::Borrowed(raw),
    };
    DateTime::parse_from_str(&numeric, ISO_NUMERIC_OFFSET).ok()
}

fn parse_epoch_seconds(raw: &str) -> Option<DateTime<Utc>> {
    let (negative, unsigned) = match raw.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, raw.strip_prefix('+').unwrap_or(raw)),
    };
    let (whole, fraction) = unsigned.split_once('.').unwrap_or((unsigned, ""));

    if whole.is_empty()
        || fraction.len() > 9
        || !whole.bytes().all(|b| b.is_ascii_digit())
        || !fraction.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    let mut secs: i64 = whole.parse().ok()?;
    let mut nanos: u32 = if fraction.is_empty() {
        0
    } else {
        format!("{fraction:0<9}").parse().ok()?
    };

    if negative {
        secs = -secs;
        if nanos > 0 {
            secs -= 1;
            nanos = 1_000_000_000 - nanos;
        }
    }

    DateTime::from_timestamp(secs, nanos)
}

fn format_epoch_seconds(t: &DateTime<Utc>) -> String {
    let secs = t.timestamp();
    let nanos = t.timestamp_subsec_nanos();
    if nanos == 0 {
        secs.to_string()
    } else if secs >= 0 {
        format!("{secs}.{nanos:09}")
    } else {
        // timestamp() floors, so -1.5s is (-2, 500ms)
        format!("-{}.{:09}", (secs + 1).unsigned_abs(), 1_000_000_000 - nanos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_expiry;
    use chrono::TimeZone;

    fn samples() -> Vec<DateTime<Utc>> {
        vec![
            Utc.with_ymd_and_hms(1970, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(1999, 12, 31, 23, 59, 59).unwrap(),
            Utc.with_ymd_and_hms(2038, 1, 19, 3, 14, 8).unwrap(),
            Utc.with_ymd_and_hms(1965, 7, 4, 12, 30, 0).unwrap(),
        ]
    }

    fn with_nanos(t: DateTime<Utc>, nanos: u32) -> DateTime<Utc> {
        DateTime::from_timestamp(t.timestamp(), nanos).unwrap()
    }

    #[test]
    fn test_every_format_round_trips_whole_seconds() {
        for format in ExpiryFormat::PRIORITY {
            for t in samples() {
                let rendered = format.format(&t);
                assert_eq!(
                    parse_expiry(&rendered),
                    Ok(t),
                    "{format:?} failed to round-trip {rendered}"
                );
            }
        }
    }

    #[test]
    fn test_every_format_round_trips_boundary_years() {
        for format in ExpiryFormat::PRIORITY {
            for year in [-1, 0, 1, 99, 500, 1899, 9999, 10000, 200000] {
                let t = Utc.with_ymd_and_hms(year, 6, 15, 12, 0, 0).unwrap();
                let rendered = format.format(&t);
                assert_eq!(
                    parse_expiry(&rendered),
                    Ok(t),
                    "{format:?} failed to round-trip {rendered}"
                );
            }
        }
    }

    #[test]
    fn test_signed_years_render_with_sign() {
        let far = Utc.with_ymd_and_hms(10000, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(ExpiryFormat::Rfc3339.format(&far), "+10000-06-15T12:00:00Z");
        assert_eq!(
            ExpiryFormat::Rfc3339.parse("+10000-06-15T14:00:00+02:00"),
            Some(far)
        );

        let bce = Utc.with_ymd_and_hms(-1, 6, 15, 12, 0, 0).unwrap();
        assert_eq!(ExpiryFormat::Rfc3339.parse("-0001-06-15T12:00:00Z"), Some(bce));
    }

    #[test]
    fn test_http_date_still_accepts_numeric_zone() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(
            ExpiryFormat::HttpDate.parse("Wed, 1 Jan 2025 00:00:00 +0000"),
            Some(t)
        );
    }

    #[test]
    fn test_sub_second_formats_round_trip_fractions() {
        let precise = [
            ExpiryFormat::Rfc3339,
            ExpiryFormat::NaiveIso8601,
            ExpiryFormat::EpochSeconds,
        ];
        for format in precise {
            for t in samples() {
                for nanos in [1, 500_000_000, 123_456_789, 999_999_999] {
                    let t = with_nanos(t, nanos);
                    let rendered = format.format(&t);
                    assert_eq!(
                        parse_expiry(&rendered),
                        Ok(t),
                        "{format:?} failed to round-trip {rendered}"
                    );
                }
            }
        }
    }

    #[test]
    fn test_each_format_only_parses_its_own_shape() {
        let t = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let http = ExpiryFormat::HttpDate.format(&t);
        assert_eq!(http, "Wed, 01 Jan 2025 00:00:00 GMT");
        assert!(ExpiryFormat::Rfc3339.parse(&http).is_none());
        assert!(ExpiryFormat::EpochSeconds.parse(&http).is_none());
        assert!(ExpiryFormat::CookieDate.parse(&http).is_none());
    }

    #[test]
    fn test_epoch_rejects_too_many_fraction_digits() {
        assert!(parse_epoch_seconds("1.1234567891").is_none());
        assert!(parse_epoch_seconds("-").is_none());
        assert!(parse_epoch_seconds(".5").is_none());
    }
}

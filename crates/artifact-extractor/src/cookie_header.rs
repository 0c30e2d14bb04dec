//! `Cookie` request header parsing.

/// Split `a=b; c=d` into name/value pairs, in order.
///
/// Segments without `=` or with an empty name are skipped. Values keep any
/// inner `=` characters.
pub fn parse_cookie_header(raw: &str) -> Vec<(String, String)> {
    raw.split(';')
        .filter_map(|segment| {
            let (name, value) = segment.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some((name.to_string(), value.trim().to_string()))
        })
        .collect()
}

//! URL pattern matching for success and failure markers.

use url::Url;

/// Whether `url` matches `pattern`.
///
/// A pattern containing `*` is a glob over the whole URL, where `*` matches
/// any run of characters. Any other pattern matches the URL itself, or any
/// URL that continues it with a path, query or fragment. Both sides are
/// normalized through [`Url`] when they parse, so scheme and host case and
/// default ports do not matter.
pub fn matches_pattern(url: &str, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    let normalized_url = normalize(url);
    if pattern.contains('*') {
        return glob_matches(&normalized_url, pattern) || glob_matches(url, pattern);
    }

    let normalized_pattern = normalize(pattern);
    prefix_matches(&normalized_url, &normalized_pattern)
}

/// Whether `url` matches at least one of `patterns`.
pub fn matches_any<S: AsRef<str>>(url: &str, patterns: &[S]) -> bool {
    patterns.iter().any(|p| matches_pattern(url, p.as_ref()))
}

fn normalize(raw: &str) -> String {
    match Url::parse(raw) {
        Ok(url) => url.to_string(),
        Err(_) => raw.to_string(),
    }
}

fn prefix_matches(url: &str, pattern: &str) -> bool {
    let Some(rest) = url.strip_prefix(pattern) else {
        return false;
    };
    rest.is_empty() || pattern.ends_with('/') || rest.starts_with(['/', '?', '#'])
}

fn glob_matches(text: &str, pattern: &str) -> bool {
    let text = text.as_bytes();
    let pattern = pattern.as_bytes();
    let (mut t, mut p) = (0, 0);
    // Position of the last `*` seen and the text index it is currently
    // absorbing up to.
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && pattern[p] == b'*' {
            backtrack = Some((p, t));
            p += 1;
        } else if p < pattern.len() && pattern[p] == text[t] {
            p += 1;
            t += 1;
        } else if let Some((star, absorbed)) = backtrack {
            p = star + 1;
            t = absorbed + 1;
            backtrack = Some((star, absorbed + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|&b| b == b'*')
}

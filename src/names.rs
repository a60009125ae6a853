//! Canonical form of link names and the reserved path segments they must avoid.

use std::borrow::Cow;

use crate::error::NameError;

pub const MAX_NAME_LEN: usize = 100;

/// First path segments owned by the HTTP surface.
pub const BANNED_SEGMENTS: &[&str] = &[
    "edit",
    "admin",
    "api",
    "links",
    "s",
    "healthz",
    "version",
    "favicon.ico",
];

/// Canonicalize a raw name. Lowercases, trims surrounding whitespace and
/// slashes, and collapses whitespace and slash runs.
///
/// `normalize(normalize(x)) == normalize(x)` for every accepted input.
pub fn normalize(raw: &str) -> Result<String, NameError> {
    let lower = raw.to_lowercase();
    let trimmed = lower.trim_matches(|c: char| c.is_whitespace() || c == '/');

    let mut out = String::with_capacity(trimmed.len());
    let mut last: Option<char> = None;
    for c in trimmed.chars() {
        let c = if c.is_whitespace() { ' ' } else { c };
        if (c == ' ' || c == '/') && last == Some(c) {
            continue;
        }
        out.push(c);
        last = Some(c);
    }

    if out.is_empty() {
        return Err(NameError::Empty);
    }
    if out.chars().count() > MAX_NAME_LEN {
        return Err(NameError::TooLong { max: MAX_NAME_LEN });
    }
    if let Some(c) = out
        .chars()
        .find(|c| c.is_control() || matches!(c, '?' | '#' | '%'))
    {
        return Err(NameError::InvalidChar(c));
    }
    if is_banned(&out) {
        return Err(NameError::Banned(out));
    }
    Ok(out)
}

/// True when the first `/` segment of `name` is reserved.
pub fn is_banned(name: &str) -> bool {
    let first = name
        .trim_start_matches('/')
        .split('/')
        .next()
        .unwrap_or_default()
        .trim();
    BANNED_SEGMENTS
        .iter()
        .any(|seg| seg.eq_ignore_ascii_case(first))
}

/// Strip `prefix` from a request path, percent-decode the rest and drop
/// trailing slashes. Returns an empty string when nothing follows the prefix.
pub fn parse_name(prefix: &str, path: &str) -> String {
    let rest = path.strip_prefix(prefix).unwrap_or("");
    let decoded = urlencoding::decode(rest).unwrap_or(Cow::Borrowed(rest));
    decoded.trim_end_matches('/').to_string()
}

//! Log sanitization for deployer traffic
//!
//! Deployment payloads carry the SSH password and install logs can run to
//! megabytes. Anything that reaches the log goes through [`sanitize_for_log`]:
//! password values are masked, then the text is cut to a prefix.

use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

/// Maximum number of bytes kept from a logged body.
const TRUNCATE_LIMIT: usize = 256;

const MASK: &str = "******";

/// A JSON `"password": "..."` member, escaped quotes included.
#[allow(clippy::expect_used)]
static PASSWORD_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#""password"\s*:\s*"(?:[^"\\]|\\.)*""#).expect("password pattern is valid")
});

/// Largest char boundary not after `index`.
fn floor_char_boundary(s: &str, index: usize) -> usize {
    if index >= s.len() {
        return s.len();
    }
    (0..=index).rev().find(|&i| s.is_char_boundary(i)).unwrap_or(0)
}

/// Replace every JSON password value with a fixed mask.
pub fn mask_passwords(s: &str) -> Cow<'_, str> {
    PASSWORD_RE.replace_all(s, format!(r#""password":"{MASK}""#))
}

/// Keep at most `TRUNCATE_LIMIT` bytes, noting the full length.
pub fn truncate_for_log(s: &str) -> String {
    if s.len() <= TRUNCATE_LIMIT {
        return s.to_string();
    }
    format!(
        "{}... [truncated, total {} bytes]",
        &s[..floor_char_boundary(s, TRUNCATE_LIMIT)],
        s.len()
    )
}

/// Mask secrets, then truncate.
pub fn sanitize_for_log(s: &str) -> String {
    truncate_for_log(&mask_passwords(s))
}

//! Field syntax checks shared by the topology engine and the node config form.

use std::sync::LazyLock;

use regex::Regex;

/// IPv4 dotted quad, each octet 0-255 without leading zeros.
#[allow(clippy::expect_used)]
static IPV4_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((\d|[1-9]\d|1\d\d|2[0-4]\d|25[0-5])\.){3}(\d|[1-9]\d|1\d\d|2[0-4]\d|25[0-5])$")
        .expect("IPv4 pattern is valid")
});

/// Starts with a letter, ends with a letter or digit, 2-32 characters.
#[allow(clippy::expect_used)]
static ZONE_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[a-zA-Z][a-zA-Z0-9_]{0,30}[a-zA-Z0-9]$").expect("zone name pattern is valid")
});

/// Letters, digits and dots, at most 20 characters.
#[allow(clippy::expect_used)]
static USER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9.]{1,20}$").expect("user pattern is valid"));

/// Whether `value` is an IPv4 dotted-quad address. Surrounding whitespace is ignored.
pub fn is_ipv4(value: &str) -> bool {
    IPV4_RE.is_match(value.trim())
}

/// Whether `value` is a valid zone name.
pub fn is_valid_zone_name(value: &str) -> bool {
    ZONE_NAME_RE.is_match(value)
}

/// Whether `value` is a valid deploy user name.
pub fn is_valid_user(value: &str) -> bool {
    USER_RE.is_match(value)
}

/// Absolute path without whitespace.
pub fn is_valid_home_path(value: &str) -> bool {
    value.starts_with('/') && !value.chars().any(char::is_whitespace)
}

//! Utility modules.

/// Field syntax checks (IPv4, zone name, user, path).
pub mod validation;

pub use validation::{is_ipv4, is_valid_home_path, is_valid_user, is_valid_zone_name};

/// Default software home path for a deploy user.
///
/// `root` installs under `/root`, everyone else under `/home/{user}`.
pub fn default_home_path(user: &str) -> String {
    if user == "root" {
        "/root".to_string()
    } else {
        format!("/home/{user}")
    }
}

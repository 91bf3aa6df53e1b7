//! Utility modules.

/// Log sanitization utilities to keep large payloads out of logs.
pub mod log_sanitizer;

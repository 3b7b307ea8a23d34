//! HTTP cache control module
//!
//! `ETag` generation from file metadata and conditional request handling.

use std::time::{SystemTime, UNIX_EPOCH};

/// Build a strong `ETag` from a file's size and modification time
///
/// Returns a quoted tag, e.g. `"1a4-65f0c2b1"`.
pub fn generate_etag(len: u64, modified: Option<SystemTime>) -> String {
    let secs = modified
        .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
        .map_or(0, |d| d.as_secs());
    format!("\"{len:x}-{secs:x}\"")
}

/// Check a client's `If-None-Match` header against the server `ETag`
///
/// Accepts a single tag, a comma-separated list, weak tags, or `*`.
pub fn check_etag_match(if_none_match: Option<&str>, etag: &str) -> bool {
    if_none_match.is_some_and(|client_etag| {
        client_etag.split(',').any(|e| {
            let e = e.trim();
            e == "*" || e.strip_prefix("W/").unwrap_or(e) == etag
        })
    })
}

/// Cache-Control policy for a served file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with max-age in seconds
    Public(u32),
    /// Cache but revalidate on every use
    Revalidate,
}

impl CachePolicy {
    /// Prerendered pages change with every deploy; other assets may be cached.
    pub fn for_content_type(content_type: &str) -> Self {
        if content_type.starts_with("text/html") {
            Self::Revalidate
        } else {
            Self::default()
        }
    }

    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::Revalidate => "public, max-age=0, must-revalidate".to_string(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(3600)
    }
}

//! HTTP cache control module
//!
//! Provides `Cache-Control` policies and `Last-Modified` date formatting.

use chrono::{DateTime, Utc};

/// Cache control policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CachePolicy {
    /// Public cache with specified max-age (seconds)
    Public(u64),
    /// No store (dynamic responses such as statistics)
    NoStore,
}

impl CachePolicy {
    /// Convert to Cache-Control header value
    pub fn to_header_value(self) -> String {
        match self {
            Self::Public(max_age) => format!("public, max-age={max_age}"),
            Self::NoStore => "no-store".to_string(),
        }
    }
}

impl Default for CachePolicy {
    fn default() -> Self {
        Self::Public(3600) // 1 hour
    }
}

/// Format a timestamp as an HTTP date (IMF-fixdate)
///
/// e.g. `Sun, 06 Nov 1994 08:49:37 GMT`
pub fn format_http_date(time: &DateTime<Utc>) -> String {
    time.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

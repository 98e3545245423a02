// Configuration types module
// Defines all configuration-related data structures

use serde::Deserialize;

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub media: MediaConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub stream: StreamConfig,
    pub performance: PerformanceConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Media library configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MediaConfig {
    /// Root directory of tracks and static assets
    pub dir: String,
}

/// File metadata cache configuration
#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    /// Seconds a cached entry stays valid
    pub ttl_secs: u64,
    /// Maximum number of cached paths
    pub max_entries: u64,
}

/// HTTP configuration
#[derive(Debug, Deserialize, Clone)]
pub struct HttpConfig {
    /// `max-age` advertised for track responses
    pub cache_max_age: u64,
    pub enable_cors: bool,
}

/// Stream transport configuration
#[derive(Debug, Deserialize, Clone)]
pub struct StreamConfig {
    /// Upper bound of a single read, in bytes
    pub chunk_size: usize,
}

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Seconds allowed for a client to send request headers
    pub header_read_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub access_log: bool,
    /// Access log format (combined, common, json, or custom pattern)
    #[serde(default = "default_access_log_format")]
    pub access_log_format: String,
    /// Access log file path (optional, stdout if not set)
    #[serde(default)]
    pub access_log_file: Option<String>,
    /// Error log file path (optional, stderr if not set)
    #[serde(default)]
    pub error_log_file: Option<String>,
}

#[allow(clippy::missing_const_for_fn)]
fn default_access_log_format() -> String {
    "combined".to_string()
}

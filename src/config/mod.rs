// Configuration module entry point
// Loads layered configuration and builds the shared application state

mod state;
mod types;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

// Re-export public types
pub use state::AppState;
pub use types::Config;

type Builder = config::ConfigBuilder<config::builder::DefaultState>;

impl Config {
    /// Load configuration from specified file path (without extension)
    ///
    /// Sources, lowest priority first: built-in defaults, the config file
    /// (optional), `MEDIA_*` environment variables (`__` separates sections,
    /// e.g. `MEDIA_CACHE__TTL_SECS`), then `PORT` and `MUSIC_DIR`.
    pub fn load_from(config_path: &str) -> Result<Self, config::ConfigError> {
        let settings = Self::with_defaults(config::Config::builder())?
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("MEDIA")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_override_option("server.port", std::env::var("PORT").ok())?
            .set_override_option("media.dir", std::env::var("MUSIC_DIR").ok())?
            .build()?;

        settings.try_deserialize()
    }

    /// Configuration made of built-in defaults only
    pub fn defaults() -> Result<Self, config::ConfigError> {
        Self::with_defaults(config::Config::builder())?
            .build()?
            .try_deserialize()
    }

    fn with_defaults(builder: Builder) -> Result<Builder, config::ConfigError> {
        builder
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("media.dir", "music")?
            .set_default("cache.ttl_secs", 3600)?
            .set_default("cache.max_entries", 100)?
            .set_default("http.cache_max_age", 3600)?
            .set_default("http.enable_cors", false)?
            .set_default(
                "stream.chunk_size",
                crate::media::stream::DEFAULT_CHUNK_SIZE as u64,
            )?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.header_read_timeout", 30)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, String> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| format!("Invalid address: {e}"))
    }

    pub fn media_root(&self) -> PathBuf {
        PathBuf::from(&self.media.dir)
    }

    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }
}

// Configuration types module
// Defines all configuration-related data structures

use serde::{Deserialize, Serialize};

/// Main configuration structure
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub performance: PerformanceConfig,
    pub site: SiteConfig,
}

/// Server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
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

/// Performance configuration
#[derive(Debug, Deserialize, Clone)]
pub struct PerformanceConfig {
    pub keep_alive: bool,
    /// Whole-connection timeout in seconds, 0 disables it
    pub connection_timeout: u64,
    pub max_connections: Option<u64>,
}

/// Content served by the auxiliary routes
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    /// HTML file served on `GET /forms/post`
    pub forms_post_file: String,
    /// Reported as `environment` by the health check
    pub environment: String,
}

/// Values taken from well-known process environment variables
///
/// Kept separate from the `SERVER_*` layer so tests can inject them
/// without touching the real environment.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    /// `PORT`
    pub port: Option<String>,
    /// `NODE_ENV`
    pub environment: Option<String>,
}

impl EnvOverrides {
    pub fn from_env() -> Self {
        Self {
            port: std::env::var("PORT").ok(),
            environment: std::env::var("NODE_ENV").ok(),
        }
    }
}


// Configuration module entry point
// Layers defaults, an optional config file, SERVER_* variables and the
// PORT / NODE_ENV conventions into one `Config`

mod state;
mod types;

use std::fmt;
use std::net::SocketAddr;

// Re-export public types
pub use state::AppState;
pub use types::{
    Config, EnvOverrides, LoggingConfig, PerformanceConfig, ServerConfig, SiteConfig,
};

/// Config file used when `MIRROR_CONFIG` is not set (extension is optional)
pub const DEFAULT_CONFIG_PATH: &str = "config";

/// Startup configuration errors
#[derive(Debug)]
pub enum ConfigLoadError {
    /// Layered sources could not be merged or deserialized
    Source(config::ConfigError),
    /// Port override from the command line is not a valid port number
    InvalidPort(String),
    /// host:port does not form a socket address
    InvalidAddress(String),
}

impl fmt::Display for ConfigLoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source(e) => write!(f, "Configuration error: {e}"),
            Self::InvalidPort(value) => write!(f, "Invalid port argument: '{value}'"),
            Self::InvalidAddress(value) => write!(f, "Invalid address: {value}"),
        }
    }
}

impl std::error::Error for ConfigLoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Source(e) => Some(e),
            _ => None,
        }
    }
}

impl From<config::ConfigError> for ConfigLoadError {
    fn from(e: config::ConfigError) -> Self {
        Self::Source(e)
    }
}

impl Config {
    /// Load configuration from the file named by `MIRROR_CONFIG` (or
    /// `config.*` in the working directory) and the process environment
    pub fn load() -> Result<Self, ConfigLoadError> {
        let path =
            std::env::var("MIRROR_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        Self::load_with(&path, &EnvOverrides::from_env())
    }

    /// Load configuration from the given file path with explicit
    /// `PORT` / `NODE_ENV` values
    pub fn load_with(config_path: &str, env: &EnvOverrides) -> Result<Self, ConfigLoadError> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(config_path).required(false))
            .add_source(
                config::Environment::with_prefix("SERVER")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3000)?
            .set_default("logging.level", "info")?
            .set_default("logging.access_log", true)?
            .set_default("logging.access_log_format", "combined")?
            .set_default("performance.keep_alive", true)?
            .set_default("performance.connection_timeout", 0)?
            .set_default("site.forms_post_file", "static/forms-post.html")?
            .set_default("site.environment", "development")?
            .set_override_option("server.port", non_blank(env.port.as_deref()))?
            .set_override_option("site.environment", non_blank(env.environment.as_deref()))?
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Apply the optional first command-line argument as the listen port
    pub fn with_port_arg(mut self, arg: Option<&str>) -> Result<Self, ConfigLoadError> {
        if let Some(value) = arg {
            self.server.port = value
                .trim()
                .parse()
                .map_err(|_| ConfigLoadError::InvalidPort(value.to_string()))?;
        }
        Ok(self)
    }

    pub fn get_socket_addr(&self) -> Result<SocketAddr, ConfigLoadError> {
        format!("{}:{}", self.server.host, self.server.port)
            .parse()
            .map_err(|e| {
                ConfigLoadError::InvalidAddress(format!(
                    "{}:{} ({e})",
                    self.server.host, self.server.port
                ))
            })
    }
}

/// Blank `PORT` / `NODE_ENV` values fall back to the defaults
fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(ToString::to_string)
}

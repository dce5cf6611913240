//! HTTP server configuration

use config::{Config, ConfigError, Environment};
use serde::Deserialize;

/// Server settings read once at startup
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Write logs to this file instead of stdout
    pub log_path: Option<String>,
}

impl ServerConfig {
    /// Load server settings from the environment
    ///
    /// # Environment Variables
    /// - `SERVER_HOST`: Bind address (default: `0.0.0.0`)
    /// - `SERVER_PORT`: Bind port (default: 3000)
    /// - `LOG_PATH`: Optional log file
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 3000)?
            .add_source(Environment::with_prefix("SERVER").try_parsing(true))
            .set_override_option("log_path", std::env::var("LOG_PATH").ok())?
            .build()?
            .try_deserialize()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

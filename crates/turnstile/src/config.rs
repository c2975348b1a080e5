//! Server configuration.

use crate::error::ConfigError;
use crate::room::RoomConfig;
use crate::timer::TimeoutPolicy;
use derive_getters::Getters;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

/// Settings for a game server.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind.
    #[serde(default = "default_host")]
    host: String,

    /// Port to bind.
    #[serde(default = "default_port")]
    port: u16,

    /// Milliseconds per countdown second.
    #[serde(default = "default_tick_millis")]
    tick_millis: u64,

    /// What happens when a turn times out.
    #[serde(default)]
    timeout_policy: TimeoutPolicy,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    2567
}

fn default_tick_millis() -> u64 {
    1000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            tick_millis: default_tick_millis(),
            timeout_policy: TimeoutPolicy::default(),
        }
    }
}

impl ServerConfig {
    /// Loads configuration from a TOML file.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        info!(host = %config.host, port = config.port, "Config loaded successfully");
        Ok(config)
    }

    /// Applies the `PORT` environment variable, if set and valid.
    #[instrument(skip(self))]
    pub fn with_env(mut self) -> Self {
        if let Ok(port) = std::env::var("PORT") {
            match port.parse() {
                Ok(port) => {
                    debug!(port, "Port taken from environment");
                    self.port = port;
                }
                Err(e) => warn!(value = %port, error = %e, "Ignoring invalid PORT"),
            }
        }
        self
    }

    /// Overrides the bind address.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Overrides the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Overrides the countdown pace.
    pub fn with_tick_millis(mut self, tick_millis: u64) -> Result<Self, ConfigError> {
        self.tick_millis = tick_millis;
        self.validate()?;
        Ok(self)
    }

    /// Overrides the timeout policy.
    pub fn with_timeout_policy(mut self, timeout_policy: TimeoutPolicy) -> Self {
        self.timeout_policy = timeout_policy;
        self
    }

    /// Settings handed to each room.
    pub fn room_config(&self) -> RoomConfig {
        RoomConfig::new(Duration::from_millis(self.tick_millis), self.timeout_policy)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tick_millis == 0 {
            return Err(ConfigError::new("tick_millis must be greater than zero"));
        }
        Ok(())
    }
}

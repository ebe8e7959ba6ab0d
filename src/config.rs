//! Configuration for the chat relay
//!
//! Loads defaults, an optional `config.toml`, and `CHAT_*` environment
//! overrides, in that order of precedence.

use config::{Config, Environment, File};
use serde::Deserialize;

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 5555;

/// Shared configuration for server and client processes.
#[derive(Debug, Deserialize, Clone)]
pub struct ChatConfig {
    /// Address the server binds its listener to.
    pub bind_address: String,

    /// Listening port. Port 0 binds an ephemeral port.
    pub port: u16,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ChatConfig {
    /// Load configuration from `config.toml` (if present) with environment
    /// overrides such as `CHAT_PORT=6000`.
    pub fn load() -> Result<Self, config::ConfigError> {
        let settings = Config::builder()
            .set_default("bind_address", "127.0.0.1")?
            .set_default("port", i64::from(DEFAULT_PORT))?
            .add_source(File::with_name("config").required(false))
            .add_source(Environment::with_prefix("CHAT"))
            .build()?;

        let config: ChatConfig = settings.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), config::ConfigError> {
        if self.bind_address.is_empty() {
            return Err(config::ConfigError::Message(
                "bind_address cannot be empty".into(),
            ));
        }
        Ok(())
    }
}

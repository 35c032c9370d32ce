//! Configuration management

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub transport: TransportConfig,
    pub database: DatabaseConfig,
}

/// Room provider credentials used to mint admission tokens
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    pub app_id: u64,
    pub server_secret: String,
    pub token_ttl_seconds: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            transport: TransportConfig {
                app_id: 1234567890,
                server_secret: "dev-only-secret".to_string(),
                token_ttl_seconds: 3600,
            },
            database: DatabaseConfig {
                url: "postgres://postgres@localhost/devpay".to_string(),
            },
        }
    }
}

impl Config {
    /// Layer `devpay.toml` and `DEVPAY_*` environment overrides on top of
    /// the defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        config::Config::builder()
            .add_source(config::Config::try_from(&Config::default())?)
            .add_source(config::File::with_name("devpay").required(false))
            .add_source(config::Environment::with_prefix("DEVPAY").separator("__"))
            .build()?
            .try_deserialize()
    }
}

//! Configuration Loader
//!
//! Environment-aware configuration loading. Sources are layered in order:
//! serde defaults, `config/auction.toml` (or an explicit file), then
//! `AUCTION__SECTION__KEY` environment variables. `DATABASE_URL` wins over
//! `database.url` when set.

use super::AuctionConfig;
use crate::error::{AuctionError, Result};
use config::{Config, Environment, File};
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

const DEFAULT_CONFIG_FILE: &str = "config/auction";
const ENV_PREFIX: &str = "AUCTION";

pub struct ConfigManager {
    config: AuctionConfig,
    environment: String,
    source_file: Option<PathBuf>,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load(config_file: Option<&Path>) -> Result<Arc<ConfigManager>> {
        Self::load_with_env(config_file, &Self::detect_environment())
    }

    /// Load configuration with an explicit environment name.
    /// This is useful for testing without modifying global environment variables
    pub fn load_with_env(config_file: Option<&Path>, environment: &str) -> Result<Arc<ConfigManager>> {
        let mut builder = Config::builder();

        let source_file = match config_file {
            Some(path) => {
                if !path.is_file() {
                    return Err(AuctionError::ConfigurationError(format!(
                        "Configuration file not found: {}",
                        path.display()
                    )));
                }
                builder = builder.add_source(File::from(path).required(true));
                Some(path.to_path_buf())
            }
            None => {
                builder = builder.add_source(File::with_name(DEFAULT_CONFIG_FILE).required(false));
                None
            }
        };

        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let mut config: AuctionConfig = builder.build()?.try_deserialize()?;

        if let Ok(url) = env::var("DATABASE_URL") {
            config.database.url = url;
        }

        config.validate()?;

        debug!(
            "Configuration loaded: {}",
            serde_json::to_string(&Self::sanitize_config_for_logging(&config))
                .unwrap_or_else(|_| "[serialization error]".to_string())
        );

        info!(
            environment = %environment,
            config_file = ?source_file,
            channel_configured = config.auction.channel_id.is_some(),
            admin_configured = config.admin.chat_id.is_some(),
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source_file,
        }))
    }

    /// Wrap an already-built configuration (tests, embedding)
    pub fn from_config(config: AuctionConfig, environment: &str) -> Result<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            source_file: None,
        }))
    }

    /// Get the loaded configuration
    pub fn config(&self) -> &AuctionConfig {
        &self.config
    }

    /// Get the current environment
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// File the configuration was read from, if one was given explicitly
    pub fn source_file(&self) -> Option<&Path> {
        self.source_file.as_deref()
    }

    /// Get sanitized configuration for debugging/logging that masks sensitive fields
    pub fn debug_config(&self) -> serde_json::Value {
        Self::sanitize_config_for_logging(&self.config)
    }

    fn sanitize_config_for_logging(config: &AuctionConfig) -> serde_json::Value {
        let mut config_json = serde_json::json!(config);
        let sensitive_patterns = ["password", "secret", "token", "url"];
        Self::sanitize_json_recursive(&mut config_json, &sensitive_patterns);
        config_json
    }

    /// Recursively sanitize sensitive fields in JSON configuration
    fn sanitize_json_recursive(value: &mut serde_json::Value, sensitive_patterns: &[&str]) {
        match value {
            serde_json::Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    let is_sensitive = sensitive_patterns
                        .iter()
                        .any(|pattern| key_lower.contains(pattern));

                    if is_sensitive {
                        *val = match val {
                            serde_json::Value::String(s) if s.is_empty() => {
                                serde_json::Value::String("[EMPTY]".to_string())
                            }
                            _ => serde_json::Value::String("[MASKED]".to_string()),
                        };
                    } else {
                        Self::sanitize_json_recursive(val, sensitive_patterns);
                    }
                }
            }
            serde_json::Value::Array(arr) => {
                for item in arr.iter_mut() {
                    Self::sanitize_json_recursive(item, sensitive_patterns);
                }
            }
            _ => {}
        }
    }

    /// Detect current environment from environment variables
    pub fn detect_environment() -> String {
        env::var("AUCTION_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }
}

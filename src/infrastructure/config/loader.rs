use std::path::Path;

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project configuration file, created by `caasctl config init`
pub const PROJECT_CONFIG: &str = ".caas/config.yaml";

/// Optional local overrides, not meant to be committed
pub const LOCAL_CONFIG: &str = ".caas/local.yaml";

const ENV_PREFIX: &str = "CAAS_";

/// Longest accepted create, update or delete timeout (seven days)
pub const MAX_TIMEOUT_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid api_url: '{0}'. Must be an http or https URL")]
    InvalidApiUrl(String),

    #[error("Invalid polling interval: must be at least 1 second")]
    ZeroInterval,

    #[error("Invalid {name}: {timeout_secs}s is shorter than the polling interval ({interval_secs}s)")]
    TimeoutShorterThanInterval {
        name: &'static str,
        timeout_secs: u64,
        interval_secs: u64,
    },

    #[error("Invalid {name}: {timeout_secs}s exceeds the maximum of {max_secs}s")]
    TimeoutTooLong {
        name: &'static str,
        timeout_secs: u64,
        max_secs: u64,
    },

    #[error("Invalid retry_limit: {0}. Must be between 1 and 20")]
    InvalidRetryLimit(u32),

    #[error("Invalid retryable status {0}. Must be a 5xx code")]
    InvalidRetryableStatus(u16),

    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Incomplete client credentials: token_url, client_id and client_secret must all be set")]
    IncompleteClientCredentials,
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration with hierarchical merging
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .caas/config.yaml (project config, created by `config init`)
    /// 3. .caas/local.yaml (local overrides, optional)
    /// 4. Environment variables (CAAS_* prefix, `__` separates nesting)
    pub fn load() -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(PROJECT_CONFIG))
            .merge(Yaml::file(LOCAL_CONFIG))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file; environment overrides still apply
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("Config file not found: {}", path.display());
        }

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Default configuration as YAML, for `config init`
    pub fn render_default() -> Result<String> {
        serde_yaml::to_string(&Config::default()).context("Failed to serialize default configuration")
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        let url = config.api_url.trim();
        if !(url.starts_with("http://") || url.starts_with("https://")) || url.ends_with("://") {
            return Err(ConfigError::InvalidApiUrl(config.api_url.clone()));
        }

        let polling = &config.polling;
        if polling.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        for (name, timeout_secs) in [
            ("create_timeout_secs", polling.create_timeout_secs),
            ("update_timeout_secs", polling.update_timeout_secs),
            ("delete_timeout_secs", polling.delete_timeout_secs),
        ] {
            if timeout_secs < polling.interval_secs {
                return Err(ConfigError::TimeoutShorterThanInterval {
                    name,
                    timeout_secs,
                    interval_secs: polling.interval_secs,
                });
            }
            if timeout_secs > MAX_TIMEOUT_SECS {
                return Err(ConfigError::TimeoutTooLong {
                    name,
                    timeout_secs,
                    max_secs: MAX_TIMEOUT_SECS,
                });
            }
        }

        if !(1..=20).contains(&polling.retry_limit) {
            return Err(ConfigError::InvalidRetryLimit(polling.retry_limit));
        }
        if let Some(status) = polling
            .retryable_statuses
            .iter()
            .find(|s| !(500..=599).contains(*s))
        {
            return Err(ConfigError::InvalidRetryableStatus(*status));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }

        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }

        // A partial triple is a mistake; no auth at all is reported when a token is needed
        let auth = &config.auth;
        let any_client_field = auth.token_url.is_some() || auth.client_id.is_some() || auth.client_secret.is_some();
        if any_client_field && !auth.has_client_credentials() {
            return Err(ConfigError::IncompleteClientCredentials);
        }

        Ok(())
    }
}

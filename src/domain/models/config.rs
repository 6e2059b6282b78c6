use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::resource::ConvergencePlan;

/// Main configuration structure for the controller
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Base URL of the control-plane API
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Default space used when a command does not name one
    #[serde(default)]
    pub space_id: Option<String>,

    /// Credential configuration
    #[serde(default)]
    pub auth: AuthConfig,

    /// Convergence polling configuration
    #[serde(default)]
    pub polling: PollingConfig,

    /// HTTP transport configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

fn default_api_url() -> String {
    "https://mcaas.us1.greenlake-hpe.com/mcaas".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            space_id: None,
            auth: AuthConfig::default(),
            polling: PollingConfig::default(),
            http: HttpConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Credential configuration.
///
/// Either a pre-issued `token`, or the client-credentials triple used to
/// mint tokens from the identity service.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AuthConfig {
    /// Pre-issued bearer token
    #[serde(default)]
    pub token: Option<String>,

    /// OAuth2 token endpoint
    #[serde(default)]
    pub token_url: Option<String>,

    /// OAuth2 client id
    #[serde(default)]
    pub client_id: Option<String>,

    /// OAuth2 client secret
    #[serde(default)]
    pub client_secret: Option<String>,
}

impl AuthConfig {
    /// Whether all client-credentials fields are set
    pub fn has_client_credentials(&self) -> bool {
        self.token_url.is_some() && self.client_id.is_some() && self.client_secret.is_some()
    }
}

/// Convergence polling configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct PollingConfig {
    /// Seconds between polls
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// Deadline for create runs, in seconds
    #[serde(default = "default_timeout_secs")]
    pub create_timeout_secs: u64,

    /// Deadline for update runs, in seconds
    #[serde(default = "default_timeout_secs")]
    pub update_timeout_secs: u64,

    /// Deadline for delete runs, in seconds
    #[serde(default = "default_timeout_secs")]
    pub delete_timeout_secs: u64,

    /// Consecutive retries allowed per failure category
    #[serde(default = "default_retry_limit")]
    pub retry_limit: u32,

    /// HTTP status codes treated as transient while polling
    #[serde(default = "default_retryable_statuses")]
    pub retryable_statuses: Vec<u16>,
}

const fn default_interval_secs() -> u64 {
    10
}

const fn default_timeout_secs() -> u64 {
    60 * 60
}

const fn default_retry_limit() -> u32 {
    3
}

fn default_retryable_statuses() -> Vec<u16> {
    vec![500, 502, 504]
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            create_timeout_secs: default_timeout_secs(),
            update_timeout_secs: default_timeout_secs(),
            delete_timeout_secs: default_timeout_secs(),
            retry_limit: default_retry_limit(),
            retryable_statuses: default_retryable_statuses(),
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn create_plan(&self) -> ConvergencePlan {
        ConvergencePlan::for_create(self.interval(), Duration::from_secs(self.create_timeout_secs))
    }

    pub fn update_plan(&self) -> ConvergencePlan {
        ConvergencePlan::for_update(self.interval(), Duration::from_secs(self.update_timeout_secs))
    }

    pub fn delete_plan(&self) -> ConvergencePlan {
        ConvergencePlan::for_delete(self.interval(), Duration::from_secs(self.delete_timeout_secs))
    }
}

/// HTTP transport configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct HttpConfig {
    /// Per-request timeout in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

const fn default_request_timeout_secs() -> u64 {
    60
}

fn default_user_agent() -> String {
    format!("caasctl/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
        }
    }
}

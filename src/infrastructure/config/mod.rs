//! Configuration management infrastructure
//!
//! Hierarchical configuration using figment:
//! - YAML file loading
//! - Environment variable overrides (`CAAS_*`)
//! - Configuration validation

pub mod loader;

pub use loader::{ConfigError, ConfigLoader, LOCAL_CONFIG, MAX_TIMEOUT_SECS, PROJECT_CONFIG};

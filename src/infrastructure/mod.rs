//! Infrastructure layer module
//!
//! This module contains the adapters behind the domain ports:
//! - Control-plane HTTP client (reqwest)
//! - Credential providers
//! - Configuration management
//! - Logging infrastructure

pub mod caas;
pub mod config;
pub mod credentials;
pub mod logging;

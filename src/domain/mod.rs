//! Domain layer for the CaaS controller
//!
//! This module contains the resource model, the error taxonomy and the
//! port traits the convergence engine is written against.

pub mod errors;
pub mod models;
pub mod ports;

// Re-export error types for convenient access
pub use errors::{ClientError, ConvergeError, CredentialError, OperationError};

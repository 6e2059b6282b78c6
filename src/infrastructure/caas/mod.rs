//! HTTP adapter for the control-plane API
//!
//! Implements the `ControlPlaneClient` port over reqwest.

pub mod client;

pub use client::{CaasClient, CaasClientConfig};

//! CLI command implementations

pub mod blueprint;
pub mod cluster;
pub mod config;
pub mod lookup;

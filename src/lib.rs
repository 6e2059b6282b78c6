//! CaaS Controller - drive managed Kubernetes clusters to their desired state
//!
//! The controller issues create, update and delete requests against a
//! container-as-a-service control plane and then polls until each cluster
//! reaches the state the request implies, within a deadline.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): resource model, error taxonomy and port traits
//! - **Service Layer** (`services`): convergence engine, refresh probes and
//!   the three-phase cluster operations built on them
//! - **Infrastructure Layer** (`infrastructure`): HTTP client, credentials,
//!   configuration and logging
//! - **CLI Layer** (`cli`): the `caasctl` command-line interface
//!
//! # Example
//!
//! ```ignore
//! use caas_controller::{ClusterService, ResourceRef};
//!
//! let cluster = service.read(&ResourceRef::new("c-1", "space-1")).await?;
//! println!("{} is {}", cluster.name, cluster.state);
//! ```

pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{ClientError, ConvergeError, CredentialError, OperationError};
pub use domain::models::{
    Cluster, Config, ConvergencePlan, CreateCluster, MachineSet, Observation, ObservedState,
    PollingConfig, ResourceRef, StateSet,
};
pub use domain::ports::{AccessToken, ControlPlaneClient, CredentialProvider, ResourceLister};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    ClusterService, ConvergenceEngine, ConvergenceReport, MachineBlueprintService, Probe,
    ProbeFactory, RetryClassifier,
};

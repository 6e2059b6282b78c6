//! Service layer: convergence and the lifecycle operations built on it.
//!
//! - `retry_classifier`: transient vs. permanent remote faults
//! - `refresh_probe`: one observation cycle per call, with retry budgets
//! - `convergence_engine`: the poll/sleep loop bounded by deadline and cancellation
//! - `cluster_service`: mutate, converge, read back for clusters
//! - `machine_blueprint_service`: synchronous blueprint lifecycle and lookups

pub mod cluster_service;
pub mod convergence_engine;
pub mod machine_blueprint_service;
pub mod refresh_probe;
pub mod retry_classifier;

pub use cluster_service::{ClusterLister, ClusterService};
pub use convergence_engine::{ConvergenceEngine, ConvergenceReport};
pub use machine_blueprint_service::MachineBlueprintService;
pub use refresh_probe::{Probe, ProbeFactory, RefreshProbe, RetryBudget};
pub use retry_classifier::{FaultClass, RetryClassifier};

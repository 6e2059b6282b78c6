pub mod cluster;
pub mod config;
pub mod resource;

pub use cluster::{
    merge_machine_sets, remove_machine_set, Cluster, ClusterBlueprint, ClusterProvider, CreateCluster,
    CreateMachineBlueprint, MachineBlueprint, MachineSet, ServiceEndpoint, Site,
};
pub use config::{AuthConfig, Config, HttpConfig, LoggingConfig, PollingConfig};
pub use resource::{
    ConvergencePlan, Observation, ObservedState, ResourceRef, ResourceStatus, StateSet,
    TransientCause,
};

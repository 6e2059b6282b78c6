//! Control-plane objects: clusters, worker pools, blueprints and sites.
//!
//! Field names follow the control plane's JSON. Only the attributes the
//! controller reads back or displays are modelled; unknown fields are
//! ignored on decode.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::resource::{ObservedState, ResourceStatus};

/// A managed Kubernetes cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub state: ObservedState,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cluster_blueprint_id: String,
    #[serde(default)]
    pub k8s_version: Option<String>,
    #[serde(default)]
    pub cluster_provider: Option<String>,
    #[serde(default)]
    pub machine_sets: Vec<MachineSet>,
    #[serde(default)]
    pub api_endpoint: Option<String>,
    #[serde(default)]
    pub service_endpoints: Vec<ServiceEndpoint>,
    #[serde(default, rename = "applianceID")]
    pub appliance_id: String,
    #[serde(default)]
    pub appliance_name: Option<String>,
    #[serde(default, rename = "spaceID")]
    pub space_id: String,
    #[serde(default)]
    pub default_storage_class: Option<String>,
    #[serde(default)]
    pub default_storage_class_description: Option<String>,
}

impl Cluster {
    /// The id/state projection the convergence engine works with
    pub fn status(&self) -> ResourceStatus {
        ResourceStatus::new(self.id.clone(), self.state.clone())
    }

    /// Whether a worker pool with this name is part of the cluster
    pub fn has_worker_pool(&self, name: &str) -> bool {
        self.machine_sets.iter().any(|ms| ms.name == name)
    }
}

/// A pool of identically configured machines within a cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineSet {
    pub name: String,
    pub machine_blueprint_id: String,
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_version: Option<String>,
}

const fn default_count() -> u32 {
    1
}

/// Replace pools that share a name with one in `updates`, append the rest.
pub fn merge_machine_sets(current: &[MachineSet], updates: Vec<MachineSet>) -> Vec<MachineSet> {
    let mut merged: Vec<MachineSet> = current
        .iter()
        .filter(|ms| !updates.iter().any(|u| u.name == ms.name))
        .cloned()
        .collect();
    merged.extend(updates);
    merged
}

/// Drop the pool named `name`; unchanged when no pool has that name
pub fn remove_machine_set(current: &[MachineSet], name: &str) -> Vec<MachineSet> {
    current.iter().filter(|ms| ms.name != name).cloned().collect()
}

/// An endpoint exposed by a cluster service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEndpoint {
    pub name: String,
    pub endpoint: String,
    #[serde(default)]
    pub namespace: Option<String>,
    #[serde(default, rename = "type")]
    pub endpoint_type: Option<String>,
}

/// Desired state for a new cluster
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCluster {
    pub name: String,
    pub cluster_blueprint_id: String,
    #[serde(rename = "applianceID")]
    pub appliance_id: String,
    #[serde(rename = "spaceID")]
    pub space_id: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub machine_sets: Vec<MachineSet>,
}

/// Template for a cluster: Kubernetes version and default pools
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBlueprint {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub k8s_version: Option<String>,
    #[serde(default)]
    pub cluster_provider: Option<String>,
    #[serde(default, rename = "applianceID")]
    pub appliance_id: String,
    #[serde(default)]
    pub machine_sets: Vec<MachineSet>,
    #[serde(default)]
    pub default_storage_class: Option<String>,
}

/// Template for the machines in a pool
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MachineBlueprint {
    pub id: String,
    pub name: String,
    #[serde(rename = "applianceID")]
    pub appliance_id: String,
    #[serde(default)]
    pub machine_roles: Vec<String>,
    #[serde(default)]
    pub machine_provider: String,
    #[serde(default)]
    pub os_image: String,
    #[serde(default)]
    pub os_version: String,
    #[serde(default)]
    pub compute_instance_type: String,
    #[serde(default)]
    pub size: String,
    #[serde(default)]
    pub storage_instance_type: String,
    #[serde(default)]
    pub worker_type: Option<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

/// Desired state for a new machine blueprint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMachineBlueprint {
    pub name: String,
    #[serde(rename = "applianceID")]
    pub appliance_id: String,
    pub machine_roles: Vec<String>,
    pub machine_provider: String,
    pub os_image: String,
    pub os_version: String,
    pub compute_instance_type: String,
    pub size: String,
    pub storage_instance_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worker_type: Option<String>,
}

/// A site (appliance) clusters are provisioned on
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Site {
    pub id: String,
    pub name: String,
    #[serde(default, rename = "spaceID")]
    pub space_id: String,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

/// Kubernetes distribution offered by a site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterProvider {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub health: Option<String>,
    #[serde(default)]
    pub kubernetes_versions: Vec<String>,
    #[serde(default)]
    pub storage_classes: Vec<String>,
    #[serde(default)]
    pub created_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_update_date: Option<DateTime<Utc>>,
}

use async_trait::async_trait;

use super::credentials::AccessToken;
use crate::domain::errors::ClientError;
use crate::domain::models::{
    Cluster, ClusterBlueprint, ClusterProvider, CreateCluster, CreateMachineBlueprint, MachineBlueprint,
    MachineSet, ResourceStatus, Site,
};

/// Operations against the remote control-plane API.
///
/// Every call takes the token explicitly; callers obtain a fresh one from a
/// [`CredentialProvider`](super::CredentialProvider) per call.
#[async_trait]
pub trait ControlPlaneClient: Send + Sync {
    /// List the clusters in a space
    async fn list_clusters(&self, token: &AccessToken, space_id: &str) -> Result<Vec<Cluster>, ClientError>;

    /// Read one cluster with full attributes
    async fn get_cluster(&self, token: &AccessToken, id: &str, space_id: &str) -> Result<Cluster, ClientError>;

    /// Request a new cluster; returns the accepted object with its id
    async fn create_cluster(&self, token: &AccessToken, request: &CreateCluster) -> Result<Cluster, ClientError>;

    /// Request deletion of a cluster
    async fn delete_cluster(&self, token: &AccessToken, id: &str) -> Result<(), ClientError>;

    /// Fetch the kubeconfig document of a cluster
    async fn get_kubeconfig(&self, token: &AccessToken, id: &str) -> Result<String, ClientError>;

    /// Replace the worker pools of a cluster
    async fn update_machine_sets(
        &self,
        token: &AccessToken,
        id: &str,
        space_id: &str,
        machine_sets: &[MachineSet],
    ) -> Result<(), ClientError>;

    /// List the sites visible in a space
    async fn list_sites(&self, token: &AccessToken, space_id: &str) -> Result<Vec<Site>, ClientError>;

    /// List the cluster blueprints available on a site
    async fn list_cluster_blueprints(&self, token: &AccessToken, site_id: &str) -> Result<Vec<ClusterBlueprint>, ClientError>;

    /// List the cluster providers a site offers
    async fn list_cluster_providers(&self, token: &AccessToken, site_id: &str) -> Result<Vec<ClusterProvider>, ClientError>;

    /// List the machine blueprints available on a site
    async fn list_machine_blueprints(&self, token: &AccessToken, site_id: &str) -> Result<Vec<MachineBlueprint>, ClientError>;

    /// Read one machine blueprint
    async fn get_machine_blueprint(&self, token: &AccessToken, id: &str, site_id: &str) -> Result<MachineBlueprint, ClientError>;

    /// Create a machine blueprint
    async fn create_machine_blueprint(
        &self,
        token: &AccessToken,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint, ClientError>;

    /// Delete a machine blueprint
    async fn delete_machine_blueprint(&self, token: &AccessToken, id: &str) -> Result<(), ClientError>;
}

/// Lists the id/state of every member of one collection scope.
///
/// This is the only view a refresh probe needs. The list endpoint is used
/// instead of a get-by-id because it is the consistent source of state right
/// after a mutation.
#[async_trait]
pub trait ResourceLister: Send + Sync {
    async fn list_statuses(&self, token: &AccessToken, scope: &str) -> Result<Vec<ResourceStatus>, ClientError>;
}

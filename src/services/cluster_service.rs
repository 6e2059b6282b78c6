//! Cluster lifecycle: mutate, converge, read back.
//!
//! Each mutating operation runs in three phases and tags failures with the
//! phase that failed (see [`OperationError`]):
//! 1. issue the mutation; a rejection leaves nothing to converge
//! 2. converge the durable id to the plan's target set
//! 3. read the resource back so the caller sees authoritative attributes
//!
//! A convergence failure keeps the resource id so the caller can re-drive
//! [`ClusterService::converge`] instead of repeating the mutation.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{info, instrument};

use super::convergence_engine::{ConvergenceEngine, ConvergenceReport};
use super::refresh_probe::ProbeFactory;
use super::retry_classifier::RetryClassifier;
use crate::domain::errors::{ClientError, OperationError};
use crate::domain::models::{
    merge_machine_sets, remove_machine_set, Cluster, ClusterBlueprint, ClusterProvider, ConvergencePlan, CreateCluster,
    MachineSet, PollingConfig, ResourceRef, ResourceStatus, Site,
};
use crate::domain::ports::{AccessToken, ControlPlaneClient, CredentialProvider, ResourceLister};

/// Lists cluster statuses in a space through the control-plane client
pub struct ClusterLister {
    client: Arc<dyn ControlPlaneClient>,
}

impl ClusterLister {
    pub fn new(client: Arc<dyn ControlPlaneClient>) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ResourceLister for ClusterLister {
    async fn list_statuses(&self, token: &AccessToken, scope: &str) -> Result<Vec<ResourceStatus>, ClientError> {
        let clusters = self.client.list_clusters(token, scope).await?;
        Ok(clusters.iter().map(Cluster::status).collect())
    }
}

/// Orchestrates cluster operations against the control plane
pub struct ClusterService {
    client: Arc<dyn ControlPlaneClient>,
    credentials: Arc<dyn CredentialProvider>,
    probes: ProbeFactory,
    engine: ConvergenceEngine,
    polling: PollingConfig,
}

impl ClusterService {
    pub fn new(
        client: Arc<dyn ControlPlaneClient>,
        credentials: Arc<dyn CredentialProvider>,
        polling: PollingConfig,
    ) -> Self {
        let lister = Arc::new(ClusterLister::new(Arc::clone(&client)));
        let probes = ProbeFactory::new(
            lister,
            Arc::clone(&credentials),
            RetryClassifier::new(polling.retryable_statuses.clone()),
            polling.retry_limit,
        );
        Self {
            client,
            credentials,
            probes,
            engine: ConvergenceEngine::new(),
            polling,
        }
    }

    /// Polling settings the canonical plans are built from
    pub const fn polling(&self) -> &PollingConfig {
        &self.polling
    }

    async fn token(&self) -> Result<AccessToken, OperationError> {
        Ok(self.credentials.token().await?)
    }

    /// Create a cluster and wait until it is ready
    #[instrument(skip_all, fields(name = %request.name, space = %request.space_id))]
    pub async fn create(&self, request: &CreateCluster, cancel: &CancellationToken) -> Result<Cluster, OperationError> {
        let token = self.token().await?;
        let accepted = self
            .client
            .create_cluster(&token, request)
            .await
            .map_err(|source| OperationError::Mutation {
                operation: "create cluster",
                source,
            })?;

        let resource = ResourceRef::new(accepted.id, request.space_id.clone());
        info!(resource = %resource, "cluster accepted, waiting for ready");

        self.converge(&resource, &self.polling.create_plan(), cancel).await?;
        self.read(&resource).await
    }

    /// Read one cluster with all attributes
    pub async fn read(&self, resource: &ResourceRef) -> Result<Cluster, OperationError> {
        let token = self.token().await?;
        self.client
            .get_cluster(&token, &resource.id, &resource.scope)
            .await
            .map_err(|source| OperationError::Read {
                resource: resource.clone(),
                source,
            })
    }

    /// List the clusters in a space
    pub async fn list(&self, space_id: &str) -> Result<Vec<Cluster>, OperationError> {
        let token = self.token().await?;
        self.client
            .list_clusters(&token, space_id)
            .await
            .map_err(|source| OperationError::List {
                kind: "clusters",
                scope: space_id.to_string(),
                source,
            })
    }

    /// Delete a cluster and wait until it is gone
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn delete(
        &self,
        resource: &ResourceRef,
        cancel: &CancellationToken,
    ) -> Result<ConvergenceReport, OperationError> {
        let token = self.token().await?;
        self.client
            .delete_cluster(&token, &resource.id)
            .await
            .map_err(|source| OperationError::Mutation {
                operation: "delete cluster",
                source,
            })?;
        info!("deletion accepted, waiting for removal");

        self.converge(resource, &self.polling.delete_plan(), cancel).await
    }

    /// Add or resize worker pools; pools not named in `pools` are kept as-is
    #[instrument(skip_all, fields(resource = %resource, pools = pools.len()))]
    pub async fn update_worker_nodes(
        &self,
        resource: &ResourceRef,
        pools: Vec<MachineSet>,
        cancel: &CancellationToken,
    ) -> Result<Cluster, OperationError> {
        let current = self.read(resource).await?;
        let merged = merge_machine_sets(&current.machine_sets, pools);
        self.apply_machine_sets(resource, &merged, cancel).await
    }

    /// Remove one worker pool by name.
    ///
    /// A pool that is already absent is not an error: the current cluster is
    /// returned without issuing a mutation.
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn remove_worker_node(
        &self,
        resource: &ResourceRef,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Cluster, OperationError> {
        let current = self.read(resource).await?;
        if !current.has_worker_pool(name) {
            info!(pool = name, "worker pool already absent");
            return Ok(current);
        }
        let remaining = remove_machine_set(&current.machine_sets, name);
        self.apply_machine_sets(resource, &remaining, cancel).await
    }

    async fn apply_machine_sets(
        &self,
        resource: &ResourceRef,
        machine_sets: &[MachineSet],
        cancel: &CancellationToken,
    ) -> Result<Cluster, OperationError> {
        let token = self.token().await?;
        self.client
            .update_machine_sets(&token, &resource.id, &resource.scope, machine_sets)
            .await
            .map_err(|source| OperationError::Mutation {
                operation: "update worker pools",
                source,
            })?;
        info!("worker pool update accepted, waiting for ready");

        self.converge(resource, &self.polling.update_plan(), cancel).await?;
        self.read(resource).await
    }

    /// Drive an existing resource to `plan.targets` without mutating it.
    ///
    /// This is also how a timed-out or cancelled run is resumed.
    pub async fn converge(
        &self,
        resource: &ResourceRef,
        plan: &ConvergencePlan,
        cancel: &CancellationToken,
    ) -> Result<ConvergenceReport, OperationError> {
        let mut probe = self.probes.probe_for(resource.clone(), &plan.targets);
        self.engine
            .converge(resource, &mut probe, plan, cancel)
            .await
            .map_err(|source| OperationError::Convergence {
                resource: resource.clone(),
                source,
            })
    }

    /// Find a site by name within a space
    pub async fn find_site(&self, space_id: &str, name: &str) -> Result<Site, OperationError> {
        let token = self.token().await?;
        let sites = self
            .client
            .list_sites(&token, space_id)
            .await
            .map_err(|source| OperationError::List {
                kind: "sites",
                scope: space_id.to_string(),
                source,
            })?;
        sites
            .into_iter()
            .find(|site| site.name == name)
            .ok_or_else(|| OperationError::NotFound {
                kind: "site",
                name: name.to_string(),
                scope: space_id.to_string(),
            })
    }

    /// Find a cluster by name within a space
    pub async fn find_cluster(&self, space_id: &str, name: &str) -> Result<Cluster, OperationError> {
        self.list(space_id)
            .await?
            .into_iter()
            .find(|cluster| cluster.name == name)
            .ok_or_else(|| OperationError::NotFound {
                kind: "cluster",
                name: name.to_string(),
                scope: space_id.to_string(),
            })
    }

    /// Kubeconfig document for a cluster
    #[instrument(skip_all, fields(resource = %resource))]
    pub async fn kubeconfig(&self, resource: &ResourceRef) -> Result<String, OperationError> {
        let token = self.token().await?;
        self.client
            .get_kubeconfig(&token, &resource.id)
            .await
            .map_err(|source| OperationError::Read {
                resource: resource.clone(),
                source,
            })
    }

    /// Find a cluster provider by name on a site
    pub async fn find_cluster_provider(&self, site_id: &str, name: &str) -> Result<ClusterProvider, OperationError> {
        let token = self.token().await?;
        let providers = self
            .client
            .list_cluster_providers(&token, site_id)
            .await
            .map_err(|source| OperationError::List {
                kind: "cluster providers",
                scope: site_id.to_string(),
                source,
            })?;
        providers
            .into_iter()
            .find(|provider| provider.name == name)
            .ok_or_else(|| OperationError::NotFound {
                kind: "cluster provider",
                name: name.to_string(),
                scope: site_id.to_string(),
            })
    }

    /// Find a cluster blueprint by name within a site
    pub async fn find_cluster_blueprint(&self, site_id: &str, name: &str) -> Result<ClusterBlueprint, OperationError> {
        let token = self.token().await?;
        let blueprints = self
            .client
            .list_cluster_blueprints(&token, site_id)
            .await
            .map_err(|source| OperationError::List {
                kind: "cluster blueprints",
                scope: site_id.to_string(),
                source,
            })?;
        blueprints
            .into_iter()
            .find(|bp| bp.name == name)
            .ok_or_else(|| OperationError::NotFound {
                kind: "cluster blueprint",
                name: name.to_string(),
                scope: site_id.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::CredentialError;
    use crate::domain::models::{CreateMachineBlueprint, MachineBlueprint, ObservedState};

    /// Only `list_clusters` is reachable from the lister
    struct ListOnly(Vec<Cluster>);

    fn cluster(id: &str, state: ObservedState) -> Cluster {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "name": id,
            "state": state.as_str(),
        }))
        .unwrap()
    }

    #[async_trait]
    impl ControlPlaneClient for ListOnly {
        async fn list_clusters(&self, _: &AccessToken, _: &str) -> Result<Vec<Cluster>, ClientError> {
            Ok(self.0.clone())
        }
        async fn get_cluster(&self, _: &AccessToken, _: &str, _: &str) -> Result<Cluster, ClientError> {
            unimplemented!()
        }
        async fn create_cluster(&self, _: &AccessToken, _: &CreateCluster) -> Result<Cluster, ClientError> {
            unimplemented!()
        }
        async fn delete_cluster(&self, _: &AccessToken, _: &str) -> Result<(), ClientError> {
            unimplemented!()
        }
        async fn get_kubeconfig(&self, _: &AccessToken, _: &str) -> Result<String, ClientError> {
            unimplemented!()
        }
        async fn update_machine_sets(&self, _: &AccessToken, _: &str, _: &str, _: &[MachineSet]) -> Result<(), ClientError> {
            unimplemented!()
        }
        async fn list_sites(&self, _: &AccessToken, _: &str) -> Result<Vec<Site>, ClientError> {
            unimplemented!()
        }
        async fn list_cluster_blueprints(&self, _: &AccessToken, _: &str) -> Result<Vec<ClusterBlueprint>, ClientError> {
            unimplemented!()
        }
        async fn list_cluster_providers(&self, _: &AccessToken, _: &str) -> Result<Vec<ClusterProvider>, ClientError> {
            unimplemented!()
        }
        async fn list_machine_blueprints(&self, _: &AccessToken, _: &str) -> Result<Vec<MachineBlueprint>, ClientError> {
            unimplemented!()
        }
        async fn get_machine_blueprint(&self, _: &AccessToken, _: &str, _: &str) -> Result<MachineBlueprint, ClientError> {
            unimplemented!()
        }
        async fn create_machine_blueprint(
            &self,
            _: &AccessToken,
            _: &CreateMachineBlueprint,
        ) -> Result<MachineBlueprint, ClientError> {
            unimplemented!()
        }
        async fn delete_machine_blueprint(&self, _: &AccessToken, _: &str) -> Result<(), ClientError> {
            unimplemented!()
        }
    }

    struct NoCredentials;

    #[async_trait]
    impl CredentialProvider for NoCredentials {
        async fn token(&self) -> Result<AccessToken, CredentialError> {
            Err(CredentialError::NotConfigured("test".to_string()))
        }
    }

    #[tokio::test]
    async fn test_lister_projects_id_and_state() {
        let lister = ClusterLister::new(Arc::new(ListOnly(vec![
            cluster("a", ObservedState::Ready),
            cluster("b", ObservedState::Deleting),
        ])));

        let statuses = lister.list_statuses(&AccessToken::new("t"), "space").await.unwrap();
        assert_eq!(
            statuses,
            vec![
                ResourceStatus::new("a", ObservedState::Ready),
                ResourceStatus::new("b", ObservedState::Deleting),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_credentials_fail_before_mutation() {
        let service = ClusterService::new(Arc::new(ListOnly(vec![])), Arc::new(NoCredentials), PollingConfig::default());
        let err = service
            .delete(&ResourceRef::new("c1", "s1"), &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, OperationError::Credentials(_)));
    }
}

//! Shared fixtures for integration tests
//!
//! `MockControlPlane` keeps clusters in memory and replays a script of
//! list-call steps, so tests can walk a cluster through its lifecycle
//! without a server.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use caas_controller::domain::errors::ClientError;
use caas_controller::domain::models::{
    Cluster, ClusterBlueprint, ClusterProvider, CreateCluster, CreateMachineBlueprint, MachineBlueprint, MachineSet,
    ObservedState, PollingConfig, Site,
};
use caas_controller::domain::ports::{AccessToken, ControlPlaneClient};
use caas_controller::infrastructure::credentials::StaticTokenProvider;
use caas_controller::services::ClusterService;

pub const SPACE: &str = "space-1";
pub const SITE: &str = "site-1";

/// What happens to the fake control plane before a list call answers
#[derive(Debug, Clone)]
pub enum Step {
    /// Move a cluster to a new state
    Set(&'static str, ObservedState),
    /// Drop a cluster from the collection
    Remove(&'static str),
    /// Leave a cluster out of this one answer but keep it stored
    Hide(&'static str),
    /// Answer the list call with this HTTP status
    Fail(u16),
    /// Leave everything as it is
    Idle,
}

#[derive(Default)]
struct Inner {
    clusters: Vec<Cluster>,
    script: VecDeque<Step>,
    next_id: u32,
    list_calls: u32,
    reject_mutations: Option<u16>,
    machine_set_puts: Vec<Vec<MachineSet>>,
    deletes: Vec<String>,
    machine_blueprints: Vec<MachineBlueprint>,
}

#[derive(Default)]
pub struct MockControlPlane {
    inner: Mutex<Inner>,
}

pub fn status_error(status: u16) -> ClientError {
    ClientError::Status {
        status,
        message: format!("status {status}"),
    }
}

pub fn pool(name: &str, count: u32) -> MachineSet {
    MachineSet {
        name: name.to_string(),
        machine_blueprint_id: format!("mb-{name}"),
        count,
        os_image: None,
        os_version: None,
    }
}

pub fn cluster(id: &str, state: ObservedState, machine_sets: Vec<MachineSet>) -> Cluster {
    let mut cluster: Cluster = serde_json::from_value(serde_json::json!({
        "id": id,
        "name": format!("name-{id}"),
        "state": state.as_str(),
        "clusterBlueprintId": "cbp-1",
        "applianceID": SITE,
        "spaceID": SPACE,
    }))
    .unwrap();
    cluster.machine_sets = machine_sets;
    cluster
}

pub fn create_request(name: &str) -> CreateCluster {
    CreateCluster {
        name: name.to_string(),
        cluster_blueprint_id: "cbp-1".to_string(),
        appliance_id: SITE.to_string(),
        space_id: SPACE.to_string(),
        machine_sets: vec![pool("master", 1)],
    }
}

impl MockControlPlane {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_cluster(self: Arc<Self>, cluster: Cluster) -> Arc<Self> {
        self.inner.lock().unwrap().clusters.push(cluster);
        self
    }

    pub fn script(&self, steps: impl IntoIterator<Item = Step>) {
        self.inner.lock().unwrap().script.extend(steps);
    }

    pub fn reject_mutations(&self, status: u16) {
        self.inner.lock().unwrap().reject_mutations = Some(status);
    }

    pub fn list_calls(&self) -> u32 {
        self.inner.lock().unwrap().list_calls
    }

    pub fn machine_set_puts(&self) -> Vec<Vec<MachineSet>> {
        self.inner.lock().unwrap().machine_set_puts.clone()
    }

    pub fn deletes(&self) -> Vec<String> {
        self.inner.lock().unwrap().deletes.clone()
    }

    pub fn state_of(&self, id: &str) -> Option<ObservedState> {
        let inner = self.inner.lock().unwrap();
        inner.clusters.iter().find(|c| c.id == id).map(|c| c.state.clone())
    }

    fn check_mutation(inner: &Inner) -> Result<(), ClientError> {
        inner.reject_mutations.map_or(Ok(()), |status| Err(status_error(status)))
    }
}

#[async_trait]
impl ControlPlaneClient for MockControlPlane {
    async fn list_clusters(&self, _: &AccessToken, space_id: &str) -> Result<Vec<Cluster>, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        inner.list_calls += 1;
        let mut hidden = None;
        match inner.script.pop_front() {
            Some(Step::Set(id, state)) => {
                if let Some(c) = inner.clusters.iter_mut().find(|c| c.id == id) {
                    c.state = state;
                }
            }
            Some(Step::Remove(id)) => inner.clusters.retain(|c| c.id != id),
            Some(Step::Hide(id)) => hidden = Some(id),
            Some(Step::Fail(status)) => return Err(status_error(status)),
            Some(Step::Idle) | None => {}
        }
        Ok(inner
            .clusters
            .iter()
            .filter(|c| c.space_id == space_id && Some(c.id.as_str()) != hidden)
            .cloned()
            .collect())
    }

    async fn get_cluster(&self, _: &AccessToken, id: &str, space_id: &str) -> Result<Cluster, ClientError> {
        let inner = self.inner.lock().unwrap();
        inner
            .clusters
            .iter()
            .find(|c| c.id == id && c.space_id == space_id)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    async fn create_cluster(&self, _: &AccessToken, request: &CreateCluster) -> Result<Cluster, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_mutation(&inner)?;
        inner.next_id += 1;
        let mut created = cluster(
            &format!("c-{}", inner.next_id),
            ObservedState::Initializing,
            request.machine_sets.clone(),
        );
        created.name = request.name.clone();
        created.space_id = request.space_id.clone();
        inner.clusters.push(created.clone());
        Ok(created)
    }

    async fn delete_cluster(&self, _: &AccessToken, id: &str) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_mutation(&inner)?;
        inner.deletes.push(id.to_string());
        let found = inner.clusters.iter_mut().find(|c| c.id == id).ok_or_else(|| status_error(404))?;
        found.state = ObservedState::Deleting;
        Ok(())
    }

    async fn get_kubeconfig(&self, _: &AccessToken, id: &str) -> Result<String, ClientError> {
        let inner = self.inner.lock().unwrap();
        inner
            .clusters
            .iter()
            .find(|c| c.id == id)
            .map(|c| format!("apiVersion: v1\nkind: Config\ncurrent-context: {}\n", c.name))
            .ok_or_else(|| status_error(404))
    }

    async fn update_machine_sets(
        &self,
        _: &AccessToken,
        id: &str,
        _: &str,
        machine_sets: &[MachineSet],
    ) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_mutation(&inner)?;
        inner.machine_set_puts.push(machine_sets.to_vec());
        let found = inner.clusters.iter_mut().find(|c| c.id == id).ok_or_else(|| status_error(404))?;
        found.machine_sets = machine_sets.to_vec();
        found.state = ObservedState::Updating;
        Ok(())
    }

    async fn list_sites(&self, _: &AccessToken, space_id: &str) -> Result<Vec<Site>, ClientError> {
        Ok(vec![serde_json::from_value(serde_json::json!({
            "id": SITE,
            "name": "lab",
            "spaceID": space_id,
        }))
        .unwrap()])
    }

    async fn list_cluster_blueprints(&self, _: &AccessToken, site_id: &str) -> Result<Vec<ClusterBlueprint>, ClientError> {
        Ok(vec![serde_json::from_value(serde_json::json!({
            "id": "cbp-1",
            "name": "standard",
            "applianceID": site_id,
            "k8sVersion": "v1.28.4",
        }))
        .unwrap()])
    }

    async fn list_cluster_providers(&self, _: &AccessToken, _: &str) -> Result<Vec<ClusterProvider>, ClientError> {
        Ok(vec![serde_json::from_value(serde_json::json!({
            "id": "cp-1",
            "name": "ncs",
            "state": "active",
            "kubernetesVersions": ["v1.27.8", "v1.28.4"],
        }))
        .unwrap()])
    }

    async fn list_machine_blueprints(&self, _: &AccessToken, site_id: &str) -> Result<Vec<MachineBlueprint>, ClientError> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .machine_blueprints
            .iter()
            .filter(|bp| bp.appliance_id == site_id)
            .cloned()
            .collect())
    }

    async fn get_machine_blueprint(&self, _: &AccessToken, id: &str, site_id: &str) -> Result<MachineBlueprint, ClientError> {
        let inner = self.inner.lock().unwrap();
        inner
            .machine_blueprints
            .iter()
            .find(|bp| bp.id == id && bp.appliance_id == site_id)
            .cloned()
            .ok_or_else(|| status_error(404))
    }

    async fn create_machine_blueprint(
        &self,
        _: &AccessToken,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint, ClientError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_mutation(&inner)?;
        inner.next_id += 1;
        let created = MachineBlueprint {
            id: format!("mb-{}", inner.next_id),
            name: request.name.clone(),
            appliance_id: request.appliance_id.clone(),
            machine_roles: request.machine_roles.clone(),
            machine_provider: request.machine_provider.clone(),
            os_image: request.os_image.clone(),
            os_version: request.os_version.clone(),
            compute_instance_type: request.compute_instance_type.clone(),
            size: request.size.clone(),
            storage_instance_type: request.storage_instance_type.clone(),
            worker_type: request.worker_type.clone(),
            created_date: None,
            last_update_date: None,
        };
        inner.machine_blueprints.push(created.clone());
        Ok(created)
    }

    async fn delete_machine_blueprint(&self, _: &AccessToken, id: &str) -> Result<(), ClientError> {
        let mut inner = self.inner.lock().unwrap();
        Self::check_mutation(&inner)?;
        let before = inner.machine_blueprints.len();
        inner.machine_blueprints.retain(|bp| bp.id != id);
        if inner.machine_blueprints.len() == before {
            return Err(status_error(404));
        }
        Ok(())
    }
}

pub fn service(client: Arc<MockControlPlane>, polling: PollingConfig) -> ClusterService {
    ClusterService::new(client, Arc::new(StaticTokenProvider::new("test-token")), polling)
}

/// Initializes tracing for tests that want log output
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

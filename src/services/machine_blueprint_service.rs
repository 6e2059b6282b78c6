//! Machine blueprint lifecycle.
//!
//! The control plane applies blueprint changes synchronously, so there is
//! no convergence phase: create is POST then read back, delete is a single
//! call.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::domain::errors::OperationError;
use crate::domain::models::{CreateMachineBlueprint, MachineBlueprint, ResourceRef};
use crate::domain::ports::{AccessToken, ControlPlaneClient, CredentialProvider};

pub struct MachineBlueprintService {
    client: Arc<dyn ControlPlaneClient>,
    credentials: Arc<dyn CredentialProvider>,
}

impl MachineBlueprintService {
    pub fn new(client: Arc<dyn ControlPlaneClient>, credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { client, credentials }
    }

    async fn token(&self) -> Result<AccessToken, OperationError> {
        Ok(self.credentials.token().await?)
    }

    #[instrument(skip_all, fields(name = %request.name, site = %request.appliance_id))]
    pub async fn create(&self, request: &CreateMachineBlueprint) -> Result<MachineBlueprint, OperationError> {
        let token = self.token().await?;
        let created = self
            .client
            .create_machine_blueprint(&token, request)
            .await
            .map_err(|source| OperationError::Mutation {
                operation: "create machine blueprint",
                source,
            })?;
        info!(id = %created.id, "machine blueprint created");

        self.read(&ResourceRef::new(created.id, request.appliance_id.clone()))
            .await
    }

    /// `resource.scope` is the site id
    pub async fn read(&self, resource: &ResourceRef) -> Result<MachineBlueprint, OperationError> {
        let token = self.token().await?;
        self.client
            .get_machine_blueprint(&token, &resource.id, &resource.scope)
            .await
            .map_err(|source| OperationError::Read {
                resource: resource.clone(),
                source,
            })
    }

    #[instrument(skip_all, fields(id = %id))]
    pub async fn delete(&self, id: &str) -> Result<(), OperationError> {
        let token = self.token().await?;
        self.client
            .delete_machine_blueprint(&token, id)
            .await
            .map_err(|source| OperationError::Mutation {
                operation: "delete machine blueprint",
                source,
            })?;
        info!("machine blueprint deleted");
        Ok(())
    }

    /// Find a machine blueprint by name within a site
    pub async fn find_by_name(&self, site_id: &str, name: &str) -> Result<MachineBlueprint, OperationError> {
        let token = self.token().await?;
        let blueprints = self
            .client
            .list_machine_blueprints(&token, site_id)
            .await
            .map_err(|source| OperationError::List {
                kind: "machine blueprints",
                scope: site_id.to_string(),
                source,
            })?;
        blueprints
            .into_iter()
            .find(|bp| bp.name == name)
            .ok_or_else(|| OperationError::NotFound {
                kind: "machine blueprint",
                name: name.to_string(),
                scope: site_id.to_string(),
            })
    }
}

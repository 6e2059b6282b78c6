//! Machine blueprint CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{CreateMachineBlueprint, MachineBlueprint, ResourceRef};

#[derive(Args, Debug)]
pub struct MachineBlueprintArgs {
    #[command(subcommand)]
    pub command: MachineBlueprintCommands,
}

#[derive(Subcommand, Debug)]
pub enum MachineBlueprintCommands {
    /// Create a machine blueprint
    Create {
        /// Blueprint name
        name: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
        /// Machine role, e.g. controlplane or worker (repeatable)
        #[arg(long = "role", required = true)]
        roles: Vec<String>,
        /// Machine provider
        #[arg(long, default_value = "vmaas")]
        provider: String,
        #[arg(long)]
        os_image: String,
        #[arg(long)]
        os_version: String,
        /// Compute instance type
        #[arg(long)]
        compute_type: String,
        /// Size name, e.g. medium
        #[arg(long)]
        size: String,
        /// Storage instance type
        #[arg(long)]
        storage_type: String,
        /// Worker type, for worker blueprints
        #[arg(long)]
        worker_type: Option<String>,
    },
    /// Show a machine blueprint
    Show {
        /// Blueprint id
        id: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
    },
    /// Delete a machine blueprint
    Delete {
        /// Blueprint id
        id: String,
    },
    /// Find a machine blueprint by name
    Lookup {
        /// Blueprint name
        name: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct MachineBlueprintOutput {
    pub id: String,
    pub name: String,
    pub site_id: String,
    pub roles: Vec<String>,
    pub provider: String,
    pub os_image: String,
    pub os_version: String,
    pub compute_type: String,
    pub size: String,
    pub storage_type: String,
    pub worker_type: Option<String>,
}

impl From<&MachineBlueprint> for MachineBlueprintOutput {
    fn from(bp: &MachineBlueprint) -> Self {
        Self {
            id: bp.id.clone(),
            name: bp.name.clone(),
            site_id: bp.appliance_id.clone(),
            roles: bp.machine_roles.clone(),
            provider: bp.machine_provider.clone(),
            os_image: bp.os_image.clone(),
            os_version: bp.os_version.clone(),
            compute_type: bp.compute_instance_type.clone(),
            size: bp.size.clone(),
            storage_type: bp.storage_instance_type.clone(),
            worker_type: bp.worker_type.clone(),
        }
    }
}

impl CommandOutput for MachineBlueprintOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Machine blueprint: {}", self.name),
            format!("ID: {}", self.id),
            format!("Site: {}", self.site_id),
            format!("Roles: {}", self.roles.join(", ")),
            format!("Provider: {}", self.provider),
            format!("OS: {} {}", self.os_image, self.os_version),
            format!("Compute: {} ({})", self.compute_type, self.size),
            format!("Storage: {}", self.storage_type),
        ];
        if let Some(worker_type) = &self.worker_type {
            lines.push(format!("Worker type: {worker_type}"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct DeletedOutput {
    pub success: bool,
    pub id: String,
}

impl CommandOutput for DeletedOutput {
    fn to_human(&self) -> String {
        format!("Machine blueprint {} deleted", self.id)
    }
}

pub async fn execute(args: MachineBlueprintArgs, ctx: &AppContext) -> Result<()> {
    let service = ctx.blueprint_service()?;

    match args.command {
        MachineBlueprintCommands::Create {
            name,
            site_id,
            roles,
            provider,
            os_image,
            os_version,
            compute_type,
            size,
            storage_type,
            worker_type,
        } => {
            let request = CreateMachineBlueprint {
                name: name.clone(),
                appliance_id: site_id,
                machine_roles: roles,
                machine_provider: provider,
                os_image,
                os_version,
                compute_instance_type: compute_type,
                size,
                storage_instance_type: storage_type,
                worker_type,
            };
            let blueprint = service
                .create(&request)
                .await
                .with_context(|| format!("Failed to create machine blueprint {name}"))?;
            output(&MachineBlueprintOutput::from(&blueprint), ctx.json());
        }

        MachineBlueprintCommands::Show { id, site_id } => {
            let blueprint = service.read(&ResourceRef::new(id, site_id)).await?;
            output(&MachineBlueprintOutput::from(&blueprint), ctx.json());
        }

        MachineBlueprintCommands::Delete { id } => {
            service.delete(&id).await?;
            output(&DeletedOutput { success: true, id }, ctx.json());
        }

        MachineBlueprintCommands::Lookup { name, site_id } => {
            let blueprint = service.find_by_name(&site_id, &name).await?;
            output(&MachineBlueprintOutput::from(&blueprint), ctx.json());
        }
    }

    Ok(())
}

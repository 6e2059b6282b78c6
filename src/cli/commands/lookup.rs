//! Name lookups for sites, cluster blueprints and cluster providers.

use anyhow::Result;
use clap::{Args, Subcommand};
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{ClusterBlueprint, ClusterProvider, Site};

#[derive(Args, Debug)]
pub struct SiteArgs {
    #[command(subcommand)]
    pub command: SiteCommands,
}

#[derive(Subcommand, Debug)]
pub enum SiteCommands {
    /// Find a site by name in the space
    Lookup {
        /// Site name
        name: String,
    },
}

#[derive(Args, Debug)]
pub struct ClusterBlueprintArgs {
    #[command(subcommand)]
    pub command: ClusterBlueprintCommands,
}

#[derive(Subcommand, Debug)]
pub enum ClusterBlueprintCommands {
    /// Find a cluster blueprint by name on a site
    Lookup {
        /// Blueprint name
        name: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
    },
}

#[derive(Args, Debug)]
pub struct ClusterProviderArgs {
    #[command(subcommand)]
    pub command: ClusterProviderCommands,
}

#[derive(Subcommand, Debug)]
pub enum ClusterProviderCommands {
    /// Find a cluster provider by name on a site
    Lookup {
        /// Provider name
        name: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
    },
}

#[derive(Debug, Serialize)]
pub struct SiteOutput {
    pub id: String,
    pub name: String,
    pub space_id: String,
}

impl From<&Site> for SiteOutput {
    fn from(site: &Site) -> Self {
        Self {
            id: site.id.clone(),
            name: site.name.clone(),
            space_id: site.space_id.clone(),
        }
    }
}

impl CommandOutput for SiteOutput {
    fn to_human(&self) -> String {
        format!("Site: {}\nID: {}\nSpace: {}", self.name, self.id, self.space_id)
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterBlueprintOutput {
    pub id: String,
    pub name: String,
    pub k8s_version: Option<String>,
    pub provider: Option<String>,
    pub default_storage_class: Option<String>,
    pub machine_sets: usize,
}

impl From<&ClusterBlueprint> for ClusterBlueprintOutput {
    fn from(bp: &ClusterBlueprint) -> Self {
        Self {
            id: bp.id.clone(),
            name: bp.name.clone(),
            k8s_version: bp.k8s_version.clone(),
            provider: bp.cluster_provider.clone(),
            default_storage_class: bp.default_storage_class.clone(),
            machine_sets: bp.machine_sets.len(),
        }
    }
}

impl CommandOutput for ClusterBlueprintOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Cluster blueprint: {}", self.name),
            format!("ID: {}", self.id),
        ];
        if let Some(version) = &self.k8s_version {
            lines.push(format!("Kubernetes: {version}"));
        }
        if let Some(provider) = &self.provider {
            lines.push(format!("Provider: {provider}"));
        }
        if let Some(class) = &self.default_storage_class {
            lines.push(format!("Default storage class: {class}"));
        }
        lines.push(format!("Machine sets: {}", self.machine_sets));
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterProviderOutput {
    pub id: String,
    pub name: String,
    pub state: Option<String>,
    pub health: Option<String>,
    pub kubernetes_versions: Vec<String>,
    pub storage_classes: Vec<String>,
}

impl From<&ClusterProvider> for ClusterProviderOutput {
    fn from(provider: &ClusterProvider) -> Self {
        Self {
            id: provider.id.clone(),
            name: provider.name.clone(),
            state: provider.state.clone(),
            health: provider.health.clone(),
            kubernetes_versions: provider.kubernetes_versions.clone(),
            storage_classes: provider.storage_classes.clone(),
        }
    }
}

impl CommandOutput for ClusterProviderOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![format!("Cluster provider: {}", self.name), format!("ID: {}", self.id)];
        if let Some(state) = &self.state {
            lines.push(format!("State: {state}"));
        }
        if let Some(health) = &self.health {
            lines.push(format!("Health: {health}"));
        }
        if !self.kubernetes_versions.is_empty() {
            lines.push(format!("Kubernetes versions: {}", self.kubernetes_versions.join(", ")));
        }
        if !self.storage_classes.is_empty() {
            lines.push(format!("Storage classes: {}", self.storage_classes.join(", ")));
        }
        lines.join("\n")
    }
}

pub async fn execute_site(args: SiteArgs, ctx: &AppContext) -> Result<()> {
    let service = ctx.cluster_service(None)?;
    match args.command {
        SiteCommands::Lookup { name } => {
            let site = service.find_site(&ctx.space_id()?, &name).await?;
            output(&SiteOutput::from(&site), ctx.json());
        }
    }
    Ok(())
}

pub async fn execute_cluster_blueprint(args: ClusterBlueprintArgs, ctx: &AppContext) -> Result<()> {
    let service = ctx.cluster_service(None)?;
    match args.command {
        ClusterBlueprintCommands::Lookup { name, site_id } => {
            let blueprint = service.find_cluster_blueprint(&site_id, &name).await?;
            output(&ClusterBlueprintOutput::from(&blueprint), ctx.json());
        }
    }
    Ok(())
}

pub async fn execute_cluster_provider(args: ClusterProviderArgs, ctx: &AppContext) -> Result<()> {
    let service = ctx.cluster_service(None)?;
    match args.command {
        ClusterProviderCommands::Lookup { name, site_id } => {
            let provider = service.find_cluster_provider(&site_id, &name).await?;
            output(&ClusterProviderOutput::from(&provider), ctx.json());
        }
    }
    Ok(())
}

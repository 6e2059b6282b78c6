//! Cluster CLI commands.

use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, Subcommand, ValueEnum};
use futures::future::join_all;
use serde::Serialize;

use crate::cli::context::AppContext;
use crate::cli::output::{create_spinner, list_table, output, render_list, truncate, CommandOutput, SpinnerGroup};
use crate::domain::models::{Cluster, ConvergencePlan, CreateCluster, MachineSet, ResourceRef, StateSet};
use crate::infrastructure::config::MAX_TIMEOUT_SECS;
use crate::services::ConvergenceReport;

#[derive(Args, Debug)]
pub struct ClusterArgs {
    #[command(subcommand)]
    pub command: ClusterCommands,
}

#[derive(Subcommand, Debug)]
pub enum ClusterCommands {
    /// Create a cluster and wait until it is ready
    Create {
        /// Cluster name
        name: String,
        /// Cluster blueprint id
        #[arg(long)]
        blueprint_id: String,
        /// Site (appliance) id
        #[arg(long)]
        site_id: String,
        /// Extra worker pool as NAME:MACHINE_BLUEPRINT_ID[:COUNT] (repeatable)
        #[arg(long = "worker", value_parser = parse_pool)]
        workers: Vec<MachineSet>,
        /// Give up waiting after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
        timeout: Option<u64>,
    },
    /// Show cluster details
    Show {
        /// Cluster id
        id: String,
    },
    /// List clusters in the space
    List,
    /// Find a cluster by name in the space
    Lookup {
        /// Cluster name
        name: String,
        /// Also fetch the cluster's kubeconfig
        #[arg(long)]
        kubeconfig: bool,
    },
    /// Delete clusters and wait until they are gone
    Delete {
        /// Cluster ids; several are deleted concurrently
        #[arg(required = true)]
        ids: Vec<String>,
        /// Give up waiting after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
        timeout: Option<u64>,
    },
    /// Wait for a cluster to reach a state without changing it
    Wait {
        /// Cluster id
        id: String,
        /// State to wait for
        #[arg(long, value_enum, default_value_t = WaitTarget::Ready)]
        target: WaitTarget,
        /// Give up waiting after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
        timeout: Option<u64>,
    },
    /// Add or resize worker pools
    AddWorker {
        /// Cluster id
        id: String,
        /// Worker pool as NAME:MACHINE_BLUEPRINT_ID[:COUNT] (repeatable)
        #[arg(long = "pool", value_parser = parse_pool, required = true)]
        pools: Vec<MachineSet>,
        /// Give up waiting after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
        timeout: Option<u64>,
    },
    /// Remove a worker pool
    RemoveWorker {
        /// Cluster id
        id: String,
        /// Worker pool name
        name: String,
        /// Give up waiting after this many seconds
        #[arg(long, value_parser = clap::value_parser!(u64).range(1..=MAX_TIMEOUT_SECS))]
        timeout: Option<u64>,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    Ready,
    Deleted,
}

impl WaitTarget {
    fn states(self) -> StateSet {
        match self {
            Self::Ready => StateSet::ready(),
            Self::Deleted => StateSet::deleted(),
        }
    }
}

/// Parse `NAME:MACHINE_BLUEPRINT_ID[:COUNT]`
pub fn parse_pool(raw: &str) -> Result<MachineSet, String> {
    let parts: Vec<&str> = raw.split(':').collect();
    let (name, blueprint, count) = match parts.as_slice() {
        [name, blueprint] => (*name, *blueprint, 1),
        [name, blueprint, count] => {
            let count = count
                .parse::<u32>()
                .map_err(|_| format!("invalid count '{count}' in '{raw}'"))?;
            (*name, *blueprint, count)
        }
        _ => return Err(format!("expected NAME:MACHINE_BLUEPRINT_ID[:COUNT], got '{raw}'")),
    };
    if name.is_empty() || blueprint.is_empty() {
        return Err(format!("pool name and machine blueprint id must not be empty in '{raw}'"));
    }
    Ok(MachineSet {
        name: name.to_string(),
        machine_blueprint_id: blueprint.to_string(),
        count,
        os_image: None,
        os_version: None,
    })
}

#[derive(Debug, Serialize)]
pub struct PoolOutput {
    pub name: String,
    pub machine_blueprint_id: String,
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct ClusterOutput {
    pub id: String,
    pub name: String,
    pub state: String,
    pub health: Option<String>,
    pub k8s_version: Option<String>,
    pub site: String,
    pub space_id: String,
    pub api_endpoint: Option<String>,
    pub worker_pools: Vec<PoolOutput>,
}

impl From<&Cluster> for ClusterOutput {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.id.clone(),
            name: cluster.name.clone(),
            state: cluster.state.to_string(),
            health: cluster.health.clone(),
            k8s_version: cluster.k8s_version.clone(),
            site: cluster
                .appliance_name
                .clone()
                .unwrap_or_else(|| cluster.appliance_id.clone()),
            space_id: cluster.space_id.clone(),
            api_endpoint: cluster.api_endpoint.clone(),
            worker_pools: cluster
                .machine_sets
                .iter()
                .map(|ms| PoolOutput {
                    name: ms.name.clone(),
                    machine_blueprint_id: ms.machine_blueprint_id.clone(),
                    count: ms.count,
                })
                .collect(),
        }
    }
}

impl CommandOutput for ClusterOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![
            format!("Cluster: {}", self.name),
            format!("ID: {}", self.id),
            format!("State: {}", self.state),
            format!("Site: {}", self.site),
            format!("Space: {}", self.space_id),
        ];
        if let Some(health) = &self.health {
            lines.push(format!("Health: {health}"));
        }
        if let Some(version) = &self.k8s_version {
            lines.push(format!("Kubernetes: {version}"));
        }
        if let Some(endpoint) = &self.api_endpoint {
            lines.push(format!("API endpoint: {endpoint}"));
        }
        if !self.worker_pools.is_empty() {
            lines.push("\nWorker pools:".to_string());
            for pool in &self.worker_pools {
                lines.push(format!("  - {} x{} ({})", pool.name, pool.count, pool.machine_blueprint_id));
            }
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterLookupOutput {
    #[serde(flatten)]
    pub cluster: ClusterOutput,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kubeconfig: Option<String>,
}

impl CommandOutput for ClusterLookupOutput {
    fn to_human(&self) -> String {
        match &self.kubeconfig {
            Some(kubeconfig) => format!("{}\n\nKubeconfig:\n{}", self.cluster.to_human(), kubeconfig.trim_end()),
            None => self.cluster.to_human(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ClusterListOutput {
    pub clusters: Vec<ClusterOutput>,
    pub total: usize,
}

impl CommandOutput for ClusterListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "name", "state", "site", "pools"]);
        for cluster in &self.clusters {
            table.add_row(vec![
                cluster.id.clone(),
                truncate(&cluster.name, 32),
                cluster.state.clone(),
                truncate(&cluster.site, 24),
                cluster.worker_pools.len().to_string(),
            ]);
        }
        render_list("cluster", &table, self.total)
    }
}

#[derive(Debug, Serialize)]
pub struct ConvergenceOutput {
    pub id: String,
    pub state: String,
    pub polls: u32,
    pub elapsed_secs: u64,
}

impl ConvergenceOutput {
    fn new(resource: &ResourceRef, report: &ConvergenceReport) -> Self {
        Self {
            id: resource.id.clone(),
            state: report.state.to_string(),
            polls: report.polls,
            elapsed_secs: report.elapsed.as_secs(),
        }
    }
}

impl CommandOutput for ConvergenceOutput {
    fn to_human(&self) -> String {
        format!(
            "Cluster {} is {} ({} polls, {}s)",
            self.id, self.state, self.polls, self.elapsed_secs
        )
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteOutput {
    pub deleted: Vec<ConvergenceOutput>,
}

impl CommandOutput for DeleteOutput {
    fn to_human(&self) -> String {
        self.deleted
            .iter()
            .map(|d| format!("Cluster {} deleted ({}s)", d.id, d.elapsed_secs))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn execute(args: ClusterArgs, ctx: &AppContext) -> Result<()> {
    let space_id = ctx.space_id()?;

    match args.command {
        ClusterCommands::Create {
            name,
            blueprint_id,
            site_id,
            workers,
            timeout,
        } => {
            let service = ctx.cluster_service(timeout)?;
            let request = CreateCluster {
                name: name.clone(),
                cluster_blueprint_id: blueprint_id,
                appliance_id: site_id,
                space_id,
                machine_sets: workers,
            };

            let spinner = create_spinner(format!("Creating cluster {name}"), ctx.json());
            let result = service.create(&request, ctx.cancel()).await;
            spinner.finish_and_clear();

            let cluster = result.with_context(|| format!("Failed to create cluster {name}"))?;
            output(&ClusterOutput::from(&cluster), ctx.json());
        }

        ClusterCommands::Show { id } => {
            let service = ctx.cluster_service(None)?;
            let cluster = service.read(&ResourceRef::new(id, space_id)).await?;
            output(&ClusterOutput::from(&cluster), ctx.json());
        }

        ClusterCommands::List => {
            let service = ctx.cluster_service(None)?;
            let clusters = service.list(&space_id).await?;
            let out = ClusterListOutput {
                total: clusters.len(),
                clusters: clusters.iter().map(ClusterOutput::from).collect(),
            };
            output(&out, ctx.json());
        }

        ClusterCommands::Lookup { name, kubeconfig } => {
            let service = ctx.cluster_service(None)?;
            let cluster = service.find_cluster(&space_id, &name).await?;
            let kubeconfig = if kubeconfig {
                Some(service.kubeconfig(&ResourceRef::new(cluster.id.clone(), space_id)).await?)
            } else {
                None
            };
            let out = ClusterLookupOutput {
                cluster: ClusterOutput::from(&cluster),
                kubeconfig,
            };
            output(&out, ctx.json());
        }

        ClusterCommands::Delete { ids, timeout } => {
            let service = ctx.cluster_service(timeout)?;
            let spinners = SpinnerGroup::new(ctx.json());

            let service = &service;
            let spinners = &spinners;
            let space_id = &space_id;
            let runs = ids.into_iter().map(move |id| {
                let resource = ResourceRef::new(id, space_id.clone());
                let spinner = spinners.add(format!("Deleting cluster {}", resource.id));
                async move {
                    let result = service.delete(&resource, ctx.cancel()).await;
                    match &result {
                        Ok(_) => spinner.finish_with_message(format!("Cluster {} deleted", resource.id)),
                        Err(err) => spinner.abandon_with_message(format!("Cluster {}: {err}", resource.id)),
                    }
                    (resource, result)
                }
            });
            let outcomes = join_all(runs).await;

            let total = outcomes.len();
            let mut deleted = Vec::new();
            let mut failures = Vec::new();
            for (resource, result) in outcomes {
                match result {
                    Ok(report) => deleted.push(ConvergenceOutput::new(&resource, &report)),
                    Err(err) => failures.push((resource, err)),
                }
            }

            let failed = failures.len();
            let failed_ids: Vec<&str> = failures.iter().map(|(r, _)| r.id.as_str()).collect();
            let summary = format!("{failed} of {total} deletions failed: {}", failed_ids.join(", "));
            // The first failure keeps its type so the exit code reflects it
            if let Some((_, first)) = failures.into_iter().next() {
                return Err(anyhow::Error::new(first).context(summary));
            }
            output(&DeleteOutput { deleted }, ctx.json());
        }

        ClusterCommands::Wait { id, target, timeout } => {
            let service = ctx.cluster_service(timeout)?;
            let polling = service.polling();
            let deadline = Duration::from_secs(match target {
                WaitTarget::Ready => polling.update_timeout_secs,
                WaitTarget::Deleted => polling.delete_timeout_secs,
            });
            let plan = ConvergencePlan::new(target.states(), Duration::ZERO, polling.interval(), deadline);
            let resource = ResourceRef::new(id, space_id);

            let spinner = create_spinner(format!("Waiting for cluster {} to be {}", resource.id, plan.targets), ctx.json());
            let result = service.converge(&resource, &plan, ctx.cancel()).await;
            spinner.finish_and_clear();

            let report = result?;
            output(&ConvergenceOutput::new(&resource, &report), ctx.json());
        }

        ClusterCommands::AddWorker { id, pools, timeout } => {
            let service = ctx.cluster_service(timeout)?;
            let resource = ResourceRef::new(id, space_id);

            let spinner = create_spinner(format!("Updating worker pools of {}", resource.id), ctx.json());
            let result = service.update_worker_nodes(&resource, pools, ctx.cancel()).await;
            spinner.finish_and_clear();

            output(&ClusterOutput::from(&result?), ctx.json());
        }

        ClusterCommands::RemoveWorker { id, name, timeout } => {
            let service = ctx.cluster_service(timeout)?;
            let resource = ResourceRef::new(id, space_id);

            let spinner = create_spinner(format!("Removing worker pool {name} from {}", resource.id), ctx.json());
            let result = service.remove_worker_node(&resource, &name, ctx.cancel()).await;
            spinner.finish_and_clear();

            output(&ClusterOutput::from(&result?), ctx.json());
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pool_default_count() {
        let pool = parse_pool("workers:mb-1").unwrap();
        assert_eq!(pool.name, "workers");
        assert_eq!(pool.machine_blueprint_id, "mb-1");
        assert_eq!(pool.count, 1);
    }

    #[test]
    fn test_parse_pool_with_count() {
        assert_eq!(parse_pool("gpu:mb-2:4").unwrap().count, 4);
    }

    #[test]
    fn test_parse_pool_rejects_bad_input() {
        assert!(parse_pool("only-name").is_err());
        assert!(parse_pool("a:b:many").is_err());
        assert!(parse_pool(":mb-1").is_err());
    }

    #[test]
    fn test_wait_target_states() {
        assert_eq!(WaitTarget::Deleted.states(), StateSet::deleted());
        assert_eq!(WaitTarget::Ready.states(), StateSet::ready());
    }
}

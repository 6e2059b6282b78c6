//! Command-line interface for `caasctl`

pub mod commands;
pub mod context;
pub mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use console::style;
use serde_json::json;

pub use context::AppContext;

use crate::domain::errors::{ConvergeError, OperationError};
use commands::blueprint::MachineBlueprintArgs;
use commands::cluster::ClusterArgs;
use commands::config::ConfigArgs;
use commands::lookup::{ClusterBlueprintArgs, ClusterProviderArgs, SiteArgs};

/// Exit code when a convergence run hit its deadline
pub const EXIT_TIMEOUT: i32 = 2;
/// Exit code when the user interrupted a run
pub const EXIT_CANCELLED: i32 = 130;

#[derive(Parser, Debug)]
#[command(name = "caasctl", version, about = "Drive managed Kubernetes clusters to their desired state")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Configuration file (defaults to .caas/config.yaml plus overrides)
    #[arg(short, long, global = true, env = "CAAS_CONFIG")]
    pub config: Option<PathBuf>,

    /// Space to operate in, overriding the configured one
    #[arg(long, global = true)]
    pub space_id: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Cluster lifecycle commands
    Cluster(ClusterArgs),
    /// Machine blueprint commands
    MachineBlueprint(MachineBlueprintArgs),
    /// Site lookups
    Site(SiteArgs),
    /// Cluster blueprint lookups
    ClusterBlueprint(ClusterBlueprintArgs),
    /// Cluster provider lookups
    ClusterProvider(ClusterProviderArgs),
    /// Configuration file management
    Config(ConfigArgs),
}

/// Process exit code for a failed command
pub fn exit_code(err: &anyhow::Error) -> i32 {
    let converge = err.chain().find_map(|cause| {
        cause
            .downcast_ref::<OperationError>()
            .and_then(OperationError::convergence)
            .or_else(|| cause.downcast_ref::<ConvergeError>())
    });
    match converge {
        Some(e) if e.is_timeout() => EXIT_TIMEOUT,
        Some(e) if e.is_cancelled() => EXIT_CANCELLED,
        _ => 1,
    }
}

/// Print the error and exit with its code
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    let code = exit_code(&err);
    if json_mode {
        let causes: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = json!({
            "success": false,
            "error": err.to_string(),
            "causes": causes,
            "exit_code": code,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
        if code == EXIT_TIMEOUT {
            eprintln!("The operation was accepted; re-run `caasctl cluster wait` to keep waiting.");
        }
    }
    std::process::exit(code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::ResourceRef;
    use std::time::Duration;

    #[test]
    fn test_exit_code_for_timeout() {
        let err = anyhow::Error::new(OperationError::Convergence {
            resource: ResourceRef::new("c1", "s1"),
            source: ConvergeError::Timeout {
                elapsed: Duration::from_secs(60),
                targets: "{ready}".to_string(),
                last_state: None,
            },
        })
        .context("cluster create failed");
        assert_eq!(exit_code(&err), EXIT_TIMEOUT);
    }

    #[test]
    fn test_exit_code_for_cancel() {
        let err = anyhow::Error::new(ConvergeError::Cancelled);
        assert_eq!(exit_code(&err), EXIT_CANCELLED);
    }

    #[test]
    fn test_exit_code_default() {
        assert_eq!(exit_code(&anyhow::anyhow!("boom")), 1);
    }
}

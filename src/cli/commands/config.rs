//! `caasctl config`: write and inspect the configuration file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use console::style;

use crate::domain::models::Config;
use crate::infrastructure::config::{ConfigLoader, PROJECT_CONFIG};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective configuration, secrets redacted
    Show,
}

const REDACTED: &str = "********";

/// Blank out credentials before printing
pub fn redact(mut config: Config) -> Config {
    if config.auth.token.is_some() {
        config.auth.token = Some(REDACTED.to_string());
    }
    if config.auth.client_secret.is_some() {
        config.auth.client_secret = Some(REDACTED.to_string());
    }
    config
}

/// Write the default configuration to `path`, creating parent directories
pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite it",
            path.display()
        );
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let contents = ConfigLoader::render_default()?;
    fs::write(path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

/// Runs before any configuration is loaded, so `init` works in an empty directory.
pub fn execute(args: ConfigArgs, config_path: Option<&Path>, json: bool) -> Result<()> {
    match args.command {
        ConfigCommands::Init { force } => {
            let path = config_path.map_or_else(|| PathBuf::from(PROJECT_CONFIG), Path::to_path_buf);
            init_config(&path, force)?;
            if json {
                println!(
                    "{}",
                    serde_json::json!({ "success": true, "path": path.display().to_string() })
                );
            } else {
                println!("{} {}", style("Wrote").green(), path.display());
            }
        }
        ConfigCommands::Show => {
            let config = match config_path {
                Some(path) => ConfigLoader::load_from_file(path)?,
                None => ConfigLoader::load()?,
            };
            let config = redact(config);
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                print!("{}", serde_yaml::to_string(&config)?);
            }
        }
    }
    Ok(())
}

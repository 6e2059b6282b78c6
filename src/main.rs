//! caasctl entry point.

use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use caas_controller::cli::commands::{blueprint, cluster, config, lookup};
use caas_controller::cli::{handle_error, AppContext, Cli, Commands};
use caas_controller::infrastructure::config::ConfigLoader;
use caas_controller::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let json = cli.json;

    // `config init` must work before a valid configuration exists
    let command = match cli.command {
        Commands::Config(args) => {
            if let Err(err) = config::execute(args, cli.config.as_deref(), json) {
                handle_error(err, json);
            }
            return;
        }
        other => other,
    };

    let loaded = match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => ConfigLoader::load(),
    };
    let app_config = match loaded {
        Ok(c) => c,
        Err(err) => handle_error(err, json),
    };

    let _logger = match LoggerImpl::init(&LogConfig::from(&app_config.logging)) {
        Ok(logger) => logger,
        Err(err) => handle_error(err, json),
    };

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let ctx = AppContext::new(app_config, cli.space_id, json, cancel);

    let result = match command {
        Commands::Cluster(args) => cluster::execute(args, &ctx).await,
        Commands::MachineBlueprint(args) => blueprint::execute(args, &ctx).await,
        Commands::Site(args) => lookup::execute_site(args, &ctx).await,
        Commands::ClusterBlueprint(args) => lookup::execute_cluster_blueprint(args, &ctx).await,
        Commands::ClusterProvider(args) => lookup::execute_cluster_provider(args, &ctx).await,
        Commands::Config(_) => Ok(()),
    };

    if let Err(err) = result {
        handle_error(err, json);
    }
}

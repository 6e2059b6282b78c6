//! Per-invocation wiring: configuration, adapters and the cancellation token

use std::sync::Arc;

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::domain::models::{Config, PollingConfig};
use crate::domain::ports::{ControlPlaneClient, CredentialProvider};
use crate::infrastructure::caas::{CaasClient, CaasClientConfig};
use crate::infrastructure::config::ConfigLoader;
use crate::infrastructure::credentials::provider_from_config;
use crate::services::{ClusterService, MachineBlueprintService};

/// Everything a command needs besides its own arguments
pub struct AppContext {
    config: Config,
    space_override: Option<String>,
    json: bool,
    cancel: CancellationToken,
}

impl AppContext {
    pub fn new(config: Config, space_override: Option<String>, json: bool, cancel: CancellationToken) -> Self {
        Self {
            config,
            space_override,
            json,
            cancel,
        }
    }

    pub const fn json(&self) -> bool {
        self.json
    }

    pub const fn config(&self) -> &Config {
        &self.config
    }

    /// Cancelled on Ctrl-C
    pub const fn cancel(&self) -> &CancellationToken {
        &self.cancel
    }

    /// `--space-id`, falling back to the configured space
    pub fn space_id(&self) -> Result<String> {
        self.space_override
            .clone()
            .or_else(|| self.config.space_id.clone())
            .context("no space id: pass --space-id or set space_id (CAAS_SPACE_ID)")
    }

    fn client(&self) -> Result<Arc<dyn ControlPlaneClient>> {
        let client = CaasClient::new(CaasClientConfig::from(&self.config)).context("Failed to build control-plane client")?;
        Ok(Arc::new(client))
    }

    fn credentials(&self) -> Result<Arc<dyn CredentialProvider>> {
        provider_from_config(&self.config.auth, &self.config.http).context("Failed to set up credentials")
    }

    /// Cluster service; `timeout_secs` replaces every configured deadline
    ///
    /// The override is held to the same rules as configured timeouts.
    pub fn cluster_service(&self, timeout_secs: Option<u64>) -> Result<ClusterService> {
        let polling = self.polling_with_timeout(timeout_secs)?;
        Ok(ClusterService::new(self.client()?, self.credentials()?, polling))
    }

    fn polling_with_timeout(&self, timeout_secs: Option<u64>) -> Result<PollingConfig> {
        let Some(secs) = timeout_secs else {
            return Ok(self.config.polling.clone());
        };

        let mut config = self.config.clone();
        config.polling.create_timeout_secs = secs;
        config.polling.update_timeout_secs = secs;
        config.polling.delete_timeout_secs = secs;
        ConfigLoader::validate(&config).context("Invalid --timeout")?;
        Ok(config.polling)
    }

    pub fn blueprint_service(&self) -> Result<MachineBlueprintService> {
        Ok(MachineBlueprintService::new(self.client()?, self.credentials()?))
    }
}

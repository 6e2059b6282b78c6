use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client as ReqwestClient, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::domain::errors::ClientError;
use crate::domain::models::{
    Cluster, ClusterBlueprint, ClusterProvider, Config, CreateCluster, CreateMachineBlueprint, MachineBlueprint,
    MachineSet, Site,
};
use crate::domain::ports::{AccessToken, ControlPlaneClient};

/// Configuration for the control-plane HTTP client
#[derive(Debug, Clone)]
pub struct CaasClientConfig {
    /// Base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
    pub user_agent: String,
}

impl From<&Config> for CaasClientConfig {
    fn from(config: &Config) -> Self {
        Self {
            base_url: config.api_url.clone(),
            timeout: Duration::from_secs(config.http.request_timeout_secs),
            user_agent: config.http.user_agent.clone(),
        }
    }
}

/// Collection envelope returned by list endpoints
#[derive(Debug, Deserialize)]
struct ItemList<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct KubeconfigBody {
    kubeconfig: String,
}

/// Error body returned by the control plane
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

/// reqwest implementation of [`ControlPlaneClient`].
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct CaasClient {
    http: ReqwestClient,
    base_url: String,
}

impl CaasClient {
    pub fn new(config: CaasClientConfig) -> Result<Self, ClientError> {
        let http = ReqwestClient::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent)
            .pool_max_idle_per_host(4)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    fn request(&self, method: Method, path: &str, token: &AccessToken) -> RequestBuilder {
        debug!(%method, path, "control-plane request");
        self.http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token.secret())
    }

    /// Turn a non-success response into [`ClientError::Status`].
    ///
    /// The message is taken from a `{"message": ...}` body when present,
    /// otherwise the raw body text is used.
    async fn check(response: Response) -> Result<Response, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.message)
            .unwrap_or(body);
        warn!(status = status.as_u16(), message = %message, "control plane rejected request");
        Err(ClientError::Status {
            status: status.as_u16(),
            message,
        })
    }

    async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, ClientError> {
        let response = Self::check(request.send().await?).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| ClientError::Decode(e.to_string()))
    }

    async fn send_empty(request: RequestBuilder) -> Result<(), ClientError> {
        Self::check(request.send().await?).await?;
        Ok(())
    }

    async fn list<T: DeserializeOwned>(request: RequestBuilder) -> Result<Vec<T>, ClientError> {
        let list: ItemList<T> = Self::send_json(request).await?;
        Ok(list.items)
    }
}

fn site_filter(site_id: &str) -> [(&'static str, String); 1] {
    [("field", format!("applianceID eq {site_id}"))]
}

#[async_trait]
impl ControlPlaneClient for CaasClient {
    #[instrument(skip(self, token))]
    async fn list_clusters(&self, token: &AccessToken, space_id: &str) -> Result<Vec<Cluster>, ClientError> {
        let request = self
            .request(Method::GET, "/v1/clusters", token)
            .query(&[("spaceID", space_id)]);
        Self::list(request).await
    }

    #[instrument(skip(self, token))]
    async fn get_cluster(&self, token: &AccessToken, id: &str, space_id: &str) -> Result<Cluster, ClientError> {
        let request = self
            .request(Method::GET, &format!("/v1/clusters/{id}"), token)
            .query(&[("spaceID", space_id)]);
        Self::send_json(request).await
    }

    #[instrument(skip_all, fields(name = %request.name))]
    async fn create_cluster(&self, token: &AccessToken, request: &CreateCluster) -> Result<Cluster, ClientError> {
        let builder = self.request(Method::POST, "/v1/clusters", token).json(request);
        Self::send_json(builder).await
    }

    #[instrument(skip(self, token))]
    async fn delete_cluster(&self, token: &AccessToken, id: &str) -> Result<(), ClientError> {
        Self::send_empty(self.request(Method::DELETE, &format!("/v1/clusters/{id}"), token)).await
    }

    #[instrument(skip(self, token))]
    async fn get_kubeconfig(&self, token: &AccessToken, id: &str) -> Result<String, ClientError> {
        let request = self.request(Method::GET, &format!("/v1/clusters/{id}/kubeconfig"), token);
        let body: KubeconfigBody = Self::send_json(request).await?;
        Ok(body.kubeconfig)
    }

    #[instrument(skip(self, token, machine_sets), fields(pools = machine_sets.len()))]
    async fn update_machine_sets(
        &self,
        token: &AccessToken,
        id: &str,
        space_id: &str,
        machine_sets: &[MachineSet],
    ) -> Result<(), ClientError> {
        let request = self
            .request(Method::PUT, &format!("/v1/clusters/{id}/machinesets"), token)
            .query(&[("spaceID", space_id)])
            .json(machine_sets);
        Self::send_empty(request).await
    }

    #[instrument(skip(self, token))]
    async fn list_sites(&self, token: &AccessToken, space_id: &str) -> Result<Vec<Site>, ClientError> {
        let request = self
            .request(Method::GET, "/v1/appliances", token)
            .query(&[("spaceID", space_id)]);
        Self::list(request).await
    }

    #[instrument(skip(self, token))]
    async fn list_cluster_blueprints(
        &self,
        token: &AccessToken,
        site_id: &str,
    ) -> Result<Vec<ClusterBlueprint>, ClientError> {
        let request = self
            .request(Method::GET, "/v1/clusterblueprints", token)
            .query(&site_filter(site_id));
        Self::list(request).await
    }

    #[instrument(skip(self, token))]
    async fn list_cluster_providers(
        &self,
        token: &AccessToken,
        site_id: &str,
    ) -> Result<Vec<ClusterProvider>, ClientError> {
        let request = self.request(Method::GET, &format!("/v1/appliances/{site_id}/clusterproviders"), token);
        Self::list(request).await
    }

    #[instrument(skip(self, token))]
    async fn list_machine_blueprints(
        &self,
        token: &AccessToken,
        site_id: &str,
    ) -> Result<Vec<MachineBlueprint>, ClientError> {
        let request = self
            .request(Method::GET, "/v1/machineblueprints", token)
            .query(&site_filter(site_id));
        Self::list(request).await
    }

    #[instrument(skip(self, token))]
    async fn get_machine_blueprint(
        &self,
        token: &AccessToken,
        id: &str,
        site_id: &str,
    ) -> Result<MachineBlueprint, ClientError> {
        let request = self
            .request(Method::GET, &format!("/v1/machineblueprints/{id}"), token)
            .query(&site_filter(site_id));
        Self::send_json(request).await
    }

    #[instrument(skip_all, fields(name = %request.name))]
    async fn create_machine_blueprint(
        &self,
        token: &AccessToken,
        request: &CreateMachineBlueprint,
    ) -> Result<MachineBlueprint, ClientError> {
        let builder = self
            .request(Method::POST, "/v1/machineblueprints", token)
            .json(request);
        Self::send_json(builder).await
    }

    #[instrument(skip(self, token))]
    async fn delete_machine_blueprint(&self, token: &AccessToken, id: &str) -> Result<(), ClientError> {
        Self::send_empty(self.request(Method::DELETE, &format!("/v1/machineblueprints/{id}"), token)).await
    }
}

use std::time::Duration;

use async_trait::async_trait;
use backoff::ExponentialBackoff;
use chrono::{DateTime, Utc};
use reqwest::Client as ReqwestClient;
use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::domain::errors::{ClientError, CredentialError};
use crate::domain::ports::{AccessToken, CredentialProvider};
use crate::services::RetryClassifier;

/// Refresh this long before the token actually expires
const DEFAULT_EXPIRY_SKEW: Duration = Duration::from_secs(30);

/// Lifetime assumed when the token endpoint omits `expires_in`
const DEFAULT_LIFETIME_SECS: i64 = 300;

const MAX_LIFETIME_SECS: i64 = 24 * 60 * 60;

/// Give up retrying the token endpoint after this long
const DEFAULT_RETRY_WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    token: AccessToken,
    expires_at: DateTime<Utc>,
}

impl CachedToken {
    fn is_fresh(&self, now: DateTime<Utc>, skew: Duration) -> bool {
        let skew = chrono::Duration::from_std(skew).unwrap_or_else(|_| chrono::Duration::zero());
        now + skew < self.expires_at
    }
}

/// OAuth2 client-credentials token source.
///
/// Tokens are cached and refreshed shortly before they expire. The cache
/// lock is held across the refresh, so concurrent callers wait for one
/// request instead of each minting a token.
pub struct IdentityTokenProvider {
    http: ReqwestClient,
    token_url: String,
    client_id: String,
    client_secret: String,
    expiry_skew: Duration,
    retry_window: Duration,
    classifier: RetryClassifier,
    cache: Mutex<Option<CachedToken>>,
}

impl IdentityTokenProvider {
    pub fn new(
        token_url: String,
        client_id: String,
        client_secret: String,
        request_timeout: Duration,
    ) -> Result<Self, CredentialError> {
        let http = ReqwestClient::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| ClientError::Transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            token_url,
            client_id,
            client_secret,
            expiry_skew: DEFAULT_EXPIRY_SKEW,
            retry_window: DEFAULT_RETRY_WINDOW,
            classifier: RetryClassifier::default(),
            cache: Mutex::new(None),
        })
    }

    #[must_use]
    pub fn with_expiry_skew(mut self, skew: Duration) -> Self {
        self.expiry_skew = skew;
        self
    }

    /// Total time spent retrying transient token-endpoint failures
    #[must_use]
    pub fn with_retry_window(mut self, window: Duration) -> Self {
        self.retry_window = window;
        self
    }

    async fn fetch_once(&self) -> Result<CachedToken, CredentialError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
            ])
            .send()
            .await
            .map_err(ClientError::from)?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(ClientError::Status {
                status: status.as_u16(),
                message,
            }
            .into());
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| CredentialError::InvalidResponse(e.to_string()))?;
        if body.access_token.is_empty() {
            return Err(CredentialError::InvalidResponse("empty access_token".to_string()));
        }

        let lifetime = body
            .expires_in
            .unwrap_or(DEFAULT_LIFETIME_SECS)
            .clamp(0, MAX_LIFETIME_SECS);
        Ok(CachedToken {
            token: AccessToken::new(body.access_token),
            expires_at: Utc::now() + chrono::Duration::seconds(lifetime),
        })
    }

    async fn fetch_with_retry(&self) -> Result<CachedToken, CredentialError> {
        let policy = ExponentialBackoff {
            initial_interval: Duration::from_millis(200),
            max_interval: Duration::from_secs(5),
            max_elapsed_time: Some(self.retry_window),
            ..ExponentialBackoff::default()
        };

        backoff::future::retry(policy, move || async move {
            self.fetch_once().await.map_err(|err| {
                let transient =
                    matches!(&err, CredentialError::Request(client) if self.classifier.is_transient(client));
                if transient {
                    warn!(error = %err, "token request failed, retrying");
                    backoff::Error::transient(err)
                } else {
                    backoff::Error::permanent(err)
                }
            })
        })
        .await
    }
}

#[async_trait]
impl CredentialProvider for IdentityTokenProvider {
    async fn token(&self) -> Result<AccessToken, CredentialError> {
        let mut cache = self.cache.lock().await;
        if let Some(cached) = cache.as_ref() {
            if cached.is_fresh(Utc::now(), self.expiry_skew) {
                debug!("using cached access token");
                return Ok(cached.token.clone());
            }
        }

        let fresh = self.fetch_with_retry().await?;
        info!(expires_at = %fresh.expires_at, "obtained access token");
        let token = fresh.token.clone();
        *cache = Some(fresh);
        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cached(expires_in: i64) -> CachedToken {
        CachedToken {
            token: AccessToken::new("t"),
            expires_at: Utc::now() + chrono::Duration::seconds(expires_in),
        }
    }

    #[test]
    fn test_token_inside_skew_is_stale() {
        let now = Utc::now();
        assert!(cached(3600).is_fresh(now, DEFAULT_EXPIRY_SKEW));
        assert!(!cached(10).is_fresh(now, DEFAULT_EXPIRY_SKEW));
        assert!(!cached(-5).is_fresh(now, Duration::ZERO));
    }

    #[test]
    fn test_token_response_without_expiry() {
        let body: TokenResponse = serde_json::from_str(r#"{"access_token":"abc","token_type":"Bearer"}"#).unwrap();
        assert_eq!(body.access_token, "abc");
        assert!(body.expires_in.is_none());
    }
}

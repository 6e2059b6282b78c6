//! Credential providers
//!
//! - `StaticTokenProvider`: a pre-issued bearer token
//! - `IdentityTokenProvider`: OAuth2 client credentials with caching and refresh

pub mod identity;
pub mod static_token;

use std::sync::Arc;
use std::time::Duration;

pub use identity::IdentityTokenProvider;
pub use static_token::StaticTokenProvider;

use crate::domain::errors::CredentialError;
use crate::domain::models::{AuthConfig, HttpConfig};
use crate::domain::ports::CredentialProvider;

/// Build the provider the configuration asks for.
///
/// A static token wins over client credentials when both are present.
pub fn provider_from_config(
    auth: &AuthConfig,
    http: &HttpConfig,
) -> Result<Arc<dyn CredentialProvider>, CredentialError> {
    if let Some(token) = auth.token.as_deref().filter(|t| !t.is_empty()) {
        return Ok(Arc::new(StaticTokenProvider::new(token)));
    }

    match (&auth.token_url, &auth.client_id, &auth.client_secret) {
        (Some(url), Some(id), Some(secret)) => Ok(Arc::new(IdentityTokenProvider::new(
            url.clone(),
            id.clone(),
            secret.clone(),
            Duration::from_secs(http.request_timeout_secs),
        )?)),
        _ => Err(CredentialError::NotConfigured(
            "set auth.token (CAAS_AUTH__TOKEN) or auth.token_url, auth.client_id and auth.client_secret".to_string(),
        )),
    }
}

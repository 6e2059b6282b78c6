use std::fmt;

use async_trait::async_trait;

use crate::domain::errors::CredentialError;

/// Bearer token for the control-plane API.
///
/// `Debug` never prints the secret.
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `Authorization` header only
    pub fn secret(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// Supplies a possibly short-lived access token on demand.
///
/// Callers fetch a token before every remote call because tokens can expire
/// in the middle of a long convergence run. Implementations may cache, as
/// long as an expired token is never returned.
#[async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn token(&self) -> Result<AccessToken, CredentialError>;
}

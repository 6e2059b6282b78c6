use async_trait::async_trait;

use crate::domain::errors::CredentialError;
use crate::domain::ports::{AccessToken, CredentialProvider};

/// Hands out the same pre-issued token on every call
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(token),
        }
    }
}

#[async_trait]
impl CredentialProvider for StaticTokenProvider {
    async fn token(&self) -> Result<AccessToken, CredentialError> {
        Ok(self.token.clone())
    }
}

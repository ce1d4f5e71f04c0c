//! Password-based authentication against the application backend.

use crate::authenticator::Authenticator;
use crate::backend::BackendApi;
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use latch_vault::TokenStorage;
use std::sync::Arc;

/// Username/password sign-in backed by the application's own API.
pub struct BasicAuthenticator {
    backend: Arc<dyn BackendApi>,
    tokens: TokenStorage,
}

impl BasicAuthenticator {
    /// Create an authenticator over the given backend and token store.
    #[must_use]
    pub fn new(backend: Arc<dyn BackendApi>, tokens: TokenStorage) -> Self {
        Self { backend, tokens }
    }

    /// Sign in with a username and password.
    ///
    /// Nothing is written to the vault unless the backend accepts the
    /// credentials and returns a token.
    pub async fn login(&self, username: &str, password: &str) -> Result<()> {
        let payload = self.backend.login(username, password).await?;
        if !payload.success {
            return Err(AuthError::AuthenticationFailed {
                message: "invalid credentials".to_string(),
            });
        }
        let Some(token) = payload.token else {
            return Err(AuthError::AuthenticationFailed {
                message: "backend accepted login without issuing a token".to_string(),
            });
        };

        self.tokens.set_access_token(&token, None).await?;
        tracing::info!("Basic login succeeded for {username}");
        Ok(())
    }
}

#[async_trait]
impl Authenticator for BasicAuthenticator {
    /// End the session.
    ///
    /// The backend call is best-effort; local tokens are cleared whether or
    /// not it succeeds, so the user is never stuck signed in.
    async fn logout(&self) -> Result<()> {
        if let Err(e) = self.backend.logout().await {
            tracing::warn!("Backend logout failed, clearing local session anyway: {e}");
        }
        self.tokens.clear().await?;
        Ok(())
    }

    async fn get_access_token(&self) -> Result<Option<String>> {
        Ok(self.tokens.get_access_token(None).await?)
    }

    async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.get_access_token().await?.is_some())
    }
}

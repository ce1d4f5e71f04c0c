//! Typed token access over the vault.
//!
//! Authenticators never touch raw vault keys; this facade owns the key
//! naming scheme and the JSON shapes stored under each key.

use crate::engine::VaultEngine;
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

const ACCESS_TOKEN_KEY_PREFIX: &str = "AccessToken";
const AUTH_RESPONSE_KEY: &str = "AuthResponse";
const ID_TOKEN_KEY: &str = "IdToken";
const REFRESH_TOKEN_KEY: &str = "RefreshToken";
const SESSION_KEY: &str = "auth-result";

/// Session-token store backed by a [`VaultEngine`].
#[derive(Clone)]
pub struct TokenStorage {
    vault: Arc<dyn VaultEngine>,
}

impl TokenStorage {
    /// Wrap a vault engine.
    #[must_use]
    pub fn new(vault: Arc<dyn VaultEngine>) -> Self {
        Self { vault }
    }

    /// The underlying vault engine.
    #[must_use]
    pub fn vault(&self) -> &Arc<dyn VaultEngine> {
        &self.vault
    }

    fn access_token_key(name: Option<&str>) -> String {
        format!("{ACCESS_TOKEN_KEY_PREFIX}{}", name.unwrap_or_default())
    }

    /// Get the access token, optionally scoped to an audience name.
    pub async fn get_access_token(&self, name: Option<&str>) -> Result<Option<String>> {
        self.get_string(&Self::access_token_key(name)).await
    }

    /// Store the access token, optionally scoped to an audience name.
    pub async fn set_access_token(&self, token: &str, name: Option<&str>) -> Result<()> {
        self.vault
            .set_value(&Self::access_token_key(name), token.into())
            .await
    }

    /// Get the ID token.
    pub async fn get_id_token(&self) -> Result<Option<String>> {
        self.get_string(ID_TOKEN_KEY).await
    }

    /// Store the ID token.
    pub async fn set_id_token(&self, token: &str) -> Result<()> {
        self.vault.set_value(ID_TOKEN_KEY, token.into()).await
    }

    /// Get the refresh token.
    pub async fn get_refresh_token(&self) -> Result<Option<String>> {
        self.get_string(REFRESH_TOKEN_KEY).await
    }

    /// Store the refresh token.
    pub async fn set_refresh_token(&self, token: &str) -> Result<()> {
        self.vault.set_value(REFRESH_TOKEN_KEY, token.into()).await
    }

    /// Get the raw auth response payload.
    pub async fn get_auth_response(&self) -> Result<Option<serde_json::Value>> {
        self.vault.get_value(AUTH_RESPONSE_KEY).await
    }

    /// Store the raw auth response payload.
    pub async fn set_auth_response(&self, response: serde_json::Value) -> Result<()> {
        self.vault.set_value(AUTH_RESPONSE_KEY, response).await
    }

    /// Get the stored session blob, deserialized as `T`.
    pub async fn get_session<T: DeserializeOwned>(&self) -> Result<Option<T>> {
        match self.vault.get_value(SESSION_KEY).await? {
            Some(value) => Ok(Some(serde_json::from_value(value)?)),
            None => Ok(None),
        }
    }

    /// Store the session blob.
    pub async fn set_session<T: Serialize>(&self, session: &T) -> Result<()> {
        self.vault
            .set_value(SESSION_KEY, serde_json::to_value(session)?)
            .await
    }

    /// Remove the stored session blob.
    pub async fn remove_session(&self) -> Result<()> {
        self.vault.remove_value(SESSION_KEY).await
    }

    /// Remove all stored tokens and session state.
    pub async fn clear(&self) -> Result<()> {
        self.vault.clear().await
    }

    async fn get_string(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .vault
            .get_value(key)
            .await?
            .and_then(|v| v.as_str().map(ToString::to_string)))
    }
}

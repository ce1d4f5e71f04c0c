//! Application backend client for basic authentication.

use crate::error::{AuthError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Response of the backend login endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginPayload {
    /// Whether the credentials were accepted
    pub success: bool,
    /// Session token issued on success
    pub token: Option<String>,
}

/// The application backend used by password-based sign-in.
#[async_trait]
pub trait BackendApi: Send + Sync {
    /// Exchange credentials for a session token.
    async fn login(&self, username: &str, password: &str) -> Result<LoginPayload>;

    /// Invalidate the session server-side.
    async fn logout(&self) -> Result<()>;
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    username: &'a str,
    password: &'a str,
}

/// HTTP implementation of [`BackendApi`].
pub struct HttpBackendApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackendApi {
    /// Create a client for the backend at `base_url`.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_else(|_| status.to_string());
        Err(AuthError::Backend {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl BackendApi for HttpBackendApi {
    async fn login(&self, username: &str, password: &str) -> Result<LoginPayload> {
        let response = self
            .client
            .post(format!("{}/login", self.base_url))
            .json(&LoginRequest { username, password })
            .send()
            .await?;
        let payload = Self::check(response).await?.json().await?;
        Ok(payload)
    }

    async fn logout(&self) -> Result<()> {
        let response = self
            .client
            .post(format!("{}/logout", self.base_url))
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

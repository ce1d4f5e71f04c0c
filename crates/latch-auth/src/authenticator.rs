//! Shared authenticator contract and session shape.

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tokens returned by a completed sign-in flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthResult {
    /// Bearer token for API calls
    pub access_token: String,
    /// Token used to renew the session without user interaction
    pub refresh_token: Option<String>,
    /// OIDC identity token
    pub id_token: Option<String>,
    /// Access-token expiry, when the provider reports one
    pub expires_at: Option<DateTime<Utc>>,
}

impl AuthResult {
    /// Whether the access token is past its expiry.
    ///
    /// Sessions without a reported expiry never read as expired.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

/// Common surface of the sign-in strategies.
///
/// Sign-in itself is strategy-specific (basic takes credentials, OIDC takes
/// none) and lives on the concrete types; this trait covers everything the
/// session manager needs after a login has happened.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// End the session and clear stored tokens.
    async fn logout(&self) -> Result<()>;

    /// Current access token, if a valid session exists.
    async fn get_access_token(&self) -> Result<Option<String>>;

    /// Whether a valid session exists.
    async fn is_authenticated(&self) -> Result<bool>;
}

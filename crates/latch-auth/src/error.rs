//! Error types for the auth crate.

use thiserror::Error;

/// Errors that can occur during authentication.
#[derive(Error, Debug)]
pub enum AuthError {
    /// Credentials were rejected or the sign-in flow failed
    #[error("authentication failed: {message}")]
    AuthenticationFailed {
        /// Provider or backend supplied failure detail
        message: String,
    },

    /// A flow requiring credentials was started without them
    #[error("credentials required for basic authentication")]
    MissingCredentials,

    /// The application backend rejected the request
    #[error("backend returned {status}: {message}")]
    Backend {
        /// HTTP status code
        status: u16,
        /// Response body or status text
        message: String,
    },

    /// Network-level failure talking to the backend
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Vault failure while reading or writing session state
    #[error("vault error: {0}")]
    Vault(#[from] latch_vault::VaultError),

    /// Preference store failure
    #[error("preferences error: {0}")]
    Preferences(#[from] latch_core::PreferencesError),

    /// Serialization failure
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

/// OIDC flow failures surface to callers under the generic
/// `AuthenticationFailed`, keeping the error taxonomy uniform across the
/// sign-in strategies.
impl From<crate::oidc::OidcFlowError> for AuthError {
    fn from(e: crate::oidc::OidcFlowError) -> Self {
        Self::AuthenticationFailed { message: e.message }
    }
}

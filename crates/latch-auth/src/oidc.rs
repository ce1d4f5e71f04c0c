//! OIDC authentication across the hosted identity providers.
//!
//! One `OidcAuthenticator` instance serves all OIDC providers; switching
//! providers swaps the active [`ProviderOptions`] in place rather than
//! rebuilding the authenticator. The actual browser flow lives behind the
//! [`OidcEngine`] trait so platform bindings (and tests) can supply it.

use crate::authenticator::{AuthResult, Authenticator};
use crate::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use latch_core::{AuthProvider, Runtime};
use latch_vault::TokenStorage;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OnceCell, RwLock};

/// Azure AD B2C error code signalling the user chose "forgot password".
///
/// B2C reports this as a flow error; the expected reaction is to rerun the
/// login against the password-reset user flow.
pub const AZURE_PASSWORD_RESET_CODE: &str = "AADB2C90118";

/// Discovery URL of the Azure AD B2C password-reset user flow.
pub const AZURE_PASSWORD_RESET_DISCOVERY_URL: &str =
    "https://vikingsquad.b2clogin.com/vikingsquad.onmicrosoft.com/v2.0/.well-known/openid-configuration?p=B2C_1_password_reset";

/// Connection settings for one OIDC provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderOptions {
    /// OAuth client identifier
    pub client_id: String,
    /// OIDC discovery document URL
    pub discovery_url: String,
    /// Redirect URI completing the sign-in flow
    pub redirect_uri: String,
    /// URL completing the sign-out flow
    pub logout_url: String,
    /// Requested scopes, space separated
    pub scope: String,
    /// Token audience, empty when the provider takes none
    pub audience: String,
}

/// Auth0 connection settings.
#[must_use]
pub fn auth0_options(runtime: Runtime) -> ProviderOptions {
    let redirect = match runtime {
        Runtime::Device => "msauth://login",
        Runtime::Web => "http://localhost:8100/login",
    };
    ProviderOptions {
        client_id: "yLasZNUGkZ19DGEjTmAITBfGXzqbvd00".to_string(),
        discovery_url: "https://dev-2uspt-sz.us.auth0.com/.well-known/openid-configuration"
            .to_string(),
        redirect_uri: redirect.to_string(),
        logout_url: redirect.to_string(),
        scope: "openid email picture profile offline_access".to_string(),
        audience: "https://io.ionic.demo.ac".to_string(),
    }
}

/// AWS Cognito connection settings.
#[must_use]
pub fn cognito_options(runtime: Runtime) -> ProviderOptions {
    let redirect = match runtime {
        Runtime::Device => "msauth://login",
        Runtime::Web => "http://localhost:8100/login",
    };
    ProviderOptions {
        client_id: "64p9c53l5thd5dikra675suvq9".to_string(),
        discovery_url:
            "https://cognito-idp.us-east-2.amazonaws.com/us-east-2_YU8VQe29z/.well-known/openid-configuration"
                .to_string(),
        redirect_uri: redirect.to_string(),
        logout_url: redirect.to_string(),
        scope: "openid email profile".to_string(),
        audience: String::new(),
    }
}

/// Azure AD B2C connection settings.
#[must_use]
pub fn azure_options(runtime: Runtime) -> ProviderOptions {
    let (redirect, logout) = match runtime {
        Runtime::Device => ("myapp://callback", "myapp://callback?logout=true"),
        Runtime::Web => ("http://localhost:8100/login", "http://localhost:8100/login"),
    };
    ProviderOptions {
        client_id: "b69e2ee7-b67a-4e26-8a38-f7ca30d2e4d4".to_string(),
        discovery_url:
            "https://vikingsquad.b2clogin.com/vikingsquad.onmicrosoft.com/v2.0/.well-known/openid-configuration?p=B2C_1_Signup_Signin"
                .to_string(),
        redirect_uri: redirect.to_string(),
        logout_url: logout.to_string(),
        scope:
            "openid offline_access email profile https://vikingsquad.onmicrosoft.com/api/Hello.Read"
                .to_string(),
        audience: "https://api.myapp.com".to_string(),
    }
}

/// Connection settings for an OIDC provider, or `None` for `Basic`.
#[must_use]
pub fn provider_options(provider: AuthProvider, runtime: Runtime) -> Option<ProviderOptions> {
    match provider {
        AuthProvider::Auth0 => Some(auth0_options(runtime)),
        AuthProvider::Aws => Some(cognito_options(runtime)),
        AuthProvider::Azure => Some(azure_options(runtime)),
        AuthProvider::Basic => None,
    }
}

/// Failure reported by the OIDC engine during a flow.
#[derive(Error, Debug, Clone)]
#[error("{message}")]
pub struct OidcFlowError {
    /// Provider-specific error code, when one was reported
    pub code: Option<String>,
    /// Human-readable failure detail
    pub message: String,
}

impl OidcFlowError {
    /// Create a flow error from a bare message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    /// Whether this is the Azure "forgot password" flow error.
    #[must_use]
    pub fn is_password_reset(&self) -> bool {
        self.message.contains(AZURE_PASSWORD_RESET_CODE)
            || self
                .code
                .as_deref()
                .is_some_and(|c| c.contains(AZURE_PASSWORD_RESET_CODE))
    }
}

/// Browser-flow engine the authenticator drives.
///
/// Platform bindings implement this over their OIDC library; `setup` runs
/// once before any flow and covers whatever global initialization the
/// library needs.
#[async_trait]
pub trait OidcEngine: Send + Sync {
    /// One-time global initialization.
    async fn setup(&self) -> std::result::Result<(), OidcFlowError>;

    /// Run the interactive sign-in flow.
    async fn login(&self, options: &ProviderOptions)
        -> std::result::Result<AuthResult, OidcFlowError>;

    /// Run the sign-out flow for an existing session.
    async fn logout(
        &self,
        options: &ProviderOptions,
        session: &AuthResult,
    ) -> std::result::Result<(), OidcFlowError>;

    /// Renew a session using its refresh token.
    async fn refresh_session(
        &self,
        options: &ProviderOptions,
        session: &AuthResult,
    ) -> std::result::Result<AuthResult, OidcFlowError>;
}

struct Configured {
    provider: AuthProvider,
    options: ProviderOptions,
}

/// OIDC sign-in shared by all hosted identity providers.
pub struct OidcAuthenticator {
    engine: Arc<dyn OidcEngine>,
    tokens: TokenStorage,
    runtime: Runtime,
    state: RwLock<Option<Configured>>,
    setup: OnceCell<()>,
}

impl OidcAuthenticator {
    /// Create an authenticator with no provider selected yet.
    #[must_use]
    pub fn new(engine: Arc<dyn OidcEngine>, tokens: TokenStorage, runtime: Runtime) -> Self {
        Self {
            engine,
            tokens,
            runtime,
            state: RwLock::new(None),
            setup: OnceCell::new(),
        }
    }

    /// Run engine setup exactly once, even under concurrent callers.
    async fn initialize(&self) -> Result<()> {
        self.setup
            .get_or_try_init(|| async { self.engine.setup().await })
            .await?;
        Ok(())
    }

    /// Select the active OIDC provider, reconfiguring in place.
    ///
    /// Selecting `Basic` here is a programming error; it is logged and the
    /// current provider stays active.
    pub async fn set_auth_provider(&self, provider: AuthProvider) -> Result<()> {
        let Some(options) = provider_options(provider, self.runtime) else {
            tracing::error!("{provider} is not an OIDC provider, keeping current configuration");
            return Ok(());
        };

        self.initialize().await?;
        *self.state.write().await = Some(Configured { provider, options });
        tracing::debug!("OIDC provider set to {provider}");
        Ok(())
    }

    /// The currently selected provider, if any.
    pub async fn auth_provider(&self) -> Option<AuthProvider> {
        self.state.read().await.as_ref().map(|c| c.provider)
    }

    async fn configured(&self) -> Option<(AuthProvider, ProviderOptions)> {
        self.state
            .read()
            .await
            .as_ref()
            .map(|c| (c.provider, c.options.clone()))
    }

    /// Run the interactive sign-in flow for the selected provider.
    ///
    /// With no provider selected this logs a warning and returns without
    /// error. For Azure, a flow error carrying the "forgot password" code
    /// reruns the login against the password-reset user flow.
    pub async fn login(&self) -> Result<()> {
        let Some((provider, options)) = self.configured().await else {
            tracing::warn!("No OIDC provider selected, ignoring login");
            return Ok(());
        };

        let session = match self.engine.login(&options).await {
            Ok(session) => session,
            Err(e) if provider == AuthProvider::Azure && e.is_password_reset() => {
                tracing::info!("Password reset requested, rerunning login on the reset flow");
                let mut reset_options = options;
                reset_options.discovery_url = AZURE_PASSWORD_RESET_DISCOVERY_URL.to_string();
                self.engine.login(&reset_options).await?
            }
            Err(e) => return Err(e.into()),
        };

        self.tokens.set_session(&session).await?;
        tracing::info!("OIDC login succeeded via {provider}");
        Ok(())
    }

    /// Current session, renewing it first if the access token has expired.
    ///
    /// An expired session without a refresh token, or a failed renewal,
    /// clears the vault and yields `None`.
    pub async fn auth_result(&self) -> Result<Option<AuthResult>> {
        let Some(session) = self.tokens.get_session::<AuthResult>().await? else {
            return Ok(None);
        };
        if session.is_expired(Utc::now()) {
            return self.refresh(session).await;
        }
        Ok(Some(session))
    }

    async fn refresh(&self, session: AuthResult) -> Result<Option<AuthResult>> {
        let Some((_, options)) = self.configured().await else {
            tracing::warn!("No OIDC provider selected, cannot refresh session");
            return Ok(None);
        };

        if session.refresh_token.is_none() {
            tracing::info!("Session expired with no refresh token, clearing");
            self.tokens.clear().await?;
            return Ok(None);
        }

        match self.engine.refresh_session(&options, &session).await {
            Ok(renewed) => {
                self.tokens.set_session(&renewed).await?;
                Ok(Some(renewed))
            }
            Err(e) => {
                tracing::warn!("Session refresh failed, clearing: {e}");
                self.tokens.clear().await?;
                Ok(None)
            }
        }
    }
}

#[async_trait]
impl Authenticator for OidcAuthenticator {
    /// End the session.
    ///
    /// The provider sign-out flow is best-effort; stored tokens are cleared
    /// afterwards regardless.
    async fn logout(&self) -> Result<()> {
        let Some((_, options)) = self.configured().await else {
            tracing::warn!("No OIDC provider selected, ignoring logout");
            return Ok(());
        };
        // Same refresh-on-read path as the other reads: an expired session
        // is renewed before the provider sees it, and a failed renewal has
        // already cleared everything, leaving nothing to sign out of.
        let Some(session) = self.auth_result().await? else {
            return Ok(());
        };

        if let Err(e) = self.engine.logout(&options, &session).await {
            tracing::warn!("Provider logout failed, clearing local session anyway: {e}");
        }
        self.tokens.clear().await?;
        Ok(())
    }

    async fn get_access_token(&self) -> Result<Option<String>> {
        Ok(self.auth_result().await?.map(|s| s.access_token))
    }

    async fn is_authenticated(&self) -> Result<bool> {
        Ok(self.auth_result().await?.is_some())
    }
}

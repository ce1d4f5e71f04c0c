//! Authentication flows and provider selection.
//!
//! The crate is layered:
//!
//! - [`authenticator`]: the [`Authenticator`] contract and session shape
//! - [`backend`]: the application backend client for password sign-in
//! - [`basic`]: [`BasicAuthenticator`], username/password sign-in
//! - [`oidc`]: [`OidcAuthenticator`], browser-flow sign-in for the hosted
//!   identity providers
//! - [`AuthSession`]: the selector tying them together, remembering the
//!   chosen provider across restarts
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use latch_auth::{AuthSession, Credentials, HttpBackendApi};
//! use latch_core::{AuthProvider, Preferences, Runtime};
//! # use latch_auth::oidc::OidcEngine;
//!
//! # async fn example(
//! #     tokens: latch_vault::TokenStorage,
//! #     engine: Arc<dyn OidcEngine>,
//! # ) -> latch_auth::Result<()> {
//! let backend = Arc::new(HttpBackendApi::new("https://api.example.com")?);
//! let prefs = Preferences::new("/tmp/prefs.json");
//! let mut session = AuthSession::new(prefs, tokens, engine, backend, Runtime::Web);
//!
//! session
//!     .login(
//!         AuthProvider::Basic,
//!         Some(Credentials::new("mary", "s3cret")),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod authenticator;
pub mod backend;
pub mod basic;
pub mod error;
pub mod oidc;

pub use authenticator::{AuthResult, Authenticator};
pub use backend::{BackendApi, HttpBackendApi, LoginPayload};
pub use basic::BasicAuthenticator;
pub use error::{AuthError, Result};
pub use oidc::{OidcAuthenticator, OidcEngine, ProviderOptions};

use latch_core::{AuthProvider, Preferences, Runtime, AUTH_PROVIDER_KEY};
use latch_vault::TokenStorage;
use std::sync::Arc;

/// Username and password for basic sign-in.
#[derive(Debug, Clone)]
pub struct Credentials {
    /// Account username
    pub username: String,
    /// Account password
    pub password: String,
}

impl Credentials {
    /// Create a credentials pair.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

/// The authenticator currently serving the session.
#[derive(Clone)]
enum ActiveAuthenticator {
    Basic(Arc<BasicAuthenticator>),
    Oidc(Arc<OidcAuthenticator>),
}

impl ActiveAuthenticator {
    fn as_authenticator(&self) -> &dyn Authenticator {
        match self {
            Self::Basic(a) => a.as_ref(),
            Self::Oidc(a) => a.as_ref(),
        }
    }
}

/// Provider selection and session entry point.
///
/// Authenticators are built lazily and cached: one basic instance and one
/// OIDC instance at most, with the OIDC instance reconfigured in place when
/// the provider changes. The chosen provider is persisted only after a
/// successful login, and a persisted provider from a previous run is picked
/// up on first use.
pub struct AuthSession {
    prefs: Preferences,
    tokens: TokenStorage,
    oidc_engine: Arc<dyn OidcEngine>,
    backend: Arc<dyn BackendApi>,
    runtime: Runtime,
    basic: Option<Arc<BasicAuthenticator>>,
    oidc: Option<Arc<OidcAuthenticator>>,
    active: Option<ActiveAuthenticator>,
}

impl AuthSession {
    /// Create a session manager.
    #[must_use]
    pub fn new(
        prefs: Preferences,
        tokens: TokenStorage,
        oidc_engine: Arc<dyn OidcEngine>,
        backend: Arc<dyn BackendApi>,
        runtime: Runtime,
    ) -> Self {
        Self {
            prefs,
            tokens,
            oidc_engine,
            backend,
            runtime,
            basic: None,
            oidc: None,
            active: None,
        }
    }

    fn basic_authenticator(&mut self) -> Arc<BasicAuthenticator> {
        if let Some(basic) = &self.basic {
            return basic.clone();
        }
        let basic = Arc::new(BasicAuthenticator::new(
            self.backend.clone(),
            self.tokens.clone(),
        ));
        self.basic = Some(basic.clone());
        basic
    }

    fn oidc_authenticator(&mut self) -> Arc<OidcAuthenticator> {
        if let Some(oidc) = &self.oidc {
            return oidc.clone();
        }
        let oidc = Arc::new(OidcAuthenticator::new(
            self.oidc_engine.clone(),
            self.tokens.clone(),
            self.runtime,
        ));
        self.oidc = Some(oidc.clone());
        oidc
    }

    /// Sign in with the given provider.
    ///
    /// `Basic` requires credentials; the OIDC providers ignore them. The
    /// provider choice is persisted and made active only if the sign-in
    /// succeeds, so a failed attempt leaves the previous session intact.
    pub async fn login(
        &mut self,
        provider: AuthProvider,
        credentials: Option<Credentials>,
    ) -> Result<()> {
        tracing::info!("Signing in via {provider}");

        let active = if provider == AuthProvider::Basic {
            let Some(credentials) = credentials else {
                return Err(AuthError::MissingCredentials);
            };
            let basic = self.basic_authenticator();
            basic
                .login(&credentials.username, &credentials.password)
                .await?;
            ActiveAuthenticator::Basic(basic)
        } else {
            let oidc = self.oidc_authenticator();
            oidc.set_auth_provider(provider).await?;
            oidc.login().await?;
            ActiveAuthenticator::Oidc(oidc)
        };

        self.prefs.set(AUTH_PROVIDER_KEY, provider.as_str()).await?;
        self.active = Some(active);
        Ok(())
    }

    /// The active authenticator, rebuilt from the persisted provider choice
    /// when no login has happened in this run yet.
    async fn ensure_active(&mut self) -> Result<Option<ActiveAuthenticator>> {
        if let Some(active) = &self.active {
            return Ok(Some(active.clone()));
        }

        let Some(persisted) = self.prefs.get(AUTH_PROVIDER_KEY).await? else {
            return Ok(None);
        };
        let Ok(provider) = persisted.parse::<AuthProvider>() else {
            tracing::warn!("Ignoring unrecognized persisted provider {persisted:?}");
            return Ok(None);
        };

        tracing::debug!("Restoring {provider} session from a previous run");
        let active = if provider == AuthProvider::Basic {
            ActiveAuthenticator::Basic(self.basic_authenticator())
        } else {
            let oidc = self.oidc_authenticator();
            oidc.set_auth_provider(provider).await?;
            ActiveAuthenticator::Oidc(oidc)
        };
        self.active = Some(active.clone());
        Ok(Some(active))
    }

    /// Sign out of the active session.
    ///
    /// With no active or persisted session this is a silent no-op. The
    /// in-memory handle is dropped even if the sign-out itself fails.
    pub async fn logout(&mut self) -> Result<()> {
        let Some(active) = self.ensure_active().await? else {
            return Ok(());
        };

        let result = active.as_authenticator().logout().await;
        self.active = None;
        result
    }

    /// Access token of the active session, if any.
    pub async fn get_access_token(&mut self) -> Result<Option<String>> {
        match self.ensure_active().await? {
            Some(active) => active.as_authenticator().get_access_token().await,
            None => Ok(None),
        }
    }

    /// Whether a valid session exists.
    pub async fn is_authenticated(&mut self) -> Result<bool> {
        match self.ensure_active().await? {
            Some(active) => active.as_authenticator().is_authenticated().await,
            None => Ok(false),
        }
    }

    /// The token store this session writes to.
    #[must_use]
    pub fn tokens(&self) -> &TokenStorage {
        &self.tokens
    }
}

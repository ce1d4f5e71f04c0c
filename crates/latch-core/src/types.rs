//! Core enumerations shared across the Latch crates.
//!
//! The string forms produced by `as_str` are the persisted representations
//! used in the preferences store; parsing is the exact inverse. `UnlockMode`
//! additionally offers a lenient parse (`from_persisted`) because the unlock
//! policy treats any unrecognized persisted value as `NeverLock`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Identity backend selected for authentication.
///
/// `Basic` is the password/backend variant; the rest are OIDC providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuthProvider {
    /// Auth0 OIDC provider
    Auth0,
    /// AWS Cognito OIDC provider
    #[serde(rename = "AWS")]
    Aws,
    /// Azure AD B2C OIDC provider
    Azure,
    /// Password-based login against the application backend
    Basic,
}

impl AuthProvider {
    /// Persisted string form of this provider.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auth0 => "Auth0",
            Self::Aws => "AWS",
            Self::Azure => "Azure",
            Self::Basic => "Basic",
        }
    }

    /// Whether this provider uses the interactive OIDC flow.
    #[must_use]
    pub fn is_oidc(&self) -> bool {
        !matches!(self, Self::Basic)
    }

    /// All OIDC providers.
    #[must_use]
    pub fn oidc_providers() -> &'static [AuthProvider] {
        &[Self::Auth0, Self::Aws, Self::Azure]
    }
}

impl FromStr for AuthProvider {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Auth0" => Ok(Self::Auth0),
            "AWS" => Ok(Self::Aws),
            "Azure" => Ok(Self::Azure),
            "Basic" => Ok(Self::Basic),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for AuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Policy governing how the session vault is gated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnlockMode {
    /// Biometrics or the system passcode, whichever the device offers
    Device,
    /// System passcode only
    #[serde(rename = "SystemPIN")]
    SystemPin,
    /// Custom in-app PIN, prompted per session
    #[serde(rename = "SessionPIN")]
    SessionPin,
    /// Plain secure storage, never locked
    NeverLock,
    /// In-memory only; every app start requires a fresh login
    ForceLogin,
}

impl UnlockMode {
    /// Persisted string form of this mode.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Device => "Device",
            Self::SystemPin => "SystemPIN",
            Self::SessionPin => "SessionPIN",
            Self::NeverLock => "NeverLock",
            Self::ForceLogin => "ForceLogin",
        }
    }

    /// Lenient parse of a persisted value.
    ///
    /// Absent or unrecognized values read as `NeverLock`, matching the
    /// unlock-policy default pair.
    #[must_use]
    pub fn from_persisted(value: Option<&str>) -> Self {
        value
            .and_then(|v| v.parse().ok())
            .unwrap_or(Self::NeverLock)
    }
}

impl FromStr for UnlockMode {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "Device" => Ok(Self::Device),
            "SystemPIN" => Ok(Self::SystemPin),
            "SessionPIN" => Ok(Self::SessionPin),
            "NeverLock" => Ok(Self::NeverLock),
            "ForceLogin" => Ok(Self::ForceLogin),
            other => Err(UnknownVariant(other.to_string())),
        }
    }
}

impl fmt::Display for UnlockMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runtime the core is hosted in.
///
/// Device runtimes have access to platform security hardware; web runtimes
/// do not, and the unlock policy skips automatic mode selection there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Runtime {
    /// Native device runtime (hardware security available)
    Device,
    /// Browser runtime
    Web,
}

impl Runtime {
    /// Whether this runtime can reach platform security hardware.
    #[must_use]
    pub fn is_device(&self) -> bool {
        matches!(self, Self::Device)
    }
}

/// Parse error for the persisted enum string forms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownVariant(pub String);

impl fmt::Display for UnknownVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown variant: {}", self.0)
    }
}

impl std::error::Error for UnknownVariant {}

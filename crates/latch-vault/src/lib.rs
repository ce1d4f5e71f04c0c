//! Session vault: encrypted token storage with configurable unlock behavior.
//!
//! The crate is layered:
//!
//! - [`crypto`]: sealing and passcode key derivation
//! - [`engine`]: the [`VaultEngine`] contract and its configuration types
//! - [`store`]: [`LocalVault`], the file-backed software implementation
//! - [`device`]: the [`DeviceSecurity`] probe for platform hardware
//! - [`tokens`]: [`TokenStorage`], typed token access for authenticators
//! - [`SessionVault`]: the policy layer translating user-facing
//!   [`UnlockMode`]s into vault configuration
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use latch_core::{Preferences, UnlockMode};
//! use latch_vault::{LocalVault, NoDeviceSecurity, SessionVault, VaultConfig};
//!
//! # async fn example() -> latch_vault::Result<()> {
//! let device = Arc::new(NoDeviceSecurity);
//! let vault = LocalVault::open("/tmp/vault", VaultConfig::new("session"), device.clone()).await?;
//! let prefs = Preferences::new("/tmp/prefs.json");
//! let session = SessionVault::new(Arc::new(vault), prefs, device);
//!
//! session.set_unlock_mode(UnlockMode::SessionPin).await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::module_name_repetitions,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod crypto;
pub mod device;
pub mod engine;
pub mod error;
pub mod store;
pub mod tokens;

pub use device::{BiometricPermissionState, DeviceSecurity, NoDeviceSecurity};
pub use engine::{DeviceSecurityType, PasscodeHandler, VaultConfig, VaultEngine, VaultType};
pub use error::{Result, VaultError};
pub use store::LocalVault;
pub use tokens::TokenStorage;

use latch_core::{Preferences, UnlockMode, LAST_UNLOCK_MODE_KEY};
use std::sync::Arc;

/// Reason string shown by the one-time biometric provisioning prompt.
const BIOMETRIC_PROVISION_REASON: &str = "Please authenticate to continue";

/// Vault configuration pair for an unlock mode.
///
/// Modes always map to a matched `(VaultType, DeviceSecurityType)` pair; the
/// two are never varied independently.
#[must_use]
pub fn unlock_pair(mode: UnlockMode) -> (VaultType, DeviceSecurityType) {
    match mode {
        UnlockMode::Device => (VaultType::DeviceSecurity, DeviceSecurityType::Both),
        UnlockMode::SystemPin => (VaultType::DeviceSecurity, DeviceSecurityType::SystemPasscode),
        UnlockMode::SessionPin => (VaultType::CustomPasscode, DeviceSecurityType::None),
        UnlockMode::ForceLogin => (VaultType::InMemory, DeviceSecurityType::None),
        UnlockMode::NeverLock => (VaultType::SecureStorage, DeviceSecurityType::None),
    }
}

/// Policy layer over a vault engine.
///
/// Translates user-facing unlock modes into vault configuration, remembers
/// the last applied mode across restarts, and answers whether an unlock
/// prompt is currently worth showing.
pub struct SessionVault {
    vault: Arc<dyn VaultEngine>,
    prefs: Preferences,
    device: Arc<dyn DeviceSecurity>,
}

impl SessionVault {
    /// Create a session vault over the given engine.
    #[must_use]
    pub fn new(
        vault: Arc<dyn VaultEngine>,
        prefs: Preferences,
        device: Arc<dyn DeviceSecurity>,
    ) -> Self {
        Self {
            vault,
            prefs,
            device,
        }
    }

    /// The underlying vault engine.
    #[must_use]
    pub fn vault(&self) -> Arc<dyn VaultEngine> {
        self.vault.clone()
    }

    /// Typed token access over this vault.
    #[must_use]
    pub fn token_storage(&self) -> TokenStorage {
        TokenStorage::new(self.vault.clone())
    }

    /// Register the passcode callback for session-PIN unlocks.
    pub async fn on_passcode_requested(&self, handler: Arc<dyn PasscodeHandler>) {
        self.vault.on_passcode_requested(handler).await;
    }

    /// Apply an unlock mode to the vault and persist it on success.
    ///
    /// For [`UnlockMode::Device`], biometric permission is provisioned first:
    /// if the permission state is still "prompt", the platform biometric
    /// prompt is shown once and any error from it is swallowed, since the
    /// vault falls back to the system passcode either way.
    pub async fn set_unlock_mode(&self, mode: UnlockMode) -> Result<()> {
        tracing::info!("Applying unlock mode {mode}");

        if mode == UnlockMode::Device {
            self.provision_biometrics().await;
        }

        let (vault_type, device_security_type) = unlock_pair(mode);
        let config = self
            .vault
            .config()
            .await
            .with_unlock_pair(vault_type, device_security_type);
        self.vault.update_config(config).await?;

        self.prefs.set(LAST_UNLOCK_MODE_KEY, mode.as_str()).await?;
        Ok(())
    }

    async fn provision_biometrics(&self) {
        if self.device.biometrics_allowed().await != BiometricPermissionState::Prompt {
            return;
        }
        if let Err(e) = self
            .device
            .show_biometric_prompt(BIOMETRIC_PROVISION_REASON)
            .await
        {
            tracing::warn!("Biometric provisioning prompt failed: {e}");
        }
    }

    /// Pick and apply an initial unlock mode from device capabilities.
    ///
    /// Does nothing on runtimes without device security. Otherwise prefers
    /// biometrics, falls back to the system passcode, and uses a session PIN
    /// when no system passcode is set.
    pub async fn initialize_unlock_mode(&self) -> Result<()> {
        if !self.device.is_device_capable().await {
            tracing::debug!("No device security, keeping current unlock mode");
            return Ok(());
        }

        let mode = if !self.device.is_system_passcode_set().await {
            UnlockMode::SessionPin
        } else if self.device.is_biometrics_enabled().await {
            UnlockMode::Device
        } else {
            UnlockMode::SystemPin
        };
        self.set_unlock_mode(mode).await
    }

    /// The last applied unlock mode, defaulting to never-lock.
    pub async fn unlock_mode(&self) -> Result<UnlockMode> {
        let persisted = self.prefs.get(LAST_UNLOCK_MODE_KEY).await?;
        Ok(UnlockMode::from_persisted(persisted.as_deref()))
    }

    /// Whether an unlock prompt is currently worth showing.
    ///
    /// True only when the active mode can lock at all, the vault holds a
    /// session, and the vault is locked right now.
    pub async fn can_unlock(&self) -> Result<bool> {
        let mode = self.unlock_mode().await?;
        let empty = self.vault.is_empty().await?;
        let locked = self.vault.is_locked().await;
        Ok(mode != UnlockMode::NeverLock && !empty && locked)
    }

    /// Unlock the vault using the active strategy.
    pub async fn unlock(&self) -> Result<()> {
        self.vault.unlock().await
    }

    /// Lock the vault.
    pub async fn lock(&self) -> Result<()> {
        self.vault.lock().await
    }

    /// Remove all stored session data.
    pub async fn clear(&self) -> Result<()> {
        self.vault.clear().await
    }

    /// Current vault configuration.
    pub async fn config(&self) -> VaultConfig {
        self.vault.config().await
    }

    /// Keys currently stored in the vault.
    pub async fn keys(&self) -> Result<Vec<String>> {
        self.vault.keys().await
    }

    /// Read a stored value.
    pub async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        self.vault.get_value(key).await
    }

    /// Store a value.
    pub async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        self.vault.set_value(key, value).await
    }
}

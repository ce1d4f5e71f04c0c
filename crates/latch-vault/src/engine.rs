//! Vault engine contract and configuration types.
//!
//! `VaultEngine` is the capability the rest of the system programs against:
//! an opaque key-value store with a lock state and a configurable unlock
//! strategy. `LocalVault` in this crate is the software implementation;
//! hardware-backed implementations plug in behind the same trait.

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Storage backend for the vault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultType {
    /// Encrypted at rest, never locked
    SecureStorage,
    /// Encrypted at rest, unlock gated by device security
    DeviceSecurity,
    /// Encrypted at rest, unlock gated by a custom passcode
    CustomPasscode,
    /// Held in memory only; nothing survives a restart
    InMemory,
}

/// Device-security gate applied when `VaultType::DeviceSecurity` is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeviceSecurityType {
    /// No device gate
    None,
    /// System passcode only
    SystemPasscode,
    /// Biometrics only
    Biometrics,
    /// Biometrics with system-passcode fallback
    Both,
}

/// Active vault configuration.
///
/// `vault_type` and `device_security_type` are always set together as a
/// matched pair by the unlock-mode policy; they are never updated
/// independently.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Identifier for this vault instance
    pub id: String,
    /// Storage backend
    pub vault_type: VaultType,
    /// Device-security gate
    pub device_security_type: DeviceSecurityType,
    /// Failed custom-passcode attempts tolerated before the vault reacts
    pub max_unlock_attempts: u32,
    /// Destroy vault contents once `max_unlock_attempts` is exceeded
    pub clear_on_too_many_attempts: bool,
}

impl VaultConfig {
    /// Create a configuration with the never-locked defaults.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            vault_type: VaultType::SecureStorage,
            device_security_type: DeviceSecurityType::None,
            max_unlock_attempts: 2,
            clear_on_too_many_attempts: true,
        }
    }

    /// Return a copy with a different unlock pair.
    #[must_use]
    pub fn with_unlock_pair(
        mut self,
        vault_type: VaultType,
        device_security_type: DeviceSecurityType,
    ) -> Self {
        self.vault_type = vault_type;
        self.device_security_type = device_security_type;
        self
    }
}

/// Callback invoked when a custom-passcode vault needs a passcode.
///
/// `is_set_request` is true when a new passcode is being established and
/// false when an existing one must be entered. Implementations resolve with
/// whatever the user submits; an empty string means the prompt was dismissed.
#[async_trait]
pub trait PasscodeHandler: Send + Sync {
    /// Prompt for a passcode.
    async fn request_passcode(&self, is_set_request: bool) -> String;
}

/// The secure key-value store guarding session tokens.
///
/// All implementations must be thread-safe; the vault is a process-wide
/// shared resource reached from every authenticator.
#[async_trait]
pub trait VaultEngine: Send + Sync {
    /// Whether the vault currently holds no entries.
    ///
    /// Answerable while locked; this is a side-effect-free read.
    async fn is_empty(&self) -> Result<bool>;

    /// Whether the vault is currently locked.
    async fn is_locked(&self) -> bool;

    /// Lock the vault, discarding key material from memory.
    async fn lock(&self) -> Result<()>;

    /// Unlock the vault using the strategy of the active configuration.
    ///
    /// Failures (wrong passcode, device authentication rejection) propagate
    /// to the caller.
    async fn unlock(&self) -> Result<()>;

    /// List the keys currently stored.
    async fn keys(&self) -> Result<Vec<String>>;

    /// Get a stored value, or `None` if the key is absent.
    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>>;

    /// Store a value under the given key.
    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()>;

    /// Remove a stored value. Removing an absent key is a no-op.
    async fn remove_value(&self, key: &str) -> Result<()>;

    /// Remove all stored values.
    async fn clear(&self) -> Result<()>;

    /// Current configuration.
    async fn config(&self) -> VaultConfig;

    /// Apply a new configuration, migrating key material as needed.
    ///
    /// Requires the vault to be unlocked.
    async fn update_config(&self, config: VaultConfig) -> Result<()>;

    /// Register the passcode callback used by custom-passcode unlocks.
    async fn on_passcode_requested(&self, handler: Arc<dyn PasscodeHandler>);
}

//! Software vault implementation.
//!
//! `LocalVault` keeps its entry map in memory while unlocked and seals it to
//! a single snapshot file on every mutation and on lock. The master key is
//! random per vault; how it rests on disk depends on the active
//! `VaultType`:
//!
//! - `SecureStorage` / `DeviceSecurity`: raw keyfile (a stand-in for the
//!   platform keystore). Device-security vaults additionally gate `unlock`
//!   behind [`DeviceSecurity::authenticate`].
//! - `CustomPasscode`: the master key is wrapped by an Argon2id-derived key
//!   from the registered passcode handler.
//! - `InMemory`: nothing touches disk; `lock` wipes the entries.
//!
//! Wrong-passcode unlocks are counted; once `max_unlock_attempts` is
//! exceeded on a vault configured to clear, the contents are destroyed and
//! the vault comes back empty and unlocked.

use crate::crypto::{self, SealedBlob, KEY_LENGTH, SALT_LENGTH};
use crate::device::DeviceSecurity;
use crate::engine::{PasscodeHandler, VaultConfig, VaultEngine, VaultType};
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::fs;
use tokio::sync::{Mutex, RwLock};
use zeroize::Zeroizing;

const CONFIG_FILE: &str = "vault.config";
const STORE_FILE: &str = "vault.store";
const KEY_FILE: &str = "vault.key";

/// Sealed snapshot as written to disk.
///
/// The entry count rides in the clear so `is_empty` stays answerable while
/// the vault is locked.
#[derive(Debug, Serialize, Deserialize)]
struct StoreFile {
    entry_count: usize,
    blob: SealedBlob,
}

/// Master key at rest.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum KeyAtRest {
    /// Raw keyfile (platform-keystore stand-in)
    Plain { key: Vec<u8> },
    /// Master key wrapped by a passcode-derived key
    Wrapped {
        salt: [u8; SALT_LENGTH],
        blob: SealedBlob,
    },
}

struct Inner {
    config: VaultConfig,
    entries: BTreeMap<String, serde_json::Value>,
    key: Option<Zeroizing<[u8; KEY_LENGTH]>>,
    locked: bool,
    sealed_entry_count: usize,
    failed_attempts: u32,
}

impl Inner {
    fn require_unlocked(&self) -> Result<()> {
        if self.locked || self.key.is_none() {
            return Err(VaultError::Locked);
        }
        Ok(())
    }
}

/// File-backed vault with pluggable unlock strategies.
pub struct LocalVault {
    dir: PathBuf,
    device: Arc<dyn DeviceSecurity>,
    handler: RwLock<Option<Arc<dyn PasscodeHandler>>>,
    inner: Mutex<Inner>,
}

impl LocalVault {
    /// Open the vault in `dir`, creating it with `config` if it does not
    /// exist yet.
    ///
    /// A freshly created vault starts unlocked. A reopened vault starts
    /// locked unless its type never locks (`SecureStorage`) or holds
    /// nothing to unlock (`InMemory`).
    pub async fn open(
        dir: impl AsRef<Path>,
        config: VaultConfig,
        device: Arc<dyn DeviceSecurity>,
    ) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        let config_path = dir.join(CONFIG_FILE);

        let inner = if config_path.exists() {
            Self::reopen(&dir, &config_path).await?
        } else {
            Self::create(&dir, config).await?
        };

        Ok(Self {
            dir,
            device,
            handler: RwLock::new(None),
            inner: Mutex::new(inner),
        })
    }

    async fn create(dir: &Path, config: VaultConfig) -> Result<Inner> {
        tracing::info!("Creating vault {} at {}", config.id, dir.display());
        fs::create_dir_all(dir).await?;

        let key = crypto::generate_key();
        let mut inner = Inner {
            config,
            entries: BTreeMap::new(),
            key: Some(key),
            locked: false,
            sealed_entry_count: 0,
            failed_attempts: 0,
        };

        if inner.config.vault_type != VaultType::InMemory {
            // CustomPasscode key wrapping is deferred until a passcode
            // handler is registered; lock() and update_config() establish it.
            if matches!(
                inner.config.vault_type,
                VaultType::SecureStorage | VaultType::DeviceSecurity
            ) {
                write_key_at_rest(dir, &plain_key(&inner)?).await?;
            }
            write_snapshot(dir, &mut inner).await?;
            write_config(dir, &inner.config).await?;
        }

        Ok(inner)
    }

    async fn reopen(dir: &Path, config_path: &Path) -> Result<Inner> {
        let config: VaultConfig = serde_json::from_slice(&fs::read(config_path).await?)?;
        tracing::debug!("Reopening vault {} at {}", config.id, dir.display());

        let sealed_entry_count = match read_store_file(dir).await? {
            Some(store) => store.entry_count,
            None => 0,
        };

        let mut inner = Inner {
            config,
            entries: BTreeMap::new(),
            key: None,
            locked: true,
            sealed_entry_count,
            failed_attempts: 0,
        };

        match inner.config.vault_type {
            VaultType::SecureStorage => {
                // Never locks: load the keyfile and unseal immediately.
                let key = read_plain_key(dir).await?;
                load_entries(dir, &mut inner, key).await?;
            }
            VaultType::InMemory => {
                // Nothing persisted survives; come back empty and unlocked.
                inner.key = Some(crypto::generate_key());
                inner.locked = false;
                inner.sealed_entry_count = 0;
            }
            VaultType::DeviceSecurity | VaultType::CustomPasscode => {}
        }

        Ok(inner)
    }

    async fn passcode_handler(&self) -> Result<Arc<dyn PasscodeHandler>> {
        self.handler
            .read()
            .await
            .clone()
            .ok_or(VaultError::PasscodeHandlerMissing)
    }

    /// Establish the passcode wrap for the master key if it is missing.
    async fn ensure_passcode_wrap(&self, inner: &Inner) -> Result<()> {
        if self.dir.join(KEY_FILE).exists() {
            if let Some(KeyAtRest::Wrapped { .. }) = read_key_at_rest(&self.dir).await? {
                return Ok(());
            }
        }

        let handler = self.passcode_handler().await?;
        let passcode = Zeroizing::new(handler.request_passcode(true).await);
        if passcode.is_empty() {
            return Err(VaultError::PasscodeDismissed);
        }

        let salt = crypto::generate_salt();
        let wrapping_key = crypto::derive_passcode_key(&passcode, &salt)?;
        let key = inner.key.as_ref().ok_or(VaultError::Locked)?;
        let blob = crypto::seal(&**key, &wrapping_key)?;
        write_key_at_rest(&self.dir, &KeyAtRest::Wrapped { salt, blob }).await?;
        Ok(())
    }

    /// Unwrap the master key with a passcode from the handler, counting
    /// failed attempts and destroying the vault when they are exhausted.
    async fn unwrap_with_passcode(
        &self,
        inner: &mut Inner,
    ) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
        let handler = self.passcode_handler().await?;
        let passcode = Zeroizing::new(handler.request_passcode(false).await);
        if passcode.is_empty() {
            return Err(VaultError::PasscodeDismissed);
        }

        let Some(KeyAtRest::Wrapped { salt, blob }) = read_key_at_rest(&self.dir).await? else {
            return Err(VaultError::InvalidData(
                "custom-passcode vault has no wrapped key".to_string(),
            ));
        };

        let wrapping_key = crypto::derive_passcode_key(&passcode, &salt)?;
        match crypto::unseal(&blob, &wrapping_key) {
            Ok(raw) => {
                let key: [u8; KEY_LENGTH] = raw.as_slice().try_into().map_err(|_| {
                    VaultError::InvalidData("wrapped key has wrong length".to_string())
                })?;
                inner.failed_attempts = 0;
                Ok(Zeroizing::new(key))
            }
            Err(VaultError::Decryption(_)) => {
                inner.failed_attempts += 1;
                tracing::warn!(
                    "Invalid vault passcode (attempt {}/{})",
                    inner.failed_attempts,
                    inner.config.max_unlock_attempts
                );
                if inner.failed_attempts >= inner.config.max_unlock_attempts
                    && inner.config.clear_on_too_many_attempts
                {
                    self.destroy(inner).await?;
                    return Err(VaultError::AttemptsExhausted);
                }
                Err(VaultError::InvalidPasscode)
            }
            Err(e) => Err(e),
        }
    }

    /// Destroy vault contents after exhausted unlock attempts.
    ///
    /// The vault comes back empty and unlocked with a fresh master key; the
    /// passcode wrap is re-established at the next lock.
    async fn destroy(&self, inner: &mut Inner) -> Result<()> {
        tracing::warn!("Destroying vault {} contents", inner.config.id);
        remove_if_present(&self.dir.join(STORE_FILE)).await?;
        remove_if_present(&self.dir.join(KEY_FILE)).await?;
        inner.entries.clear();
        inner.sealed_entry_count = 0;
        inner.key = Some(crypto::generate_key());
        inner.locked = false;
        inner.failed_attempts = 0;
        Ok(())
    }

    async fn persist(&self, inner: &mut Inner) -> Result<()> {
        if inner.config.vault_type == VaultType::InMemory {
            return Ok(());
        }
        write_snapshot(&self.dir, inner).await
    }
}

#[async_trait]
impl VaultEngine for LocalVault {
    async fn is_empty(&self) -> Result<bool> {
        let inner = self.inner.lock().await;
        if inner.locked {
            Ok(inner.sealed_entry_count == 0)
        } else {
            Ok(inner.entries.is_empty())
        }
    }

    async fn is_locked(&self) -> bool {
        self.inner.lock().await.locked
    }

    async fn lock(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if inner.locked {
            return Ok(());
        }

        match inner.config.vault_type {
            VaultType::SecureStorage => {
                tracing::debug!("Never-lock vault, lock is a no-op");
            }
            VaultType::InMemory => {
                inner.entries.clear();
                inner.sealed_entry_count = 0;
                tracing::info!("In-memory vault wiped");
            }
            VaultType::CustomPasscode => {
                self.ensure_passcode_wrap(&inner).await?;
                write_snapshot(&self.dir, &mut inner).await?;
                inner.key = None;
                inner.locked = true;
                tracing::info!("Vault locked");
            }
            VaultType::DeviceSecurity => {
                write_snapshot(&self.dir, &mut inner).await?;
                inner.key = None;
                inner.locked = true;
                tracing::info!("Vault locked");
            }
        }
        Ok(())
    }

    async fn unlock(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        if !inner.locked {
            return Ok(());
        }

        match inner.config.vault_type {
            VaultType::SecureStorage | VaultType::InMemory => {
                inner.locked = false;
            }
            VaultType::DeviceSecurity => {
                self.device
                    .authenticate(inner.config.device_security_type)
                    .await?;
                let key = read_plain_key(&self.dir).await?;
                load_entries(&self.dir, &mut inner, key).await?;
                tracing::info!("Vault unlocked");
            }
            VaultType::CustomPasscode => {
                let key = self.unwrap_with_passcode(&mut inner).await?;
                load_entries(&self.dir, &mut inner, key).await?;
                tracing::info!("Vault unlocked");
            }
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let inner = self.inner.lock().await;
        inner.require_unlocked()?;
        Ok(inner.entries.keys().cloned().collect())
    }

    async fn get_value(&self, key: &str) -> Result<Option<serde_json::Value>> {
        let inner = self.inner.lock().await;
        inner.require_unlocked()?;
        Ok(inner.entries.get(key).cloned())
    }

    async fn set_value(&self, key: &str, value: serde_json::Value) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.require_unlocked()?;
        inner.entries.insert(key.to_string(), value);
        self.persist(&mut inner).await
    }

    async fn remove_value(&self, key: &str) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.require_unlocked()?;
        if inner.entries.remove(key).is_some() {
            self.persist(&mut inner).await?;
        }
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.require_unlocked()?;
        inner.entries.clear();
        self.persist(&mut inner).await
    }

    async fn config(&self) -> VaultConfig {
        self.inner.lock().await.config.clone()
    }

    async fn update_config(&self, config: VaultConfig) -> Result<()> {
        let mut inner = self.inner.lock().await;
        inner.require_unlocked()?;

        tracing::debug!(
            "Updating vault config: {:?}/{:?} -> {:?}/{:?}",
            inner.config.vault_type,
            inner.config.device_security_type,
            config.vault_type,
            config.device_security_type
        );

        match config.vault_type {
            VaultType::InMemory => {
                remove_if_present(&self.dir.join(STORE_FILE)).await?;
                remove_if_present(&self.dir.join(KEY_FILE)).await?;
                remove_if_present(&self.dir.join(CONFIG_FILE)).await?;
            }
            VaultType::SecureStorage | VaultType::DeviceSecurity => {
                inner.config = config.clone();
                write_key_at_rest(&self.dir, &plain_key(&inner)?).await?;
                write_snapshot(&self.dir, &mut inner).await?;
                write_config(&self.dir, &config).await?;
            }
            VaultType::CustomPasscode => {
                remove_if_present(&self.dir.join(KEY_FILE)).await?;
                inner.config = config.clone();
                self.ensure_passcode_wrap(&inner).await?;
                write_snapshot(&self.dir, &mut inner).await?;
                write_config(&self.dir, &config).await?;
            }
        }

        inner.config = config;
        inner.failed_attempts = 0;
        Ok(())
    }

    async fn on_passcode_requested(&self, handler: Arc<dyn PasscodeHandler>) {
        *self.handler.write().await = Some(handler);
    }
}

fn plain_key(inner: &Inner) -> Result<KeyAtRest> {
    let key = inner.key.as_ref().ok_or(VaultError::Locked)?;
    Ok(KeyAtRest::Plain { key: key.to_vec() })
}

async fn write_config(dir: &Path, config: &VaultConfig) -> Result<()> {
    fs::write(dir.join(CONFIG_FILE), serde_json::to_vec_pretty(config)?).await?;
    Ok(())
}

async fn write_key_at_rest(dir: &Path, key: &KeyAtRest) -> Result<()> {
    fs::write(dir.join(KEY_FILE), serde_json::to_vec(key)?).await?;
    Ok(())
}

async fn read_key_at_rest(dir: &Path) -> Result<Option<KeyAtRest>> {
    match fs::read(dir.join(KEY_FILE)).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn read_plain_key(dir: &Path) -> Result<Zeroizing<[u8; KEY_LENGTH]>> {
    match read_key_at_rest(dir).await? {
        Some(KeyAtRest::Plain { key }) => {
            let key: [u8; KEY_LENGTH] = key
                .as_slice()
                .try_into()
                .map_err(|_| VaultError::InvalidData("keyfile has wrong length".to_string()))?;
            Ok(Zeroizing::new(key))
        }
        Some(KeyAtRest::Wrapped { .. }) => Err(VaultError::InvalidData(
            "expected plain keyfile, found wrapped key".to_string(),
        )),
        None => Err(VaultError::InvalidData("keyfile missing".to_string())),
    }
}

async fn read_store_file(dir: &Path) -> Result<Option<StoreFile>> {
    match fs::read(dir.join(STORE_FILE)).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}

async fn write_snapshot(dir: &Path, inner: &mut Inner) -> Result<()> {
    let key = inner.key.as_ref().ok_or(VaultError::Locked)?;
    let plaintext = Zeroizing::new(serde_json::to_vec(&inner.entries)?);
    let blob = crypto::seal(&plaintext, key)?;
    let store = StoreFile {
        entry_count: inner.entries.len(),
        blob,
    };
    fs::write(dir.join(STORE_FILE), serde_json::to_vec(&store)?).await?;
    inner.sealed_entry_count = inner.entries.len();
    Ok(())
}

async fn load_entries(
    dir: &Path,
    inner: &mut Inner,
    key: Zeroizing<[u8; KEY_LENGTH]>,
) -> Result<()> {
    let entries = match read_store_file(dir).await? {
        Some(store) => {
            let plaintext = crypto::unseal(&store.blob, &key)?;
            serde_json::from_slice(&plaintext)?
        }
        None => BTreeMap::new(),
    };
    inner.sealed_entry_count = entries.len();
    inner.entries = entries;
    inner.key = Some(key);
    inner.locked = false;
    Ok(())
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{BiometricPermissionState, NoDeviceSecurity};
    use crate::engine::DeviceSecurityType;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Passcode handler answering from a queue; records set-vs-entry mode.
    struct QueuedPasscodes {
        responses: Mutex<VecDeque<String>>,
        set_requests: Mutex<Vec<bool>>,
    }

    impl QueuedPasscodes {
        fn new(responses: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                responses: Mutex::new(responses.iter().map(ToString::to_string).collect()),
                set_requests: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait]
    impl PasscodeHandler for QueuedPasscodes {
        async fn request_passcode(&self, is_set_request: bool) -> String {
            self.set_requests.lock().await.push(is_set_request);
            self.responses.lock().await.pop_front().unwrap_or_default()
        }
    }

    /// Device stub that approves or rejects authentication.
    struct StubDevice {
        approve: AtomicBool,
    }

    impl StubDevice {
        fn approving() -> Arc<Self> {
            Arc::new(Self {
                approve: AtomicBool::new(true),
            })
        }
    }

    #[async_trait]
    impl DeviceSecurity for StubDevice {
        async fn is_device_capable(&self) -> bool {
            true
        }
        async fn is_system_passcode_set(&self) -> bool {
            true
        }
        async fn is_biometrics_enabled(&self) -> bool {
            true
        }
        async fn biometrics_allowed(&self) -> BiometricPermissionState {
            BiometricPermissionState::Granted
        }
        async fn show_biometric_prompt(&self, _reason: &str) -> Result<()> {
            Ok(())
        }
        async fn authenticate(&self, _security: DeviceSecurityType) -> Result<()> {
            if self.approve.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(VaultError::DeviceAuthFailed("rejected".to_string()))
            }
        }
    }

    async fn open_vault(dir: &Path) -> LocalVault {
        LocalVault::open(dir, VaultConfig::new("test-vault"), Arc::new(NoDeviceSecurity))
            .await
            .expect("open vault")
    }

    #[tokio::test]
    async fn test_create_starts_unlocked_and_empty() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;

        assert!(!vault.is_locked().await);
        assert!(vault.is_empty().await.expect("is_empty"));
    }

    #[tokio::test]
    async fn test_set_get_remove_roundtrip() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;

        vault
            .set_value("AccessToken", json!("tok-123"))
            .await
            .expect("set");
        assert_eq!(
            vault.get_value("AccessToken").await.expect("get"),
            Some(json!("tok-123"))
        );
        assert_eq!(vault.get_value("missing").await.expect("get"), None);
        assert_eq!(vault.keys().await.expect("keys"), vec!["AccessToken"]);

        vault.remove_value("AccessToken").await.expect("remove");
        assert!(vault.is_empty().await.expect("is_empty"));
    }

    #[tokio::test]
    async fn test_secure_storage_persists_across_reopen() {
        let tmp = TempDir::new().expect("temp dir");
        {
            let vault = open_vault(tmp.path()).await;
            vault
                .set_value("RefreshToken", json!("refresh"))
                .await
                .expect("set");
        }

        let vault = open_vault(tmp.path()).await;
        // SecureStorage never locks, even across restarts.
        assert!(!vault.is_locked().await);
        assert_eq!(
            vault.get_value("RefreshToken").await.expect("get"),
            Some(json!("refresh"))
        );
    }

    #[tokio::test]
    async fn test_secure_storage_lock_is_noop() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        vault.set_value("k", json!(1)).await.expect("set");

        vault.lock().await.expect("lock");
        assert!(!vault.is_locked().await);
        assert_eq!(vault.get_value("k").await.expect("get"), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_custom_passcode_lock_unlock() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        let handler = QueuedPasscodes::new(&["4242", "4242"]);
        vault.on_passcode_requested(handler.clone()).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await
            .expect("update config");
        vault.set_value("k", json!("v")).await.expect("set");

        vault.lock().await.expect("lock");
        assert!(vault.is_locked().await);
        assert!(matches!(
            vault.get_value("k").await,
            Err(VaultError::Locked)
        ));

        vault.unlock().await.expect("unlock");
        assert!(!vault.is_locked().await);
        assert_eq!(vault.get_value("k").await.expect("get"), Some(json!("v")));

        // First prompt established the passcode, second entered it.
        let modes = handler.set_requests.lock().await.clone();
        assert_eq!(modes, vec![true, false]);
    }

    #[tokio::test]
    async fn test_wrong_passcode_counts_then_clears() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        let handler = QueuedPasscodes::new(&["4242", "9999", "0000"]);
        vault.on_passcode_requested(handler).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await
            .expect("update config");
        vault.set_value("k", json!("v")).await.expect("set");
        vault.lock().await.expect("lock");

        // First wrong attempt is tolerated.
        assert!(matches!(
            vault.unlock().await,
            Err(VaultError::InvalidPasscode)
        ));
        assert!(vault.is_locked().await);
        assert!(!vault.is_empty().await.expect("is_empty"));

        // Second exhausts the limit and destroys the contents.
        assert!(matches!(
            vault.unlock().await,
            Err(VaultError::AttemptsExhausted)
        ));
        assert!(!vault.is_locked().await);
        assert!(vault.is_empty().await.expect("is_empty"));
    }

    #[tokio::test]
    async fn test_dismissed_passcode_prompt_fails_unlock() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        let handler = QueuedPasscodes::new(&["4242", ""]);
        vault.on_passcode_requested(handler).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await
            .expect("update config");
        vault.lock().await.expect("lock");

        assert!(matches!(
            vault.unlock().await,
            Err(VaultError::PasscodeDismissed)
        ));
        assert!(vault.is_locked().await);
    }

    #[tokio::test]
    async fn test_custom_passcode_without_handler_fails() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;

        let result = vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await;
        assert!(matches!(result, Err(VaultError::PasscodeHandlerMissing)));
    }

    #[tokio::test]
    async fn test_device_security_unlock_gated_by_probe() {
        let tmp = TempDir::new().expect("temp dir");
        let device = StubDevice::approving();
        let vault = LocalVault::open(tmp.path(), VaultConfig::new("test-vault"), device.clone())
            .await
            .expect("open vault");

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::DeviceSecurity, DeviceSecurityType::Both),
            )
            .await
            .expect("update config");
        vault.set_value("k", json!("v")).await.expect("set");
        vault.lock().await.expect("lock");
        assert!(vault.is_locked().await);

        // Rejected authentication propagates and stays locked.
        device.approve.store(false, Ordering::SeqCst);
        assert!(matches!(
            vault.unlock().await,
            Err(VaultError::DeviceAuthFailed(_))
        ));
        assert!(vault.is_locked().await);

        device.approve.store(true, Ordering::SeqCst);
        vault.unlock().await.expect("unlock");
        assert_eq!(vault.get_value("k").await.expect("get"), Some(json!("v")));
    }

    #[tokio::test]
    async fn test_in_memory_lock_wipes() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::InMemory, DeviceSecurityType::None),
            )
            .await
            .expect("update config");
        vault.set_value("k", json!("v")).await.expect("set");
        assert!(!tmp.path().join(STORE_FILE).exists());

        vault.lock().await.expect("lock");
        assert!(!vault.is_locked().await);
        assert!(vault.is_empty().await.expect("is_empty"));
    }

    #[tokio::test]
    async fn test_is_empty_readable_while_locked() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        let handler = QueuedPasscodes::new(&["4242"]);
        vault.on_passcode_requested(handler).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await
            .expect("update config");
        vault.set_value("k", json!("v")).await.expect("set");
        vault.lock().await.expect("lock");

        assert!(vault.is_locked().await);
        assert!(!vault.is_empty().await.expect("is_empty"));
    }

    #[tokio::test]
    async fn test_migrate_back_to_secure_storage() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        let handler = QueuedPasscodes::new(&["4242"]);
        vault.on_passcode_requested(handler).await;

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::CustomPasscode, DeviceSecurityType::None),
            )
            .await
            .expect("to custom passcode");
        vault.set_value("k", json!("v")).await.expect("set");

        vault
            .update_config(
                VaultConfig::new("test-vault")
                    .with_unlock_pair(VaultType::SecureStorage, DeviceSecurityType::None),
            )
            .await
            .expect("back to secure storage");

        vault.lock().await.expect("lock");
        assert!(!vault.is_locked().await);
        assert_eq!(vault.get_value("k").await.expect("get"), Some(json!("v")));
    }

    #[tokio::test]
    async fn test_clear() {
        let tmp = TempDir::new().expect("temp dir");
        let vault = open_vault(tmp.path()).await;
        vault.set_value("a", json!(1)).await.expect("set");
        vault.set_value("b", json!(2)).await.expect("set");

        vault.clear().await.expect("clear");
        assert!(vault.is_empty().await.expect("is_empty"));
        assert!(vault.keys().await.expect("keys").is_empty());
    }
}

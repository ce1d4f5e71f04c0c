//! Device security capability contract.
//!
//! Platform bindings (biometric hardware, system passcode checks) live
//! behind this trait; the crate ships only the web stand-in that reports no
//! capability. Real implementations are the host platform's concern.

use crate::engine::DeviceSecurityType;
use crate::error::{Result, VaultError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Permission state of the biometric hardware for this app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiometricPermissionState {
    /// Permission has not yet been requested
    Prompt,
    /// Permission granted
    Granted,
    /// Permission denied
    Denied,
}

/// Probe and gate for platform security hardware.
#[async_trait]
pub trait DeviceSecurity: Send + Sync {
    /// Whether this runtime can reach device security at all.
    async fn is_device_capable(&self) -> bool;

    /// Whether a system passcode is set on the device.
    async fn is_system_passcode_set(&self) -> bool;

    /// Whether biometrics are enrolled and enabled.
    async fn is_biometrics_enabled(&self) -> bool;

    /// Permission state for using biometrics.
    async fn biometrics_allowed(&self) -> BiometricPermissionState;

    /// Show the platform biometric prompt (used for one-time provisioning).
    async fn show_biometric_prompt(&self, reason: &str) -> Result<()>;

    /// Authenticate the user per the given device-security gate.
    ///
    /// Called by device-security vaults before releasing key material.
    async fn authenticate(&self, security: DeviceSecurityType) -> Result<()>;
}

/// Stand-in for runtimes without device security (browsers).
///
/// Reports no capability and rejects every authentication request.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoDeviceSecurity;

#[async_trait]
impl DeviceSecurity for NoDeviceSecurity {
    async fn is_device_capable(&self) -> bool {
        false
    }

    async fn is_system_passcode_set(&self) -> bool {
        false
    }

    async fn is_biometrics_enabled(&self) -> bool {
        false
    }

    async fn biometrics_allowed(&self) -> BiometricPermissionState {
        BiometricPermissionState::Denied
    }

    async fn show_biometric_prompt(&self, _reason: &str) -> Result<()> {
        Err(VaultError::DeviceAuthFailed(
            "biometrics not available".to_string(),
        ))
    }

    async fn authenticate(&self, _security: DeviceSecurityType) -> Result<()> {
        Err(VaultError::DeviceAuthFailed(
            "no device security available".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_device_security_reports_nothing() {
        let device = NoDeviceSecurity;
        assert!(!device.is_device_capable().await);
        assert!(!device.is_system_passcode_set().await);
        assert!(!device.is_biometrics_enabled().await);
        assert_eq!(
            device.biometrics_allowed().await,
            BiometricPermissionState::Denied
        );
    }

    #[tokio::test]
    async fn test_no_device_security_rejects_authentication() {
        let device = NoDeviceSecurity;
        let result = device.authenticate(DeviceSecurityType::Both).await;
        assert!(matches!(result, Err(VaultError::DeviceAuthFailed(_))));
    }
}

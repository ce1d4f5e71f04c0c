//! Error types for the vault crate.

use thiserror::Error;

/// Errors that can occur during vault operations.
#[derive(Error, Debug)]
pub enum VaultError {
    /// Operation requires an unlocked vault
    #[error("vault is locked")]
    Locked,

    /// Custom passcode did not unlock the vault
    #[error("invalid passcode")]
    InvalidPasscode,

    /// Passcode prompt was dismissed without input
    #[error("passcode entry dismissed")]
    PasscodeDismissed,

    /// No passcode handler registered for a custom-passcode vault
    #[error("no passcode handler registered")]
    PasscodeHandlerMissing,

    /// Too many failed unlock attempts; vault contents were destroyed
    #[error("too many failed unlock attempts, vault cleared")]
    AttemptsExhausted,

    /// Device-level authentication (biometric / system passcode) failed
    #[error("device authentication failed: {0}")]
    DeviceAuthFailed(String),

    /// Encryption failure
    #[error("encryption error: {0}")]
    Encryption(String),

    /// Decryption failure (wrong key or tampered data)
    #[error("decryption error: {0}")]
    Decryption(String),

    /// Key derivation failure
    #[error("key derivation error: {0}")]
    KeyDerivation(String),

    /// Stored vault data is malformed
    #[error("invalid vault data: {0}")]
    InvalidData(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Preference store error
    #[error("preferences error: {0}")]
    Preferences(#[from] latch_core::PreferencesError),
}

/// Result type alias for vault operations.
pub type Result<T> = std::result::Result<T, VaultError>;

//! Error types for the core crate.

use thiserror::Error;

/// Errors that can occur while reading or writing persisted preferences.
#[derive(Error, Debug)]
pub enum PreferencesError {
    /// I/O error reading or writing the preferences file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Preferences file contents could not be parsed or serialized
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias for preference operations.
pub type Result<T> = std::result::Result<T, PreferencesError>;

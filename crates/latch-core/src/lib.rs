//! Latch Core - Shared Domain Types
//!
//! Foundation crate for the Latch authentication core. Holds the enumerations
//! shared by the vault and authentication layers (`AuthProvider`,
//! `UnlockMode`, `Runtime`) and the small persisted preferences store that
//! remembers which identity provider and unlock mode were last active.
//!
//! Nothing in this crate touches the network or any secure storage; it is the
//! leaf of the dependency order (core → vault → auth).

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod preferences;
pub mod types;

pub use error::{PreferencesError, Result};
pub use preferences::{Preferences, AUTH_PROVIDER_KEY, LAST_UNLOCK_MODE_KEY};
pub use types::{AuthProvider, Runtime, UnlockMode};

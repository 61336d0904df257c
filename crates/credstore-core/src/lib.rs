//! # credstore-core
//!
//! Credential list manager for device discovery settings:
//! - Ordered username/password/description entries with stable handles
//! - Dirty tracking and synchronous change notification
//! - `[credentials]` key-value serialization and property-set loading
//! - Shared settings file reader/writer with per-section dispatch
//! - Toolkit-agnostic list/form presentation logic

pub mod entry;
pub mod error;
pub mod format;
pub mod panel;
pub mod section;
pub mod settings_file;
mod store;

pub use entry::{CredentialEntry, CredentialField};
pub use error::{CredStoreError, Result};
pub use panel::{CredentialPanel, CredentialRow, FormOutcome, FormRequest, FormResult};
pub use section::{LoadSummary, PropertyOutcome, SettingsSection};
pub use settings_file::{default_settings_path, LoadReport, SettingsDocument, SettingsFile};
pub use store::{ChangeCallback, CredentialStore, CredentialView, EntryHandle};

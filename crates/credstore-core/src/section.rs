//! Settings section contract and the credential store's property-set loader

use tracing::{debug, warn};

use crate::format::{unescape_value, PropertyKey};
use crate::store::CredentialStore;

/// Whether a section accepted a key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyOutcome {
    /// The key belongs to this section and was applied
    Consumed,
    /// The key is not recognised; the dispatcher may try other handlers
    NotHandled,
}

impl PropertyOutcome {
    pub fn is_consumed(&self) -> bool {
        matches!(self, Self::Consumed)
    }
}

/// A component that owns one `[category]` of a shared settings file
pub trait SettingsSection {
    /// Section name used to route keys
    fn category(&self) -> &str;

    /// Whether the section has unsaved changes
    fn has_changes(&self) -> bool;

    /// Enable or disable the section's surface, e.g. while a save is running
    fn set_enabled(&mut self, enabled: bool);

    /// Clear the dirty flag after a successful write
    fn acknowledge_saved(&mut self);

    /// Serialize the section, header line included
    fn save(&self) -> String;

    /// Apply one persisted key-value pair
    fn set_property(&mut self, key: &str, value: &str) -> PropertyOutcome;

    /// Called after the last pair of a load has been delivered
    fn finish_load(&mut self) {}

    /// Re-render from in-memory state and clear the dirty flag
    fn reset(&mut self);
}

/// Result of a completed property-set sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadSummary {
    /// Entries held after loading
    pub entries: usize,
    /// Value of the `count` key, if one was read
    pub declared_count: Option<usize>,
}

impl LoadSummary {
    /// True when a `count` key was read and disagrees with the loaded entries
    pub fn count_mismatch(&self) -> bool {
        matches!(self.declared_count, Some(declared) if declared != self.entries)
    }
}

impl CredentialStore {
    /// Apply one persisted key-value pair.
    ///
    /// `credential_<index>_<field>` grows the list with blank entries until
    /// `index` exists, then sets the field. `count` is recorded for
    /// validation. Values are unescaped only after an `escaping=1` marker;
    /// without it they are taken verbatim. Fields are applied immediately;
    /// the view is refreshed once per completed record rather than per field.
    /// Does not mark the store dirty.
    pub fn set_property(&mut self, key: &str, value: &str) -> PropertyOutcome {
        match PropertyKey::parse(key) {
            Some(PropertyKey::Entry(entry_key)) => {
                if self.load.open_record != Some(entry_key.index) {
                    self.close_record();
                    self.load.open_record = Some(entry_key.index);
                }

                let value = if self.load.escaped {
                    unescape_value(value)
                } else {
                    value.to_string()
                };
                self.entry_mut_growing(entry_key.index)
                    .set_field(entry_key.field, &value);

                debug!("Set credential {} {}", entry_key.index, entry_key.field);
                PropertyOutcome::Consumed
            }
            Some(PropertyKey::Count) => {
                self.load.open_record = None;
                match value.trim().parse::<usize>() {
                    Ok(count) => self.load.declared_count = Some(count),
                    Err(_) => warn!("Ignoring malformed credential count {:?}", value),
                }
                self.refresh();
                PropertyOutcome::Consumed
            }
            Some(PropertyKey::Escaping) => {
                self.load.escaped = value.trim() == "1";
                PropertyOutcome::Consumed
            }
            None => {
                debug!("Key not handled by credentials section: {}", key);
                PropertyOutcome::NotHandled
            }
        }
    }

    /// Finish a property-set sequence: refresh for the last open record and
    /// check the declared count against the loaded entries. A mismatch is
    /// logged but never truncates or pads the list.
    pub fn complete_load(&mut self) -> LoadSummary {
        self.close_record();

        let summary = LoadSummary {
            entries: self.count(),
            declared_count: self.load.declared_count.take(),
        };
        self.load.escaped = false;

        if summary.count_mismatch() {
            warn!(
                "Credential count mismatch: file declares {:?}, loaded {}",
                summary.declared_count, summary.entries
            );
        }

        summary
    }

    fn close_record(&mut self) {
        if self.load.open_record.take().is_some() {
            self.refresh();
        }
    }
}

impl SettingsSection for CredentialStore {
    fn category(&self) -> &str {
        CredentialStore::category(self)
    }

    fn has_changes(&self) -> bool {
        CredentialStore::has_changes(self)
    }

    fn set_enabled(&mut self, enabled: bool) {
        CredentialStore::set_enabled(self, enabled)
    }

    fn acknowledge_saved(&mut self) {
        CredentialStore::acknowledge_saved(self)
    }

    fn save(&self) -> String {
        CredentialStore::save(self)
    }

    fn set_property(&mut self, key: &str, value: &str) -> PropertyOutcome {
        CredentialStore::set_property(self, key, value)
    }

    fn finish_load(&mut self) {
        self.complete_load();
    }

    fn reset(&mut self) {
        CredentialStore::reset(self)
    }
}

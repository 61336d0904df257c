//! Toolkit-agnostic presentation logic for the credential list
//!
//! The panel tracks which row is selected, decides which buttons are
//! enabled, and turns add/edit clicks into [`FormRequest`]s. A toolkit shows
//! the form however it likes and later hands the user's answer back through
//! [`CredentialPanel::complete`]; nothing is committed before that.

use tracing::debug;

use crate::entry::CredentialEntry;
use crate::store::{CredentialStore, EntryHandle};

/// One rendered list row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRow {
    pub handle: EntryHandle,
    pub label: String,
}

/// Display text for an entry: `username (description)`, or just the
/// username when there is no description
pub fn row_label(entry: &CredentialEntry) -> String {
    if entry.description().is_empty() {
        entry.username().to_string()
    } else {
        format!("{} ({})", entry.username(), entry.description())
    }
}

/// An open add/edit form
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRequest {
    id: u64,
    /// Entry being edited, `None` when adding
    pub editing: Option<EntryHandle>,
    pub username: String,
    pub password: String,
    pub description: String,
    /// Whether the password field shows its text
    pub password_visible: bool,
}

impl FormRequest {
    pub fn title(&self) -> &'static str {
        if self.editing.is_some() {
            "Edit Credential"
        } else {
            "Add Credential"
        }
    }

    /// Flip password visibility, returning the new state
    pub fn toggle_password_visible(&mut self) -> bool {
        self.password_visible = !self.password_visible;
        self.password_visible
    }

    /// Label for the show/hide toggle
    pub fn password_toggle_label(&self) -> &'static str {
        if self.password_visible {
            "Hide"
        } else {
            "Show"
        }
    }
}

/// The user's answer to a form
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormOutcome {
    Confirm {
        username: String,
        password: String,
        description: String,
    },
    Cancel,
}

/// What completing a form did to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormResult {
    Added(EntryHandle),
    Updated(EntryHandle),
    /// Confirmed with an empty username; nothing changed
    Discarded,
    Cancelled,
    /// The form was superseded or its entry no longer exists
    Stale,
}

/// Selection and dialog state for one credential list
#[derive(Debug, Default)]
pub struct CredentialPanel {
    /// Selected entry and the store revision it was selected at
    selected: Option<(EntryHandle, u64)>,
    open_form: Option<u64>,
    next_form_id: u64,
}

impl CredentialPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows to display, in store order
    pub fn rows(&self, store: &CredentialStore) -> Vec<CredentialRow> {
        store
            .iter()
            .map(|(handle, entry)| CredentialRow {
                handle,
                label: row_label(entry),
            })
            .collect()
    }

    /// Select the row at `index`, or clear the selection
    pub fn select(&mut self, store: &CredentialStore, index: Option<usize>) {
        self.selected = index
            .and_then(|i| store.handle_at(i))
            .map(|handle| (handle, store.revision()));
    }

    /// Selected entry, if it is still current. Any refresh of the list
    /// since the selection was made clears it.
    pub fn selection(&self, store: &CredentialStore) -> Option<EntryHandle> {
        self.selected
            .filter(|(handle, revision)| {
                *revision == store.revision() && store.index_of(*handle).is_some()
            })
            .map(|(handle, _)| handle)
    }

    pub fn can_edit(&self, store: &CredentialStore) -> bool {
        self.selection(store).is_some()
    }

    pub fn can_remove(&self, store: &CredentialStore) -> bool {
        self.selection(store).is_some()
    }

    /// Open an empty form for a new entry
    pub fn request_add(&mut self) -> FormRequest {
        self.open(None, &CredentialEntry::default())
    }

    /// Open a form prefilled from the selected entry
    pub fn request_edit(&mut self, store: &CredentialStore) -> Option<FormRequest> {
        let handle = self.selection(store)?;
        let entry = store.entry(handle)?;
        Some(self.open(Some(handle), entry))
    }

    /// Remove the selected entry. Returns false without a selection.
    pub fn remove_selected(&mut self, store: &mut CredentialStore) -> bool {
        let Some(handle) = self.selection(store) else {
            return false;
        };
        self.selected = None;
        store.remove_entry(handle)
    }

    /// Apply the user's answer to `request`.
    ///
    /// A confirmed form is only committed when the username is non-empty as
    /// typed (no trimming); otherwise it is silently discarded.
    pub fn complete(
        &mut self,
        store: &mut CredentialStore,
        request: FormRequest,
        outcome: FormOutcome,
    ) -> FormResult {
        if self.open_form != Some(request.id) {
            debug!("Ignoring response for superseded form {}", request.id);
            return FormResult::Stale;
        }
        self.open_form = None;

        let (username, password, description) = match outcome {
            FormOutcome::Cancel => return FormResult::Cancelled,
            FormOutcome::Confirm {
                username,
                password,
                description,
            } => (username, password, description),
        };

        if username.is_empty() {
            debug!("Discarding credential form with empty username");
            return FormResult::Discarded;
        }

        self.selected = None;
        match request.editing {
            Some(handle) => {
                if store.edit_entry(handle, &username, &password, &description) {
                    FormResult::Updated(handle)
                } else {
                    FormResult::Stale
                }
            }
            None => FormResult::Added(store.add_credential(&username, &password, &description)),
        }
    }

    fn open(&mut self, editing: Option<EntryHandle>, entry: &CredentialEntry) -> FormRequest {
        self.next_form_id += 1;
        self.open_form = Some(self.next_form_id);

        FormRequest {
            id: self.next_form_id,
            editing,
            username: entry.username().to_string(),
            password: entry.password().to_string(),
            description: entry.description().to_string(),
            password_visible: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::rc::Rc;

    fn confirm(username: &str, password: &str, description: &str) -> FormOutcome {
        FormOutcome::Confirm {
            username: username.to_string(),
            password: password.to_string(),
            description: description.to_string(),
        }
    }

    #[test]
    fn test_row_labels() {
        assert_eq!(row_label(&CredentialEntry::new("admin", "pw", "cam1")), "admin (cam1)");
        assert_eq!(row_label(&CredentialEntry::new("root", "pw", "")), "root");
    }

    #[test]
    fn test_buttons_follow_selection() {
        let mut store = CredentialStore::new();
        store.add_credential("admin", "pw", "");
        let mut panel = CredentialPanel::new();

        assert!(!panel.can_edit(&store));
        assert!(!panel.can_remove(&store));

        panel.select(&store, Some(0));
        assert!(panel.can_edit(&store));
        assert!(panel.can_remove(&store));

        panel.select(&store, Some(3));
        assert!(!panel.can_edit(&store));
    }

    #[test]
    fn test_add_commits_only_on_confirm() {
        let mut store = CredentialStore::new();
        let mut panel = CredentialPanel::new();

        let request = panel.request_add();
        assert_eq!(request.title(), "Add Credential");
        assert_eq!(store.count(), 0);

        let result = panel.complete(&mut store, request, confirm("admin", "pw", "cam1"));
        assert!(matches!(result, FormResult::Added(_)));
        assert_eq!(panel.rows(&store)[0].label, "admin (cam1)");
        assert!(store.has_changes());
    }

    #[test]
    fn test_cancel_changes_nothing() {
        let mut store = CredentialStore::new();
        let mut panel = CredentialPanel::new();

        let request = panel.request_add();
        assert_eq!(panel.complete(&mut store, request, FormOutcome::Cancel), FormResult::Cancelled);
        assert_eq!(store.count(), 0);
        assert!(!store.has_changes());
    }

    #[test]
    fn test_empty_username_is_discarded_silently() {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let mut store = CredentialStore::with_change_callback(move || counter.set(counter.get() + 1));
        let mut panel = CredentialPanel::new();

        let request = panel.request_add();
        let result = panel.complete(&mut store, request, confirm("", "pw", "cam1"));

        assert_eq!(result, FormResult::Discarded);
        assert_eq!(store.count(), 0);
        assert!(!store.has_changes());
        assert_eq!(calls.get(), 0);
    }

    #[test]
    fn test_whitespace_username_is_kept_verbatim() {
        let mut store = CredentialStore::new();
        let mut panel = CredentialPanel::new();

        let request = panel.request_add();
        panel.complete(&mut store, request, confirm(" ", "", ""));
        assert_eq!(store.get(0).unwrap().username(), " ");
    }

    #[test]
    fn test_edit_prefills_and_replaces() {
        let mut store = CredentialStore::new();
        store.add_credential("admin", "pw", "cam1");
        store.acknowledge_saved();
        let mut panel = CredentialPanel::new();

        panel.select(&store, Some(0));
        let request = panel.request_edit(&store).unwrap();
        assert_eq!(request.title(), "Edit Credential");
        assert_eq!(request.username, "admin");
        assert_eq!(request.password, "pw");
        assert_eq!(request.description, "cam1");
        assert!(!request.password_visible);

        let result = panel.complete(&mut store, request, confirm("root", "", ""));
        assert!(matches!(result, FormResult::Updated(_)));
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0), Some(&CredentialEntry::new("root", "", "")));
        assert!(store.has_changes());
        assert!(panel.selection(&store).is_none());
    }

    #[test]
    fn test_edit_without_selection() {
        let mut store = CredentialStore::new();
        store.add_credential("admin", "pw", "");
        let mut panel = CredentialPanel::new();
        assert!(panel.request_edit(&store).is_none());
    }

    #[test]
    fn test_edit_of_removed_entry_is_stale() {
        let mut store = CredentialStore::new();
        store.add_credential("admin", "pw", "");
        let mut panel = CredentialPanel::new();

        panel.select(&store, Some(0));
        let request = panel.request_edit(&store).unwrap();
        store.remove_credential(0);

        let result = panel.complete(&mut store, request, confirm("root", "", ""));
        assert_eq!(result, FormResult::Stale);
        assert_eq!(store.count(), 0);
    }

    #[test]
    fn test_superseded_form_is_stale() {
        let mut store = CredentialStore::new();
        let mut panel = CredentialPanel::new();

        let first = panel.request_add();
        let second = panel.request_add();

        assert_eq!(panel.complete(&mut store, first, confirm("a", "", "")), FormResult::Stale);
        assert!(matches!(
            panel.complete(&mut store, second, confirm("b", "", "")),
            FormResult::Added(_)
        ));
        assert_eq!(store.count(), 1);
    }

    #[test]
    fn test_remove_selected() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        store.add_credential("b", "", "");
        let mut panel = CredentialPanel::new();

        assert!(!panel.remove_selected(&mut store));

        panel.select(&store, Some(1));
        assert!(panel.remove_selected(&mut store));
        assert_eq!(panel.rows(&store).len(), 1);
        assert_eq!(panel.rows(&store)[0].label, "a");
        assert!(!panel.can_remove(&store));
    }

    #[test]
    fn test_refresh_clears_selection() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        let mut panel = CredentialPanel::new();

        panel.select(&store, Some(0));
        store.add_credential("b", "", "");
        assert!(panel.selection(&store).is_none());
    }

    #[test]
    fn test_password_toggle() {
        let mut panel = CredentialPanel::new();
        let mut request = panel.request_add();
        assert_eq!(request.password_toggle_label(), "Show");
        assert!(request.toggle_password_visible());
        assert_eq!(request.password_toggle_label(), "Hide");
    }
}

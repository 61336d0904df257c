//! Credential store: an ordered, index-addressable list of entries with
//! change tracking

use std::fmt;

use tracing::{debug, info};

use crate::entry::CredentialEntry;
use crate::format;

/// Stable identity of an entry inside one store.
///
/// Handles survive reordering caused by removals; a handle whose entry was
/// removed is stale and every operation taking it becomes a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryHandle(u64);

impl EntryHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Rendering capability supplied by a presentation layer
pub trait CredentialView {
    /// Redraw the full list
    fn render(&mut self, entries: &[CredentialEntry]);

    /// Toggle whether the surface accepts input
    fn set_enabled(&mut self, _enabled: bool) {}
}

/// Callback invoked after every mutation
pub type ChangeCallback = Box<dyn FnMut()>;

/// Ordered credential list with a dirty flag and change notification.
///
/// Insertion order is display order and persisted order. All operations on
/// an invalid index or stale handle are silent no-ops.
pub struct CredentialStore {
    entries: Vec<CredentialEntry>,
    /// Parallel to `entries`
    handles: Vec<EntryHandle>,
    next_handle: u64,
    has_changes: bool,
    enabled: bool,
    /// Bumped on every refresh
    revision: u64,
    on_change: Option<ChangeCallback>,
    view: Option<Box<dyn CredentialView>>,
    pub(crate) load: LoadState,
}

/// Progress of an in-flight property-set sequence
#[derive(Debug, Default)]
pub(crate) struct LoadState {
    /// Index of the record currently receiving fields
    pub(crate) open_record: Option<usize>,
    /// Value of the last `count` key seen
    pub(crate) declared_count: Option<usize>,
    /// Set by an `escaping=1` marker
    pub(crate) escaped: bool,
}

impl CredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            handles: Vec::new(),
            next_handle: 1,
            has_changes: false,
            enabled: true,
            revision: 0,
            on_change: None,
            view: None,
            load: LoadState::default(),
        }
    }

    /// Create an empty store that calls `callback` after every mutation
    pub fn with_change_callback(callback: impl FnMut() + 'static) -> Self {
        let mut store = Self::new();
        store.set_change_callback(callback);
        store
    }

    /// Install or replace the change notification callback
    pub fn set_change_callback(&mut self, callback: impl FnMut() + 'static) {
        self.on_change = Some(Box::new(callback));
    }

    /// Attach a view and render the current list into it
    pub fn set_view(&mut self, view: Box<dyn CredentialView>) {
        self.view = Some(view);
        self.refresh();
    }

    /// Detach the current view
    pub fn take_view(&mut self) -> Option<Box<dyn CredentialView>> {
        self.view.take()
    }

    /// Append a new entry at the end
    pub fn add_credential(&mut self, username: &str, password: &str, description: &str) -> EntryHandle {
        let handle = self.push(CredentialEntry::new(username, password, description));
        info!("Added credential for {:?} at index {}", username, self.entries.len() - 1);

        self.refresh();
        self.mark_changed();
        handle
    }

    /// Remove the entry at `index`. Returns false if there is none.
    pub fn remove_credential(&mut self, index: usize) -> bool {
        if index >= self.entries.len() {
            debug!("Remove ignored, no credential at index {}", index);
            return false;
        }

        self.entries.remove(index);
        self.handles.remove(index);
        info!("Removed credential at index {}", index);

        self.refresh();
        self.mark_changed();
        true
    }

    /// Remove the entry identified by `handle`. Returns false if it is stale.
    pub fn remove_entry(&mut self, handle: EntryHandle) -> bool {
        match self.index_of(handle) {
            Some(index) => self.remove_credential(index),
            None => {
                debug!("Remove ignored, stale handle {:?}", handle);
                false
            }
        }
    }

    /// Overwrite all three fields of an existing entry in place
    pub fn edit_entry(
        &mut self,
        handle: EntryHandle,
        username: &str,
        password: &str,
        description: &str,
    ) -> bool {
        let Some(index) = self.index_of(handle) else {
            debug!("Edit ignored, stale handle {:?}", handle);
            return false;
        };

        self.entries[index].replace(username, password, description);
        info!("Updated credential at index {}", index);

        self.refresh();
        self.mark_changed();
        true
    }

    /// Drop every entry. Neither marks the store dirty nor notifies; call
    /// [`mark_changed`](Self::mark_changed) to record the clear as a change.
    pub fn clear_all(&mut self) {
        self.entries.clear();
        self.handles.clear();
        self.load = LoadState::default();
        self.refresh();
    }

    /// Record a change and notify the owner
    pub fn mark_changed(&mut self) {
        self.has_changes = true;
        if let Some(callback) = self.on_change.as_mut() {
            callback();
        }
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry at `index`, or `None` when out of range
    pub fn get(&self, index: usize) -> Option<&CredentialEntry> {
        self.entries.get(index)
    }

    /// Entry identified by `handle`
    pub fn entry(&self, handle: EntryHandle) -> Option<&CredentialEntry> {
        self.index_of(handle).map(|index| &self.entries[index])
    }

    pub fn entries(&self) -> &[CredentialEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntryHandle, &CredentialEntry)> {
        self.handles.iter().copied().zip(self.entries.iter())
    }

    /// Handle of the entry currently at `index`
    pub fn handle_at(&self, index: usize) -> Option<EntryHandle> {
        self.handles.get(index).copied()
    }

    /// Current position of the entry identified by `handle`
    pub fn index_of(&self, handle: EntryHandle) -> Option<usize> {
        self.handles.iter().position(|h| *h == handle)
    }

    /// Whether there are mutations since the last save or reset
    pub fn has_changes(&self) -> bool {
        self.has_changes
    }

    /// Clear the dirty flag after the owner persisted the store
    pub fn acknowledge_saved(&mut self) {
        self.has_changes = false;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Toggle whether the presentation surface accepts input
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
        if let Some(view) = self.view.as_mut() {
            view.set_enabled(enabled);
        }
    }

    /// 1 when there are unsaved changes, 0 otherwise
    pub fn state(&self) -> i32 {
        i32::from(self.has_changes)
    }

    /// Combined enable/acknowledge call used by integer-flag dispatchers:
    /// a non-zero flag enables the surface, zero disables it and clears the
    /// dirty flag.
    pub fn set_state(&mut self, flag: i32) {
        self.set_enabled(flag != 0);
        if flag == 0 {
            self.acknowledge_saved();
        }
    }

    /// Name of the settings section this store owns
    pub fn category(&self) -> &'static str {
        format::CATEGORY
    }

    /// Re-render from the in-memory list and clear the dirty flag.
    /// Loaded entries are kept.
    pub fn reset(&mut self) {
        self.refresh();
        self.has_changes = false;
    }

    /// Serialize every entry into a fresh `[credentials]` block
    pub fn save(&self) -> String {
        let mut out = String::new();
        // Writing to a String cannot fail
        let _ = self.write_to(&mut out);
        out
    }

    /// Serialize into a caller-supplied writer
    pub fn write_to<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        format::write_section(out, &self.entries)
    }

    /// Serialize into at most `max_bytes`, dropping trailing entries that do
    /// not fit. The `count` line reports only entries written.
    pub fn save_bounded(&self, max_bytes: usize) -> String {
        format::render_bounded(&self.entries, max_bytes).0
    }

    /// Number of view refreshes so far
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub(crate) fn refresh(&mut self) {
        self.revision += 1;
        debug!("Refreshing credential list ({} entries)", self.entries.len());
        if let Some(view) = self.view.as_mut() {
            view.render(&self.entries);
        }
    }

    /// Mutable access to `index`, padding with blank entries until it exists
    pub(crate) fn entry_mut_growing(&mut self, index: usize) -> &mut CredentialEntry {
        while self.entries.len() <= index {
            self.push(CredentialEntry::default());
        }
        &mut self.entries[index]
    }

    fn push(&mut self, entry: CredentialEntry) -> EntryHandle {
        let handle = EntryHandle(self.next_handle);
        self.next_handle += 1;
        self.entries.push(entry);
        self.handles.push(handle);
        handle
    }
}

impl Default for CredentialStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CredentialStore")
            .field("entries", &self.entries)
            .field("has_changes", &self.has_changes)
            .field("enabled", &self.enabled)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    fn counting_store() -> (CredentialStore, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        let counter = calls.clone();
        let store = CredentialStore::with_change_callback(move || counter.set(counter.get() + 1));
        (store, calls)
    }

    /// View that records the usernames of every render
    struct RecordingView {
        renders: Rc<RefCell<Vec<Vec<String>>>>,
        enabled: Rc<Cell<bool>>,
    }

    impl CredentialView for RecordingView {
        fn render(&mut self, entries: &[CredentialEntry]) {
            self.renders
                .borrow_mut()
                .push(entries.iter().map(|e| e.username().to_string()).collect());
        }

        fn set_enabled(&mut self, enabled: bool) {
            self.enabled.set(enabled);
        }
    }

    #[test]
    fn test_new_store_is_clean() {
        let store = CredentialStore::new();
        assert_eq!(store.count(), 0);
        assert!(!store.has_changes());
        assert_eq!(store.state(), 0);
        assert_eq!(store.category(), "credentials");
    }

    #[test]
    fn test_add_marks_dirty_and_notifies_once() {
        let (mut store, calls) = counting_store();

        store.add_credential("admin", "pw", "cam1");

        assert_eq!(store.count(), 1);
        assert_eq!(store.state(), 1);
        assert_eq!(calls.get(), 1);
        assert_eq!(store.get(0), Some(&CredentialEntry::new("admin", "pw", "cam1")));
    }

    #[test]
    fn test_duplicates_are_allowed() {
        let mut store = CredentialStore::new();
        let a = store.add_credential("admin", "pw", "");
        let b = store.add_credential("admin", "pw", "");
        assert_eq!(store.count(), 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_remove_by_index() {
        let (mut store, calls) = counting_store();
        store.add_credential("a", "", "");
        store.add_credential("b", "", "");
        store.acknowledge_saved();

        assert!(store.remove_credential(0));
        assert_eq!(store.count(), 1);
        assert_eq!(store.get(0).map(|e| e.username()), Some("b"));
        assert!(store.has_changes());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_remove_out_of_range_is_noop() {
        let (mut store, calls) = counting_store();
        store.add_credential("a", "", "");
        store.acknowledge_saved();

        assert!(!store.remove_credential(1));
        assert!(!store.remove_credential(usize::MAX));
        assert_eq!(store.count(), 1);
        assert!(!store.has_changes());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_handles_survive_removals() {
        let mut store = CredentialStore::new();
        let a = store.add_credential("a", "", "");
        let b = store.add_credential("b", "", "");
        let c = store.add_credential("c", "", "");

        assert!(store.remove_entry(a));
        assert_eq!(store.index_of(b), Some(0));
        assert_eq!(store.index_of(c), Some(1));
        assert_eq!(store.handle_at(1), Some(c));

        // Stale handle
        assert!(!store.remove_entry(a));
        assert_eq!(store.count(), 2);
        assert!(store.entry(a).is_none());
    }

    #[test]
    fn test_edit_replaces_all_fields() {
        let (mut store, calls) = counting_store();
        let handle = store.add_credential("admin", "pw", "cam1");
        store.acknowledge_saved();

        assert!(store.edit_entry(handle, "root", "", ""));
        assert_eq!(store.entry(handle), Some(&CredentialEntry::new("root", "", "")));
        assert!(store.has_changes());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_edit_stale_handle_is_noop() {
        let (mut store, calls) = counting_store();
        let handle = store.add_credential("admin", "pw", "");
        store.remove_entry(handle);
        store.acknowledge_saved();

        assert!(!store.edit_entry(handle, "x", "y", "z"));
        assert!(!store.has_changes());
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn test_clear_all_does_not_mark_dirty() {
        let (mut store, calls) = counting_store();
        store.add_credential("a", "", "");
        store.add_credential("b", "", "");
        store.acknowledge_saved();

        store.clear_all();
        assert_eq!(store.count(), 0);
        assert!(!store.has_changes());
        assert_eq!(calls.get(), 2);

        store.mark_changed();
        assert!(store.has_changes());
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn test_get_out_of_range() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        assert!(store.get(1).is_none());
        assert!(store.handle_at(1).is_none());
    }

    #[test]
    fn test_set_state_zero_clears_dirty() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        assert_eq!(store.state(), 1);

        store.set_state(0);
        assert_eq!(store.state(), 0);
        assert!(!store.is_enabled());

        store.set_state(1);
        assert!(store.is_enabled());
        assert_eq!(store.state(), 0);

        store.set_state(0);
        assert_eq!(store.state(), 0);
    }

    #[test]
    fn test_set_enabled_keeps_dirty_flag() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        store.set_enabled(false);
        assert!(store.has_changes());
    }

    #[test]
    fn test_reset_keeps_entries() {
        let mut store = CredentialStore::new();
        store.add_credential("a", "", "");
        store.reset();
        assert_eq!(store.count(), 1);
        assert!(!store.has_changes());
    }

    #[test]
    fn test_save_scenario() {
        let mut store = CredentialStore::new();
        store.add_credential("admin", "pw", "cam1");
        store.add_credential("root", "", "");

        assert_eq!(
            store.save(),
            "[credentials]\ncredential_0_username=admin\ncredential_0_password=pw\n\
             credential_0_description=cam1\ncredential_1_username=root\n\
             credential_1_password=\ncredential_1_description=\ncount=2\n"
        );
    }

    #[test]
    fn test_save_empty_store() {
        let store = CredentialStore::new();
        assert_eq!(store.save(), "[credentials]\ncount=0\n");
    }

    #[test]
    fn test_save_bounded_drops_trailing_entries() {
        let mut store = CredentialStore::new();
        for i in 0..50 {
            store.add_credential(&format!("user{}", i), "password", "rack 12 switch");
        }

        let out = store.save_bounded(1024);
        assert!(out.len() <= 1024);
        assert!(out.starts_with("[credentials]\n"));
        let written = out.lines().filter(|l| l.contains("_username=")).count();
        assert!(written < 50);
        assert!(out.ends_with(&format!("count={}\n", written)));
    }

    #[test]
    fn test_view_renders_on_mutation() {
        let renders = Rc::new(RefCell::new(Vec::new()));
        let enabled = Rc::new(Cell::new(true));
        let mut store = CredentialStore::new();
        store.set_view(Box::new(RecordingView {
            renders: renders.clone(),
            enabled: enabled.clone(),
        }));

        store.add_credential("admin", "", "");
        store.add_credential("root", "", "");
        store.remove_credential(0);

        let renders = renders.borrow();
        assert_eq!(renders.len(), 4);
        assert_eq!(renders.last().unwrap(), &vec!["root".to_string()]);

        store.set_enabled(false);
        assert!(!enabled.get());
    }

    #[test]
    fn test_revision_advances_on_refresh() {
        let mut store = CredentialStore::new();
        let before = store.revision();
        store.add_credential("a", "", "");
        assert!(store.revision() > before);
    }
}

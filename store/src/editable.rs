//! Per-key editing handles
//!
//! An [`EditableValue`] is what a rendered component holds for one content
//! key: the original, the effective value, the modified flag and whether an
//! edit is in progress.
//!
//! ```text
//! Viewing ──begin_edit──▶ Editing ──commit_edit──▶ Viewing (maybe modified)
//!    ▲                       │
//!    └──────cancel_edit──────┘        Viewing ──reset (when modified)──▶ Viewing(original)
//! ```

use crate::framing::ListFraming;
use crate::list::{ListEditState, ListStore};
use crate::store::{EditState, EditStore};

/// Whether a handle is showing content or holding an unsaved draft.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditMode<D> {
    Viewing,
    Editing { draft: D },
}

impl<D> EditMode<D> {
    pub fn is_editing(&self) -> bool {
        matches!(self, Self::Editing { .. })
    }
}

/// Editable single-string content.
#[derive(Debug)]
pub struct EditableValue {
    store: EditStore,
    content_key: String,
    original: String,
    state: EditState,
    mode: EditMode<String>,
}

impl EditableValue {
    /// Mount a handle, adopting any stored override.
    pub fn mount(store: &EditStore, content_key: impl Into<String>, original: impl Into<String>) -> Self {
        let content_key = content_key.into();
        let original = original.into();
        let state = store.initialize(&content_key, &original);
        Self {
            store: store.clone(),
            content_key,
            original,
            state,
            mode: EditMode::Viewing,
        }
    }

    pub fn content_key(&self) -> &str {
        &self.content_key
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn value(&self) -> &str {
        &self.state.value
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified
    }

    /// False when the last operation could not reach storage.
    pub fn is_synced(&self) -> bool {
        self.state.synced
    }

    pub fn state(&self) -> &EditState {
        &self.state
    }

    pub fn mode(&self) -> &EditMode<String> {
        &self.mode
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    /// Current draft while editing.
    pub fn draft(&self) -> Option<&str> {
        match &self.mode {
            EditMode::Editing { draft } => Some(draft),
            EditMode::Viewing => None,
        }
    }

    /// Enter edit mode with the current value as the draft. Keeps an
    /// existing draft if already editing.
    pub fn begin_edit(&mut self) {
        if !self.mode.is_editing() {
            self.mode = EditMode::Editing {
                draft: self.state.value.clone(),
            };
        }
    }

    /// Replace the draft. Ignored outside edit mode.
    pub fn update_draft(&mut self, text: impl Into<String>) {
        if let EditMode::Editing { draft } = &mut self.mode {
            *draft = text.into();
        }
    }

    /// Leave edit mode and discard the draft. Storage is untouched.
    pub fn cancel_edit(&mut self) {
        self.mode = EditMode::Viewing;
    }

    /// Save the draft. Returns false when not editing.
    pub fn commit_edit(&mut self) -> bool {
        match std::mem::replace(&mut self.mode, EditMode::Viewing) {
            EditMode::Editing { draft } => {
                self.save(draft);
                true
            }
            EditMode::Viewing => false,
        }
    }

    /// Save `new_value` and leave edit mode.
    pub fn save(&mut self, new_value: impl AsRef<str>) {
        self.state = self
            .store
            .save(&self.content_key, &self.original, new_value.as_ref());
        self.mode = EditMode::Viewing;
    }

    /// Restore the original. Only acts when the value is modified; returns
    /// whether it did.
    pub fn reset(&mut self) -> bool {
        if !self.state.is_modified {
            return false;
        }
        self.state = self.store.reset(&self.content_key, &self.original);
        self.mode = EditMode::Viewing;
        true
    }

    /// Re-read storage, as a fresh mount would. Leaves a draft in place.
    pub fn refresh(&mut self) {
        self.state = self.store.initialize(&self.content_key, &self.original);
    }
}

/// Editable list content (paragraphs or bullets), edited as framed text.
#[derive(Debug)]
pub struct EditableList {
    lists: ListStore,
    framing: ListFraming,
    content_key: String,
    original: Vec<String>,
    state: ListEditState,
    mode: EditMode<String>,
}

impl EditableList {
    pub fn mount(
        lists: &ListStore,
        framing: ListFraming,
        content_key: impl Into<String>,
        original: Vec<String>,
    ) -> Self {
        let content_key = content_key.into();
        let state = lists.initialize(&content_key, &original);
        Self {
            lists: lists.clone(),
            framing,
            content_key,
            original,
            state,
            mode: EditMode::Viewing,
        }
    }

    pub fn content_key(&self) -> &str {
        &self.content_key
    }

    pub fn framing(&self) -> ListFraming {
        self.framing
    }

    pub fn original(&self) -> &[String] {
        &self.original
    }

    pub fn items(&self) -> &[String] {
        &self.state.items
    }

    pub fn is_modified(&self) -> bool {
        self.state.is_modified
    }

    pub fn is_synced(&self) -> bool {
        self.state.synced
    }

    pub fn is_editing(&self) -> bool {
        self.mode.is_editing()
    }

    pub fn draft(&self) -> Option<&str> {
        match &self.mode {
            EditMode::Editing { draft } => Some(draft),
            EditMode::Viewing => None,
        }
    }

    /// Enter edit mode with the items rendered as text.
    pub fn begin_edit(&mut self) {
        if !self.mode.is_editing() {
            self.mode = EditMode::Editing {
                draft: self.framing.text_from_items(&self.state.items),
            };
        }
    }

    pub fn update_draft(&mut self, text: impl Into<String>) {
        if let EditMode::Editing { draft } = &mut self.mode {
            *draft = text.into();
        }
    }

    pub fn cancel_edit(&mut self) {
        self.mode = EditMode::Viewing;
    }

    /// Frame the draft into items and save them. Returns false when not
    /// editing.
    pub fn commit_edit(&mut self) -> bool {
        match std::mem::replace(&mut self.mode, EditMode::Viewing) {
            EditMode::Editing { draft } => {
                let items = self.framing.items_from_text(&draft);
                self.save(&items);
                true
            }
            EditMode::Viewing => false,
        }
    }

    pub fn save<S: AsRef<str>>(&mut self, items: &[S]) {
        self.state = self.lists.save(&self.content_key, &self.original, items);
        self.mode = EditMode::Viewing;
    }

    pub fn reset(&mut self) -> bool {
        if !self.state.is_modified {
            return false;
        }
        self.state = self.lists.reset(&self.content_key, &self.original);
        self.mode = EditMode::Viewing;
        true
    }

    pub fn refresh(&mut self) {
        self.state = self.lists.initialize(&self.content_key, &self.original);
    }
}

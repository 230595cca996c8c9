//! Selectable list controller
//!
//! Owns an ordered collection of entries bound to application payloads and
//! keeps a zero-or-one selection in sync with the rendered rows.
//!
//! # Architecture
//!
//! The controller never draws anything. Rendering goes through a
//! [`VisualHost`], which hands back an opaque handle per row, and selection
//! colors come from an injected [`ThemeLookup`]. Clicks arrive as handles via
//! [`Listbox::click`] and are resolved through a reverse map kept up to date
//! on every insert and removal.
//!
//! # Selection
//!
//! ```text
//! Unselected --set_selection(i)--> Selected(i)
//! Selected(i) --set_selection(None) | remove(i) | clear()--> Unselected
//! Selected(i) --set_selection(j)--> Selected(j)
//! ```
//!
//! Removing an entry *before* the selection is governed by
//! [`SelectionPolicy`].

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

use crate::error::ListError;
use crate::ui::theme::{Highlight, ThemeLookup};

/// Rendering side of the list.
///
/// One representation per entry; handles must be unique for as long as the
/// representation is attached.
pub trait VisualHost {
    type Handle: Copy + Eq + Hash + fmt::Debug;

    /// Append a representation showing `label` after all existing ones
    fn append(&mut self, label: &str) -> Self::Handle;

    /// Remove one representation
    fn detach(&mut self, handle: Self::Handle);

    /// Remove every representation
    fn detach_all(&mut self);

    /// Start delivering clicks on `handle` to the list
    fn listen_clicks(&mut self, handle: Self::Handle);

    /// Apply highlight colors, or restore the default style with `None`
    fn set_highlight(&mut self, handle: Self::Handle, highlight: Option<&Highlight>);
}

/// What happens to the selection when an entry before it is removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionPolicy {
    /// Keep the raw index even though it now names another entry (or none)
    Preserve,
    /// Keep the raw index while it is in bounds, clear it otherwise
    Revalidate,
    /// Move the index down so it keeps naming the same entry
    #[default]
    Shift,
}

struct Entry<K, T> {
    handle: K,
    payload: T,
}

/// List controller bound to a visual host
pub struct Listbox<H: VisualHost, T> {
    host: H,
    theme: Box<dyn ThemeLookup>,
    policy: SelectionPolicy,
    entries: Vec<Entry<H::Handle, T>>,
    /// Reverse map from handle to current index
    positions: HashMap<H::Handle, usize>,
    selection: Option<usize>,
    /// Row currently painted with the highlight colors
    highlighted: Option<H::Handle>,
}

impl<H: VisualHost, T> Listbox<H, T> {
    pub fn new(host: H, theme: impl ThemeLookup + 'static, policy: SelectionPolicy) -> Self {
        Self {
            host,
            theme: Box::new(theme),
            policy,
            entries: Vec::new(),
            positions: HashMap::new(),
            selection: None,
            highlighted: None,
        }
    }

    /// Append an entry and return its index.
    ///
    /// Duplicate labels are allowed.
    pub fn add(&mut self, label: &str, payload: T) -> usize {
        let index = self.entries.len();
        let handle = self.host.append(label);
        self.host.listen_clicks(handle);

        self.positions.insert(handle, index);
        self.entries.push(Entry { handle, payload });

        tracing::debug!("Added {:?} at {} ({:?})", label, index, handle);
        index
    }

    /// Remove the entry at `index`, shifting later entries down by one.
    ///
    /// `None` is a no-op.
    pub fn remove(&mut self, index: Option<usize>) -> Result<(), ListError> {
        let Some(index) = index else {
            return Ok(());
        };
        self.check(index)?;

        let entry = self.entries.remove(index);
        self.host.detach(entry.handle);
        self.positions.remove(&entry.handle);
        for (i, later) in self.entries.iter().enumerate().skip(index) {
            self.positions.insert(later.handle, i);
        }
        if self.highlighted == Some(entry.handle) {
            self.highlighted = None;
        }

        match self.selection {
            Some(selected) if selected == index => self.selection = None,
            Some(selected) if selected > index => self.reconcile_shifted(selected),
            _ => {}
        }

        tracing::debug!("Removed entry {}, selection now {:?}", index, self.selection);
        Ok(())
    }

    /// Remove every entry and drop the selection
    pub fn clear(&mut self) {
        self.host.detach_all();
        self.entries.clear();
        self.positions.clear();
        self.selection = None;
        self.highlighted = None;
        tracing::debug!("Cleared list");
    }

    /// Index of the entry rendered by `handle`
    pub fn index_of(&self, handle: H::Handle) -> Option<usize> {
        self.positions.get(&handle).copied()
    }

    /// Select `index`, or deselect with `None`.
    ///
    /// The previous row is restored to its default style before the new one
    /// is highlighted. An out-of-range index leaves everything untouched.
    pub fn set_selection(&mut self, index: Option<usize>) -> Result<(), ListError> {
        if let Some(index) = index {
            self.check(index)?;
        }

        self.unpaint();
        self.selection = index;
        if let Some(index) = index {
            self.paint(index);
        }

        tracing::debug!("Selection set to {:?}", index);
        Ok(())
    }

    /// Click delivered by the host for `handle`.
    ///
    /// Resolves the handle's current index and selects it; a handle that is
    /// no longer in the list deselects.
    pub fn click(&mut self, handle: H::Handle) -> Result<Option<usize>, ListError> {
        let index = self.index_of(handle);
        self.set_selection(index)?;
        Ok(index)
    }

    /// Select the entry after the current one, or the first when unselected
    pub fn select_next(&mut self) -> Result<(), ListError> {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return Ok(());
        };
        let next = match self.selection {
            Some(i) => (i + 1).min(last),
            None => 0,
        };
        self.set_selection(Some(next))
    }

    /// Select the entry before the current one, or the last when unselected
    pub fn select_previous(&mut self) -> Result<(), ListError> {
        let Some(last) = self.entries.len().checked_sub(1) else {
            return Ok(());
        };
        let previous = match self.selection {
            Some(i) => i.saturating_sub(1).min(last),
            None => last,
        };
        self.set_selection(Some(previous))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Raw selection value. Under [`SelectionPolicy::Preserve`] this may be
    /// stale or out of bounds.
    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    /// Payload of the selected entry, if the selection names one
    pub fn selected(&self) -> Option<&T> {
        self.selection.and_then(|i| self.get(i))
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.payload)
    }

    /// Payloads in list order
    #[allow(dead_code)] // Used by export once it lands
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.entries.iter().map(|e| &e.payload)
    }

    pub fn policy(&self) -> SelectionPolicy {
        self.policy
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    fn check(&self, index: usize) -> Result<(), ListError> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(ListError::IndexOutOfRange {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Apply the policy after an entry before `selected` went away
    fn reconcile_shifted(&mut self, selected: usize) {
        match self.policy {
            SelectionPolicy::Preserve => {}
            SelectionPolicy::Shift => self.selection = Some(selected - 1),
            SelectionPolicy::Revalidate => {
                self.unpaint();
                if selected < self.entries.len() {
                    self.paint(selected);
                } else {
                    self.selection = None;
                }
            }
        }
    }

    fn paint(&mut self, index: usize) {
        let highlight = Highlight::resolve(self.theme.as_ref());
        let handle = self.entries[index].handle;
        self.host.set_highlight(handle, Some(&highlight));
        self.highlighted = Some(handle);
    }

    /// Restore the previously selected row to its default style
    fn unpaint(&mut self) {
        let target = match self.policy {
            // The raw index is trusted even when entries shifted under it
            SelectionPolicy::Preserve => self.selection.and_then(|i| self.entries.get(i)).map(|e| e.handle),
            SelectionPolicy::Revalidate | SelectionPolicy::Shift => self.highlighted,
        };
        if let Some(handle) = target {
            self.host.set_highlight(handle, None);
        }
        self.highlighted = None;
    }
}

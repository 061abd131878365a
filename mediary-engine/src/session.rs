// SPDX-License-Identifier: AGPL-3.0-or-later
//! Per-caller session state
//!
//! Everything the engine used to reach for ambiently lives here instead:
//! current folder, the two clipboards, the multi-select set, the per-folder
//! item-count cache, and the pending conflict awaiting a decision. The
//! caller passes the session into every engine call that touches it; the
//! engine itself stays stateless across calls.

use mediary_core::{FolderPath, MediaItem};
use std::collections::{HashMap, HashSet};

use crate::clipboard::Clipboard;
use crate::conflict::NameConflict;
use crate::ops::TransferMode;

/// An item operation parked on a name conflict, re-driven by
/// `OperationEngine::resolve_conflict`
#[derive(Debug, Clone)]
pub struct PendingItemOp {
    pub item: MediaItem,
    pub dest: FolderPath,
    pub mode: TransferMode,
    pub conflict: NameConflict,
}

/// Mutable client-side state for one logical user session
#[derive(Default)]
pub struct Session {
    pub current_path: FolderPath,
    pub folder_clipboard: Clipboard<FolderPath>,
    pub item_clipboard: Clipboard<MediaItem>,
    /// Multi-select set of item ids
    pub selection: HashSet<String>,
    folder_counts: HashMap<String, u64>,
    pending_conflict: Option<PendingItemOp>,
}

impl Session {
    pub fn new() -> Self {
        Self {
            current_path: FolderPath::root(),
            folder_clipboard: Clipboard::new(),
            item_clipboard: Clipboard::new(),
            selection: HashSet::new(),
            folder_counts: HashMap::new(),
            pending_conflict: None,
        }
    }

    pub fn select(&mut self, id: impl Into<String>) {
        self.selection.insert(id.into());
    }

    pub fn deselect(&mut self, id: &str) {
        self.selection.remove(id);
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    pub fn cached_count(&self, path: &FolderPath) -> Option<u64> {
        self.folder_counts.get(&path.to_string()).copied()
    }

    pub fn set_cached_count(&mut self, path: &FolderPath, count: u64) {
        self.folder_counts.insert(path.to_string(), count);
    }

    /// Drop cached counts for `path` and everything below it.
    pub fn invalidate_counts(&mut self, path: &FolderPath) {
        self.folder_counts
            .retain(|cached, _| !FolderPath::parse(cached).starts_with(path));
    }

    pub fn pending_conflict(&self) -> Option<&PendingItemOp> {
        self.pending_conflict.as_ref()
    }

    pub fn set_pending_conflict(&mut self, pending: PendingItemOp) {
        self.pending_conflict = Some(pending);
    }

    pub fn take_pending_conflict(&mut self) -> Option<PendingItemOp> {
        self.pending_conflict.take()
    }
}

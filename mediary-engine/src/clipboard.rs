// SPDX-License-Identifier: AGPL-3.0-or-later
//! Copy/cut clipboard
//!
//! One generic slot shared by the folder and item clipboards, so the
//! copy/cut/paste lifecycle is written once. A new `set` replaces whatever
//! was held; a fully successful paste consumes a `Cut` payload but leaves a
//! `Copy` payload in place for repeated pastes.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClipboardKind {
    Copy,
    Cut,
}

/// At-most-one pending copy/cut payload
#[derive(Debug, Clone)]
pub struct Clipboard<P> {
    slot: Option<(ClipboardKind, Vec<P>)>,
}

impl<P> Default for Clipboard<P> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<P> Clipboard<P> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace any held payload unconditionally.
    pub fn set(&mut self, kind: ClipboardKind, payload: Vec<P>) {
        self.slot = Some((kind, payload));
    }

    pub fn clear(&mut self) {
        self.slot = None;
    }

    pub fn is_empty(&self) -> bool {
        self.slot.is_none()
    }

    pub fn kind(&self) -> Option<ClipboardKind> {
        self.slot.as_ref().map(|(kind, _)| *kind)
    }

    pub fn payload(&self) -> Option<&[P]> {
        self.slot.as_ref().map(|(_, payload)| payload.as_slice())
    }

    /// Called after every entry of a paste succeeded: `Cut` is consumed,
    /// `Copy` stays for the next paste.
    pub fn finish_paste(&mut self) {
        if self.kind() == Some(ClipboardKind::Cut) {
            self.clear();
        }
    }
}

impl<P: Clone> Clipboard<P> {
    pub fn snapshot(&self) -> Option<(ClipboardKind, Vec<P>)> {
        self.slot.clone()
    }
}

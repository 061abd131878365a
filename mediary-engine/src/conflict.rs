// SPDX-License-Identifier: AGPL-3.0-or-later
//! Destination-name conflict detection
//!
//! A conflict is a name already taken in the destination scope, checked
//! against both backends: the object-store listing of the destination prefix
//! and the metadata records whose path equals the destination. Resolution is
//! never automatic in interactive flows; the caller gets the conflicting
//! name plus a proposed unique alternative and must answer with a
//! [`ConflictResolution`].

use mediary_core::{FolderPath, KeyRoot, MediaryResult, MetadataStore, ObjectStore, Predicate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// Caller-supplied answer to a [`NameConflict`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictResolution {
    /// Keep the original name and write over whatever holds it.
    Overwrite,
    /// Write under the proposed unique name instead.
    Rename,
}

/// A detected collision awaiting a decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameConflict {
    pub conflicting_name: String,
    pub proposed_name: String,
}

/// First `stem(k)ext` not present in `existing`, counting k up from 1.
pub fn generate_unique_name(base: &str, existing: &HashSet<String>) -> String {
    let (stem, ext) = match base.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (base, String::new()),
    };
    let mut k = 1u32;
    loop {
        let candidate = format!("{stem}({k}){ext}");
        if !existing.contains(&candidate) {
            return candidate;
        }
        k += 1;
    }
}

/// Conflict checks against both backends
#[derive(Clone)]
pub struct ConflictResolver {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    root: KeyRoot,
}

impl ConflictResolver {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        root: KeyRoot,
    ) -> Self {
        Self {
            objects,
            metadata,
            root,
        }
    }

    /// Every name already taken directly inside `dest`: immediate child
    /// folders and blobs from the object store, plus stored filenames of
    /// metadata records living at `dest`.
    pub async fn existing_names(&self, dest: &FolderPath) -> MediaryResult<HashSet<String>> {
        let mut names = HashSet::new();

        let prefix = self.root.folder_key(dest);
        for key in self.objects.list_keys(&prefix).await? {
            let rel = self.root.relative_path(&key);
            if rel.is_empty() {
                continue;
            }
            let rel = FolderPath::parse(&rel);
            if rel.depth() > dest.depth() {
                names.insert(rel.segments()[dest.depth()].clone());
            }
        }

        let items = self
            .metadata
            .query(&Predicate::PathEquals(dest.to_string()), None, None, 0)
            .await?;
        for item in items {
            names.insert(item.display_name().to_string());
        }

        Ok(names)
    }

    pub async fn has_conflict(&self, dest: &FolderPath, name: &str) -> MediaryResult<bool> {
        Ok(self.existing_names(dest).await?.contains(name))
    }

    /// `None` when `name` is free in `dest`; otherwise the conflict plus a
    /// proposed unique alternative.
    pub async fn check(&self, dest: &FolderPath, name: &str) -> MediaryResult<Option<NameConflict>> {
        let existing = self.existing_names(dest).await?;
        if !existing.contains(name) {
            return Ok(None);
        }
        Ok(Some(NameConflict {
            conflicting_name: name.to_string(),
            proposed_name: generate_unique_name(name, &existing),
        }))
    }
}

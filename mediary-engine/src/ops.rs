// SPDX-License-Identifier: AGPL-3.0-or-later
//! Folder and item operations
//!
//! The object store has no recursive-rename primitive, so folder rename and
//! move are synthesized from enumerate/copy/repoint/delete. None of the
//! multi-step routines are transactional: a fault mid-sequence can leave an
//! orphaned blob (blob copied, metadata write failed) or both subtrees
//! partially populated. Every multi-entry routine therefore runs
//! best-effort — each failure is recorded and the loop continues — and
//! returns an itemized [`OpReport`] rather than a single boolean.
//!
//! Loops are strictly sequential, one backend round-trip at a time. There is
//! no mid-flight cancellation.

use bytes::Bytes;
use mediary_core::{
    key::encode_segment, tree, FolderNode, FolderPath, ItemPatch, KeyRoot, MediaItem,
    MediaryError, MediaryResult, MetadataStore, NewMediaItem, ObjectStore, Predicate, StorageKey,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::conflict::{ConflictResolution, ConflictResolver, NameConflict};
use crate::retry::RetryPolicy;
use crate::session::{PendingItemOp, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransferMode {
    Copy,
    Move,
}

/// Outcome of a single item write
#[derive(Debug, Clone)]
pub enum ItemTransfer {
    /// Written; the record now at the destination.
    Done(MediaItem),
    /// Nothing written; the caller must supply a [`ConflictResolution`].
    Conflict(NameConflict),
}

impl ItemTransfer {
    pub fn is_done(&self) -> bool {
        matches!(self, ItemTransfer::Done(_))
    }
}

/// One failed entry of a multi-entry operation
#[derive(Debug)]
pub struct OpFailure {
    pub entry: String,
    pub error: MediaryError,
}

/// Itemized outcome of a recursive or multi-entry operation
#[derive(Debug, Default)]
pub struct OpReport {
    pub succeeded: Vec<String>,
    pub failed: Vec<OpFailure>,
}

impl OpReport {
    pub fn ok(&mut self, entry: impl Into<String>) {
        self.succeeded.push(entry.into());
    }

    pub fn fail(&mut self, entry: impl Into<String>, error: MediaryError) {
        self.failed.push(OpFailure {
            entry: entry.into(),
            error,
        });
    }

    pub fn merge(&mut self, other: OpReport) {
        self.succeeded.extend(other.succeeded);
        self.failed.extend(other.failed);
    }

    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// "8 of 10 entries succeeded"
    pub fn summary(&self) -> String {
        let total = self.succeeded.len() + self.failed.len();
        format!("{} of {} entries succeeded", self.succeeded.len(), total)
    }
}

/// Drives both backends through folder/item create, rename, move, copy, and
/// delete. Stateless across calls; everything mutable lives on [`Session`].
pub struct OperationEngine {
    objects: Arc<dyn ObjectStore>,
    metadata: Arc<dyn MetadataStore>,
    resolver: ConflictResolver,
    root: KeyRoot,
    retry: RetryPolicy,
}

impl OperationEngine {
    pub fn new(
        objects: Arc<dyn ObjectStore>,
        metadata: Arc<dyn MetadataStore>,
        root: KeyRoot,
    ) -> Self {
        let resolver = ConflictResolver::new(objects.clone(), metadata.clone(), root.clone());
        Self {
            objects,
            metadata,
            resolver,
            root,
            retry: RetryPolicy::default(),
        }
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn resolver(&self) -> &ConflictResolver {
        &self.resolver
    }

    // ---- navigation ----

    /// Rebuild the folder tree from the object store's flat key listing.
    /// Only folder markers feed the builder; blob keys are not folders.
    pub async fn build_tree(&self) -> MediaryResult<Vec<FolderNode>> {
        let keys = self
            .objects
            .list_keys(&StorageKey::new(self.root.prefix()))
            .await?;
        let markers: Vec<StorageKey> = keys.into_iter().filter(StorageKey::is_folder_marker).collect();
        Ok(tree::build_tree(&markers, &self.root))
    }

    /// Immediate child folders of `path`; `NotFound` when the folder is
    /// neither the root nor present in the tree.
    pub async fn list_folder_children(&self, path: &FolderPath) -> MediaryResult<Vec<FolderNode>> {
        let roots = self.build_tree().await?;
        if path.is_root() {
            return Ok(roots);
        }
        tree::find_node(&roots, path)
            .map(|node| node.children.clone())
            .ok_or_else(|| MediaryError::NotFound(path.to_string()))
    }

    /// Move the session to `path` and return its child folders.
    pub async fn navigate(
        &self,
        session: &mut Session,
        path: FolderPath,
    ) -> MediaryResult<Vec<FolderNode>> {
        let children = self.list_folder_children(&path).await?;
        session.current_path = path;
        Ok(children)
    }

    /// Item count of one folder, served from the session cache when warm.
    pub async fn folder_item_count(
        &self,
        session: &mut Session,
        path: &FolderPath,
    ) -> MediaryResult<u64> {
        if let Some(count) = session.cached_count(path) {
            return Ok(count);
        }
        let count = self
            .metadata
            .count(&Predicate::PathEquals(path.to_string()))
            .await?;
        session.set_cached_count(path, count);
        Ok(count)
    }

    // ---- folder operations ----

    pub async fn create_folder(
        &self,
        parent: &FolderPath,
        name: &str,
    ) -> MediaryResult<FolderPath> {
        let name = validate_name(name)?;
        if self.resolver.has_conflict(parent, &name).await? {
            return Err(MediaryError::AlreadyExists(name));
        }
        self.objects
            .create_folder(&self.root.folder_key(parent), &encode_segment(&name))
            .await?;
        Ok(parent.join(&name))
    }

    /// Copy or move `source` (and its whole subtree) under `dest_parent`,
    /// keeping its name.
    pub async fn copy_or_move_folder(
        &self,
        session: &mut Session,
        source: &FolderPath,
        dest_parent: &FolderPath,
        mode: TransferMode,
    ) -> MediaryResult<OpReport> {
        let name = source
            .name()
            .ok_or_else(|| MediaryError::Validation("cannot move the root folder".into()))?;
        let dest = dest_parent.join(name);
        let report = self.transfer_folder(source, &dest, mode).await?;
        session.invalidate_counts(source);
        session.invalidate_counts(&dest);
        Ok(report)
    }

    /// Rename in place: a move to the same parent under the new name,
    /// through the same recursive machinery. No-op when the encoded name is
    /// unchanged.
    pub async fn rename_folder(
        &self,
        session: &mut Session,
        path: &FolderPath,
        new_name: &str,
    ) -> MediaryResult<OpReport> {
        let new_name = validate_name(new_name)?;
        let current = path
            .name()
            .ok_or_else(|| MediaryError::Validation("cannot rename the root folder".into()))?;
        if encode_segment(&new_name) == encode_segment(current) {
            return Ok(OpReport::default());
        }
        let dest = path.parent().unwrap_or_default().join(&new_name);
        let report = self.transfer_folder(path, &dest, TransferMode::Move).await?;
        session.invalidate_counts(path);
        session.invalidate_counts(&dest);
        Ok(report)
    }

    /// Recursive deletion of every key under `path`, delegated to the object
    /// store. Metadata records under the subtree are NOT cascaded; stale
    /// records are expected to be filtered by a path-still-exists check on
    /// the read side (see DESIGN.md).
    pub async fn delete_folder(&self, session: &mut Session, path: &FolderPath) -> MediaryResult<()> {
        if path.is_root() {
            return Err(MediaryError::Validation("cannot delete the root folder".into()));
        }
        self.objects.delete_folder(&self.root.folder_key(path)).await?;
        session.invalidate_counts(path);
        Ok(())
    }

    // ---- item operations ----

    /// Copy or move one item into `dest`. On a name collision nothing is
    /// written: the conflict is parked on the session and returned, and the
    /// caller answers through [`resolve_conflict`](Self::resolve_conflict).
    pub async fn copy_or_move_item(
        &self,
        session: &mut Session,
        item: &MediaItem,
        dest: &FolderPath,
        mode: TransferMode,
    ) -> MediaryResult<ItemTransfer> {
        match self.transfer_item(item, dest, mode, None).await? {
            ItemTransfer::Conflict(conflict) => {
                session.set_pending_conflict(PendingItemOp {
                    item: item.clone(),
                    dest: dest.clone(),
                    mode,
                    conflict: conflict.clone(),
                });
                Ok(ItemTransfer::Conflict(conflict))
            }
            done => {
                session.invalidate_counts(&FolderPath::parse(&item.path));
                session.invalidate_counts(dest);
                Ok(done)
            }
        }
    }

    /// Re-drive the operation parked by the last conflict with the caller's
    /// decision.
    pub async fn resolve_conflict(
        &self,
        session: &mut Session,
        resolution: ConflictResolution,
    ) -> MediaryResult<ItemTransfer> {
        let pending = session
            .take_pending_conflict()
            .ok_or_else(|| MediaryError::Validation("no conflict awaiting a decision".into()))?;
        let outcome = self
            .transfer_item(&pending.item, &pending.dest, pending.mode, Some(resolution))
            .await?;
        if outcome.is_done() {
            session.invalidate_counts(&FolderPath::parse(&pending.item.path));
            session.invalidate_counts(&pending.dest);
        }
        Ok(outcome)
    }

    /// Best-effort multi-delete: blob then record per item, failures recorded
    /// and skipped. A fully successful run clears the selection.
    pub async fn delete_items(
        &self,
        session: &mut Session,
        items: &[MediaItem],
    ) -> MediaryResult<OpReport> {
        let mut report = OpReport::default();
        let total = items.len();
        for (i, item) in items.iter().enumerate() {
            debug!(step = i + 1, total, item = %item.display_name(), "deleting item");
            let folder = FolderPath::parse(&item.path);
            let label = item_label(&folder, item.display_name());
            let key = self.root.blob_key(&folder, item.display_name());

            match self.objects.delete_blob(&key).await {
                Ok(()) => {}
                Err(MediaryError::NotFound(_)) => {
                    warn!(key = %key, "blob already gone, deleting record anyway");
                }
                Err(err) => {
                    report.fail(label, err);
                    continue;
                }
            }
            match self.retry.run(|| self.metadata.delete(&item.id)).await {
                Ok(()) => {
                    session.invalidate_counts(&folder);
                    report.ok(label);
                }
                Err(err) => report.fail(label, err),
            }
        }
        if report.is_complete() {
            session.clear_selection();
        }
        Ok(report)
    }

    pub async fn download_item(&self, item: &MediaItem) -> MediaryResult<Bytes> {
        let folder = FolderPath::parse(&item.path);
        let key = self.root.blob_key(&folder, item.display_name());
        self.objects.download_blob(&key).await
    }

    /// Best-effort multi-download; missing blobs are reported and skipped.
    pub async fn download_items(
        &self,
        items: &[MediaItem],
    ) -> (Vec<(String, Bytes)>, OpReport) {
        let mut files = Vec::new();
        let mut report = OpReport::default();
        let total = items.len();
        for (i, item) in items.iter().enumerate() {
            debug!(step = i + 1, total, item = %item.display_name(), "downloading item");
            let name = item.display_name().to_string();
            match self.download_item(item).await {
                Ok(data) => {
                    report.ok(name.clone());
                    files.push((name, data));
                }
                Err(err) => {
                    warn!(item = %name, error = %err, "download failed, continuing");
                    report.fail(name, err);
                }
            }
        }
        (files, report)
    }

    /// Ingest: conflict-checked blob upload plus metadata insert. `record`'s
    /// path and filename are overwritten with the actual destination.
    pub async fn upload_item(
        &self,
        dest: &FolderPath,
        record: NewMediaItem,
        data: Bytes,
        decision: Option<ConflictResolution>,
    ) -> MediaryResult<ItemTransfer> {
        let name = record
            .file_name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| MediaryError::Validation("upload requires a file name".into()))?
            .to_string();

        let mut dest_name = name.clone();
        if let Some(conflict) = self.resolver.check(dest, &name).await? {
            match decision {
                None => return Ok(ItemTransfer::Conflict(conflict)),
                Some(ConflictResolution::Rename) => dest_name = conflict.proposed_name,
                Some(ConflictResolution::Overwrite) => {}
            }
        }

        self.objects
            .upload_blob(&self.root.blob_key(dest, &dest_name), data)
            .await?;

        let mut record = record;
        record.path = dest.to_string();
        record.file_name = Some(dest_name);
        let created = self.retry.run(|| self.metadata.insert(record.clone())).await?;
        Ok(ItemTransfer::Done(created))
    }

    // ---- clipboard ----

    /// Paste whichever clipboard is loaded into `dest`, folder clipboard
    /// first. A fully successful paste consumes a Cut payload and clears the
    /// selection; partial outcomes leave the clipboard for a retry.
    pub async fn paste(&self, session: &mut Session, dest: &FolderPath) -> MediaryResult<OpReport> {
        if let Some((kind, folders)) = session.folder_clipboard.snapshot() {
            let mode = transfer_mode(kind);
            let mut report = OpReport::default();
            for folder in &folders {
                let Some(name) = folder.name() else {
                    report.fail(
                        folder.to_string(),
                        MediaryError::Validation("cannot paste the root folder".into()),
                    );
                    continue;
                };
                let target = dest.join(name);
                match self.transfer_folder(folder, &target, mode).await {
                    Ok(sub) => report.merge(sub),
                    Err(err) => report.fail(folder.to_string(), err),
                }
                session.invalidate_counts(folder);
            }
            session.invalidate_counts(dest);
            if report.is_complete() {
                session.folder_clipboard.finish_paste();
            }
            return Ok(report);
        }

        if let Some((kind, items)) = session.item_clipboard.snapshot() {
            let mode = transfer_mode(kind);
            let mut report = OpReport::default();
            let total = items.len();
            for (i, item) in items.iter().enumerate() {
                debug!(step = i + 1, total, item = %item.display_name(), "pasting item");
                let src_folder = FolderPath::parse(&item.path);
                let label = item_label(&src_folder, item.display_name());
                match self.transfer_item(item, dest, mode, None).await {
                    Ok(ItemTransfer::Done(_)) => {
                        session.invalidate_counts(&src_folder);
                        report.ok(label);
                    }
                    Ok(ItemTransfer::Conflict(conflict)) => {
                        if session.pending_conflict().is_none() {
                            session.set_pending_conflict(PendingItemOp {
                                item: item.clone(),
                                dest: dest.clone(),
                                mode,
                                conflict: conflict.clone(),
                            });
                        }
                        report.fail(
                            label,
                            MediaryError::Conflict {
                                conflicting_name: conflict.conflicting_name,
                                proposed_name: conflict.proposed_name,
                            },
                        );
                    }
                    Err(err) => {
                        warn!(item = %item.display_name(), error = %err, "paste failed, continuing");
                        report.fail(label, err);
                    }
                }
            }
            session.invalidate_counts(dest);
            if report.is_complete() {
                session.item_clipboard.finish_paste();
                session.clear_selection();
            }
            return Ok(report);
        }

        Err(MediaryError::Validation("clipboard is empty".into()))
    }

    // ---- internals ----

    /// The five-step single-item transfer. With no `decision`, a collision
    /// aborts before anything is written and the conflict is returned.
    async fn transfer_item(
        &self,
        item: &MediaItem,
        dest: &FolderPath,
        mode: TransferMode,
        decision: Option<ConflictResolution>,
    ) -> MediaryResult<ItemTransfer> {
        let src_folder = FolderPath::parse(&item.path);
        let file_name = item.display_name().to_string();

        let mut dest_name = file_name.clone();
        if let Some(conflict) = self.resolver.check(dest, &file_name).await? {
            match decision {
                None => return Ok(ItemTransfer::Conflict(conflict)),
                Some(ConflictResolution::Rename) => dest_name = conflict.proposed_name,
                Some(ConflictResolution::Overwrite) => {}
            }
        }

        let src_key = self.root.blob_key(&src_folder, &file_name);
        let dst_key = self.root.blob_key(dest, &dest_name);

        self.objects.copy_blob(&src_key, &dst_key).await?;

        // Blob is at the destination from here on. A metadata failure below
        // leaves it orphaned; there is no rollback.
        match mode {
            TransferMode::Copy => {
                let mut record = item.clone_into(dest.to_string());
                if dest_name != file_name {
                    record.file_name = Some(dest_name);
                }
                let created = self.retry.run(|| self.metadata.insert(record.clone())).await?;
                Ok(ItemTransfer::Done(created))
            }
            TransferMode::Move => {
                let mut patch = ItemPatch::path(dest.to_string());
                if dest_name != file_name {
                    patch.file_name = Some(dest_name);
                }
                let updated = self
                    .retry
                    .run(|| self.metadata.patch(&item.id, &patch))
                    .await?;
                self.objects.delete_blob(&src_key).await?;
                Ok(ItemTransfer::Done(updated))
            }
        }
    }

    /// Recursive subtree transfer: destination markers shallow-first, then
    /// exact-path item migration per folder. Collisions inside the recursion
    /// auto-rename — there is no decision point mid-sequence. For Move the
    /// source subtree is deleted only after a fully clean run.
    async fn transfer_folder(
        &self,
        source: &FolderPath,
        dest: &FolderPath,
        mode: TransferMode,
    ) -> MediaryResult<OpReport> {
        if source.is_root() {
            return Err(MediaryError::Validation("cannot move the root folder".into()));
        }
        if dest.starts_with(source) {
            return Err(MediaryError::Validation(format!(
                "cannot move '{source}' into itself"
            )));
        }

        let src_prefix = self.root.folder_key(source);
        let keys = self.objects.list_keys(&src_prefix).await?;

        // Folder paths of the subtree relative to `source`, ancestors before
        // descendants; the empty string is `source` itself. Ancestors are
        // synthesized even when their marker key is missing.
        let mut rel_folders: Vec<String> = vec![String::new()];
        let mut seen: HashSet<String> = HashSet::new();
        for key in &keys {
            let rel = self.root.relative_path(key);
            if rel.is_empty() {
                continue;
            }
            let full = FolderPath::parse(&rel);
            let folder = if key.is_folder_marker() {
                full
            } else {
                match full.parent() {
                    Some(parent) => parent,
                    None => continue,
                }
            };
            if !folder.starts_with(source) {
                continue;
            }
            let mut chain = Vec::new();
            let mut cursor = folder;
            while cursor.depth() > source.depth() {
                chain.push(cursor.segments()[source.depth()..].join("/"));
                cursor = cursor.parent().unwrap_or_default();
            }
            for rel_path in chain.into_iter().rev() {
                if seen.insert(rel_path.clone()) {
                    rel_folders.push(rel_path);
                }
            }
        }

        let mut report = OpReport::default();
        for rel in &rel_folders {
            let src_folder = if rel.is_empty() {
                source.clone()
            } else {
                source.join(rel)
            };
            let dst_folder = if rel.is_empty() {
                dest.clone()
            } else {
                dest.join(rel)
            };

            let parent = dst_folder.parent().unwrap_or_default();
            let Some(name) = dst_folder.name() else {
                continue;
            };
            if let Err(err) = self
                .objects
                .create_folder(&self.root.folder_key(&parent), &encode_segment(name))
                .await
            {
                warn!(folder = %dst_folder, error = %err, "marker creation failed, skipping subtree level");
                report.fail(dst_folder.to_string(), err);
                continue;
            }

            let items = match self
                .metadata
                .query(
                    &Predicate::PathEquals(src_folder.to_string()),
                    None,
                    None,
                    0,
                )
                .await
            {
                Ok(items) => items,
                Err(err) => {
                    report.fail(src_folder.to_string(), err);
                    continue;
                }
            };

            let total = items.len();
            for (i, item) in items.iter().enumerate() {
                debug!(
                    step = i + 1,
                    total,
                    folder = %src_folder,
                    item = %item.display_name(),
                    "migrating item"
                );
                let label = item_label(&src_folder, item.display_name());
                match self
                    .transfer_item(item, &dst_folder, mode, Some(ConflictResolution::Rename))
                    .await
                {
                    Ok(ItemTransfer::Done(_)) => report.ok(label),
                    Ok(ItemTransfer::Conflict(conflict)) => report.fail(
                        label,
                        MediaryError::Conflict {
                            conflicting_name: conflict.conflicting_name,
                            proposed_name: conflict.proposed_name,
                        },
                    ),
                    Err(err) => {
                        warn!(item = %item.display_name(), error = %err, "item migration failed, continuing");
                        report.fail(label, err);
                    }
                }
            }
        }

        if mode == TransferMode::Move {
            if report.is_complete() {
                self.objects.delete_folder(&src_prefix).await?;
            } else {
                warn!(
                    failed = report.failed.len(),
                    source = %source,
                    "partial move, leaving source subtree in place"
                );
            }
        }

        Ok(report)
    }
}

fn transfer_mode(kind: crate::clipboard::ClipboardKind) -> TransferMode {
    match kind {
        crate::clipboard::ClipboardKind::Copy => TransferMode::Copy,
        crate::clipboard::ClipboardKind::Cut => TransferMode::Move,
    }
}

fn item_label(folder: &FolderPath, name: &str) -> String {
    if folder.is_root() {
        name.to_string()
    } else {
        format!("{folder}/{name}")
    }
}

/// Rejects empty names and embedded separators before any network call.
fn validate_name(name: &str) -> MediaryResult<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(MediaryError::Validation("name must not be empty".into()));
    }
    if trimmed.contains('/') {
        return Err(MediaryError::Validation("name must not contain '/'".into()));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_name() {
        assert_eq!(validate_name("  trips ").unwrap(), "trips");
        assert!(validate_name("").is_err());
        assert!(validate_name("   ").is_err());
        assert!(validate_name("a/b").is_err());
    }

    #[test]
    fn test_report_summary_and_merge() {
        let mut report = OpReport::default();
        report.ok("a.mp4");
        report.fail("b.mp4", MediaryError::NotFound("b.mp4".into()));

        let mut other = OpReport::default();
        other.ok("c.mp4");
        report.merge(other);

        assert!(!report.is_complete());
        assert_eq!(report.summary(), "2 of 3 entries succeeded");
    }

    #[test]
    fn test_item_label() {
        assert_eq!(item_label(&FolderPath::root(), "a.mp4"), "a.mp4");
        assert_eq!(item_label(&FolderPath::parse("trips"), "a.mp4"), "trips/a.mp4");
    }
}

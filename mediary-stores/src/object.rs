// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory object store
//!
//! Keys live in a sorted map so prefix listing and recursive deletion are
//! range scans. Folder markers are zero-byte entries whose key ends in `/`,
//! matching the key shapes produced by `mediary_core::key`.

use async_trait::async_trait;
use bytes::Bytes;
use mediary_core::{MediaryError, MediaryResult, ObjectStore, StorageKey};
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// In-memory [`ObjectStore`]
#[derive(Default)]
pub struct MemoryObjectStore {
    entries: RwLock<BTreeMap<String, Bytes>>,
}

impl MemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, markers included. Test helper.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn contains(&self, key: &StorageKey) -> bool {
        self.entries.read().await.contains_key(key.as_str())
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn create_folder(
        &self,
        parent_prefix: &StorageKey,
        encoded_name: &str,
    ) -> MediaryResult<()> {
        let marker = format!("{}{}/", parent_prefix.as_str(), encoded_name);
        self.entries.write().await.insert(marker, Bytes::new());
        Ok(())
    }

    async fn delete_folder(&self, prefix: &StorageKey) -> MediaryResult<()> {
        let mut entries = self.entries.write().await;
        let doomed: Vec<String> = entries
            .range(prefix.as_str().to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix.as_str()))
            .map(|(k, _)| k.clone())
            .collect();
        tracing::debug!(prefix = %prefix, keys = doomed.len(), "deleting folder subtree");
        for key in doomed {
            entries.remove(&key);
        }
        Ok(())
    }

    async fn list_keys(&self, prefix: &StorageKey) -> MediaryResult<Vec<StorageKey>> {
        let entries = self.entries.read().await;
        Ok(entries
            .range(prefix.as_str().to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix.as_str()))
            .map(|(k, _)| StorageKey::new(k.clone()))
            .collect())
    }

    async fn copy_blob(&self, src: &StorageKey, dst: &StorageKey) -> MediaryResult<()> {
        let mut entries = self.entries.write().await;
        let data = entries
            .get(src.as_str())
            .cloned()
            .ok_or_else(|| MediaryError::NotFound(src.to_string()))?;
        entries.insert(dst.as_str().to_string(), data);
        Ok(())
    }

    async fn delete_blob(&self, key: &StorageKey) -> MediaryResult<()> {
        self.entries
            .write()
            .await
            .remove(key.as_str())
            .map(|_| ())
            .ok_or_else(|| MediaryError::NotFound(key.to_string()))
    }

    async fn upload_blob(&self, key: &StorageKey, data: Bytes) -> MediaryResult<()> {
        self.entries
            .write()
            .await
            .insert(key.as_str().to_string(), data);
        Ok(())
    }

    async fn download_blob(&self, key: &StorageKey) -> MediaryResult<Bytes> {
        self.entries
            .read()
            .await
            .get(key.as_str())
            .cloned()
            .ok_or_else(|| MediaryError::NotFound(key.to_string()))
    }
}

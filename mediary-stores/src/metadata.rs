// SPDX-License-Identifier: AGPL-3.0-or-later
//! In-memory metadata store
//!
//! Record identities are `it_<n>` with a monotonic counter; query evaluation
//! reuses `Predicate::matches` and `Sort::compare` from `mediary-core` so the
//! behavior stays aligned with what the engine assumes of the real service.

use async_trait::async_trait;
use chrono::Utc;
use mediary_core::{
    ItemPatch, MediaItem, MediaryError, MediaryResult, MetadataStore, NewMediaItem, Predicate,
    Sort,
};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// In-memory [`MetadataStore`]
#[derive(Default)]
pub struct MemoryMetadataStore {
    records: RwLock<Vec<MediaItem>>,
    next_id: AtomicU64,
}

impl MemoryMetadataStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total record count. Test helper.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }

    pub async fn get(&self, id: &str) -> Option<MediaItem> {
        self.records.read().await.iter().find(|r| r.id == id).cloned()
    }
}

#[async_trait]
impl MetadataStore for MemoryMetadataStore {
    async fn query(
        &self,
        predicate: &Predicate,
        sort: Option<&Sort>,
        limit: Option<usize>,
        offset: usize,
    ) -> MediaryResult<Vec<MediaItem>> {
        let records = self.records.read().await;
        let mut matched: Vec<MediaItem> = records
            .iter()
            .filter(|r| predicate.matches(r))
            .cloned()
            .collect();

        if let Some(sort) = sort {
            matched.sort_by(|a, b| sort.compare(a, b));
        }

        let matched = matched.into_iter().skip(offset);
        Ok(match limit {
            Some(limit) => matched.take(limit).collect(),
            None => matched.collect(),
        })
    }

    async fn count(&self, predicate: &Predicate) -> MediaryResult<u64> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| predicate.matches(r)).count() as u64)
    }

    async fn insert(&self, record: NewMediaItem) -> MediaryResult<MediaItem> {
        let id = format!("it_{}", self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        let item = MediaItem {
            id,
            user: record.user,
            path: record.path,
            file_name: record.file_name,
            prompt: record.prompt,
            model: record.model,
            tags: record.tags,
            notes: record.notes,
            rating: record.rating,
            favorite: record.favorite,
            status: record.status,
            created_at: Utc::now(),
        };
        self.records.write().await.push(item.clone());
        Ok(item)
    }

    async fn patch(&self, id: &str, patch: &ItemPatch) -> MediaryResult<MediaItem> {
        let mut records = self.records.write().await;
        let item = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| MediaryError::NotFound(id.to_string()))?;
        patch.apply(item);
        Ok(item.clone())
    }

    async fn delete(&self, id: &str) -> MediaryResult<()> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(MediaryError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mediary_core::{SortDirection, SortKey};

    fn record(path: &str, file_name: &str, rating: u8) -> NewMediaItem {
        NewMediaItem {
            user: "u1".into(),
            path: path.into(),
            file_name: Some(file_name.into()),
            rating,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_assigns_identity() {
        let store = MemoryMetadataStore::new();
        let a = store.insert(record("", "a.mp4", 1)).await.unwrap();
        let b = store.insert(record("", "b.mp4", 2)).await.unwrap();
        assert_ne!(a.id, b.id);
        assert!(store.get(&a.id).await.is_some());
    }

    #[tokio::test]
    async fn test_query_filters_sorts_and_pages() {
        let store = MemoryMetadataStore::new();
        for (name, rating) in [("c.mp4", 2), ("a.mp4", 5), ("b.mp4", 1)] {
            store.insert(record("trips", name, rating)).await.unwrap();
        }
        store.insert(record("family", "d.mp4", 4)).await.unwrap();

        let sort = Sort::new(SortKey::Rating, SortDirection::Descending);
        let page = store
            .query(
                &Predicate::PathEquals("trips".into()),
                Some(&sort),
                Some(2),
                0,
            )
            .await
            .unwrap();
        assert_eq!(page.len(), 2);
        assert_eq!(page[0].file_name.as_deref(), Some("a.mp4"));
        assert_eq!(page[1].file_name.as_deref(), Some("c.mp4"));

        let rest = store
            .query(
                &Predicate::PathEquals("trips".into()),
                Some(&sort),
                Some(2),
                2,
            )
            .await
            .unwrap();
        assert_eq!(rest.len(), 1);
        assert_eq!(rest[0].file_name.as_deref(), Some("b.mp4"));
    }

    #[tokio::test]
    async fn test_count_ignores_paging() {
        let store = MemoryMetadataStore::new();
        for i in 0..5 {
            store
                .insert(record("trips", &format!("{i}.mp4"), 0))
                .await
                .unwrap();
        }
        let n = store.count(&Predicate::PathEquals("trips".into())).await.unwrap();
        assert_eq!(n, 5);
    }

    #[tokio::test]
    async fn test_patch_and_delete() {
        let store = MemoryMetadataStore::new();
        let item = store.insert(record("trips", "a.mp4", 0)).await.unwrap();

        let patched = store
            .patch(&item.id, &ItemPatch::path("travel"))
            .await
            .unwrap();
        assert_eq!(patched.path, "travel");

        store.delete(&item.id).await.unwrap();
        assert!(matches!(
            store.delete(&item.id).await,
            Err(MediaryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_patch_missing_is_not_found() {
        let store = MemoryMetadataStore::new();
        assert!(matches!(
            store.patch("it_404", &ItemPatch::default()).await,
            Err(MediaryError::NotFound(_))
        ));
    }
}

//! Backend traits
//!
//! The organizer reconciles two independent services: a flat, key-addressed
//! object store holding blobs and folder markers, and a record-oriented
//! metadata store holding one [`MediaItem`] per blob. Both are external;
//! these traits are the seam the engine drives them through.

use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{ItemPatch, MediaItem, MediaryResult, NewMediaItem, StorageKey};

/// Flat, key-addressed blob store
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Create a folder marker `<parent_prefix><encoded_name>/`. The name must
    /// already be segment-encoded.
    async fn create_folder(&self, parent_prefix: &StorageKey, encoded_name: &str)
        -> MediaryResult<()>;

    /// Recursively delete every key under `prefix`, markers included.
    async fn delete_folder(&self, prefix: &StorageKey) -> MediaryResult<()>;

    /// Flat listing of every key starting with `prefix`; may include keys
    /// nested arbitrarily deep.
    async fn list_keys(&self, prefix: &StorageKey) -> MediaryResult<Vec<StorageKey>>;

    async fn copy_blob(&self, src: &StorageKey, dst: &StorageKey) -> MediaryResult<()>;
    async fn delete_blob(&self, key: &StorageKey) -> MediaryResult<()>;
    async fn upload_blob(&self, key: &StorageKey, data: Bytes) -> MediaryResult<()>;
    async fn download_blob(&self, key: &StorageKey) -> MediaryResult<Bytes>;
}

/// Record-oriented metadata store
#[async_trait]
pub trait MetadataStore: Send + Sync {
    async fn query(
        &self,
        predicate: &Predicate,
        sort: Option<&Sort>,
        limit: Option<usize>,
        offset: usize,
    ) -> MediaryResult<Vec<MediaItem>>;

    async fn count(&self, predicate: &Predicate) -> MediaryResult<u64>;
    async fn insert(&self, record: NewMediaItem) -> MediaryResult<MediaItem>;
    async fn patch(&self, id: &str, patch: &ItemPatch) -> MediaryResult<MediaItem>;
    async fn delete(&self, id: &str) -> MediaryResult<()>;
}

/// Fields a filter can test for exact equality
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemField {
    User,
    Model,
    Status,
    Favorite,
    Rating,
}

/// Text fields the substring search runs across
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextField {
    Prompt,
    Model,
    FileName,
}

impl TextField {
    /// All fields the default search covers.
    pub fn all() -> &'static [TextField] {
        &[TextField::Prompt, TextField::Model, TextField::FileName]
    }

    fn value<'a>(&self, item: &'a MediaItem) -> Option<&'a str> {
        match self {
            TextField::Prompt => item.prompt.as_deref(),
            TextField::Model => item.model.as_deref(),
            TextField::FileName => item.file_name.as_deref(),
        }
    }
}

/// Query predicate, evaluated by the store (or locally via [`Predicate::matches`])
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Predicate {
    /// Exact containing-folder match; the empty string is the root sentinel
    /// ("is null or empty" on stores that keep root paths as NULL).
    PathEquals(String),
    /// Exact equality on one field.
    FieldEquals(ItemField, String),
    /// Case-insensitive substring, OR across the given text fields.
    Search {
        term: String,
        fields: Vec<TextField>,
    },
    /// Every inner predicate must hold.
    And(Vec<Predicate>),
}

impl Predicate {
    pub fn search(term: impl Into<String>) -> Self {
        Predicate::Search {
            term: term.into(),
            fields: TextField::all().to_vec(),
        }
    }

    /// Local evaluation, shared by in-memory stores and tests.
    pub fn matches(&self, item: &MediaItem) -> bool {
        match self {
            Predicate::PathEquals(path) => item.path == *path,
            Predicate::FieldEquals(field, value) => {
                let actual = match field {
                    ItemField::User => item.user.clone(),
                    ItemField::Model => item.model.clone().unwrap_or_default(),
                    ItemField::Status => match item.status {
                        crate::ItemStatus::Pending => "pending".into(),
                        crate::ItemStatus::Complete => "complete".into(),
                        crate::ItemStatus::Failed => "failed".into(),
                    },
                    ItemField::Favorite => item.favorite.to_string(),
                    ItemField::Rating => item.rating.to_string(),
                };
                actual == *value
            }
            Predicate::Search { term, fields } => {
                let needle = term.to_lowercase();
                fields.iter().any(|f| {
                    f.value(item)
                        .map(|v| v.to_lowercase().contains(&needle))
                        .unwrap_or(false)
                })
            }
            Predicate::And(preds) => preds.iter().all(|p| p.matches(item)),
        }
    }
}

/// Sortable fields
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    CreatedAt,
    FileName,
    Rating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortDirection {
    Ascending,
    Descending,
}

/// Sort specification for metadata queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sort {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Sort {
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// Comparison shared by local store implementations.
    pub fn compare(&self, a: &MediaItem, b: &MediaItem) -> Ordering {
        let ord = match self.key {
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::FileName => a.display_name().cmp(b.display_name()),
            SortKey::Rating => a.rating.cmp(&b.rating),
        };
        match self.direction {
            SortDirection::Ascending => ord,
            SortDirection::Descending => ord.reverse(),
        }
    }
}

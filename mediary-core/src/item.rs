//! Media item records
//!
//! A `MediaItem` is one metadata-store record describing a stored file. The
//! object store holds the corresponding blob at
//! `<root>/<path>/<display_name()>`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Processing status of an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Pending,
    Complete,
    Failed,
}

impl Default for ItemStatus {
    fn default() -> Self {
        ItemStatus::Complete
    }
}

/// A metadata-store record for one stored media file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MediaItem {
    /// Record identity assigned by the metadata store
    pub id: String,
    /// Owning user
    pub user: String,
    /// Containing folder, display form; empty string means root
    pub path: String,
    /// User-chosen filename; falls back to `id` when unset or blank
    pub file_name: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub status: ItemStatus,
    pub created_at: DateTime<Utc>,
}

impl MediaItem {
    /// Stored filename: the user filename when set and non-blank, else the
    /// record identity.
    pub fn display_name(&self) -> &str {
        match &self.file_name {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.id,
        }
    }

    /// Insert shape for a copy of this record into another folder. The
    /// identity and creation time are left for the store to assign.
    pub fn clone_into(&self, path: impl Into<String>) -> NewMediaItem {
        NewMediaItem {
            user: self.user.clone(),
            path: path.into(),
            file_name: self.file_name.clone(),
            prompt: self.prompt.clone(),
            model: self.model.clone(),
            tags: self.tags.clone(),
            notes: self.notes.clone(),
            rating: self.rating,
            favorite: self.favorite,
            status: self.status,
        }
    }
}

/// Insert shape: everything the caller provides, nothing the store assigns
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewMediaItem {
    pub user: String,
    pub path: String,
    pub file_name: Option<String>,
    pub prompt: Option<String>,
    pub model: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub rating: u8,
    #[serde(default)]
    pub favorite: bool,
    #[serde(default)]
    pub status: ItemStatus,
}

/// Sparse update shape for `MetadataStore::patch`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemPatch {
    pub path: Option<String>,
    pub file_name: Option<String>,
    pub tags: Option<Vec<String>>,
    pub notes: Option<String>,
    pub rating: Option<u8>,
    pub favorite: Option<bool>,
    pub status: Option<ItemStatus>,
}

impl ItemPatch {
    pub fn path(path: impl Into<String>) -> Self {
        Self {
            path: Some(path.into()),
            ..Default::default()
        }
    }

    /// Apply this patch to a record in place.
    pub fn apply(&self, item: &mut MediaItem) {
        if let Some(path) = &self.path {
            item.path = path.clone();
        }
        if let Some(file_name) = &self.file_name {
            item.file_name = Some(file_name.clone());
        }
        if let Some(tags) = &self.tags {
            item.tags = tags.clone();
        }
        if let Some(notes) = &self.notes {
            item.notes = notes.clone();
        }
        if let Some(rating) = self.rating {
            item.rating = rating;
        }
        if let Some(favorite) = self.favorite {
            item.favorite = favorite;
        }
        if let Some(status) = self.status {
            item.status = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> MediaItem {
        MediaItem {
            id: "it_42".into(),
            user: "u1".into(),
            path: "trips".into(),
            file_name: Some("paris.mp4".into()),
            prompt: Some("eiffel tower at dusk".into()),
            model: Some("gen-3".into()),
            tags: vec!["travel".into()],
            notes: String::new(),
            rating: 4,
            favorite: true,
            status: ItemStatus::Complete,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_display_name_prefers_user_filename() {
        let mut it = item();
        assert_eq!(it.display_name(), "paris.mp4");

        it.file_name = Some("   ".into());
        assert_eq!(it.display_name(), "it_42");

        it.file_name = None;
        assert_eq!(it.display_name(), "it_42");
    }

    #[test]
    fn test_clone_into_strips_identity() {
        let it = item();
        let copy = it.clone_into("travel");
        assert_eq!(copy.path, "travel");
        assert_eq!(copy.file_name.as_deref(), Some("paris.mp4"));
        assert_eq!(copy.rating, 4);
        assert!(copy.favorite);
    }

    #[test]
    fn test_deserialize_fills_defaults() {
        let json = r#"{
            "id": "it_1",
            "user": "u1",
            "path": "",
            "file_name": null,
            "prompt": null,
            "model": null,
            "created_at": "2024-05-01T00:00:00Z"
        }"#;
        let it: MediaItem = serde_json::from_str(json).unwrap();
        assert!(it.tags.is_empty());
        assert!(it.notes.is_empty());
        assert_eq!(it.rating, 0);
        assert!(!it.favorite);
        assert_eq!(it.status, ItemStatus::Complete);
    }

    #[test]
    fn test_patch_apply() {
        let mut it = item();
        ItemPatch::path("travel").apply(&mut it);
        assert_eq!(it.path, "travel");
        assert_eq!(it.rating, 4);

        let patch = ItemPatch {
            rating: Some(5),
            favorite: Some(false),
            ..Default::default()
        };
        patch.apply(&mut it);
        assert_eq!(it.rating, 5);
        assert!(!it.favorite);
        assert_eq!(it.path, "travel");
    }
}

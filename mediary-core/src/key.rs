//! Storage key codec
//!
//! Maps between display names, percent-encoded path segments, and absolute
//! object-store keys rooted under a per-user, per-category prefix
//! (`<user>/<category>/...`). Folder markers are keys with a trailing `/`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::FolderPath;

/// Opaque hierarchical identifier for a blob or folder marker
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageKey(String);

impl StorageKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_folder_marker(&self) -> bool {
        self.0.ends_with('/')
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for StorageKey {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Percent-encode a display name for use as a single path segment.
pub fn encode_segment(name: &str) -> String {
    urlencoding::encode(name).into_owned()
}

/// Inverse of [`encode_segment`]. Malformed input is returned unchanged.
pub fn decode_segment(segment: &str) -> String {
    match urlencoding::decode(segment) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => segment.to_string(),
    }
}

/// Fixed `<user>/<category>/` root that all keys of one library live under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRoot {
    user: String,
    category: String,
}

impl KeyRoot {
    pub fn new(user: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            category: category.into(),
        }
    }

    pub fn prefix(&self) -> String {
        format!("{}/{}/", self.user, self.category)
    }

    /// Strip the root prefix and decode segments for display.
    ///
    /// Returns the empty string when the key is not under this root; callers
    /// must skip such keys.
    pub fn relative_path(&self, key: &StorageKey) -> String {
        let prefix = self.prefix();
        let Some(rest) = key.as_str().strip_prefix(&prefix) else {
            return String::new();
        };
        rest.split('/')
            .filter(|s| !s.is_empty())
            .map(decode_segment)
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Absolute key for a folder marker.
    pub fn folder_key(&self, folder: &FolderPath) -> StorageKey {
        let mut key = self.prefix();
        for seg in folder.segments() {
            key.push_str(&encode_segment(seg));
            key.push('/');
        }
        StorageKey::new(key)
    }

    /// Absolute key for a blob named `file_name` inside `folder`.
    pub fn blob_key(&self, folder: &FolderPath, file_name: &str) -> StorageKey {
        let mut key = self.folder_key(folder).0;
        key.push_str(&encode_segment(file_name));
        StorageKey::new(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_round_trip() {
        for name in [
            "plain",
            "with space",
            "semi;colon",
            "slash/inside",
            "Šumava výlet",
            "東京 2024",
            "100%.png",
            "",
        ] {
            assert_eq!(decode_segment(&encode_segment(name)), name);
        }
    }

    #[test]
    fn test_decode_malformed_passthrough() {
        assert_eq!(decode_segment("%ZZ"), "%ZZ");
    }

    #[test]
    fn test_relative_path() {
        let root = KeyRoot::new("u1", "video");
        assert_eq!(
            root.relative_path(&StorageKey::from("u1/video/trips/paris/")),
            "trips/paris"
        );
        assert_eq!(root.relative_path(&StorageKey::from("u1/video/")), "");
        assert_eq!(root.relative_path(&StorageKey::from("u2/video/trips/")), "");
        assert_eq!(root.relative_path(&StorageKey::from("u1/image/trips/")), "");
    }

    #[test]
    fn test_relative_path_decodes_segments() {
        let root = KeyRoot::new("u1", "video");
        let key = StorageKey::from("u1/video/letn%C3%AD%20v%C3%BDlety/");
        assert_eq!(root.relative_path(&key), "letní výlety");
    }

    #[test]
    fn test_folder_and_blob_keys() {
        let root = KeyRoot::new("u1", "video");
        let folder = FolderPath::parse("trips/letní výlety");
        assert_eq!(
            root.folder_key(&folder).as_str(),
            "u1/video/trips/letn%C3%AD%20v%C3%BDlety/"
        );
        assert_eq!(
            root.blob_key(&folder, "den 1.mp4").as_str(),
            "u1/video/trips/letn%C3%AD%20v%C3%BDlety/den%201.mp4"
        );
        assert_eq!(
            root.blob_key(&FolderPath::root(), "clip.mp4").as_str(),
            "u1/video/clip.mp4"
        );
    }

    #[test]
    fn test_key_round_trips_through_relative_path() {
        let root = KeyRoot::new("u1", "video");
        let folder = FolderPath::parse("trips/東京 2024");
        let key = root.folder_key(&folder);
        assert_eq!(root.relative_path(&key), "trips/東京 2024");
    }

    #[test]
    fn test_folder_marker() {
        assert!(StorageKey::from("u1/video/trips/").is_folder_marker());
        assert!(!StorageKey::from("u1/video/trips/a.mp4").is_folder_marker());
    }
}

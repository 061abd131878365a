//! Folder path abstraction
//!
//! A `FolderPath` is the display-form, '/'-joined location of a folder
//! relative to the category root. The empty path is the root itself, which
//! matches the empty-string sentinel used by the metadata store.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relative folder path under the category root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct FolderPath {
    segments: Vec<String>,
}

impl FolderPath {
    pub fn root() -> Self {
        Self { segments: Vec::new() }
    }

    pub fn parse(path: impl AsRef<str>) -> Self {
        let segments = path
            .as_ref()
            .split('/')
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
        Self { segments }
    }

    pub fn join(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        for part in name.as_ref().split('/').filter(|s| !s.is_empty()) {
            segments.push(part.to_string());
        }
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    /// Terminal segment, `None` at root.
    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    /// True when `self` equals `ancestor` or sits somewhere below it.
    pub fn starts_with(&self, ancestor: &FolderPath) -> bool {
        self.segments.len() >= ancestor.segments.len()
            && self.segments[..ancestor.segments.len()] == ancestor.segments[..]
    }
}

impl fmt::Display for FolderPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

impl From<String> for FolderPath {
    fn from(s: String) -> Self {
        Self::parse(s)
    }
}

impl From<FolderPath> for String {
    fn from(p: FolderPath) -> Self {
        p.to_string()
    }
}

//! Mediary Core
//!
//! Types, errors, and backend traits for the hierarchical media organizer.

pub mod error;
pub mod item;
pub mod key;
pub mod path;
pub mod store;
pub mod tree;

pub use error::{MediaryError, MediaryResult};
pub use item::{ItemPatch, ItemStatus, MediaItem, NewMediaItem};
pub use key::{KeyRoot, StorageKey};
pub use path::FolderPath;
pub use store::{
    ItemField, MetadataStore, ObjectStore, Predicate, Sort, SortDirection, SortKey, TextField,
};
pub use tree::FolderNode;

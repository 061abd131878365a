// SPDX-License-Identifier: AGPL-3.0-or-later
//! Reference backend stores for Mediary
//!
//! In-memory implementations of the [`ObjectStore`] and [`MetadataStore`]
//! traits. These back the engine test suites and give embedders a sandbox
//! that behaves like the real services without any network.
//!
//! [`ObjectStore`]: mediary_core::ObjectStore
//! [`MetadataStore`]: mediary_core::MetadataStore

pub mod metadata;
pub mod object;

pub use metadata::MemoryMetadataStore;
pub use object::MemoryObjectStore;

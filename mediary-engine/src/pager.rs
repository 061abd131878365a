// SPDX-License-Identifier: AGPL-3.0-or-later
//! Filtered, sorted, paginated metadata queries
//!
//! `QueryState` holds the view parameters for one folder-view session and
//! enforces the page-reset rule: changing the search term, any filter, or
//! the page size snaps back to page 1, while changing the page or the sort
//! alone does not. (The sort half of that asymmetry is preserved observed
//! behavior; see DESIGN.md.)

use mediary_core::{
    ItemField, MediaItem, MediaryResult, MetadataStore, Predicate, Sort, SortDirection, SortKey,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

pub const DEFAULT_PAGE_SIZE: usize = 24;

/// View parameters for one folder listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Folder scope; `None` queries the whole library.
    scope_path: Option<String>,
    search_term: String,
    filters: BTreeMap<ItemField, String>,
    sort: Sort,
    page: usize,
    page_size: usize,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            scope_path: None,
            search_term: String::new(),
            filters: BTreeMap::new(),
            sort: Sort::new(SortKey::CreatedAt, SortDirection::Descending),
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl QueryState {
    pub fn for_folder(path: impl Into<String>) -> Self {
        Self {
            scope_path: Some(path.into()),
            ..Default::default()
        }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn search_term(&self) -> &str {
        &self.search_term
    }

    pub fn sort(&self) -> Sort {
        self.sort
    }

    pub fn filter(&self, field: ItemField) -> Option<&str> {
        self.filters.get(&field).map(String::as_str)
    }

    /// Resets the page.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.search_term = term.into();
        self.page = 1;
    }

    /// `None` (or the UI's "all" sentinel) clears the filter. Resets the page.
    pub fn set_filter(&mut self, field: ItemField, value: Option<String>) {
        match value.filter(|v| v.as_str() != "all") {
            Some(v) => {
                self.filters.insert(field, v);
            }
            None => {
                self.filters.remove(&field);
            }
        }
        self.page = 1;
    }

    /// Resets the page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size.max(1);
        self.page = 1;
    }

    /// Does not reset anything else.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.max(1);
    }

    /// Does not reset the page.
    pub fn set_sort(&mut self, key: SortKey, direction: SortDirection) {
        self.sort = Sort::new(key, direction);
    }

    /// Predicate from scope, filters, and search term; sort and paging are
    /// deliberately excluded (the count query reuses this).
    pub fn predicate(&self) -> Predicate {
        let mut parts = Vec::new();
        if let Some(path) = &self.scope_path {
            parts.push(Predicate::PathEquals(path.clone()));
        }
        for (field, value) in &self.filters {
            parts.push(Predicate::FieldEquals(*field, value.clone()));
        }
        if !self.search_term.trim().is_empty() {
            parts.push(Predicate::search(self.search_term.trim()));
        }
        Predicate::And(parts)
    }
}

/// `ceil(count / page_size)`, zero when the result set is empty.
pub fn total_pages(count: u64, page_size: usize) -> u64 {
    if count == 0 {
        0
    } else {
        count.div_ceil(page_size.max(1) as u64)
    }
}

/// One fetched page plus the derived totals
#[derive(Debug, Clone)]
pub struct PageResult {
    pub items: Vec<MediaItem>,
    pub total_count: u64,
    pub total_pages: u64,
    pub page: usize,
}

/// Runs [`QueryState`] queries against the metadata store
#[derive(Clone)]
pub struct QueryPager {
    metadata: Arc<dyn MetadataStore>,
}

impl QueryPager {
    pub fn new(metadata: Arc<dyn MetadataStore>) -> Self {
        Self { metadata }
    }

    /// Count-only query; filters and search apply, sort and paging do not.
    pub async fn count(&self, state: &QueryState) -> MediaryResult<u64> {
        self.metadata.count(&state.predicate()).await
    }

    pub async fn fetch_page(&self, state: &QueryState) -> MediaryResult<Vec<MediaItem>> {
        let offset = (state.page - 1) * state.page_size;
        self.metadata
            .query(
                &state.predicate(),
                Some(&state.sort),
                Some(state.page_size),
                offset,
            )
            .await
    }

    pub async fn fetch(&self, state: &QueryState) -> MediaryResult<PageResult> {
        let total_count = self.count(state).await?;
        let items = self.fetch_page(state).await?;
        Ok(PageResult {
            items,
            total_count,
            total_pages: total_pages(total_count, state.page_size),
            page: state.page,
        })
    }
}

// SPDX-License-Identifier: AGPL-3.0-or-later
//! Pager behavior against the in-memory metadata store.

use mediary_core::{ItemField, MetadataStore, NewMediaItem, SortDirection, SortKey};
use mediary_engine::{QueryPager, QueryState};
use mediary_stores::MemoryMetadataStore;
use std::sync::Arc;

async fn seeded_store() -> Arc<MemoryMetadataStore> {
    let store = Arc::new(MemoryMetadataStore::new());
    for i in 0..5 {
        store
            .insert(NewMediaItem {
                user: "u1".into(),
                path: "trips".into(),
                file_name: Some(format!("clip {i}.mp4")),
                prompt: Some(if i % 2 == 0 { "sunset over water" } else { "city at night" }.into()),
                model: Some("gen-3".into()),
                rating: i as u8,
                ..Default::default()
            })
            .await
            .unwrap();
    }
    store
        .insert(NewMediaItem {
            user: "u1".into(),
            path: "family".into(),
            file_name: Some("bbq.mp4".into()),
            model: Some("gen-2".into()),
            ..Default::default()
        })
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn fetch_pages_through_folder_scope() {
    let pager = QueryPager::new(seeded_store().await);

    let mut state = QueryState::for_folder("trips");
    state.set_page_size(2);
    state.set_sort(SortKey::FileName, SortDirection::Ascending);

    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.total_count, 5);
    assert_eq!(page.total_pages, 3);
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].file_name.as_deref(), Some("clip 0.mp4"));

    state.set_page(3);
    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].file_name.as_deref(), Some("clip 4.mp4"));
    assert_eq!(page.page, 3);
}

#[tokio::test]
async fn search_narrows_and_resets_page() {
    let pager = QueryPager::new(seeded_store().await);

    let mut state = QueryState::for_folder("trips");
    state.set_page_size(2);
    state.set_page(3);

    state.set_search_term("SUNSET");
    assert_eq!(state.page(), 1);

    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.total_count, 3);
    assert!(page
        .items
        .iter()
        .all(|it| it.prompt.as_deref().unwrap().contains("sunset")));
}

#[tokio::test]
async fn filters_match_exactly() {
    let pager = QueryPager::new(seeded_store().await);

    let mut state = QueryState::default();
    state.set_filter(ItemField::Model, Some("gen-2".into()));
    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.total_count, 1);
    assert_eq!(page.items[0].path, "family");

    state.set_filter(ItemField::Model, Some("all".into()));
    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.total_count, 6);
}

#[tokio::test]
async fn empty_result_has_zero_pages() {
    let pager = QueryPager::new(seeded_store().await);

    let mut state = QueryState::for_folder("trips");
    state.set_search_term("no such clip");
    let page = pager.fetch(&state).await.unwrap();
    assert_eq!(page.total_count, 0);
    assert_eq!(page.total_pages, 0);
    assert!(page.items.is_empty());
}

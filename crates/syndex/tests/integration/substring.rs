//! Five-title scenario against the substring engine.

use syndex::SearchOptions;
use syndex_core::{ChangeOp, PrimaryStore, StoreSelection, SyncConfig};

use crate::common::{TestHarness, entry, post};

async fn harness() -> TestHarness {
    TestHarness::five_titles(SyncConfig::default()).await
}

#[tokio::test]
async fn test_single_keyword_returns_three() {
    let h = harness().await;
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys(), ["2", "3", "5"]);
}

#[tokio::test]
async fn test_and_returns_empty_or_returns_union() {
    let h = harness().await;
    let and = h
        .syndex
        .search("post", "book movie", &SearchOptions::with_or(false))
        .await
        .unwrap();
    assert_eq!(and, StoreSelection::Empty);

    let or = h
        .syndex
        .search("post", "book movie", &SearchOptions::with_or(true))
        .await
        .unwrap();
    assert_eq!(or.keys().len(), 4);
}

#[tokio::test]
async fn test_limit_bounds_candidates() {
    let h = harness().await;
    for limit in [0, 1, 2, 10] {
        let selection = h
            .syndex
            .search("post", "book", &SearchOptions::limited(limit))
            .await
            .unwrap();
        assert!(selection.keys().len() <= limit);
    }
}

#[tokio::test]
async fn test_delete_then_rename_scenario() {
    let h = harness().await;

    // delete "read a book"
    let victim = h.store.fetch("post", "2").await.unwrap().unwrap();
    h.store.remove("post", "2").await.unwrap();
    h.commit(vec![entry(victim, ChangeOp::Delete)]).await;
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys().len(), 2);

    // rename "write a book" to "write a novel"
    let renamed = post(3, "write a novel");
    h.store.replace(renamed.clone()).await.unwrap();
    h.commit(vec![entry(renamed, ChangeOp::Update)]).await;

    let books = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(books.keys().len(), 1);
    let movies = h
        .syndex
        .search("post", "movie", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(movies.keys().len(), 1);
}

#[tokio::test]
async fn test_field_subset_restricts_matches() {
    let h = harness().await;
    let selection = h
        .syndex
        .search("post", "content2", &SearchOptions::fields(["title"]))
        .await
        .unwrap();
    assert_eq!(selection, StoreSelection::Empty);

    let selection = h
        .syndex
        .search("post", "content2", &SearchOptions::fields(["content"]))
        .await
        .unwrap();
    assert_eq!(selection.keys(), ["2"]);
}

#[tokio::test]
async fn test_no_match_is_empty_selection_not_error() {
    let h = harness().await;
    let selection = h
        .syndex
        .search("post", "zeppelin", &SearchOptions::default())
        .await
        .unwrap();
    assert!(selection.is_empty());
}

#[tokio::test]
async fn test_rank_order_without_ranks_keeps_store_order() {
    let h = harness().await;
    let options = SearchOptions {
        rank_order: true,
        ..SearchOptions::default()
    };
    let selection = h.syndex.search("post", "book", &options).await.unwrap();
    assert_eq!(selection.keys(), ["2", "3", "5"]);
}

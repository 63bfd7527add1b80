//! Five-title scenario plus durability and writer-serialization checks
//! against the local inverted-index engine.

use std::sync::Arc;

use syndex::SearchOptions;
use syndex_core::{ChangeOp, PrimaryStore, RecordData, StoreSelection, SyncConfig};
use tempfile::TempDir;

use crate::common::{TestHarness, entry, post};

fn config(dir: &TempDir) -> SyncConfig {
    SyncConfig {
        backend: "tantivy".to_string(),
        index_root: dir.path().to_string_lossy().into_owned(),
        ..SyncConfig::default()
    }
}

#[tokio::test]
async fn test_single_keyword_returns_three() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    let mut keys = selection.keys().to_vec();
    keys.sort();
    assert_eq!(keys, ["2", "3", "5"]);
}

#[tokio::test]
async fn test_and_returns_empty_or_returns_union() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;

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
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;
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
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;

    let victim = h.store.fetch("post", "2").await.unwrap().unwrap();
    h.store.remove("post", "2").await.unwrap();
    h.commit(vec![entry(victim, ChangeOp::Delete)]).await;
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys().len(), 2);

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
async fn test_rank_order_sorts_by_relevance() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;
    let options = SearchOptions {
        rank_order: true,
        ..SearchOptions::default()
    };
    let selection = h.syndex.search("post", "book", &options).await.unwrap();
    assert_eq!(selection.keys().len(), 3);
}

#[tokio::test]
async fn test_rebuild_and_remove_one() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;

    let extra = post(6, "one more book");
    h.store.insert(extra.clone()).await;
    h.syndex.rebuild_one(&extra).await.unwrap();
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys().len(), 4);

    h.syndex.remove_one(&extra).await.unwrap();
    let selection = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys().len(), 3);
}

#[tokio::test]
async fn test_index_survives_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let h = TestHarness::five_titles(config(&dir)).await;
        drop(h);
    }
    // a fresh layer over the same root reopens the committed segments
    let h = TestHarness::five_titles(config(&dir)).await;
    let selection = h
        .syndex
        .search("post", "music", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys(), ["4"]);
}

#[tokio::test]
async fn test_concurrent_writes_do_not_interleave() {
    let dir = TempDir::new().unwrap();
    let h = Arc::new(TestHarness::five_titles(config(&dir)).await);

    let mut tasks = Vec::new();
    for i in 0..16i64 {
        let h = h.clone();
        tasks.push(tokio::spawn(async move {
            let record = post(100 + i, &format!("concurrent entry {i}"));
            h.store.insert(record.clone()).await;
            h.syndex.rebuild_one(&record).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let selection = h
        .syndex
        .search("post", "concurrent", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys().len(), 16);
}

#[tokio::test]
async fn test_failed_batch_leaves_nothing_staged() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;

    // post 7 stages fine, then the keyless record fails the batch
    let keyless = RecordData::new("post").with_value("title", "no key");
    let result = h
        .syndex
        .synchronizer()
        .on_post_commit(vec![
            entry(post(7, "a quiet zebra"), ChangeOp::Insert),
            entry(keyless, ChangeOp::Insert),
        ])
        .await;
    assert!(result.is_err());

    let selection = h
        .syndex
        .search("post", "zebra", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection, StoreSelection::Empty);

    // an unrelated commit must not flush documents from the failed batch
    let renamed = post(1, "watch a documentary");
    h.store.replace(renamed.clone()).await.unwrap();
    h.commit(vec![entry(renamed, ChangeOp::Update)]).await;

    let selection = h
        .syndex
        .search("post", "zebra", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection, StoreSelection::Empty);
    let selection = h
        .syndex
        .search("post", "documentary", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(selection.keys(), ["1"]);
}

#[tokio::test]
async fn test_malformed_query_surfaces_as_error() {
    let dir = TempDir::new().unwrap();
    let h = TestHarness::five_titles(config(&dir)).await;
    let result = h
        .syndex
        .search("post", "title:\"unbalanced", &SearchOptions::default())
        .await;
    assert!(result.is_err());
}

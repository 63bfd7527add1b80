//! Cascade propagation: tag changes rewrite the denormalized tag name
//! stored in post documents, without the posts themselves changing.

use syndex::SearchOptions;
use syndex_core::{ChangeOp, PrimaryStore, SyncConfig};
use tempfile::TempDir;

use crate::common::{TestHarness, entry, tag, tagged_post};

fn config(dir: &TempDir) -> SyncConfig {
    SyncConfig {
        backend: "tantivy".to_string(),
        index_root: dir.path().to_string_lossy().into_owned(),
        ..SyncConfig::default()
    }
}

/// Seed two tagged posts plus one with a different tag, all through the
/// commit hooks so dotted paths get force-loaded.
async fn seeded(dir: &TempDir) -> TestHarness {
    let h = TestHarness::with_tags(config(dir)).await;

    h.store.insert(tag(10, "python")).await;
    h.store.insert(tag(11, "ruby")).await;
    let posts = vec![
        tagged_post(1, "read a book", 10),
        tagged_post(2, "write a book", 10),
        tagged_post(3, "watch a movie", 11),
    ];
    for post in &posts {
        h.store.insert(post.clone()).await;
    }
    h.commit(
        posts
            .into_iter()
            .map(|p| entry(p, ChangeOp::Insert))
            .collect(),
    )
    .await;
    h
}

#[tokio::test]
async fn test_dotted_path_indexed_on_insert() {
    let dir = TempDir::new().unwrap();
    let h = seeded(&dir).await;

    let selection = h
        .syndex
        .search("post", "python", &SearchOptions::default())
        .await
        .unwrap();
    let mut keys = selection.keys().to_vec();
    keys.sort();
    assert_eq!(keys, ["1", "2"]);
}

#[tokio::test]
async fn test_tag_rename_updates_dependent_documents() {
    let dir = TempDir::new().unwrap();
    let h = seeded(&dir).await;

    let renamed = tag(10, "rust");
    h.store.replace(renamed.clone()).await.unwrap();
    h.commit(vec![entry(renamed, ChangeOp::Update)]).await;

    let rust = h
        .syndex
        .search("post", "rust", &SearchOptions::default())
        .await
        .unwrap();
    let mut keys = rust.keys().to_vec();
    keys.sort();
    assert_eq!(keys, ["1", "2"]);

    let python = h
        .syndex
        .search("post", "python", &SearchOptions::default())
        .await
        .unwrap();
    assert!(python.is_empty());

    // posts untouched by the cascade keep their own tag
    let ruby = h
        .syndex
        .search("post", "ruby", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(ruby.keys(), ["3"]);
}

#[tokio::test]
async fn test_cascade_preserves_other_document_fields() {
    let dir = TempDir::new().unwrap();
    let h = seeded(&dir).await;

    let renamed = tag(10, "rust");
    h.store.replace(renamed.clone()).await.unwrap();
    h.commit(vec![entry(renamed, ChangeOp::Update)]).await;

    // titles survive the partial tag.name update
    let books = h
        .syndex
        .search("post", "book", &SearchOptions::fields(["title"]))
        .await
        .unwrap();
    assert_eq!(books.keys().len(), 2);
}

#[tokio::test]
async fn test_tag_delete_clears_denormalized_name() {
    let dir = TempDir::new().unwrap();
    let h = seeded(&dir).await;

    let victim = h.store.fetch("tag", "10").await.unwrap().unwrap();
    h.commit(vec![entry(victim, ChangeOp::Delete)]).await;
    h.store.remove("tag", "10").await.unwrap();

    let python = h
        .syndex
        .search("post", "python", &SearchOptions::default())
        .await
        .unwrap();
    assert!(python.is_empty());

    // the posts themselves remain searchable by title
    let books = h
        .syndex
        .search("post", "book", &SearchOptions::default())
        .await
        .unwrap();
    assert_eq!(books.keys().len(), 2);
}

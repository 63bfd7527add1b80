//! Common test utilities and harness for syndex integration tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use syndex::Syndex;
use syndex_core::{
    CascadeDirective, CascadeUpdate, ChangeEntry, ChangeOp, Changeset, FieldValue, MemoryStore,
    RecordData, SyncConfig,
};
use syndex_schema::{CascadeProducer, ColumnType, EntityCatalog, EntitySpec};

/// The canonical five-title scenario.
pub const TITLES: [&str; 5] = [
    "watch a movie",
    "read a book",
    "write a book",
    "listen to a music",
    "I have a book",
];

/// A seeded primary store plus an assembled syndex layer.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub syndex: Syndex,
}

impl TestHarness {
    /// Harness with a `post(title, content)` entity, the five scenario
    /// records already in the store, and indexes built.
    pub async fn five_titles(config: SyncConfig) -> Self {
        let mut catalog = EntityCatalog::new();
        catalog.register(
            EntitySpec::new("post")
                .searchable(["title", "content"])
                .column("id", ColumnType::Integer)
                .column("title", ColumnType::String)
                .column("content", ColumnType::Text),
        );

        let store = Arc::new(MemoryStore::new());
        for (i, title) in TITLES.iter().enumerate() {
            store.insert(post(i as i64 + 1, title)).await;
        }

        let syndex = Syndex::new(catalog, store.clone(), config).unwrap();
        // update semantics keep the build idempotent across reopens
        syndex.build_index(Some("post"), true, false).await.unwrap();
        Self { store, syndex }
    }

    /// Harness with `post(title, tag.name)` plus a non-indexed `tag` entity
    /// whose renames and deletes cascade into post documents. Store starts
    /// empty; tests drive it through changesets.
    pub async fn with_tags(config: SyncConfig) -> Self {
        let mut catalog = EntityCatalog::new();
        catalog.register(
            EntitySpec::new("post")
                .searchable(["title", "tag.name"])
                .column("id", ColumnType::Integer)
                .column("title", ColumnType::String)
                .relation("tag", "tag"),
        );
        catalog.register(
            EntitySpec::new("tag")
                .column("id", ColumnType::Integer)
                .column("name", ColumnType::String)
                .cascade(tag_name_cascade()),
        );

        let store = Arc::new(MemoryStore::new());
        store.declare_relation("post", "tag", "tag", "tag_id").await;

        let syndex = Syndex::new(catalog, store.clone(), config).unwrap();
        Self { store, syndex }
    }

    /// Run one changeset through both commit hooks, the way the primary
    /// store's transaction machinery would.
    pub async fn commit(&self, mut changeset: Changeset) {
        self.syndex
            .synchronizer()
            .on_pre_commit(&mut changeset)
            .await
            .unwrap();
        self.syndex
            .synchronizer()
            .on_post_commit(changeset)
            .await
            .unwrap();
    }
}

pub fn post(id: i64, title: &str) -> RecordData {
    RecordData::new("post")
        .with_value("id", id)
        .with_value("title", title)
        .with_value("content", format!("content{id}"))
}

pub fn tagged_post(id: i64, title: &str, tag_id: i64) -> RecordData {
    RecordData::new("post")
        .with_value("id", id)
        .with_value("title", title)
        .with_value("tag_id", tag_id)
}

pub fn tag(id: i64, name: &str) -> RecordData {
    RecordData::new("tag")
        .with_value("id", id)
        .with_value("name", name)
}

pub fn entry(record: RecordData, op: ChangeOp) -> ChangeEntry {
    ChangeEntry { record, op }
}

/// Cascade producer: a changed tag rewrites the denormalized `tag.name`
/// stored in every post that references it. On delete the name becomes
/// empty text.
pub fn tag_name_cascade() -> CascadeProducer {
    Arc::new(rewrite_tag_name)
}

fn rewrite_tag_name<'a>(
    store: &'a dyn syndex_core::PrimaryStore,
    record: &'a syndex_core::RecordData,
    delete: bool,
) -> futures::future::BoxFuture<'a, syndex_core::Result<CascadeDirective>> {
    Box::pin(async move {
        let tag_key = record.key("id")?;
        let name = if delete {
            FieldValue::Text(String::new())
        } else {
            record.get("name").cloned().unwrap_or(FieldValue::Null)
        };

        let mut updates = Vec::new();
        for post in store.scan("post").await? {
            let references = post.get("tag_id").is_some_and(|v| v.as_text() == tag_key);
            if references {
                let mut fields = BTreeMap::new();
                fields.insert("tag.name".to_string(), name.clone());
                updates.push(CascadeUpdate {
                    key: post.key("id")?,
                    fields,
                });
            }
        }
        Ok(CascadeDirective {
            target: "post".to_string(),
            updates,
        })
    })
}

//! Primary-store abstraction.
//!
//! The primary relational store and its transaction machinery live outside
//! this crate. The core consumes three things from it:
//!
//! - a per-commit changeset ([`ChangeEntry`] batch) delivered through the
//!   synchronizer's pre/post-commit hooks,
//! - relation force-loading for dotted searchable paths
//!   ([`PrimaryStore::load_relation`]), and
//! - whole-table scans for index rebuilds and the substring backend
//!   ([`PrimaryStore::scan`]).
//!
//! Query results flow the other way as a [`StoreSelection`]: an ordered
//! primary-key set the caller turns into a key-set filter against its own
//! store, or an explicit match-nothing selection.
//!
//! [`MemoryStore`] is a complete in-process implementation used by the test
//! suites and small embedded deployments.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::value::FieldValue;

/// A dynamic view of one record: entity name plus attribute values.
///
/// Dotted `relation.attribute` entries appear in `values` once the relation
/// has been force-loaded (see [`PrimaryStore::load_relation`]).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordData {
    /// Storage name of the entity this record belongs to.
    pub entity: String,

    /// Attribute (or dotted path) → value.
    pub values: BTreeMap<String, FieldValue>,
}

impl RecordData {
    /// Create an empty record for the given entity.
    pub fn new(entity: impl Into<String>) -> Self {
        Self {
            entity: entity.into(),
            values: BTreeMap::new(),
        }
    }

    /// Set an attribute value, builder style.
    pub fn with_value(mut self, path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.values.insert(path.into(), value.into());
        self
    }

    /// Look up an attribute value.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }

    /// Primary key rendered as text, under the given key attribute.
    pub fn key(&self, key_attr: &str) -> Result<String> {
        self.values
            .get(key_attr)
            .filter(|v| !v.is_null())
            .map(FieldValue::as_text)
            .ok_or_else(|| {
                Error::config(format!(
                    "record of '{}' has no primary key attribute '{}'",
                    self.entity, key_attr
                ))
            })
    }
}

/// Operation recorded for one committed record mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeOp {
    /// Record was inserted.
    Insert,
    /// Record was updated.
    Update,
    /// Record was deleted.
    Delete,
}

/// One record mutation inside a commit's changeset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangeEntry {
    /// The mutated record, as of commit time.
    pub record: RecordData,
    /// What happened to it.
    pub op: ChangeOp,
}

/// The ordered set of record mutations produced by one committed
/// transaction. Ordering follows the transaction's own operation order.
pub type Changeset = Vec<ChangeEntry>;

/// A partial-document update aimed at one document of a cascade target.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeUpdate {
    /// Primary key of the target document.
    pub key: String,
    /// Fields to overwrite on that document.
    pub fields: BTreeMap<String, FieldValue>,
}

/// Instruction to update a *different* entity's documents in response to a
/// record's own change (e.g. a renamed tag rewriting the denormalized tag
/// name stored in every post that references it).
///
/// Created transiently during changeset processing, consumed immediately,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CascadeDirective {
    /// Storage name of the entity whose documents are updated.
    pub target: String,
    /// Per-document partial updates, keyed by the target's primary key.
    pub updates: Vec<CascadeUpdate>,
}

/// An ordered primary-key selection to apply against the primary store.
///
/// `Empty` stands for a filter guaranteed to match nothing; it is the normal
/// outcome of a search with no hits, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreSelection {
    /// Match nothing.
    Empty,
    /// Match exactly these keys; order is meaningful when rank ordering
    /// was requested.
    Keys(Vec<String>),
}

impl StoreSelection {
    /// Returns `true` when the selection matches nothing.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Keys(keys) => keys.is_empty(),
        }
    }

    /// The selected keys, in order. Empty slice for `Empty`.
    pub fn keys(&self) -> &[String] {
        match self {
            Self::Empty => &[],
            Self::Keys(keys) => keys,
        }
    }
}

/// Read-side operations the core consumes from the primary store.
///
/// Implementations adapt a concrete database layer. All methods are read
/// only; the core never writes to the primary store.
#[async_trait]
pub trait PrimaryStore: Send + Sync {
    /// Stream every record of `entity`, in the store's default order.
    async fn scan(&self, entity: &str) -> Result<Vec<RecordData>>;

    /// Fetch one record by primary key, if present.
    async fn fetch(&self, entity: &str, key: &str) -> Result<Option<RecordData>>;

    /// Resolve a dotted `relation.attribute` path on `record`, populating
    /// `record.values[path]` with the related entity's attribute (or
    /// [`FieldValue::Null`] when the relation is unset).
    ///
    /// Called by the synchronizer before the underlying transaction
    /// finalizes, while the relation is still loadable.
    async fn load_relation(&self, record: &mut RecordData, path: &str) -> Result<()>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// How a to-one relation of one entity resolves through the in-memory store.
#[derive(Debug, Clone)]
struct RelationLink {
    /// Entity the relation points at.
    target: String,
    /// Foreign-key attribute on the owning record.
    fk_attr: String,
}

/// In-process [`PrimaryStore`] backed by per-entity record vectors.
///
/// Used by the test suites and small embedded deployments; rows keep
/// insertion order, matching a relational store's default ordering.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<String, Vec<RecordData>>>,
    links: RwLock<BTreeMap<(String, String), RelationLink>>,
    key_attrs: RwLock<BTreeMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare the primary-key attribute for an entity (default `"id"`).
    pub async fn declare_key(&self, entity: &str, key_attr: &str) {
        self.key_attrs
            .write()
            .await
            .insert(entity.to_string(), key_attr.to_string());
    }

    /// Declare a to-one relation: `entity.relation` resolves by matching
    /// `entity.fk_attr` against the target entity's primary key.
    pub async fn declare_relation(&self, entity: &str, relation: &str, target: &str, fk_attr: &str) {
        self.links.write().await.insert(
            (entity.to_string(), relation.to_string()),
            RelationLink {
                target: target.to_string(),
                fk_attr: fk_attr.to_string(),
            },
        );
    }

    /// Insert a record at the end of its entity's table.
    pub async fn insert(&self, record: RecordData) {
        self.tables
            .write()
            .await
            .entry(record.entity.clone())
            .or_default()
            .push(record);
    }

    /// Replace the record whose key attribute matches `record`'s.
    pub async fn replace(&self, record: RecordData) -> Result<()> {
        let key_attr = self.key_attr(&record.entity).await;
        let key = record.key(&key_attr)?;
        let mut tables = self.tables.write().await;
        let rows = tables.entry(record.entity.clone()).or_default();
        match rows
            .iter_mut()
            .find(|r| r.key(&key_attr).is_ok_and(|k| k == key))
        {
            Some(row) => *row = record,
            None => rows.push(record),
        }
        Ok(())
    }

    /// Remove the record with the given key.
    pub async fn remove(&self, entity: &str, key: &str) -> Result<()> {
        let key_attr = self.key_attr(entity).await;
        let mut tables = self.tables.write().await;
        if let Some(rows) = tables.get_mut(entity) {
            rows.retain(|r| !r.key(&key_attr).is_ok_and(|k| k == key));
        }
        Ok(())
    }

    async fn key_attr(&self, entity: &str) -> String {
        self.key_attrs
            .read()
            .await
            .get(entity)
            .cloned()
            .unwrap_or_else(|| "id".to_string())
    }
}

#[async_trait]
impl PrimaryStore for MemoryStore {
    async fn scan(&self, entity: &str) -> Result<Vec<RecordData>> {
        Ok(self
            .tables
            .read()
            .await
            .get(entity)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch(&self, entity: &str, key: &str) -> Result<Option<RecordData>> {
        let key_attr = self.key_attr(entity).await;
        Ok(self
            .tables
            .read()
            .await
            .get(entity)
            .and_then(|rows| {
                rows.iter()
                    .find(|r| r.key(&key_attr).is_ok_and(|k| k == key))
            })
            .cloned())
    }

    async fn load_relation(&self, record: &mut RecordData, path: &str) -> Result<()> {
        let (relation, attr) = path
            .split_once('.')
            .ok_or_else(|| Error::config(format!("'{path}' is not a dotted relation path")))?;

        let link = self
            .links
            .read()
            .await
            .get(&(record.entity.clone(), relation.to_string()))
            .cloned()
            .ok_or_else(|| {
                Error::store(format!(
                    "entity '{}' has no declared relation '{relation}'",
                    record.entity
                ))
            })?;

        let fk = record.get(&link.fk_attr).cloned().unwrap_or(FieldValue::Null);
        let value = if fk.is_null() {
            FieldValue::Null
        } else {
            self.fetch(&link.target, &fk.as_text())
                .await?
                .and_then(|related| related.get(attr).cloned())
                .unwrap_or(FieldValue::Null)
        };
        // an unset relation indexes as empty text
        let value = if value.is_null() {
            FieldValue::Text(String::new())
        } else {
            value
        };
        record.values.insert(path.to_string(), value);
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn post(id: i64, title: &str) -> RecordData {
        RecordData::new("post")
            .with_value("id", id)
            .with_value("title", title)
    }

    #[test]
    fn test_record_key() {
        let record = post(3, "read a book");
        assert_eq!(record.key("id").unwrap(), "3");
        assert!(record.key("uuid").is_err());
    }

    #[test]
    fn test_selection_empty() {
        assert!(StoreSelection::Empty.is_empty());
        assert!(StoreSelection::Keys(vec![]).is_empty());
        let sel = StoreSelection::Keys(vec!["2".into(), "1".into()]);
        assert!(!sel.is_empty());
        assert_eq!(sel.keys(), ["2".to_string(), "1".to_string()]);
    }

    #[tokio::test]
    async fn test_memory_store_scan_order() {
        let store = MemoryStore::new();
        store.insert(post(1, "watch a movie")).await;
        store.insert(post(2, "read a book")).await;

        let rows = store.scan("post").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].key("id").unwrap(), "1");
        assert_eq!(rows[1].key("id").unwrap(), "2");
        assert!(store.scan("tag").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_memory_store_replace_and_remove() {
        let store = MemoryStore::new();
        store.insert(post(1, "write a book")).await;
        store.replace(post(1, "write a novel")).await.unwrap();

        let row = store.fetch("post", "1").await.unwrap().unwrap();
        assert_eq!(row.get("title"), Some(&FieldValue::Text("write a novel".into())));

        store.remove("post", "1").await.unwrap();
        assert!(store.fetch("post", "1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_load_relation() {
        let store = MemoryStore::new();
        store
            .declare_relation("post", "tag", "tag", "tag_id")
            .await;
        store
            .insert(
                RecordData::new("tag")
                    .with_value("id", 10i64)
                    .with_value("name", "rust"),
            )
            .await;

        let mut record = post(1, "read a book").with_value("tag_id", 10i64);
        store.load_relation(&mut record, "tag.name").await.unwrap();
        assert_eq!(record.get("tag.name"), Some(&FieldValue::Text("rust".into())));
    }

    #[tokio::test]
    async fn test_load_relation_unset_fk_is_empty_text() {
        let store = MemoryStore::new();
        store
            .declare_relation("post", "tag", "tag", "tag_id")
            .await;

        let mut record = post(1, "read a book");
        store.load_relation(&mut record, "tag.name").await.unwrap();
        assert_eq!(record.get("tag.name"), Some(&FieldValue::Text(String::new())));
    }
}

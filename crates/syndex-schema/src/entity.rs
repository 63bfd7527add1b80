//! Entity specifications and the catalog.
//!
//! An [`EntitySpec`] is what an integrator declares about one record type:
//! its searchable field paths, column types, to-one relations, computed
//! fields, explicit schema overrides, and cascade producers. The
//! [`EntityCatalog`] holds every declared entity and is the deriver's source
//! for resolving dotted cross-entity paths.
//!
//! Cascade producers are declared explicitly per entity (no runtime method
//! probing): each is an async closure receiving the primary store, the
//! changed record, and a delete flag, and returns a [`CascadeDirective`]
//! naming a *different* entity whose documents must be updated.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use syndex_core::error::{Error, Result};
use syndex_core::store::{CascadeDirective, PrimaryStore, RecordData};

use crate::kind::{ColumnType, FieldKind};
use crate::spec::SchemaOverride;

/// Default primary-key attribute name.
pub const DEFAULT_PRIMARY_KEY: &str = "id";

/// An explicitly declared cascade producer.
///
/// Invoked once per changeset entry of its owning entity, with `delete`
/// reflecting the entry's operation.
pub type CascadeProducer = Arc<
    dyn for<'a> Fn(&'a dyn PrimaryStore, &'a RecordData, bool) -> BoxFuture<'a, Result<CascadeDirective>>
        + Send
        + Sync,
>;

/// Everything declared about one record type.
#[derive(Clone, Default)]
pub struct EntitySpec {
    /// Storage name (table name) of the entity.
    pub name: String,

    /// Ordered searchable field paths; direct attributes or one-level
    /// dotted `relation.attribute` paths.
    pub searchable: Vec<String>,

    /// Column types declared by the primary store.
    pub columns: BTreeMap<String, ColumnType>,

    /// To-one relations: relation name → target entity name.
    pub relations: BTreeMap<String, String>,

    /// Computed/virtual fields with an optional type hint.
    pub computed: BTreeMap<String, Option<FieldKind>>,

    /// Explicit schema overrides, path → override.
    pub overrides: BTreeMap<String, SchemaOverride>,

    /// Primary-key attribute override (default `"id"`).
    pub primary_key: Option<String>,

    /// Index-name/namespace override (default: the storage name).
    pub index_name: Option<String>,

    /// Analyzer/tokenizer override for this entity's text fields.
    pub analyzer: Option<String>,

    /// Explicit cascade producers.
    pub cascades: Vec<CascadeProducer>,
}

impl EntitySpec {
    /// Start building a spec for the given storage name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Declare the searchable field paths.
    pub fn searchable<I, S>(mut self, paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable = paths.into_iter().map(Into::into).collect();
        self
    }

    /// Declare a storage column.
    pub fn column(mut self, attr: impl Into<String>, ty: ColumnType) -> Self {
        self.columns.insert(attr.into(), ty);
        self
    }

    /// Declare a to-one relation and its target entity.
    pub fn relation(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.relations.insert(name.into(), target.into());
        self
    }

    /// Declare a computed field, optionally with a type hint.
    pub fn computed(mut self, attr: impl Into<String>, hint: Option<FieldKind>) -> Self {
        self.computed.insert(attr.into(), hint);
        self
    }

    /// Attach an explicit schema override for one path.
    pub fn override_field(mut self, path: impl Into<String>, over: SchemaOverride) -> Self {
        self.overrides.insert(path.into(), over);
        self
    }

    /// Override the primary-key attribute.
    pub fn primary_key(mut self, attr: impl Into<String>) -> Self {
        self.primary_key = Some(attr.into());
        self
    }

    /// Override the index name / remote namespace.
    pub fn index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = Some(name.into());
        self
    }

    /// Override the analyzer used for this entity's text fields.
    pub fn analyzer(mut self, name: impl Into<String>) -> Self {
        self.analyzer = Some(name.into());
        self
    }

    /// Attach a cascade producer.
    pub fn cascade(mut self, producer: CascadeProducer) -> Self {
        self.cascades.push(producer);
        self
    }

    /// The effective primary-key attribute.
    pub fn key_attr(&self) -> &str {
        self.primary_key.as_deref().unwrap_or(DEFAULT_PRIMARY_KEY)
    }

    /// The effective index name.
    pub fn effective_index_name(&self) -> &str {
        self.index_name.as_deref().unwrap_or(&self.name)
    }

    /// Whether this entity participates in indexing at all.
    pub fn is_searchable(&self) -> bool {
        !self.searchable.is_empty()
    }

    /// The searchable paths that cross into a relation.
    pub fn dotted_paths(&self) -> impl Iterator<Item = &str> {
        self.searchable
            .iter()
            .map(String::as_str)
            .filter(|p| p.contains('.'))
    }
}

impl std::fmt::Debug for EntitySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntitySpec")
            .field("name", &self.name)
            .field("searchable", &self.searchable)
            .field("primary_key", &self.key_attr())
            .field("cascades", &self.cascades.len())
            .finish()
    }
}

/// All declared entities, keyed by storage name.
///
/// Built once at startup; immutable afterwards. The facade wraps it in an
/// `Arc` and shares it with the registry and the synchronizer.
#[derive(Debug, Default)]
pub struct EntityCatalog {
    entities: BTreeMap<String, Arc<EntitySpec>>,
}

impl EntityCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity spec, replacing any previous spec with that name.
    pub fn register(&mut self, spec: EntitySpec) -> &mut Self {
        self.entities.insert(spec.name.clone(), Arc::new(spec));
        self
    }

    /// Look up an entity by storage name; unknown names are a
    /// configuration error.
    pub fn get(&self, name: &str) -> Result<Arc<EntitySpec>> {
        self.entities
            .get(name)
            .cloned()
            .ok_or_else(|| Error::config(format!("unknown entity '{name}'")))
    }

    /// Entities that declare at least one searchable field.
    pub fn searchable_entities(&self) -> Vec<Arc<EntitySpec>> {
        self.entities
            .values()
            .filter(|e| e.is_searchable())
            .cloned()
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn post_spec() -> EntitySpec {
        EntitySpec::new("post")
            .searchable(["title", "content", "tag.name"])
            .column("id", ColumnType::Integer)
            .column("title", ColumnType::String)
            .column("content", ColumnType::Text)
            .relation("tag", "tag")
    }

    #[test]
    fn test_spec_defaults() {
        let spec = post_spec();
        assert_eq!(spec.key_attr(), "id");
        assert_eq!(spec.effective_index_name(), "post");
        assert!(spec.is_searchable());
        assert_eq!(spec.dotted_paths().collect::<Vec<_>>(), vec!["tag.name"]);
    }

    #[test]
    fn test_spec_overrides() {
        let spec = post_spec().primary_key("pk").index_name("posts_v2");
        assert_eq!(spec.key_attr(), "pk");
        assert_eq!(spec.effective_index_name(), "posts_v2");
    }

    #[test]
    fn test_catalog_lookup() {
        let mut catalog = EntityCatalog::new();
        catalog.register(post_spec());
        catalog.register(EntitySpec::new("tag").column("id", ColumnType::Integer));

        assert!(catalog.get("post").is_ok());
        assert!(catalog.get("user").is_err());
        let searchable = catalog.searchable_entities();
        assert_eq!(searchable.len(), 1);
        assert_eq!(searchable[0].name, "post");
    }
}

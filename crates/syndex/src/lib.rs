//! Syndex — keeps secondary search indexes synchronized with a primary
//! relational store and answers multi-field text queries against them.
//!
//! The [`Syndex`] facade wires the pieces together: an entity catalog, a
//! primary-store adapter, the per-entity index registry, the commit-hook
//! synchronizer, and the query translator. Three interchangeable engines
//! sit behind one backend contract, selected once from configuration:
//!
//! | Name | Engine |
//! |------|--------|
//! | `substring` | predicate scan over the primary store, no own storage |
//! | `tantivy`   | local durable inverted index, one directory per entity |
//! | `remote`    | Elasticsearch-compatible document store over HTTP |
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use syndex::{SearchOptions, Syndex};
//! use syndex_core::{MemoryStore, SyncConfig};
//! use syndex_schema::{ColumnType, EntityCatalog, EntitySpec};
//!
//! # async fn run() -> syndex_core::Result<()> {
//! let mut catalog = EntityCatalog::new();
//! catalog.register(
//!     EntitySpec::new("post")
//!         .searchable(["title", "content"])
//!         .column("title", ColumnType::String)
//!         .column("content", ColumnType::Text),
//! );
//!
//! let store = Arc::new(MemoryStore::new());
//! let syndex = Syndex::new(catalog, store, SyncConfig::default())?;
//! syndex.build_index(Some("post"), true, false).await?;
//! let selection = syndex.search("post", "book", &SearchOptions::default()).await?;
//! # Ok(()) }
//! ```

pub mod registry;
pub mod search;
pub mod sync;

use std::sync::Arc;

use syndex_core::config::SyncConfig;
use syndex_core::error::Result;
use syndex_core::store::{PrimaryStore, RecordData, StoreSelection};
use syndex_schema::entity::EntityCatalog;

pub use registry::{IndexHandle, IndexRegistry};
pub use search::SearchOptions;
pub use sync::{Dispatch, InlineDispatch, Synchronizer};

/// The assembled synchronization/search layer.
pub struct Syndex {
    catalog: Arc<EntityCatalog>,
    registry: Arc<IndexRegistry>,
    synchronizer: Synchronizer,
}

impl Syndex {
    /// Assemble the layer over a catalog, a primary-store adapter, and
    /// configuration values. Backend selection is validated here.
    pub fn new(
        catalog: EntityCatalog,
        store: Arc<dyn PrimaryStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        let catalog = Arc::new(catalog);
        let enable = config.enable;
        let registry = Arc::new(IndexRegistry::new(catalog.clone(), store.clone(), config)?);
        let synchronizer = Synchronizer::new(registry.clone(), catalog.clone(), store, enable);
        Ok(Self {
            catalog,
            registry,
            synchronizer,
        })
    }

    /// Replace the synchronizer's dispatch strategy.
    pub fn with_dispatch(mut self, dispatch: Arc<dyn Dispatch>) -> Self {
        self.synchronizer = self.synchronizer.with_dispatch(dispatch);
        self
    }

    /// The commit-hook synchronizer, to be wired into the primary store's
    /// transaction machinery.
    pub fn synchronizer(&self) -> &Synchronizer {
        &self.synchronizer
    }

    /// The index registry.
    pub fn registry(&self) -> &Arc<IndexRegistry> {
        &self.registry
    }

    /// (Re)index every record of one entity, or of all searchable entities
    /// when `entity` is `None`, from a full primary-store scan.
    ///
    /// `update` stages each record as an update over any existing document;
    /// `delete` removes each record's document instead (a full unindex).
    /// Each entity's handle commits once after its scan.
    pub async fn build_index(&self, entity: Option<&str>, update: bool, delete: bool) -> Result<()> {
        let specs = match entity {
            Some(name) => vec![self.catalog.get(name)?],
            None => self.catalog.searchable_entities(),
        };
        let store = self.synchronizer.store().clone();
        for spec in specs {
            let handle = self.registry.get(&spec.name).await?;
            let rows = store.scan(&spec.name).await?;
            log::info!(
                "rebuilding '{}': {} record(s), update={update} delete={delete}",
                spec.name,
                rows.len()
            );
            let dotted: Vec<String> = spec.dotted_paths().map(str::to_string).collect();
            for mut row in rows {
                if !delete {
                    for path in &dotted {
                        store.load_relation(&mut row, path).await?;
                    }
                }
                handle.apply_record(&row, update, delete).await?;
            }
            handle.commit().await?;
        }
        Ok(())
    }

    /// Re-index a single record and commit.
    pub async fn rebuild_one(&self, record: &RecordData) -> Result<()> {
        let handle = self.registry.get(&record.entity).await?;
        handle.apply_record(record, true, false).await?;
        handle.commit().await
    }

    /// Remove a single record's document and commit.
    pub async fn remove_one(&self, record: &RecordData) -> Result<()> {
        let handle = self.registry.get(&record.entity).await?;
        handle.apply_record(record, false, true).await?;
        handle.commit().await
    }

    /// Search one entity's index; the returned selection is the key-set
    /// filter the caller applies to the primary store.
    pub async fn search(
        &self,
        entity: &str,
        query: &str,
        options: &SearchOptions,
    ) -> Result<StoreSelection> {
        let handle = self.registry.get(entity).await?;
        search::run_search(&handle, query, options).await
    }
}

impl std::fmt::Debug for Syndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Syndex")
            .field("registry", &self.registry)
            .finish()
    }
}

//! The index registry.
//!
//! One [`IndexHandle`] per searchable entity, constructed lazily on first
//! access and cached for the process lifetime. Construction is the only
//! place a backend is opened; a construction failure (unreachable server,
//! uncreatable directory) is fatal and propagated, never retried.
//!
//! The handle cache lives behind an async mutex held across construction,
//! so two tasks racing to first-access the same entity serialize instead of
//! building the backend twice.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use syndex_core::analyzer::{AnalyzerRef, default_analyzer};
use syndex_core::backend::{IndexBackend, SearchHit, SearchRequest, SubstringBackend};
use syndex_core::config::SyncConfig;
use syndex_core::error::{Error, Result};
use syndex_core::store::{ChangeEntry, ChangeOp, PrimaryStore, RecordData};
use syndex_core::value::IndexDocument;
use syndex_remote::{DocumentStoreBackend, RemoteClient};
use syndex_schema::derive::EntitySchema;
use syndex_schema::entity::{EntityCatalog, EntitySpec};
use syndex_tantivy::{AnalyzerSet, InvertedIndexBackend};

/// The live search-side state of one entity: its spec, its derived schema,
/// and the backend that indexes it.
pub struct IndexHandle {
    spec: Arc<EntitySpec>,
    schema: EntitySchema,
    backend: Arc<dyn IndexBackend>,
}

impl IndexHandle {
    /// The entity spec this handle serves.
    pub fn spec(&self) -> &EntitySpec {
        &self.spec
    }

    /// The derived search schema.
    pub fn schema(&self) -> &EntitySchema {
        &self.schema
    }

    /// Engine name, for diagnostics.
    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    /// Flatten a record into the document the backend indexes.
    ///
    /// Only paths the derived schema knows are carried over; anything else
    /// on the record is ignored. Paths absent from the record are left out
    /// of the document rather than written as null.
    pub fn extract_document(&self, record: &RecordData) -> Result<IndexDocument> {
        let key = record.key(self.spec.key_attr())?;
        let mut doc = IndexDocument::new(key);
        for path in self.schema.field_paths() {
            if let Some(value) = record.get(&path) {
                doc.fields.insert(path, value.clone());
            }
        }
        Ok(doc)
    }

    /// Stage one record mutation, selecting create/update/delete from the
    /// `update`/`delete` flags (neither set means create).
    ///
    /// Requesting update and delete together is a caller error, rejected
    /// before any document is touched.
    pub async fn apply_record(&self, record: &RecordData, update: bool, delete: bool) -> Result<()> {
        if update && delete {
            return Err(Error::ConflictingOperations);
        }
        if delete {
            let key = record.key(self.spec.key_attr())?;
            return self.backend.delete(&key).await;
        }
        let doc = self.extract_document(record)?;
        if update {
            let key = doc.key.clone();
            self.backend.update(&key, &doc).await
        } else {
            self.backend.create(&doc).await
        }
    }

    /// Stage one changeset entry.
    pub async fn apply_change(&self, entry: &ChangeEntry) -> Result<()> {
        match entry.op {
            ChangeOp::Insert => self.apply_record(&entry.record, false, false).await,
            ChangeOp::Update => self.apply_record(&entry.record, true, false).await,
            ChangeOp::Delete => self.apply_record(&entry.record, false, true).await,
        }
    }

    /// Stage a partial-document update at `key` (cascade path).
    pub async fn apply_partial(&self, key: &str, doc: &IndexDocument) -> Result<()> {
        self.backend.update(key, doc).await
    }

    /// Make this handle's staged mutations searchable.
    pub async fn commit(&self) -> Result<()> {
        self.backend.commit().await
    }

    /// Discard this handle's staged mutations.
    pub async fn rollback(&self) -> Result<()> {
        self.backend.rollback().await
    }

    /// Run a search against this handle's backend.
    pub async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        self.backend.search(request).await
    }
}

impl std::fmt::Debug for IndexHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexHandle")
            .field("entity", &self.spec.name)
            .field("backend", &self.backend.name())
            .finish()
    }
}

/// Process-wide cache of index handles, keyed by entity storage name.
pub struct IndexRegistry {
    catalog: Arc<EntityCatalog>,
    store: Arc<dyn PrimaryStore>,
    config: SyncConfig,
    keyword_analyzer: AnalyzerRef,
    analyzers: AnalyzerSet,
    handles: tokio::sync::Mutex<HashMap<String, Arc<IndexHandle>>>,
}

impl IndexRegistry {
    /// Create a registry over a catalog and primary store.
    ///
    /// The backend name and its prerequisites are validated here so a typo
    /// fails at setup rather than on the first commit.
    pub fn new(
        catalog: Arc<EntityCatalog>,
        store: Arc<dyn PrimaryStore>,
        config: SyncConfig,
    ) -> Result<Self> {
        match config.backend.as_str() {
            "substring" | "tantivy" => {}
            "remote" => {
                if config.remote.is_none() {
                    return Err(Error::config(
                        "the 'remote' backend requires remote settings (url)",
                    ));
                }
            }
            other => {
                return Err(Error::config(format!(
                    "unknown backend '{other}' (expected substring, tantivy, or remote)"
                )));
            }
        }
        Ok(Self {
            catalog,
            store,
            config,
            keyword_analyzer: default_analyzer(),
            analyzers: AnalyzerSet::new(),
            handles: tokio::sync::Mutex::new(HashMap::new()),
        })
    }

    /// Replace the keyword analyzer used by the substring backend.
    pub fn with_keyword_analyzer(mut self, analyzer: AnalyzerRef) -> Self {
        self.keyword_analyzer = analyzer;
        self
    }

    /// Replace the named-tokenizer set installed on inverted indexes.
    pub fn with_analyzers(mut self, analyzers: AnalyzerSet) -> Self {
        self.analyzers = analyzers;
        self
    }

    /// The catalog this registry resolves entities against.
    pub fn catalog(&self) -> &EntityCatalog {
        &self.catalog
    }

    /// Get (or lazily construct) the handle for `entity`.
    pub async fn get(&self, entity: &str) -> Result<Arc<IndexHandle>> {
        let mut handles = self.handles.lock().await;
        if let Some(handle) = handles.get(entity) {
            return Ok(handle.clone());
        }

        let spec = self.catalog.get(entity)?;
        if !spec.is_searchable() {
            return Err(Error::config(format!(
                "entity '{entity}' declares no searchable fields"
            )));
        }
        let schema = syndex_schema::derive(&spec, &self.catalog)?;
        let backend = self.construct_backend(&spec, &schema).await?;
        log::info!("opened {} index handle for '{entity}'", backend.name());

        let handle = Arc::new(IndexHandle {
            spec,
            schema,
            backend,
        });
        handles.insert(entity.to_string(), handle.clone());
        Ok(handle)
    }

    async fn construct_backend(
        &self,
        spec: &EntitySpec,
        schema: &EntitySchema,
    ) -> Result<Arc<dyn IndexBackend>> {
        match self.config.backend.as_str() {
            "substring" => Ok(Arc::new(SubstringBackend::new(
                spec.name.clone(),
                spec.key_attr(),
                self.store.clone(),
                self.keyword_analyzer.clone(),
            ))),
            "tantivy" => Ok(Arc::new(InvertedIndexBackend::open(
                Path::new(&self.config.index_root),
                spec.effective_index_name(),
                schema,
                spec.analyzer.as_deref(),
                &self.analyzers,
                self.config.candidate_cap,
            )?)),
            "remote" => {
                // validated in new()
                let remote = self.config.remote.as_ref().ok_or_else(|| {
                    Error::config("the 'remote' backend requires remote settings (url)")
                })?;
                let client = RemoteClient::new(&remote.url)?;
                // entities without an explicit index-name override share the
                // configured namespace
                let index = spec.index_name.as_deref().unwrap_or(&remote.namespace);
                Ok(Arc::new(
                    DocumentStoreBackend::connect(client, index, schema, self.config.candidate_cap)
                        .await?,
                ))
            }
            other => Err(Error::config(format!("unknown backend '{other}'"))),
        }
    }
}

impl std::fmt::Debug for IndexRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexRegistry")
            .field("backend", &self.config.backend)
            .field("index_root", &self.config.index_root)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

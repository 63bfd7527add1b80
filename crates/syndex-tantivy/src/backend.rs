//! The inverted-index backend.
//!
//! One durable tantivy index per entity, materialized as a directory under
//! the configured root path: absence triggers creation, presence triggers
//! reopen (no migration format — schema changes require a full rebuild).
//!
//! Mutations buffer into the lazily opened writer; `commit` flushes the
//! writer, closes it, and reloads the reader so subsequent searches see the
//! writes. `search` parses the query with a multi-field parser over the
//! requested fields, combining terms with OR or AND per the request, and
//! returns keys with their BM25 rank.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use syndex_core::backend::{IndexBackend, SearchHit, SearchRequest};
use syndex_core::error::{Error, Result};
use syndex_core::value::IndexDocument;
use syndex_schema::derive::EntitySchema;
use tantivy::collector::TopDocs;
use tantivy::query::{QueryParser, TermQuery};
use tantivy::schema::{IndexRecordOption, Value};
use tantivy::{Index, IndexReader, ReloadPolicy, TantivyDocument, Term};

use crate::schema::{AnalyzerSet, IndexSchema};

/// Local, durable, per-entity inverted-index backend.
pub struct InvertedIndexBackend {
    entity: String,
    path: PathBuf,
    schema: IndexSchema,
    index: Index,
    reader: IndexReader,
    writer: crate::writer::WriterCell,
    candidate_cap: usize,
}

impl InvertedIndexBackend {
    /// Create or open the index for one entity.
    ///
    /// The index lives at `<root>/<index_name>`; the directory is created
    /// when missing and reopened when `meta.json` is already present.
    /// Construction failure is fatal and propagated — the registry does not
    /// retry.
    pub fn open(
        root: &Path,
        index_name: &str,
        entity_schema: &EntitySchema,
        entity_analyzer: Option<&str>,
        analyzers: &AnalyzerSet,
        candidate_cap: usize,
    ) -> Result<Self> {
        let path = root.join(index_name);
        if !path.exists() {
            std::fs::create_dir_all(&path).map_err(|e| Error::io_with_path(e, &path))?;
        }

        let schema = IndexSchema::build(entity_schema, entity_analyzer);
        let index = if path.join("meta.json").exists() {
            log::info!("opening index for '{index_name}' at {}", path.display());
            Index::open_in_dir(&path)
                .map_err(|e| Error::backend(format!("failed to open index '{index_name}': {e}")))?
        } else {
            log::info!("creating index for '{index_name}' at {}", path.display());
            Index::create_in_dir(&path, schema.schema().clone())
                .map_err(|e| Error::backend(format!("failed to create index '{index_name}': {e}")))?
        };
        analyzers.install(&index);

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(|e| Error::backend(format!("failed to open index reader: {e}")))?;

        Ok(Self {
            entity: index_name.to_string(),
            path,
            schema,
            index: index.clone(),
            reader,
            writer: crate::writer::WriterCell::new(index),
            candidate_cap,
        })
    }

    /// Directory this entity's segments live in.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Fetch the last committed document for `key`, if any.
    fn committed_doc(&self, key: &str) -> Result<Option<IndexDocument>> {
        let term = Term::from_field_text(self.schema.key_field(), key);
        let query = TermQuery::new(term, IndexRecordOption::Basic);
        let searcher = self.reader.searcher();
        let top = searcher
            .search(&query, &TopDocs::with_limit(1))
            .map_err(|e| Error::backend(format!("key lookup failed: {e}")))?;
        match top.first() {
            Some((_, address)) => {
                let stored: TantivyDocument = searcher
                    .doc(*address)
                    .map_err(|e| Error::backend(format!("failed to load stored document: {e}")))?;
                Ok(Some(self.schema.from_stored(&stored)?))
            }
            None => Ok(None),
        }
    }
}

#[async_trait]
impl IndexBackend for InvertedIndexBackend {
    async fn create(&self, doc: &IndexDocument) -> Result<()> {
        log::debug!("creating document {}/{}", self.entity, doc.key);
        let tantivy_doc = self.schema.to_tantivy(doc);
        self.writer.with_writer(|writer| {
            writer
                .add_document(tantivy_doc)
                .map_err(|e| Error::backend(format!("failed to add document: {e}")))?;
            Ok(())
        })
    }

    async fn update(&self, key: &str, doc: &IndexDocument) -> Result<()> {
        log::debug!("updating document {}/{key}", self.entity);
        // partial documents merge over the last committed version; a target
        // staged earlier in the same uncommitted batch merges from its
        // committed state only
        let merged = match self.committed_doc(key)? {
            Some(current) => current.merged_with(doc),
            None => {
                let mut full = doc.clone();
                full.key = key.to_string();
                full
            }
        };
        let tantivy_doc = self.schema.to_tantivy(&merged);
        let term = Term::from_field_text(self.schema.key_field(), key);
        self.writer.with_writer(|writer| {
            writer.delete_term(term);
            writer
                .add_document(tantivy_doc)
                .map_err(|e| Error::backend(format!("failed to add document: {e}")))?;
            Ok(())
        })
    }

    async fn delete(&self, key: &str) -> Result<()> {
        log::debug!("deleting document {}/{key}", self.entity);
        let term = Term::from_field_text(self.schema.key_field(), key);
        self.writer.with_writer(|writer| {
            writer.delete_term(term);
            Ok(())
        })
    }

    async fn commit(&self) -> Result<()> {
        if self.writer.commit()? {
            self.reader
                .reload()
                .map_err(|e| Error::backend(format!("failed to reload index reader: {e}")))?;
        }
        Ok(())
    }

    async fn rollback(&self) -> Result<()> {
        log::debug!("rolling back staged mutations on '{}'", self.entity);
        self.writer.abort()
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let fields = self.schema.query_fields(&request.fields)?;
        let mut parser = QueryParser::for_index(&self.index, fields);
        if !request.or_ {
            parser.set_conjunction_by_default();
        }
        let query = parser
            .parse_query(&request.query)
            .map_err(|e| Error::query(e.to_string()))?;

        let limit = request.limit.unwrap_or(self.candidate_cap);
        if limit == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();
        let top = searcher
            .search(&query, &TopDocs::with_limit(limit))
            .map_err(|e| Error::backend(format!("search failed: {e}")))?;

        log::debug!(
            "inverted search on '{}': query='{}' hits={}",
            self.entity,
            request.query,
            top.len()
        );

        let mut hits = Vec::with_capacity(top.len());
        for (score, address) in top {
            let stored: TantivyDocument = searcher
                .doc(address)
                .map_err(|e| Error::backend(format!("failed to load stored document: {e}")))?;
            let key = stored
                .get_first(self.schema.key_field())
                .and_then(|v| v.as_str())
                .ok_or_else(|| Error::backend("stored document is missing its primary key"))?
                .to_string();
            hits.push(SearchHit {
                key,
                rank: Some(score),
            });
        }
        Ok(hits)
    }

    fn name(&self) -> &str {
        "tantivy"
    }
}

impl std::fmt::Debug for InvertedIndexBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndexBackend")
            .field("entity", &self.entity)
            .field("path", &self.path)
            .field("candidate_cap", &self.candidate_cap)
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

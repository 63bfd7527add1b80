//! Index backend capability trait and the substring backend.
//!
//! Every index engine implements [`IndexBackend`]:
//!
//! - `SubstringBackend` (this module): no storage of its own, predicate scan
//!   over the primary store.
//! - `InvertedIndexBackend` (`syndex-tantivy`): local durable tantivy index.
//! - `DocumentStoreBackend` (`syndex-remote`): remote clustered document
//!   store behind an HTTP API.
//!
//! One contract, three engines; selection happens once at setup from
//! configuration, never per call.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::analyzer::AnalyzerRef;
use crate::error::Result;
use crate::store::PrimaryStore;
use crate::value::IndexDocument;

/// Parameters for one backend search.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Raw query string.
    pub query: String,

    /// Field paths to search. Always resolved by the translator before the
    /// request reaches a backend; never empty.
    pub fields: Vec<String>,

    /// Maximum number of candidate keys to return.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,

    /// Combine keywords/terms with OR (`true`) or AND (`false`).
    pub or_: bool,

    /// Backend-specific extra parameters, passed through verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra: Option<serde_json::Value>,
}

/// One search hit: a primary key plus an optional relevance rank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    /// Primary key of the matching record.
    pub key: String,

    /// Backend-supplied relevance score, when the engine ranks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rank: Option<f32>,
}

/// Abstract index backend: the per-entity create/update/delete/commit/search
/// contract shared by all engines.
///
/// `update` accepts *partial* documents: cascade directives carry only the
/// fields they change, and each engine merges as it can (see the individual
/// implementations). `create` always receives a full document.
#[async_trait]
pub trait IndexBackend: Send + Sync {
    /// Stage a new document.
    async fn create(&self, doc: &IndexDocument) -> Result<()>;

    /// Stage a (possibly partial) replacement of the document at `key`.
    async fn update(&self, key: &str, doc: &IndexDocument) -> Result<()>;

    /// Stage removal of the document at `key`.
    async fn delete(&self, key: &str) -> Result<()>;

    /// Make staged mutations visible to subsequent searches.
    async fn commit(&self) -> Result<()>;

    /// Discard staged, uncommitted mutations. Engines that write through
    /// immediately have nothing staged, so the default is a no-op.
    async fn rollback(&self) -> Result<()> {
        Ok(())
    }

    /// Execute a search, returning hits ordered by the engine's own rule.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>>;

    /// Engine name for diagnostics.
    fn name(&self) -> &str;
}

// ============================================================================
// SubstringBackend
// ============================================================================

/// Substring-predicate backend with no independent storage.
///
/// The primary store stays the source of truth, so every mutation is a
/// no-op. `search` splits the query into keywords (whitespace or a supplied
/// analyzer), requires a substring match per keyword inside each field,
/// combines keywords with AND or OR per the request, combines fields with
/// OR, and returns matching keys in store order with no rank.
///
/// # Limitations
///
/// - O(rows × fields × keywords) per query
/// - no stemming, no relevance rank
pub struct SubstringBackend {
    entity: String,
    key_attr: String,
    store: Arc<dyn PrimaryStore>,
    analyzer: AnalyzerRef,
}

impl SubstringBackend {
    /// Create a backend for one entity.
    pub fn new(
        entity: impl Into<String>,
        key_attr: impl Into<String>,
        store: Arc<dyn PrimaryStore>,
        analyzer: AnalyzerRef,
    ) -> Self {
        Self {
            entity: entity.into(),
            key_attr: key_attr.into(),
            store,
            analyzer,
        }
    }
}

#[async_trait]
impl IndexBackend for SubstringBackend {
    async fn create(&self, _doc: &IndexDocument) -> Result<()> {
        Ok(())
    }

    async fn update(&self, _key: &str, _doc: &IndexDocument) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<()> {
        Ok(())
    }

    async fn commit(&self) -> Result<()> {
        Ok(())
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<SearchHit>> {
        let keywords: Vec<String> = self
            .analyzer
            .keywords(&request.query)
            .into_iter()
            .filter(|k| !k.is_empty())
            .collect();

        log::debug!(
            "substring search on '{}': fields={:?} keywords={:?} or={}",
            self.entity,
            request.fields,
            keywords,
            request.or_
        );

        if keywords.is_empty() {
            return Ok(Vec::new());
        }

        let rows = self.store.scan(&self.entity).await?;
        let mut hits = Vec::new();
        for row in rows {
            if request.limit.is_some_and(|l| hits.len() >= l) {
                break;
            }
            let matched = request.fields.iter().any(|field| {
                let text = row.get(field).map(|v| v.as_text()).unwrap_or_default();
                if request.or_ {
                    keywords.iter().any(|k| text.contains(k.as_str()))
                } else {
                    keywords.iter().all(|k| text.contains(k.as_str()))
                }
            });
            if matched {
                hits.push(SearchHit {
                    key: row.key(&self.key_attr)?,
                    rank: None,
                });
            }
        }
        Ok(hits)
    }

    fn name(&self) -> &str {
        "substring"
    }
}

// ============================================================================
// Tests
// ============================================================================

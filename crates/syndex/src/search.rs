//! The query translator.
//!
//! Turns caller-level search parameters into a backend [`SearchRequest`]
//! and the backend's hits into a [`StoreSelection`] the caller filters the
//! primary store with. An empty hit set becomes [`StoreSelection::Empty`] —
//! a guaranteed-match-nothing filter, not an error.
//!
//! Rank ordering, when requested, sorts only the candidate set the backend
//! returned under its limit; it never re-queries the full index for a
//! global top-K. Ties keep the backend's own result order.

use syndex_core::backend::{SearchHit, SearchRequest};
use syndex_core::error::Result;
use syndex_core::store::StoreSelection;

use crate::registry::IndexHandle;

/// Caller-level search parameters.
#[derive(Debug, Clone, Default)]
pub struct SearchOptions {
    /// Field paths to search; defaults to every searchable path of the
    /// entity.
    pub fields: Option<Vec<String>>,

    /// Maximum number of candidate keys fetched from the index. Bounds the
    /// candidate set, not the post-filter row count.
    pub limit: Option<usize>,

    /// Combine keywords with OR (`Some(true)`) or AND (`Some(false)`);
    /// `None` uses the backend's default (OR for the remote store, AND
    /// otherwise).
    pub or_: Option<bool>,

    /// Order the returned keys by backend rank (descending) when available.
    pub rank_order: bool,

    /// Backend-specific extra parameters, passed through verbatim.
    pub extra: Option<serde_json::Value>,
}

impl SearchOptions {
    /// Options restricted to the given fields.
    pub fn fields<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            fields: Some(paths.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Options with a candidate limit.
    pub fn limited(limit: usize) -> Self {
        Self {
            limit: Some(limit),
            ..Self::default()
        }
    }

    /// Options with an explicit OR/AND keyword mode.
    pub fn with_or(or_: bool) -> Self {
        Self {
            or_: Some(or_),
            ..Self::default()
        }
    }
}

/// Run one translated search against an entity's handle.
pub async fn run_search(
    handle: &IndexHandle,
    query: &str,
    options: &SearchOptions,
) -> Result<StoreSelection> {
    let fields = options
        .fields
        .clone()
        .unwrap_or_else(|| handle.schema().field_paths());
    let or_ = options
        .or_
        .unwrap_or_else(|| handle.backend_name() == "remote");

    let request = SearchRequest {
        query: query.to_string(),
        fields,
        limit: options.limit,
        or_,
        extra: options.extra.clone(),
    };

    let hits = handle.search(&request).await?;
    log::debug!(
        "search '{query}' on '{}' via {}: {} hit(s)",
        handle.spec().name,
        handle.backend_name(),
        hits.len()
    );
    Ok(into_selection(hits, options.rank_order))
}

/// Collapse hits into a key selection, optionally rank-ordered.
fn into_selection(mut hits: Vec<SearchHit>, rank_order: bool) -> StoreSelection {
    if hits.is_empty() {
        return StoreSelection::Empty;
    }
    if rank_order {
        // stable sort keeps backend order for equal or missing ranks
        hits.sort_by(|a, b| {
            b.rank
                .partial_cmp(&a.rank)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
    }
    StoreSelection::Keys(hits.into_iter().map(|h| h.key).collect())
}

// ============================================================================
// Tests
// ============================================================================

//! Configuration values consumed by the core.
//!
//! Only the *values* live here; loading them (files, environment, app
//! settings) is an external concern. Defaults match the original layer's
//! behavior: substring backend, indexing enabled, per-entity index
//! directories under `syndex_index/`.

use serde::{Deserialize, Serialize};

/// Candidate cap used when a search carries no explicit limit.
///
/// The inverted-index collector needs *some* bound; this is deliberately
/// generous so unlimited searches behave as expected for realistic tables.
pub const DEFAULT_CANDIDATE_CAP: usize = 10_000;

/// Top-level synchronization/search configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Backend name: `"substring"`, `"tantivy"`, or `"remote"`.
    #[serde(default = "default_backend")]
    pub backend: String,

    /// Root directory (tantivy) or namespace (remote) for indexes.
    #[serde(default = "default_index_root")]
    pub index_root: String,

    /// Master switch; when `false` the commit hooks do nothing.
    #[serde(default = "default_true")]
    pub enable: bool,

    /// Candidate cap applied when a search has no explicit limit.
    #[serde(default = "default_candidate_cap")]
    pub candidate_cap: usize,

    /// Remote document-store settings, required for the `"remote"` backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote: Option<RemoteConfig>,
}

/// Settings for the remote document-store backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the cluster, e.g. `http://localhost:9200`.
    pub url: String,

    /// Shared namespace for entities without an explicit override.
    #[serde(default = "default_index_root")]
    pub namespace: String,
}

fn default_backend() -> String {
    "substring".to_string()
}

fn default_index_root() -> String {
    "syndex_index".to_string()
}

fn default_true() -> bool {
    true
}

fn default_candidate_cap() -> usize {
    DEFAULT_CANDIDATE_CAP
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            index_root: default_index_root(),
            enable: default_true(),
            candidate_cap: default_candidate_cap(),
            remote: None,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

//! Error types for syndex-core.
//!
//! Every syndex crate funnels into this taxonomy:
//!
//! - [`Error::Config`]: unresolvable field path, unknown backend name,
//!   missing primary key. Fatal at setup or first use, never retried.
//! - [`Error::ConflictingOperations`]: update and delete requested on the
//!   same call. Rejected before any document is mutated.
//! - [`Error::Backend`] / [`Error::Io`]: disk or network failure surfaced
//!   to the commit caller unmodified. The core performs no retry or backoff;
//!   a surrounding system may wrap the dispatch indirection with policy.
//! - [`Error::Query`]: malformed query syntax, surfaced to the `search`
//!   caller with no fallback parsing.
//! - [`Error::Store`]: failure reported by the primary-store adapter.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Result type alias for syndex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the syndex core.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    /// Invalid or unresolvable configuration. Fatal at first use.
    #[error("configuration error: {0}")]
    Config(String),

    /// Update and delete requested together on one apply call.
    #[error("update and delete cannot be requested together")]
    ConflictingOperations,

    /// Backend operation failure (index writer, remote call, query execution).
    #[error("backend error: {0}")]
    Backend(String),

    /// Filesystem failure with the offending path attached.
    #[error("{path}: {source}")]
    Io {
        /// Underlying I/O error.
        source: std::io::Error,
        /// Path the operation was acting on.
        path: PathBuf,
    },

    /// Malformed query syntax.
    #[error("query error: {0}")]
    Query(String),

    /// Failure reported by the primary-store adapter.
    #[error("primary store error: {0}")]
    Store(String),
}

impl Error {
    /// Build a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Build a query error.
    pub fn query(msg: impl Into<String>) -> Self {
        Self::Query(msg.into())
    }

    /// Build a primary-store error.
    pub fn store(msg: impl Into<String>) -> Self {
        Self::Store(msg.into())
    }

    /// Build an I/O error carrying the path it occurred on.
    pub fn io_with_path(source: std::io::Error, path: &Path) -> Self {
        Self::Io {
            source,
            path: path.to_path_buf(),
        }
    }

    /// Returns `true` for errors that indicate a caller/config mistake
    /// rather than an environmental failure.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Config(_) | Self::ConflictingOperations)
    }
}

// ============================================================================
// Tests
// ============================================================================

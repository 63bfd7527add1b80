//! Syndex core — shared types, traits, and errors.
//!
//! This crate is dependency level 0 for the workspace: everything the
//! backends and the synchronizer agree on lives here.
//!
//! # Modules
//!
//! - [`error`]: error taxonomy and `Result` alias
//! - [`value`]: field values and index documents
//! - [`store`]: primary-store abstraction, changesets, cascade directives
//! - [`backend`]: the `IndexBackend` capability trait and the substring
//!   backend
//! - [`analyzer`]: pluggable keyword tokenization
//! - [`config`]: serde configuration values (loading is external)

pub mod analyzer;
pub mod backend;
pub mod config;
pub mod error;
pub mod store;
pub mod value;

// Re-export key types at crate root for convenience
pub use analyzer::{Analyzer, AnalyzerRef, WhitespaceAnalyzer, default_analyzer};
pub use backend::{IndexBackend, SearchHit, SearchRequest, SubstringBackend};
pub use config::{DEFAULT_CANDIDATE_CAP, RemoteConfig, SyncConfig};
pub use error::{Error, Result};
pub use store::{
    CascadeDirective, CascadeUpdate, ChangeEntry, ChangeOp, Changeset, MemoryStore, PrimaryStore,
    RecordData, StoreSelection,
};
pub use value::{FieldValue, IndexDocument};

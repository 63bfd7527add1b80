//! Remote document-store backend over HTTP.
//!
//! Talks to an Elasticsearch-compatible server: one index per entity,
//! documents keyed by the entity's primary key, query-string search with
//! AND/OR term combining. Writes are applied server-side immediately;
//! commit maps to an index refresh.

pub mod backend;
pub mod client;

pub use backend::DocumentStoreBackend;
pub use client::RemoteClient;

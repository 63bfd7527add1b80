//! Local inverted-index backend built on tantivy.
//!
//! Each entity gets its own durable index directory under a configured
//! root. Mutations buffer into a lazily opened single writer and become
//! visible at commit; queries run through a multi-field parser with
//! conjunction or disjunction combining and return BM25-ranked keys.
//!
//! # Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`schema`] | entity schema → tantivy schema mapping, tokenizer set |
//! | [`writer`] | lazily opened writer cell, closed on commit/abort |
//! | [`backend`] | the [`backend::InvertedIndexBackend`] itself |

pub mod backend;
pub mod schema;
pub mod writer;

pub use backend::InvertedIndexBackend;
pub use schema::{AnalyzerSet, DEFAULT_TOKENIZER, IndexSchema};
pub use writer::WriterCell;

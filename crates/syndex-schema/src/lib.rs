//! Syndex schema deriver.
//!
//! Turns declared entity specifications into backend-neutral search
//! schemas: field kinds, dotted cross-entity paths, computed fields,
//! explicit overrides, and the always-present primary-key descriptor.
//!
//! # Modules
//!
//! - [`kind`]: field kinds and storage column types
//! - [`spec`]: concrete field specs and explicit overrides
//! - [`entity`]: entity specifications, cascade producers, the catalog
//! - [`derive`]: the derivation algorithm

pub mod derive;
pub mod entity;
pub mod kind;
pub mod spec;

// Re-exports
pub use derive::{EntitySchema, FieldDescriptor, derive};
pub use entity::{CascadeProducer, DEFAULT_PRIMARY_KEY, EntityCatalog, EntitySpec};
pub use kind::{ColumnType, FieldKind};
pub use spec::{FieldSpec, SchemaOverride};

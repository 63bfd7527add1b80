//! The schema deriver.
//!
//! Turns an entity's declared searchable paths into backend-neutral field
//! descriptors. Resolution order per path, first match wins:
//!
//! 1. explicit schema override — a name goes through the fixed kind-name
//!    table, a concrete spec is used verbatim;
//! 2. computed/virtual field — uses the attached type hint, defaulting to
//!    analyzed text;
//! 3. the path is the primary key — covered by the always-present
//!    primary-key descriptor (the path is skipped rather than duplicated,
//!    preserving the one-primary-key invariant);
//! 4. the storage column type, mapped through the fixed type table.
//!
//! Dotted paths resolve the first segment as a to-one relation declared on
//! the entity and the remainder as an attribute of the related entity —
//! exactly one level of nesting is supported. An unresolvable path is a
//! fatal configuration error raised at first use, never silently skipped.
//!
//! Derivation runs once per entity: the registry caches the derived schema
//! inside the entity's index handle for the process lifetime.

use syndex_core::error::{Error, Result};

use crate::entity::{EntityCatalog, EntitySpec};
use crate::kind::FieldKind;
use crate::spec::{FieldSpec, SchemaOverride};

/// One derived field: path plus concrete spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    /// Searchable path (direct attribute or dotted `relation.attribute`).
    pub path: String,
    /// Concrete field specification.
    pub spec: FieldSpec,
}

/// The derived search schema of one entity.
#[derive(Debug, Clone)]
pub struct EntitySchema {
    /// The primary-key descriptor; always present, exactly one.
    pub primary_key: FieldDescriptor,
    /// Descriptors for the declared searchable paths, in declaration order.
    pub fields: Vec<FieldDescriptor>,
}

impl EntitySchema {
    /// Paths of the searchable fields, in declaration order.
    pub fn field_paths(&self) -> Vec<String> {
        self.fields.iter().map(|f| f.path.clone()).collect()
    }

    /// Look up a descriptor by path (searchable fields only).
    pub fn descriptor(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.path == path)
    }

    /// Every descriptor including the primary key.
    pub fn all_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        std::iter::once(&self.primary_key).chain(self.fields.iter())
    }
}

/// Derive the search schema for `spec`, resolving dotted paths through
/// `catalog`.
pub fn derive(spec: &EntitySpec, catalog: &EntityCatalog) -> Result<EntitySchema> {
    let key_attr = spec.key_attr();
    let primary_key = FieldDescriptor {
        path: key_attr.to_string(),
        spec: FieldSpec::of(FieldKind::PrimaryKey),
    };

    let mut fields = Vec::with_capacity(spec.searchable.len());
    for path in &spec.searchable {
        // (1) explicit override for the full path
        if let Some(over) = spec.overrides.get(path) {
            let field_spec = match over {
                SchemaOverride::Named(name) => FieldSpec::of(FieldKind::from_name(name)),
                SchemaOverride::Spec(field_spec) => field_spec.clone(),
            };
            fields.push(FieldDescriptor {
                path: path.clone(),
                spec: field_spec,
            });
            continue;
        }

        // the primary key is already covered by its own descriptor
        if path == key_attr {
            log::debug!(
                "'{}.{path}' is the primary key; descriptor already present",
                spec.name
            );
            continue;
        }

        let field_spec = match path.split_once('.') {
            Some((relation, attr)) => {
                let target_name = spec.relations.get(relation).ok_or_else(|| {
                    Error::config(format!(
                        "entity '{}' declares searchable path '{path}' but no relation '{relation}'",
                        spec.name
                    ))
                })?;
                let target = catalog.get(target_name)?;
                resolve_attr(&target, attr, path)?
            }
            None => resolve_attr(spec, path, path)?,
        };

        fields.push(FieldDescriptor {
            path: path.clone(),
            spec: field_spec,
        });
    }

    Ok(EntitySchema {
        primary_key,
        fields,
    })
}

/// Resolve a direct attribute on `entity`: computed hint first, then the
/// column type table.
fn resolve_attr(entity: &EntitySpec, attr: &str, full_path: &str) -> Result<FieldSpec> {
    if let Some(hint) = entity.computed.get(attr) {
        // computed fields without a hint default to analyzed text
        return Ok(FieldSpec::of(hint.unwrap_or(FieldKind::Text)));
    }
    if attr == entity.key_attr() {
        return Ok(FieldSpec::of(FieldKind::Keyword));
    }
    match entity.columns.get(attr) {
        Some(column) => Ok(FieldSpec::of(column.field_kind())),
        None => Err(Error::config(format!(
            "cannot resolve searchable path '{full_path}': entity '{}' has no attribute '{attr}'",
            entity.name
        ))),
    }
}

// ============================================================================
// Tests
// ============================================================================

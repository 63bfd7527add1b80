//! Field values and index documents.
//!
//! [`FieldValue`] is the backend-neutral representation of a single record
//! attribute; [`IndexDocument`] is the flattened per-record document handed
//! to a backend (one entry per searchable path, dotted paths included).

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single backend-neutral field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldValue {
    /// Analyzed text.
    Text(String),
    /// Exact-match keyword (primary keys, tags).
    Keyword(String),
    /// Signed integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Boolean flag.
    Bool(bool),
    /// Date or datetime, UTC.
    Date(DateTime<Utc>),
    /// Opaque binary payload.
    Bytes(Vec<u8>),
    /// Absent value (e.g. unset to-one relation).
    Null,
}

impl FieldValue {
    /// Render the value the way it is fed to a text index.
    ///
    /// Mirrors the original behavior of stringifying every attribute before
    /// indexing; `Null` renders as the empty string.
    pub fn as_text(&self) -> String {
        match self {
            Self::Text(s) | Self::Keyword(s) => s.clone(),
            Self::Integer(n) => n.to_string(),
            Self::Float(f) => f.to_string(),
            Self::Bool(b) => b.to_string(),
            Self::Date(d) => d.to_rfc3339(),
            Self::Bytes(_) => String::new(),
            Self::Null => String::new(),
        }
    }

    /// Returns `true` when the value carries no content.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

impl From<bool> for FieldValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

/// A flattened document keyed by primary key, ready for a backend.
///
/// `fields` maps searchable paths (direct attributes or dotted
/// `relation.attribute` paths) to values. A document may be *partial*: a
/// cascade directive produces documents carrying only the fields it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexDocument {
    /// Primary key of the record this document represents.
    pub key: String,

    /// Searchable path → value.
    pub fields: BTreeMap<String, FieldValue>,
}

impl IndexDocument {
    /// Create an empty document for the given key.
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Set a field value, builder style.
    pub fn with_field(mut self, path: impl Into<String>, value: impl Into<FieldValue>) -> Self {
        self.fields.insert(path.into(), value.into());
        self
    }

    /// Look up a field value by path.
    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.fields.get(path)
    }

    /// Overlay `other`'s fields on top of this document, keeping `self` for
    /// paths `other` does not mention. Used to apply partial updates.
    pub fn merged_with(mut self, other: &IndexDocument) -> Self {
        for (path, value) in &other.fields {
            self.fields.insert(path.clone(), value.clone());
        }
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

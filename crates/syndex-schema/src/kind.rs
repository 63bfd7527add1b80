//! Field kinds and storage column types.
//!
//! [`ColumnType`] is what the primary store declares for an attribute;
//! [`FieldKind`] is the backend-neutral index kind the deriver maps it to.

use serde::{Deserialize, Serialize};

/// Backend-neutral index field kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Unique primary-key field; exact match, stored.
    PrimaryKey,
    /// Analyzed full text.
    Text,
    /// Exact-match keyword.
    Keyword,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Bool,
    /// Date or datetime; sortable.
    Date,
    /// Opaque binary payload; stored only.
    Bytes,
}

impl FieldKind {
    /// Map a kind name from an explicit schema override to a kind.
    ///
    /// Fixed table: `date`/`datetime`, `integer`, `float`, `boolean`,
    /// `binary`, `keyword`; anything else falls back to analyzed text.
    pub fn from_name(name: &str) -> Self {
        match name {
            "date" | "datetime" => Self::Date,
            "integer" => Self::Integer,
            "float" => Self::Float,
            "boolean" => Self::Bool,
            "binary" => Self::Bytes,
            "keyword" => Self::Keyword,
            _ => Self::Text,
        }
    }
}

/// Column type declared by the primary store for an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnType {
    /// Variable-length string.
    String,
    /// Unbounded text.
    Text,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Boolean flag.
    Boolean,
    /// Calendar date.
    Date,
    /// Date with time of day.
    DateTime,
    /// Binary blob.
    Binary,
}

impl ColumnType {
    /// Fixed column-type → field-kind table.
    ///
    /// Date and datetime become the sortable date kind; strings and text
    /// (and anything a store maps onto them) become analyzed text.
    pub fn field_kind(self) -> FieldKind {
        match self {
            Self::Date | Self::DateTime => FieldKind::Date,
            Self::Integer => FieldKind::Integer,
            Self::Float => FieldKind::Float,
            Self::Boolean => FieldKind::Bool,
            Self::Binary => FieldKind::Bytes,
            Self::String | Self::Text => FieldKind::Text,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

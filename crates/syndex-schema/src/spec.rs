//! Concrete field specs and explicit overrides.

use serde::{Deserialize, Serialize};

use crate::kind::FieldKind;

/// A concrete, backend-neutral field specification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Index kind.
    pub kind: FieldKind,

    /// Analyzer/tokenizer override for this field (text kinds only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analyzer: Option<String>,

    /// Whether the field supports sorting (dates are sortable by default).
    #[serde(default)]
    pub sortable: bool,
}

impl FieldSpec {
    /// Plain spec for a kind, with kind-appropriate defaults.
    pub fn of(kind: FieldKind) -> Self {
        Self {
            kind,
            analyzer: None,
            sortable: matches!(kind, FieldKind::Date),
        }
    }

    /// Attach an analyzer override.
    pub fn with_analyzer(mut self, name: impl Into<String>) -> Self {
        self.analyzer = Some(name.into());
        self
    }

    /// Mark the field sortable.
    pub fn sortable(mut self) -> Self {
        self.sortable = true;
        self
    }
}

/// An explicit per-path schema override.
///
/// A named override goes through the fixed kind-name table; a spec override
/// is used verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaOverride {
    /// Kind name, mapped through [`FieldKind::from_name`].
    Named(String),
    /// Concrete field spec, used as-is.
    Spec(FieldSpec),
}

// ============================================================================
// Tests
// ============================================================================

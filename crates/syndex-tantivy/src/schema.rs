//! Tantivy schema mapping for derived entity schemas.
//!
//! [`IndexSchema`] turns a backend-neutral [`EntitySchema`] into a tantivy
//! [`Schema`] plus typed field handles, and converts documents in both
//! directions (index document → tantivy document, stored tantivy document →
//! index document).
//!
//! # Field mapping
//!
//! | Kind | Tantivy options |
//! |------|-----------------|
//! | primary key, keyword | `STRING \| STORED` (raw tokenizer) |
//! | text | tokenized with positions, stored |
//! | integer | `INDEXED \| STORED` i64 |
//! | float | `INDEXED \| STORED` f64 |
//! | bool | `INDEXED \| STORED` |
//! | date | `INDEXED \| STORED \| FAST` (sortable) |
//! | bytes | `STORED` |
//!
//! # Tokenizer
//!
//! Text fields default to the `en_stem` chain (SimpleTokenizer → LowerCaser
//! → English stemmer) unless the field spec or the entity carries an
//! analyzer override naming another registered tokenizer.

use std::collections::BTreeMap;

use chrono::{DateTime, TimeZone, Utc};
use syndex_core::error::{Error, Result};
use syndex_core::value::{FieldValue, IndexDocument};
use syndex_schema::derive::EntitySchema;
use syndex_schema::kind::FieldKind;
use tantivy::Index;
use tantivy::TantivyDocument;
use tantivy::schema::{
    FAST, Field, INDEXED, IndexRecordOption, STORED, STRING, Schema, SchemaBuilder,
    TextFieldIndexing, TextOptions, Value,
};
use tantivy::tokenizer::{Language, LowerCaser, SimpleTokenizer, Stemmer, TextAnalyzer};

/// Default tokenizer name for text fields.
pub const DEFAULT_TOKENIZER: &str = "en_stem";

/// Externally supplied tokenizers, registered onto every opened index.
///
/// The default set is empty; `en_stem` is always registered by the backend.
#[derive(Default, Clone)]
pub struct AnalyzerSet {
    entries: Vec<(String, TextAnalyzer)>,
}

impl AnalyzerSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a named tokenizer; entity or field analyzer overrides may
    /// then refer to it by name.
    pub fn register(&mut self, name: impl Into<String>, analyzer: TextAnalyzer) -> &mut Self {
        self.entries.push((name.into(), analyzer));
        self
    }

    /// Apply the set (plus the stock `en_stem` chain) to an index.
    pub fn install(&self, index: &Index) {
        let en_stem = TextAnalyzer::builder(SimpleTokenizer::default())
            .filter(LowerCaser)
            .filter(Stemmer::new(Language::English))
            .build();
        index.tokenizers().register(DEFAULT_TOKENIZER, en_stem);

        for (name, analyzer) in &self.entries {
            index.tokenizers().register(name, analyzer.clone());
        }
    }
}

impl std::fmt::Debug for AnalyzerSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnalyzerSet")
            .field("names", &self.entries.iter().map(|(n, _)| n).collect::<Vec<_>>())
            .finish()
    }
}

/// A tantivy schema plus typed access to its fields.
#[derive(Clone)]
pub struct IndexSchema {
    schema: Schema,
    entity: EntitySchema,
    /// Path → tantivy field handle, primary key included.
    fields: BTreeMap<String, Field>,
    /// Handle of the primary-key field.
    key_field: Field,
}

impl IndexSchema {
    /// Build the tantivy schema for a derived entity schema.
    ///
    /// `entity_analyzer` is the per-entity analyzer override; individual
    /// field specs take precedence over it.
    pub fn build(entity: &EntitySchema, entity_analyzer: Option<&str>) -> Self {
        let mut builder = SchemaBuilder::new();
        let mut fields = BTreeMap::new();

        let key_field = builder.add_text_field(&entity.primary_key.path, STRING | STORED);
        fields.insert(entity.primary_key.path.clone(), key_field);

        for descriptor in &entity.fields {
            let name = descriptor.path.as_str();
            let field = match descriptor.spec.kind {
                FieldKind::PrimaryKey | FieldKind::Keyword => {
                    builder.add_text_field(name, STRING | STORED)
                }
                FieldKind::Text => {
                    let tokenizer = descriptor
                        .spec
                        .analyzer
                        .as_deref()
                        .or(entity_analyzer)
                        .unwrap_or(DEFAULT_TOKENIZER);
                    let options = TextOptions::default()
                        .set_indexing_options(
                            TextFieldIndexing::default()
                                .set_tokenizer(tokenizer)
                                .set_index_option(IndexRecordOption::WithFreqsAndPositions),
                        )
                        .set_stored();
                    builder.add_text_field(name, options)
                }
                FieldKind::Integer => builder.add_i64_field(name, INDEXED | STORED),
                FieldKind::Float => builder.add_f64_field(name, INDEXED | STORED),
                FieldKind::Bool => builder.add_bool_field(name, INDEXED | STORED),
                FieldKind::Date => builder.add_date_field(name, INDEXED | STORED | FAST),
                FieldKind::Bytes => builder.add_bytes_field(name, STORED),
            };
            fields.insert(descriptor.path.clone(), field);
        }

        Self {
            schema: builder.build(),
            entity: entity.clone(),
            fields,
            key_field,
        }
    }

    /// The underlying tantivy schema.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The primary-key field handle.
    pub fn key_field(&self) -> Field {
        self.key_field
    }

    /// Field handle for a searchable path.
    pub fn field(&self, path: &str) -> Option<Field> {
        self.fields.get(path).copied()
    }

    /// Handles for the paths a query should run against, restricted to the
    /// kinds the query parser can take free text for.
    pub fn query_fields(&self, paths: &[String]) -> Result<Vec<Field>> {
        let mut selected = Vec::with_capacity(paths.len());
        for path in paths {
            let descriptor = self.entity.descriptor(path).ok_or_else(|| {
                Error::config(format!("'{path}' is not a searchable field of this index"))
            })?;
            if matches!(
                descriptor.spec.kind,
                FieldKind::Text | FieldKind::Keyword | FieldKind::PrimaryKey
            ) {
                // numeric/date/bytes fields still match via field:value syntax
                selected.push(self.fields[path]);
            }
        }
        if selected.is_empty() {
            return Err(Error::query(
                "none of the requested fields accepts free-text queries",
            ));
        }
        Ok(selected)
    }

    /// Convert an index document into a tantivy document.
    ///
    /// Fields absent from `doc` (partial documents) are simply not added;
    /// null values are skipped.
    pub fn to_tantivy(&self, doc: &IndexDocument) -> TantivyDocument {
        let mut out = TantivyDocument::new();
        out.add_text(self.key_field, &doc.key);

        for descriptor in &self.entity.fields {
            let Some(value) = doc.get(&descriptor.path) else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let field = self.fields[&descriptor.path];
            match descriptor.spec.kind {
                FieldKind::PrimaryKey | FieldKind::Keyword | FieldKind::Text => {
                    out.add_text(field, value.as_text());
                }
                FieldKind::Integer => match value {
                    FieldValue::Integer(n) => out.add_i64(field, *n),
                    other => add_parsed_i64(&mut out, field, other, &descriptor.path),
                },
                FieldKind::Float => match value {
                    FieldValue::Float(f) => out.add_f64(field, *f),
                    FieldValue::Integer(n) => out.add_f64(field, *n as f64),
                    other => {
                        log::debug!("skipping non-float value for '{}': {other:?}", descriptor.path);
                    }
                },
                FieldKind::Bool => match value {
                    FieldValue::Bool(b) => out.add_bool(field, *b),
                    other => {
                        log::debug!("skipping non-bool value for '{}': {other:?}", descriptor.path);
                    }
                },
                FieldKind::Date => match value {
                    FieldValue::Date(dt) => out.add_date(
                        field,
                        tantivy::DateTime::from_timestamp_secs(dt.timestamp()),
                    ),
                    other => {
                        log::debug!("skipping non-date value for '{}': {other:?}", descriptor.path);
                    }
                },
                FieldKind::Bytes => match value {
                    FieldValue::Bytes(b) => out.add_bytes(field, b.as_slice()),
                    other => {
                        log::debug!("skipping non-bytes value for '{}': {other:?}", descriptor.path);
                    }
                },
            }
        }
        out
    }

    /// Rebuild an index document from a stored tantivy document.
    pub fn from_stored(&self, doc: &TantivyDocument) -> Result<IndexDocument> {
        let key = doc
            .get_first(self.key_field)
            .and_then(|v| v.as_str())
            .ok_or_else(|| Error::backend("stored document is missing its primary key"))?
            .to_string();

        let mut out = IndexDocument::new(key);
        for descriptor in &self.entity.fields {
            let field = self.fields[&descriptor.path];
            let Some(value) = doc.get_first(field) else {
                continue;
            };
            let restored = match descriptor.spec.kind {
                FieldKind::PrimaryKey | FieldKind::Keyword => {
                    value.as_str().map(|s| FieldValue::Keyword(s.to_string()))
                }
                FieldKind::Text => value.as_str().map(|s| FieldValue::Text(s.to_string())),
                FieldKind::Integer => value.as_i64().map(FieldValue::Integer),
                FieldKind::Float => value.as_f64().map(FieldValue::Float),
                FieldKind::Bool => value.as_bool().map(FieldValue::Bool),
                FieldKind::Date => value
                    .as_datetime()
                    .and_then(|d| utc_from_timestamp(d.into_timestamp_secs()))
                    .map(FieldValue::Date),
                FieldKind::Bytes => value.as_bytes().map(|b| FieldValue::Bytes(b.to_vec())),
            };
            if let Some(restored) = restored {
                out.fields.insert(descriptor.path.clone(), restored);
            }
        }
        Ok(out)
    }
}

fn add_parsed_i64(doc: &mut TantivyDocument, field: Field, value: &FieldValue, path: &str) {
    match value.as_text().parse::<i64>() {
        Ok(n) => doc.add_i64(field, n),
        Err(_) => log::debug!("skipping non-integer value for '{path}': {value:?}"),
    }
}

fn utc_from_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    Utc.timestamp_opt(secs, 0).single()
}

impl std::fmt::Debug for IndexSchema {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IndexSchema")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .finish()
    }
}

// ============================================================================
// Tests
// ============================================================================

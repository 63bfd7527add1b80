//! Analyzer capability for the substring backend.
//!
//! Tokenization is pluggable and supplied externally; the core only needs a
//! way to split a query string into keywords. The inverted-index backend has
//! its own tokenizer pipeline and does not use this trait.

use std::sync::Arc;

/// Splits query text into keywords.
pub trait Analyzer: Send + Sync {
    /// Tokenize `text` into keywords. Empty tokens are dropped by callers.
    fn keywords(&self, text: &str) -> Vec<String>;
}

/// Default analyzer: whitespace-delimited keywords, unchanged case.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhitespaceAnalyzer;

impl Analyzer for WhitespaceAnalyzer {
    fn keywords(&self, text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }
}

/// Shared analyzer handle.
pub type AnalyzerRef = Arc<dyn Analyzer>;

/// Build the default analyzer handle.
pub fn default_analyzer() -> AnalyzerRef {
    Arc::new(WhitespaceAnalyzer)
}

// ============================================================================
// Tests
// ============================================================================

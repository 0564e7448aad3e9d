//! Embedding and label providers
//!
//! The index never computes meaning itself: it asks an [`EmbeddingProvider`]
//! for vectors and a [`LabelProvider`] for concept labels. Both are object
//! safe and `Send + Sync` so they can be shared behind an `Arc`.
//!
//! Two local implementations ship with the crate:
//! - [`HashingEmbedder`] - deterministic feature hashing of words and
//!   character trigrams, for tests and offline use
//! - [`LabelChain`] - concept detector first, then an optional backend,
//!   then a small built-in pattern labeler

use crate::concepts::{detect_cell_concepts, detect_range_concepts};
use crate::config::IndexConfig;
use crate::document::{Cell, LabelMethod, LabelSet, Range};
use crate::error::{Error, Result};
use ahash::RandomState;
use std::sync::Arc;

/// What an embedding is requested for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EmbeddingKind {
    /// Text of an indexed document
    Document,
    /// Text of a search query
    Query,
}

/// Turns text into fixed-length vectors
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name used in error messages
    fn name(&self) -> &str;

    /// Length of every vector this provider returns
    fn dimensions(&self) -> usize;

    /// Embed one text
    fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>>;

    /// Embed several texts, in order
    fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> Result<Vec<Vec<f32>>> {
        texts.iter().map(|text| self.embed(text, kind)).collect()
    }
}

/// Produces concept labels for documents
pub trait LabelProvider: Send + Sync {
    /// Provider name used in logs and error messages
    fn name(&self) -> &str;

    fn label_cell(&self, cell: &Cell) -> Result<LabelSet>;

    fn label_range(&self, range: &Range) -> Result<LabelSet>;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn embed(&self, text: &str, kind: EmbeddingKind) -> Result<Vec<f32>> {
        (**self).embed(text, kind)
    }

    fn embed_batch(&self, texts: &[String], kind: EmbeddingKind) -> Result<Vec<Vec<f32>>> {
        (**self).embed_batch(texts, kind)
    }
}

// ============================================================================
// Hashing embedder
// ============================================================================

/// Weight of a whole-word feature
const WORD_WEIGHT: f32 = 1.0;

/// Weight of a character-trigram feature
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Deterministic feature-hashing embedder
///
/// Lowercased word tokens and the character trigrams of each padded word
/// (`#word#`) are hashed into `dimensions` signed buckets; the result is
/// L2-normalized. Texts without any token embed to the zero vector.
#[derive(Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
    hasher: RandomState,
}

impl HashingEmbedder {
    /// Default vector length
    pub const DEFAULT_DIMENSIONS: usize = 256;

    /// Create an embedder producing vectors of length `dimensions`
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(Error::validation("embedding dimensions must be at least 1"));
        }
        Ok(Self::with_dimensions(dimensions))
    }

    fn with_dimensions(dimensions: usize) -> Self {
        Self {
            dimensions,
            hasher: RandomState::with_seeds(
                0x6365_6c6c_7363_6f70,
                0x655f_6861_7368_696e,
                0x675f_656d_6265_6464,
                0x6572_5f73_6565_6473,
            ),
        }
    }

    fn add_feature(&self, vector: &mut [f32], feature: &str, weight: f32) {
        let hash = self.hasher.hash_one(feature);
        let bucket = (hash % self.dimensions as u64) as usize;
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        vector[bucket] += sign * weight;
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self::with_dimensions(Self::DEFAULT_DIMENSIONS)
    }
}

impl std::fmt::Debug for HashingEmbedder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HashingEmbedder")
            .field("dimensions", &self.dimensions)
            .finish()
    }
}

impl EmbeddingProvider for HashingEmbedder {
    fn name(&self) -> &str {
        "hashing"
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn embed(&self, text: &str, _kind: EmbeddingKind) -> Result<Vec<f32>> {
        let mut vector = vec![0.0f32; self.dimensions];
        let lower = text.to_lowercase();

        for word in lower
            .split(|c: char| !c.is_alphanumeric() && c != '%')
            .filter(|w| !w.is_empty())
        {
            self.add_feature(&mut vector, word, WORD_WEIGHT);

            let padded: Vec<char> = std::iter::once('#')
                .chain(word.chars())
                .chain(std::iter::once('#'))
                .collect();
            for window in padded.windows(3) {
                let trigram: String = window.iter().collect();
                self.add_feature(&mut vector, &trigram, TRIGRAM_WEIGHT);
            }
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        Ok(vector)
    }
}

// ============================================================================
// Label chain
// ============================================================================

/// Built-in patterns of the last-resort labeler
const BASIC_PATTERNS: &[(&[&str], &str)] = &[
    (&["total", "sum"], "total"),
    (&["revenue", "sales"], "revenue"),
    (&["cost", "expense"], "cost"),
    (&["%"], "percentage"),
    (&["date", "month", "year"], "date"),
];

/// Label provider with a fixed precedence
///
/// 1. Concept detector: any detected concept is used as a label
/// 2. Backend (optional): consulted only when no concept was detected;
///    errors and empty answers fall through
/// 3. Basic patterns: never fails, never empty
pub struct LabelChain {
    backend: Option<Arc<dyn LabelProvider>>,
    heuristic_confidence: f64,
    fallback_confidence: f64,
}

impl LabelChain {
    /// Chain with the default confidences and no backend
    pub fn new() -> Self {
        Self::from_config(&IndexConfig::default())
    }

    /// Chain with the confidences of `config` and no backend
    pub fn from_config(config: &IndexConfig) -> Self {
        Self {
            backend: None,
            heuristic_confidence: config.heuristic_label_confidence,
            fallback_confidence: config.fallback_label_confidence,
        }
    }

    /// Consult `backend` when the concept detector finds nothing
    pub fn with_backend(mut self, backend: Arc<dyn LabelProvider>) -> Self {
        self.backend = Some(backend);
        self
    }

    fn heuristic(&self, concepts: Vec<String>) -> LabelSet {
        LabelSet::uniform(
            concepts,
            self.heuristic_confidence,
            LabelMethod::Heuristic,
            "Detected from value, headers and nearby cells",
        )
    }

    fn ask_backend<F>(&self, id: &str, ask: F) -> Option<LabelSet>
    where
        F: FnOnce(&dyn LabelProvider) -> Result<LabelSet>,
    {
        let backend = self.backend.as_deref()?;
        match ask(backend) {
            Ok(set) if !set.is_empty() => Some(set),
            Ok(_) => {
                tracing::debug!("Label backend {} returned no labels for {id}", backend.name());
                None
            }
            Err(e) => {
                tracing::warn!("Label backend {} failed for {id}: {e}", backend.name());
                None
            }
        }
    }

    fn basic(&self, text: &str, numeric: bool) -> LabelSet {
        let text = text.to_lowercase();
        let mut labels: Vec<String> = BASIC_PATTERNS
            .iter()
            .filter(|(patterns, _)| patterns.iter().any(|p| text.contains(p)))
            .map(|(_, label)| label.to_string())
            .collect();
        if numeric {
            labels.push("numeric".to_string());
        }
        if labels.is_empty() {
            labels.push("data".to_string());
        }
        LabelSet::uniform(
            labels,
            self.fallback_confidence,
            LabelMethod::Fallback,
            "Basic pattern match",
        )
    }
}

impl Default for LabelChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for LabelChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabelChain")
            .field("backend", &self.backend.as_ref().map(|b| b.name().to_string()))
            .field("heuristic_confidence", &self.heuristic_confidence)
            .field("fallback_confidence", &self.fallback_confidence)
            .finish()
    }
}

impl LabelProvider for LabelChain {
    fn name(&self) -> &str {
        "chain"
    }

    fn label_cell(&self, cell: &Cell) -> Result<LabelSet> {
        let concepts = detect_cell_concepts(cell);
        if !concepts.is_empty() {
            return Ok(self.heuristic(concepts));
        }
        if let Some(set) = self.ask_backend(&cell.id, |b| b.label_cell(cell)) {
            return Ok(set);
        }

        let mut text = cell.display_value().to_string();
        if let Some(header) = &cell.headers.column {
            text.push(' ');
            text.push_str(header);
        }
        let numeric = is_numeric(cell.display_value());
        Ok(self.basic(&text, numeric))
    }

    fn label_range(&self, range: &Range) -> Result<LabelSet> {
        let concepts = detect_range_concepts(range);
        if !concepts.is_empty() {
            return Ok(self.heuristic(concepts));
        }
        if let Some(set) = self.ask_backend(&range.id, |b| b.label_range(range)) {
            return Ok(set);
        }

        let text = format!("{} {}", range.header, range.sample_values.join(" "));
        let numeric =
            !range.sample_values.is_empty() && range.sample_values.iter().all(|v| is_numeric(v));
        Ok(self.basic(&text, numeric))
    }
}

fn is_numeric(value: &str) -> bool {
    let cleaned: String = value
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    cleaned.parse::<f64>().map_or(false, f64::is_finite)
}

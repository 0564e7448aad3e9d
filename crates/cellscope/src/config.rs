//! Index and search configuration
//!
//! All tuning is passed in explicitly when a [`SheetIndex`](crate::SheetIndex)
//! is built; nothing is read from the environment.

use crate::error::{Error, Result};

/// Weights of the four semantic ranking signals
///
/// The weights are not required to sum to 1.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct RankingWeights {
    /// Cosine similarity between query and document embeddings (default: 0.7)
    pub semantic: f64,
    /// Overlap between document labels and query concepts (default: 0.15)
    pub concept: f64,
    /// Normalized formula complexity (default: 0.1)
    pub formula: f64,
    /// Sheet-name importance (default: 0.05)
    pub sheet: f64,
}

impl Default for RankingWeights {
    fn default() -> Self {
        Self {
            semantic: 0.7,
            concept: 0.15,
            formula: 0.1,
            sheet: 0.05,
        }
    }
}

/// Options fixed for the lifetime of an index
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexConfig {
    /// Semantic ranking weights
    pub weights: RankingWeights,
    /// Raw formula complexity that maps to a normalized score of 1.0 (default: 10.0)
    pub complexity_ceiling: f64,
    /// Confidence attached to concept-detector labels (default: 0.8)
    pub heuristic_label_confidence: f64,
    /// Confidence attached to basic fallback labels (default: 0.5)
    pub fallback_label_confidence: f64,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            weights: RankingWeights::default(),
            complexity_ceiling: 10.0,
            heuristic_label_confidence: 0.8,
            fallback_label_confidence: 0.5,
        }
    }
}

/// Per-query options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SearchOptions {
    /// Maximum number of results (default: 10)
    pub top_k: usize,
    /// Whether range documents take part in ranking (default: true)
    pub include_ranges: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            top_k: 10,
            include_ranges: true,
        }
    }
}

impl SearchOptions {
    /// Options returning at most `top_k` results
    pub fn top_k(top_k: usize) -> Self {
        Self {
            top_k,
            ..Self::default()
        }
    }

    /// Exclude range documents
    pub fn cells_only(mut self) -> Self {
        self.include_ranges = false;
        self
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.top_k == 0 {
            return Err(Error::validation("top_k must be at least 1"));
        }
        Ok(())
    }
}

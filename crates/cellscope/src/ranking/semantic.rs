//! Semantic ranking
//!
//! Every candidate gets four signals, each in `[0, 1]` for well-formed
//! inputs, which are combined linearly with [`RankingWeights`]:
//!
//! | Signal | Source |
//! |--------|--------|
//! | similarity | cosine of query and document embeddings |
//! | concept match | overlap of document labels and query concepts |
//! | formula complexity | normalized complexity of the cell's formula |
//! | sheet importance | heuristic on the sheet name |

use crate::config::{IndexConfig, RankingWeights};
use crate::document::{Document, IndexedDocument};
use crate::error::{Error, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Sheet-name fragments and the importance they carry, checked in order
const SHEET_IMPORTANCE: &[(&[&str], f64)] = &[
    (
        &[
            "financial",
            "budget",
            "p&l",
            "pnl",
            "profit",
            "income",
            "balance",
            "cash flow",
            "forecast",
        ],
        1.0,
    ),
    (&["dashboard", "summary", "overview", "report"], 0.7),
    (&["raw", "temp", "tmp", "scratch"], 0.3),
];

/// Importance of a sheet whose name matches nothing
pub const DEFAULT_SHEET_IMPORTANCE: f64 = 0.5;

/// The four ranking signals of one document and their weighted sum
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SemanticScores {
    pub similarity: f64,
    pub concept_match: f64,
    pub formula_complexity: f64,
    pub sheet_importance: f64,
    pub final_score: f64,
}

impl SemanticScores {
    /// Combine the four signals with `weights`
    pub fn new(
        similarity: f64,
        concept_match: f64,
        formula_complexity: f64,
        sheet_importance: f64,
        weights: &RankingWeights,
    ) -> Self {
        Self {
            similarity,
            concept_match,
            formula_complexity,
            sheet_importance,
            final_score: final_score(
                similarity,
                concept_match,
                formula_complexity,
                sheet_importance,
                weights,
            ),
        }
    }
}

/// A ranked document with its scores
#[derive(Debug, Clone, Copy)]
pub struct SemanticMatch<'a> {
    pub document: &'a IndexedDocument,
    pub scores: SemanticScores,
}

/// Cosine similarity of two vectors
///
/// Fails with [`Error::DimensionMismatch`] when the lengths differ. A zero
/// vector on either side has similarity 0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> Result<f64> {
    if a.len() != b.len() {
        return Err(Error::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b) {
        let x = f64::from(x);
        let y = f64::from(y);
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return Ok(0.0);
    }
    Ok(dot / (norm_a.sqrt() * norm_b.sqrt()))
}

/// `|labels ∩ concepts| / max(|labels|, |concepts|)`, 0 if either is empty
pub fn concept_match(labels: &[String], query_concepts: &[String]) -> f64 {
    if labels.is_empty() || query_concepts.is_empty() {
        return 0.0;
    }
    let shared = labels
        .iter()
        .filter(|label| query_concepts.contains(label))
        .count();
    shared as f64 / labels.len().max(query_concepts.len()) as f64
}

/// Importance of a sheet by name
pub fn sheet_importance(sheet_name: &str) -> f64 {
    let name = sheet_name.to_lowercase();
    SHEET_IMPORTANCE
        .iter()
        .find(|(fragments, _)| fragments.iter().any(|f| name.contains(f)))
        .map_or(DEFAULT_SHEET_IMPORTANCE, |(_, importance)| *importance)
}

/// Weighted sum of the four signals
pub fn final_score(
    similarity: f64,
    concept_match: f64,
    formula_complexity: f64,
    sheet_importance: f64,
    weights: &RankingWeights,
) -> f64 {
    weights.semantic * similarity
        + weights.concept * concept_match
        + weights.formula * formula_complexity
        + weights.sheet * sheet_importance
}

/// Normalized formula complexity of a document (0 without a formula)
pub fn formula_complexity(document: &Document, ceiling: f64) -> f64 {
    document
        .parsed_formula()
        .map_or(0.0, |analysis| analysis.normalized_complexity(ceiling))
}

/// Score one document
pub fn score(
    document: &IndexedDocument,
    query_embedding: &[f32],
    query_concepts: &[String],
    config: &IndexConfig,
) -> Result<SemanticScores> {
    let similarity = cosine_similarity(query_embedding, &document.embedding)?;
    let scores = SemanticScores::new(
        similarity,
        concept_match(&document.labels.labels, query_concepts),
        formula_complexity(&document.document, config.complexity_ceiling),
        sheet_importance(document.document.sheet_name()),
        &config.weights,
    );
    tracing::trace!("Scored {}: {:?}", document.id(), scores);
    Ok(scores)
}

/// Score, sort and truncate candidates
///
/// Sorting is stable: equal scores keep candidate order. Any scoring error
/// aborts the whole ranking.
pub fn rank<'a>(
    candidates: &[&'a IndexedDocument],
    query_embedding: &[f32],
    query_concepts: &[String],
    config: &IndexConfig,
    top_k: usize,
) -> Result<Vec<SemanticMatch<'a>>> {
    let score_one = |document: &&'a IndexedDocument| -> Result<SemanticMatch<'a>> {
        Ok(SemanticMatch {
            document: *document,
            scores: score(document, query_embedding, query_concepts, config)?,
        })
    };

    #[cfg(feature = "parallel")]
    let scored: Result<Vec<SemanticMatch<'a>>> = candidates.par_iter().map(score_one).collect();
    #[cfg(not(feature = "parallel"))]
    let scored: Result<Vec<SemanticMatch<'a>>> = candidates.iter().map(score_one).collect();

    let mut matches = scored?;
    matches.sort_by(|a, b| b.scores.final_score.total_cmp(&a.scores.final_score));
    matches.truncate(top_k);
    Ok(matches)
}

//! Keyword ranking
//!
//! Substring matching of lowercase query terms against the weighted text
//! fields of a document. Relevance is the raw score divided by
//! [`RELEVANCE_SCALE`] and is not bounded to `[0, 1]`.

use crate::document::{Document, FormulaPattern, IndexedDocument};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub const COLUMN_HEADER_WEIGHT: f64 = 2.0;
pub const ROW_HEADER_WEIGHT: f64 = 1.5;
pub const VALUE_WEIGHT: f64 = 1.0;
pub const FORMULA_WEIGHT: f64 = 1.5;
pub const LABEL_WEIGHT: f64 = 1.5;

/// Divisor turning a raw keyword score into reported relevance
pub const RELEVANCE_SCALE: f64 = 10.0;

/// A keyword-ranked document
#[derive(Debug, Clone)]
pub struct KeywordMatch<'a> {
    pub document: &'a IndexedDocument,
    pub score: f64,
    /// One description per (field, term) hit, in scoring order
    pub matches: Vec<String>,
}

impl KeywordMatch<'_> {
    /// Reported relevance, `score / 10`
    pub fn relevance(&self) -> f64 {
        self.score / RELEVANCE_SCALE
    }
}

/// Lowercase, whitespace-split query terms
///
/// Repeated terms are kept and score once per occurrence.
pub fn query_terms(query: &str) -> Vec<String> {
    query
        .to_lowercase()
        .split_whitespace()
        .map(str::to_string)
        .collect()
}

/// Searchable fields of a document with their weights
fn fields(indexed: &IndexedDocument) -> Vec<(&'static str, String, f64)> {
    let document = &indexed.document;
    let mut fields = Vec::new();

    if let Some(header) = document.column_header() {
        fields.push(("column header", header.to_string(), COLUMN_HEADER_WEIGHT));
    }
    if let Some(header) = document.row_header() {
        fields.push(("row header", header.to_string(), ROW_HEADER_WEIGHT));
    }
    fields.push(("value", document.display_value(), VALUE_WEIGHT));
    match document {
        Document::Cell(cell) => {
            if let Some(formula) = &cell.formula {
                fields.push(("formula", formula.clone(), FORMULA_WEIGHT));
            }
        }
        Document::Range(range) => {
            if range.formula_pattern != FormulaPattern::Values {
                fields.push(("formula", range.formula_pattern.to_string(), FORMULA_WEIGHT));
            }
        }
    }
    for label in &indexed.labels.labels {
        fields.push(("label", label.clone(), LABEL_WEIGHT));
    }
    fields
}

/// Score one document against lowercase terms
pub fn score_document(indexed: &IndexedDocument, terms: &[String]) -> (f64, Vec<String>) {
    let mut score = 0.0;
    let mut matches = Vec::new();

    for (field, text, weight) in fields(indexed) {
        let haystack = text.to_lowercase();
        for term in terms {
            if haystack.contains(term.as_str()) {
                score += weight;
                matches.push(format!("{} \"{}\" matches \"{}\"", field, text, term));
            }
        }
    }
    (score, matches)
}

/// Score, filter, sort and truncate candidates
///
/// Documents scoring 0 are dropped. Sorting is stable: equal scores keep
/// candidate order.
pub fn rank<'a>(
    candidates: &[&'a IndexedDocument],
    terms: &[String],
    top_k: usize,
) -> Vec<KeywordMatch<'a>> {
    let score_one = |document: &&'a IndexedDocument| {
        let (score, matches) = score_document(document, terms);
        KeywordMatch {
            document: *document,
            score,
            matches,
        }
    };

    #[cfg(feature = "parallel")]
    let scored: Vec<KeywordMatch<'a>> = candidates.par_iter().map(score_one).collect();
    #[cfg(not(feature = "parallel"))]
    let scored: Vec<KeywordMatch<'a>> = candidates.iter().map(score_one).collect();

    let mut matches: Vec<KeywordMatch<'a>> =
        scored.into_iter().filter(|m| m.score > 0.0).collect();
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
    matches.truncate(top_k);
    matches
}

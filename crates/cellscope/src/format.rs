//! Result formatting
//!
//! Converts ranked matches into [`SearchResult`]s with a location, a primary
//! concept and human-readable reasons.

use crate::document::{Document, DocumentKind, IndexedDocument};
use crate::ranking::{KeywordMatch, SemanticMatch, SemanticScores};
use std::fmt;

/// Similarity above which a result is a "high" semantic match
pub const HIGH_SIMILARITY: f64 = 0.8;

/// Similarity above which a result is a "good" semantic match
pub const GOOD_SIMILARITY: f64 = 0.6;

/// Concept match above which concepts are reported as a reason
pub const CONCEPT_MATCH_REASON: f64 = 0.5;

/// Where a result lives
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Location {
    pub sheet: String,
    /// `"row:col"` for cells, `"startRow-endRow"` for ranges
    pub range: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}!{}", self.sheet, self.range)
    }
}

/// One explained search hit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct SearchResult {
    pub id: String,
    pub kind: DocumentKind,
    pub location: Location,
    pub primary_concept: String,
    pub value: String,
    pub formula: Option<String>,
    pub labels: Vec<String>,
    /// Final score (semantic) or raw score / 10 (keyword)
    pub relevance: f64,
    pub reasons: Vec<String>,
    /// Signal breakdown, semantic results only
    pub scores: Option<SemanticScores>,
}

/// Location of a document
pub fn location(document: &Document) -> Location {
    let range = match document {
        Document::Cell(cell) => format!("{}:{}", cell.row, cell.col),
        Document::Range(range) => format!("{}-{}", range.start_row, range.end_row),
    };
    Location {
        sheet: document.sheet_name().to_string(),
        range,
    }
}

/// First label, else column header, else "Formula", else "Data"
pub fn primary_concept(indexed: &IndexedDocument) -> String {
    if let Some(label) = indexed.labels.labels.first() {
        return label.clone();
    }
    if let Some(header) = indexed.document.column_header() {
        return header.to_string();
    }
    if indexed.document.formula().is_some() {
        return "Formula".to_string();
    }
    "Data".to_string()
}

fn base_result(indexed: &IndexedDocument, relevance: f64, reasons: Vec<String>) -> SearchResult {
    let document = &indexed.document;
    SearchResult {
        id: document.id().to_string(),
        kind: document.kind(),
        location: location(document),
        primary_concept: primary_concept(indexed),
        value: document.display_value(),
        formula: document.formula().map(str::to_string),
        labels: indexed.labels.labels.clone(),
        relevance,
        reasons,
        scores: None,
    }
}

/// Reasons a semantic match ranked where it did
pub fn semantic_reasons(
    m: &SemanticMatch<'_>,
    query: &str,
    query_concepts: &[String],
) -> Vec<String> {
    let mut reasons = Vec::new();
    let scores = &m.scores;
    let document = &m.document.document;

    if scores.similarity > HIGH_SIMILARITY {
        reasons.push("High semantic similarity".to_string());
    } else if scores.similarity > GOOD_SIMILARITY {
        reasons.push("Good semantic similarity".to_string());
    }

    if scores.concept_match > CONCEPT_MATCH_REASON {
        let shared: Vec<&str> = m
            .document
            .labels
            .labels
            .iter()
            .filter(|l| query_concepts.contains(l))
            .map(String::as_str)
            .collect();
        reasons.push(format!("Concept match: {}", shared.join(", ")));
    }

    if let Some(formula) = document.formula() {
        let (sums, divides) = match document.parsed_formula().filter(|a| a.is_ok()) {
            Some(analysis) => (analysis.uses_function("SUM"), analysis.uses_operator("/")),
            None => (formula.to_uppercase().contains("SUM"), formula.contains('/')),
        };
        if sums {
            reasons.push("Contains SUM".to_string());
        }
        if divides {
            reasons.push("Contains division".to_string());
        }
    }

    if let Some(header) = document.column_header() {
        let header_lower = header.trim().to_lowercase();
        let query_lower = query.trim().to_lowercase();
        if !header_lower.is_empty()
            && !query_lower.is_empty()
            && (query_lower.contains(&header_lower) || header_lower.contains(&query_lower))
        {
            reasons.push(format!("Header \"{}\" matches query", header));
        }
    }

    reasons
}

/// Format a semantic match
pub fn semantic_result(
    m: &SemanticMatch<'_>,
    query: &str,
    query_concepts: &[String],
) -> SearchResult {
    let reasons = semantic_reasons(m, query, query_concepts);
    SearchResult {
        scores: Some(m.scores),
        ..base_result(m.document, m.scores.final_score, reasons)
    }
}

/// Format a keyword match; its reasons are the recorded match descriptions
pub fn keyword_result(m: &KeywordMatch<'_>) -> SearchResult {
    base_result(m.document, m.relevance(), m.matches.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RankingWeights;
    use crate::document::{Cell, CellHeaders, LabelMethod, LabelSet, Range};
    use cellscope_core::CellAddress;
    use pretty_assertions::assert_eq;

    fn indexed(document: Document, labels: &[&str]) -> IndexedDocument {
        IndexedDocument {
            document,
            embedding: vec![1.0],
            labels: LabelSet::uniform(
                labels.iter().map(|l| l.to_string()).collect(),
                0.8,
                LabelMethod::Heuristic,
                "",
            ),
        }
    }

    fn cell(reference: &str, value: &str, column: Option<&str>) -> Cell {
        Cell::new("book", "P&L", CellAddress::parse(reference).unwrap(), value).with_headers(
            CellHeaders {
                column: column.map(str::to_string),
                ..CellHeaders::default()
            },
        )
    }

    #[test]
    fn test_primary_concept_precedence() {
        let labeled = indexed(cell("B2", "1", Some("Margin")).into(), &["profitability"]);
        assert_eq!(primary_concept(&labeled), "profitability");

        let headed = indexed(cell("B2", "1", Some("Margin")).into(), &[]);
        assert_eq!(primary_concept(&headed), "Margin");

        let formula = indexed(cell("B2", "1", None).with_formula("=A1*2").into(), &[]);
        assert_eq!(primary_concept(&formula), "Formula");

        let bare = indexed(cell("B2", "1", None).into(), &[]);
        assert_eq!(primary_concept(&bare), "Data");
    }

    #[test]
    fn test_location() {
        let c: Document = cell("C7", "1", None).into();
        assert_eq!(location(&c).range, "7:3");
        assert_eq!(location(&c).to_string(), "P&L!7:3");

        let range = Range::from_cells(
            "book",
            "P&L",
            "Q1",
            vec![cell("B2", "1", None), cell("B9", "2", None)],
        )
        .unwrap();
        assert_eq!(location(&range.into()).range, "2-9");
    }

    #[test]
    fn test_semantic_reasons() {
        let doc = indexed(
            cell("D2", "0.25", Some("Gross Margin"))
                .with_formula("=SUM(B2:C2)/B10")
                .into(),
            &["profitability"],
        );
        let m = SemanticMatch {
            document: &doc,
            scores: SemanticScores::new(0.85, 1.0, 0.4, 1.0, &RankingWeights::default()),
        };
        let concepts = vec!["profitability".to_string()];
        let result = semantic_result(&m, "gross margin", &concepts);

        assert_eq!(
            result.reasons,
            vec![
                "High semantic similarity",
                "Concept match: profitability",
                "Contains SUM",
                "Contains division",
                "Header \"Gross Margin\" matches query",
            ]
        );
        assert_eq!(result.relevance, m.scores.final_score);
        assert_eq!(result.primary_concept, "profitability");
        assert_eq!(result.formula.as_deref(), Some("=SUM(B2:C2)/B10"));
        assert!(result.scores.is_some());
    }

    #[test]
    fn test_good_similarity_only() {
        let doc = indexed(cell("B2", "5", Some("Units")).into(), &[]);
        let m = SemanticMatch {
            document: &doc,
            scores: SemanticScores::new(0.7, 0.0, 0.0, 0.5, &RankingWeights::default()),
        };
        assert_eq!(
            semantic_reasons(&m, "revenue", &[]),
            vec!["Good semantic similarity"]
        );
    }

    #[test]
    fn test_keyword_result() {
        let doc = indexed(cell("B2", "100", Some("Revenue")).into(), &[]);
        let m = KeywordMatch {
            document: &doc,
            score: 2.0,
            matches: vec!["column header \"Revenue\" matches \"revenue\"".to_string()],
        };
        let result = keyword_result(&m);
        assert_eq!(result.relevance, 0.2);
        assert_eq!(result.reasons, m.matches);
        assert_eq!(result.kind, DocumentKind::Cell);
        assert!(result.scores.is_none());
    }
}

//! Business-concept detection
//!
//! Cheap substring heuristics that tag cells and ranges with concepts such
//! as `revenue` or `growth`, and map free-text queries onto the same
//! vocabulary so the two can be compared.

use crate::document::{Cell, Range};

/// Number of context values folded into a cell's text blob
pub const CONTEXT_VALUES: usize = 3;

/// Text patterns: any substring hit adds the concept
const TEXT_PATTERNS: &[(&[&str], &str)] = &[
    (&["revenue", "sales", "income", "turnover"], "revenue"),
    (&["cost", "expense", "expenditure", "spend", "cogs"], "cost"),
    (&["profit", "margin", "ebitda", "earnings"], "profitability"),
    (&["%", "percent", "ratio"], "percentage"),
    (&["growth", "cagr", "yoy", "year over year"], "growth"),
    (&["budget", "actual", "variance", "forecast"], "budget"),
    (
        &[
            "q1", "q2", "q3", "q4", "quarter", "monthly", "month", "annual", "yearly", "ytd",
        ],
        "time_series",
    ),
    (&["roi", "roa", "roe", "debt", "equity"], "financial_ratio"),
];

/// Formula patterns, matched against the uppercase formula text
const FORMULA_PATTERNS: &[(&[&str], &str)] = &[
    (&["VLOOKUP", "HLOOKUP", "XLOOKUP", "INDEX(", "MATCH("], "lookup"),
    (&["SUM", "AVERAGE", "COUNT", "MAX(", "MIN("], "aggregation"),
    (&["IF(", "IFS(", "IFERROR(", "SUMIF", "COUNTIF", "AVERAGEIF"], "conditional"),
];

/// Query vocabulary: term → concept, checked in order
const QUERY_TERMS: &[(&str, &str)] = &[
    ("profit", "profitability"),
    ("margin", "profitability"),
    ("revenue", "revenue"),
    ("sales", "revenue"),
    ("income", "revenue"),
    ("cost", "cost"),
    ("expense", "cost"),
    ("spend", "cost"),
    ("percentage", "percentage"),
    ("percent", "percentage"),
    ("ratio", "percentage"),
    ("%", "percentage"),
    ("growth", "growth"),
    ("budget", "budget"),
    ("actual", "budget"),
    ("forecast", "budget"),
    ("variance", "budget"),
    ("lookup", "lookup"),
    ("vlookup", "lookup"),
    ("formula", "formula"),
    ("calculation", "formula"),
];

/// Detect concepts in a text blob and optional formula
///
/// Tags come out deduplicated, in first-match order.
pub fn detect_concepts(text: &str, formula: Option<&str>) -> Vec<String> {
    let text = text.to_lowercase();
    let mut concepts: Vec<String> = Vec::new();

    for (patterns, concept) in TEXT_PATTERNS {
        if patterns.iter().any(|p| text.contains(p)) {
            push_unique(&mut concepts, concept);
        }
    }

    if let Some(formula) = formula {
        let formula = formula.to_uppercase();
        for (patterns, concept) in FORMULA_PATTERNS {
            if patterns.iter().any(|p| formula.contains(p)) {
                push_unique(&mut concepts, concept);
            }
        }
    }

    concepts
}

/// Concepts of a cell: value, headers and the first context values
pub fn detect_cell_concepts(cell: &Cell) -> Vec<String> {
    let mut parts: Vec<&str> = vec![cell.display_value()];
    parts.extend(cell.headers.column.as_deref());
    parts.extend(cell.headers.row.as_deref());
    parts.extend(
        cell.headers
            .context
            .iter()
            .take(CONTEXT_VALUES)
            .map(|e| e.value.as_str()),
    );
    detect_concepts(&parts.join(" "), cell.formula.as_deref())
}

/// Concepts of a range: header, sample values and the shared leading function
pub fn detect_range_concepts(range: &Range) -> Vec<String> {
    let mut parts: Vec<&str> = vec![range.header.as_str()];
    parts.extend(range.sample_values.iter().map(String::as_str));
    let pattern = format!("{}(", range.formula_pattern);
    let formula = range.has_formulas.then_some(pattern.as_str());
    detect_concepts(&parts.join(" "), formula)
}

/// Map a query onto concept tags
pub fn query_concepts(query: &str) -> Vec<String> {
    let query = query.to_lowercase();
    let mut concepts = Vec::new();
    for (term, concept) in QUERY_TERMS {
        if query.contains(term) {
            push_unique(&mut concepts, concept);
        }
    }
    concepts
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

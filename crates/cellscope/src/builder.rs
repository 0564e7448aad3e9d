//! Embedding text synthesis
//!
//! Renders the canonical text a [`Cell`] or [`Range`] is embedded from.
//! Parts appear in a fixed order and are joined with [`PART_SEPARATOR`];
//! parts with a blank value are dropped.

use crate::document::{Cell, Document, FormulaPattern, Range};

/// Separator between embedding text parts
pub const PART_SEPARATOR: &str = " - ";

/// Number of context values (cells) or sample values (ranges) in embedding text
pub const TEXT_VALUES: usize = 3;

/// Canonical embedding text of a document
pub fn embedding_text(document: &Document) -> String {
    match document {
        Document::Cell(cell) => cell_embedding_text(cell),
        Document::Range(range) => range_embedding_text(range),
    }
}

/// `Sheet: s - Column: c - Row: r - Formula: f - Type: t - Context: a, b, c`
pub fn cell_embedding_text(cell: &Cell) -> String {
    let mut parts = vec![format!("Sheet: {}", cell.sheet_name)];

    if let Some(column) = &cell.headers.column {
        parts.push(format!("Column: {}", column));
    }
    if let Some(row) = &cell.headers.row {
        parts.push(format!("Row: {}", row));
    }

    match &cell.formula {
        Some(formula) => {
            parts.push(format!("Formula: {}", formula));
            if let Some(analysis) = cell.parsed_formula.as_ref().filter(|a| a.is_ok()) {
                parts.push(format!("Type: {}", analysis.kind));
            }
        }
        None => parts.push(format!("Value: {}", cell.display_value())),
    }

    let context: Vec<&str> = cell
        .headers
        .context
        .iter()
        .take(TEXT_VALUES)
        .map(|e| e.value.as_str())
        .collect();
    if !context.is_empty() {
        parts.push(format!("Context: {}", context.join(", ")));
    }

    join_parts(parts)
}

/// `Sheet: s - Header: h - Range: B2-B9 - Values: a, b, c - Pattern: SUM`
pub fn range_embedding_text(range: &Range) -> String {
    let mut parts = vec![
        format!("Sheet: {}", range.sheet_name),
        format!("Header: {}", range.header),
        format!("Range: {}-{}", range.start_ref(), range.end_ref()),
    ];

    let samples: Vec<&str> = range
        .sample_values
        .iter()
        .take(TEXT_VALUES)
        .map(String::as_str)
        .collect();
    if !samples.is_empty() {
        parts.push(format!("Values: {}", samples.join(", ")));
    }

    if range.formula_pattern != FormulaPattern::Values {
        parts.push(format!("Pattern: {}", range.formula_pattern));
    }

    join_parts(parts)
}

/// Drop parts whose value is blank, then join
fn join_parts(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|part| {
            part.split_once(": ")
                .map_or(!part.trim().is_empty(), |(_, value)| !value.trim().is_empty())
        })
        .collect::<Vec<_>>()
        .join(PART_SEPARATOR)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{CellHeaders, ContextEntry};
    use cellscope_core::CellAddress;
    use pretty_assertions::assert_eq;

    fn cell(reference: &str, value: &str) -> Cell {
        Cell::new("book", "P&L", CellAddress::parse(reference).unwrap(), value)
    }

    fn context(values: &[&str]) -> Vec<ContextEntry> {
        values
            .iter()
            .enumerate()
            .map(|(i, v)| ContextEntry {
                value: v.to_string(),
                row: 1,
                col: i as u32 + 1,
                distance: 1,
            })
            .collect()
    }

    #[test]
    fn test_value_cell_text() {
        let c = cell("B2", "100").with_headers(CellHeaders {
            column: Some("Q1".into()),
            row: Some("Revenue".into()),
            context: context(&["Line", "Q1", "Q2", "Q3"]),
        });
        let expected =
            "Sheet: P&L - Column: Q1 - Row: Revenue - Value: 100 - Context: Line, Q1, Q2";
        assert_eq!(cell_embedding_text(&c), expected);
        assert_eq!(embedding_text(&c.into()), expected);
    }

    #[test]
    fn test_formula_cell_text() {
        let c = cell("C4", "50").with_formula("=C2-C3").with_headers(CellHeaders {
            column: Some("Q2".into()),
            row: None,
            context: Vec::new(),
        });
        assert_eq!(
            cell_embedding_text(&c),
            "Sheet: P&L - Column: Q2 - Formula: =C2-C3 - Type: calculation"
        );
    }

    #[test]
    fn test_unparsable_formula_has_no_type() {
        let c = cell("A2", "#ERR").with_formula("=SUM(A1,");
        assert_eq!(cell_embedding_text(&c), "Sheet: P&L - Formula: =SUM(A1,");
    }

    #[test]
    fn test_blank_parts_are_dropped() {
        let c = cell("A2", "   ");
        assert_eq!(cell_embedding_text(&c), "Sheet: P&L");
    }

    #[test]
    fn test_range_text() {
        let values = vec![
            cell("B2", "100"),
            cell("B3", "60"),
            cell("B4", "40"),
            cell("B5", "30"),
        ];
        let range = Range::from_cells("book", "P&L", "Q1", values).unwrap();
        assert_eq!(
            range_embedding_text(&range),
            "Sheet: P&L - Header: Q1 - Range: B2-B5 - Values: 100, 60, 40"
        );

        let summed = vec![
            cell("D2", "10").with_formula("=SUM(B2:C2)"),
            cell("D3", "12").with_formula("=SUM(B3:C3)"),
        ];
        let range = Range::from_cells("book", "P&L", "Total", summed).unwrap();
        assert_eq!(
            range_embedding_text(&range),
            "Sheet: P&L - Header: Total - Range: D2-D3 - Values: 10, 12 - Pattern: SUM"
        );
    }
}

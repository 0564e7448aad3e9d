//! Header and neighbourhood resolution
//!
//! Given a sheet's value grid and a 1-based (row, col) target, derives the
//! column header (first row), the row header (first column) and every
//! non-empty neighbour inside a box of [`CONTEXT_RADIUS`] rows and columns.

use crate::document::{CellHeaders, ContextEntry};
use cellscope_core::SheetGrid;

/// Rows and columns scanned on each side of the target
pub const CONTEXT_RADIUS: usize = 2;

/// Resolve headers and context for a 1-based grid position
///
/// Context entries are produced row-major, ascending column, and exclude
/// the target itself. Distances are Manhattan distances.
pub fn resolve_headers(grid: &SheetGrid, row: u32, col: u32) -> CellHeaders {
    CellHeaders {
        column: grid.column_header(col as usize).map(str::to_string),
        row: grid.row_header(row as usize).map(str::to_string),
        context: neighbours(grid, row, col),
    }
}

fn neighbours(grid: &SheetGrid, row: u32, col: u32) -> Vec<ContextEntry> {
    if row == 0 || col == 0 {
        return Vec::new();
    }
    let target_row = (row - 1) as usize;
    let target_col = (col - 1) as usize;

    let first_row = target_row.saturating_sub(CONTEXT_RADIUS);
    let last_row = target_row + CONTEXT_RADIUS;
    let first_col = target_col.saturating_sub(CONTEXT_RADIUS);
    let last_col = target_col + CONTEXT_RADIUS;

    let mut context = Vec::new();
    for r in first_row..=last_row {
        for c in first_col..=last_col {
            if r == target_row && c == target_col {
                continue;
            }
            let Some(value) = grid.get_at(r, c) else {
                continue;
            };
            if value.is_empty() {
                continue;
            }
            context.push(ContextEntry {
                value: value.text.trim().to_string(),
                row: r as u32 + 1,
                col: c as u32 + 1,
                distance: (r.abs_diff(target_row) + c.abs_diff(target_col)) as u32,
            });
        }
    }
    context
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn grid() -> SheetGrid {
        SheetGrid::from_rows(
            "P&L",
            vec![
                vec!["Line", "Q1", "Q2", "Q3", "Q4"],
                vec!["Revenue", "100", "110", "120", "130"],
                vec!["Cost", "60", "", "70", "75"],
                vec!["Profit", "40", "45", "50", "55"],
            ],
        )
    }

    #[test]
    fn test_headers() {
        let headers = resolve_headers(&grid(), 2, 3);
        assert_eq!(headers.column.as_deref(), Some("Q2"));
        assert_eq!(headers.row.as_deref(), Some("Revenue"));

        // Outside the grid
        let headers = resolve_headers(&grid(), 9, 9);
        assert_eq!(headers.column, None);
        assert_eq!(headers.row, None);
        assert!(headers.context.is_empty());
    }

    #[test]
    fn test_context_order_and_distance() {
        let headers = resolve_headers(&grid(), 1, 1);
        let positions: Vec<_> = headers
            .context
            .iter()
            .map(|e| (e.row, e.col, e.distance))
            .collect();
        assert_eq!(
            positions,
            vec![
                (1, 2, 1),
                (1, 3, 2),
                (2, 1, 1),
                (2, 2, 2),
                (2, 3, 3),
                (3, 1, 2),
                (3, 2, 3),
            ]
        );
        assert_eq!(headers.context[0].value, "Q1");
    }

    #[test]
    fn test_context_skips_empty_and_self() {
        let headers = resolve_headers(&grid(), 3, 3);
        assert!(headers.context.iter().all(|e| !(e.row == 3 && e.col == 3)));
        // 5x5 box clipped to 4 rows x 5 columns, minus the target, which is empty anyway
        assert_eq!(headers.context.len(), 4 * 5 - 1);
        assert!(headers.context.iter().all(|e| e.distance <= 4));
    }
}

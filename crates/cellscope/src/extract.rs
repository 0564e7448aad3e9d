//! Grid extraction
//!
//! Turns a [`SheetGrid`] into [`Cell`] documents, one per non-empty data
//! position, and groups those cells into [`Range`] documents by column
//! header. Row 1 of a grid holds the column headers and is never extracted
//! as data.

use crate::context::resolve_headers;
use crate::document::{Cell, Range};
use ahash::AHashMap;
use cellscope_core::{CellAddress, SheetGrid};

/// Cells and ranges extracted from one sheet
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SheetDocuments {
    pub cells: Vec<Cell>,
    pub ranges: Vec<Range>,
}

impl SheetDocuments {
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty() && self.ranges.is_empty()
    }
}

/// Build the cell at a 1-based grid position
///
/// Returns `None` for empty or out-of-grid positions.
pub fn build_cell(spreadsheet_id: &str, grid: &SheetGrid, row: u32, col: u32) -> Option<Cell> {
    if row == 0 || col == 0 {
        return None;
    }
    let value = grid.get_at(row as usize - 1, col as usize - 1)?;
    if value.is_empty() {
        return None;
    }
    let address = CellAddress::from_one_based(row, col).ok()?;

    let mut cell = Cell::new(spreadsheet_id, grid.name(), address, value.text.trim());
    if let Some(formula) = &value.formula {
        cell = cell.with_formula(formula.trim());
    }
    Some(cell.with_headers(resolve_headers(grid, row, col)))
}

/// Every non-empty data cell of a sheet, row-major
pub fn extract_cells(spreadsheet_id: &str, grid: &SheetGrid) -> Vec<Cell> {
    grid.iter_non_empty()
        .filter(|(row, _, _)| *row > 0)
        .filter_map(|(row, col, _)| {
            build_cell(spreadsheet_id, grid, row as u32 + 1, col as u32 + 1)
        })
        .collect()
}

/// Group cells by (sheet, column header) into ranges
///
/// Cells without a column header are not grouped. Groups keep the order in
/// which their header first appears; groups of one cell are dropped.
pub fn group_ranges(cells: &[Cell]) -> Vec<Range> {
    // (spreadsheet, sheet, header) -> position in `groups`
    let mut index_map: AHashMap<(&str, &str, &str), usize> = AHashMap::new();
    let mut groups: Vec<((&str, &str, &str), Vec<Cell>)> = Vec::new();

    for cell in cells {
        let Some(header) = cell.headers.column.as_deref() else {
            continue;
        };
        let key = (
            cell.spreadsheet_id.as_str(),
            cell.sheet_name.as_str(),
            header,
        );
        if let Some(&idx) = index_map.get(&key) {
            groups[idx].1.push(cell.clone());
            continue;
        }
        index_map.insert(key, groups.len());
        groups.push((key, vec![cell.clone()]));
    }

    groups
        .into_iter()
        .filter_map(|((spreadsheet_id, sheet, header), members)| {
            Range::from_cells(spreadsheet_id, sheet, header, members)
        })
        .collect()
}

/// Extract every cell and range of a sheet
pub fn extract_sheet(spreadsheet_id: &str, grid: &SheetGrid) -> SheetDocuments {
    let cells = extract_cells(spreadsheet_id, grid);
    let ranges = group_ranges(&cells);
    tracing::debug!(
        "Extracted sheet {}: {} cells, {} ranges",
        grid.name(),
        cells.len(),
        ranges.len()
    );
    SheetDocuments { cells, ranges }
}

//! Sheet value grid
//!
//! A [`SheetGrid`] is the hand-off format between whatever decodes a
//! spreadsheet and the indexing pipeline: a sheet name plus a row-major
//! matrix of display values (with the formula text, when the cell has one).
//! Row 1 holds the column headers, column 1 holds the row headers.

use crate::address::CellAddress;

/// One grid position: the displayed text and, optionally, its formula
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridValue {
    /// Displayed (formatted) text
    pub text: String,
    /// Formula text including the leading `=`
    pub formula: Option<String>,
}

impl GridValue {
    /// A plain value without a formula
    pub fn text<S: Into<String>>(text: S) -> Self {
        Self {
            text: text.into(),
            formula: None,
        }
    }

    /// A formula together with its displayed result
    pub fn formula<S: Into<String>, F: Into<String>>(text: S, formula: F) -> Self {
        Self {
            text: text.into(),
            formula: Some(formula.into()),
        }
    }

    /// Neither text nor formula
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.formula.is_none()
    }

    /// Whether this value reads as a label rather than a number
    pub fn is_text(&self) -> bool {
        let trimmed = self.text.trim();
        !trimmed.is_empty() && self.formula.is_none() && trimmed.parse::<f64>().is_err()
    }
}

/// A sheet's full value grid (row-major, 0-based storage)
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SheetGrid {
    name: String,
    rows: Vec<Vec<GridValue>>,
}

impl SheetGrid {
    /// Create an empty grid
    pub fn new<S: Into<String>>(name: S) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Build a grid of plain values
    pub fn from_rows<S, R, V>(name: S, rows: R) -> Self
    where
        S: Into<String>,
        R: IntoIterator,
        R::Item: IntoIterator<Item = V>,
        V: Into<String>,
    {
        let rows = rows
            .into_iter()
            .map(|row| row.into_iter().map(GridValue::text).collect())
            .collect();
        Self {
            name: name.into(),
            rows,
        }
    }

    /// Sheet name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All rows
    pub fn rows(&self) -> &[Vec<GridValue>] {
        &self.rows
    }

    /// Append a row
    pub fn push_row(&mut self, row: Vec<GridValue>) {
        self.rows.push(row);
    }

    /// Set a value at 0-based coordinates, growing the grid as needed
    pub fn set_at(&mut self, row: usize, col: usize, value: GridValue) {
        if self.rows.len() <= row {
            self.rows.resize_with(row + 1, Vec::new);
        }
        let cells = &mut self.rows[row];
        if cells.len() <= col {
            cells.resize_with(col + 1, GridValue::default);
        }
        cells[col] = value;
    }

    /// Set a value by A1 address
    pub fn set(&mut self, address: CellAddress, value: GridValue) {
        self.set_at(address.row as usize, address.col as usize, value);
    }

    /// Get a value at 0-based coordinates
    pub fn get_at(&self, row: usize, col: usize) -> Option<&GridValue> {
        self.rows.get(row).and_then(|r| r.get(col))
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Width of the widest row
    pub fn col_count(&self) -> usize {
        self.rows.iter().map(Vec::len).max().unwrap_or(0)
    }

    /// Column header for a 1-based column: the first-row entry, if it is text
    pub fn column_header(&self, col: usize) -> Option<&str> {
        if col == 0 {
            return None;
        }
        self.get_at(0, col - 1)
            .filter(|v| v.is_text())
            .map(|v| v.text.trim())
    }

    /// Row header for a 1-based row: the first-column entry, if it is text
    pub fn row_header(&self, row: usize) -> Option<&str> {
        if row == 0 {
            return None;
        }
        self.get_at(row - 1, 0)
            .filter(|v| v.is_text())
            .map(|v| v.text.trim())
    }

    /// Iterate non-empty positions as (0-based row, 0-based col, value)
    pub fn iter_non_empty(&self) -> impl Iterator<Item = (usize, usize, &GridValue)> {
        self.rows.iter().enumerate().flat_map(|(r, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, v)| !v.is_empty())
                .map(move |(c, v)| (r, c, v))
        })
    }
}

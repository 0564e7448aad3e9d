//! Indexed document types
//!
//! - [`Cell`] - one spreadsheet position with value, formula and header metadata
//! - [`Range`] - a run of cells sharing a column header
//! - [`Document`] - either of the above, distinguished by an explicit tag
//! - [`IndexedDocument`] - a document enriched with its embedding and labels

use ahash::AHashMap;
use cellscope_core::{CellAddress, CellKind};
use cellscope_formula::{analyze_formula, FormulaAnalysis};
use std::fmt;

/// A non-empty neighbour of a cell
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ContextEntry {
    /// Displayed value of the neighbour
    pub value: String,
    /// 1-based row
    pub row: u32,
    /// 1-based column
    pub col: u32,
    /// Manhattan distance from the target cell
    pub distance: u32,
}

/// Headers and surrounding values of a cell
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellHeaders {
    pub column: Option<String>,
    pub row: Option<String>,
    pub context: Vec<ContextEntry>,
}

/// A single spreadsheet cell
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Cell {
    pub id: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    /// 1-based row
    pub row: u32,
    /// 1-based column
    pub col: u32,
    /// A1 reference, e.g. "C2"
    pub cell_ref: String,
    pub raw_value: String,
    pub formatted_value: String,
    pub formula: Option<String>,
    pub parsed_formula: Option<FormulaAnalysis>,
    pub kind: CellKind,
    pub headers: CellHeaders,
}

impl Cell {
    /// Create a cell at `address`; row, column, reference and id all derive from it
    pub fn new<S, N, V>(
        spreadsheet_id: S,
        sheet_name: N,
        address: CellAddress,
        raw_value: V,
    ) -> Self
    where
        S: Into<String>,
        N: Into<String>,
        V: Into<String>,
    {
        let spreadsheet_id = spreadsheet_id.into();
        let sheet_name = sheet_name.into();
        let raw_value = raw_value.into();
        let relative = CellAddress::new(address.row, address.col);
        let cell_ref = relative.to_a1_string();
        let (row, col) = relative.one_based();

        Self {
            id: Self::make_id(&spreadsheet_id, &sheet_name, &cell_ref),
            spreadsheet_id,
            sheet_name,
            row,
            col,
            cell_ref,
            kind: CellKind::detect(&raw_value, None),
            formatted_value: raw_value.clone(),
            raw_value,
            formula: None,
            parsed_formula: None,
            headers: CellHeaders::default(),
        }
    }

    /// Stable id of a cell: `<spreadsheet>:<sheet>:<ref>`
    pub fn make_id(spreadsheet_id: &str, sheet_name: &str, cell_ref: &str) -> String {
        format!("{}:{}:{}", spreadsheet_id, sheet_name, cell_ref)
    }

    /// Replace the displayed value
    pub fn with_formatted_value<S: Into<String>>(mut self, formatted: S) -> Self {
        self.formatted_value = formatted.into();
        if self.formula.is_none() {
            self.kind = CellKind::detect(&self.formatted_value, None);
        }
        self
    }

    /// Attach a formula and its analysis
    pub fn with_formula<S: Into<String>>(mut self, formula: S) -> Self {
        let formula = formula.into();
        self.parsed_formula = analyze_formula(&formula);
        self.kind = CellKind::detect(&self.formatted_value, Some(&formula));
        self.formula = Some(formula);
        self
    }

    /// Attach headers and context
    pub fn with_headers(mut self, headers: CellHeaders) -> Self {
        self.headers = headers;
        self
    }

    /// Position as an address; `None` when `row`/`col` are outside the sheet
    pub fn address(&self) -> Option<CellAddress> {
        CellAddress::from_one_based(self.row, self.col).ok()
    }

    /// Formatted value, falling back to the raw value
    pub fn display_value(&self) -> &str {
        if self.formatted_value.trim().is_empty() {
            &self.raw_value
        } else {
            &self.formatted_value
        }
    }
}

/// How the formulas of a range's members relate
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FormulaPattern {
    /// The leading function of most formula members
    Function(String),
    /// Formula members without any leading function
    Mixed,
    /// No formula members
    Values,
}

impl FormulaPattern {
    /// Dominant leading function; ties go to the one seen first
    fn from_cells(cells: &[Cell]) -> Self {
        let mut formulas = cells.iter().filter_map(|c| c.formula.as_deref()).peekable();
        if formulas.peek().is_none() {
            return FormulaPattern::Values;
        }

        // name -> (count, first seen)
        let mut counts: AHashMap<String, (usize, usize)> = AHashMap::new();
        for (seen, name) in formulas.filter_map(leading_function).enumerate() {
            counts.entry(name).or_insert((0, seen)).0 += 1;
        }

        counts
            .into_iter()
            .max_by(|(_, (count_a, first_a)), (_, (count_b, first_b))| {
                count_a.cmp(count_b).then(first_b.cmp(first_a))
            })
            .map_or(FormulaPattern::Mixed, |(name, _)| FormulaPattern::Function(name))
    }
}

impl fmt::Display for FormulaPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormulaPattern::Function(name) => f.write_str(name),
            FormulaPattern::Mixed => f.write_str("mixed"),
            FormulaPattern::Values => f.write_str("values"),
        }
    }
}

/// `=SUM(B2:B9)` → `SUM`; `=B2*C2` → none
fn leading_function(formula: &str) -> Option<String> {
    let body = formula.trim().strip_prefix('=')?.trim_start();
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '.' || *c == '_')
        .collect();
    let rest = body[name.len()..].trim_start();
    if name.is_empty() || !rest.starts_with('(') {
        return None;
    }
    Some(name.to_uppercase())
}

/// A run of cells sharing a column header
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Range {
    pub id: String,
    pub spreadsheet_id: String,
    pub sheet_name: String,
    pub header: String,
    pub cells: Vec<Cell>,
    pub start_row: u32,
    pub end_row: u32,
    pub start_column: u32,
    pub end_column: u32,
    pub sample_values: Vec<String>,
    pub has_formulas: bool,
    pub formula_pattern: FormulaPattern,
}

impl Range {
    /// Maximum number of sample values kept
    pub const MAX_SAMPLES: usize = 5;

    /// Minimum number of member cells
    pub const MIN_CELLS: usize = 2;

    /// Group `cells` under `header`
    ///
    /// Members whose position lies outside the sheet are dropped. Returns
    /// `None` for fewer than [`Range::MIN_CELLS`] remaining members: a single
    /// cell is never promoted to a range.
    pub fn from_cells<S, N, H>(
        spreadsheet_id: S,
        sheet_name: N,
        header: H,
        cells: Vec<Cell>,
    ) -> Option<Self>
    where
        S: Into<String>,
        N: Into<String>,
        H: Into<String>,
    {
        let cells: Vec<Cell> = cells
            .into_iter()
            .filter(|c| c.address().is_some())
            .collect();
        if cells.len() < Self::MIN_CELLS {
            return None;
        }

        let start_row = cells.iter().map(|c| c.row).min()?;
        let end_row = cells.iter().map(|c| c.row).max()?;
        let start_column = cells.iter().map(|c| c.col).min()?;
        let end_column = cells.iter().map(|c| c.col).max()?;

        let spreadsheet_id = spreadsheet_id.into();
        let sheet_name = sheet_name.into();
        let start_ref = CellAddress::from_one_based(start_row, start_column).ok()?;
        let end_ref = CellAddress::from_one_based(end_row, end_column).ok()?;
        let id = format!(
            "{}:{}:range:{}-{}",
            spreadsheet_id, sheet_name, start_ref, end_ref
        );

        let sample_values = cells
            .iter()
            .map(|c| c.display_value().to_string())
            .filter(|v| !v.trim().is_empty())
            .take(Self::MAX_SAMPLES)
            .collect();

        Some(Self {
            id,
            spreadsheet_id,
            sheet_name,
            header: header.into(),
            has_formulas: cells.iter().any(|c| c.formula.is_some()),
            formula_pattern: FormulaPattern::from_cells(&cells),
            sample_values,
            start_row,
            end_row,
            start_column,
            end_column,
            cells,
        })
    }

    /// A1 reference of the top-left corner, empty if out of bounds
    pub fn start_ref(&self) -> String {
        corner_ref(self.start_row, self.start_column)
    }

    /// A1 reference of the bottom-right corner, empty if out of bounds
    pub fn end_ref(&self) -> String {
        corner_ref(self.end_row, self.end_column)
    }
}

fn corner_ref(row: u32, col: u32) -> String {
    CellAddress::from_one_based(row, col)
        .map(|addr| addr.to_a1_string())
        .unwrap_or_default()
}

/// Which variant a document is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum DocumentKind {
    Cell,
    Range,
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentKind::Cell => f.write_str("cell"),
            DocumentKind::Range => f.write_str("range"),
        }
    }
}

/// A searchable unit
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "document", rename_all = "lowercase"))]
pub enum Document {
    Cell(Cell),
    Range(Range),
}

impl Document {
    pub fn id(&self) -> &str {
        match self {
            Document::Cell(cell) => &cell.id,
            Document::Range(range) => &range.id,
        }
    }

    pub fn kind(&self) -> DocumentKind {
        match self {
            Document::Cell(_) => DocumentKind::Cell,
            Document::Range(_) => DocumentKind::Range,
        }
    }

    pub fn sheet_name(&self) -> &str {
        match self {
            Document::Cell(cell) => &cell.sheet_name,
            Document::Range(range) => &range.sheet_name,
        }
    }

    /// Column header of a cell, or the shared header of a range
    pub fn column_header(&self) -> Option<&str> {
        match self {
            Document::Cell(cell) => cell.headers.column.as_deref(),
            Document::Range(range) => Some(range.header.as_str()),
        }
    }

    /// Row header (cells only)
    pub fn row_header(&self) -> Option<&str> {
        match self {
            Document::Cell(cell) => cell.headers.row.as_deref(),
            Document::Range(_) => None,
        }
    }

    /// Displayed value of a cell, or the joined sample values of a range
    pub fn display_value(&self) -> String {
        match self {
            Document::Cell(cell) => cell.display_value().to_string(),
            Document::Range(range) => range.sample_values.join(", "),
        }
    }

    /// Formula text (cells only)
    pub fn formula(&self) -> Option<&str> {
        match self {
            Document::Cell(cell) => cell.formula.as_deref(),
            Document::Range(_) => None,
        }
    }

    /// Formula analysis (cells only)
    pub fn parsed_formula(&self) -> Option<&FormulaAnalysis> {
        match self {
            Document::Cell(cell) => cell.parsed_formula.as_ref(),
            Document::Range(_) => None,
        }
    }

    pub fn as_cell(&self) -> Option<&Cell> {
        match self {
            Document::Cell(cell) => Some(cell),
            Document::Range(_) => None,
        }
    }

    pub fn as_range(&self) -> Option<&Range> {
        match self {
            Document::Range(range) => Some(range),
            Document::Cell(_) => None,
        }
    }
}

impl From<Cell> for Document {
    fn from(cell: Cell) -> Self {
        Document::Cell(cell)
    }
}

impl From<Range> for Document {
    fn from(range: Range) -> Self {
        Document::Range(range)
    }
}

/// Where a document's labels came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum LabelMethod {
    /// Concept detector patterns
    Heuristic,
    /// An external labeling backend
    Backend,
    /// Built-in basic patterns, used when nothing else answered
    Fallback,
}

impl fmt::Display for LabelMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LabelMethod::Heuristic => f.write_str("heuristic"),
            LabelMethod::Backend => f.write_str("backend"),
            LabelMethod::Fallback => f.write_str("fallback"),
        }
    }
}

/// Business-concept labels of a document
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LabelSet {
    pub labels: Vec<String>,
    /// One confidence per label
    pub confidence: Vec<f64>,
    pub method: LabelMethod,
    pub explanation: String,
}

impl LabelSet {
    /// Labels sharing one confidence value
    pub fn uniform<S: Into<String>>(
        labels: Vec<String>,
        confidence: f64,
        method: LabelMethod,
        explanation: S,
    ) -> Self {
        Self {
            confidence: vec![confidence; labels.len()],
            labels,
            method,
            explanation: explanation.into(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// A document with its embedding and labels
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IndexedDocument {
    pub document: Document,
    pub embedding: Vec<f32>,
    pub labels: LabelSet,
}

impl IndexedDocument {
    pub fn id(&self) -> &str {
        self.document.id()
    }

    pub fn kind(&self) -> DocumentKind {
        self.document.kind()
    }
}

//! Structural formula analysis
//!
//! Walks a parsed formula and records which functions, references and
//! operators it uses, scores its structural complexity and classifies it
//! into a coarse [`FormulaKind`]. Analysis never fails: a formula that does
//! not parse yields a degraded [`FormulaAnalysis`] with `error` set, zero
//! complexity and kind [`FormulaKind::Other`].

use crate::ast::{Expr, RefTarget, Reference};
use crate::parser::parse_formula;
use std::fmt;

/// Complexity added per function call node
pub const FUNCTION_WEIGHT: f64 = 2.0;

/// Complexity added per operator node (binary or unary)
pub const OPERATOR_WEIGHT: f64 = 1.0;

/// Complexity added per cell or range reference node
pub const REFERENCE_WEIGHT: f64 = 0.5;

const AGGREGATION_FUNCTIONS: &[&str] = &["SUM", "AVERAGE", "COUNT", "MAX", "MIN"];
const LOOKUP_FUNCTIONS: &[&str] = &["VLOOKUP", "HLOOKUP", "INDEX", "MATCH", "XLOOKUP"];
const FINANCIAL_FUNCTIONS: &[&str] = &["RATE", "CAGR", "PMT", "FV", "PV"];

/// Coarse classification of what a formula computes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum FormulaKind {
    Aggregation,
    Conditional,
    Lookup,
    Percentage,
    Calculation,
    Financial,
    Other,
}

impl FormulaKind {
    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaKind::Aggregation => "aggregation",
            FormulaKind::Conditional => "conditional",
            FormulaKind::Lookup => "lookup",
            FormulaKind::Percentage => "percentage",
            FormulaKind::Calculation => "calculation",
            FormulaKind::Financial => "financial",
            FormulaKind::Other => "other",
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A cell or range a formula points at
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "lowercase"))]
pub enum FormulaReference {
    Cell {
        cell: String,
        sheet: Option<String>,
        absolute: bool,
    },
    Range {
        range: String,
        sheet: Option<String>,
        absolute: bool,
    },
}

impl FormulaReference {
    /// A1 text of the reference, without the sheet
    pub fn target(&self) -> &str {
        match self {
            FormulaReference::Cell { cell, .. } => cell,
            FormulaReference::Range { range, .. } => range,
        }
    }
}

impl From<&Reference> for FormulaReference {
    fn from(reference: &Reference) -> Self {
        let sheet = reference.sheet.clone();
        let absolute = reference.is_absolute();
        match reference.target {
            RefTarget::Cell(_) => FormulaReference::Cell {
                cell: reference.a1(),
                sheet,
                absolute,
            },
            RefTarget::Range(_) | RefTarget::Columns(..) | RefTarget::Rows(..) => {
                FormulaReference::Range {
                    range: reference.a1(),
                    sheet,
                    absolute,
                }
            }
        }
    }
}

/// Result of analyzing one formula
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FormulaAnalysis {
    /// Formula text as given
    pub original: String,
    /// Function names, uppercase, first-occurrence order, deduplicated
    pub functions: Vec<String>,
    /// Every cell/range reference in traversal order
    pub references: Vec<FormulaReference>,
    /// Operator symbols, first-occurrence order, deduplicated
    pub operators: Vec<String>,
    /// Raw structural complexity
    pub complexity: f64,
    /// Classification
    pub kind: FormulaKind,
    /// Parse error message, if the formula could not be parsed
    pub error: Option<String>,
}

impl FormulaAnalysis {
    /// Degraded analysis for a formula that failed to parse
    pub fn failed<S: Into<String>>(original: S, error: S) -> Self {
        Self {
            original: original.into(),
            functions: Vec::new(),
            references: Vec::new(),
            operators: Vec::new(),
            complexity: 0.0,
            kind: FormulaKind::Other,
            error: Some(error.into()),
        }
    }

    /// Whether the formula parsed
    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }

    /// Complexity scaled into `[0, 1]` against `ceiling`
    ///
    /// A complexity at or above the ceiling maps to 1.0. A non-positive
    /// ceiling maps everything to 0.0.
    pub fn normalized_complexity(&self, ceiling: f64) -> f64 {
        if !(ceiling > 0.0) || !self.complexity.is_finite() {
            return 0.0;
        }
        (self.complexity / ceiling).clamp(0.0, 1.0)
    }

    /// Whether the formula calls `name` (case-insensitive)
    pub fn uses_function(&self, name: &str) -> bool {
        self.functions.iter().any(|f| f.eq_ignore_ascii_case(name))
    }

    /// Whether the formula uses the operator `symbol`
    pub fn uses_operator(&self, symbol: &str) -> bool {
        self.operators.iter().any(|o| o == symbol)
    }
}

/// Analyze a formula string
///
/// Returns `None` when `text` is not a formula (does not start with `=`).
///
/// # Example
/// ```rust
/// use cellscope_formula::{analyze_formula, FormulaKind};
///
/// assert!(analyze_formula("42").is_none());
///
/// let analysis = analyze_formula("=B2/C2").unwrap();
/// assert_eq!(analysis.kind, FormulaKind::Percentage);
///
/// let broken = analyze_formula("=SUM(").unwrap();
/// assert!(broken.error.is_some());
/// assert_eq!(broken.complexity, 0.0);
/// ```
pub fn analyze_formula(text: &str) -> Option<FormulaAnalysis> {
    let trimmed = text.trim();
    if !trimmed.starts_with('=') {
        return None;
    }

    let expr = match parse_formula(trimmed) {
        Ok(expr) => expr,
        Err(e) => return Some(FormulaAnalysis::failed(text.to_string(), e.to_string())),
    };

    let mut collector = Collector::default();
    collector.visit(&expr);

    let kind = classify(&collector.functions, &collector.operators);
    Some(FormulaAnalysis {
        original: text.to_string(),
        functions: collector.functions,
        references: collector.references,
        operators: collector.operators,
        complexity: collector.complexity,
        kind,
        error: None,
    })
}

#[derive(Default)]
struct Collector {
    functions: Vec<String>,
    references: Vec<FormulaReference>,
    operators: Vec<String>,
    complexity: f64,
}

impl Collector {
    fn visit(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal(_) | Expr::Name(_) => {}
            Expr::Reference(reference) => {
                self.complexity += REFERENCE_WEIGHT;
                self.references.push(FormulaReference::from(reference));
            }
            Expr::Binary { op, lhs, rhs } => {
                self.complexity += OPERATOR_WEIGHT;
                push_unique(&mut self.operators, op.symbol());
                self.visit(lhs);
                self.visit(rhs);
            }
            Expr::Unary { op, operand } => {
                self.complexity += OPERATOR_WEIGHT;
                push_unique(&mut self.operators, op.symbol());
                self.visit(operand);
            }
            Expr::Call { name, args } => {
                self.complexity += FUNCTION_WEIGHT;
                push_unique(&mut self.functions, name);
                args.iter().for_each(|arg| self.visit(arg));
            }
            Expr::Array(rows) => rows.iter().flatten().for_each(|item| self.visit(item)),
        }
    }
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

fn is_conditional(name: &str) -> bool {
    // IF, IFS, IFERROR, IFNA, SUMIF(S), COUNTIF(S), AVERAGEIF(S), ...
    name.starts_with("IF") || name.ends_with("IF") || name.ends_with("IFS")
}

/// Classify by priority: aggregation, conditional, lookup, percentage,
/// calculation, financial, other
fn classify(functions: &[String], operators: &[String]) -> FormulaKind {
    let has_function = |set: &[&str]| functions.iter().any(|f| set.contains(&f.as_str()));
    let has_operator = |symbol: &str| operators.iter().any(|o| o == symbol);

    if has_function(AGGREGATION_FUNCTIONS) {
        return FormulaKind::Aggregation;
    }
    if functions.iter().any(|f| is_conditional(f)) {
        return FormulaKind::Conditional;
    }
    if has_function(LOOKUP_FUNCTIONS) {
        return FormulaKind::Lookup;
    }
    if functions.is_empty() {
        if has_operator("/") {
            return FormulaKind::Percentage;
        }
        if has_operator("*") || has_operator("+") || has_operator("-") {
            return FormulaKind::Calculation;
        }
    }
    if has_function(FINANCIAL_FUNCTIONS) {
        return FormulaKind::Financial;
    }
    FormulaKind::Other
}

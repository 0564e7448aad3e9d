//! # cellscope-formula
//!
//! Formula parsing and structural analysis for cellscope.
//!
//! This crate provides:
//! - Formula parsing (text → [`Expr`] tree)
//! - Formula analysis (tree → functions, references, operators, complexity, kind)
//!
//! ## Example
//!
//! ```rust
//! use cellscope_formula::{analyze_formula, FormulaKind};
//!
//! let analysis = analyze_formula("=SUM(B2:B10)").unwrap();
//! assert_eq!(analysis.kind, FormulaKind::Aggregation);
//! assert_eq!(analysis.functions, vec!["SUM".to_string()]);
//! ```

pub mod analyzer;
pub mod ast;
pub mod error;
mod lexer;
pub mod parser;

pub use analyzer::{analyze_formula, FormulaAnalysis, FormulaKind, FormulaReference};
pub use ast::{BinaryOp, Bound, Expr, Literal, RefTarget, Reference, UnaryOp};
pub use error::{FormulaError, FormulaResult};
pub use parser::parse_formula;

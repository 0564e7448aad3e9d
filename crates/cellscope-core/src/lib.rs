//! # cellscope-core
//!
//! Core data structures for the cellscope spreadsheet search engine.
//!
//! This crate provides the fundamental types used throughout cellscope:
//! - [`CellAddress`] and [`CellRange`] - Cell addressing and ranges
//! - [`SheetGrid`] - A sheet's row-major value grid, as handed over by an extractor
//! - [`CellKind`] - The detected kind of a cell's content
//!
//! ## Example
//!
//! ```rust
//! use cellscope_core::{CellAddress, SheetGrid};
//!
//! let grid = SheetGrid::from_rows(
//!     "Budget",
//!     vec![
//!         vec!["Item", "Q1", "Q2"],
//!         vec!["Revenue", "100", "120"],
//!     ],
//! );
//!
//! assert_eq!(grid.column_header(2), Some("Q1"));
//! assert_eq!(CellAddress::parse("C2").unwrap().to_string(), "C2");
//! ```

pub mod address;
pub mod error;
pub mod grid;
pub mod kind;

// Re-exports for convenience
pub use address::{CellAddress, CellRange};
pub use error::{Error, Result};
pub use grid::{GridValue, SheetGrid};
pub use kind::CellKind;

/// Maximum number of rows in a worksheet (Excel limit)
pub const MAX_ROWS: u32 = 1_048_576;

/// Maximum number of columns in a worksheet (Excel limit)
pub const MAX_COLS: u16 = 16_384;

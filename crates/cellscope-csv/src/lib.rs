//! # cellscope-csv
//!
//! Reads CSV files into [`SheetGrid`](cellscope_core::SheetGrid)s for
//! indexing. The first record is kept as an ordinary grid row, so it acts
//! as the column header row downstream. Fields starting with `=` are taken
//! as formulas.

mod error;
mod options;
mod reader;

pub use error::{CsvError, CsvResult};
pub use options::CsvReadOptions;
pub use reader::CsvReader;

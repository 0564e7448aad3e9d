//! CSV reader

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::options::CsvReadOptions;
use cellscope_core::{Error, GridValue, SheetGrid, MAX_COLS, MAX_ROWS};

/// Sheet name used when neither the options nor the path provide one
pub const DEFAULT_SHEET_NAME: &str = "Sheet1";

/// CSV file reader
pub struct CsvReader;

impl CsvReader {
    /// Read a CSV file into a grid named after the file stem
    pub fn read_file<P: AsRef<Path>>(path: P, options: &CsvReadOptions) -> CsvResult<SheetGrid> {
        let path = path.as_ref();
        let name = options
            .sheet_name
            .clone()
            .or_else(|| Self::sheet_name_for(path))
            .unwrap_or_else(|| DEFAULT_SHEET_NAME.to_string());
        let file = File::open(path)?;
        Self::read(file, &name, options)
    }

    /// File stem of `path`, if it has one
    pub fn sheet_name_for(path: &Path) -> Option<String> {
        path.file_stem()
            .map(|stem| stem.to_string_lossy().into_owned())
            .filter(|stem| !stem.is_empty())
    }

    /// Read CSV from a reader into a grid
    pub fn read<R: Read>(
        reader: R,
        name: &str,
        options: &CsvReadOptions,
    ) -> CsvResult<SheetGrid> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(options.delimiter)
            .quote(options.quote)
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut grid = SheetGrid::new(name);

        for (row_idx, result) in csv_reader.records().enumerate() {
            if row_idx as u64 >= MAX_ROWS as u64 {
                return Err(CsvError::Core(Error::RowOutOfBounds(
                    row_idx as u32,
                    MAX_ROWS - 1,
                )));
            }
            let record = result?;
            if record.len() > MAX_COLS as usize {
                return Err(CsvError::Core(Error::ColumnOutOfBounds(
                    record.len() as u32 - 1,
                    MAX_COLS - 1,
                )));
            }

            let row = record
                .iter()
                .map(|field| Self::to_value(field, options))
                .collect();
            grid.push_row(row);
        }

        Ok(grid)
    }

    fn to_value(field: &str, options: &CsvReadOptions) -> GridValue {
        let trimmed = field.trim();
        if options.detect_formulas && trimmed.len() > 1 && trimmed.starts_with('=') {
            return GridValue::formula("", trimmed);
        }
        GridValue::text(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn test_read_values_and_formulas() {
        let data = "Item,Q1,Q2\nRevenue,100,120\nTotal,=SUM(B2:B2),\"1,200\"\n";
        let grid =
            CsvReader::read(data.as_bytes(), "Budget", &CsvReadOptions::default()).unwrap();

        assert_eq!(grid.name(), "Budget");
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.column_header(2), Some("Q1"));

        let total = grid.get_at(2, 1).unwrap();
        assert_eq!(total.formula.as_deref(), Some("=SUM(B2:B2)"));
        assert_eq!(total.text, "");
        assert_eq!(grid.get_at(2, 2).unwrap().text, "1,200");
    }

    #[test]
    fn test_formula_detection_can_be_disabled() {
        let options = CsvReadOptions {
            detect_formulas: false,
            ..CsvReadOptions::default()
        };
        let grid = CsvReader::read("A\n=1+1\n=\n".as_bytes(), "S", &options).unwrap();
        assert_eq!(grid.get_at(1, 0).unwrap(), &GridValue::text("=1+1"));

        // A lone "=" is never a formula
        let grid =
            CsvReader::read("A\n=\n".as_bytes(), "S", &CsvReadOptions::default()).unwrap();
        assert!(grid.get_at(1, 0).unwrap().formula.is_none());
    }

    #[test]
    fn test_ragged_rows_and_tabs() {
        let data = "a\tb\tc\n1\n2\t3\n";
        let grid = CsvReader::read(data.as_bytes(), "S", &CsvReadOptions::tsv()).unwrap();
        assert_eq!(grid.row_count(), 3);
        assert_eq!(grid.col_count(), 3);
        assert_eq!(grid.rows()[1].len(), 1);
    }

    #[test]
    fn test_read_file_uses_stem() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Forecast 2024.csv");
        let mut file = File::create(&path).unwrap();
        writeln!(file, "Month,Sales").unwrap();
        writeln!(file, "Jan,10").unwrap();
        drop(file);

        let grid = CsvReader::read_file(&path, &CsvReadOptions::default()).unwrap();
        assert_eq!(grid.name(), "Forecast 2024");
        assert_eq!(grid.row_count(), 2);

        let options = CsvReadOptions {
            sheet_name: Some("Override".into()),
            ..CsvReadOptions::default()
        };
        let grid = CsvReader::read_file(&path, &options).unwrap();
        assert_eq!(grid.name(), "Override");
    }

    #[test]
    fn test_missing_file() {
        let err = CsvReader::read_file("/nonexistent/cellscope.csv", &CsvReadOptions::default())
            .unwrap_err();
        assert!(matches!(err, CsvError::Io(_)));
    }
}

//! A1-style cell addresses and rectangular ranges

use crate::error::{Error, Result};
use crate::{MAX_COLS, MAX_ROWS};
use std::fmt;
use std::str::FromStr;

/// A cell position, 0-based internally
///
/// The `$` markers of an A1 reference are kept so that formula analysis can
/// tell absolute from relative references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellAddress {
    pub row: u32,
    /// A = 0
    pub col: u16,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellAddress {
    /// Relative address from 0-based indices
    pub fn new(row: u32, col: u16) -> Self {
        Self::with_absolute(row, col, false, false)
    }

    pub fn with_absolute(row: u32, col: u16, row_absolute: bool, col_absolute: bool) -> Self {
        Self {
            row,
            col,
            row_absolute,
            col_absolute,
        }
    }

    /// Address from 1-based row and column numbers, as used by documents
    ///
    /// # Examples
    /// ```
    /// use cellscope_core::CellAddress;
    ///
    /// let addr = CellAddress::from_one_based(2, 3).unwrap();
    /// assert_eq!(addr.to_string(), "C2");
    /// ```
    pub fn from_one_based(row: u32, col: u32) -> Result<Self> {
        if !(1..=MAX_ROWS).contains(&row) {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }
        if !(1..=MAX_COLS as u32).contains(&col) {
            return Err(Error::ColumnOutOfBounds(col, MAX_COLS));
        }
        Ok(Self::new(row - 1, (col - 1) as u16))
    }

    /// 1-based (row, column) pair
    pub fn one_based(&self) -> (u32, u32) {
        (self.row + 1, u32::from(self.col) + 1)
    }

    /// Whether either component carries a `$` marker
    pub fn is_absolute(&self) -> bool {
        self.row_absolute || self.col_absolute
    }

    /// Parse `[$]letters[$]digits`
    ///
    /// # Examples
    /// ```
    /// use cellscope_core::CellAddress;
    ///
    /// let addr = CellAddress::parse("$B$2").unwrap();
    /// assert_eq!((addr.row, addr.col), (1, 1));
    /// assert!(addr.row_absolute && addr.col_absolute);
    /// ```
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let invalid = |why: &str| Error::InvalidAddress(format!("{why} in '{text}'"));

        let (col_absolute, rest) = match text.strip_prefix('$') {
            Some(rest) => (true, rest),
            None => (false, text),
        };
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .unwrap_or(rest.len());
        let (letters, rest) = rest.split_at(split);
        if letters.is_empty() {
            return Err(invalid("no column letters"));
        }
        let col = Self::letters_to_column(letters)?;

        let (row_absolute, digits) = match rest.strip_prefix('$') {
            Some(digits) => (true, digits),
            None => (false, rest),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid("no row number"));
        }
        let row: u32 = digits.parse().map_err(|_| invalid("row number too large"))?;
        if row == 0 {
            return Err(invalid("row 0"));
        }
        if row > MAX_ROWS {
            return Err(Error::RowOutOfBounds(row, MAX_ROWS));
        }

        Ok(Self::with_absolute(row - 1, col, row_absolute, col_absolute))
    }

    /// Column letters for a 0-based index: 0 = A, 26 = AA
    pub fn column_to_letters(col: u16) -> String {
        let mut letters = Vec::with_capacity(3);
        let mut n = u32::from(col) + 1;
        while n > 0 {
            let digit = (n - 1) % 26;
            letters.push(b'A' + digit as u8);
            n = (n - 1) / 26;
        }
        letters.iter().rev().map(|&b| b as char).collect()
    }

    /// 0-based index for column letters (case-insensitive)
    pub fn letters_to_column(letters: &str) -> Result<u16> {
        if letters.is_empty() || !letters.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(Error::InvalidAddress(format!("bad column letters '{letters}'")));
        }
        let mut n: u32 = 0;
        for b in letters.bytes() {
            n = n * 26 + u32::from(b.to_ascii_uppercase() - b'A') + 1;
            if n > u32::from(MAX_COLS) {
                return Err(Error::ColumnOutOfBounds(n, MAX_COLS));
            }
        }
        Ok((n - 1) as u16)
    }

    pub fn to_a1_string(&self) -> String {
        format!(
            "{}{}{}{}",
            if self.col_absolute { "$" } else { "" },
            Self::column_to_letters(self.col),
            if self.row_absolute { "$" } else { "" },
            self.row + 1
        )
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

impl FromStr for CellAddress {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// A rectangular block of cells, stored top-left to bottom-right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CellRange {
    pub start: CellAddress,
    pub end: CellAddress,
}

impl CellRange {
    /// Range spanning two corners in any order
    ///
    /// `$` markers follow the corner they were written on.
    pub fn new(a: CellAddress, b: CellAddress) -> Self {
        let start = CellAddress::with_absolute(
            a.row.min(b.row),
            a.col.min(b.col),
            a.row_absolute,
            a.col_absolute,
        );
        let end = CellAddress::with_absolute(
            a.row.max(b.row),
            a.col.max(b.col),
            b.row_absolute,
            b.col_absolute,
        );
        Self { start, end }
    }

    /// Parse `A1:B10`, or a single address
    pub fn parse(s: &str) -> Result<Self> {
        let text = s.trim();
        let wrap = |e: Error| Error::InvalidRange(format!("'{text}': {e}"));
        match text.split_once(':') {
            Some((a, b)) => Ok(Self::new(
                CellAddress::parse(a).map_err(wrap)?,
                CellAddress::parse(b).map_err(wrap)?,
            )),
            None => CellAddress::parse(text).map(|addr| Self::new(addr, addr)),
        }
    }

    /// Whether either corner carries a `$` marker
    pub fn is_absolute(&self) -> bool {
        self.start.is_absolute() || self.end.is_absolute()
    }

    /// `A1:B10`, or just `A1` for a single cell
    pub fn to_a1_string(&self) -> String {
        if self.start == self.end {
            self.start.to_a1_string()
        } else {
            format!("{}:{}", self.start, self.end)
        }
    }
}

impl fmt::Display for CellRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_a1_string())
    }
}

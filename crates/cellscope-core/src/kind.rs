//! Cell content kinds

use std::fmt;

/// What a cell holds, as seen by the indexer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum CellKind {
    Number,
    Text,
    Date,
    Percentage,
    Formula,
}

impl CellKind {
    /// Detect the kind of a cell from its displayed text and formula
    ///
    /// A formula always wins. Otherwise a trailing `%` means percentage,
    /// a number (ignoring `$` and thousands separators) means number, and
    /// ISO (`2024-01-31`) or US (`1/31/2024`) dates mean date.
    pub fn detect(text: &str, formula: Option<&str>) -> Self {
        if formula.map_or(false, |f| f.trim_start().starts_with('=')) {
            return CellKind::Formula;
        }

        let text = text.trim();
        if text.is_empty() {
            return CellKind::Text;
        }

        if let Some(number) = text.strip_suffix('%') {
            if parse_number(number).is_some() {
                return CellKind::Percentage;
            }
        }

        if parse_number(text).is_some() {
            return CellKind::Number;
        }

        if is_date(text) {
            return CellKind::Date;
        }

        CellKind::Text
    }

    /// Lowercase name
    pub fn as_str(&self) -> &'static str {
        match self {
            CellKind::Number => "number",
            CellKind::Text => "text",
            CellKind::Date => "date",
            CellKind::Percentage => "percentage",
            CellKind::Formula => "formula",
        }
    }
}

impl fmt::Display for CellKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a displayed number, tolerating currency symbols and separators
fn parse_number(text: &str) -> Option<f64> {
    let cleaned: String = text
        .trim()
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | ' '))
        .collect();
    if cleaned.is_empty() {
        return None;
    }
    // Accounting negatives: (1,234)
    let cleaned = match cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner),
        None => cleaned,
    };
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_date(text: &str) -> bool {
    let all_digits = |s: &str, min: usize, max: usize| {
        (min..=max).contains(&s.len()) && s.chars().all(|c| c.is_ascii_digit())
    };

    let iso: Vec<&str> = text.split('-').collect();
    if iso.len() == 3
        && all_digits(iso[0], 4, 4)
        && all_digits(iso[1], 1, 2)
        && all_digits(iso[2], 1, 2)
    {
        return true;
    }

    let us: Vec<&str> = text.split('/').collect();
    us.len() == 3 && all_digits(us[0], 1, 2) && all_digits(us[1], 1, 2) && all_digits(us[2], 2, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_kinds() {
        assert_eq!(CellKind::detect("42", None), CellKind::Number);
        assert_eq!(CellKind::detect("$1,250.50", None), CellKind::Number);
        assert_eq!(CellKind::detect("(300)", None), CellKind::Number);
        assert_eq!(CellKind::detect("12.5%", None), CellKind::Percentage);
        assert_eq!(CellKind::detect("2024-03-31", None), CellKind::Date);
        assert_eq!(CellKind::detect("3/31/2024", None), CellKind::Date);
        assert_eq!(CellKind::detect("Revenue", None), CellKind::Text);
        assert_eq!(CellKind::detect("%", None), CellKind::Text);
        assert_eq!(CellKind::detect("300", Some("=SUM(B2:B4)")), CellKind::Formula);
    }

    #[test]
    fn test_display() {
        assert_eq!(CellKind::Percentage.to_string(), "percentage");
    }
}

//! Runtime values produced by parsing and evaluation

use gridcalc_core::{CellAddress, CellRange};
use std::fmt;

/// Value types flowing through evaluation
///
/// Errors are not values: they travel on the `Err` side of
/// [`FormulaResult`](crate::FormulaResult).
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Number(f64),
    Text(String),
    Boolean(bool),
    /// A read-only view over a rectangle of cells
    Table(Table),
}

/// A rectangular, row-major view over a block of cells.
///
/// A table only records its geometry; element values are read through the
/// evaluator's cell resolver when a function walks it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Table {
    range: CellRange,
}

impl Table {
    /// Create a table over `range` (normalized to top-left / bottom-right)
    pub fn new(range: CellRange) -> Self {
        Self {
            range: CellRange::from_indices(
                range.start.row,
                range.start.col,
                range.end.row,
                range.end.col,
            ),
        }
    }

    /// The covered range
    pub fn range(&self) -> CellRange {
        self.range
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.range.row_count()
    }

    /// Number of columns
    pub fn columns(&self) -> u32 {
        self.range.col_count()
    }

    /// Grid coordinate of the element at zero-based (`row`, `col`) inside the table
    pub fn cell_at(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        if row < self.rows() && col < self.columns() {
            Some((self.range.start.row + row, self.range.start.col + col))
        } else {
            None
        }
    }

    /// Grid coordinates of every element, row-major
    pub fn cells(&self) -> impl Iterator<Item = (u32, u32)> {
        self.range.cells().map(|addr: CellAddress| (addr.row, addr.col))
    }
}

impl Value {
    /// Short type name used in error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Number(_) => "number",
            Value::Text(_) => "text",
            Value::Boolean(_) => "boolean",
            Value::Table(_) => "table",
        }
    }

    /// Get the number if this is one
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Get the text if this is text
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Get the boolean if this is one
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    /// Check if this is a table
    pub fn is_table(&self) -> bool {
        matches!(self, Value::Table(_))
    }

    /// Render a scalar as text (`TRUE`/`FALSE` for booleans); `None` for tables
    pub fn to_text(&self) -> Option<String> {
        match self {
            Value::Number(n) => Some(format_number(*n)),
            Value::Text(s) => Some(s.clone()),
            Value::Boolean(true) => Some("TRUE".to_string()),
            Value::Boolean(false) => Some("FALSE".to_string()),
            Value::Table(_) => None,
        }
    }

    /// Interpret a scalar as a boolean; `None` for tables
    ///
    /// Text is false only when empty, `"0"`, or `"false"` in any case.
    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            Value::Number(n) => Some(*n != 0.0),
            Value::Text(s) => Some(!(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))),
            Value::Table(_) => None,
        }
    }

    /// Type raw user input by its content
    ///
    /// Boolean keywords become booleans, decimal numbers become numbers and
    /// anything else is kept as text. Blank input yields `None`.
    pub fn sniff(input: &str) -> Option<Value> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return None;
        }
        if trimmed.eq_ignore_ascii_case("TRUE") {
            return Some(Value::Boolean(true));
        }
        if trimmed.eq_ignore_ascii_case("FALSE") {
            return Some(Value::Boolean(false));
        }
        if let Some(n) = parse_number(trimmed) {
            return Some(Value::Number(n));
        }
        Some(Value::Text(input.to_string()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => f.write_str(&format_number(*n)),
            Value::Text(s) => f.write_str(s),
            Value::Boolean(true) => f.write_str("TRUE"),
            Value::Boolean(false) => f.write_str("FALSE"),
            Value::Table(t) => write!(f, "{}", t.range()),
        }
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Number(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

/// Format a number the way cells display it: integers without a fraction,
/// everything else in shortest round-trip form.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Parse plain decimal notation (`12`, `-3.5`, `.5`, `1e10`)
///
/// Unlike `str::parse::<f64>`, words such as `inf` or `NaN` are rejected.
pub fn parse_number(s: &str) -> Option<f64> {
    let s = s.trim();
    if s.is_empty()
        || !s
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
        || !s.chars().any(|c| c.is_ascii_digit())
    {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(5.0), "5");
        assert_eq!(format_number(-12.0), "-12");
        assert_eq!(format_number(2.5), "2.5");
        assert_eq!(format_number(0.1 + 0.2), "0.30000000000000004");
    }

    #[test]
    fn test_parse_number() {
        assert_eq!(parse_number("42"), Some(42.0));
        assert_eq!(parse_number(" -3.5 "), Some(-3.5));
        assert_eq!(parse_number(".5"), Some(0.5));
        assert_eq!(parse_number("1e3"), Some(1000.0));
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("12abc"), None);
        assert_eq!(parse_number("-"), None);
        assert_eq!(parse_number(""), None);
    }

    #[test]
    fn test_text_to_boolean() {
        assert_eq!(Value::from("").to_boolean(), Some(false));
        assert_eq!(Value::from("0").to_boolean(), Some(false));
        assert_eq!(Value::from("FaLsE").to_boolean(), Some(false));
        assert_eq!(Value::from("no").to_boolean(), Some(true));
        assert_eq!(Value::from(" ").to_boolean(), Some(true));
    }

    #[test]
    fn test_to_text() {
        assert_eq!(Value::Boolean(true).to_text().as_deref(), Some("TRUE"));
        assert_eq!(Value::Boolean(false).to_text().as_deref(), Some("FALSE"));
        assert_eq!(Value::Number(3.0).to_text().as_deref(), Some("3"));
        let table = Table::new(CellRange::parse("A1:B2").unwrap());
        assert_eq!(Value::Table(table).to_text(), None);
    }

    #[test]
    fn test_sniff() {
        assert_eq!(Value::sniff("5"), Some(Value::Number(5.0)));
        assert_eq!(Value::sniff("true"), Some(Value::Boolean(true)));
        assert_eq!(Value::sniff("FALSE"), Some(Value::Boolean(false)));
        assert_eq!(Value::sniff("x"), Some(Value::Text("x".into())));
        assert_eq!(Value::sniff(" hi "), Some(Value::Text(" hi ".into())));
        assert_eq!(Value::sniff("   "), None);
    }

    #[test]
    fn test_table_geometry() {
        let table = Table::new(CellRange::parse("B2:D3").unwrap());
        assert_eq!(table.rows(), 2);
        assert_eq!(table.columns(), 3);
        assert_eq!(table.cell_at(0, 0), Some((1, 1)));
        assert_eq!(table.cell_at(1, 2), Some((2, 3)));
        assert_eq!(table.cell_at(2, 0), None);
        assert_eq!(table.cells().count(), 6);
    }
}

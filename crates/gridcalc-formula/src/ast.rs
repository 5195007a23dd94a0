//! Formula Abstract Syntax Tree types

use crate::value::{format_number, Value};
use gridcalc_core::{CellAddress, CellRange};
use std::fmt;

/// A node of a parsed formula
///
/// `position` is the zero-based character offset of the node in the formula
/// source. Operators and calls point at the operator or function name.
#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub position: usize,
}

/// Formula expression variants
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// Number, text or boolean literal
    Literal(Value),
    /// Single cell reference
    CellRef(CellRef),
    /// Range reference
    RangeRef(RangeRef),
    /// Unary operation
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    /// Binary operation
    BinaryOp {
        op: BinaryOperator,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    /// Function call; `name` is upper case
    Call { name: String, args: Vec<Expr> },
}

/// A reference to one cell, relative unless an axis is marked `$`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CellRef {
    pub row: u32,
    pub col: u32,
    pub row_absolute: bool,
    pub col_absolute: bool,
}

impl CellRef {
    /// Create a relative reference
    pub fn new(row: u32, col: u32) -> Self {
        Self {
            row,
            col,
            row_absolute: false,
            col_absolute: false,
        }
    }

    /// The referenced address, absolute flags included
    pub fn address(&self) -> CellAddress {
        CellAddress::with_absolute(self.row, self.col, self.row_absolute, self.col_absolute)
    }
}

impl From<CellAddress> for CellRef {
    fn from(addr: CellAddress) -> Self {
        Self {
            row: addr.row,
            col: addr.col,
            row_absolute: addr.row_absolute,
            col_absolute: addr.col_absolute,
        }
    }
}

impl fmt::Display for CellRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.address().to_a1_string())
    }
}

/// A reference to a rectangle of cells, kept as written (corners are not reordered)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RangeRef {
    pub start: CellRef,
    pub end: CellRef,
}

impl RangeRef {
    /// The normalized rectangle
    pub fn range(&self) -> CellRange {
        CellRange::from_indices(self.start.row, self.start.col, self.end.row, self.end.col)
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.start, self.end)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Subtract,
    Multiply,
    Divide,

    // Comparison
    Equal,
    NotEqual,
    LessThan,
    LessEqual,
    GreaterThan,
    GreaterEqual,
}

impl BinaryOperator {
    /// Name of the catalog function implementing this operator
    pub fn function_name(self) -> &'static str {
        match self {
            BinaryOperator::Add => "ADD",
            BinaryOperator::Subtract => "MINUS",
            BinaryOperator::Multiply => "MULTIPLY",
            BinaryOperator::Divide => "DIVIDE",
            BinaryOperator::Equal => "EQ",
            BinaryOperator::NotEqual => "NE",
            BinaryOperator::LessThan => "LT",
            BinaryOperator::LessEqual => "LTE",
            BinaryOperator::GreaterThan => "GT",
            BinaryOperator::GreaterEqual => "GTE",
        }
    }

    /// Operator as written in formula source
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Subtract => "-",
            BinaryOperator::Multiply => "*",
            BinaryOperator::Divide => "/",
            BinaryOperator::Equal => "=",
            BinaryOperator::NotEqual => "<>",
            BinaryOperator::LessThan => "<",
            BinaryOperator::LessEqual => "<=",
            BinaryOperator::GreaterThan => ">",
            BinaryOperator::GreaterEqual => ">=",
        }
    }

    /// Check if this is a comparison operator
    pub fn is_comparison(self) -> bool {
        self.precedence() == COMPARISON
    }

    fn precedence(self) -> u8 {
        match self {
            BinaryOperator::Add | BinaryOperator::Subtract => ADDITIVE,
            BinaryOperator::Multiply | BinaryOperator::Divide => MULTIPLICATIVE,
            _ => COMPARISON,
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Negate,
}

impl UnaryOperator {
    /// Name of the catalog function implementing this operator
    pub fn function_name(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "UMINUS",
        }
    }

    /// Operator as written in formula source
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOperator::Negate => "-",
        }
    }
}

// Binding strength, loosest first
const COMPARISON: u8 = 1;
const ADDITIVE: u8 = 2;
const MULTIPLICATIVE: u8 = 3;
const UNARY: u8 = 4;
const PRIMARY: u8 = 5;

impl Expr {
    /// Create a node at `position`
    pub fn new(kind: ExprKind, position: usize) -> Self {
        Self { kind, position }
    }

    /// Create a literal node
    pub fn literal(value: impl Into<Value>, position: usize) -> Self {
        Self::new(ExprKind::Literal(value.into()), position)
    }

    fn precedence(&self) -> u8 {
        match &self.kind {
            ExprKind::BinaryOp { op, .. } => op.precedence(),
            ExprKind::UnaryOp { .. } => UNARY,
            _ => PRIMARY,
        }
    }

    fn fmt_child(&self, f: &mut fmt::Formatter<'_>, parenthesize: bool) -> fmt::Result {
        if parenthesize {
            write!(f, "({})", self)
        } else {
            write!(f, "{}", self)
        }
    }
}

/// Renders canonical formula source (no leading `=`) with the fewest
/// parentheses that preserve the tree shape.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Literal(Value::Number(n)) => f.write_str(&format_number(*n)),
            ExprKind::Literal(Value::Text(s)) => write!(f, "\"{}\"", s.replace('"', "\"\"")),
            ExprKind::Literal(Value::Boolean(b)) => {
                f.write_str(if *b { "TRUE" } else { "FALSE" })
            }
            ExprKind::Literal(Value::Table(table)) => write!(f, "{}", table.range()),
            ExprKind::CellRef(cell) => write!(f, "{}", cell),
            ExprKind::RangeRef(range) => write!(f, "{}", range),
            ExprKind::UnaryOp { op, operand } => {
                f.write_str(op.symbol())?;
                operand.fmt_child(f, operand.precedence() < UNARY)
            }
            ExprKind::BinaryOp { op, left, right } => {
                let prec = op.precedence();
                // Comparisons do not chain, so either side at the same level needs parens
                let left_parens = if op.is_comparison() {
                    left.precedence() <= prec
                } else {
                    left.precedence() < prec
                };
                left.fmt_child(f, left_parens)?;
                f.write_str(op.symbol())?;
                right.fmt_child(f, right.precedence() <= prec)
            }
            ExprKind::Call { name, args } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", arg)?;
                }
                f.write_str(")")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(n: f64) -> Expr {
        Expr::literal(n, 0)
    }

    fn binary(op: BinaryOperator, left: Expr, right: Expr) -> Expr {
        Expr::new(
            ExprKind::BinaryOp {
                op,
                left: Box::new(left),
                right: Box::new(right),
            },
            0,
        )
    }

    #[test]
    fn test_display_literals() {
        assert_eq!(num(2.5).to_string(), "2.5");
        assert_eq!(Expr::literal("say \"hi\"", 0).to_string(), "\"say \"\"hi\"\"\"");
        assert_eq!(Expr::literal(true, 0).to_string(), "TRUE");
    }

    #[test]
    fn test_display_minimal_parens() {
        let sum = binary(BinaryOperator::Add, num(1.0), num(2.0));
        let product = binary(BinaryOperator::Multiply, sum.clone(), num(3.0));
        assert_eq!(product.to_string(), "(1+2)*3");

        let nested = binary(BinaryOperator::Add, num(1.0), product);
        assert_eq!(nested.to_string(), "1+(1+2)*3");

        let right_nested = binary(
            BinaryOperator::Subtract,
            num(1.0),
            binary(BinaryOperator::Subtract, num(2.0), num(3.0)),
        );
        assert_eq!(right_nested.to_string(), "1-(2-3)");

        let left_nested = binary(BinaryOperator::Subtract, sum, num(3.0));
        assert_eq!(left_nested.to_string(), "1+2-3");
    }

    #[test]
    fn test_display_comparison_and_unary() {
        let less = binary(BinaryOperator::LessThan, num(1.0), num(2.0));
        let chained = binary(BinaryOperator::Equal, less, Expr::literal(true, 0));
        assert_eq!(chained.to_string(), "(1<2)=TRUE");

        let negated = Expr::new(
            ExprKind::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(binary(BinaryOperator::Add, num(1.0), num(2.0))),
            },
            0,
        );
        assert_eq!(negated.to_string(), "-(1+2)");
    }

    #[test]
    fn test_display_references_and_calls() {
        let range = RangeRef {
            start: CellRef::from(CellAddress::parse("$A1").unwrap()),
            end: CellRef::new(2, 1),
        };
        let call = Expr::new(
            ExprKind::Call {
                name: "SUM".into(),
                args: vec![Expr::new(ExprKind::RangeRef(range), 4), num(1.0)],
            },
            0,
        );
        assert_eq!(call.to_string(), "SUM($A1:B3,1)");
        assert_eq!(range.range(), CellRange::parse("A1:B3").unwrap());
    }
}

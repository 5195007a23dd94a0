//! Formula evaluator
//!
//! Evaluates formula ASTs to produce values.

use crate::ast::{Expr, ExprKind};
use crate::error::{FormulaError, FormulaResult};
use crate::functions::{registry, CallContext, FunctionRegistry};
use crate::value::{Table, Value};
use gridcalc_core::{CellRange, GridLimits};

/// Read access to already-computed cell values
pub trait CellResolver {
    /// Value of a cell: `Ok(None)` for a blank cell, `Err` for a cell holding an error
    fn resolve(&self, row: u32, col: u32) -> FormulaResult<Option<Value>>;

    /// Whether the address lies on the grid
    fn contains(&self, row: u32, col: u32) -> bool {
        GridLimits::default().contains(row, col)
    }
}

impl<F> CellResolver for F
where
    F: Fn(u32, u32) -> FormulaResult<Option<Value>>,
{
    fn resolve(&self, row: u32, col: u32) -> FormulaResult<Option<Value>> {
        self(row, col)
    }
}

/// Evaluate a formula expression with the built-in functions
pub fn evaluate(expr: &Expr, cells: &dyn CellResolver) -> FormulaResult<Value> {
    evaluate_with(expr, cells, registry())
}

/// Evaluate a formula expression against a specific function registry
pub fn evaluate_with(
    expr: &Expr,
    cells: &dyn CellResolver,
    functions: &FunctionRegistry,
) -> FormulaResult<Value> {
    match &expr.kind {
        ExprKind::Literal(value) => Ok(value.clone()),

        ExprKind::CellRef(cell) => {
            if !cells.contains(cell.row, cell.col) {
                return Err(FormulaError::InvalidReference {
                    reference: cell.to_string(),
                    position: expr.position,
                });
            }
            // Blank cells read as zero
            Ok(cells
                .resolve(cell.row, cell.col)?
                .unwrap_or(Value::Number(0.0)))
        }

        ExprKind::RangeRef(range) => {
            let on_grid = cells.contains(range.start.row, range.start.col)
                && cells.contains(range.end.row, range.end.col);
            if !on_grid {
                return Err(FormulaError::InvalidReference {
                    reference: range.to_string(),
                    position: expr.position,
                });
            }
            Ok(Value::Table(Table::new(range.range())))
        }

        ExprKind::UnaryOp { op, operand } => {
            let value = evaluate_with(operand, cells, functions)?;
            functions.call(op.function_name(), &[value], expr.position, cells)
        }

        ExprKind::BinaryOp { op, left, right } => {
            let left = evaluate_with(left, cells, functions)?;
            let right = evaluate_with(right, cells, functions)?;
            functions.call(op.function_name(), &[left, right], expr.position, cells)
        }

        ExprKind::Call { name, args } => {
            let def = functions
                .get(name)
                .ok_or_else(|| FormulaError::UnknownFunction {
                    name: name.clone(),
                    position: expr.position,
                })?;
            def.check_arity(args.len(), expr.position)?;

            // Left to right; the first error wins
            let mut evaluated_args = Vec::with_capacity(args.len());
            for arg in args {
                evaluated_args.push(evaluate_with(arg, cells, functions)?);
            }

            (def.implementation)(
                &evaluated_args,
                &CallContext::new(def.name, expr.position, cells),
            )
        }
    }
}

/// A reference written in a formula
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reference {
    /// Normalized rectangle (a single cell for cell references)
    pub range: CellRange,
    /// Offset of the reference in the formula source
    pub position: usize,
}

/// Every cell or range reference in `expr`, in source order
pub fn references(expr: &Expr) -> Vec<Reference> {
    let mut out = Vec::new();
    collect_references(expr, &mut out);
    out
}

fn collect_references(expr: &Expr, out: &mut Vec<Reference>) {
    match &expr.kind {
        ExprKind::Literal(_) => {}
        ExprKind::CellRef(cell) => out.push(Reference {
            range: CellRange::from_indices(cell.row, cell.col, cell.row, cell.col),
            position: expr.position,
        }),
        ExprKind::RangeRef(range) => out.push(Reference {
            range: range.range(),
            position: expr.position,
        }),
        ExprKind::UnaryOp { operand, .. } => collect_references(operand, out),
        ExprKind::BinaryOp { left, right, .. } => {
            collect_references(left, out);
            collect_references(right, out);
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                collect_references(arg, out);
            }
        }
    }
}

/// Every cell `expr` reads, ranges expanded and clipped to `limits`
///
/// Cells are yielded once each, in the order they are first referenced.
pub fn referenced_cells(expr: &Expr, limits: &GridLimits) -> Vec<(u32, u32)> {
    let mut seen = ahash::AHashSet::new();
    let mut cells = Vec::new();
    for reference in references(expr) {
        if let Some(range) = limits.clip(&reference.range) {
            for addr in range.cells() {
                if seen.insert((addr.row, addr.col)) {
                    cells.push((addr.row, addr.col));
                }
            }
        }
    }
    cells
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::functions::test_support::{eval, eval_with, num, text};
    use crate::parser::parse;

    #[test]
    fn test_evaluate_number() {
        assert_eq!(eval("42"), Ok(num(42.0)));
        assert_eq!(eval("3.14"), Ok(num(3.14)));
    }

    #[test]
    fn test_evaluate_string() {
        assert_eq!(eval("\"Hello\""), Ok(text("Hello")));
    }

    #[test]
    fn test_evaluate_boolean() {
        assert_eq!(eval("TRUE"), Ok(Value::Boolean(true)));
        assert_eq!(eval("FALSE"), Ok(Value::Boolean(false)));
    }

    #[test]
    fn test_evaluate_arithmetic() {
        assert_eq!(eval("1+2"), Ok(num(3.0)));
        assert_eq!(eval("5-3"), Ok(num(2.0)));
        assert_eq!(eval("4*3"), Ok(num(12.0)));
        assert_eq!(eval("10/4"), Ok(num(2.5)));
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(eval("1+2*3"), Ok(num(7.0)));
        assert_eq!(eval("(1+2)*3"), Ok(num(9.0)));
        assert_eq!(eval("2*-3"), Ok(num(-6.0)));
        assert_eq!(eval("-2+5"), Ok(num(3.0)));
    }

    #[test]
    fn test_evaluate_comparison() {
        assert_eq!(eval("5>3"), Ok(Value::Boolean(true)));
        assert_eq!(eval("1+1=2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("\"a\"<>\"b\""), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_evaluate_division_by_zero() {
        let err = eval("1/0").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula);
        assert_eq!(err.position(), Some(1));
    }

    #[test]
    fn test_cell_references() {
        let cells = [("A1", num(2.0)), ("B2", text("x"))];
        assert_eq!(eval_with("A1*10", &cells), Ok(num(20.0)));
        assert_eq!(eval_with("B2", &cells), Ok(text("x")));
        // Blank cells read as zero
        assert_eq!(eval_with("C3+1", &cells), Ok(num(1.0)));
    }

    #[test]
    fn test_text_operand_is_type_error() {
        let cells = [("A1", text("x"))];
        let err = eval_with("A1+1", &cells).unwrap_err();
        assert_eq!(
            err,
            FormulaError::ArgumentType {
                function: "ADD".into(),
                expected: "number",
                actual: "text",
                position: 2,
            }
        );
    }

    #[test]
    fn test_errored_cell_propagates_unchanged() {
        let stored = FormulaError::domain("SQRT", "negative argument", 0);
        let sheet = {
            let stored = stored.clone();
            move |row: u32, col: u32| -> FormulaResult<Option<Value>> {
                if (row, col) == (0, 0) {
                    Err(stored.clone())
                } else {
                    Ok(None)
                }
            }
        };
        let expr = parse("1+A1*2").unwrap().unwrap();
        assert_eq!(evaluate(&expr, &sheet), Err(stored));
    }

    #[test]
    fn test_off_grid_reference() {
        struct Small;
        impl CellResolver for Small {
            fn resolve(&self, _row: u32, _col: u32) -> FormulaResult<Option<Value>> {
                Ok(None)
            }
            fn contains(&self, row: u32, col: u32) -> bool {
                GridLimits::new(10, 10).contains(row, col)
            }
        }

        let expr = parse("1+K1").unwrap().unwrap();
        assert_eq!(
            evaluate(&expr, &Small),
            Err(FormulaError::InvalidReference {
                reference: "K1".into(),
                position: 2,
            })
        );

        let expr = parse("SUM(A1:A11)").unwrap().unwrap();
        let err = evaluate(&expr, &Small).unwrap_err();
        assert_eq!(err.position(), Some(4));
    }

    #[test]
    fn test_table_where_scalar_required() {
        let err = eval("A1:B2+1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentType);
    }

    #[test]
    fn test_first_argument_error_wins() {
        let err = eval("SUM(1/0, NOPE())").unwrap_err();
        assert_eq!(err, FormulaError::domain("DIVIDE", "division by zero", 5));
    }

    #[test]
    fn test_evaluate_nested_functions() {
        assert_eq!(eval("SUM(1, ABS(-2), MAX(3, 4))"), Ok(num(7.0)));
        assert_eq!(eval("IF(AND(2>1, NOT(FALSE)), \"yes\", \"no\")"), Ok(text("yes")));
    }

    #[test]
    fn test_references() {
        let expr = parse("SUM(A1:B2)+$C$3*IF(TRUE, D4, 0)").unwrap().unwrap();
        let refs = references(&expr);
        assert_eq!(refs.len(), 3);
        assert_eq!(refs[0].range, CellRange::parse("A1:B2").unwrap());
        assert_eq!(refs[0].position, 4);
        assert_eq!(refs[1].range, CellRange::parse("C3").unwrap());

        let cells = referenced_cells(&expr, &GridLimits::default());
        assert_eq!(cells, vec![(0, 0), (0, 1), (1, 0), (1, 1), (2, 2), (3, 3)]);
    }

    #[test]
    fn test_referenced_cells_clipped() {
        let expr = parse("SUM(B2:Z100)+A1+A1").unwrap().unwrap();
        let cells = referenced_cells(&expr, &GridLimits::new(3, 3));
        assert_eq!(cells, vec![(1, 1), (1, 2), (2, 1), (2, 2), (0, 0)]);
    }

    #[test]
    fn test_reference_free_evaluation_is_repeatable() {
        let expr = parse("CONCAT(ROUND(PI()*2, 3), \"!\")").unwrap().unwrap();
        let empty = |_: u32, _: u32| -> FormulaResult<Option<Value>> { Ok(None) };
        assert_eq!(evaluate(&expr, &empty), evaluate(&expr, &empty));
        assert_eq!(evaluate(&expr, &empty), Ok(text("6.283!")));
    }
}

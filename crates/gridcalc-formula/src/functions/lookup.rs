//! Lookup functions
//!
//! These read table geometry directly and only resolve the cells they return
//! or compare against.

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::Value;

/// Convert a 1-based index argument to a 0-based offset below `len`
fn index_arg(value: &Value, len: u32, what: &str, ctx: &CallContext<'_>) -> FormulaResult<u32> {
    let n = ctx.integer(value)?;
    if n < 1.0 || n > len as f64 {
        return Err(ctx.domain_error(format!(
            "{} index {} is out of range 1..={}",
            what, n, len
        )));
    }
    Ok(n as u32 - 1)
}

/// INDEX(table, row, [column]) - 1-based; the column may be omitted for a single column
pub fn fn_index(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let table = ctx.table(&args[0])?;
    let row = index_arg(&args[1], table.rows(), "row", ctx)?;
    let col = match args.get(2) {
        Some(col) => index_arg(col, table.columns(), "column", ctx)?,
        None if table.columns() == 1 => 0,
        None => {
            return Err(ctx.domain_error(format!(
                "a column index is required for a table with {} columns",
                table.columns()
            )))
        }
    };

    match table.cell_at(row, col) {
        // Blank cells read as zero, like a direct reference
        Some((r, c)) => Ok(ctx.cells.resolve(r, c)?.unwrap_or(Value::Number(0.0))),
        None => Err(ctx.domain_error("index outside the table")),
    }
}

/// ROWS(table)
pub fn fn_rows(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ctx.table(&args[0])?.rows() as f64))
}

/// COLUMNS(table)
pub fn fn_columns(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ctx.table(&args[0])?.columns() as f64))
}

/// MATCH(value, table) - 1-based row-major position of the first equal element
pub fn fn_match(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let needle = ctx.scalar(&args[0])?;
    let table = ctx.table(&args[1])?;

    for (i, (row, col)) in table.cells().enumerate() {
        if ctx.cells.resolve(row, col)?.as_ref() == Some(needle) {
            return Ok(Value::Number((i + 1) as f64));
        }
    }

    Err(ctx.domain_error(format!("{} not found", needle)))
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::functions::test_support::{eval, eval_with, num, text};
    use crate::value::Value;

    fn grid() -> Vec<(&'static str, Value)> {
        vec![
            ("A1", num(1.0)),
            ("B1", text("one")),
            ("A2", num(2.0)),
            ("B2", text("two")),
            ("A3", num(3.0)),
        ]
    }

    #[test]
    fn test_index() {
        let cells = grid();
        assert_eq!(eval_with("INDEX(A1:B3, 2, 2)", &cells), Ok(text("two")));
        assert_eq!(eval_with("INDEX(A1:A3, 3)", &cells), Ok(num(3.0)));
        // Blank element
        assert_eq!(eval_with("INDEX(A1:B3, 3, 2)", &cells), Ok(num(0.0)));
    }

    #[test]
    fn test_index_errors() {
        let cells = grid();
        let kind = |source: &str| eval_with(source, &cells).unwrap_err().kind();
        assert_eq!(kind("INDEX(A1:B3, 4, 1)"), ErrorKind::Formula);
        assert_eq!(kind("INDEX(A1:B3, 0, 1)"), ErrorKind::Formula);
        assert_eq!(kind("INDEX(A1:B3, 1)"), ErrorKind::Formula);
        assert_eq!(kind("INDEX(5, 1)"), ErrorKind::ArgumentType);
        assert_eq!(kind("INDEX(A1:B3, \"1\", 1)"), ErrorKind::ArgumentType);
        assert_eq!(kind("INDEX(A1:B3)"), ErrorKind::QuantityOfArguments);

        let cells = [("A1", num(1.0)), ("C1", num(f64::NAN))];
        let err = eval_with("INDEX(A1:A2, C1)", &cells).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula);
    }

    #[test]
    fn test_rows_columns() {
        assert_eq!(eval("ROWS(A1:C5)"), Ok(num(5.0)));
        assert_eq!(eval("COLUMNS(A1:C5)"), Ok(num(3.0)));
        assert_eq!(eval("ROWS(C5:A1)"), Ok(num(5.0)));
        assert_eq!(eval("ROWS(1)").unwrap_err().kind(), ErrorKind::ArgumentType);
    }

    #[test]
    fn test_match() {
        let cells = grid();
        assert_eq!(eval_with("MATCH(3, A1:A3)", &cells), Ok(num(3.0)));
        assert_eq!(eval_with("MATCH(\"two\", A1:B2)", &cells), Ok(num(4.0)));
        assert_eq!(
            eval_with("MATCH(\"2\", A1:A3)", &cells).unwrap_err().kind(),
            ErrorKind::Formula
        );
    }
}

//! Operator functions
//!
//! `+ - * /`, unary `-` and the comparison operators evaluate through these
//! entries. They are also callable by name (`ADD(1, 2)`).

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::Value;
use std::cmp::Ordering;

fn number_pair(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<(f64, f64)> {
    Ok((ctx.number(&args[0])?, ctx.number(&args[1])?))
}

/// ADD function
pub fn fn_add(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (a, b) = number_pair(args, ctx)?;
    ctx.finite(a + b)
}

/// MINUS function
pub fn fn_minus(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (a, b) = number_pair(args, ctx)?;
    ctx.finite(a - b)
}

/// MULTIPLY function
pub fn fn_multiply(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (a, b) = number_pair(args, ctx)?;
    ctx.finite(a * b)
}

/// DIVIDE function
pub fn fn_divide(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (a, b) = number_pair(args, ctx)?;
    if b == 0.0 {
        return Err(ctx.domain_error("division by zero"));
    }
    ctx.finite(a / b)
}

/// UMINUS function
pub fn fn_uminus(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(-ctx.number(&args[0])?))
}

/// POW(base, exponent)
pub fn fn_pow(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (base, exponent) = number_pair(args, ctx)?;
    let result = base.powf(exponent);
    if !result.is_finite() {
        return Err(ctx.domain_error(format!(
            "{} to the power {} is not a finite number",
            base, exponent
        )));
    }
    Ok(Value::Number(result))
}

/// Type-check an equality operand pair: both scalars of the same type
fn same_type_pair<'v>(
    args: &'v [Value],
    ctx: &CallContext<'_>,
) -> FormulaResult<(&'v Value, &'v Value)> {
    let left = ctx.scalar(&args[0])?;
    let right = ctx.scalar(&args[1])?;
    if std::mem::discriminant(left) != std::mem::discriminant(right) {
        return Err(ctx.type_error(left.type_name(), right));
    }
    Ok((left, right))
}

/// Order two numbers or two texts; anything else is a type error
fn order(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Ordering> {
    match (&args[0], &args[1]) {
        (Value::Number(a), Value::Number(b)) => a
            .partial_cmp(b)
            .ok_or_else(|| ctx.domain_error("numbers are not comparable")),
        (Value::Text(a), Value::Text(b)) => Ok(a.cmp(b)),
        (Value::Number(_), other) => Err(ctx.type_error("number", other)),
        (Value::Text(_), other) => Err(ctx.type_error("text", other)),
        (other, _) => Err(ctx.type_error("number or text", other)),
    }
}

/// EQ function
pub fn fn_eq(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (left, right) = same_type_pair(args, ctx)?;
    Ok(Value::Boolean(left == right))
}

/// NE function
pub fn fn_ne(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let (left, right) = same_type_pair(args, ctx)?;
    Ok(Value::Boolean(left != right))
}

/// LT function
pub fn fn_lt(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(order(args, ctx)? == Ordering::Less))
}

/// LTE function
pub fn fn_lte(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(order(args, ctx)? != Ordering::Greater))
}

/// GT function
pub fn fn_gt(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(order(args, ctx)? == Ordering::Greater))
}

/// GTE function
pub fn fn_gte(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(order(args, ctx)? != Ordering::Less))
}

#[cfg(test)]
mod tests {
    use crate::error::{ErrorKind, FormulaError};
    use crate::functions::test_support::{eval, eval_with, num, text};
    use crate::value::Value;

    #[test]
    fn test_arithmetic_by_name() {
        assert_eq!(eval("ADD(1, 2)"), Ok(num(3.0)));
        assert_eq!(eval("MINUS(1, 2)"), Ok(num(-1.0)));
        assert_eq!(eval("MULTIPLY(4, 2.5)"), Ok(num(10.0)));
        assert_eq!(eval("DIVIDE(9, 3)"), Ok(num(3.0)));
        assert_eq!(eval("UMINUS(4)"), Ok(num(-4.0)));
        assert_eq!(eval("POW(2, 10)"), Ok(num(1024.0)));
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(
            eval("10/(5-5)"),
            Err(FormulaError::domain("DIVIDE", "division by zero", 2))
        );
    }

    #[test]
    fn test_arithmetic_overflow() {
        assert_eq!(
            eval("1e308*10"),
            Err(FormulaError::domain("MULTIPLY", "result is not a finite number", 5))
        );
        assert_eq!(eval("1e308+1e308").unwrap_err().kind(), ErrorKind::Formula);
        assert_eq!(eval("-1e308-1e308").unwrap_err().kind(), ErrorKind::Formula);
        assert_eq!(eval("1e308/1e-10").unwrap_err().kind(), ErrorKind::Formula);
    }

    #[test]
    fn test_pow_domain() {
        let err = eval("POW(-8, 0.5)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula);
        let err = eval("POW(10, 400)").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula);
    }

    #[test]
    fn test_boolean_is_not_a_number() {
        let err = eval("TRUE+1").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentType);
        assert_eq!(err.position(), Some(4));
    }

    #[test]
    fn test_equality() {
        assert_eq!(eval("1=1"), Ok(Value::Boolean(true)));
        assert_eq!(eval("\"a\"=\"A\""), Ok(Value::Boolean(false)));
        assert_eq!(eval("TRUE<>FALSE"), Ok(Value::Boolean(true)));
        assert_eq!(eval("EQ(2, 2)"), Ok(Value::Boolean(true)));

        let err = eval("1=\"1\"").unwrap_err();
        assert_eq!(
            err,
            FormulaError::ArgumentType {
                function: "EQ".into(),
                expected: "number",
                actual: "text",
                position: 1,
            }
        );
    }

    #[test]
    fn test_ordering() {
        assert_eq!(eval("1<2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("2<=2"), Ok(Value::Boolean(true)));
        assert_eq!(eval("3>4"), Ok(Value::Boolean(false)));
        assert_eq!(eval("4>=5"), Ok(Value::Boolean(false)));
        assert_eq!(eval("\"apple\"<\"banana\""), Ok(Value::Boolean(true)));

        let err = eval("TRUE>FALSE").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentType);
        let err = eval("1<\"2\"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::ArgumentType);
    }

    #[test]
    fn test_tables_are_never_comparable() {
        let cells = [("A1", num(1.0))];
        for source in ["A1:A2=1", "A1:A2<>1", "A1:A2<1", "1>=A1:A2"] {
            let err = eval_with(source, &cells).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::ArgumentType, "{}", source);
        }
        assert_eq!(eval_with("A1=1", &cells), Ok(Value::Boolean(true)));
    }

    #[test]
    fn test_text_equality_by_name() {
        assert_eq!(eval("\"\"<>\"\""), Ok(Value::Boolean(false)));
        assert_eq!(eval("LT(\"a\", \"b\")"), Ok(Value::Boolean(true)));
        assert_eq!(eval_with("A1=\"t\"", &[("A1", text("t"))]), Ok(Value::Boolean(true)));
    }
}

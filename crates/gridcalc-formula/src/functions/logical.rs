//! Logical functions

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::Value;

/// AND function
pub fn fn_and(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut result = true;
    for b in ctx.booleans(args) {
        result &= b?;
    }
    Ok(Value::Boolean(result))
}

/// OR function
pub fn fn_or(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut result = false;
    for b in ctx.booleans(args) {
        result |= b?;
    }
    Ok(Value::Boolean(result))
}

/// XOR function: true when an odd number of arguments are true
pub fn fn_xor(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut result = false;
    for b in ctx.booleans(args) {
        result ^= b?;
    }
    Ok(Value::Boolean(result))
}

/// NOT function
pub fn fn_not(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Boolean(!ctx.boolean(&args[0])?))
}

/// IF(condition, then, [else])
///
/// Both branches are evaluated before the call; a missing else is `FALSE`.
pub fn fn_if(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    if ctx.boolean(&args[0])? {
        Ok(args[1].clone())
    } else {
        Ok(args.get(2).cloned().unwrap_or(Value::Boolean(false)))
    }
}

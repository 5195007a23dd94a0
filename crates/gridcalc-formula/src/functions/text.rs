//! Text and coercion functions
//!
//! Lengths and positions count characters, not bytes.

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::{parse_number, Value};

/// Longest text REPT will build, in bytes
pub const MAX_TEXT_LEN: usize = 1 << 20;

/// TO_TEXT(value)
pub fn fn_to_text(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let value = ctx.scalar(&args[0])?;
    Ok(Value::Text(value.to_text().unwrap_or_default()))
}

/// TO_NUMBER(value)
pub fn fn_to_number(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    match ctx.scalar(&args[0])? {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Boolean(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::Text(s) => parse_number(s)
            .map(Value::Number)
            .ok_or_else(|| ctx.domain_error(format!("'{}' is not a number", s))),
        other => Err(ctx.type_error("scalar", other)),
    }
}

/// TO_BOOLEAN(value)
pub fn fn_to_boolean(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let value = ctx.scalar(&args[0])?;
    Ok(Value::Boolean(value.to_boolean().unwrap_or(false)))
}

/// CONCAT(value1, [value2], ...) - joins text, numbers and booleans
pub fn fn_concat(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut out = String::new();
    for element in ctx.elements(args) {
        let element = element?;
        match element.to_text() {
            Some(s) => out.push_str(&s),
            None => return Err(ctx.type_error("text, number or boolean", &element)),
        }
    }
    Ok(Value::Text(out))
}

/// LEN(text)
pub fn fn_len(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    Ok(Value::Number(s.chars().count() as f64))
}

/// Optional character count argument; must not be negative
fn char_count(args: &[Value], index: usize, ctx: &CallContext<'_>) -> FormulaResult<usize> {
    let n = ctx.integer_or(args.get(index), 1.0)?;
    if n < 0.0 {
        return Err(ctx.domain_error("character count must not be negative"));
    }
    Ok(n as usize)
}

/// LEFT(text, [num_chars])
pub fn fn_left(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    let n = char_count(args, 1, ctx)?;
    Ok(Value::Text(s.chars().take(n).collect()))
}

/// RIGHT(text, [num_chars])
pub fn fn_right(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    let n = char_count(args, 1, ctx)?;
    let len = s.chars().count();
    Ok(Value::Text(s.chars().skip(len.saturating_sub(n)).collect()))
}

/// MID(text, start, num_chars) - `start` is 1-based
pub fn fn_mid(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    let start = ctx.integer(&args[1])?;
    let n = ctx.integer(&args[2])?;
    if start < 1.0 {
        return Err(ctx.domain_error("start must be at least 1"));
    }
    if n < 0.0 {
        return Err(ctx.domain_error("character count must not be negative"));
    }
    Ok(Value::Text(
        s.chars().skip(start as usize - 1).take(n as usize).collect(),
    ))
}

/// UPPER(text)
pub fn fn_upper(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(ctx.text(&args[0])?.to_uppercase()))
}

/// LOWER(text)
pub fn fn_lower(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Text(ctx.text(&args[0])?.to_lowercase()))
}

/// TRIM(text) - strips both ends and collapses inner runs of spaces
pub fn fn_trim(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    Ok(Value::Text(
        s.split(' ')
            .filter(|word| !word.is_empty())
            .collect::<Vec<_>>()
            .join(" "),
    ))
}

/// EXACT(text1, text2) - case-sensitive equality
pub fn fn_exact(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let a = ctx.text(&args[0])?;
    let b = ctx.text(&args[1])?;
    Ok(Value::Boolean(a == b))
}

/// FIND(find_text, within_text, [start]) - 1-based, case-sensitive
pub fn fn_find(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let needle = ctx.text(&args[0])?;
    let haystack = ctx.text(&args[1])?;
    let start = ctx.integer_or(args.get(2), 1.0)?;

    let len = haystack.chars().count();
    if start < 1.0 || start > (len + 1) as f64 {
        return Err(ctx.domain_error(format!("start {} is outside the text", start)));
    }

    let skip = start as usize - 1;
    let byte_offset = haystack
        .char_indices()
        .nth(skip)
        .map_or(haystack.len(), |(i, _)| i);

    match haystack[byte_offset..].find(needle) {
        Some(found) => {
            let chars_before = haystack[..byte_offset + found].chars().count();
            Ok(Value::Number((chars_before + 1) as f64))
        }
        None => Err(ctx.domain_error(format!("'{}' not found", needle))),
    }
}

/// REPT(text, times)
pub fn fn_rept(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let s = ctx.text(&args[0])?;
    let times = ctx.integer(&args[1])?;
    if times < 0.0 {
        return Err(ctx.domain_error("repeat count must not be negative"));
    }
    let times = times as usize;
    match s.len().checked_mul(times) {
        Some(len) if len <= MAX_TEXT_LEN => Ok(Value::Text(s.repeat(times))),
        _ => Err(ctx.domain_error(format!(
            "result would exceed {} bytes",
            MAX_TEXT_LEN
        ))),
    }
}

//! Statistical functions
//!
//! Tables are consumed as lazy element streams; only MEDIAN and MODE collect
//! their inputs, since they need them ordered or counted.

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::Value;
use ahash::{AHashMap, AHashSet};

/// SUM function
pub fn fn_sum(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut sum = 0.0;
    for n in ctx.numbers(args) {
        sum += n?;
    }
    ctx.finite(sum)
}

/// PRODUCT function
pub fn fn_product(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut product: Option<f64> = None;
    for n in ctx.numbers(args) {
        let n = n?;
        product = Some(product.map_or(n, |p| p * n));
    }
    ctx.finite(product.unwrap_or(0.0))
}

/// AVERAGE function
pub fn fn_average(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for n in ctx.numbers(args) {
        sum += n?;
        count += 1;
    }

    if count == 0 {
        Err(ctx.domain_error("no values to average"))
    } else {
        ctx.finite(sum / count as f64)
    }
}

/// MIN function; 0 when there are no values
pub fn fn_min(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut min: Option<f64> = None;
    for n in ctx.numbers(args) {
        let n = n?;
        min = Some(min.map_or(n, |m| m.min(n)));
    }
    Ok(Value::Number(min.unwrap_or(0.0)))
}

/// MAX function; 0 when there are no values
pub fn fn_max(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut max: Option<f64> = None;
    for n in ctx.numbers(args) {
        let n = n?;
        max = Some(max.map_or(n, |m| m.max(n)));
    }
    Ok(Value::Number(max.unwrap_or(0.0)))
}

/// MEDIAN function
pub fn fn_median(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut values = ctx.numbers(args).collect::<FormulaResult<Vec<f64>>>()?;
    if values.is_empty() {
        return Err(ctx.domain_error("no values to take the median of"));
    }

    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    let median = if values.len() % 2 == 0 {
        values[mid - 1] / 2.0 + values[mid] / 2.0
    } else {
        values[mid]
    };
    Ok(Value::Number(median))
}

/// MODE function - the most frequent value; ties go to the one seen first
pub fn fn_mode(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let values = ctx.numbers(args).collect::<FormulaResult<Vec<f64>>>()?;

    let mut counts: AHashMap<u64, usize> = AHashMap::new();
    for n in &values {
        *counts.entry(number_key(*n)).or_insert(0) += 1;
    }

    let mut best: Option<(f64, usize)> = None;
    for n in &values {
        let count = counts.get(&number_key(*n)).copied().unwrap_or(0);
        if count > 1 && best.map_or(true, |(_, c)| count > c) {
            best = Some((*n, count));
        }
    }

    best.map(|(n, _)| Value::Number(n))
        .ok_or_else(|| ctx.domain_error("no value occurs more than once"))
}

/// COUNT function - counts numbers and ignores everything else
pub fn fn_count(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut count = 0usize;
    for element in ctx.elements(args) {
        if matches!(element?, Value::Number(_)) {
            count += 1;
        }
    }
    Ok(Value::Number(count as f64))
}

/// Hashable identity of a scalar
#[derive(PartialEq, Eq, Hash)]
enum ScalarKey {
    Number(u64),
    Text(String),
    Boolean(bool),
}

/// Bit pattern of a number with `-0.0` folded into `0.0`
fn number_key(n: f64) -> u64 {
    if n == 0.0 {
        0.0f64.to_bits()
    } else {
        n.to_bits()
    }
}

/// COUNTUNIQUE function - counts distinct scalar values
pub fn fn_countunique(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let mut seen = AHashSet::new();
    for element in ctx.elements(args) {
        let key = match element? {
            Value::Number(n) => ScalarKey::Number(number_key(n)),
            Value::Text(s) => ScalarKey::Text(s),
            Value::Boolean(b) => ScalarKey::Boolean(b),
            other @ Value::Table(_) => return Err(ctx.type_error("scalar", &other)),
        };
        seen.insert(key);
    }
    Ok(Value::Number(seen.len() as f64))
}

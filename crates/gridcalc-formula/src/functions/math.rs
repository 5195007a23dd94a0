//! Math functions

use super::CallContext;
use crate::error::FormulaResult;
use crate::value::Value;
use rand::Rng;

/// ABS function
pub fn fn_abs(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ctx.number(&args[0])?.abs()))
}

/// SQRT function
pub fn fn_sqrt(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    if n < 0.0 {
        return Err(ctx.domain_error("square root of a negative number"));
    }
    Ok(Value::Number(n.sqrt()))
}

fn positive(n: f64, ctx: &CallContext<'_>) -> FormulaResult<f64> {
    if n <= 0.0 {
        Err(ctx.domain_error("logarithm of a non-positive number"))
    } else {
        Ok(n)
    }
}

/// LN function
pub fn fn_ln(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = positive(ctx.number(&args[0])?, ctx)?;
    Ok(Value::Number(n.ln()))
}

/// LOG(number, [base]) - base defaults to 10
pub fn fn_log(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = positive(ctx.number(&args[0])?, ctx)?;
    let base = match args.get(1) {
        Some(v) => ctx.number(v)?,
        None => 10.0,
    };
    if base <= 0.0 || base == 1.0 {
        return Err(ctx.domain_error(format!("invalid logarithm base {}", base)));
    }
    Ok(Value::Number(n.log(base)))
}

/// LOG10 function
pub fn fn_log10(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = positive(ctx.number(&args[0])?, ctx)?;
    Ok(Value::Number(n.log10()))
}

/// EXP function
pub fn fn_exp(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    ctx.finite(ctx.number(&args[0])?.exp())
}

/// ROUND(number, [digits]) - halves round away from zero
pub fn fn_round(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    let digits = ctx.integer_or(args.get(1), 0.0)?.clamp(-308.0, 308.0);
    let factor = 10f64.powi(digits.abs() as i32);
    if digits >= 0.0 {
        let scaled = n * factor;
        if !scaled.is_finite() {
            // Already more precise than f64 can represent at this scale
            return Ok(Value::Number(n));
        }
        ctx.finite(scaled.round() / factor)
    } else {
        ctx.finite((n / factor).round() * factor)
    }
}

fn significance(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<f64> {
    let step = match args.get(1) {
        Some(v) => ctx.number(v)?,
        None => 1.0,
    };
    if step == 0.0 {
        return Err(ctx.domain_error("significance must not be zero"));
    }
    Ok(step)
}

/// FLOOR(number, [significance]) - rounds down to a multiple of significance
pub fn fn_floor(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    let step = significance(args, ctx)?;
    ctx.finite((n / step).floor() * step)
}

/// CEILING(number, [significance]) - rounds up to a multiple of significance
pub fn fn_ceiling(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    let step = significance(args, ctx)?;
    ctx.finite((n / step).ceil() * step)
}

/// INT function - rounds down to the nearest integer
pub fn fn_int(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(ctx.number(&args[0])?.floor()))
}

/// MOD(number, divisor) - the result takes the sign of the divisor
pub fn fn_mod(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    let d = ctx.number(&args[1])?;
    if d == 0.0 {
        return Err(ctx.domain_error("division by zero"));
    }
    ctx.finite(n - d * (n / d).floor())
}

/// SIGN function
pub fn fn_sign(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let n = ctx.number(&args[0])?;
    let sign = if n > 0.0 {
        1.0
    } else if n < 0.0 {
        -1.0
    } else {
        0.0
    };
    Ok(Value::Number(sign))
}

/// PI function
pub fn fn_pi(_args: &[Value], _ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(std::f64::consts::PI))
}

/// RAND function - uniform in [0, 1)
pub fn fn_rand(_args: &[Value], _ctx: &CallContext<'_>) -> FormulaResult<Value> {
    Ok(Value::Number(rand::thread_rng().gen::<f64>()))
}

/// RANDBETWEEN(bottom, top) - a random integer in [bottom, top]
pub fn fn_randbetween(args: &[Value], ctx: &CallContext<'_>) -> FormulaResult<Value> {
    let bottom = ctx.number(&args[0])?.ceil();
    let top = ctx.number(&args[1])?.floor();
    if !bottom.is_finite() || !top.is_finite() {
        return Err(ctx.domain_error("bounds must be finite numbers"));
    }
    if bottom > top {
        return Err(ctx.domain_error("bottom is greater than top"));
    }
    let value = rand::thread_rng().gen_range(bottom as i64..=top as i64);
    Ok(Value::Number(value as f64))
}

#[cfg(test)]
mod tests {
    use crate::error::ErrorKind;
    use crate::functions::test_support::{eval, eval_with, num};
    use crate::value::Value;

    fn assert_approx(result: Value, expected: f64) {
        match result {
            Value::Number(n) => assert!(
                (n - expected).abs() < 1e-10,
                "expected {}, got {}",
                expected,
                n
            ),
            other => panic!("expected number, got {:?}", other),
        }
    }

    fn domain(source: &str) {
        let err = eval(source).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula, "{}", source);
    }

    #[test]
    fn test_abs_function() {
        assert_eq!(eval("ABS(-5)"), Ok(num(5.0)));
        assert_eq!(eval("ABS(3)"), Ok(num(3.0)));
        assert_eq!(eval("ABS(\"x\")").unwrap_err().kind(), ErrorKind::ArgumentType);
    }

    #[test]
    fn test_sqrt_function() {
        assert_eq!(eval("SQRT(16)"), Ok(num(4.0)));
        domain("SQRT(-1)");
    }

    #[test]
    fn test_log_functions() {
        assert_approx(eval("LN(EXP(2))").unwrap(), 2.0);
        assert_approx(eval("LOG(100)").unwrap(), 2.0);
        assert_approx(eval("LOG(8, 2)").unwrap(), 3.0);
        assert_approx(eval("LOG10(1000)").unwrap(), 3.0);
        domain("LN(0)");
        domain("LOG(-1)");
        domain("LOG(10, 1)");
        domain("LOG10(0)");
    }

    #[test]
    fn test_exp_function() {
        assert_eq!(eval("EXP(0)"), Ok(num(1.0)));
        domain("EXP(1000)");
    }

    #[test]
    fn test_round_function() {
        assert_eq!(eval("ROUND(2.5)"), Ok(num(3.0)));
        assert_eq!(eval("ROUND(-2.5)"), Ok(num(-3.0)));
        assert_eq!(eval("ROUND(3.14159, 2)"), Ok(num(3.14)));
        assert_eq!(eval("ROUND(1234, -2)"), Ok(num(1200.0)));
    }

    #[test]
    fn test_floor_ceiling_int() {
        assert_eq!(eval("FLOOR(2.7)"), Ok(num(2.0)));
        assert_eq!(eval("FLOOR(-2.2)"), Ok(num(-3.0)));
        assert_eq!(eval("FLOOR(17, 5)"), Ok(num(15.0)));
        assert_eq!(eval("CEILING(2.1)"), Ok(num(3.0)));
        assert_eq!(eval("CEILING(17, 5)"), Ok(num(20.0)));
        assert_eq!(eval("INT(-1.5)"), Ok(num(-2.0)));
        domain("FLOOR(1, 0)");
    }

    #[test]
    fn test_mod_function() {
        assert_eq!(eval("MOD(10, 3)"), Ok(num(1.0)));
        assert_eq!(eval("MOD(-10, 3)"), Ok(num(2.0)));
        assert_eq!(eval("MOD(10, -3)"), Ok(num(-2.0)));
        domain("MOD(1, 0)");
    }

    #[test]
    fn test_sign_and_pi() {
        assert_eq!(eval("SIGN(-4)"), Ok(num(-1.0)));
        assert_eq!(eval("SIGN(0)"), Ok(num(0.0)));
        assert_eq!(eval("SIGN(9)"), Ok(num(1.0)));
        assert_eq!(eval("PI()"), Ok(num(std::f64::consts::PI)));
    }

    #[test]
    fn test_random_functions() {
        for _ in 0..100 {
            let n = eval("RAND()").unwrap().as_number().unwrap();
            assert!((0.0..1.0).contains(&n));

            let n = eval("RANDBETWEEN(1, 3)").unwrap().as_number().unwrap();
            assert!(n == 1.0 || n == 2.0 || n == 3.0);
        }
        assert_eq!(eval("RANDBETWEEN(4, 4)"), Ok(num(4.0)));
        domain("RANDBETWEEN(5, 1)");

        let cells = [("A1", num(f64::NAN))];
        let err = eval_with("RANDBETWEEN(5, A1)", &cells).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Formula);
    }
}

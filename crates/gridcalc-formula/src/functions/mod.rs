//! Built-in functions
//!
//! Every function, including the ones operators desugar to, is a plain `fn`
//! pointer in a [`FunctionRegistry`]. The registry checks the argument count
//! before the implementation runs; implementations then validate argument
//! types before checking domain rules.

pub mod logical;
pub mod lookup;
pub mod math;
pub mod operators;
pub mod statistical;
pub mod text;

use crate::error::{FormulaError, FormulaResult};
use crate::evaluator::CellResolver;
use crate::value::{Table, Value};
use ahash::AHashMap;
use std::sync::OnceLock;

/// Function implementation signature
pub type FunctionImpl = fn(&[Value], &CallContext<'_>) -> FormulaResult<Value>;

/// Function definition
pub struct FunctionDef {
    /// Function name (uppercase)
    pub name: &'static str,
    /// Minimum arguments
    pub min_args: usize,
    /// Maximum arguments (None = unlimited)
    pub max_args: Option<usize>,
    /// Implementation
    pub implementation: FunctionImpl,
    /// Is volatile (gives a fresh value on every evaluation)
    pub volatile: bool,
}

impl FunctionDef {
    fn new(
        name: &'static str,
        min_args: usize,
        max_args: Option<usize>,
        implementation: FunctionImpl,
    ) -> Self {
        Self {
            name,
            min_args,
            max_args,
            implementation,
            volatile: false,
        }
    }

    fn volatile(mut self) -> Self {
        self.volatile = true;
        self
    }

    /// Check an argument count against this definition
    pub fn check_arity(&self, actual: usize, position: usize) -> FormulaResult<()> {
        let too_few = actual < self.min_args;
        let too_many = self.max_args.map_or(false, |max| actual > max);
        if !too_few && !too_many {
            return Ok(());
        }

        let expected = match self.max_args {
            Some(max) if max == self.min_args => format!("{}", max),
            Some(max) => format!("{} to {}", self.min_args, max),
            None => format!("at least {}", self.min_args),
        };
        Err(FormulaError::ArgumentCount {
            function: self.name.to_string(),
            expected,
            actual,
            position,
        })
    }
}

/// What an implementation knows about its call site
pub struct CallContext<'a> {
    /// Upper-case function name
    pub name: &'a str,
    /// Offset of the call (or operator) in the formula source
    pub position: usize,
    /// Cell values, for reading table elements
    pub cells: &'a dyn CellResolver,
}

impl<'a> CallContext<'a> {
    pub fn new(name: &'a str, position: usize, cells: &'a dyn CellResolver) -> Self {
        Self {
            name,
            position,
            cells,
        }
    }

    /// `ArgumentType` error for this call
    pub fn type_error(&self, expected: &'static str, actual: &Value) -> FormulaError {
        FormulaError::ArgumentType {
            function: self.name.to_string(),
            expected,
            actual: actual.type_name(),
            position: self.position,
        }
    }

    /// Domain (`Formula` kind) error for this call
    pub fn domain_error(&self, reason: impl Into<String>) -> FormulaError {
        FormulaError::domain(self.name, reason, self.position)
    }

    /// Require a number
    pub fn number(&self, value: &Value) -> FormulaResult<f64> {
        value
            .as_number()
            .ok_or_else(|| self.type_error("number", value))
    }

    /// Require text
    pub fn text<'v>(&self, value: &'v Value) -> FormulaResult<&'v str> {
        value.as_text().ok_or_else(|| self.type_error("text", value))
    }

    /// Require a boolean
    pub fn boolean(&self, value: &Value) -> FormulaResult<bool> {
        value
            .as_boolean()
            .ok_or_else(|| self.type_error("boolean", value))
    }

    /// Require a table
    pub fn table(&self, value: &Value) -> FormulaResult<Table> {
        match value {
            Value::Table(table) => Ok(*table),
            other => Err(self.type_error("table", other)),
        }
    }

    /// Require anything but a table
    pub fn scalar<'v>(&self, value: &'v Value) -> FormulaResult<&'v Value> {
        if value.is_table() {
            Err(self.type_error("scalar", value))
        } else {
            Ok(value)
        }
    }

    /// Require a finite number, truncated to an integer
    pub fn integer(&self, value: &Value) -> FormulaResult<f64> {
        let n = self.number(value)?;
        if !n.is_finite() {
            return Err(self.domain_error(format!("{} is not a finite number", n)));
        }
        Ok(n.trunc())
    }

    /// Optional numeric argument truncated to an integer
    pub fn integer_or(&self, value: Option<&Value>, default: f64) -> FormulaResult<f64> {
        match value {
            Some(v) => self.integer(v),
            None => Ok(default),
        }
    }

    /// Numeric result; infinities and NaN are domain errors
    pub fn finite(&self, result: f64) -> FormulaResult<Value> {
        if result.is_finite() {
            Ok(Value::Number(result))
        } else {
            Err(self.domain_error("result is not a finite number"))
        }
    }

    /// Flatten arguments into their elements, reading tables lazily
    ///
    /// Scalars are yielded as-is. Table elements come out row-major with
    /// blank cells skipped; an errored cell yields its error.
    pub fn elements<'s>(
        &'s self,
        args: &'s [Value],
    ) -> impl Iterator<Item = FormulaResult<Value>> + 's {
        args.iter()
            .flat_map(move |arg| -> Box<dyn Iterator<Item = FormulaResult<Value>> + 's> {
                match arg {
                    Value::Table(table) => Box::new(
                        table
                            .cells()
                            .filter_map(move |(row, col)| self.cells.resolve(row, col).transpose()),
                    ),
                    scalar => Box::new(std::iter::once(Ok(scalar.clone()))),
                }
            })
    }

    /// Elements that must all be numbers
    pub fn numbers<'s>(
        &'s self,
        args: &'s [Value],
    ) -> impl Iterator<Item = FormulaResult<f64>> + 's {
        self.elements(args)
            .map(move |element| element.and_then(|v| self.number(&v)))
    }

    /// Elements that must all be booleans
    pub fn booleans<'s>(
        &'s self,
        args: &'s [Value],
    ) -> impl Iterator<Item = FormulaResult<bool>> + 's {
        self.elements(args)
            .map(move |element| element.and_then(|v| self.boolean(&v)))
    }
}

/// Function registry
pub struct FunctionRegistry {
    functions: AHashMap<&'static str, FunctionDef>,
}

impl FunctionRegistry {
    /// Create a new registry with all built-in functions
    pub fn new() -> Self {
        let mut registry = Self {
            functions: AHashMap::new(),
        };

        registry.register_operator_functions();
        registry.register_logical_functions();
        registry.register_text_functions();
        registry.register_math_functions();
        registry.register_statistical_functions();
        registry.register_lookup_functions();

        registry
    }

    /// Look up a function by upper-case name
    pub fn get(&self, name: &str) -> Option<&FunctionDef> {
        self.functions.get(name)
    }

    /// Register a function
    pub fn register(&mut self, def: FunctionDef) {
        self.functions.insert(def.name, def);
    }

    /// Check whether `name` is a volatile function
    pub fn is_volatile(&self, name: &str) -> bool {
        self.get(name).map_or(false, |def| def.volatile)
    }

    /// Number of registered functions
    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    /// Call `name` with already-evaluated arguments
    pub fn call(
        &self,
        name: &str,
        args: &[Value],
        position: usize,
        cells: &dyn CellResolver,
    ) -> FormulaResult<Value> {
        let def = self
            .get(name)
            .ok_or_else(|| FormulaError::UnknownFunction {
                name: name.to_string(),
                position,
            })?;
        def.check_arity(args.len(), position)?;
        (def.implementation)(args, &CallContext::new(def.name, position, cells))
    }

    fn register_operator_functions(&mut self) {
        self.register(FunctionDef::new("ADD", 2, Some(2), operators::fn_add));
        self.register(FunctionDef::new("MINUS", 2, Some(2), operators::fn_minus));
        self.register(FunctionDef::new("MULTIPLY", 2, Some(2), operators::fn_multiply));
        self.register(FunctionDef::new("DIVIDE", 2, Some(2), operators::fn_divide));
        self.register(FunctionDef::new("UMINUS", 1, Some(1), operators::fn_uminus));
        self.register(FunctionDef::new("POW", 2, Some(2), operators::fn_pow));

        self.register(FunctionDef::new("EQ", 2, Some(2), operators::fn_eq));
        self.register(FunctionDef::new("NE", 2, Some(2), operators::fn_ne));
        self.register(FunctionDef::new("LT", 2, Some(2), operators::fn_lt));
        self.register(FunctionDef::new("LTE", 2, Some(2), operators::fn_lte));
        self.register(FunctionDef::new("GT", 2, Some(2), operators::fn_gt));
        self.register(FunctionDef::new("GTE", 2, Some(2), operators::fn_gte));
    }

    fn register_logical_functions(&mut self) {
        self.register(FunctionDef::new("AND", 1, None, logical::fn_and));
        self.register(FunctionDef::new("OR", 1, None, logical::fn_or));
        self.register(FunctionDef::new("XOR", 1, None, logical::fn_xor));
        self.register(FunctionDef::new("NOT", 1, Some(1), logical::fn_not));
        self.register(FunctionDef::new("IF", 2, Some(3), logical::fn_if));
    }

    fn register_text_functions(&mut self) {
        // Coercion
        self.register(FunctionDef::new("TO_TEXT", 1, Some(1), text::fn_to_text));
        self.register(FunctionDef::new("TO_NUMBER", 1, Some(1), text::fn_to_number));
        self.register(FunctionDef::new("TO_BOOLEAN", 1, Some(1), text::fn_to_boolean));

        self.register(FunctionDef::new("CONCAT", 1, None, text::fn_concat));
        self.register(FunctionDef::new("LEN", 1, Some(1), text::fn_len));
        self.register(FunctionDef::new("LEFT", 1, Some(2), text::fn_left));
        self.register(FunctionDef::new("RIGHT", 1, Some(2), text::fn_right));
        self.register(FunctionDef::new("MID", 3, Some(3), text::fn_mid));
        self.register(FunctionDef::new("UPPER", 1, Some(1), text::fn_upper));
        self.register(FunctionDef::new("LOWER", 1, Some(1), text::fn_lower));
        self.register(FunctionDef::new("TRIM", 1, Some(1), text::fn_trim));
        self.register(FunctionDef::new("EXACT", 2, Some(2), text::fn_exact));
        self.register(FunctionDef::new("FIND", 2, Some(3), text::fn_find));
        self.register(FunctionDef::new("REPT", 2, Some(2), text::fn_rept));
    }

    fn register_math_functions(&mut self) {
        self.register(FunctionDef::new("ABS", 1, Some(1), math::fn_abs));
        self.register(FunctionDef::new("SQRT", 1, Some(1), math::fn_sqrt));
        self.register(FunctionDef::new("LN", 1, Some(1), math::fn_ln));
        self.register(FunctionDef::new("LOG", 1, Some(2), math::fn_log));
        self.register(FunctionDef::new("LOG10", 1, Some(1), math::fn_log10));
        self.register(FunctionDef::new("EXP", 1, Some(1), math::fn_exp));
        self.register(FunctionDef::new("ROUND", 1, Some(2), math::fn_round));
        self.register(FunctionDef::new("FLOOR", 1, Some(2), math::fn_floor));
        self.register(FunctionDef::new("CEILING", 1, Some(2), math::fn_ceiling));
        self.register(FunctionDef::new("INT", 1, Some(1), math::fn_int));
        self.register(FunctionDef::new("MOD", 2, Some(2), math::fn_mod));
        self.register(FunctionDef::new("SIGN", 1, Some(1), math::fn_sign));
        self.register(FunctionDef::new("PI", 0, Some(0), math::fn_pi));
        self.register(FunctionDef::new("RAND", 0, Some(0), math::fn_rand).volatile());
        self.register(FunctionDef::new("RANDBETWEEN", 2, Some(2), math::fn_randbetween).volatile());
    }

    fn register_statistical_functions(&mut self) {
        self.register(FunctionDef::new("SUM", 1, None, statistical::fn_sum));
        self.register(FunctionDef::new("AVERAGE", 1, None, statistical::fn_average));
        self.register(FunctionDef::new("MIN", 1, None, statistical::fn_min));
        self.register(FunctionDef::new("MAX", 1, None, statistical::fn_max));
        self.register(FunctionDef::new("MEDIAN", 1, None, statistical::fn_median));
        self.register(FunctionDef::new("MODE", 1, None, statistical::fn_mode));
        self.register(FunctionDef::new("COUNT", 1, None, statistical::fn_count));
        self.register(FunctionDef::new("COUNTUNIQUE", 1, None, statistical::fn_countunique));
        self.register(FunctionDef::new("PRODUCT", 1, None, statistical::fn_product));
    }

    fn register_lookup_functions(&mut self) {
        self.register(FunctionDef::new("INDEX", 2, Some(3), lookup::fn_index));
        self.register(FunctionDef::new("ROWS", 1, Some(1), lookup::fn_rows));
        self.register(FunctionDef::new("COLUMNS", 1, Some(1), lookup::fn_columns));
        self.register(FunctionDef::new("MATCH", 2, Some(2), lookup::fn_match));
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Global function registry (lazily initialized)
static FUNCTION_REGISTRY: OnceLock<FunctionRegistry> = OnceLock::new();

/// The shared registry of built-in functions
pub fn registry() -> &'static FunctionRegistry {
    FUNCTION_REGISTRY.get_or_init(FunctionRegistry::new)
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::error::FormulaResult;
    use crate::evaluator::evaluate;
    use crate::parser::parse;
    use crate::value::Value;
    use ahash::AHashMap;
    use gridcalc_core::CellAddress;

    /// Evaluate `source` against a sheet given as `(A1, value)` pairs
    pub fn eval_with(source: &str, cells: &[(&str, Value)]) -> FormulaResult<Value> {
        let sheet: AHashMap<(u32, u32), Value> = cells
            .iter()
            .map(|(a1, value)| {
                let addr = CellAddress::parse(a1).unwrap();
                ((addr.row, addr.col), value.clone())
            })
            .collect();
        let resolver = move |row: u32, col: u32| -> FormulaResult<Option<Value>> {
            Ok(sheet.get(&(row, col)).cloned())
        };
        let expr = parse(source)?.expect("non-empty formula");
        evaluate(&expr, &resolver)
    }

    pub fn eval(source: &str) -> FormulaResult<Value> {
        eval_with(source, &[])
    }

    pub fn num(n: f64) -> Value {
        Value::Number(n)
    }

    pub fn text(s: &str) -> Value {
        Value::Text(s.to_string())
    }
}

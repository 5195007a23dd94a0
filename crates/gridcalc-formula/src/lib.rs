//! # gridcalc-formula
//!
//! Formula language for gridcalc.
//!
//! This crate provides:
//! - The value model ([`Value`], [`Table`])
//! - Formula parsing (text → AST) and canonical formatting (AST → text)
//! - The built-in function library
//! - Evaluation against a [`CellResolver`]
//! - Reference translation for copied formulas
//! - Dependency tracking for recalculation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_formula::{evaluate, parse, FormulaResult, Value};
//!
//! let expr = parse("SUM(A1:A2) * 2").unwrap().unwrap();
//! let cells = |row: u32, _col: u32| -> FormulaResult<Option<Value>> {
//!     Ok(Some(Value::Number(row as f64 + 1.0)))
//! };
//! assert_eq!(evaluate(&expr, &cells), Ok(Value::Number(6.0)));
//! ```

pub mod ast;
pub mod dependency;
pub mod error;
pub mod evaluator;
pub mod functions;
pub mod parser;
pub mod translate;
pub mod value;

pub use ast::{BinaryOperator, CellRef, Expr, ExprKind, RangeRef, UnaryOperator};
pub use dependency::{CellId, DependencyGraph, RecalcOrder};
pub use error::{ErrorKind, FormulaError, FormulaResult};
pub use evaluator::{
    evaluate, evaluate_with, referenced_cells, references, CellResolver, Reference,
};
pub use functions::{registry, CallContext, FunctionDef, FunctionRegistry};
pub use parser::parse;
pub use translate::translate;
pub use value::{format_number, parse_number, Table, Value};

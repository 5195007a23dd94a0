//! # gridcalc
//!
//! A spreadsheet formula engine.
//!
//! gridcalc keeps every cell of a two-dimensional grid consistent with its
//! formula and the current values of the cells that formula reads.
//!
//! ## Features
//!
//! - A small formula language: arithmetic, comparisons, cell and range
//!   references, and a library of logical, text, math, statistical and
//!   lookup functions
//! - Incremental recalculation in dependency order
//! - Circular dependency detection
//! - Change notifications through listeners and per-call change batches
//! - Copy, paste and fill with relative reference translation
//!
//! ## Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut engine = Engine::new();
//!
//! engine.set_input(0, 0, "1").unwrap();
//! engine.set_input(1, 0, "2").unwrap();
//! engine.set_input(2, 0, "3").unwrap();
//! engine.set_formula(3, 0, "SUM(A1:A3)").unwrap();
//! assert_eq!(engine.value(3, 0), Some(&Value::Number(6.0)));
//!
//! // Copy the total one column to the right
//! let buffer = engine.bufferize(3, 0, 3, 0);
//! engine.paste(&buffer, 3, 1).unwrap();
//! assert_eq!(engine.formula(3, 1), Some("SUM(B1:B3)"));
//! ```

pub mod cell;
pub mod clipboard;
pub mod engine;
pub mod events;
pub mod options;
pub mod prelude;

pub use cell::{Cell, CellInput, CellState};
pub use clipboard::{Buffer, BufferedCell};
pub use engine::Engine;
pub use events::{CellEvent, ChangeBatch, Listener, SubscriptionId};
pub use options::{EngineOptions, DEFAULT_MAX_RANGE_CELLS};

// Re-export core types
pub use gridcalc_core::{CellAddress, CellRange, GridLimits};

// Re-export formula types
pub use gridcalc_formula::{
    evaluate, parse, translate, ErrorKind, Expr, FormulaError, FormulaResult, Table, Value,
};

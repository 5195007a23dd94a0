//! Prelude module - common imports for gridcalc users
//!
//! ```rust
//! use gridcalc::prelude::*;
//! ```

pub use crate::{
    // Addressing
    CellAddress,
    // Events
    CellEvent,
    CellRange,
    // Engine types
    CellState,
    ChangeBatch,
    Engine,
    EngineOptions,
    // Errors
    ErrorKind,
    FormulaError,
    FormulaResult,
    GridLimits,
    SubscriptionId,
    // Values
    Value,
};

//! # gridcalc-core
//!
//! Core addressing types for the gridcalc formula engine.
//!
//! This crate provides:
//! - [`CellAddress`] - a single cell in A1 notation, with `$` absolute markers
//! - [`CellRange`] - a normalized rectangle of cells
//! - [`GridLimits`] - the addressable extent of a grid
//!
//! ## Example
//!
//! ```rust
//! use gridcalc_core::{CellAddress, CellRange, GridLimits};
//!
//! let addr = CellAddress::parse("$B2").unwrap();
//! assert_eq!((addr.row, addr.col), (1, 1));
//! assert!(addr.col_absolute);
//!
//! let range = CellRange::parse("A1:C3").unwrap();
//! assert_eq!(range.cell_count(), 9);
//! assert!(GridLimits::default().contains_range(&range));
//! ```

pub mod cell;
pub mod error;
pub mod limits;

pub use cell::{CellAddress, CellRange, CellRangeIterator};
pub use error::{Error, Result};
pub use limits::GridLimits;

/// Default number of addressable rows
pub const DEFAULT_MAX_ROWS: u32 = 65_536;

/// Default number of addressable columns (A..ZZ)
pub const DEFAULT_MAX_COLS: u32 = 702;

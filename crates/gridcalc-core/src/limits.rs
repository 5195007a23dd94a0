//! Grid bounds

use crate::cell::{CellAddress, CellRange};
use crate::error::{Error, Result};
use crate::{DEFAULT_MAX_COLS, DEFAULT_MAX_ROWS};

/// The addressable extent of a grid.
///
/// Cells outside the limits can still be *written* in a formula; they are
/// rejected when the engine resolves or stores them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GridLimits {
    /// Number of addressable rows
    pub max_rows: u32,
    /// Number of addressable columns
    pub max_cols: u32,
}

impl Default for GridLimits {
    fn default() -> Self {
        Self {
            max_rows: DEFAULT_MAX_ROWS,
            max_cols: DEFAULT_MAX_COLS,
        }
    }
}

impl GridLimits {
    /// Create limits for a `max_rows` x `max_cols` grid
    pub fn new(max_rows: u32, max_cols: u32) -> Self {
        Self { max_rows, max_cols }
    }

    /// Check whether a cell lies on the grid
    pub fn contains(&self, row: u32, col: u32) -> bool {
        row < self.max_rows && col < self.max_cols
    }

    /// Check whether a whole range lies on the grid
    pub fn contains_range(&self, range: &CellRange) -> bool {
        self.contains(range.end.row, range.end.col)
    }

    /// Validate a cell coordinate against the limits
    pub fn check(&self, row: u32, col: u32) -> Result<()> {
        if row >= self.max_rows {
            return Err(Error::RowOutOfBounds(row, self.max_rows.saturating_sub(1)));
        }
        if col >= self.max_cols {
            return Err(Error::ColumnOutOfBounds(col, self.max_cols.saturating_sub(1)));
        }
        Ok(())
    }

    /// Clip a range to the grid, returning `None` when nothing of it is addressable
    pub fn clip(&self, range: &CellRange) -> Option<CellRange> {
        if self.max_rows == 0 || self.max_cols == 0 {
            return None;
        }
        range.intersect(&CellRange::from_indices(
            0,
            0,
            self.max_rows - 1,
            self.max_cols - 1,
        ))
    }

    /// The bottom-right addressable cell
    pub fn last_cell(&self) -> Option<CellAddress> {
        if self.max_rows == 0 || self.max_cols == 0 {
            None
        } else {
            Some(CellAddress::new(self.max_rows - 1, self.max_cols - 1))
        }
    }
}

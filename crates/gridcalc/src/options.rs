//! Engine configuration

use gridcalc_core::GridLimits;

/// Default cap on the number of cells a single range may cover
pub const DEFAULT_MAX_RANGE_CELLS: u64 = 1_000_000;

/// Options for the recalculation engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EngineOptions {
    /// Addressable extent of the grid (default: 65 536 rows x 702 columns)
    pub limits: GridLimits,
    /// Largest range a formula may reference (default: 1 000 000 cells)
    ///
    /// A formula with a bigger range is kept but not evaluated.
    pub max_range_cells: u64,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            limits: GridLimits::default(),
            max_range_cells: DEFAULT_MAX_RANGE_CELLS,
        }
    }
}

impl EngineOptions {
    /// Options for a grid of the given size, other settings at their defaults
    pub fn with_limits(limits: GridLimits) -> Self {
        Self {
            limits,
            ..Self::default()
        }
    }
}

//! Change notifications

use gridcalc_formula::{FormulaError, Value};

/// A change to one cell, delivered to listeners in recompute order
#[derive(Debug, Clone, PartialEq)]
pub enum CellEvent {
    /// The cell has a new value
    ValueUpdated { row: u32, col: u32, value: Value },
    /// The cell's formula changed (an empty source means it was cleared)
    FormulaUpdated { row: u32, col: u32, source: String },
    /// The cell's formula failed to parse or evaluate
    FormulaError {
        row: u32,
        col: u32,
        error: FormulaError,
    },
    /// The cell sits on a dependency cycle
    CircularDependencyDetected { row: u32, col: u32 },
}

impl CellEvent {
    /// The cell this event is about
    pub fn cell(&self) -> (u32, u32) {
        match self {
            CellEvent::ValueUpdated { row, col, .. }
            | CellEvent::FormulaUpdated { row, col, .. }
            | CellEvent::FormulaError { row, col, .. }
            | CellEvent::CircularDependencyDetected { row, col } => (*row, *col),
        }
    }
}

/// Handle returned by `Engine::subscribe`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(pub(crate) u64);

/// Boxed listener closure
pub type Listener = Box<dyn FnMut(&CellEvent)>;

/// Everything one engine call changed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ChangeBatch {
    /// Events in emission order
    pub events: Vec<CellEvent>,
    /// Number of formula cells recomputed
    pub cells_recomputed: usize,
}

impl ChangeBatch {
    /// Check whether nothing was emitted
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Values reported by `ValueUpdated` events, in order
    pub fn value_updates(&self) -> impl Iterator<Item = ((u32, u32), &Value)> {
        self.events.iter().filter_map(|event| match event {
            CellEvent::ValueUpdated { row, col, value } => Some(((*row, *col), value)),
            _ => None,
        })
    }

    /// Errors reported by `FormulaError` events, in order
    pub fn errors(&self) -> impl Iterator<Item = ((u32, u32), &FormulaError)> {
        self.events.iter().filter_map(|event| match event {
            CellEvent::FormulaError { row, col, error } => Some(((*row, *col), error)),
            _ => None,
        })
    }

    /// Events concerning one cell, in order
    pub fn events_for(&self, row: u32, col: u32) -> impl Iterator<Item = &CellEvent> {
        self.events
            .iter()
            .filter(move |event| event.cell() == (row, col))
    }
}

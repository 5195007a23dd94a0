//! Copy, paste and fill
//!
//! A [`Buffer`] is a detached snapshot of a block of cells. Pasting it shifts
//! every relative reference by the distance between the buffer's origin and
//! the destination; all shifts are checked before any cell is touched.

use crate::cell::CellInput;
use crate::engine::{Engine, Install};
use crate::events::ChangeBatch;
use gridcalc_core::{CellAddress, CellRange};
use gridcalc_formula::dependency::CellId;
use gridcalc_formula::{translate, FormulaError, FormulaResult, Value};

/// One cell captured by [`Engine::bufferize`]
#[derive(Debug, Clone, PartialEq)]
pub struct BufferedCell {
    /// What was entered
    pub input: CellInput,
    /// Value at capture time
    pub value: Option<Value>,
    /// Error at capture time
    pub error: Option<FormulaError>,
}

/// A rectangular snapshot of cells
#[derive(Debug, Clone, PartialEq)]
pub struct Buffer {
    origin_row: u32,
    origin_col: u32,
    rows: u32,
    cols: u32,
    /// Row-major
    cells: Vec<BufferedCell>,
}

impl Buffer {
    /// Top-left cell the snapshot was taken from
    pub fn origin(&self) -> (u32, u32) {
        (self.origin_row, self.origin_col)
    }

    /// Number of rows
    pub fn rows(&self) -> u32 {
        self.rows
    }

    /// Number of columns
    pub fn columns(&self) -> u32 {
        self.cols
    }

    /// Check whether the snapshot covers no cells
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Cell at an offset from the origin
    pub fn get(&self, row_offset: u32, col_offset: u32) -> Option<&BufferedCell> {
        if row_offset >= self.rows || col_offset >= self.cols {
            return None;
        }
        self.cells
            .get(row_offset as usize * self.cols as usize + col_offset as usize)
    }

    /// Every cell with its offset from the origin, row-major
    pub fn iter(&self) -> impl Iterator<Item = (u32, u32, &BufferedCell)> {
        let cols = self.cols.max(1) as usize;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| ((i / cols) as u32, (i % cols) as u32, cell))
    }
}

impl Engine {
    /// Snapshot the rectangle between two corners (in any order)
    ///
    /// The part of the rectangle beyond the grid is dropped.
    pub fn bufferize(&self, row_start: u32, col_start: u32, row_end: u32, col_end: u32) -> Buffer {
        let requested = CellRange::from_indices(row_start, col_start, row_end, col_end);
        let Some(range) = self.limits().clip(&requested) else {
            return Buffer {
                origin_row: requested.start.row,
                origin_col: requested.start.col,
                rows: 0,
                cols: 0,
                cells: Vec::new(),
            };
        };

        let cells = range
            .cells()
            .map(|addr| {
                let id = CellId::new(addr.row, addr.col);
                BufferedCell {
                    input: self.input_of(id),
                    value: self.value(addr.row, addr.col).cloned(),
                    error: self.error(addr.row, addr.col).cloned(),
                }
            })
            .collect();

        Buffer {
            origin_row: range.start.row,
            origin_col: range.start.col,
            rows: range.row_count(),
            cols: range.col_count(),
            cells,
        }
    }

    /// Paste a buffer with its top-left cell at `(row, col)`
    ///
    /// Formulas are shifted by the distance from the buffer's origin, literals
    /// are copied and empty buffered cells clear their destination. If any
    /// destination or shifted reference falls off the grid nothing changes.
    pub fn paste(&mut self, buffer: &Buffer, row: u32, col: u32) -> FormulaResult<ChangeBatch> {
        let mut plan = Vec::new();
        self.plan_paste(buffer, row, col, &mut plan)?;
        tracing::debug!(
            "Pasting {}x{} block at {}",
            buffer.rows(),
            buffer.columns(),
            CellAddress::new(row, col)
        );
        Ok(self.apply(plan))
    }

    /// Copy one cell into every cell of a rectangle, shifting references
    pub fn fill(
        &mut self,
        source_row: u32,
        source_col: u32,
        row_start: u32,
        col_start: u32,
        row_end: u32,
        col_end: u32,
    ) -> FormulaResult<ChangeBatch> {
        self.target(source_row, source_col)?;
        let buffer = self.bufferize(source_row, source_col, source_row, source_col);
        let targets = CellRange::from_indices(row_start, col_start, row_end, col_end);

        let mut plan = Vec::new();
        for addr in targets.cells() {
            self.plan_paste(&buffer, addr.row, addr.col, &mut plan)?;
        }
        tracing::debug!(
            "Filling {} from {}",
            targets,
            CellAddress::new(source_row, source_col)
        );
        Ok(self.apply(plan))
    }

    fn plan_paste(
        &self,
        buffer: &Buffer,
        row: u32,
        col: u32,
        plan: &mut Vec<(CellId, Install)>,
    ) -> FormulaResult<()> {
        let row_offset = row as i64 - buffer.origin_row as i64;
        let col_offset = col as i64 - buffer.origin_col as i64;

        for (r, c, cell) in buffer.iter() {
            let id = self.target(row.saturating_add(r), col.saturating_add(c))?;
            let install = match &cell.input {
                CellInput::Empty => {
                    if self.input_of(id).is_empty() {
                        continue;
                    }
                    Install::Empty
                }
                CellInput::Literal { text, value } => Install::Literal {
                    text: text.clone(),
                    value: value.clone(),
                },
                CellInput::Formula {
                    ast: Some(ast), ..
                } => {
                    let moved = translate(ast, row_offset, col_offset, self.limits())?;
                    Install::Formula {
                        source: moved.to_string(),
                        parsed: Ok(moved),
                    }
                }
                // Unparsable source is copied verbatim and fails again
                CellInput::Formula { source, ast: None } => Install::formula(source),
            };
            plan.push((id, install));
        }
        Ok(())
    }

    fn apply(&mut self, plan: Vec<(CellId, Install)>) -> ChangeBatch {
        let mut batch = ChangeBatch::default();
        let mut roots = Vec::with_capacity(plan.len());
        for (id, install) in plan {
            self.install(id, install, &mut batch);
            roots.push(id);
        }
        self.recompute(roots, &mut batch);
        batch
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bufferize_normalizes_and_clips() {
        let mut engine = Engine::new();
        engine.set_input(0, 0, "1").unwrap();
        engine.set_input(1, 1, "=A1+1").unwrap();

        let buffer = engine.bufferize(1, 1, 0, 0);
        assert_eq!(buffer.origin(), (0, 0));
        assert_eq!((buffer.rows(), buffer.columns()), (2, 2));
        assert_eq!(buffer.get(1, 1).unwrap().input.formula(), Some("A1+1"));
        assert_eq!(buffer.get(1, 1).unwrap().value, Some(Value::Number(2.0)));
        assert!(buffer.get(0, 1).unwrap().input.is_empty());
        assert!(buffer.get(2, 0).is_none());

        let buffer = engine.bufferize(65_535, 701, 70_000, 800);
        assert_eq!((buffer.rows(), buffer.columns()), (1, 1));

        let buffer = engine.bufferize(70_000, 0, 70_001, 0);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_buffer_is_detached() {
        let mut engine = Engine::new();
        engine.set_input(0, 0, "1").unwrap();
        let buffer = engine.bufferize(0, 0, 0, 0);

        engine.set_input(0, 0, "2").unwrap();
        assert_eq!(buffer.get(0, 0).unwrap().value, Some(Value::Number(1.0)));
    }

    #[test]
    fn test_iter_offsets() {
        let engine = Engine::new();
        let buffer = engine.bufferize(0, 0, 1, 2);
        let offsets: Vec<(u32, u32)> = buffer.iter().map(|(r, c, _)| (r, c)).collect();
        assert_eq!(offsets, vec![(0, 0), (0, 1), (0, 2), (1, 0), (1, 1), (1, 2)]);
    }
}

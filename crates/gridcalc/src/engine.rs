//! Recalculation engine
//!
//! The engine owns every cell, the dependency graph between them and the
//! subscribed listeners. Each mutating call installs the new input, then
//! recomputes the edited cell and everything that transitively reads it,
//! precedents first, emitting one event per changed cell.
//!
//! # Example
//!
//! ```rust
//! use gridcalc::prelude::*;
//!
//! let mut engine = Engine::new();
//! engine.set_input(0, 0, "10").unwrap();
//! engine.set_formula(0, 1, "A1*2").unwrap();
//! assert_eq!(engine.value(0, 1), Some(&Value::Number(20.0)));
//!
//! let batch = engine.set_input(0, 0, "4").unwrap();
//! assert_eq!(batch.cells_recomputed, 1);
//! assert_eq!(engine.value(0, 1), Some(&Value::Number(8.0)));
//! ```

use crate::cell::{Cell, CellInput, CellState};
use crate::events::{CellEvent, ChangeBatch, Listener, SubscriptionId};
use crate::options::EngineOptions;
use ahash::AHashMap;
use gridcalc_core::{CellAddress, GridLimits};
use gridcalc_formula::dependency::{CellId, DependencyGraph, RecalcOrder};
use gridcalc_formula::{
    evaluate, parse, references, CellResolver, Expr, FormulaError, FormulaResult, Value,
};
use std::fmt;

/// New input for one cell, validated and ready to install
#[derive(Debug, Clone)]
pub(crate) enum Install {
    Empty,
    Literal { text: String, value: Value },
    Formula {
        source: String,
        parsed: FormulaResult<Expr>,
    },
}

impl Install {
    /// Parse formula source; blank source clears the cell
    pub(crate) fn formula(source: &str) -> Self {
        match parse(source) {
            Ok(Some(ast)) => Install::Formula {
                source: source.to_string(),
                parsed: Ok(ast),
            },
            Ok(None) => Install::Empty,
            Err(err) => Install::Formula {
                source: source.to_string(),
                parsed: Err(err),
            },
        }
    }
}

/// How a formula cell came out of a recompute pass
enum Outcome {
    Circular,
    Propagated(FormulaError),
    Evaluated(FormulaResult<Value>),
}

/// Reads cell values straight out of the engine's storage
struct GridResolver<'a> {
    cells: &'a AHashMap<CellId, Cell>,
    limits: GridLimits,
}

impl CellResolver for GridResolver<'_> {
    fn resolve(&self, row: u32, col: u32) -> FormulaResult<Option<Value>> {
        match self.cells.get(&CellId::new(row, col)) {
            Some(cell) => cell.resolve(),
            None => Ok(None),
        }
    }

    fn contains(&self, row: u32, col: u32) -> bool {
        self.limits.contains(row, col)
    }
}

/// The formula engine
pub struct Engine {
    options: EngineOptions,
    cells: AHashMap<CellId, Cell>,
    graph: DependencyGraph,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("options", &self.options)
            .field("cells", &self.cells.len())
            .field("edges", &self.graph.edge_count())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine with default options
    pub fn new() -> Self {
        Self::with_options(EngineOptions::default())
    }

    /// Create an engine with custom options
    pub fn with_options(options: EngineOptions) -> Self {
        Self {
            options,
            cells: AHashMap::new(),
            graph: DependencyGraph::new(),
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// The options this engine was created with
    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    /// The addressable extent of the grid
    pub fn limits(&self) -> &GridLimits {
        &self.options.limits
    }

    // === Editing ===

    /// Set a cell's formula (`source` has no leading `=`) and recompute
    ///
    /// Blank source clears the cell. Only a syntax error or an off-grid target
    /// fails the call; evaluation errors are stored on the cell. A formula
    /// that fails to parse is still stored, with the syntax error as its
    /// error, and its dependents are recomputed before the error is returned.
    pub fn set_formula(&mut self, row: u32, col: u32, source: &str) -> FormulaResult<ChangeBatch> {
        let id = self.target(row, col)?;
        tracing::debug!("Setting formula at {}: {}", id, source);

        let mut batch = ChangeBatch::default();
        let syntax_error = self.install(id, Install::formula(source), &mut batch);
        self.recompute([id], &mut batch);

        match syntax_error {
            Some(err) => Err(err),
            None => Ok(batch),
        }
    }

    /// Set a cell from editable text
    ///
    /// Text starting with `=` is a formula; anything else is sniffed into a
    /// number, boolean or text literal, and blank text clears the cell.
    pub fn set_input(&mut self, row: u32, col: u32, text: &str) -> FormulaResult<ChangeBatch> {
        if let Some(source) = text.strip_prefix('=') {
            return self.set_formula(row, col, source);
        }

        let id = self.target(row, col)?;
        let install = match Value::sniff(text) {
            Some(value) => Install::Literal {
                text: text.to_string(),
                value,
            },
            None => Install::Empty,
        };

        let mut batch = ChangeBatch::default();
        self.install(id, install, &mut batch);
        self.recompute([id], &mut batch);
        Ok(batch)
    }

    /// Reset a cell to empty and recompute its dependents
    pub fn clear(&mut self, row: u32, col: u32) -> FormulaResult<ChangeBatch> {
        self.set_formula(row, col, "")
    }

    /// Recompute every formula cell, refreshing volatile functions
    pub fn recalculate_all(&mut self) -> ChangeBatch {
        let mut roots: Vec<CellId> = self
            .cells
            .iter()
            .filter(|(_, cell)| cell.input.ast().is_some())
            .map(|(id, _)| *id)
            .collect();
        roots.sort_unstable();

        let mut batch = ChangeBatch::default();
        self.recompute(roots, &mut batch);
        batch
    }

    /// Evaluate a formula against the current grid without storing it
    pub fn evaluate(&self, source: &str) -> FormulaResult<Option<Value>> {
        match parse(source)? {
            Some(ast) => self.evaluate_ast(&ast).map(Some),
            None => Ok(None),
        }
    }

    // === Reading ===

    /// The cell at `(row, col)`, if it was ever addressed
    pub fn cell(&self, row: u32, col: u32) -> Option<&Cell> {
        self.cells.get(&CellId::new(row, col))
    }

    /// Formula source of a cell; `None` for empty and literal cells
    pub fn formula(&self, row: u32, col: u32) -> Option<&str> {
        self.cell(row, col).and_then(|cell| cell.input.formula())
    }

    /// Editable text of a cell: `=source` for formulas, the literal text otherwise
    pub fn input(&self, row: u32, col: u32) -> String {
        self.cell(row, col)
            .map(|cell| cell.input.to_input_string())
            .unwrap_or_default()
    }

    /// Last computed value of a cell
    pub fn value(&self, row: u32, col: u32) -> Option<&Value> {
        self.cell(row, col).and_then(Cell::value)
    }

    /// Last error of a cell
    pub fn error(&self, row: u32, col: u32) -> Option<&FormulaError> {
        self.cell(row, col).and_then(Cell::error)
    }

    /// Current state of a cell
    pub fn state(&self, row: u32, col: u32) -> CellState {
        self.cell(row, col).map_or(CellState::Empty, Cell::state)
    }

    /// Cells holding input, in row-major order
    pub fn occupied_cells(&self) -> Vec<(u32, u32)> {
        let mut ids: Vec<CellId> = self
            .cells
            .iter()
            .filter(|(_, cell)| !cell.input.is_empty())
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| (id.row(), id.col())).collect()
    }

    /// Cells the formula at `(row, col)` reads, in row-major order
    pub fn precedents(&self, row: u32, col: u32) -> Vec<(u32, u32)> {
        let mut ids: Vec<CellId> = self.graph.precedents(CellId::new(row, col)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| (id.row(), id.col())).collect()
    }

    /// Cells whose formulas read `(row, col)` directly, in row-major order
    pub fn dependents(&self, row: u32, col: u32) -> Vec<(u32, u32)> {
        let mut ids: Vec<CellId> = self.graph.dependents(CellId::new(row, col)).collect();
        ids.sort_unstable();
        ids.into_iter().map(|id| (id.row(), id.col())).collect()
    }

    // === Notifications ===

    /// Register a listener; it sees every event, in emission order
    pub fn subscribe<F>(&mut self, listener: F) -> SubscriptionId
    where
        F: FnMut(&CellEvent) + 'static,
    {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener; returns false if it was not registered
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    // === Internals ===

    /// Validate that a cell can be written
    pub(crate) fn target(&self, row: u32, col: u32) -> FormulaResult<CellId> {
        if self.options.limits.contains(row, col) {
            Ok(CellId::new(row, col))
        } else {
            Err(FormulaError::InvalidReference {
                reference: CellAddress::new(row, col).to_a1_string(),
                position: 0,
            })
        }
    }

    /// Install new input for one cell and rewire its edges, without recomputing
    ///
    /// Returns the syntax error when the input is a formula that failed to parse.
    pub(crate) fn install(
        &mut self,
        id: CellId,
        install: Install,
        batch: &mut ChangeBatch,
    ) -> Option<FormulaError> {
        let (row, col) = (id.row(), id.col());

        match install {
            Install::Empty => {
                self.graph.clear_precedents(id);
                let cell = self.cells.entry(id).or_default();
                if cell.input.is_empty() && cell.state == CellState::Empty {
                    return None;
                }
                cell.reset();
                self.emit(
                    CellEvent::FormulaUpdated {
                        row,
                        col,
                        source: String::new(),
                    },
                    batch,
                );
                None
            }
            Install::Literal { text, value } => {
                self.graph.clear_precedents(id);
                self.cells
                    .entry(id)
                    .or_default()
                    .set_literal(text, value.clone());
                self.emit(CellEvent::ValueUpdated { row, col, value }, batch);
                None
            }
            Install::Formula {
                source,
                parsed: Ok(ast),
            } => {
                let precedents = self.precedents_of(&ast);
                for &precedent in &precedents {
                    self.cells.entry(precedent).or_default();
                }
                self.graph.set_precedents(id, precedents);
                self.cells
                    .entry(id)
                    .or_default()
                    .set_formula(source.clone(), Some(ast));
                self.emit(CellEvent::FormulaUpdated { row, col, source }, batch);
                None
            }
            Install::Formula {
                source,
                parsed: Err(err),
            } => {
                self.graph.clear_precedents(id);
                let cell = self.cells.entry(id).or_default();
                cell.set_formula(source.clone(), None);
                cell.set_error(CellState::Errored, err.clone());
                self.emit(CellEvent::FormulaUpdated { row, col, source }, batch);
                self.emit(
                    CellEvent::FormulaError {
                        row,
                        col,
                        error: err.clone(),
                    },
                    batch,
                );
                Some(err)
            }
        }
    }

    /// Cells a formula reads, ranges expanded and clipped to the grid
    ///
    /// Oversized ranges contribute no edges; the cell fails on evaluation.
    fn precedents_of(&self, ast: &Expr) -> Vec<CellId> {
        let mut precedents = Vec::new();
        for reference in references(ast) {
            if reference.range.cell_count() > self.options.max_range_cells {
                continue;
            }
            if let Some(range) = self.options.limits.clip(&reference.range) {
                precedents.extend(range.cells().map(|addr| CellId::new(addr.row, addr.col)));
            }
        }
        precedents
    }

    fn oversized_range(&self, ast: &Expr) -> Option<FormulaError> {
        references(ast)
            .into_iter()
            .find(|reference| reference.range.cell_count() > self.options.max_range_cells)
            .map(|reference| FormulaError::InvalidReference {
                reference: reference.range.to_a1_string(),
                position: reference.position,
            })
    }

    fn evaluate_ast(&self, ast: &Expr) -> FormulaResult<Value> {
        if let Some(err) = self.oversized_range(ast) {
            return Err(err);
        }
        let resolver = GridResolver {
            cells: &self.cells,
            limits: self.options.limits,
        };
        evaluate(ast, &resolver)
    }

    /// Recompute `roots` and every cell transitively reading them
    pub(crate) fn recompute(
        &mut self,
        roots: impl IntoIterator<Item = CellId>,
        batch: &mut ChangeBatch,
    ) {
        let order = self.graph.recalc_order(roots);
        if !order.cyclic.is_empty() {
            let mut cycle: Vec<CellId> = order.cyclic.iter().copied().collect();
            cycle.sort_unstable();
            let names: Vec<String> = cycle.iter().map(ToString::to_string).collect();
            tracing::warn!("Circular dependency detected: {}", names.join(", "));
        }

        let events_before = batch.events.len();
        let recomputed_before = batch.cells_recomputed;

        for &id in &order.order {
            let outcome = match self.cells.get(&id).and_then(|cell| cell.input.ast()) {
                Some(ast) => self.outcome(id, ast, &order),
                // Empty, literal and unparsable cells have nothing to recompute
                None => continue,
            };

            let (row, col) = (id.row(), id.col());
            let cell = self.cells.entry(id).or_default();
            let event = match outcome {
                Outcome::Circular => {
                    cell.set_error(
                        CellState::Circular,
                        FormulaError::CircularDependency { row, col },
                    );
                    CellEvent::CircularDependencyDetected { row, col }
                }
                Outcome::Propagated(error) => {
                    cell.set_error(CellState::Errored, error.clone());
                    CellEvent::FormulaError { row, col, error }
                }
                Outcome::Evaluated(Ok(value)) => {
                    cell.set_result(Ok(value.clone()));
                    CellEvent::ValueUpdated { row, col, value }
                }
                Outcome::Evaluated(Err(error)) => {
                    cell.set_result(Err(error.clone()));
                    CellEvent::FormulaError { row, col, error }
                }
            };

            tracing::trace!("Recomputed {}: {:?}", id, event);
            batch.cells_recomputed += 1;
            self.emit(event, batch);
        }

        tracing::debug!(
            "Recompute finished: {} cells recomputed, {} events",
            batch.cells_recomputed - recomputed_before,
            batch.events.len() - events_before
        );
    }

    fn outcome(&self, id: CellId, ast: &Expr, order: &RecalcOrder) -> Outcome {
        if order.is_cyclic(id) {
            return Outcome::Circular;
        }

        // A cell reading a cycle gets the cycle's error without being evaluated
        let mut precedents: Vec<CellId> = self.graph.precedents(id).collect();
        precedents.sort_unstable();
        for precedent in precedents {
            let circular = self
                .cells
                .get(&precedent)
                .and_then(Cell::error)
                .filter(|err| err.is_circular());
            if let Some(err) = circular {
                return Outcome::Propagated(err.clone());
            }
        }

        Outcome::Evaluated(self.evaluate_ast(ast))
    }

    fn emit(&mut self, event: CellEvent, batch: &mut ChangeBatch) {
        for (_, listener) in self.listeners.iter_mut() {
            listener(&event);
        }
        batch.events.push(event);
    }

    /// Snapshot of one cell's input
    pub(crate) fn input_of(&self, id: CellId) -> CellInput {
        self.cells
            .get(&id)
            .map(|cell| cell.input.clone())
            .unwrap_or_default()
    }
}

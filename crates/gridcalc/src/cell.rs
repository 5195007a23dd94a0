//! Per-cell storage

use gridcalc_formula::{Expr, FormulaError, FormulaResult, Value};

/// Where a cell is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CellState {
    /// Nothing entered
    #[default]
    Empty,
    /// Holds a literal value
    Literal,
    /// Holds a formula that evaluated to a value
    Evaluated,
    /// Holds a formula whose evaluation (or parse) failed
    Errored,
    /// Holds a formula on a dependency cycle
    Circular,
}

/// What the user entered in a cell
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellInput {
    /// Nothing
    #[default]
    Empty,
    /// Literal text and the value sniffed from it
    Literal { text: String, value: Value },
    /// Formula source (no leading `=`) and its AST, if it parsed
    Formula { source: String, ast: Option<Expr> },
}

impl CellInput {
    /// Formula source, if this is a formula
    pub fn formula(&self) -> Option<&str> {
        match self {
            CellInput::Formula { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Parsed formula, if this is a formula that parsed
    pub fn ast(&self) -> Option<&Expr> {
        match self {
            CellInput::Formula { ast, .. } => ast.as_ref(),
            _ => None,
        }
    }

    /// Editable text: `=source` for formulas, the literal text otherwise
    pub fn to_input_string(&self) -> String {
        match self {
            CellInput::Empty => String::new(),
            CellInput::Literal { text, .. } => text.clone(),
            CellInput::Formula { source, .. } => format!("={}", source),
        }
    }

    /// Check whether nothing is entered
    pub fn is_empty(&self) -> bool {
        matches!(self, CellInput::Empty)
    }
}

/// A cell in the engine
#[derive(Debug, Clone, Default)]
pub struct Cell {
    pub(crate) input: CellInput,
    pub(crate) state: CellState,
    pub(crate) value: Option<Value>,
    pub(crate) error: Option<FormulaError>,
}

impl Cell {
    /// What the user entered
    pub fn input(&self) -> &CellInput {
        &self.input
    }

    /// Current state
    pub fn state(&self) -> CellState {
        self.state
    }

    /// Last computed value
    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    /// Last error
    pub fn error(&self) -> Option<&FormulaError> {
        self.error.as_ref()
    }

    /// The cell as other formulas read it
    pub(crate) fn resolve(&self) -> FormulaResult<Option<Value>> {
        match &self.error {
            Some(err) => Err(err.clone()),
            None => Ok(self.value.clone()),
        }
    }

    pub(crate) fn reset(&mut self) {
        *self = Cell::default();
    }

    pub(crate) fn set_literal(&mut self, text: String, value: Value) {
        self.input = CellInput::Literal {
            text,
            value: value.clone(),
        };
        self.state = CellState::Literal;
        self.value = Some(value);
        self.error = None;
    }

    pub(crate) fn set_formula(&mut self, source: String, ast: Option<Expr>) {
        self.input = CellInput::Formula { source, ast };
    }

    pub(crate) fn set_result(&mut self, result: FormulaResult<Value>) {
        match result {
            Ok(value) => {
                self.state = CellState::Evaluated;
                self.value = Some(value);
                self.error = None;
            }
            Err(err) => self.set_error(CellState::Errored, err),
        }
    }

    pub(crate) fn set_error(&mut self, state: CellState, error: FormulaError) {
        self.state = state;
        self.value = None;
        self.error = Some(error);
    }
}

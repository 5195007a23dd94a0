//! Formula error types

use thiserror::Error;

/// Result type for formula operations
pub type FormulaResult<T> = std::result::Result<T, FormulaError>;

/// Broad classification of a [`FormulaError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Malformed formula source
    Syntax,
    /// A function was called with the wrong number of arguments
    QuantityOfArguments,
    /// A function argument had the wrong type
    ArgumentType,
    /// A domain violation inside a function, or an unusable reference
    Formula,
    /// The cell takes part in, or reads from, a dependency cycle
    CircularDependency,
}

/// Errors that can occur during formula parsing or evaluation
///
/// Every variant except [`FormulaError::CircularDependency`] carries the
/// character offset in the formula source it was raised at.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormulaError {
    /// Formula parse error
    #[error("Syntax error at position {position}: {reason}")]
    Syntax { reason: String, position: usize },

    /// Wrong number of arguments
    #[error("Wrong number of arguments for {function}: expected {expected}, got {actual}")]
    ArgumentCount {
        function: String,
        expected: String,
        actual: usize,
        position: usize,
    },

    /// Argument of the wrong type
    #[error("Invalid argument type for {function}: expected {expected}, got {actual}")]
    ArgumentType {
        function: String,
        expected: &'static str,
        actual: &'static str,
        position: usize,
    },

    /// Domain violation (division by zero, logarithm of a non-positive number, ...)
    #[error("{function}: {reason}")]
    Domain {
        function: String,
        reason: String,
        position: usize,
    },

    /// Unknown function
    #[error("Unknown function: {name}")]
    UnknownFunction { name: String, position: usize },

    /// Reference outside the grid, or too large to track
    #[error("Invalid reference: {reference}")]
    InvalidReference { reference: String, position: usize },

    /// Circular reference through the given cell
    #[error("Circular dependency detected at row {row}, column {col}")]
    CircularDependency { row: u32, col: u32 },
}

impl FormulaError {
    /// Create a syntax error
    pub fn syntax(reason: impl Into<String>, position: usize) -> Self {
        FormulaError::Syntax {
            reason: reason.into(),
            position,
        }
    }

    /// Create a domain error raised by `function`
    pub fn domain(function: &str, reason: impl Into<String>, position: usize) -> Self {
        FormulaError::Domain {
            function: function.to_string(),
            reason: reason.into(),
            position,
        }
    }

    /// The broad classification of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            FormulaError::Syntax { .. } => ErrorKind::Syntax,
            FormulaError::ArgumentCount { .. } => ErrorKind::QuantityOfArguments,
            FormulaError::ArgumentType { .. } => ErrorKind::ArgumentType,
            FormulaError::Domain { .. }
            | FormulaError::UnknownFunction { .. }
            | FormulaError::InvalidReference { .. } => ErrorKind::Formula,
            FormulaError::CircularDependency { .. } => ErrorKind::CircularDependency,
        }
    }

    /// Source offset the error was raised at, if it has one
    pub fn position(&self) -> Option<usize> {
        match self {
            FormulaError::Syntax { position, .. }
            | FormulaError::ArgumentCount { position, .. }
            | FormulaError::ArgumentType { position, .. }
            | FormulaError::Domain { position, .. }
            | FormulaError::UnknownFunction { position, .. }
            | FormulaError::InvalidReference { position, .. } => Some(*position),
            FormulaError::CircularDependency { .. } => None,
        }
    }

    /// Check whether this is a circular dependency error
    pub fn is_circular(&self) -> bool {
        matches!(self, FormulaError::CircularDependency { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_and_position() {
        let err = FormulaError::syntax("unexpected ')'", 4);
        assert_eq!(err.kind(), ErrorKind::Syntax);
        assert_eq!(err.position(), Some(4));

        let err = FormulaError::domain("SQRT", "negative argument", 0);
        assert_eq!(err.kind(), ErrorKind::Formula);
        assert_eq!(err.to_string(), "SQRT: negative argument");

        let err = FormulaError::CircularDependency { row: 0, col: 0 };
        assert_eq!(err.kind(), ErrorKind::CircularDependency);
        assert_eq!(err.position(), None);
        assert!(err.is_circular());
    }
}

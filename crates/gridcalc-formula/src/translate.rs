//! Reference translation for copied formulas

use crate::ast::{CellRef, Expr, ExprKind, RangeRef};
use crate::error::{FormulaError, FormulaResult};
use gridcalc_core::GridLimits;

/// Shift every relative reference in `expr` by the given offsets
///
/// Absolute axes stay where they are. A reference pushed off the grid fails
/// with [`FormulaError::InvalidReference`] at that reference's position.
pub fn translate(
    expr: &Expr,
    row_offset: i64,
    col_offset: i64,
    limits: &GridLimits,
) -> FormulaResult<Expr> {
    let shifter = Shifter {
        row_offset,
        col_offset,
        limits,
    };
    shifter.expr(expr)
}

struct Shifter<'a> {
    row_offset: i64,
    col_offset: i64,
    limits: &'a GridLimits,
}

impl Shifter<'_> {
    fn expr(&self, expr: &Expr) -> FormulaResult<Expr> {
        let kind = match &expr.kind {
            ExprKind::Literal(value) => ExprKind::Literal(value.clone()),
            ExprKind::CellRef(cell) => {
                let shifted = self.cell(cell).ok_or_else(|| FormulaError::InvalidReference {
                    reference: cell.to_string(),
                    position: expr.position,
                })?;
                ExprKind::CellRef(shifted)
            }
            ExprKind::RangeRef(range) => {
                let shifted = self
                    .cell(&range.start)
                    .zip(self.cell(&range.end))
                    .ok_or_else(|| FormulaError::InvalidReference {
                        reference: range.to_string(),
                        position: expr.position,
                    })?;
                ExprKind::RangeRef(RangeRef {
                    start: shifted.0,
                    end: shifted.1,
                })
            }
            ExprKind::UnaryOp { op, operand } => ExprKind::UnaryOp {
                op: *op,
                operand: Box::new(self.expr(operand)?),
            },
            ExprKind::BinaryOp { op, left, right } => ExprKind::BinaryOp {
                op: *op,
                left: Box::new(self.expr(left)?),
                right: Box::new(self.expr(right)?),
            },
            ExprKind::Call { name, args } => ExprKind::Call {
                name: name.clone(),
                args: args
                    .iter()
                    .map(|arg| self.expr(arg))
                    .collect::<FormulaResult<Vec<_>>>()?,
            },
        };
        Ok(Expr::new(kind, expr.position))
    }

    fn cell(&self, cell: &CellRef) -> Option<CellRef> {
        let shifted = cell.address().offset(self.row_offset, self.col_offset)?;
        self.limits
            .contains(shifted.row, shifted.col)
            .then(|| CellRef::from(shifted))
    }
}

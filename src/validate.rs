//! Arithmetic request validation.
//!
//! Everything here is checkable without constructing a single line
//! solution set: shape, per-line feasibility bounds, global totals, and
//! reveal well-formedness. Anything deeper is the constraint engine's job.

use thiserror::Error;

use crate::constants::*;
use crate::types::AnalyzeRequest;

/// Rejection reasons, each carrying the offending line or cell.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("expected exactly {BOARD_SIZE} {axis} constraints, got {got}")]
    BadShape { axis: &'static str, got: usize },

    #[error(
        "{axis} {index}: sum {sum} with {zeros} voltorbs is infeasible \
         for five cells valued 0-3"
    )]
    BadRange {
        axis: &'static str,
        index: usize,
        sum: i32,
        zeros: i32,
    },

    #[error("row totals and column totals disagree ({kind}: rows {rows}, cols {cols})")]
    BadTotals {
        kind: &'static str,
        rows: i32,
        cols: i32,
    },

    #[error("revealed cell ({row}, {col}): {reason}")]
    BadReveal {
        row: i32,
        col: i32,
        reason: &'static str,
    },

    #[error("revealed coordinate ({row}, {col}) is outside the board")]
    OutOfBounds { row: i32, col: i32 },
}

/// Accept or reject a request on arithmetic grounds alone.
pub fn validate(request: &AnalyzeRequest) -> Result<(), ValidationError> {
    if request.rows.len() != BOARD_SIZE {
        return Err(ValidationError::BadShape {
            axis: "row",
            got: request.rows.len(),
        });
    }
    if request.cols.len() != BOARD_SIZE {
        return Err(ValidationError::BadShape {
            axis: "col",
            got: request.cols.len(),
        });
    }

    for (axis, constraints) in [("row", &request.rows), ("col", &request.cols)] {
        for (index, line) in constraints.iter().enumerate() {
            if !line_feasible(line.sum, line.voltorbs) {
                return Err(ValidationError::BadRange {
                    axis,
                    index,
                    sum: line.sum,
                    zeros: line.voltorbs,
                });
            }
        }
    }

    let row_sum: i32 = request.rows.iter().map(|l| l.sum).sum();
    let col_sum: i32 = request.cols.iter().map(|l| l.sum).sum();
    if row_sum != col_sum {
        return Err(ValidationError::BadTotals {
            kind: "sum",
            rows: row_sum,
            cols: col_sum,
        });
    }

    let row_zeros: i32 = request.rows.iter().map(|l| l.voltorbs).sum();
    let col_zeros: i32 = request.cols.iter().map(|l| l.voltorbs).sum();
    if row_zeros != col_zeros {
        return Err(ValidationError::BadTotals {
            kind: "voltorbs",
            rows: row_zeros,
            cols: col_zeros,
        });
    }

    let mut seen = [false; NUM_CELLS];
    for tile in &request.revealed {
        let [row, col] = tile.position;
        if row < 0 || row >= BOARD_SIZE as i32 || col < 0 || col >= BOARD_SIZE as i32 {
            return Err(ValidationError::OutOfBounds { row, col });
        }
        if tile.value < 0 || tile.value > MAX_CELL_VALUE as i32 {
            return Err(ValidationError::BadReveal {
                row,
                col,
                reason: "value must be one of 0, 1, 2, 3",
            });
        }
        let idx = cell_index(row as usize, col as usize);
        if seen[idx] {
            return Err(ValidationError::BadReveal {
                row,
                col,
                reason: "coordinate revealed more than once",
            });
        }
        seen[idx] = true;
    }

    Ok(())
}

/// With `zeros` zero cells, the remaining `5 - zeros` cells each
/// contribute 1..=3, so the sum must land in that band.
fn line_feasible(sum: i32, zeros: i32) -> bool {
    if !(0..=BOARD_SIZE as i32).contains(&zeros) {
        return false;
    }
    let nonzero = BOARD_SIZE as i32 - zeros;
    sum >= nonzero && sum <= 3 * nonzero
}

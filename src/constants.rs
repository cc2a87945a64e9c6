//! Board constants and line indexing.
//!
//! The board is a fixed 5×5 grid. Lines are numbered 0..10: rows first
//! (line 0..5 = row 0..5), then columns (line 5..10 = column 0..5). Both
//! the propagation work-queue and all reported line indices use this
//! numbering.

/// Grid side length.
pub const BOARD_SIZE: usize = 5;

/// Total cell count (25).
pub const NUM_CELLS: usize = BOARD_SIZE * BOARD_SIZE;

/// Rows plus columns (10).
pub const NUM_LINES: usize = 2 * BOARD_SIZE;

/// Largest value a cell can hide. Domains are subsets of {0..=3}.
pub const MAX_CELL_VALUE: u8 = 3;

/// Line-visit bound for propagation. Arc consistency over 10 lines
/// converges in far fewer visits; exceeding this is an internal error.
pub const MAX_LINE_VISITS: usize = 10 * NUM_LINES;

/// Default cap on sampling attempts per request.
pub const DEFAULT_SAMPLE_BUDGET: usize = 20_000;

/// Default estimator deadline in milliseconds.
pub const DEFAULT_WALLCLOCK_MS: u64 = 2_000;

/// Level mode: advise quitting when every hidden cell's hazard
/// probability exceeds this.
pub const DEFAULT_QUIT_THRESHOLD_LEVEL: f64 = 0.45;

/// Profit mode: advise quitting when the best risk-adjusted expected
/// value falls below this (the 1-multiplier baseline).
pub const DEFAULT_QUIT_THRESHOLD_PROFIT: f64 = 1.0;

/// Risk-tier boundaries: p_voltorb ≤ low is Low, ≤ medium is Medium.
pub const DEFAULT_LOW_RISK: f64 = 0.15;
pub const DEFAULT_MEDIUM_RISK: f64 = 0.35;

/// Below this many accepted samples the estimate is flagged low-confidence.
pub const MIN_CONFIDENT_ACCEPTS: u64 = 100;

/// Flat cell index for (row, col).
#[inline(always)]
pub fn cell_index(row: usize, col: usize) -> usize {
    debug_assert!(row < BOARD_SIZE && col < BOARD_SIZE);
    row * BOARD_SIZE + col
}

/// Line index of a row.
#[inline(always)]
pub fn row_line(row: usize) -> usize {
    row
}

/// Line index of a column.
#[inline(always)]
pub fn col_line(col: usize) -> usize {
    BOARD_SIZE + col
}

/// The five cell indices of a line, in position order.
#[inline]
pub fn line_cells(line: usize) -> [usize; BOARD_SIZE] {
    debug_assert!(line < NUM_LINES);
    let mut cells = [0usize; BOARD_SIZE];
    if line < BOARD_SIZE {
        for (k, cell) in cells.iter_mut().enumerate() {
            *cell = cell_index(line, k);
        }
    } else {
        for (k, cell) in cells.iter_mut().enumerate() {
            *cell = cell_index(k, line - BOARD_SIZE);
        }
    }
    cells
}

/// The other line through position `k` of `line`: a row's cell k sits in
/// column k, and vice versa.
#[inline(always)]
pub fn crossing_line(line: usize, k: usize) -> usize {
    if line < BOARD_SIZE {
        col_line(k)
    } else {
        row_line(k)
    }
}

/// Human-readable line label ("row 0" .. "col 4") for error messages.
pub fn line_label(line: usize) -> String {
    if line < BOARD_SIZE {
        format!("row {}", line)
    } else {
        format!("col {}", line - BOARD_SIZE)
    }
}

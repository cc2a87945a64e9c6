//! Distribution estimator: per-cell marginals over the feasible board set.
//!
//! Row solution sets are enumerated once per request. Two paths:
//!
//! - **Exact**: when the product of row solution-set sizes fits inside the
//!   sample budget, walk the full cross product of row configurations,
//!   keep the boards whose columns meet their targets, and count exact
//!   frequencies. Covers the all-rows-singleton case with a product of 1.
//! - **Sampling**: draw one uniform configuration per row, reject on any
//!   column violation, tally accepted boards. Uniform row proposals give
//!   every feasible board equal proposal mass, so acceptance counting is
//!   asymptotically unbiased.
//!
//! Sampling fans out over rayon workers. Each worker owns its RNG
//! (`SmallRng` seeded from the request seed plus the worker index) and a
//! private tally; tallies are merged in worker order, so seeded runs are
//! reproducible as long as the wall-clock deadline does not fire.

use std::time::{Duration, Instant};

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::constants::*;
use crate::line_mechanics::{enumerate_line_configs, LineConfig};
use crate::types::{AnalyzeConfig, Board, LineTargets};

/// Fixed sampling fan-out. Keeping this independent of the machine's
/// thread count makes seeded runs reproducible everywhere.
const NUM_WORKERS: usize = 8;

/// How often a worker polls the deadline.
const DEADLINE_STRIDE: usize = 64;

/// Per-cell tallies of value occurrences across accepted boards.
type Tally = [[u64; 4]; NUM_CELLS];

/// Marginals plus estimate provenance.
pub struct EstimateResult {
    /// `marginals[cell][v]` is P(cell = v) over the feasible set.
    pub marginals: [[f64; 4]; NUM_CELLS],
    /// Accepted boards (feasible-board count on the exact path).
    pub accepted: u64,
    /// Attempts spent (cross-product size on the exact path).
    pub attempts: u64,
    /// Too few accepts to trust the tallies.
    pub low_confidence: bool,
    /// Whether the exact path ran.
    pub exact: bool,
}

/// Estimate marginals for the post-propagation board.
pub fn estimate(board: &Board, config: &AnalyzeConfig) -> EstimateResult {
    let row_sets: Vec<Vec<LineConfig>> = (0..BOARD_SIZE)
        .map(|row| {
            enumerate_line_configs(&board.line_domains(row_line(row)), board.rows[row])
        })
        .collect();

    let product = row_sets
        .iter()
        .fold(1u128, |acc, set| acc.saturating_mul(set.len() as u128));

    // A row with no configurations never survives propagation; if one
    // shows up anyway there is nothing to draw from.
    if product == 0 {
        return EstimateResult {
            marginals: normalize(board, &[[0; 4]; NUM_CELLS], 0),
            accepted: 0,
            attempts: 0,
            low_confidence: true,
            exact: true,
        };
    }

    let (tally, accepted, attempts, exact) = if product <= config.sample_budget as u128 {
        let (tally, accepted) = enumerate_joint(&row_sets, &board.cols);
        (tally, accepted, product as u64, true)
    } else {
        let (tally, accepted, attempts) = sample_rejection(&row_sets, &board.cols, config);
        (tally, accepted, attempts, false)
    };

    let low_confidence = accepted == 0 || (!exact && accepted < MIN_CONFIDENT_ACCEPTS);
    EstimateResult {
        marginals: normalize(board, &tally, accepted),
        accepted,
        attempts,
        low_confidence,
        exact,
    }
}

/// Exact path: full cross product of row configurations, column-filtered.
fn enumerate_joint(
    row_sets: &[Vec<LineConfig>],
    cols: &[LineTargets; BOARD_SIZE],
) -> (Tally, u64) {
    let mut tally = [[0u64; 4]; NUM_CELLS];
    let mut accepted = 0u64;
    let mut cursor = [0usize; BOARD_SIZE];

    loop {
        let mut grid = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (row, &i) in cursor.iter().enumerate() {
            grid[row] = row_sets[row][i];
        }
        if columns_ok(&grid, cols) {
            accepted += 1;
            record(&mut tally, &grid);
        }

        // Odometer increment over the row cursors.
        let mut row = 0;
        loop {
            cursor[row] += 1;
            if cursor[row] < row_sets[row].len() {
                break;
            }
            cursor[row] = 0;
            row += 1;
            if row == BOARD_SIZE {
                return (tally, accepted);
            }
        }
    }
}

/// Sampling path: uniform row draws with column rejection.
fn sample_rejection(
    row_sets: &[Vec<LineConfig>],
    cols: &[LineTargets; BOARD_SIZE],
    config: &AnalyzeConfig,
) -> (Tally, u64, u64) {
    let seed = config.seed.unwrap_or_else(|| rand::rng().random());
    let deadline = Instant::now() + Duration::from_millis(config.wallclock_ms);

    let base = config.sample_budget / NUM_WORKERS;
    let remainder = config.sample_budget % NUM_WORKERS;

    let results: Vec<(Tally, u64, u64)> = (0..NUM_WORKERS)
        .into_par_iter()
        .map(|worker| {
            let budget = base + usize::from(worker < remainder);
            let mut rng = SmallRng::seed_from_u64(seed.wrapping_add(worker as u64));
            sample_worker(row_sets, cols, budget, deadline, &mut rng)
        })
        .collect();

    let mut tally = [[0u64; 4]; NUM_CELLS];
    let mut accepted = 0u64;
    let mut attempts = 0u64;
    for (worker_tally, worker_accepted, worker_attempts) in results {
        for (cell, counts) in tally.iter_mut().enumerate() {
            for (value, count) in counts.iter_mut().enumerate() {
                *count += worker_tally[cell][value];
            }
        }
        accepted += worker_accepted;
        attempts += worker_attempts;
    }
    (tally, accepted, attempts)
}

fn sample_worker(
    row_sets: &[Vec<LineConfig>],
    cols: &[LineTargets; BOARD_SIZE],
    budget: usize,
    deadline: Instant,
    rng: &mut SmallRng,
) -> (Tally, u64, u64) {
    let mut tally = [[0u64; 4]; NUM_CELLS];
    let mut accepted = 0u64;
    let mut attempts = 0u64;

    for attempt in 0..budget {
        if attempt % DEADLINE_STRIDE == 0 && Instant::now() >= deadline {
            break;
        }
        attempts += 1;

        let mut grid = [[0u8; BOARD_SIZE]; BOARD_SIZE];
        for (row, set) in row_sets.iter().enumerate() {
            grid[row] = set[rng.random_range(0..set.len())];
        }
        if columns_ok(&grid, cols) {
            accepted += 1;
            record(&mut tally, &grid);
        }
    }

    (tally, accepted, attempts)
}

/// Rows satisfy their targets by construction; accept iff every column
/// meets both of its targets too.
fn columns_ok(grid: &[[u8; BOARD_SIZE]; BOARD_SIZE], cols: &[LineTargets; BOARD_SIZE]) -> bool {
    for col in 0..BOARD_SIZE {
        let mut sum = 0u8;
        let mut zeros = 0u8;
        for row in grid {
            sum += row[col];
            zeros += (row[col] == 0) as u8;
        }
        if sum != cols[col].sum || zeros != cols[col].zeros {
            return false;
        }
    }
    true
}

fn record(tally: &mut Tally, grid: &[[u8; BOARD_SIZE]; BOARD_SIZE]) {
    for (row, values) in grid.iter().enumerate() {
        for (col, &value) in values.iter().enumerate() {
            tally[cell_index(row, col)][value as usize] += 1;
        }
    }
}

/// Tallies to probabilities. With zero accepts, fall back to a uniform
/// distribution over each cell's domain (singleton cells stay exact).
fn normalize(board: &Board, tally: &Tally, accepted: u64) -> [[f64; 4]; NUM_CELLS] {
    let mut marginals = [[0.0f64; 4]; NUM_CELLS];
    for cell in 0..NUM_CELLS {
        if accepted > 0 {
            for value in 0..4 {
                marginals[cell][value] = tally[cell][value] as f64 / accepted as f64;
            }
        } else {
            let domain = board.domains[cell];
            let mass = 1.0 / domain.len() as f64;
            for value in domain.iter() {
                marginals[cell][value as usize] = mass;
            }
        }
    }
    marginals
}

//! Core data structures: cell domains, the board, and the wire records.
//!
//! The central type is [`Board`], which holds the 25 cell domains and the
//! ten line targets for one request. It is built fresh per request by
//! [`crate::propagation::build_board`], mutated only during propagation,
//! and read-only for the estimator and policy layers.
//!
//! Wire records ([`AnalyzeRequest`], [`AnalysisResponse`] and friends)
//! carry the external interface; `serde` derives keep them in lockstep
//! with the JSON schema.

use serde::{Deserialize, Serialize};

use crate::constants::*;

/// Grid coordinate as (row, col). Serializes as a two-element array.
pub type Position = (usize, usize);

// ── Cell domains ────────────────────────────────────────────────────

/// Feasible value set for one cell, as a 4-bit mask (bit v = value v).
///
/// Non-empty at every externally observable point; an empty mask mid-
/// propagation is a contradiction and aborts the request.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct DomainMask(u8);

impl DomainMask {
    /// The unconstrained domain {0,1,2,3}.
    pub const FULL: DomainMask = DomainMask(0b1111);
    /// The contradictory empty domain.
    pub const EMPTY: DomainMask = DomainMask(0);

    /// Domain containing exactly `value`.
    #[inline(always)]
    pub fn singleton(value: u8) -> Self {
        debug_assert!(value <= MAX_CELL_VALUE);
        DomainMask(1 << value)
    }

    #[inline(always)]
    pub fn contains(self, value: u8) -> bool {
        value <= MAX_CELL_VALUE && self.0 & (1 << value) != 0
    }

    #[inline(always)]
    pub fn insert(&mut self, value: u8) {
        debug_assert!(value <= MAX_CELL_VALUE);
        self.0 |= 1 << value;
    }

    #[inline(always)]
    pub fn intersect(self, other: DomainMask) -> DomainMask {
        DomainMask(self.0 & other.0)
    }

    #[inline(always)]
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    #[inline(always)]
    pub fn len(self) -> u32 {
        self.0.count_ones()
    }

    #[inline(always)]
    pub fn is_singleton(self) -> bool {
        self.0.count_ones() == 1
    }

    /// The single value, if the domain is a singleton.
    #[inline(always)]
    pub fn value(self) -> Option<u8> {
        if self.is_singleton() {
            Some(self.0.trailing_zeros() as u8)
        } else {
            None
        }
    }

    /// True when 0 is not in the domain: the cell is provably safe.
    #[inline(always)]
    pub fn excludes_zero(self) -> bool {
        !self.is_empty() && self.0 & 1 == 0
    }

    /// True when the domain is exactly {0}: the cell is provably a hazard.
    #[inline(always)]
    pub fn is_hazard_only(self) -> bool {
        self.0 == 1
    }

    /// True when every member is 0 or 1 — nothing worth 2+ can hide here.
    #[inline(always)]
    pub fn within_zero_one(self) -> bool {
        self.0 & 0b1100 == 0
    }

    /// Values in ascending order.
    pub fn iter(self) -> impl Iterator<Item = u8> {
        (0..=MAX_CELL_VALUE).filter(move |&v| self.contains(v))
    }
}

// ── Board ───────────────────────────────────────────────────────────

/// Sum and zero-count targets for one row or column.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LineTargets {
    pub sum: u8,
    pub zeros: u8,
}

/// One request's board: 25 cell domains plus the ten line targets.
///
/// `revealed[i]` marks cells whose value was asserted by the caller, as
/// opposed to singletons derived by propagation (those are *forced*).
pub struct Board {
    pub domains: [DomainMask; NUM_CELLS],
    pub rows: [LineTargets; BOARD_SIZE],
    pub cols: [LineTargets; BOARD_SIZE],
    pub revealed: [bool; NUM_CELLS],
}

impl Board {
    pub fn new(rows: [LineTargets; BOARD_SIZE], cols: [LineTargets; BOARD_SIZE]) -> Self {
        Board {
            domains: [DomainMask::FULL; NUM_CELLS],
            rows,
            cols,
            revealed: [false; NUM_CELLS],
        }
    }

    /// Targets for a line in work-queue numbering (rows then cols).
    #[inline(always)]
    pub fn line_targets(&self, line: usize) -> LineTargets {
        if line < BOARD_SIZE {
            self.rows[line]
        } else {
            self.cols[line - BOARD_SIZE]
        }
    }

    /// Domains of a line's five cells, in position order.
    #[inline]
    pub fn line_domains(&self, line: usize) -> [DomainMask; BOARD_SIZE] {
        let cells = line_cells(line);
        let mut out = [DomainMask::EMPTY; BOARD_SIZE];
        for (k, &cell) in cells.iter().enumerate() {
            out[k] = self.domains[cell];
        }
        out
    }

    #[inline(always)]
    pub fn is_revealed(&self, row: usize, col: usize) -> bool {
        self.revealed[cell_index(row, col)]
    }

    pub fn any_revealed(&self) -> bool {
        self.revealed.iter().any(|&r| r)
    }

    /// Positions not asserted by the caller, in row-major order.
    pub fn unrevealed_positions(&self) -> Vec<Position> {
        let mut out = Vec::new();
        for row in 0..BOARD_SIZE {
            for col in 0..BOARD_SIZE {
                if !self.is_revealed(row, col) {
                    out.push((row, col));
                }
            }
        }
        out
    }
}

// ── Request records ─────────────────────────────────────────────────

/// Ranking objective.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Survival-first: minimize hazard probability.
    Level,
    /// Reward-first: maximize risk-adjusted expected value.
    Profit,
}

/// One row or column constraint as it arrives on the wire. Signed so that
/// out-of-range values reach the validator instead of failing to parse.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct LineConstraint {
    pub sum: i32,
    pub voltorbs: i32,
}

/// A cell the caller has already flipped.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct RevealedTile {
    pub position: [i32; 2],
    pub value: i32,
}

/// The analysis request: constraints, reveals, and the active objective.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalyzeRequest {
    pub mode: Mode,
    pub rows: Vec<LineConstraint>,
    pub cols: Vec<LineConstraint>,
    #[serde(default)]
    pub revealed: Vec<RevealedTile>,
}

// ── Response records ────────────────────────────────────────────────

/// Qualitative hazard bucket attached to every recommendation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskTier {
    Safe,
    Low,
    Medium,
    High,
}

/// Round classification after propagation.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameState {
    Active,
    Won,
    Lost,
}

/// A singleton domain discovered by propagation, not asserted by the caller.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub struct ForcedValue {
    pub row: usize,
    pub col: usize,
    pub value: u8,
}

/// One ranked move. `distribution[v]` is the marginal mass of value v.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Recommendation {
    pub position: Position,
    pub p_voltorb: f64,
    pub expected_value: f64,
    pub risk_tier: RiskTier,
    pub distribution: [f64; 4],
}

/// The full analysis result returned to the caller.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnalysisResponse {
    pub guaranteed_safe: Vec<Position>,
    pub guaranteed_voltorb: Vec<Position>,
    pub forced_values: Vec<ForcedValue>,
    pub recommendations: Vec<Recommendation>,
    pub quit_recommended: bool,
    /// Level mode only: chance the advised flip survives. Null in profit mode.
    pub survival_probability: Option<f64>,
    pub explanation: String,
    pub mode: Mode,
    pub game_state: GameState,
    /// Set when the estimate degraded (too few accepted samples).
    pub low_confidence: bool,
    /// Accepted sample count; equals the feasible-board count on the exact path.
    pub samples: u64,
}

// ── Configuration ───────────────────────────────────────────────────

/// Risk-tier thresholds: p_voltorb = safe is Safe, ≤ low is Low,
/// ≤ medium is Medium, above is High.
#[derive(Clone, Copy, Debug)]
pub struct RiskTiers {
    pub safe: f64,
    pub low: f64,
    pub medium: f64,
}

impl Default for RiskTiers {
    fn default() -> Self {
        RiskTiers {
            safe: 0.0,
            low: DEFAULT_LOW_RISK,
            medium: DEFAULT_MEDIUM_RISK,
        }
    }
}

/// Request-scoped tuning knobs, passed explicitly through the pipeline.
/// A seeded config makes the whole analysis reproducible.
#[derive(Clone, Copy, Debug)]
pub struct AnalyzeConfig {
    /// Maximum sampling attempts.
    pub sample_budget: usize,
    /// Estimator deadline.
    pub wallclock_ms: u64,
    /// RNG seed; `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    pub quit_threshold_level: f64,
    pub quit_threshold_profit: f64,
    pub risk_tiers: RiskTiers,
}

impl Default for AnalyzeConfig {
    fn default() -> Self {
        AnalyzeConfig {
            sample_budget: DEFAULT_SAMPLE_BUDGET,
            wallclock_ms: DEFAULT_WALLCLOCK_MS,
            seed: None,
            quit_threshold_level: DEFAULT_QUIT_THRESHOLD_LEVEL,
            quit_threshold_profit: DEFAULT_QUIT_THRESHOLD_PROFIT,
            risk_tiers: RiskTiers::default(),
        }
    }
}

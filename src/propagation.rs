//! Constraint engine: build, propagate, extract deductions.
//!
//! Propagation is arc consistency at line granularity. Each dirty line's
//! solution set is enumerated from the current domains and every cell
//! domain is cut down to its per-position projection; any domain change
//! dirties the cell's crossing line. The work-queue is seeded rows 0-4
//! then cols 0-4, so runs are reproducible (ordering does not affect the
//! fixpoint, arc consistency is confluent).
//!
//! This module has exclusive ownership of domain mutation: the estimator
//! and policy layers only ever read the post-propagation board.

use std::collections::VecDeque;

use thiserror::Error;

use crate::constants::*;
use crate::line_mechanics::{config_projection, enumerate_line_configs};
use crate::types::{AnalyzeRequest, Board, DomainMask, ForcedValue, LineTargets, Position};

/// What emptied first when a line became unsatisfiable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContradictionKind {
    /// No configuration of the line meets its targets.
    EmptySolutionSet,
    /// A cell's domain lost its last value.
    EmptyDomain,
}

impl std::fmt::Display for ContradictionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContradictionKind::EmptySolutionSet => write!(f, "no valid configuration"),
            ContradictionKind::EmptyDomain => write!(f, "a cell domain emptied"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PropagationError {
    #[error("contradiction in {}: {kind}", line_label(*.line))]
    Contradiction { line: usize, kind: ContradictionKind },

    /// Fixpoint not reached within the visit bound. Arc consistency
    /// terminates, so hitting this indicates a broken invariant.
    #[error("propagation exceeded {MAX_LINE_VISITS} line visits without converging")]
    VisitBoundExceeded,
}

/// Initialize domains from a validated request: revealed cells collapse
/// to singletons, everything else starts at {0,1,2,3}.
pub fn build_board(request: &AnalyzeRequest) -> Board {
    let mut rows = [LineTargets { sum: 0, zeros: 0 }; BOARD_SIZE];
    let mut cols = [LineTargets { sum: 0, zeros: 0 }; BOARD_SIZE];
    for i in 0..BOARD_SIZE {
        rows[i] = LineTargets {
            sum: request.rows[i].sum as u8,
            zeros: request.rows[i].voltorbs as u8,
        };
        cols[i] = LineTargets {
            sum: request.cols[i].sum as u8,
            zeros: request.cols[i].voltorbs as u8,
        };
    }

    let mut board = Board::new(rows, cols);
    for tile in &request.revealed {
        let idx = cell_index(tile.position[0] as usize, tile.position[1] as usize);
        board.domains[idx] = DomainMask::singleton(tile.value as u8);
        board.revealed[idx] = true;
    }
    board
}

/// Drive the board to fixpoint. On success every cell domain equals the
/// projection of both of its lines' solution sets at that position.
pub fn propagate(board: &mut Board) -> Result<(), PropagationError> {
    let mut queue: VecDeque<usize> = (0..NUM_LINES).collect();
    let mut queued = [true; NUM_LINES];
    let mut visits = 0usize;

    while let Some(line) = queue.pop_front() {
        queued[line] = false;
        visits += 1;
        if visits > MAX_LINE_VISITS {
            return Err(PropagationError::VisitBoundExceeded);
        }

        let domains = board.line_domains(line);
        let configs = enumerate_line_configs(&domains, board.line_targets(line));
        if configs.is_empty() {
            return Err(PropagationError::Contradiction {
                line,
                kind: ContradictionKind::EmptySolutionSet,
            });
        }

        let projection = config_projection(&configs);
        let cells = line_cells(line);
        for (k, &cell) in cells.iter().enumerate() {
            let narrowed = board.domains[cell].intersect(projection[k]);
            if narrowed.is_empty() {
                return Err(PropagationError::Contradiction {
                    line,
                    kind: ContradictionKind::EmptyDomain,
                });
            }
            if narrowed != board.domains[cell] {
                board.domains[cell] = narrowed;
                let crossing = crossing_line(line, k);
                if !queued[crossing] {
                    queued[crossing] = true;
                    queue.push_back(crossing);
                }
            }
        }
    }

    Ok(())
}

/// Logical guarantees read off the post-propagation domains.
#[derive(Debug, Default)]
pub struct Deductions {
    /// Cells whose domain excludes 0 (revealed safe cells included).
    pub safe: Vec<Position>,
    /// Cells whose domain is exactly {0}.
    pub hazards: Vec<Position>,
    /// Singleton domains not asserted by the caller.
    pub forced: Vec<ForcedValue>,
}

impl Deductions {
    /// True when propagation proved nothing beyond the caller's reveals.
    pub fn is_empty(&self) -> bool {
        self.safe.is_empty() && self.hazards.is_empty() && self.forced.is_empty()
    }
}

pub fn extract_deductions(board: &Board) -> Deductions {
    let mut out = Deductions::default();
    for row in 0..BOARD_SIZE {
        for col in 0..BOARD_SIZE {
            let domain = board.domains[cell_index(row, col)];
            if domain.excludes_zero() {
                out.safe.push((row, col));
            }
            if domain.is_hazard_only() {
                out.hazards.push((row, col));
            }
            if let Some(value) = domain.value() {
                if !board.is_revealed(row, col) {
                    out.forced.push(ForcedValue { row, col, value });
                }
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineConstraint, Mode, RevealedTile};

    fn request(
        rows: [(i32, i32); 5],
        cols: [(i32, i32); 5],
        revealed: Vec<RevealedTile>,
    ) -> AnalyzeRequest {
        AnalyzeRequest {
            mode: Mode::Level,
            rows: rows
                .iter()
                .map(|&(sum, voltorbs)| LineConstraint { sum, voltorbs })
                .collect(),
            cols: cols
                .iter()
                .map(|&(sum, voltorbs)| LineConstraint { sum, voltorbs })
                .collect(),
            revealed,
        }
    }

    #[test]
    fn test_build_collapses_reveals() {
        let req = request(
            [(5, 0); 5],
            [(5, 0); 5],
            vec![RevealedTile {
                position: [2, 3],
                value: 1,
            }],
        );
        let board = build_board(&req);
        assert_eq!(board.domains[cell_index(2, 3)].value(), Some(1));
        assert!(board.is_revealed(2, 3));
        assert_eq!(board.domains[cell_index(0, 0)], DomainMask::FULL);
    }

    #[test]
    fn test_uniform_board_forces_all_ones() {
        let req = request([(5, 0); 5], [(5, 0); 5], vec![]);
        let mut board = build_board(&req);
        propagate(&mut board).unwrap();
        for idx in 0..NUM_CELLS {
            assert_eq!(board.domains[idx].value(), Some(1));
        }
        let deductions = extract_deductions(&board);
        assert_eq!(deductions.safe.len(), NUM_CELLS);
        assert_eq!(deductions.forced.len(), NUM_CELLS);
        assert!(deductions.hazards.is_empty());
    }

    #[test]
    fn test_hazard_row_collapses_to_zeros() {
        // Row 0 is all voltorbs; remaining rows all ones.
        let req = request(
            [(0, 5), (5, 0), (5, 0), (5, 0), (5, 0)],
            [(4, 1); 5],
            vec![],
        );
        let mut board = build_board(&req);
        propagate(&mut board).unwrap();
        for col in 0..BOARD_SIZE {
            assert!(board.domains[cell_index(0, col)].is_hazard_only());
        }
        let deductions = extract_deductions(&board);
        assert_eq!(deductions.hazards.len(), 5);
        assert_eq!(deductions.safe.len(), 20);
    }

    #[test]
    fn test_contradictory_reveal_names_line() {
        let req = request(
            [(5, 0); 5],
            [(5, 0); 5],
            vec![RevealedTile {
                position: [0, 0],
                value: 0,
            }],
        );
        let mut board = build_board(&req);
        let err = propagate(&mut board).unwrap_err();
        match err {
            PropagationError::Contradiction { line, .. } => assert_eq!(line, row_line(0)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_cross_line_deduction() {
        // Cols 1-4 force ones everywhere they touch, which pins (0, 0)
        // to the row-0 remainder of 3.
        let req = request(
            [(7, 0), (5, 0), (5, 0), (5, 0), (5, 0)],
            [(7, 0), (5, 0), (5, 0), (5, 0), (5, 0)],
            vec![],
        );
        let mut board = build_board(&req);
        propagate(&mut board).unwrap();
        assert_eq!(board.domains[cell_index(0, 0)].value(), Some(3));
        assert_eq!(board.domains[cell_index(0, 1)].value(), Some(1));
        assert_eq!(board.domains[cell_index(1, 0)].value(), Some(1));
    }

    #[test]
    fn test_propagation_leaves_ambiguity_alone() {
        // A genuinely uncertain board: domains should stay wide.
        let req = request(
            [(6, 1), (7, 0), (5, 2), (8, 0), (4, 2)],
            [(6, 1), (5, 1), (7, 1), (6, 1), (6, 1)],
            vec![],
        );
        let mut board = build_board(&req);
        propagate(&mut board).unwrap();
        let undetermined = (0..NUM_CELLS)
            .filter(|&i| !board.domains[i].is_singleton())
            .count();
        assert!(undetermined > 0);
        for idx in 0..NUM_CELLS {
            assert!(!board.domains[idx].is_empty());
        }
    }

    #[test]
    fn test_fully_revealed_consistent_board_passes() {
        let mut revealed = Vec::new();
        for row in 0..5 {
            for col in 0..5 {
                revealed.push(RevealedTile {
                    position: [row, col],
                    value: 1,
                });
            }
        }
        let req = request([(5, 0); 5], [(5, 0); 5], revealed);
        let mut board = build_board(&req);
        assert!(propagate(&mut board).is_ok());
        assert!(extract_deductions(&board).forced.is_empty());
    }
}

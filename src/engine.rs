//! Orchestrator: validation → propagation → estimation → policy.
//!
//! `analyze` is the engine's single entry point and its only
//! error-to-response boundary; the layers below return typed results and
//! never see the wire format. The pipeline is stateless: every request
//! builds its own board, caches, and RNG.

use thiserror::Error;

use crate::constants::*;
use crate::policy;
use crate::propagation::{build_board, extract_deductions, propagate, PropagationError};
use crate::sampler::{self, EstimateResult};
use crate::types::{
    AnalysisResponse, AnalyzeConfig, AnalyzeRequest, Board, GameState, Mode, Recommendation,
    RiskTier,
};
use crate::validate::{validate, ValidationError};

/// Everything that can abort an analysis. `LowConfidence` is not here:
/// a degraded estimate is reported on the response, not thrown.
#[derive(Debug, Error)]
pub enum AnalyzeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Propagation(#[from] PropagationError),

    /// The sampler found no feasible board and propagation proved
    /// nothing, so there is no usable output at all.
    #[error("no feasible board found within the sampling budget")]
    NoFeasibleSample,
}

impl AnalyzeError {
    /// Unexpected invariant breaks, as opposed to bad input.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AnalyzeError::Propagation(PropagationError::VisitBoundExceeded)
        )
    }
}

/// Run the full pipeline for one request.
pub fn analyze(
    request: &AnalyzeRequest,
    config: &AnalyzeConfig,
) -> Result<AnalysisResponse, AnalyzeError> {
    validate(request)?;

    let mut board = build_board(request);
    propagate(&mut board)?;
    let deductions = extract_deductions(&board);

    let game_state = classify(request, &board);
    if game_state != GameState::Active {
        return Ok(AnalysisResponse {
            guaranteed_safe: deductions.safe,
            guaranteed_voltorb: deductions.hazards,
            forced_values: deductions.forced,
            recommendations: Vec::new(),
            quit_recommended: false,
            survival_probability: None,
            explanation: match game_state {
                GameState::Won => {
                    "Every multiplier of 2 or higher is revealed; the round is won.".to_string()
                }
                _ => "A revealed voltorb ended the round.".to_string(),
            },
            mode: request.mode,
            game_state,
            low_confidence: false,
            samples: 0,
        });
    }

    let estimate = sampler::estimate(&board, config);
    if estimate.accepted == 0 && deductions.is_empty() {
        return Err(AnalyzeError::NoFeasibleSample);
    }

    // Candidates: unrevealed cells that are not provable hazards. A
    // provable hazard is reported in guaranteed_voltorb, never ranked.
    let mut candidates: Vec<policy::CellMetrics> = board
        .unrevealed_positions()
        .into_iter()
        .filter(|&(row, col)| !board.domains[cell_index(row, col)].is_hazard_only())
        .map(|(row, col)| {
            policy::CellMetrics::from_marginal((row, col), estimate.marginals[cell_index(row, col)])
        })
        .collect();
    policy::rank(request.mode, &mut candidates);

    let has_guaranteed_safe = board
        .unrevealed_positions()
        .iter()
        .any(|&(row, col)| board.domains[cell_index(row, col)].excludes_zero());

    let quit_recommended = match request.mode {
        Mode::Level => {
            policy::quit_level(&candidates, has_guaranteed_safe, config.quit_threshold_level)
        }
        Mode::Profit => policy::quit_profit(&candidates, config.quit_threshold_profit),
    };

    let recommendations =
        policy::to_recommendations(request.mode, &candidates, &config.risk_tiers);
    let survival_probability = match request.mode {
        Mode::Level => policy::survival_probability(&candidates),
        Mode::Profit => None,
    };

    let explanation = explanation(
        request.mode,
        recommendations.first(),
        &board,
        &estimate,
        quit_recommended,
    );

    Ok(AnalysisResponse {
        guaranteed_safe: deductions.safe,
        guaranteed_voltorb: deductions.hazards,
        forced_values: deductions.forced,
        recommendations,
        quit_recommended,
        survival_probability,
        explanation,
        mode: request.mode,
        game_state,
        low_confidence: estimate.low_confidence,
        samples: estimate.accepted,
    })
}

/// Round-state classification. A round with no reveals is never won: the
/// player has yet to flip anything, whatever propagation proves.
fn classify(request: &AnalyzeRequest, board: &Board) -> GameState {
    if request.revealed.iter().any(|tile| tile.value == 0) {
        return GameState::Lost;
    }
    let nothing_big_hidden = board
        .unrevealed_positions()
        .iter()
        .all(|&(row, col)| board.domains[cell_index(row, col)].within_zero_one());
    if board.any_revealed() && nothing_big_hidden {
        return GameState::Won;
    }
    GameState::Active
}

fn tier_label(tier: RiskTier) -> &'static str {
    match tier {
        RiskTier::Safe => "guaranteed safe",
        RiskTier::Low => "low risk",
        RiskTier::Medium => "medium risk",
        RiskTier::High => "high risk",
    }
}

fn mode_label(mode: Mode) -> &'static str {
    match mode {
        Mode::Level => "Level mode",
        Mode::Profit => "Profit mode",
    }
}

fn explanation(
    mode: Mode,
    top: Option<&Recommendation>,
    board: &Board,
    estimate: &EstimateResult,
    quit_recommended: bool,
) -> String {
    let Some(top) = top else {
        return format!(
            "{}: no unrevealed cell is worth flipping; quitting is advised.",
            mode_label(mode)
        );
    };

    let (row, col) = top.position;
    let top_proven = board.domains[cell_index(row, col)].excludes_zero();
    let source = if top_proven {
        "proven safe by constraint propagation".to_string()
    } else if estimate.exact {
        format!(
            "marginals from exact enumeration of {} feasible boards",
            estimate.accepted
        )
    } else if estimate.low_confidence {
        format!(
            "marginals from only {} accepted samples (low confidence)",
            estimate.accepted
        )
    } else {
        format!("marginals from {} accepted samples", estimate.accepted)
    };

    let advisory = if quit_recommended {
        "; quitting is advised"
    } else {
        ""
    };

    format!(
        "{}: flip ({}, {}) ({}, p_voltorb {:.2}); {}{}.",
        mode_label(mode),
        row,
        col,
        tier_label(top.risk_tier),
        top.p_voltorb,
        source,
        advisory
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{LineConstraint, RevealedTile};

    fn request(
        mode: Mode,
        rows: [(i32, i32); 5],
        cols: [(i32, i32); 5],
        revealed: Vec<RevealedTile>,
    ) -> AnalyzeRequest {
        AnalyzeRequest {
            mode,
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

    fn seeded_config() -> AnalyzeConfig {
        AnalyzeConfig {
            seed: Some(42),
            ..AnalyzeConfig::default()
        }
    }

    #[test]
    fn test_lost_on_revealed_voltorb() {
        // Consistent board: (0, 0) really is the one voltorb.
        let req = request(
            Mode::Level,
            [(4, 1), (5, 0), (5, 0), (5, 0), (5, 0)],
            [(4, 1), (5, 0), (5, 0), (5, 0), (5, 0)],
            vec![RevealedTile {
                position: [0, 0],
                value: 0,
            }],
        );
        let resp = analyze(&req, &seeded_config()).unwrap();
        assert_eq!(resp.game_state, GameState::Lost);
        assert!(resp.recommendations.is_empty());
        assert!(!resp.quit_recommended);
    }

    #[test]
    fn test_won_when_only_small_values_hidden() {
        // The single 3 at (0, 0) is pinned by the crossing sums; once it
        // is revealed, only 1s remain hidden.
        let req = request(
            Mode::Level,
            [(7, 0), (5, 0), (5, 0), (5, 0), (5, 0)],
            [(7, 0), (5, 0), (5, 0), (5, 0), (5, 0)],
            vec![RevealedTile {
                position: [0, 0],
                value: 3,
            }],
        );
        let resp = analyze(&req, &seeded_config()).unwrap();
        assert_eq!(resp.game_state, GameState::Won);
        assert!(resp.recommendations.is_empty());
        assert!(!resp.quit_recommended);
        assert_eq!(resp.samples, 0);
    }

    #[test]
    fn test_fresh_board_is_never_won() {
        let req = request(Mode::Level, [(5, 0); 5], [(5, 0); 5], vec![]);
        let resp = analyze(&req, &seeded_config()).unwrap();
        assert_eq!(resp.game_state, GameState::Active);
        assert_eq!(resp.recommendations.len(), NUM_CELLS);
    }

    #[test]
    fn test_no_feasible_sample_without_guarantees() {
        // {0,1} domains everywhere, nothing provable, zero budget.
        let req = request(Mode::Level, [(4, 1); 5], [(4, 1); 5], vec![]);
        let config = AnalyzeConfig {
            sample_budget: 0,
            seed: Some(1),
            ..AnalyzeConfig::default()
        };
        let err = analyze(&req, &config).unwrap_err();
        assert!(matches!(err, AnalyzeError::NoFeasibleSample));
        assert!(!err.is_internal());
    }

    #[test]
    fn test_hazards_never_recommended() {
        let req = request(
            Mode::Level,
            [(0, 5), (5, 0), (5, 0), (5, 0), (5, 0)],
            [(4, 1); 5],
            vec![],
        );
        let resp = analyze(&req, &seeded_config()).unwrap();
        assert_eq!(resp.guaranteed_voltorb.len(), 5);
        assert_eq!(resp.recommendations.len(), 20);
        for rec in &resp.recommendations {
            assert!(rec.position.0 != 0);
        }
    }

    #[test]
    fn test_explanation_names_propagation_when_proven() {
        let req = request(Mode::Level, [(5, 0); 5], [(5, 0); 5], vec![]);
        let resp = analyze(&req, &seeded_config()).unwrap();
        assert!(resp.explanation.contains("constraint propagation"));
        assert!(resp.explanation.contains("Level mode"));
    }
}

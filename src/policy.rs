//! Risk metrics, move ranking, and quit advisories.
//!
//! Pure functions over the estimator's marginals. The two objectives
//! share one metrics record:
//!
//! - `p_voltorb` = marginal[0], the hazard probability.
//! - `ev` = Σ v·marginal[v]. The 0 term vanishes, so this is both the
//!   unconditional expected value (level tie-break) and the
//!   risk-adjusted reward (1 − p0)·E[value | value > 0] (profit rank).

use crate::types::{Mode, Position, Recommendation, RiskTier, RiskTiers};

/// Conditional-EV guard against division by (1 − p0) ≈ 0.
const EPS: f64 = 1e-9;

/// Per-cell decision inputs derived from one marginal.
#[derive(Clone, Copy, Debug)]
pub struct CellMetrics {
    pub position: Position,
    pub marginal: [f64; 4],
    pub p_voltorb: f64,
    pub ev: f64,
}

impl CellMetrics {
    pub fn from_marginal(position: Position, marginal: [f64; 4]) -> Self {
        let ev = marginal
            .iter()
            .enumerate()
            .map(|(value, mass)| value as f64 * mass)
            .sum();
        CellMetrics {
            position,
            marginal,
            p_voltorb: marginal[0],
            ev,
        }
    }

    /// E[value | value > 0]: the reward if the flip survives.
    pub fn conditional_ev(&self) -> f64 {
        self.ev / (1.0 - self.p_voltorb).max(EPS)
    }
}

/// Bucket a hazard probability.
pub fn risk_tier(p_voltorb: f64, tiers: &RiskTiers) -> RiskTier {
    if p_voltorb <= tiers.safe {
        RiskTier::Safe
    } else if p_voltorb <= tiers.low {
        RiskTier::Low
    } else if p_voltorb <= tiers.medium {
        RiskTier::Medium
    } else {
        RiskTier::High
    }
}

/// Order candidates by the active objective.
///
/// Level: ascending hazard, ties broken by descending EV. Profit:
/// descending risk-adjusted EV, ties broken by ascending hazard. Both
/// fall back to position order so output is fully deterministic.
pub fn rank(mode: Mode, metrics: &mut [CellMetrics]) {
    match mode {
        Mode::Level => metrics.sort_by(|a, b| {
            a.p_voltorb
                .total_cmp(&b.p_voltorb)
                .then(b.ev.total_cmp(&a.ev))
                .then(a.position.cmp(&b.position))
        }),
        Mode::Profit => metrics.sort_by(|a, b| {
            b.ev
                .total_cmp(&a.ev)
                .then(a.p_voltorb.total_cmp(&b.p_voltorb))
                .then(a.position.cmp(&b.position))
        }),
    }
}

/// Ranked metrics to wire records. The reported `expected_value` is
/// E[value] in level mode and E[value | value > 0] in profit mode.
pub fn to_recommendations(
    mode: Mode,
    ranked: &[CellMetrics],
    tiers: &RiskTiers,
) -> Vec<Recommendation> {
    ranked
        .iter()
        .map(|m| Recommendation {
            position: m.position,
            p_voltorb: m.p_voltorb,
            expected_value: match mode {
                Mode::Level => m.ev,
                Mode::Profit => m.conditional_ev(),
            },
            risk_tier: risk_tier(m.p_voltorb, tiers),
            distribution: m.marginal,
        })
        .collect()
}

/// Level mode: quit when even the best flip is worse than the threshold
/// and propagation proved nothing safe. No candidates at all also means
/// quit.
pub fn quit_level(metrics: &[CellMetrics], has_guaranteed_safe: bool, threshold: f64) -> bool {
    if has_guaranteed_safe {
        return false;
    }
    match metrics
        .iter()
        .map(|m| m.p_voltorb)
        .min_by(|a, b| a.total_cmp(b))
    {
        Some(min_hazard) => min_hazard > threshold,
        None => true,
    }
}

/// Profit mode: quit when no flip beats the 1-multiplier baseline.
pub fn quit_profit(metrics: &[CellMetrics], threshold: f64) -> bool {
    match metrics.iter().map(|m| m.ev).max_by(|a, b| a.total_cmp(b)) {
        Some(max_ev) => max_ev < threshold,
        None => true,
    }
}

/// Chance the top-ranked flip survives.
pub fn survival_probability(ranked: &[CellMetrics]) -> Option<f64> {
    ranked.first().map(|m| 1.0 - m.p_voltorb)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics(position: Position, marginal: [f64; 4]) -> CellMetrics {
        CellMetrics::from_marginal(position, marginal)
    }

    #[test]
    fn test_metrics_from_marginal() {
        let m = metrics((0, 0), [0.25, 0.25, 0.25, 0.25]);
        assert_eq!(m.p_voltorb, 0.25);
        assert!((m.ev - 1.5).abs() < 1e-12);
        assert!((m.conditional_ev() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_conditional_ev_guarded_for_sure_hazard() {
        let m = metrics((0, 0), [1.0, 0.0, 0.0, 0.0]);
        assert_eq!(m.conditional_ev(), 0.0);
    }

    #[test]
    fn test_risk_tiers() {
        let tiers = RiskTiers::default();
        assert_eq!(risk_tier(0.0, &tiers), RiskTier::Safe);
        assert_eq!(risk_tier(0.1, &tiers), RiskTier::Low);
        assert_eq!(risk_tier(0.15, &tiers), RiskTier::Low);
        assert_eq!(risk_tier(0.2, &tiers), RiskTier::Medium);
        assert_eq!(risk_tier(0.5, &tiers), RiskTier::High);
    }

    #[test]
    fn test_level_ranks_safest_first() {
        // Risky-but-rich vs safe-but-poor: level prefers safety.
        let mut cells = vec![
            metrics((0, 0), [0.2, 0.0, 0.0, 0.8]),
            metrics((0, 1), [0.02, 0.98, 0.0, 0.0]),
        ];
        rank(Mode::Level, &mut cells);
        assert_eq!(cells[0].position, (0, 1));
    }

    #[test]
    fn test_profit_ranks_richest_first() {
        let mut cells = vec![
            metrics((0, 0), [0.2, 0.0, 0.0, 0.8]),
            metrics((0, 1), [0.02, 0.98, 0.0, 0.0]),
        ];
        rank(Mode::Profit, &mut cells);
        assert_eq!(cells[0].position, (0, 0));
    }

    #[test]
    fn test_level_tie_breaks_on_ev() {
        let mut cells = vec![
            metrics((1, 0), [0.1, 0.9, 0.0, 0.0]),
            metrics((0, 0), [0.1, 0.0, 0.0, 0.9]),
        ];
        rank(Mode::Level, &mut cells);
        assert_eq!(cells[0].position, (0, 0));
    }

    #[test]
    fn test_profit_tie_breaks_on_hazard() {
        // Equal EV 0.9: (0,1) reaches it at lower risk.
        let mut cells = vec![
            metrics((0, 0), [0.4, 0.3, 0.3, 0.0]),
            metrics((0, 1), [0.1, 0.9, 0.0, 0.0]),
        ];
        rank(Mode::Profit, &mut cells);
        assert_eq!(cells[0].position, (0, 1));
    }

    #[test]
    fn test_forced_one_deprioritized_in_profit() {
        // A guaranteed 1 (U = 1.0) ranks below a risky cell with U > 1.
        let mut cells = vec![
            metrics((0, 0), [0.0, 1.0, 0.0, 0.0]),
            metrics((0, 1), [0.2, 0.0, 0.0, 0.8]),
        ];
        rank(Mode::Profit, &mut cells);
        assert_eq!(cells[0].position, (0, 1));
    }

    #[test]
    fn test_recommendation_expected_value_per_mode() {
        let cells = vec![metrics((0, 0), [0.5, 0.0, 0.0, 0.5])];
        let tiers = RiskTiers::default();
        let level = to_recommendations(Mode::Level, &cells, &tiers);
        let profit = to_recommendations(Mode::Profit, &cells, &tiers);
        assert!((level[0].expected_value - 1.5).abs() < 1e-12);
        assert!((profit[0].expected_value - 3.0).abs() < 1e-12);
        assert_eq!(level[0].risk_tier, RiskTier::High);
    }

    #[test]
    fn test_quit_level_threshold() {
        let risky = vec![metrics((0, 0), [0.6, 0.4, 0.0, 0.0])];
        assert!(quit_level(&risky, false, 0.45));
        assert!(!quit_level(&risky, true, 0.45));

        let fine = vec![metrics((0, 0), [0.3, 0.7, 0.0, 0.0])];
        assert!(!quit_level(&fine, false, 0.45));

        assert!(quit_level(&[], false, 0.45));
    }

    #[test]
    fn test_quit_profit_threshold() {
        let poor = vec![metrics((0, 0), [0.3, 0.7, 0.0, 0.0])];
        assert!(quit_profit(&poor, 1.0));

        let rich = vec![metrics((0, 0), [0.2, 0.0, 0.0, 0.8])];
        assert!(!quit_profit(&rich, 1.0));

        assert!(quit_profit(&[], 1.0));
    }

    #[test]
    fn test_survival_probability_tracks_top_move() {
        let mut cells = vec![
            metrics((0, 0), [0.3, 0.7, 0.0, 0.0]),
            metrics((0, 1), [0.1, 0.9, 0.0, 0.0]),
        ];
        rank(Mode::Level, &mut cells);
        let p = survival_probability(&cells).unwrap();
        assert!((p - 0.9).abs() < 1e-12);
        assert_eq!(survival_probability(&[]), None);
    }
}

//! Line solution-set enumeration.
//!
//! A line configuration assigns one value from each cell's domain to the
//! line's five positions so that the values sum to the line's target and
//! exactly the targeted number of them are zero. The raw space is at most
//! 4^5 = 1024 tuples; pruning on partial sums and zero counts cuts that
//! to the tens in practice.
//!
//! Both propagation (projection per position) and the estimator (uniform
//! draws per row) are built on this enumeration.

use crate::constants::BOARD_SIZE;
use crate::types::{DomainMask, LineTargets};

/// One assignment of values to a line's five cells.
pub type LineConfig = [u8; BOARD_SIZE];

/// Enumerate every configuration of `domains` meeting `targets`, in
/// lexicographic order.
pub fn enumerate_line_configs(
    domains: &[DomainMask; BOARD_SIZE],
    targets: LineTargets,
) -> Vec<LineConfig> {
    let mut configs = Vec::new();
    let mut current = [0u8; BOARD_SIZE];
    extend(domains, targets, 0, 0, 0, &mut current, &mut configs);
    configs
}

fn extend(
    domains: &[DomainMask; BOARD_SIZE],
    targets: LineTargets,
    depth: usize,
    sum: u8,
    zeros: u8,
    current: &mut LineConfig,
    configs: &mut Vec<LineConfig>,
) {
    if depth == BOARD_SIZE {
        if sum == targets.sum && zeros == targets.zeros {
            configs.push(*current);
        }
        return;
    }

    let remaining = (BOARD_SIZE - depth) as u8;
    for value in domains[depth].iter() {
        let sum = sum + value;
        let zeros = zeros + (value == 0) as u8;
        // Partial-assignment bounds: the suffix contributes at most 3 per
        // cell and at most one zero per cell.
        if sum > targets.sum || zeros > targets.zeros {
            continue;
        }
        let left = remaining - 1;
        if sum + 3 * left < targets.sum {
            continue;
        }
        if zeros + left < targets.zeros {
            continue;
        }
        current[depth] = value;
        extend(domains, targets, depth + 1, sum, zeros, current, configs);
    }
}

/// Per-position union of values across `configs`: the projection that
/// propagation intersects each cell's domain with.
pub fn config_projection(configs: &[LineConfig]) -> [DomainMask; BOARD_SIZE] {
    let mut projection = [DomainMask::EMPTY; BOARD_SIZE];
    for config in configs {
        for (k, &value) in config.iter().enumerate() {
            projection[k].insert(value);
        }
    }
    projection
}

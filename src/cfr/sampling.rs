//! Action sampling and bounded parallel fan-out.

use arrayvec::ArrayVec;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cfr::decision::{Action, MAX_ACTIONS};

/// Inverse-CDF sampling of a 1-based action.
///
/// Walks the cumulative sum and returns the first action whose cumulative
/// probability reaches `draw` (`draw ∈ [0, 1)`). If rounding leaves the walk
/// without a match, the last action `n` is returned.
pub fn choose_action(probabilities: &[f64], draw: f64) -> Action {
    let mut cumulative = 0.0;
    for (i, &p) in probabilities.iter().enumerate() {
        cumulative += p;
        if cumulative >= draw {
            return i as Action + 1;
        }
    }
    probabilities.len() as Action
}

/// Limits on where a traversal may fan out across threads.
///
/// Near the root there are few, expensive branches; deep in the tree calls
/// are cheap and parallel overhead dominates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FanOut {
    /// Parallelism enabled at all.
    pub enabled: bool,
    /// Only nodes shallower than this depth may fan out.
    pub depth_limit: usize,
    /// Only nodes with at least this many actions may fan out.
    pub min_actions: usize,
}

impl FanOut {
    /// Never fan out.
    pub const SEQUENTIAL: FanOut = FanOut {
        enabled: false,
        depth_limit: 0,
        min_actions: usize::MAX,
    };

    /// Whether a node at `depth` with `num_actions` children should fan out.
    pub fn allows(&self, depth: usize, num_actions: usize) -> bool {
        self.enabled && depth < self.depth_limit && num_actions >= self.min_actions
    }
}

/// Evaluate `op` once per 1-based action, in parallel when `parallel` is set.
///
/// Results are returned in action order regardless of completion order.
pub fn map_actions<F>(num_actions: usize, parallel: bool, op: F) -> ArrayVec<f64, MAX_ACTIONS>
where
    F: Fn(Action) -> f64 + Sync + Send,
{
    if parallel {
        let values: Vec<f64> = (0..num_actions)
            .into_par_iter()
            .map(|i| op(i as Action + 1))
            .collect();
        values.into_iter().collect()
    } else {
        (0..num_actions).map(|i| op(i as Action + 1)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_choose_action_walks_cdf() {
        let p = [0.2, 0.5, 0.3];
        assert_eq!(choose_action(&p, 0.0), 1);
        assert_eq!(choose_action(&p, 0.19), 1);
        assert_eq!(choose_action(&p, 0.2), 1);
        assert_eq!(choose_action(&p, 0.21), 2);
        assert_eq!(choose_action(&p, 0.69), 2);
        assert_eq!(choose_action(&p, 0.75), 3);
        assert_eq!(choose_action(&p, 0.999_999), 3);
    }

    #[test]
    fn test_choose_action_boundaries() {
        assert_eq!(choose_action(&[0.5, 0.5], 0.5), 1);
        assert_eq!(choose_action(&[0.0, 1.0], 0.3), 2);
        assert_eq!(choose_action(&[1.0, 0.0], 0.999), 1);
        assert_eq!(choose_action(&[1.0], 0.999), 1);
        // rounding shortfall falls back to the last action
        assert_eq!(choose_action(&[0.3, 0.3, 0.3999, 0.0], 0.99995), 4);
        assert_eq!(choose_action(&[0.25, 0.25, 0.25, 0.2], 0.99), 4);
    }

    #[test]
    fn test_choose_action_is_total() {
        let mut rng = StdRng::seed_from_u64(11);
        for n in 1..=8usize {
            for _ in 0..500 {
                let raw: Vec<f64> = (0..n).map(|_| rng.gen::<f64>()).collect();
                let sum: f64 = raw.iter().sum();
                let p: Vec<f64> = raw.iter().map(|x| x / sum).collect();
                let action = choose_action(&p, rng.gen::<f64>());
                assert!(action >= 1 && action as usize <= n);
            }
        }
    }

    #[test]
    fn test_fan_out_gate() {
        let fan_out = FanOut {
            enabled: true,
            depth_limit: 3,
            min_actions: 4,
        };
        assert!(fan_out.allows(0, 4));
        assert!(!fan_out.allows(3, 10));
        assert!(!fan_out.allows(1, 3));
        assert!(!FanOut::SEQUENTIAL.allows(0, 100));
    }

    #[test]
    fn test_weighted_sum_is_order_independent() {
        let sub_results = [1.25, -3.5, 7.0];
        let probabilities = [0.2, 0.3, 0.5];
        let sequential = map_actions(3, false, |a| sub_results[a as usize - 1]);
        let parallel = map_actions(3, true, |a| sub_results[a as usize - 1]);
        assert_eq!(sequential, parallel);

        let permutations = [[0, 1, 2], [0, 2, 1], [1, 0, 2], [1, 2, 0], [2, 0, 1], [2, 1, 0]];
        let reference: f64 = (0..3).map(|i| probabilities[i] * sequential[i]).sum();
        for order in permutations {
            let total: f64 = order.iter().map(|&i| probabilities[i] * parallel[i]).sum();
            assert!((total - reference).abs() < 1e-12);
        }
    }
}

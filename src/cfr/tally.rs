//! Per-information-set regret and strategy accumulators.
//!
//! Each tally owns its own lock, so traversals touching different
//! information sets never contend. Readers snapshot the regret-matched
//! probabilities, release the lock, recurse, and come back later to add
//! increments; since increments are plain sums, concurrent updates commute.

use std::sync::{Mutex, MutexGuard};

use crate::cfr::decision::Action;

/// Convert cumulative regrets into a probability distribution.
///
/// Positive regrets are normalised; if none is positive the output is
/// uniform. `output` must be as long as `regrets`.
pub fn regret_match(regrets: &[f64], output: &mut [f64]) {
    debug_assert_eq!(regrets.len(), output.len());
    let positive_sum: f64 = regrets.iter().map(|&r| r.max(0.0)).sum();
    if positive_sum > 0.0 {
        for (p, &r) in output.iter_mut().zip(regrets) {
            *p = r.max(0.0) / positive_sum;
        }
    } else {
        let uniform = 1.0 / regrets.len() as f64;
        output.iter_mut().for_each(|p| *p = uniform);
    }
}

/// Regret matching that drops hopeless actions from the uniform fallback.
///
/// When no regret is positive, actions whose regret is below `threshold` get
/// zero mass and the rest share it equally. If every action is below the
/// threshold the plain uniform distribution is returned.
pub fn regret_match_with_pruning(regrets: &[f64], threshold: f64, output: &mut [f64]) {
    regret_match(regrets, output);
    if regrets.iter().any(|&r| r > 0.0) {
        return;
    }
    let retained = regrets.iter().filter(|&&r| r >= threshold).count();
    if retained == 0 || retained == regrets.len() {
        return;
    }
    let share = 1.0 / retained as f64;
    for (p, &r) in output.iter_mut().zip(regrets) {
        *p = if r >= threshold { share } else { 0.0 };
    }
}

/// Mix an exploration term into a distribution: `(1-ε)·p + ε/n`.
pub fn mix_exploration(probabilities: &mut [f64], epsilon: f64) {
    let n = probabilities.len() as f64;
    for p in probabilities.iter_mut() {
        *p = (1.0 - epsilon) * *p + epsilon / n;
    }
}

/// Probability vector putting all mass on one 1-based action.
pub fn forced_distribution(action: Action, output: &mut [f64]) {
    for (i, p) in output.iter_mut().enumerate() {
        *p = if i + 1 == action as usize { 1.0 } else { 0.0 };
    }
}

#[derive(Debug, Clone, Default)]
struct TallyData {
    cumulative_regret: Vec<f64>,
    cumulative_strategy: Vec<f64>,
}

/// Accumulators for one information set.
#[derive(Debug)]
pub struct InformationSetTally {
    decision_index: usize,
    player_index: usize,
    num_actions: usize,
    data: Mutex<TallyData>,
}

impl InformationSetTally {
    /// A fresh tally with zero regret and strategy weight.
    pub fn new(decision_index: usize, player_index: usize, num_actions: usize) -> Self {
        Self::from_parts(
            decision_index,
            player_index,
            vec![0.0; num_actions],
            vec![0.0; num_actions],
        )
    }

    /// Rebuild a tally from stored sums.
    pub fn from_parts(
        decision_index: usize,
        player_index: usize,
        cumulative_regret: Vec<f64>,
        cumulative_strategy: Vec<f64>,
    ) -> Self {
        debug_assert_eq!(cumulative_regret.len(), cumulative_strategy.len());
        Self {
            decision_index,
            player_index,
            num_actions: cumulative_regret.len(),
            data: Mutex::new(TallyData {
                cumulative_regret,
                cumulative_strategy,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, TallyData> {
        // Sums stay meaningful even if a writer panicked mid-update.
        self.data.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Decision this information set belongs to.
    pub fn decision_index(&self) -> usize {
        self.decision_index
    }

    /// Player who acts here.
    pub fn player_index(&self) -> usize {
        self.player_index
    }

    /// Number of legal actions.
    pub fn num_actions(&self) -> usize {
        self.num_actions
    }

    /// Write the regret-matched strategy into `output`.
    pub fn regret_matched_probabilities(&self, output: &mut [f64]) {
        regret_match(&self.lock().cumulative_regret, output);
    }

    /// Regret matching with hopeless actions pruned from the uniform fallback.
    pub fn regret_matched_probabilities_with_pruning(&self, threshold: f64, output: &mut [f64]) {
        regret_match_with_pruning(&self.lock().cumulative_regret, threshold, output);
    }

    /// Regret matching mixed with uniform exploration `ε`.
    pub fn exploration_probabilities(&self, epsilon: f64, output: &mut [f64]) {
        self.regret_matched_probabilities(output);
        mix_exploration(output, epsilon);
    }

    /// Add one regret increment per action.
    pub fn add_regrets(&self, increments: &[f64]) {
        let mut data = self.lock();
        for (r, &inc) in data.cumulative_regret.iter_mut().zip(increments) {
            *r += inc;
        }
    }

    /// Add one strategy-weight increment per action.
    pub fn add_strategy(&self, increments: &[f64]) {
        let mut data = self.lock();
        for (s, &inc) in data.cumulative_strategy.iter_mut().zip(increments) {
            *s += inc;
        }
    }

    /// Add `weight` to the regret of a single 1-based action.
    pub fn add_regret(&self, action: Action, weight: f64) {
        self.lock().cumulative_regret[action as usize - 1] += weight;
    }

    /// Add `weight` to the strategy sum of a single 1-based action.
    pub fn add_strategy_weight(&self, action: Action, weight: f64) {
        self.lock().cumulative_strategy[action as usize - 1] += weight;
    }

    /// The normalised cumulative strategy, uniform if nothing was accumulated.
    pub fn average_strategy(&self) -> Vec<f64> {
        let data = self.lock();
        let total: f64 = data.cumulative_strategy.iter().sum();
        if total > 0.0 {
            data.cumulative_strategy.iter().map(|&s| s / total).collect()
        } else {
            vec![1.0 / self.num_actions as f64; self.num_actions]
        }
    }

    /// The current regret-matched strategy as a fresh vector.
    pub fn current_strategy(&self) -> Vec<f64> {
        let mut out = vec![0.0; self.num_actions];
        self.regret_matched_probabilities(&mut out);
        out
    }

    /// Copy of the cumulative regrets.
    pub fn cumulative_regret(&self) -> Vec<f64> {
        self.lock().cumulative_regret.clone()
    }

    /// Copy of the cumulative strategy weights.
    pub fn cumulative_strategy(&self) -> Vec<f64> {
        self.lock().cumulative_strategy.clone()
    }

    /// Total strategy weight accumulated so far.
    pub fn strategy_total(&self) -> f64 {
        self.lock().cumulative_strategy.iter().sum()
    }

    /// Overwrite both arrays (used when seeding tallies in tests and imports).
    pub fn set(&self, cumulative_regret: &[f64], cumulative_strategy: &[f64]) {
        let mut data = self.lock();
        data.cumulative_regret.copy_from_slice(cumulative_regret);
        data.cumulative_strategy.copy_from_slice(cumulative_strategy);
    }
}

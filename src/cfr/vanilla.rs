//! Vanilla CFR: full recursive walk with exact expected values.
//!
//! Every iteration visits every reachable node once per optimized player.
//! Decision nodes owned by the optimized player receive regret and strategy
//! increments; chance fan-out near the root may run on the rayon pool.

use arrayvec::ArrayVec;

use crate::cfr::decision::{Action, MAX_ACTIONS, MAX_PLAYERS};
use crate::cfr::game::Game;
use crate::cfr::history::HistoryNavigator;
use crate::cfr::node::{ChanceNodeSettings, GameStateNode};
use crate::cfr::sampling::{map_actions, FanOut};
use crate::cfr::tally::{forced_distribution, InformationSetTally};

/// Reach probabilities, one per strategic player.
pub type PiValues = ArrayVec<f64, MAX_PLAYERS>;

/// Reach after a strategic branch: only the acting player's entry changes.
pub fn decision_branch_reach(pi_values: &[f64], acting_player: usize, probability: f64) -> PiValues {
    let mut next: PiValues = pi_values.iter().copied().collect();
    next[acting_player] *= probability;
    next
}

/// Reach after a chance branch: every player's entry is scaled.
pub fn chance_branch_reach(pi_values: &[f64], probability: f64) -> PiValues {
    pi_values.iter().map(|&p| p * probability).collect()
}

/// Product of every reach probability except `player`'s.
pub fn inverse_pi(pi_values: &[f64], player: usize) -> f64 {
    pi_values
        .iter()
        .enumerate()
        .filter(|&(i, _)| i != player)
        .map(|(_, &p)| p)
        .product()
}

/// Vanilla CFR walker bound to one game and table.
pub struct VanillaCfr<'a, G: Game> {
    navigator: HistoryNavigator<'a, G>,
    fan_out: FanOut,
    pruning_regret_threshold: f64,
}

impl<'a, G: Game> VanillaCfr<'a, G> {
    /// Create a walker.
    pub fn new(navigator: HistoryNavigator<'a, G>, fan_out: FanOut, pruning_regret_threshold: f64) -> Self {
        Self {
            navigator,
            fan_out,
            pruning_regret_threshold,
        }
    }

    /// One pass per strategic player from the root; returns each player's value.
    pub fn run_iteration(&self, pi_values: &[f64], use_pruning: bool) -> Vec<f64> {
        let root = self.navigator.root();
        (0..pi_values.len())
            .map(|player| self.vanilla_cfr(&root, player, pi_values, use_pruning))
            .collect()
    }

    /// Expected utility of `optimized_player` at `history`, updating regrets on the way.
    pub fn vanilla_cfr(
        &self,
        history: &G::History,
        optimized_player: usize,
        pi_values: &[f64],
        use_pruning: bool,
    ) -> f64 {
        self.walk(history, optimized_player, pi_values, use_pruning, 0)
    }

    fn walk(
        &self,
        history: &G::History,
        optimized_player: usize,
        pi_values: &[f64],
        use_pruning: bool,
        depth: usize,
    ) -> f64 {
        if use_pruning && pi_values.iter().all(|&p| p == 0.0) {
            return 0.0;
        }
        match self.navigator.game_state(history) {
            GameStateNode::FinalUtilities(f) => f.utilities[optimized_player],
            GameStateNode::Chance(settings) => {
                self.chance(history, &settings, optimized_player, pi_values, use_pruning, depth)
            }
            GameStateNode::InformationSet(tally) => {
                self.decision(history, &tally, optimized_player, pi_values, use_pruning, depth)
            }
        }
    }

    fn chance(
        &self,
        history: &G::History,
        settings: &ChanceNodeSettings,
        optimized_player: usize,
        pi_values: &[f64],
        use_pruning: bool,
        depth: usize,
    ) -> f64 {
        let decision = self.navigator.decision(settings.decision_index);
        let num_actions = settings.num_actions();
        // uniform chance: every branch shares the same next reach vector
        let shared_pi = settings
            .all_equal
            .then(|| chance_branch_reach(pi_values, settings.probabilities[0]));

        let values = map_actions(num_actions, self.fan_out.allows(depth, num_actions), |action| {
            let own_pi;
            let next_pi: &[f64] = match &shared_pi {
                Some(pi) => pi,
                None => {
                    own_pi = chance_branch_reach(pi_values, settings.probability(action));
                    &own_pi
                }
            };
            let next = self.navigator.advance(history, action, decision);
            self.walk(&next, optimized_player, next_pi, use_pruning, depth + 1)
        });

        values
            .iter()
            .zip(&settings.probabilities)
            .map(|(v, p)| v * p)
            .sum()
    }

    fn decision(
        &self,
        history: &G::History,
        tally: &InformationSetTally,
        optimized_player: usize,
        pi_values: &[f64],
        use_pruning: bool,
        depth: usize,
    ) -> f64 {
        let decision = self.navigator.decision(tally.decision_index());
        let acting_player = tally.player_index();
        let num_actions = tally.num_actions();

        if let Some(forced) = decision.always_do_action {
            let next = self.navigator.advance(history, forced, decision);
            let value = self.walk(&next, optimized_player, pi_values, use_pruning, depth + 1);
            if acting_player == optimized_player {
                tally.add_strategy_weight(forced, pi_values[optimized_player]);
            }
            return value;
        }

        let mut probabilities: ArrayVec<f64, MAX_ACTIONS> = (0..num_actions).map(|_| 0.0).collect();
        if use_pruning {
            tally.regret_matched_probabilities_with_pruning(self.pruning_regret_threshold, &mut probabilities);
        } else {
            tally.regret_matched_probabilities(&mut probabilities);
        }

        let mut action_values: ArrayVec<f64, MAX_ACTIONS> = ArrayVec::new();
        for (i, &probability) in probabilities.iter().enumerate() {
            let action = i as Action + 1;
            let next_pi = decision_branch_reach(pi_values, acting_player, probability);
            let next = self.navigator.advance(history, action, decision);
            action_values.push(self.walk(&next, optimized_player, &next_pi, use_pruning, depth + 1));
        }

        let expected_value: f64 = probabilities
            .iter()
            .zip(&action_values)
            .map(|(p, v)| p * v)
            .sum();

        if acting_player == optimized_player {
            let inverse = inverse_pi(pi_values, optimized_player);
            let own_reach = pi_values[optimized_player];
            let regrets: ArrayVec<f64, MAX_ACTIONS> = action_values
                .iter()
                .map(|v| inverse * (v - expected_value))
                .collect();
            let strategy: ArrayVec<f64, MAX_ACTIONS> =
                probabilities.iter().map(|p| own_reach * p).collect();
            tally.add_regrets(&regrets);
            tally.add_strategy(&strategy);
        }

        expected_value
    }
}

/// Write the forced or regret-matched distribution for a tally into `output`.
///
/// Shared by the evaluation code that replays strategies without learning.
pub fn acting_distribution(tally: &InformationSetTally, forced: Option<Action>, output: &mut [f64]) {
    match forced {
        Some(action) => forced_distribution(action, output),
        None => tally.regret_matched_probabilities(output),
    }
}

//! Probing CFR: Gibson-style Monte Carlo CFR.
//!
//! Each call follows a single sampled trajectory. Chance and the opponent
//! are sampled from their current distributions; the optimized player's
//! own action is sampled ε-greedily. Off-trajectory actions of the optimized
//! player are valued by a probe, a pure regret-matched rollout that neither
//! learns nor explores.
//!
//! The probe ignores ε when estimating off-path values. Using the
//! exploration-mixed distribution there would change the estimator; the
//! plain regret-matched rollout is kept deliberately.

use arrayvec::ArrayVec;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::cfr::decision::{Action, MAX_ACTIONS};
use crate::cfr::game::Game;
use crate::cfr::history::HistoryNavigator;
use crate::cfr::node::GameStateNode;
use crate::cfr::sampling::choose_action;
use crate::cfr::tally::{mix_exploration, InformationSetTally};
use crate::cfr::vanilla::acting_distribution;

/// Derive the random stream of one optimized player within one iteration.
pub fn player_seed(iteration_seed: u64, player: usize) -> u64 {
    iteration_seed ^ (player as u64 + 1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Probing CFR walker bound to one game and table.
pub struct ProbingCfr<'a, G: Game> {
    navigator: HistoryNavigator<'a, G>,
}

impl<'a, G: Game> ProbingCfr<'a, G> {
    /// Create a walker.
    pub fn new(navigator: HistoryNavigator<'a, G>) -> Self {
        Self { navigator }
    }

    /// One sampled walk per strategic player, each with its own random stream.
    ///
    /// With `parallel` set the per-player walks run concurrently; they share
    /// only the table.
    pub fn run_iteration(&self, seed: u64, epsilon: f64, parallel: bool) {
        let players = self.navigator.game().num_players();
        let root = self.navigator.root();
        let walk = |player: usize| {
            let mut rng = StdRng::seed_from_u64(player_seed(seed, player));
            self.walk_tree(&root, player, 1.0, epsilon, &mut rng);
        };
        if parallel {
            (0..players).into_par_iter().for_each(walk);
        } else {
            (0..players).for_each(walk);
        }
    }

    /// Follow one sampled trajectory, updating the optimized player's regrets
    /// and the other player's strategy weights. Returns the sampled value.
    pub fn walk_tree<R: Rng>(
        &self,
        history: &G::History,
        optimized_player: usize,
        sampling_probability: f64,
        epsilon: f64,
        rng: &mut R,
    ) -> f64 {
        match self.navigator.game_state(history) {
            GameStateNode::FinalUtilities(f) => f.utilities[optimized_player],
            GameStateNode::Chance(settings) => {
                let action = choose_action(&settings.probabilities, rng.gen::<f64>());
                let decision = self.navigator.decision(settings.decision_index);
                let next = self.navigator.advance(history, action, decision);
                self.walk_tree(&next, optimized_player, sampling_probability, epsilon, rng)
            }
            GameStateNode::InformationSet(tally) => {
                if tally.player_index() == optimized_player {
                    self.walk_own(history, &tally, optimized_player, sampling_probability, epsilon, rng)
                } else {
                    self.walk_opponent(history, &tally, optimized_player, sampling_probability, epsilon, rng)
                }
            }
        }
    }

    fn walk_opponent<R: Rng>(
        &self,
        history: &G::History,
        tally: &InformationSetTally,
        optimized_player: usize,
        sampling_probability: f64,
        epsilon: f64,
        rng: &mut R,
    ) -> f64 {
        let decision = self.navigator.decision(tally.decision_index());
        let mut probabilities: ArrayVec<f64, MAX_ACTIONS> = (0..tally.num_actions()).map(|_| 0.0).collect();
        acting_distribution(tally, decision.always_do_action, &mut probabilities);

        let weights: ArrayVec<f64, MAX_ACTIONS> = probabilities
            .iter()
            .map(|p| p / sampling_probability)
            .collect();
        tally.add_strategy(&weights);

        let action = choose_action(&probabilities, rng.gen::<f64>());
        let next = self.navigator.advance(history, action, decision);
        self.walk_tree(&next, optimized_player, sampling_probability, epsilon, rng)
    }

    fn walk_own<R: Rng>(
        &self,
        history: &G::History,
        tally: &InformationSetTally,
        optimized_player: usize,
        sampling_probability: f64,
        epsilon: f64,
        rng: &mut R,
    ) -> f64 {
        let decision = self.navigator.decision(tally.decision_index());
        if let Some(forced) = decision.always_do_action {
            let next = self.navigator.advance(history, forced, decision);
            return self.walk_tree(&next, optimized_player, sampling_probability, epsilon, rng);
        }

        let num_actions = tally.num_actions();
        let mut matched: ArrayVec<f64, MAX_ACTIONS> = (0..num_actions).map(|_| 0.0).collect();
        tally.regret_matched_probabilities(&mut matched);
        let mut sampling = matched.clone();
        mix_exploration(&mut sampling, epsilon);

        let sampled = choose_action(&sampling, rng.gen::<f64>());
        let mut counterfactual: ArrayVec<f64, MAX_ACTIONS> = ArrayVec::new();
        for i in 0..num_actions {
            let action = i as Action + 1;
            let next = self.navigator.advance(history, action, decision);
            let value = if action == sampled {
                self.walk_tree(
                    &next,
                    optimized_player,
                    sampling_probability * sampling[i],
                    epsilon,
                    rng,
                )
            } else {
                self.probe(&next, optimized_player, rng)
            };
            counterfactual.push(value);
        }

        let summation: f64 = matched
            .iter()
            .zip(&counterfactual)
            .map(|(p, v)| p * v)
            .sum();
        let regrets: ArrayVec<f64, MAX_ACTIONS> = counterfactual
            .iter()
            .map(|v| (v - summation) / sampling_probability)
            .collect();
        tally.add_regrets(&regrets);

        summation
    }

    /// Cheap value estimate: one pure regret-matched rollout to a terminal.
    ///
    /// Nothing is written to the table.
    pub fn probe<R: Rng>(&self, history: &G::History, optimized_player: usize, rng: &mut R) -> f64 {
        let mut current = history.clone();
        loop {
            let next = match self.navigator.game_state(&current) {
                GameStateNode::FinalUtilities(f) => return f.utilities[optimized_player],
                GameStateNode::Chance(settings) => {
                    let action = choose_action(&settings.probabilities, rng.gen::<f64>());
                    self.navigator
                        .advance(&current, action, self.navigator.decision(settings.decision_index))
                }
                GameStateNode::InformationSet(tally) => {
                    let decision = self.navigator.decision(tally.decision_index());
                    let mut probabilities: ArrayVec<f64, MAX_ACTIONS> =
                        (0..tally.num_actions()).map(|_| 0.0).collect();
                    acting_distribution(&tally, decision.always_do_action, &mut probabilities);
                    let action = choose_action(&probabilities, rng.gen::<f64>());
                    self.navigator.advance(&current, action, decision)
                }
            };
            current = next;
        }
    }
}

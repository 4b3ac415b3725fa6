//! Game state nodes: what the engine sees at a history point.

use std::sync::Arc;

use crate::cfr::decision::Action;
use crate::cfr::tally::InformationSetTally;

/// Utilities at a terminal history, one per strategic player.
#[derive(Debug, Clone, PartialEq)]
pub struct FinalUtilities {
    /// Payoff of each strategic player.
    pub utilities: Vec<f64>,
}

/// Action probabilities of a chance decision at one history point.
#[derive(Debug, Clone, PartialEq)]
pub struct ChanceNodeSettings {
    /// Chance decision.
    pub decision_index: usize,
    /// Probability of each action (index 0 is action 1).
    pub probabilities: Vec<f64>,
    /// All actions equally likely.
    pub all_equal: bool,
}

impl ChanceNodeSettings {
    /// Uniform settings for a chance decision.
    pub fn uniform(decision_index: usize, num_actions: usize) -> Self {
        Self {
            decision_index,
            probabilities: vec![1.0 / num_actions as f64; num_actions],
            all_equal: true,
        }
    }

    /// Settings with explicitly supplied probabilities.
    pub fn uneven(decision_index: usize, probabilities: Vec<f64>) -> Self {
        Self {
            decision_index,
            probabilities,
            all_equal: false,
        }
    }

    /// Probability of a 1-based action.
    pub fn probability(&self, action: Action) -> f64 {
        self.probabilities[action as usize - 1]
    }

    /// Number of chance actions.
    pub fn num_actions(&self) -> usize {
        self.probabilities.len()
    }
}

/// A position in the game tree, classified for the traversals.
#[derive(Debug, Clone)]
pub enum GameStateNode {
    /// Leaf with payoffs.
    FinalUtilities(FinalUtilities),
    /// Chance decision with its action probabilities.
    Chance(ChanceNodeSettings),
    /// Strategic decision backed by the information set's tally.
    InformationSet(Arc<InformationSetTally>),
}

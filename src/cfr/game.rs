//! Game trait definition for the CFR engine.
//!
//! A game is described by its decision catalog plus a navigator over an
//! implicit tree: a root history point, a pure `advance` function, and a
//! classification of every history point as terminal, chance or decision.
//! The engine never materialises the tree.

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

use crate::cfr::decision::{Action, Decision, DecisionCatalog};

/// Identity of an information set.
///
/// Two history points map to the same key exactly when the acting player
/// cannot tell them apart. Games build the key from the player's own
/// observations (private signals and the public action sequence).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InfoSetKey {
    /// Acting player.
    pub player: usize,
    /// Decision being taken.
    pub decision_index: usize,
    /// Everything the player has observed, encoded as bytes.
    pub observations: Vec<u8>,
}

impl InfoSetKey {
    /// Create a key.
    pub fn new(player: usize, decision_index: usize, observations: Vec<u8>) -> Self {
        Self {
            player,
            decision_index,
            observations,
        }
    }
}

impl fmt::Display for InfoSetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}@D{}:", self.player, self.decision_index)?;
        for (i, o) in self.observations.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", o)?;
        }
        Ok(())
    }
}

/// What the game reports about a history point.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Game over; one utility per strategic player.
    Terminal(Vec<f64>),
    /// Chance acts at this decision.
    Chance {
        /// Index of the chance decision.
        decision_index: usize,
    },
    /// A strategic player acts at this decision.
    Decision {
        /// Index of the decision.
        decision_index: usize,
        /// Information set of the acting player.
        info_set: InfoSetKey,
    },
}

/// The interface any game must implement to be solved.
///
/// # Example
/// ```ignore
/// impl Game for MyGame {
///     type History = ActionPath;
///
///     fn catalog(&self) -> &DecisionCatalog { &self.catalog }
///     fn root(&self) -> ActionPath { ActionPath::new() }
///     fn advance(&self, h: &ActionPath, a: Action, d: &Decision) -> ActionPath { h.with(d.decision_index, a) }
///     fn node(&self, h: &ActionPath) -> NodeKind { /* ... */ }
/// }
/// ```
pub trait Game: Send + Sync {
    /// Handle identifying a position in the tree.
    type History: Clone + Debug + Send + Sync;

    /// Players and decisions, in execution order.
    fn catalog(&self) -> &DecisionCatalog;

    /// The history point before any decision is taken.
    fn root(&self) -> Self::History;

    /// The history point reached by taking `action` at `decision`.
    ///
    /// Must not modify the input; every branch owns its own copy.
    fn advance(&self, history: &Self::History, action: Action, decision: &Decision) -> Self::History;

    /// Classify a history point.
    fn node(&self, history: &Self::History) -> NodeKind;

    /// Whether the game supplies probabilities for an uneven chance decision.
    fn provides_chance_probabilities(&self, _decision_index: usize) -> bool {
        false
    }

    /// Probabilities of each chance action at `history`, summing to 1.
    ///
    /// Only consulted for decisions flagged `uneven_chance_actions`; the
    /// default is the uniform distribution.
    fn chance_probabilities(&self, decision_index: usize, _history: &Self::History) -> Vec<f64> {
        let n = self.catalog().decision(decision_index).num_actions as usize;
        vec![1.0 / n as f64; n]
    }

    /// Number of strategic players.
    fn num_players(&self) -> usize {
        self.catalog().non_chance_players()
    }

    /// Human-readable name of an action, used in reports.
    fn action_name(&self, decision_index: usize, action: Action) -> String {
        format!("{}{}", self.catalog().decision(decision_index).abbreviation, action)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_info_set_key_display() {
        let key = InfoSetKey::new(1, 3, vec![2, 1]);
        assert_eq!(key.to_string(), "P1@D3:2,1");
        assert_eq!(InfoSetKey::new(0, 0, vec![]).to_string(), "P0@D0:");
    }
}

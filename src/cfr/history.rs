//! History navigation.
//!
//! [`HistoryNavigator`] joins a game with the regret table: it descends the
//! implicit tree through the game's pure `advance` and turns the game's
//! [`NodeKind`] into a [`GameStateNode`], fetching (or lazily creating) the
//! tally for decision nodes. [`ActionPath`] is a ready-made history point for
//! games that only need the sequence of actions taken so far.

use arrayvec::ArrayVec;

use crate::cfr::decision::{Action, Decision};
use crate::cfr::game::{Game, NodeKind};
use crate::cfr::node::{ChanceNodeSettings, FinalUtilities, GameStateNode};
use crate::cfr::storage::RegretTable;

/// Longest action path an [`ActionPath`] can hold.
pub const MAX_PATH_LENGTH: usize = 64;

/// One step of a path: which decision was taken and with what action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PathStep {
    /// Decision taken. Catalogs hold at most [`MAX_DECISIONS`] decisions, so
    /// the index always fits.
    ///
    /// [`MAX_DECISIONS`]: crate::cfr::decision::MAX_DECISIONS
    pub decision_index: u16,
    /// 1-based action chosen.
    pub action: Action,
}

/// A history point recorded as the inline list of steps from the root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct ActionPath {
    steps: ArrayVec<PathStep, MAX_PATH_LENGTH>,
}

impl ActionPath {
    /// The empty path (root).
    pub fn new() -> Self {
        Self::default()
    }

    /// A new path extended by one step.
    ///
    /// # Panics
    /// Panics if the path already holds [`MAX_PATH_LENGTH`] steps.
    pub fn with(&self, decision_index: usize, action: Action) -> Self {
        let mut next = self.clone();
        next.steps.push(PathStep {
            decision_index: decision_index as u16,
            action,
        });
        next
    }

    /// All steps from the root.
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Number of steps taken.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether this is the root.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Most recent action.
    pub fn last_action(&self) -> Option<Action> {
        self.steps.last().map(|s| s.action)
    }

    /// The two most recent actions, older first.
    pub fn last_two_actions(&self) -> Option<(Action, Action)> {
        match self.steps.as_slice() {
            [.., a, b] => Some((a.action, b.action)),
            _ => None,
        }
    }

    /// Action chosen at a given decision, if it has been taken.
    pub fn action_at(&self, decision_index: usize) -> Option<Action> {
        self.steps
            .iter()
            .find(|s| s.decision_index as usize == decision_index)
            .map(|s| s.action)
    }

    /// Actions only, in order.
    pub fn actions(&self) -> impl Iterator<Item = Action> + '_ {
        self.steps.iter().map(|s| s.action)
    }

    /// Decision index of the next step, i.e. one past the last decision taken.
    pub fn next_decision_index(&self) -> usize {
        self.steps.last().map_or(0, |s| s.decision_index as usize + 1)
    }
}

/// Descends a game's tree and resolves nodes against the regret table.
pub struct HistoryNavigator<'a, G: Game> {
    game: &'a G,
    table: &'a RegretTable,
}

impl<'a, G: Game> Clone for HistoryNavigator<'a, G> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, G: Game> Copy for HistoryNavigator<'a, G> {}

impl<'a, G: Game> HistoryNavigator<'a, G> {
    /// Bind a game to a table.
    pub fn new(game: &'a G, table: &'a RegretTable) -> Self {
        Self { game, table }
    }

    /// The game being navigated.
    pub fn game(&self) -> &'a G {
        self.game
    }

    /// The table tallies are resolved from.
    pub fn table(&self) -> &'a RegretTable {
        self.table
    }

    /// The root history point.
    pub fn root(&self) -> G::History {
        self.game.root()
    }

    /// The decision with index `decision_index`.
    pub fn decision(&self, decision_index: usize) -> &'a Decision {
        self.game.catalog().decision(decision_index)
    }

    /// Descend one step.
    pub fn advance(&self, history: &G::History, action: Action, decision: &Decision) -> G::History {
        self.game.advance(history, action, decision)
    }

    /// Resolve the node at `history`.
    pub fn game_state(&self, history: &G::History) -> GameStateNode {
        match self.game.node(history) {
            NodeKind::Terminal(utilities) => {
                GameStateNode::FinalUtilities(FinalUtilities { utilities })
            }
            NodeKind::Chance { decision_index } => {
                let decision = self.decision(decision_index);
                let settings = if decision.uneven_chance_actions {
                    ChanceNodeSettings::uneven(
                        decision_index,
                        self.game.chance_probabilities(decision_index, history),
                    )
                } else {
                    ChanceNodeSettings::uniform(decision_index, decision.num_actions as usize)
                };
                GameStateNode::Chance(settings)
            }
            NodeKind::Decision {
                decision_index,
                info_set,
            } => {
                let decision = self.decision(decision_index);
                GameStateNode::InformationSet(self.table.get_or_create(
                    &info_set,
                    decision_index,
                    decision.player_index,
                    decision.num_actions as usize,
                ))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::signaling::SignalingGame;

    #[test]
    fn test_action_path_helpers() {
        let root = ActionPath::new();
        assert!(root.is_empty());
        assert_eq!(root.last_two_actions(), None);
        assert_eq!(root.next_decision_index(), 0);

        let path = root.with(0, 2).with(1, 1).with(2, 3);
        assert_eq!(path.len(), 3);
        assert_eq!(path.last_action(), Some(3));
        assert_eq!(path.last_two_actions(), Some((1, 3)));
        assert_eq!(path.action_at(1), Some(1));
        assert_eq!(path.action_at(5), None);
        assert_eq!(path.actions().collect::<Vec<_>>(), vec![2, 1, 3]);
        assert_eq!(path.next_decision_index(), 3);
        // parent untouched
        assert_eq!(root.len(), 0);
    }

    #[test]
    fn test_action_path_keeps_wide_decision_indices() {
        let path = ActionPath::new().with(255, 1).with(300, 2).with(65_535, 3);
        assert_eq!(path.action_at(300), Some(2));
        assert_eq!(path.action_at(44), None);
        assert_eq!(path.action_at(65_535), Some(3));
        assert_eq!(path.next_decision_index(), 65_536);
    }

    #[test]
    fn test_navigator_resolves_every_node_kind() {
        let game = SignalingGame::new();
        let table = RegretTable::new();
        let nav = HistoryNavigator::new(&game, &table);

        let root = nav.root();
        let chance = match nav.game_state(&root) {
            GameStateNode::Chance(settings) => settings,
            other => panic!("expected chance root, got {:?}", other),
        };
        assert!(chance.all_equal);
        assert_eq!(chance.probabilities, vec![0.5, 0.5]);

        let high = nav.advance(&root, 1, nav.decision(0));
        match nav.game_state(&high) {
            GameStateNode::InformationSet(tally) => {
                assert_eq!(tally.player_index(), 0);
                assert_eq!(tally.num_actions(), 2);
            }
            other => panic!("expected sender decision, got {:?}", other),
        }
        assert_eq!(table.len(), 1);

        let checked = nav.advance(&high, 2, nav.decision(1));
        match nav.game_state(&checked) {
            GameStateNode::FinalUtilities(f) => assert_eq!(f.utilities, vec![1.0, -1.0]),
            other => panic!("expected terminal, got {:?}", other),
        }
    }
}

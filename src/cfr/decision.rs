//! Decision catalog: the ordered list of decisions a game is built from.
//!
//! The catalog is produced by the game definition and is immutable once the
//! solver starts. Every decision, chance or strategic, has a fixed index in
//! execution order and a fixed number of actions. Actions are 1-based.

use serde::{Deserialize, Serialize};

use crate::cfr::error::SolverError;

/// A 1-based action index.
pub type Action = u8;

/// Largest action count any decision may declare.
///
/// Scratch buffers inside the traversals are sized to this bound.
pub const MAX_ACTIONS: usize = 32;

/// Largest number of strategic players a game may declare.
pub const MAX_PLAYERS: usize = 8;

/// Largest catalog a history can index.
pub const MAX_DECISIONS: usize = u16::MAX as usize + 1;

/// A participant in the game, either strategic or chance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    /// Display name.
    pub name: String,
    /// Index used by decisions to name their owner.
    pub index: usize,
    /// Whether this participant is chance (nature).
    pub is_chance: bool,
}

impl PlayerInfo {
    /// A strategic player.
    pub fn strategic(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            is_chance: false,
        }
    }

    /// A chance player.
    pub fn chance(name: impl Into<String>, index: usize) -> Self {
        Self {
            name: name.into(),
            index,
            is_chance: true,
        }
    }
}

/// One decision in execution order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Decision {
    /// Human-readable name.
    pub name: String,
    /// Short label used in reports.
    pub abbreviation: String,
    /// Index of the owning player in the catalog's player list.
    pub player_index: usize,
    /// Position of the decision in execution order.
    pub decision_index: usize,
    /// Number of legal actions.
    pub num_actions: u8,
    /// Whether the owner is chance.
    pub is_chance: bool,
    /// Forces a single action, bypassing regret matching and sampling.
    pub always_do_action: Option<Action>,
    /// Whether some action of this decision can end the game.
    pub can_terminate_game: bool,
    /// Chance probabilities differ per action and must be queried from the game.
    pub uneven_chance_actions: bool,
}

impl Decision {
    /// A strategic decision with default flags.
    pub fn new(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        player_index: usize,
        num_actions: u8,
    ) -> Self {
        Self {
            name: name.into(),
            abbreviation: abbreviation.into(),
            player_index,
            decision_index: 0,
            num_actions,
            is_chance: false,
            always_do_action: None,
            can_terminate_game: false,
            uneven_chance_actions: false,
        }
    }

    /// A chance decision with equal action probabilities.
    pub fn chance(
        name: impl Into<String>,
        abbreviation: impl Into<String>,
        player_index: usize,
        num_actions: u8,
    ) -> Self {
        Self {
            is_chance: true,
            ..Self::new(name, abbreviation, player_index, num_actions)
        }
    }

    /// Builder method: mark the chance probabilities as uneven.
    pub fn with_uneven_chance(mut self) -> Self {
        self.uneven_chance_actions = true;
        self
    }

    /// Builder method: force a single action.
    pub fn with_forced_action(mut self, action: Action) -> Self {
        self.always_do_action = Some(action);
        self
    }

    /// Builder method: mark the decision as able to end the game.
    pub fn terminating(mut self) -> Self {
        self.can_terminate_game = true;
        self
    }

    /// Iterator over the legal 1-based actions.
    pub fn actions(&self) -> impl Iterator<Item = Action> {
        1..=self.num_actions
    }
}

/// The full catalog of players and decisions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionCatalog {
    players: Vec<PlayerInfo>,
    decisions: Vec<Decision>,
}

impl DecisionCatalog {
    /// Build and validate a catalog.
    ///
    /// Decision indices are assigned from list order. Strategic players must
    /// occupy indices `0..n` so that reach-probability vectors can be indexed
    /// by player index directly.
    pub fn new(players: Vec<PlayerInfo>, mut decisions: Vec<Decision>) -> Result<Self, SolverError> {
        for (index, decision) in decisions.iter_mut().enumerate() {
            decision.decision_index = index;
        }
        let catalog = Self { players, decisions };
        catalog.validate()?;
        Ok(catalog)
    }

    fn validate(&self) -> Result<(), SolverError> {
        let strategic = self.non_chance_players();
        if strategic == 0 {
            return Err(SolverError::InvalidCatalog("no strategic players".into()));
        }
        if strategic > MAX_PLAYERS {
            return Err(SolverError::InvalidCatalog(format!(
                "{} strategic players exceeds the limit of {}",
                strategic, MAX_PLAYERS
            )));
        }
        if self.decisions.len() > MAX_DECISIONS {
            return Err(SolverError::InvalidCatalog(format!(
                "{} decisions exceeds the limit of {}",
                self.decisions.len(),
                MAX_DECISIONS
            )));
        }
        for (position, player) in self.players.iter().enumerate() {
            if player.index != position {
                return Err(SolverError::InvalidCatalog(format!(
                    "player {} has index {} but sits at position {}",
                    player.name, player.index, position
                )));
            }
            if !player.is_chance && player.index >= strategic {
                return Err(SolverError::InvalidCatalog(format!(
                    "strategic player {} must precede all chance players",
                    player.name
                )));
            }
        }
        for decision in &self.decisions {
            let owner = self.players.get(decision.player_index).ok_or_else(|| {
                SolverError::InvalidCatalog(format!(
                    "decision {} names unknown player {}",
                    decision.name, decision.player_index
                ))
            })?;
            if owner.is_chance != decision.is_chance {
                return Err(SolverError::InvalidCatalog(format!(
                    "decision {} chance flag disagrees with owner {}",
                    decision.name, owner.name
                )));
            }
            if decision.num_actions == 0 || decision.num_actions as usize > MAX_ACTIONS {
                return Err(SolverError::InvalidCatalog(format!(
                    "decision {} declares {} actions",
                    decision.name, decision.num_actions
                )));
            }
            if let Some(forced) = decision.always_do_action {
                if forced == 0 || forced > decision.num_actions {
                    return Err(SolverError::InvalidCatalog(format!(
                        "decision {} forces out-of-range action {}",
                        decision.name, forced
                    )));
                }
            }
            if decision.uneven_chance_actions && !decision.is_chance {
                return Err(SolverError::InvalidCatalog(format!(
                    "decision {} is flagged uneven but is not a chance decision",
                    decision.name
                )));
            }
        }
        Ok(())
    }

    /// All players, strategic first.
    pub fn players(&self) -> &[PlayerInfo] {
        &self.players
    }

    /// All decisions in execution order.
    pub fn decisions(&self) -> &[Decision] {
        &self.decisions
    }

    /// The decision at `index`.
    pub fn decision(&self, index: usize) -> &Decision {
        &self.decisions[index]
    }

    /// Number of strategic (non-chance) players.
    pub fn non_chance_players(&self) -> usize {
        self.players.iter().filter(|p| !p.is_chance).count()
    }

    /// Largest action count over all decisions.
    pub fn max_actions(&self) -> u8 {
        self.decisions.iter().map(|d| d.num_actions).max().unwrap_or(1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn players() -> Vec<PlayerInfo> {
        vec![
            PlayerInfo::strategic("P", 0),
            PlayerInfo::strategic("D", 1),
            PlayerInfo::chance("Nature", 2),
        ]
    }

    #[test]
    fn test_indices_follow_list_order() {
        let catalog = DecisionCatalog::new(
            players(),
            vec![
                Decision::chance("Signal", "S", 2, 2),
                Decision::new("Offer", "O", 0, 3),
                Decision::new("Accept", "A", 1, 2).terminating(),
            ],
        )
        .unwrap();

        let indices: Vec<usize> = catalog.decisions().iter().map(|d| d.decision_index).collect();
        assert_eq!(indices, vec![0, 1, 2]);
        assert_eq!(catalog.non_chance_players(), 2);
        assert_eq!(catalog.max_actions(), 3);
        assert_eq!(catalog.decision(1).actions().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[test]
    fn test_rejects_chance_mismatch() {
        let result = DecisionCatalog::new(players(), vec![Decision::new("Bad", "B", 2, 2)]);
        assert!(matches!(result, Err(SolverError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_forced_action_out_of_range() {
        let result = DecisionCatalog::new(
            players(),
            vec![Decision::new("Offer", "O", 0, 2).with_forced_action(3)],
        );
        assert!(matches!(result, Err(SolverError::InvalidCatalog(_))));
    }

    #[test]
    fn test_rejects_oversized_catalog() {
        let decisions = (0..=MAX_DECISIONS).map(|_| Decision::new("Offer", "O", 0, 2)).collect();
        let result = DecisionCatalog::new(players(), decisions);
        assert!(matches!(result, Err(SolverError::InvalidCatalog(_))));

        let decisions = (0..MAX_DECISIONS).map(|_| Decision::new("Offer", "O", 0, 2)).collect();
        let catalog = DecisionCatalog::new(players(), decisions).unwrap();
        assert_eq!(catalog.decisions().last().map(|d| d.decision_index), Some(MAX_DECISIONS - 1));
    }

    #[test]
    fn test_rejects_chance_player_before_strategic() {
        let result = DecisionCatalog::new(
            vec![PlayerInfo::chance("Nature", 0), PlayerInfo::strategic("P", 1)],
            vec![Decision::new("Offer", "O", 1, 2)],
        );
        assert!(matches!(result, Err(SolverError::InvalidCatalog(_))));
    }
}

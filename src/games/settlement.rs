//! Litigation settlement game.
//!
//! Nature fixes the strength of the plaintiff's case with uneven odds. The
//! plaintiff, who knows the strength, files suit (filing is forced; dropping
//! the case is modelled but never chosen) and demands a high or low
//! settlement. The defendant sees only the demand and accepts it or goes to
//! trial, where the judgment depends on the case strength and each side pays
//! its own trial costs. Trial costs make the game general-sum.
//!
//! With the default options a strong plaintiff always demands high and a low
//! demand is always accepted; a weak plaintiff bluffs a high demand a third
//! of the time and the defendant accepts a high demand a third of the time.

use serde::{Deserialize, Serialize};

use crate::cfr::decision::{Action, Decision, DecisionCatalog, PlayerInfo};
use crate::cfr::game::{Game, InfoSetKey, NodeKind};
use crate::cfr::history::ActionPath;

/// Case strength: strong.
pub const STRONG: Action = 1;
/// Case strength: weak.
pub const WEAK: Action = 2;
/// Plaintiff files suit.
pub const FILE: Action = 1;
/// Plaintiff drops the case.
pub const DROP: Action = 2;
/// Plaintiff demands the high settlement.
pub const HIGH_DEMAND: Action = 1;
/// Plaintiff demands the low settlement.
pub const LOW_DEMAND: Action = 2;
/// Defendant pays the demand.
pub const ACCEPT: Action = 1;
/// Defendant goes to trial.
pub const REJECT: Action = 2;

const STRENGTH: usize = 0;
const FILING: usize = 1;
const DEMAND: usize = 2;
const RESPONSE: usize = 3;

/// Parameters of the settlement game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettlementOptions {
    /// Probability that the case is strong.
    pub strong_probability: f64,
    /// Judgment awarded at trial on a strong case.
    pub strong_judgment: f64,
    /// Judgment awarded at trial on a weak case.
    pub weak_judgment: f64,
    /// Plaintiff's cost of going to trial.
    pub plaintiff_trial_cost: f64,
    /// Defendant's cost of going to trial.
    pub defendant_trial_cost: f64,
    /// Amount of the high demand.
    pub high_demand: f64,
    /// Amount of the low demand.
    pub low_demand: f64,
}

impl Default for SettlementOptions {
    fn default() -> Self {
        Self {
            strong_probability: 0.3,
            strong_judgment: 1.0,
            weak_judgment: 0.2,
            plaintiff_trial_cost: 0.15,
            defendant_trial_cost: 0.15,
            high_demand: 0.8,
            low_demand: 0.3,
        }
    }
}

/// Settlement bargaining game instance.
#[derive(Debug, Clone)]
pub struct SettlementGame {
    catalog: DecisionCatalog,
    options: SettlementOptions,
}

impl SettlementGame {
    /// Build the game with default options.
    pub fn new() -> Self {
        Self::with_options(SettlementOptions::default())
    }

    /// Build the game with custom options.
    pub fn with_options(options: SettlementOptions) -> Self {
        let players = vec![
            PlayerInfo::strategic("Plaintiff", 0),
            PlayerInfo::strategic("Defendant", 1),
            PlayerInfo::chance("Court", 2),
        ];
        let decisions = vec![
            Decision::chance("Case Strength", "CS", 2, 2).with_uneven_chance(),
            Decision::new("File", "F", 0, 2).with_forced_action(FILE).terminating(),
            Decision::new("Demand", "D", 0, 2),
            Decision::new("Response", "R", 1, 2).terminating(),
        ];
        let catalog = DecisionCatalog::new(players, decisions)
            .unwrap_or_else(|e| unreachable!("settlement catalog is well formed: {}", e));
        Self { catalog, options }
    }

    /// Game parameters.
    pub fn options(&self) -> &SettlementOptions {
        &self.options
    }

    /// Plaintiff's filing decision for a case of `strength`.
    pub fn filing_key(strength: Action) -> InfoSetKey {
        InfoSetKey::new(0, FILING, vec![strength])
    }

    /// Plaintiff's demand decision for a case of `strength`.
    pub fn demand_key(strength: Action) -> InfoSetKey {
        InfoSetKey::new(0, DEMAND, vec![strength])
    }

    /// Defendant's response to `demand`.
    pub fn response_key(demand: Action) -> InfoSetKey {
        InfoSetKey::new(1, RESPONSE, vec![demand])
    }

    fn trial(&self, strength: Action) -> Vec<f64> {
        let o = &self.options;
        let judgment = if strength == STRONG {
            o.strong_judgment
        } else {
            o.weak_judgment
        };
        vec![judgment - o.plaintiff_trial_cost, -judgment - o.defendant_trial_cost]
    }

    fn settle(&self, demand: Action) -> Vec<f64> {
        let amount = if demand == HIGH_DEMAND {
            self.options.high_demand
        } else {
            self.options.low_demand
        };
        vec![amount, -amount]
    }
}

impl Default for SettlementGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for SettlementGame {
    type History = ActionPath;

    fn catalog(&self) -> &DecisionCatalog {
        &self.catalog
    }

    fn root(&self) -> ActionPath {
        ActionPath::new()
    }

    fn advance(&self, history: &ActionPath, action: Action, decision: &Decision) -> ActionPath {
        history.with(decision.decision_index, action)
    }

    fn node(&self, history: &ActionPath) -> NodeKind {
        let Some(strength) = history.action_at(STRENGTH) else {
            return NodeKind::Chance { decision_index: STRENGTH };
        };
        match (
            history.action_at(FILING),
            history.action_at(DEMAND),
            history.action_at(RESPONSE),
        ) {
            (None, _, _) => NodeKind::Decision {
                decision_index: FILING,
                info_set: Self::filing_key(strength),
            },
            (Some(DROP), _, _) => NodeKind::Terminal(vec![0.0, 0.0]),
            (Some(_), None, _) => NodeKind::Decision {
                decision_index: DEMAND,
                info_set: Self::demand_key(strength),
            },
            (Some(_), Some(demand), None) => NodeKind::Decision {
                decision_index: RESPONSE,
                info_set: Self::response_key(demand),
            },
            (Some(_), Some(demand), Some(ACCEPT)) => NodeKind::Terminal(self.settle(demand)),
            (Some(_), Some(_), Some(_)) => NodeKind::Terminal(self.trial(strength)),
        }
    }

    fn provides_chance_probabilities(&self, decision_index: usize) -> bool {
        decision_index == STRENGTH
    }

    fn chance_probabilities(&self, _decision_index: usize, _history: &ActionPath) -> Vec<f64> {
        let p = self.options.strong_probability;
        vec![p, 1.0 - p]
    }

    fn action_name(&self, decision_index: usize, action: Action) -> String {
        let name = match (decision_index, action) {
            (STRENGTH, STRONG) => "Strong",
            (STRENGTH, _) => "Weak",
            (FILING, FILE) => "File",
            (FILING, _) => "Drop",
            (DEMAND, HIGH_DEMAND) => "High",
            (DEMAND, _) => "Low",
            (_, ACCEPT) => "Accept",
            _ => "Reject",
        };
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::history::HistoryNavigator;
    use crate::cfr::node::GameStateNode;
    use crate::cfr::storage::RegretTable;
    use crate::cfr::{CFRConfig, CFRSolver};

    #[test]
    fn test_uneven_chance_reaches_navigator() {
        let game = SettlementGame::new();
        let table = RegretTable::new();
        let nav = HistoryNavigator::new(&game, &table);
        match nav.game_state(&nav.root()) {
            GameStateNode::Chance(settings) => {
                assert!(!settings.all_equal);
                assert_eq!(settings.probabilities, vec![0.3, 0.7]);
            }
            other => panic!("expected chance root, got {:?}", other),
        }
    }

    #[test]
    fn test_payoffs() {
        let game = SettlementGame::new();
        let terminal = |path: ActionPath| match game.node(&path) {
            NodeKind::Terminal(u) => u,
            other => panic!("expected terminal, got {:?}", other),
        };
        let filed = |strength| game.root().with(STRENGTH, strength).with(FILING, FILE);

        assert_eq!(terminal(game.root().with(STRENGTH, WEAK).with(FILING, DROP)), vec![0.0, 0.0]);
        assert_eq!(
            terminal(filed(WEAK).with(DEMAND, HIGH_DEMAND).with(RESPONSE, ACCEPT)),
            vec![0.8, -0.8]
        );
        let trial = terminal(filed(STRONG).with(DEMAND, LOW_DEMAND).with(RESPONSE, REJECT));
        assert!((trial[0] - 0.85).abs() < 1e-12);
        assert!((trial[1] + 1.15).abs() < 1e-12);
    }

    #[test]
    fn test_vanilla_eliminates_dominated_actions() {
        let mut solver = CFRSolver::new(SettlementGame::new(), CFRConfig::vanilla()).unwrap();
        solver.train(10_000);

        // forced filing is recorded as a pure strategy
        for strength in [STRONG, WEAK] {
            assert_eq!(
                solver.get_average_strategy(&SettlementGame::filing_key(strength)),
                Some(vec![1.0, 0.0])
            );
        }
        let strong = solver.get_average_strategy(&SettlementGame::demand_key(STRONG)).unwrap();
        assert!(strong[0] > 0.95, "strong plaintiff demands high: {:?}", strong);
        let low = solver.get_average_strategy(&SettlementGame::response_key(LOW_DEMAND)).unwrap();
        assert!(low[0] > 0.95, "low demands are accepted: {:?}", low);
    }

    #[test]
    fn test_probing_handles_forced_and_uneven_decisions() {
        let mut solver = CFRSolver::new(SettlementGame::new(), CFRConfig::probing().with_seed(3)).unwrap();
        solver.train(20_000);

        assert_eq!(solver.num_info_sets(), 6);
        let filing = solver.table().get(&SettlementGame::filing_key(WEAK)).unwrap();
        assert_eq!(filing.cumulative_regret(), vec![0.0, 0.0]);
        let strong = solver.get_average_strategy(&SettlementGame::demand_key(STRONG)).unwrap();
        assert!(strong[0] > 0.8, "strong plaintiff demands high: {:?}", strong);
        for entry in solver.snapshot().strategies {
            let sum: f64 = entry.average_strategy.iter().sum();
            assert!((sum - 1.0).abs() < 1e-9);
        }
    }
}

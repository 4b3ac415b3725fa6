//! Exact best response and exploitability of the average strategy.
//!
//! The best responder's information sets are resolved one decision at a
//! time in reverse execution order. Because decision indices only grow along
//! a path, everything below a decision being resolved is already fixed, so
//! each pass only has to sum the counterfactual value of every action over
//! the histories in each information set (weighted by chance and opponent
//! reach) and keep the argmax.
//!
//! Nothing here writes to the table: missing tallies read as uniform.

use rustc_hash::FxHashMap;

use crate::cfr::decision::{Action, Decision};
use crate::cfr::game::{Game, InfoSetKey, NodeKind};
use crate::cfr::storage::RegretTable;

/// Pure best-response policy: one action per information set.
pub type Policy = FxHashMap<InfoSetKey, Action>;

/// Evaluates average strategies stored in a table against best responses.
pub struct BestResponse<'a, G: Game> {
    game: &'a G,
    table: &'a RegretTable,
}

impl<'a, G: Game> BestResponse<'a, G> {
    /// Bind a game to the table holding its average strategies.
    pub fn new(game: &'a G, table: &'a RegretTable) -> Self {
        Self { game, table }
    }

    /// Expected utility of every player when all follow the average strategy.
    pub fn strategy_values(&self) -> Vec<f64> {
        self.expected_utilities(&self.game.root())
    }

    /// Best pure response of `player` against everyone else's average strategy.
    pub fn best_response(&self, player: usize) -> Policy {
        let mut policy = Policy::default();
        let owned: Vec<&Decision> = self
            .game
            .catalog()
            .decisions()
            .iter()
            .filter(|d| !d.is_chance && d.player_index == player && d.always_do_action.is_none())
            .collect();

        for decision in owned.into_iter().rev() {
            let mut counterfactual: FxHashMap<InfoSetKey, Vec<f64>> = FxHashMap::default();
            let root = self.game.root();
            self.evaluate(
                &root,
                player,
                1.0,
                Some(decision.decision_index),
                &policy,
                &mut counterfactual,
            );
            for (key, values) in counterfactual {
                policy.insert(key, argmax(&values));
            }
        }
        log::debug!("best response for player {} covers {} info sets", player, policy.len());
        policy
    }

    /// Value `player` obtains by best-responding.
    pub fn best_response_value(&self, player: usize) -> f64 {
        let policy = self.best_response(player);
        let mut unused = FxHashMap::default();
        self.evaluate(&self.game.root(), player, 1.0, None, &policy, &mut unused)
    }

    /// Average gain available to a unilateral deviator.
    ///
    /// `Σ_p (BR_p − v_p) / n`; zero exactly at a Nash equilibrium.
    pub fn exploitability(&self) -> f64 {
        let values = self.strategy_values();
        let players = self.game.num_players();
        let gain: f64 = (0..players)
            .map(|p| self.best_response_value(p) - values[p])
            .sum();
        gain / players as f64
    }

    fn evaluate(
        &self,
        history: &G::History,
        player: usize,
        reach: f64,
        resolving: Option<usize>,
        policy: &Policy,
        counterfactual: &mut FxHashMap<InfoSetKey, Vec<f64>>,
    ) -> f64 {
        match self.game.node(history) {
            NodeKind::Terminal(utilities) => utilities[player],
            NodeKind::Chance { decision_index } => {
                let decision = self.game.catalog().decision(decision_index);
                let probabilities = self.chance_probabilities(decision, history);
                let mut value = 0.0;
                for (action, p) in decision.actions().zip(probabilities) {
                    if p == 0.0 {
                        continue;
                    }
                    let next = self.game.advance(history, action, decision);
                    value += p * self.evaluate(&next, player, reach * p, resolving, policy, counterfactual);
                }
                value
            }
            NodeKind::Decision {
                decision_index,
                info_set,
            } => {
                let decision = self.game.catalog().decision(decision_index);
                if decision.player_index != player {
                    let probabilities = self.average_distribution(decision, &info_set);
                    let mut value = 0.0;
                    for (action, p) in decision.actions().zip(probabilities) {
                        if p == 0.0 {
                            continue;
                        }
                        let next = self.game.advance(history, action, decision);
                        value += p * self.evaluate(&next, player, reach * p, resolving, policy, counterfactual);
                    }
                    return value;
                }

                let chosen = decision
                    .always_do_action
                    .or_else(|| policy.get(&info_set).copied());
                if let Some(action) = chosen {
                    let next = self.game.advance(history, action, decision);
                    return self.evaluate(&next, player, reach, resolving, policy, counterfactual);
                }

                let values: Vec<f64> = decision
                    .actions()
                    .map(|action| {
                        let next = self.game.advance(history, action, decision);
                        self.evaluate(&next, player, reach, resolving, policy, counterfactual)
                    })
                    .collect();

                match resolving {
                    // earlier decision of the responder: only descend to reach the one being resolved
                    Some(target) if target != decision_index => 0.0,
                    Some(_) => {
                        let entry = counterfactual
                            .entry(info_set)
                            .or_insert_with(|| vec![0.0; values.len()]);
                        for (total, v) in entry.iter_mut().zip(&values) {
                            *total += reach * v;
                        }
                        values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
                    }
                    None => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                }
            }
        }
    }

    fn expected_utilities(&self, history: &G::History) -> Vec<f64> {
        let (decision, probabilities) = match self.game.node(history) {
            NodeKind::Terminal(utilities) => return utilities,
            NodeKind::Chance { decision_index } => {
                let decision = self.game.catalog().decision(decision_index);
                (decision, self.chance_probabilities(decision, history))
            }
            NodeKind::Decision {
                decision_index,
                info_set,
            } => {
                let decision = self.game.catalog().decision(decision_index);
                (decision, self.average_distribution(decision, &info_set))
            }
        };

        let mut total = vec![0.0; self.game.num_players()];
        for (action, p) in decision.actions().zip(probabilities) {
            if p == 0.0 {
                continue;
            }
            let next = self.game.advance(history, action, decision);
            for (t, u) in total.iter_mut().zip(self.expected_utilities(&next)) {
                *t += p * u;
            }
        }
        total
    }

    fn chance_probabilities(&self, decision: &Decision, history: &G::History) -> Vec<f64> {
        if decision.uneven_chance_actions {
            self.game.chance_probabilities(decision.decision_index, history)
        } else {
            let n = decision.num_actions as usize;
            vec![1.0 / n as f64; n]
        }
    }

    fn average_distribution(&self, decision: &Decision, key: &InfoSetKey) -> Vec<f64> {
        let n = decision.num_actions as usize;
        if let Some(forced) = decision.always_do_action {
            let mut one_hot = vec![0.0; n];
            one_hot[forced as usize - 1] = 1.0;
            return one_hot;
        }
        match self.table.get(key) {
            Some(tally) => tally.average_strategy(),
            None => vec![1.0 / n as f64; n],
        }
    }
}

/// 1-based index of the largest value; ties go to the lowest action.
fn argmax(values: &[f64]) -> Action {
    let mut best = 0;
    for (i, v) in values.iter().enumerate() {
        if *v > values[best] {
            best = i;
        }
    }
    best as Action + 1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::history::HistoryNavigator;
    use crate::cfr::node::GameStateNode;
    use crate::games::signaling::{
        SignalingGame, BET, EQUILIBRIUM_CALL, EQUILIBRIUM_LOW_BET, EQUILIBRIUM_VALUE, HIGH, LOW,
    };

    /// Install average strategies: bet probability per signal, call probability.
    fn table_with(game: &SignalingGame, high_bet: f64, low_bet: f64, call: f64) -> RegretTable {
        let table = RegretTable::new();
        let nav = HistoryNavigator::new(game, &table);
        let root = nav.root();
        for (signal, bet) in [(HIGH, high_bet), (LOW, low_bet)] {
            let h = nav.advance(&root, signal, nav.decision(0));
            if let GameStateNode::InformationSet(t) = nav.game_state(&h) {
                t.set(&[0.0, 0.0], &[bet, 1.0 - bet]);
            }
            let after_bet = nav.advance(&h, BET, nav.decision(1));
            if let GameStateNode::InformationSet(t) = nav.game_state(&after_bet) {
                t.set(&[0.0, 0.0], &[call, 1.0 - call]);
            }
        }
        table
    }

    #[test]
    fn test_equilibrium_is_unexploitable() {
        let game = SignalingGame::new();
        let table = table_with(&game, 1.0, EQUILIBRIUM_LOW_BET, EQUILIBRIUM_CALL);
        let br = BestResponse::new(&game, &table);

        let values = br.strategy_values();
        assert!((values[0] - EQUILIBRIUM_VALUE).abs() < 1e-12);
        assert!((values[0] + values[1]).abs() < 1e-12);
        assert!((br.best_response_value(0) - EQUILIBRIUM_VALUE).abs() < 1e-12);
        assert!((br.best_response_value(1) + EQUILIBRIUM_VALUE).abs() < 1e-12);
        assert!(br.exploitability().abs() < 1e-12);
    }

    #[test]
    fn test_pure_strategy_is_exploited() {
        // sender always bets, receiver always calls
        let game = SignalingGame::new();
        let table = table_with(&game, 1.0, 1.0, 1.0);
        let br = BestResponse::new(&game, &table);

        assert_eq!(br.strategy_values(), vec![0.0, 0.0]);
        let policy = br.best_response(0);
        assert_eq!(policy.get(&SignalingGame::sender_key(HIGH)), Some(&BET));
        assert_eq!(policy.get(&SignalingGame::sender_key(LOW)), Some(&crate::games::signaling::CHECK));
        assert!((br.best_response_value(0) - 0.5).abs() < 1e-12);
        assert!(br.best_response_value(1).abs() < 1e-12);
        assert!((br.exploitability() - 0.25).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table_reads_uniform() {
        let game = SignalingGame::new();
        let table = RegretTable::new();
        let br = BestResponse::new(&game, &table);
        assert!(br.exploitability() > 0.0);
        assert!(table.is_empty());
    }

    #[test]
    fn test_argmax_prefers_lowest_on_ties() {
        assert_eq!(argmax(&[1.0, 1.0]), 1);
        assert_eq!(argmax(&[-1.0, 0.5, 0.5]), 2);
    }
}

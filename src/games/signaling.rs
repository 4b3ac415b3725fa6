//! A two-type signaling game.
//!
//! Nature deals the sender a High or Low signal with equal probability. The
//! sender sees it and either bets or checks. A check goes straight to
//! showdown for 1. After a bet the receiver, who never sees the signal,
//! calls (showdown for 2) or folds (sender wins 1).
//!
//! The unique equilibrium has High always betting, Low bluffing 1/3 of the
//! time and the receiver calling 2/3 of the time, for a sender value of 1/3.

use crate::cfr::decision::{Action, Decision, DecisionCatalog, PlayerInfo};
use crate::cfr::game::{Game, InfoSetKey, NodeKind};
use crate::cfr::history::ActionPath;

/// Nature's signal: strong.
pub const HIGH: Action = 1;
/// Nature's signal: weak.
pub const LOW: Action = 2;
/// Sender raises the stake.
pub const BET: Action = 1;
/// Sender goes to showdown at the base stake.
pub const CHECK: Action = 2;
/// Receiver matches the bet.
pub const CALL: Action = 1;
/// Receiver concedes.
pub const FOLD: Action = 2;

const SIGNAL: usize = 0;
const SENDER: usize = 1;
const RECEIVER: usize = 2;

/// Equilibrium probability that a High sender bets.
pub const EQUILIBRIUM_HIGH_BET: f64 = 1.0;
/// Equilibrium probability that a Low sender bets.
pub const EQUILIBRIUM_LOW_BET: f64 = 1.0 / 3.0;
/// Equilibrium probability that the receiver calls.
pub const EQUILIBRIUM_CALL: f64 = 2.0 / 3.0;
/// Sender's equilibrium value.
pub const EQUILIBRIUM_VALUE: f64 = 1.0 / 3.0;

/// Signaling game instance.
#[derive(Debug, Clone)]
pub struct SignalingGame {
    catalog: DecisionCatalog,
}

impl SignalingGame {
    /// Build the game.
    pub fn new() -> Self {
        let players = vec![
            PlayerInfo::strategic("Sender", 0),
            PlayerInfo::strategic("Receiver", 1),
            PlayerInfo::chance("Nature", 2),
        ];
        let decisions = vec![
            Decision::chance("Signal", "Sig", 2, 2),
            Decision::new("Sender", "Snd", 0, 2).terminating(),
            Decision::new("Receiver", "Rcv", 1, 2).terminating(),
        ];
        let catalog = DecisionCatalog::new(players, decisions)
            .unwrap_or_else(|e| unreachable!("signaling catalog is well formed: {}", e));
        Self { catalog }
    }

    /// Information set of the sender holding `signal`.
    pub fn sender_key(signal: Action) -> InfoSetKey {
        InfoSetKey::new(0, SENDER, vec![signal])
    }

    /// The receiver's single information set: it has seen a bet.
    pub fn receiver_key() -> InfoSetKey {
        InfoSetKey::new(1, RECEIVER, vec![BET])
    }

    fn showdown(signal: Action, stake: f64) -> Vec<f64> {
        let sender = if signal == HIGH { stake } else { -stake };
        vec![sender, -sender]
    }
}

impl Default for SignalingGame {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for SignalingGame {
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
        let Some(signal) = history.action_at(SIGNAL) else {
            return NodeKind::Chance { decision_index: SIGNAL };
        };
        match (history.action_at(SENDER), history.action_at(RECEIVER)) {
            (None, _) => NodeKind::Decision {
                decision_index: SENDER,
                info_set: Self::sender_key(signal),
            },
            (Some(CHECK), _) => NodeKind::Terminal(Self::showdown(signal, 1.0)),
            (Some(_), None) => NodeKind::Decision {
                decision_index: RECEIVER,
                info_set: Self::receiver_key(),
            },
            (Some(_), Some(FOLD)) => NodeKind::Terminal(vec![1.0, -1.0]),
            (Some(_), Some(_)) => NodeKind::Terminal(Self::showdown(signal, 2.0)),
        }
    }

    fn action_name(&self, decision_index: usize, action: Action) -> String {
        let name = match (decision_index, action) {
            (SIGNAL, HIGH) => "High",
            (SIGNAL, _) => "Low",
            (SENDER, BET) => "Bet",
            (SENDER, _) => "Check",
            (_, CALL) => "Call",
            _ => "Fold",
        };
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn terminal(game: &SignalingGame, path: &[Action]) -> Vec<f64> {
        let mut h = game.root();
        for (d, &a) in path.iter().enumerate() {
            h = game.advance(&h, a, game.catalog().decision(d));
        }
        match game.node(&h) {
            NodeKind::Terminal(u) => u,
            other => panic!("expected terminal after {:?}, got {:?}", path, other),
        }
    }

    #[test]
    fn test_payoffs() {
        let game = SignalingGame::new();
        assert_eq!(terminal(&game, &[HIGH, CHECK]), vec![1.0, -1.0]);
        assert_eq!(terminal(&game, &[LOW, CHECK]), vec![-1.0, 1.0]);
        assert_eq!(terminal(&game, &[LOW, BET, FOLD]), vec![1.0, -1.0]);
        assert_eq!(terminal(&game, &[HIGH, BET, CALL]), vec![2.0, -2.0]);
        assert_eq!(terminal(&game, &[LOW, BET, CALL]), vec![-2.0, 2.0]);
    }

    #[test]
    fn test_receiver_cannot_see_signal() {
        let game = SignalingGame::new();
        let keys: Vec<_> = [HIGH, LOW]
            .iter()
            .map(|&s| {
                let h = game.root().with(SIGNAL, s).with(SENDER, BET);
                game.node(&h)
            })
            .collect();
        assert_eq!(keys[0], keys[1]);
        assert_eq!(game.num_players(), 2);
        assert_eq!(game.action_name(SENDER, CHECK), "Check");
    }
}

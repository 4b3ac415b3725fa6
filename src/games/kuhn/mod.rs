//! Kuhn Poker implementation for CFR validation.
//!
//! Kuhn Poker is a simplified poker game used to validate CFR implementations
//! because it has a known, mathematically proven Nash equilibrium.
//!
//! ## Game Rules
//!
//! - 3 cards: Jack (0), Queen (1), King (2)
//! - 2 players, each antes 1 chip
//! - Each player receives 1 card (two chance decisions)
//! - Player 1 acts first: Pass or Bet (1 chip)
//! - Player 2 responds based on P1's action
//! - Higher card wins at showdown
//!
//! ## Decisions
//!
//! ```text
//! D0 deal P1 card (chance, 3)
//! D1 deal P2 card (chance, 2 of the remaining)
//! D2 P1 opens        Pass | Bet
//! D3 P2 responds     Pass | Bet
//! D4 P1 after p-b    Pass | Bet
//! ```
//!
//! ## Known Nash Equilibrium
//!
//! - **Player 1 with Jack**: Bet with probability α ∈ [0, 1/3]
//! - **Player 1 with Queen**: Always Pass
//! - **Player 1 with King**: Bet with probability 3α
//! - **Player 2 facing Bet with Jack**: Always Fold
//! - **Player 2 facing Bet with Queen**: Call with probability 1/3
//! - **Player 2 facing Bet with King**: Always Call
//!
//! **Expected Value**: Player 1 EV = -1/18 ≈ -0.0556

use arrayvec::ArrayVec;

use crate::cfr::decision::{Action, Decision, DecisionCatalog, PlayerInfo};
use crate::cfr::game::{Game, InfoSetKey, NodeKind};
use crate::cfr::history::ActionPath;

/// Pass (check if no bet, fold if facing bet).
pub const PASS: Action = 1;
/// Bet (or call if facing bet).
pub const BET: Action = 2;

const DEAL_P1: usize = 0;
const DEAL_P2: usize = 1;
const P1_OPEN: usize = 2;
const P2_RESPOND: usize = 3;
const P1_RESPOND: usize = 4;

/// Player 1's equilibrium expected value.
pub const GAME_VALUE: f64 = -1.0 / 18.0;

/// Kuhn Poker game.
#[derive(Debug, Clone)]
pub struct KuhnPoker {
    catalog: DecisionCatalog,
}

impl KuhnPoker {
    /// Create a new Kuhn Poker game.
    pub fn new() -> Self {
        let players = vec![
            PlayerInfo::strategic("Player 1", 0),
            PlayerInfo::strategic("Player 2", 1),
            PlayerInfo::chance("Dealer", 2),
        ];
        let decisions = vec![
            Decision::chance("Deal P1", "C1", 2, 3),
            Decision::chance("Deal P2", "C2", 2, 2),
            Decision::new("P1 Open", "O", 0, 2).terminating(),
            Decision::new("P2 Respond", "R", 1, 2).terminating(),
            Decision::new("P1 Respond", "F", 0, 2).terminating(),
        ];
        let catalog = DecisionCatalog::new(players, decisions)
            .unwrap_or_else(|e| unreachable!("kuhn catalog is well formed: {}", e));
        Self { catalog }
    }

    /// Get card name for display.
    pub fn card_name(card: u8) -> &'static str {
        match card {
            0 => "Jack",
            1 => "Queen",
            2 => "King",
            _ => "Unknown",
        }
    }

    /// Cards held by each player, once both are dealt.
    pub fn cards(history: &ActionPath) -> Option<[u8; 2]> {
        let first = history.action_at(DEAL_P1)? - 1;
        let second = history.action_at(DEAL_P2)?;
        let remaining: ArrayVec<u8, 2> = (0..3u8).filter(|&c| c != first).collect();
        Some([first, remaining[second as usize - 1]])
    }

    /// Key of Player 1's opening decision holding `card`.
    pub fn open_key(card: u8) -> InfoSetKey {
        InfoSetKey::new(0, P1_OPEN, vec![card])
    }

    /// Key of Player 2 holding `card` after Player 1's `first` action.
    pub fn respond_key(card: u8, first: Action) -> InfoSetKey {
        InfoSetKey::new(1, P2_RESPOND, vec![card, first])
    }

    /// Key of Player 1 holding `card` facing a bet after passing.
    pub fn final_key(card: u8) -> InfoSetKey {
        InfoSetKey::new(0, P1_RESPOND, vec![card])
    }

    fn showdown(cards: [u8; 2], stake: f64) -> Vec<f64> {
        let p1 = if cards[0] > cards[1] { stake } else { -stake };
        vec![p1, -p1]
    }
}

impl Default for KuhnPoker {
    fn default() -> Self {
        Self::new()
    }
}

impl Game for KuhnPoker {
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
        let Some(cards) = Self::cards(history) else {
            return NodeKind::Chance {
                decision_index: history.next_decision_index(),
            };
        };
        let betting: ArrayVec<Action, 3> = history.actions().skip(2).collect();
        match betting.as_slice() {
            [] => NodeKind::Decision {
                decision_index: P1_OPEN,
                info_set: Self::open_key(cards[0]),
            },
            &[first] => NodeKind::Decision {
                decision_index: P2_RESPOND,
                info_set: Self::respond_key(cards[1], first),
            },
            [PASS, PASS] => NodeKind::Terminal(Self::showdown(cards, 1.0)),
            [PASS, BET] => NodeKind::Decision {
                decision_index: P1_RESPOND,
                info_set: Self::final_key(cards[0]),
            },
            [BET, PASS] => NodeKind::Terminal(vec![1.0, -1.0]),
            [PASS, BET, PASS] => NodeKind::Terminal(vec![-1.0, 1.0]),
            _ => NodeKind::Terminal(Self::showdown(cards, 2.0)),
        }
    }

    fn action_name(&self, decision_index: usize, action: Action) -> String {
        match (decision_index, action) {
            (DEAL_P1, card) => Self::card_name(card - 1).to_string(),
            (DEAL_P2, n) => format!("Card {}", n),
            (_, PASS) => "Pass".to_string(),
            _ => "Bet".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cfr::{CFRConfig, CFRSolver};

    fn play(game: &KuhnPoker, actions: &[Action]) -> ActionPath {
        let mut history = game.root();
        for &a in actions {
            let decision_index = match game.node(&history) {
                NodeKind::Chance { decision_index } => decision_index,
                NodeKind::Decision { decision_index, .. } => decision_index,
                NodeKind::Terminal(_) => panic!("played past the end"),
            };
            history = game.advance(&history, a, game.catalog().decision(decision_index));
        }
        history
    }

    #[test]
    fn test_kuhn_game_tree() {
        let game = KuhnPoker::new();

        // Test initial state
        let root = game.root();
        assert_eq!(game.node(&root), NodeKind::Chance { decision_index: DEAL_P1 });
        let half_dealt = play(&game, &[3]);
        assert_eq!(game.node(&half_dealt), NodeKind::Chance { decision_index: DEAL_P2 });

        // K vs J: P1 holds card 2, P2 takes the first remaining card
        let dealt = play(&game, &[3, 1]);
        assert_eq!(KuhnPoker::cards(&dealt), Some([2, 0]));
        match game.node(&dealt) {
            NodeKind::Decision { decision_index, info_set } => {
                assert_eq!(decision_index, P1_OPEN);
                assert_eq!(info_set, KuhnPoker::open_key(2));
            }
            other => panic!("expected P1 decision, got {:?}", other),
        }
        assert_eq!(game.num_players(), 2);
    }

    #[test]
    fn test_kuhn_terminal_payoffs() {
        let game = KuhnPoker::new();
        let terminal = |actions: &[Action]| match game.node(&play(&game, actions)) {
            NodeKind::Terminal(u) => u,
            other => panic!("expected terminal, got {:?}", other),
        };

        // K vs J, both pass: higher card wins the antes
        assert_eq!(terminal(&[3, 1, PASS, PASS]), vec![1.0, -1.0]);
        // J vs K, bet then fold
        assert_eq!(terminal(&[1, 2, BET, PASS]), vec![1.0, -1.0]);
        // J vs K, bet then call: showdown for 2
        assert_eq!(terminal(&[1, 2, BET, BET]), vec![-2.0, 2.0]);
        // pass, bet, fold
        assert_eq!(terminal(&[3, 1, PASS, BET, PASS]), vec![-1.0, 1.0]);
        // pass, bet, call with K vs Q
        assert_eq!(terminal(&[3, 2, PASS, BET, BET]), vec![2.0, -2.0]);
    }

    #[test]
    fn test_kuhn_info_states() {
        let game = KuhnPoker::new();

        // Q vs K after P1 passes: P2 sees K and the pass
        let history = play(&game, &[2, 2, PASS]);
        assert_eq!(KuhnPoker::cards(&history), Some([1, 2]));
        match game.node(&history) {
            NodeKind::Decision { info_set, .. } => {
                assert_eq!(info_set, KuhnPoker::respond_key(2, PASS));
                assert_eq!(info_set.to_string(), "P1@D3:2,1");
            }
            other => panic!("expected P2 decision, got {:?}", other),
        }
        assert_eq!(game.action_name(DEAL_P1, 1), "Jack");
        assert_eq!(game.action_name(P2_RESPOND, BET), "Bet");
    }

    #[test]
    fn test_kuhn_cfr_convergence() {
        let game = KuhnPoker::new();
        let mut solver = CFRSolver::new(game, CFRConfig::vanilla()).unwrap();
        solver.train(20_000);

        // 3 cards × (open, respond to pass, respond to bet, final)
        assert_eq!(solver.num_info_sets(), 12);

        let strategy = |key: InfoSetKey| solver.get_average_strategy(&key).unwrap();

        // Index 0 = Pass, Index 1 = Bet
        let jack = strategy(KuhnPoker::open_key(0));
        let queen = strategy(KuhnPoker::open_key(1));
        let king = strategy(KuhnPoker::open_key(2));
        assert!(jack[1] < 0.4, "Jack bet probability {} should be at most 1/3", jack[1]);
        assert!(queen[0] > 0.95, "Queen pass probability {} should be near 1.0", queen[0]);
        assert!(
            (king[1] - 3.0 * jack[1]).abs() < 0.1,
            "King bet {} should be three times Jack bet {}",
            king[1],
            jack[1]
        );

        // Check P2's strategies facing a bet
        let p2_jack = strategy(KuhnPoker::respond_key(0, BET));
        let p2_queen = strategy(KuhnPoker::respond_key(1, BET));
        let p2_king = strategy(KuhnPoker::respond_key(2, BET));
        assert!(p2_jack[0] > 0.95, "P2 Jack should fold to bet");
        assert!(p2_king[1] > 0.95, "P2 King should call bet");
        assert!(
            (p2_queen[1] - 1.0 / 3.0).abs() < 0.1,
            "P2 Queen call probability {} should be near 1/3",
            p2_queen[1]
        );

        let values = solver.average_strategy_values();
        assert!((values[0] - GAME_VALUE).abs() < 0.01, "P1 value {}", values[0]);
        assert!(solver.calculate_exploitability() < 0.01);
    }

    #[test]
    fn test_kuhn_probing_improves() {
        let game = KuhnPoker::new();
        let mut solver = CFRSolver::new(game, CFRConfig::probing().with_seed(42)).unwrap();
        solver.train(100);
        let early = solver.calculate_exploitability();
        solver.train(20_000);
        let late = solver.calculate_exploitability();
        assert!(late < early, "{} should be below {}", late, early);
        assert!(late < 0.1, "probing exploitability {}", late);
    }
}

//! CFR (Counterfactual Regret Minimization) engine.
//!
//! This module computes approximate equilibria of extensive-form games with
//! chance, decision and terminal nodes, such as bargaining and litigation
//! games.
//!
//! # Overview
//!
//! A game describes itself through a [`DecisionCatalog`] and a navigator
//! over an implicit tree ([`Game`]). The engine keeps one
//! [`InformationSetTally`] per information set in a shared [`RegretTable`]
//! and runs one of two traversals per iteration:
//!
//! - **Vanilla CFR** ([`vanilla`]): full recursive walk with exact values,
//!   optional zero-reach pruning and parallel chance fan-out.
//! - **Probing CFR** ([`probing`]): Gibson-style Monte Carlo CFR that follows
//!   one sampled trajectory and values off-path actions with a cheap probe.
//!
//! # Usage
//!
//! 1. Implement the `Game` trait for your game
//! 2. Create a `CFRSolver` with your game and configuration
//! 3. Call `train()` to run iterations
//! 4. Read strategies with `get_average_strategy()` or `snapshot()`
//!
//! # Example
//!
//! ```
//! use extensive_cfr::cfr::{CFRConfig, CFRSolver};
//! use extensive_cfr::games::kuhn::KuhnPoker;
//!
//! let mut solver = CFRSolver::new(KuhnPoker::new(), CFRConfig::vanilla()).unwrap();
//! let stats = solver.train(1_000);
//! assert_eq!(stats.info_sets, 12);
//!
//! let king = solver.get_average_strategy(&KuhnPoker::respond_key(2, 2)).unwrap();
//! assert!(king[1] > 0.9);
//! ```
//!
//! # Theory
//!
//! **Regret**: The difference between the value of an action and the value of the current strategy.
//! ```text
//! Regret(a) = Value(a) - Value(current_strategy)
//! ```
//!
//! **Regret Matching**: Set strategy proportional to positive regrets.
//! ```text
//! Strategy(a) = max(0, Regret(a)) / sum(max(0, Regret(a')))
//! ```
//!
//! # References
//!
//! - Zinkevich, M., et al. "Regret Minimization in Games with Incomplete Information" (2007)
//! - Gibson, R., et al. "Efficient Monte Carlo Counterfactual Regret Minimization in Games with Many Player Actions" (2012)

pub mod best_response;
pub mod config;
pub mod decision;
pub mod error;
pub mod game;
pub mod history;
pub mod node;
pub mod probing;
pub mod sampling;
pub mod solver;
pub mod storage;
pub mod tally;
pub mod vanilla;

// Re-export main types for convenient access
pub use best_response::BestResponse;
pub use config::{Algorithm, CFRConfig, CFRStats, ConfigError, ExploitabilityPoint};
pub use decision::{Action, Decision, DecisionCatalog, PlayerInfo};
pub use error::SolverError;
pub use game::{Game, InfoSetKey, NodeKind};
pub use history::{ActionPath, HistoryNavigator};
pub use node::{ChanceNodeSettings, FinalUtilities, GameStateNode};
pub use solver::{CFRSolver, ConvergenceResult, ConvergenceStats, IterationReport, SolverState};
pub use storage::{InfoSetStrategy, RegretTable, StrategySnapshot, TableExport};
pub use tally::InformationSetTally;

//! # Extensive CFR
//!
//! Counterfactual Regret Minimization core for extensive-form bargaining and
//! litigation games.
//!
//! ## Features
//!
//! - **Generic engine**: works with any game implementing the `Game` trait
//! - **Two traversals**: vanilla CFR and probing (Monte Carlo) CFR
//! - **Thread-safe table**: per-information-set locks, rayon fan-out
//! - **Checkpointing**: save and resume solver state
//! - **Exploitability**: exact best response against the average strategy
//!
//! ## Modules
//!
//! - [`cfr`]: Core CFR algorithm and solver
//! - [`games`]: Bundled games (signaling, Kuhn Poker, settlement)
//!
//! ## Architecture
//!
//! ```text
//! CFRSolver (iteration scheduler)
//!     │ one call per optimized player per iteration
//!     ▼
//! VanillaCfr / ProbingCfr
//!     │ advance + game_state
//!     ▼
//! HistoryNavigator ──► Game (catalog, root, advance, node)
//!     │ decision nodes
//!     ▼
//! RegretTable ──► InformationSetTally (regret matching, increments)
//! ```

#![warn(missing_docs)]

/// CFR (Counterfactual Regret Minimization) engine.
pub mod cfr;

/// Game implementations module.
///
/// Contains small games with known equilibria for testing and validation.
pub mod games;

// Re-export commonly used types at crate root for convenience
pub use cfr::{Action, CFRConfig, CFRSolver, CFRStats, Game, InfoSetKey, SolverError};

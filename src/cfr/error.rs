//! Error types for solver setup, configuration and persistence.
//!
//! Only setup-time problems are errors. Numeric degeneracy during a
//! traversal (all-zero regrets, rounding in the sampler) is resolved locally
//! and never reaches the caller.

use thiserror::Error;

use crate::cfr::config::ConfigError;

/// Errors that abort a solve before (or instead of) running iterations.
#[derive(Debug, Error)]
pub enum SolverError {
    /// The selected algorithm cannot handle this many strategic players.
    #[error("{algorithm} CFR supports at most two non-chance players, game has {players}")]
    UnsupportedPlayerCount {
        /// Name of the algorithm that was requested.
        algorithm: &'static str,
        /// Number of non-chance players in the game.
        players: usize,
    },

    /// A chance decision is flagged as uneven but the game supplies no probabilities for it.
    #[error("chance decision {decision} has uneven actions but the game provides no probabilities")]
    MissingChanceProbabilities {
        /// Name of the offending decision.
        decision: String,
    },

    /// The decision catalog is inconsistent.
    #[error("invalid decision catalog: {0}")]
    InvalidCatalog(String),

    /// A checkpoint does not belong to this game's decision catalog.
    #[error("invalid checkpoint: {0}")]
    InvalidCheckpoint(String),

    /// The solver configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),

    /// Reading or writing a config or checkpoint file failed.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// A config or checkpoint could not be (de)serialized.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

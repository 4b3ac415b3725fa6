//! Configuration options for the CFR solver.
//!
//! This module provides configuration structs that control which traversal
//! runs, how exploration is scheduled for probing, and where vanilla CFR may
//! fan out across threads.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cfr::error::SolverError;
use crate::cfr::sampling::FanOut;

/// Which traversal the solver runs each iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Algorithm {
    /// Full tree walk with exact values.
    #[default]
    Vanilla,
    /// Gibson-style probing Monte Carlo CFR.
    Probing,
}

impl Algorithm {
    /// Display name used in logs and errors.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Vanilla => "vanilla",
            Algorithm::Probing => "probing",
        }
    }
}

/// Configuration for the CFR solver.
///
/// # Example
/// ```
/// use extensive_cfr::cfr::{Algorithm, CFRConfig};
///
/// let config = CFRConfig::default();
/// assert_eq!(config.algorithm, Algorithm::Vanilla);
/// assert!(config.use_pruning);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CFRConfig {
    /// Traversal to run.
    pub algorithm: Algorithm,

    /// Skip subtrees whose reach probability is zero for every player
    /// (vanilla only).
    pub use_pruning: bool,

    /// With pruning on, actions whose cumulative regret falls below this
    /// value get no share of the uniform fallback distribution.
    pub pruning_regret_threshold: f64,

    /// Allow parallel work: chance fan-out in vanilla CFR, concurrent
    /// per-player walks in probing CFR.
    pub parallel: bool,

    /// Chance nodes at this depth or deeper are walked sequentially.
    pub parallel_depth_limit: usize,

    /// Chance nodes with fewer actions than this are walked sequentially.
    pub parallel_min_actions: usize,

    /// Exploration probability ε at the first iteration (probing only).
    pub first_exploration: f64,

    /// Exploration probability ε approached at the last iteration.
    pub last_exploration: f64,

    /// Curvature of the ε schedule; ε moves with `(t / T)^curve`.
    pub exploration_curve: f64,

    /// Random seed for reproducibility.
    ///
    /// If `None`, a random seed is drawn when the solver is created.
    pub seed: Option<u64>,

    /// Log progress every this many iterations (0 disables).
    pub report_interval: u64,

    /// Draw a terminal progress bar while training.
    pub show_progress: bool,
}

impl Default for CFRConfig {
    fn default() -> Self {
        Self {
            algorithm: Algorithm::Vanilla,
            use_pruning: true,
            pruning_regret_threshold: -1.0e9,
            parallel: false,
            parallel_depth_limit: 2,
            parallel_min_actions: 2,
            first_exploration: 0.5,
            last_exploration: 0.01,
            exploration_curve: 0.75,
            seed: None,
            report_interval: 0,
            show_progress: false,
        }
    }
}

impl CFRConfig {
    /// Create a new CFRConfig with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Vanilla CFR with pruning.
    pub fn vanilla() -> Self {
        Self::default()
    }

    /// Probing CFR with the default exploration schedule.
    pub fn probing() -> Self {
        Self {
            algorithm: Algorithm::Probing,
            use_pruning: false,
            ..Default::default()
        }
    }

    /// Builder method: choose the algorithm.
    pub fn with_algorithm(mut self, algorithm: Algorithm) -> Self {
        self.algorithm = algorithm;
        self
    }

    /// Builder method: set whether to prune zero-reach subtrees.
    pub fn with_pruning(mut self, enable: bool) -> Self {
        self.use_pruning = enable;
        self
    }

    /// Builder method: enable parallel work below `depth_limit`.
    pub fn with_parallel(mut self, depth_limit: usize) -> Self {
        self.parallel = true;
        self.parallel_depth_limit = depth_limit;
        self
    }

    /// Builder method: set the exploration schedule.
    pub fn with_exploration(mut self, first: f64, last: f64, curve: f64) -> Self {
        self.first_exploration = first;
        self.last_exploration = last;
        self.exploration_curve = curve;
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builder method: log every `interval` iterations.
    pub fn with_report_interval(mut self, interval: u64) -> Self {
        self.report_interval = interval;
        self
    }

    /// Builder method: show a progress bar.
    pub fn with_progress(mut self, enable: bool) -> Self {
        self.show_progress = enable;
        self
    }

    /// Parse a configuration from JSON; missing fields take default values.
    pub fn from_json_str(json: &str) -> Result<Self, SolverError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("first", self.first_exploration),
            ("last", self.last_exploration),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidExploration(name, value));
            }
        }
        if !(self.exploration_curve > 0.0 && self.exploration_curve.is_finite()) {
            return Err(ConfigError::InvalidCurve(self.exploration_curve));
        }
        if self.pruning_regret_threshold > 0.0 || self.pruning_regret_threshold.is_nan() {
            return Err(ConfigError::InvalidPruningThreshold(self.pruning_regret_threshold));
        }
        Ok(())
    }

    /// Exploration probability for iteration `iteration` (0-based) of `total`.
    pub fn exploration_at(&self, iteration: u64, total: u64) -> f64 {
        let proportion = if total == 0 {
            0.0
        } else {
            (iteration as f64 / total as f64).clamp(0.0, 1.0)
        };
        self.first_exploration
            + (self.last_exploration - self.first_exploration) * proportion.powf(self.exploration_curve)
    }

    /// Fan-out limits for vanilla chance nodes.
    pub fn fan_out(&self) -> FanOut {
        FanOut {
            enabled: self.parallel,
            depth_limit: self.parallel_depth_limit,
            min_actions: self.parallel_min_actions,
        }
    }
}

/// Errors that can occur when validating CFR configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Exploration probability is out of range [0, 1].
    #[error("{0} exploration probability {1} is out of range [0, 1]")]
    InvalidExploration(&'static str, f64),
    /// Exploration curve must be positive and finite.
    #[error("exploration curve {0} must be positive and finite")]
    InvalidCurve(f64),
    /// Pruning threshold must not be positive.
    #[error("pruning regret threshold {0} must be <= 0")]
    InvalidPruningThreshold(f64),
}

/// Statistics tracked during CFR training.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CFRStats {
    /// Total number of iterations completed.
    pub iterations: u64,

    /// Number of unique information sets discovered.
    pub info_sets: usize,

    /// Total time spent training (in seconds).
    pub elapsed_seconds: f64,

    /// Iterations per second.
    pub iterations_per_second: f64,

    /// Exploration probability used by the latest probing iteration.
    pub exploration: f64,

    /// Per-player values returned by the latest vanilla iteration.
    pub last_values: Vec<f64>,

    /// Most recent exploitability measurement.
    pub exploitability: Option<f64>,

    /// History of exploitability measurements.
    pub exploitability_history: Vec<ExploitabilityPoint>,
}

/// A single exploitability measurement at a specific iteration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExploitabilityPoint {
    /// Iteration number when this measurement was taken.
    pub iteration: u64,
    /// Exploitability value in utility units.
    pub exploitability: f64,
}

impl CFRStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update iterations per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.iterations_per_second = self.iterations as f64 / self.elapsed_seconds;
        }
    }

    /// Record an exploitability measurement.
    pub fn record_exploitability(&mut self, iteration: u64, exploitability: f64) {
        self.exploitability = Some(exploitability);
        self.exploitability_history.push(ExploitabilityPoint {
            iteration,
            exploitability,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        assert!(CFRConfig::default().validate().is_ok());
        assert!(CFRConfig::probing().validate().is_ok());
        assert_eq!(CFRConfig::probing().algorithm, Algorithm::Probing);
    }

    #[test]
    fn test_validation_errors() {
        let config = CFRConfig::default().with_exploration(1.5, 0.0, 1.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidExploration("first", 1.5)));

        let config = CFRConfig::default().with_exploration(0.5, 0.0, 0.0);
        assert_eq!(config.validate(), Err(ConfigError::InvalidCurve(0.0)));

        let config = CFRConfig {
            pruning_regret_threshold: 1.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidPruningThreshold(_))));
    }

    #[test]
    fn test_exploration_schedule_is_monotonic() {
        let config = CFRConfig::probing().with_exploration(0.6, 0.0, 0.75);
        assert_eq!(config.exploration_at(0, 100), 0.6);
        assert!((config.exploration_at(100, 100) - 0.0).abs() < 1e-12);
        let mut previous = f64::INFINITY;
        for i in 0..=100 {
            let eps = config.exploration_at(i, 100);
            assert!(eps <= previous);
            assert!((0.0..=1.0).contains(&eps));
            previous = eps;
        }
        // curve 0.75 at the halfway point
        let expected = 0.6 - 0.6 * 0.5f64.powf(0.75);
        assert!((config.exploration_at(50, 100) - expected).abs() < 1e-12);
        assert_eq!(config.exploration_at(3, 0), 0.6);
    }

    #[test]
    fn test_json_with_defaults() {
        let config = CFRConfig::from_json_str(r#"{"algorithm": "probing", "seed": 7}"#).unwrap();
        assert_eq!(config.algorithm, Algorithm::Probing);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.exploration_curve, 0.75);

        let err = CFRConfig::from_json_str(r#"{"first_exploration": 2.0}"#).unwrap_err();
        assert!(matches!(err, SolverError::InvalidConfig(_)));
        assert!(matches!(CFRConfig::from_json_str("{"), Err(SolverError::Json(_))));
    }

    #[test]
    fn test_fan_out_from_config() {
        let fan_out = CFRConfig::default().with_parallel(3).fan_out();
        assert!(fan_out.enabled);
        assert!(fan_out.allows(2, 2));
        assert!(!fan_out.allows(3, 2));
    }
}

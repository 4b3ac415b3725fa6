//! Iteration scheduler.
//!
//! [`CFRSolver`] owns a game, its configuration and the regret table, and
//! drives whichever traversal the configuration selects. It also carries
//! the run-level concerns: the exploration schedule for probing, per-iteration
//! seeds, progress reporting, checkpoints and exploitability measurement.

use std::path::Path;
use std::time::Instant;

use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};

use crate::cfr::best_response::BestResponse;
use crate::cfr::config::{Algorithm, CFRConfig, CFRStats};
use crate::cfr::error::SolverError;
use crate::cfr::game::{Game, InfoSetKey};
use crate::cfr::history::HistoryNavigator;
use crate::cfr::probing::ProbingCfr;
use crate::cfr::storage::{RegretTable, StrategySnapshot, TableExport};
use crate::cfr::vanilla::VanillaCfr;

/// Derive the seed of one probing iteration from the run seed.
pub fn iteration_seed(base_seed: u64, iteration: u64) -> u64 {
    base_seed.wrapping_add(iteration.wrapping_mul(0xD1B5_4A32_D192_ED03))
}

/// The main CFR solver.
///
/// # Example
/// ```
/// use extensive_cfr::cfr::{CFRConfig, CFRSolver};
/// use extensive_cfr::games::signaling::{SignalingGame, HIGH};
///
/// let mut solver = CFRSolver::new(SignalingGame::new(), CFRConfig::vanilla()).unwrap();
/// solver.train(1_000);
///
/// let strategy = solver.get_average_strategy(&SignalingGame::sender_key(HIGH)).unwrap();
/// assert!(strategy[0] > 0.9);
/// ```
pub struct CFRSolver<G: Game> {
    /// The game being solved.
    game: G,

    /// Configuration for the solver.
    config: CFRConfig,

    /// Cumulative regrets and strategy weights.
    table: RegretTable,

    /// Iterations completed over the solver's lifetime.
    iteration: u64,

    /// Statistics tracking.
    stats: CFRStats,

    /// Root of every per-iteration seed.
    base_seed: u64,

    /// ε used by the next probing iteration.
    exploration: f64,
}

/// What a reporting hook receives after an iteration.
#[derive(Debug, Clone)]
pub struct IterationReport {
    /// Iterations completed so far (lifetime count).
    pub iteration: u64,
    /// Seconds since this training call started.
    pub elapsed_seconds: f64,
    /// Information sets discovered.
    pub info_sets: usize,
    /// ε of the last probing iteration (0 for vanilla).
    pub exploration: f64,
    /// Per-player values of the last vanilla iteration (empty for probing).
    pub values: Vec<f64>,
}

impl<G: Game> CFRSolver<G> {
    /// Create a new CFR solver for the given game.
    ///
    /// Fails if the configuration is invalid, if probing is requested for a
    /// game with more than two strategic players, or if an uneven chance
    /// decision has no probability provider.
    pub fn new(game: G, config: CFRConfig) -> Result<Self, SolverError> {
        Self::with_capacity(game, config, 0)
    }

    /// Create a solver with pre-allocated table capacity.
    pub fn with_capacity(game: G, config: CFRConfig, capacity: usize) -> Result<Self, SolverError> {
        config.validate()?;

        let players = game.num_players();
        if config.algorithm == Algorithm::Probing && players > 2 {
            return Err(SolverError::UnsupportedPlayerCount {
                algorithm: config.algorithm.name(),
                players,
            });
        }
        for decision in game.catalog().decisions() {
            if decision.uneven_chance_actions && !game.provides_chance_probabilities(decision.decision_index) {
                return Err(SolverError::MissingChanceProbabilities {
                    decision: decision.name.clone(),
                });
            }
        }

        let base_seed = config.seed.unwrap_or_else(rand::random);
        log::debug!(
            "{} CFR over {} players and {} decisions, seed {}",
            config.algorithm.name(),
            players,
            game.catalog().decisions().len(),
            base_seed
        );

        Ok(Self {
            exploration: config.first_exploration,
            game,
            config,
            table: RegretTable::with_capacity(capacity),
            iteration: 0,
            stats: CFRStats::new(),
            base_seed,
        })
    }

    /// One vanilla pass per strategic player from the root.
    ///
    /// Returns each player's expected value under the current strategy.
    pub fn run_vanilla_iteration(&self, pi_values: &[f64]) -> Vec<f64> {
        let navigator = HistoryNavigator::new(&self.game, &self.table);
        VanillaCfr::new(navigator, self.config.fan_out(), self.config.pruning_regret_threshold)
            .run_iteration(pi_values, self.config.use_pruning)
    }

    /// One sampled walk per strategic player, using the current ε.
    pub fn run_probing_iteration(&self, seed: u64) {
        let navigator = HistoryNavigator::new(&self.game, &self.table);
        ProbingCfr::new(navigator).run_iteration(seed, self.exploration, self.config.parallel);
    }

    /// Run iteration `index` of a `total`-iteration schedule.
    fn step(&mut self, index: u64, total: u64) {
        match self.config.algorithm {
            Algorithm::Vanilla => {
                let pi_values = vec![1.0; self.game.num_players()];
                self.stats.last_values = self.run_vanilla_iteration(&pi_values);
            }
            Algorithm::Probing => {
                self.exploration = self.config.exploration_at(index, total);
                self.stats.exploration = self.exploration;
                self.run_probing_iteration(iteration_seed(self.base_seed, self.iteration));
            }
        }
        self.iteration += 1;
    }

    /// Train the solver for a specified number of iterations.
    pub fn train(&mut self, iterations: u64) -> &CFRStats {
        self.train_with_callback(iterations, 0, |_| {})
    }

    /// Train, calling `callback` every `callback_interval` iterations
    /// (0 disables the callback).
    pub fn train_with_callback<F>(&mut self, iterations: u64, callback_interval: u64, mut callback: F) -> &CFRStats
    where
        F: FnMut(&IterationReport),
    {
        if iterations == 0 {
            log::warn!("train called with zero iterations");
        }
        log::info!(
            "training {} iterations of {} CFR",
            iterations,
            self.config.algorithm.name()
        );

        let progress = self.progress_bar(iterations);
        let start_time = Instant::now();

        for i in 0..iterations {
            self.step(i, iterations);
            progress.inc(1);

            let done = i + 1;
            let log_now = self.config.report_interval > 0 && done % self.config.report_interval == 0;
            let call_now = callback_interval > 0 && done % callback_interval == 0;
            if log_now || call_now {
                let report = self.report(start_time.elapsed().as_secs_f64());
                if log_now {
                    log::info!(
                        "iteration {} | info sets {} | eps {:.4} | {:.1}s",
                        report.iteration,
                        report.info_sets,
                        report.exploration,
                        report.elapsed_seconds
                    );
                }
                if call_now {
                    callback(&report);
                }
            }
        }
        progress.finish_and_clear();

        self.stats.iterations = self.iteration;
        self.stats.info_sets = self.table.len();
        self.stats.elapsed_seconds += start_time.elapsed().as_secs_f64();
        self.stats.update_rate();
        log::info!(
            "finished at iteration {} with {} info sets ({:.0} it/s)",
            self.iteration,
            self.stats.info_sets,
            self.stats.iterations_per_second
        );

        &self.stats
    }

    /// Train until the Convergence Indicator reaches `ci_target`.
    ///
    /// CI is measured every `ci_check_interval` iterations against the
    /// snapshot taken at the previous check. `max_iterations` of 0 means no
    /// limit; it also sets the length of the exploration schedule.
    pub fn train_until_converged<F>(
        &mut self,
        ci_target: f64,
        ci_check_interval: u64,
        max_iterations: u64,
        mut callback: Option<F>,
    ) -> ConvergenceResult
    where
        F: FnMut(&ConvergenceStats),
    {
        let start_time = Instant::now();
        let interval = ci_check_interval.max(1);
        let mut snapshot: Option<StrategySnapshot> = None;
        let mut current_ci = f64::INFINITY;
        let mut done = 0u64;

        loop {
            for _ in 0..interval {
                self.step(done, max_iterations);
                done += 1;
            }

            if let Some(previous) = &snapshot {
                current_ci = self.table.calculate_ci(previous);
            }
            snapshot = Some(self.table.snapshot());

            let elapsed = start_time.elapsed().as_secs_f64();
            let stats = ConvergenceStats {
                iteration: self.iteration,
                ci: current_ci,
                info_sets: self.table.len(),
                elapsed_seconds: elapsed,
                iterations_per_second: if elapsed > 0.0 { done as f64 / elapsed } else { 0.0 },
            };
            log::debug!("iteration {} ci {:.3}", stats.iteration, stats.ci);
            if let Some(cb) = callback.as_mut() {
                cb(&stats);
            }

            let converged = current_ci <= ci_target;
            if converged || (max_iterations > 0 && done >= max_iterations) {
                self.stats.iterations = self.iteration;
                self.stats.info_sets = self.table.len();
                self.stats.elapsed_seconds += elapsed;
                self.stats.update_rate();
                return ConvergenceResult {
                    converged,
                    final_ci: current_ci,
                    iterations: self.iteration,
                    elapsed_seconds: elapsed,
                };
            }
        }
    }

    fn report(&self, elapsed_seconds: f64) -> IterationReport {
        IterationReport {
            iteration: self.iteration,
            elapsed_seconds,
            info_sets: self.table.len(),
            exploration: match self.config.algorithm {
                Algorithm::Vanilla => 0.0,
                Algorithm::Probing => self.exploration,
            },
            values: self.stats.last_values.clone(),
        }
    }

    fn progress_bar(&self, iterations: u64) -> ProgressBar {
        if !self.config.show_progress {
            return ProgressBar::hidden();
        }
        let bar = ProgressBar::new(iterations);
        let style = ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} ({per_sec}, eta {eta})")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);
        bar
    }

    /// Get the average strategy for an information set.
    ///
    /// This is the time-averaged strategy which converges to equilibrium.
    pub fn get_average_strategy(&self, key: &InfoSetKey) -> Option<Vec<f64>> {
        self.table.average_strategy(key)
    }

    /// Get the current regret-matched strategy for an information set.
    pub fn get_current_strategy(&self, key: &InfoSetKey) -> Option<Vec<f64>> {
        self.table.get(key).map(|t| t.current_strategy())
    }

    /// Read-only snapshot of every information set for reporting.
    pub fn snapshot(&self) -> StrategySnapshot {
        self.table.snapshot()
    }

    /// Convergence Indicator relative to an earlier snapshot.
    pub fn calculate_ci(&self, snapshot: &StrategySnapshot) -> f64 {
        self.table.calculate_ci(snapshot)
    }

    /// Expected value of every player under the average strategy.
    pub fn average_strategy_values(&self) -> Vec<f64> {
        BestResponse::new(&self.game, &self.table).strategy_values()
    }

    /// Exact exploitability of the average strategy, recorded in the stats.
    pub fn calculate_exploitability(&mut self) -> f64 {
        let exploitability = BestResponse::new(&self.game, &self.table).exploitability();
        self.stats.record_exploitability(self.iteration, exploitability);
        log::info!("exploitability {:.6} at iteration {}", exploitability, self.iteration);
        exploitability
    }

    /// Get the current iteration count.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Get the number of information sets discovered.
    pub fn num_info_sets(&self) -> usize {
        self.table.len()
    }

    /// Get current statistics.
    pub fn stats(&self) -> &CFRStats {
        &self.stats
    }

    /// The regret table.
    pub fn table(&self) -> &RegretTable {
        &self.table
    }

    /// Get reference to the game.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &CFRConfig {
        &self.config
    }

    /// Export solver state for checkpointing.
    pub fn export_state(&self) -> SolverState {
        SolverState {
            iteration: self.iteration,
            base_seed: self.base_seed,
            table: self.table.export(),
            stats: self.stats.clone(),
        }
    }

    /// Import solver state from a checkpoint.
    ///
    /// The table is checked against this game's catalog first; on error the
    /// solver is left untouched.
    pub fn import_state(&mut self, state: SolverState) -> Result<(), SolverError> {
        state.table.validate(self.game.catalog())?;
        log::debug!(
            "restoring {} tallies at iteration {}",
            state.table.tallies.len(),
            state.iteration
        );
        self.iteration = state.iteration;
        self.base_seed = state.base_seed;
        self.table.import(state.table);
        self.stats = state.stats;
        Ok(())
    }

    /// Write the solver state to a JSON file.
    pub fn save_checkpoint(&self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let json = serde_json::to_string(&self.export_state())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Restore the solver state from a JSON file.
    pub fn load_checkpoint(&mut self, path: impl AsRef<Path>) -> Result<(), SolverError> {
        let json = std::fs::read_to_string(path)?;
        let state: SolverState = serde_json::from_str(&json)?;
        self.import_state(state)
    }

    /// Reset the solver to initial state.
    pub fn reset(&mut self) {
        self.table.clear();
        self.iteration = 0;
        self.stats = CFRStats::new();
        self.exploration = self.config.first_exploration;
    }
}

impl<G: Game + Clone> Clone for CFRSolver<G> {
    fn clone(&self) -> Self {
        Self {
            game: self.game.clone(),
            config: self.config.clone(),
            table: self.table.clone(),
            iteration: self.iteration,
            stats: self.stats.clone(),
            base_seed: self.base_seed,
            exploration: self.exploration,
        }
    }
}

/// Serializable solver state for checkpointing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverState {
    /// Current iteration.
    pub iteration: u64,
    /// Run seed, so a resumed probing run continues the same streams.
    pub base_seed: u64,
    /// Table export.
    pub table: TableExport,
    /// Statistics.
    pub stats: CFRStats,
}

/// Statistics during convergence-based training.
#[derive(Debug, Clone)]
pub struct ConvergenceStats {
    /// Current iteration count.
    pub iteration: u64,
    /// Current Convergence Indicator value.
    pub ci: f64,
    /// Number of information sets discovered.
    pub info_sets: usize,
    /// Elapsed time in seconds.
    pub elapsed_seconds: f64,
    /// Current solve speed.
    pub iterations_per_second: f64,
}

/// Result of convergence-based training.
#[derive(Debug, Clone)]
pub struct ConvergenceResult {
    /// Whether the target CI was reached.
    pub converged: bool,
    /// Final CI value achieved.
    pub final_ci: f64,
    /// Total iterations run.
    pub iterations: u64,
    /// Total elapsed time in seconds.
    pub elapsed_seconds: f64,
}

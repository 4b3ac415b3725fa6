//! Storage for CFR regrets and strategies.
//!
//! The table maps information-set keys to shared tallies. Entries are created
//! lazily the first time a traversal reaches an information set and live
//! until the table is cleared. The map itself sits behind an `RwLock` that is
//! only taken for writing when a new entry is inserted; the numbers inside an
//! entry are protected by the entry's own lock.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::cfr::decision::DecisionCatalog;
use crate::cfr::error::SolverError;
use crate::cfr::game::InfoSetKey;
use crate::cfr::tally::InformationSetTally;

type TallyMap = FxHashMap<InfoSetKey, Arc<InformationSetTally>>;

/// Thread-safe table of information-set tallies.
#[derive(Debug, Default)]
pub struct RegretTable {
    tallies: RwLock<TallyMap>,
}

impl RegretTable {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            tallies: RwLock::new(FxHashMap::with_capacity_and_hasher(
                capacity,
                Default::default(),
            )),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, TallyMap> {
        self.tallies.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, TallyMap> {
        self.tallies.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Fetch the tally for `key`, creating a zeroed one on first visit.
    pub fn get_or_create(
        &self,
        key: &InfoSetKey,
        decision_index: usize,
        player_index: usize,
        num_actions: usize,
    ) -> Arc<InformationSetTally> {
        if let Some(tally) = self.read().get(key) {
            return Arc::clone(tally);
        }
        let mut tallies = self.write();
        let tally = tallies.entry(key.clone()).or_insert_with(|| {
            log::trace!("new information set {}", key);
            Arc::new(InformationSetTally::new(decision_index, player_index, num_actions))
        });
        debug_assert_eq!(
            tally.num_actions(),
            num_actions,
            "Action count mismatch for info set {}",
            key
        );
        Arc::clone(tally)
    }

    /// Fetch an existing tally.
    pub fn get(&self, key: &InfoSetKey) -> Option<Arc<InformationSetTally>> {
        self.read().get(key).cloned()
    }

    /// Number of information sets discovered.
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Whether no information set has been visited yet.
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    /// Drop every tally.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Average strategy for `key`, if the information set has been visited.
    pub fn average_strategy(&self, key: &InfoSetKey) -> Option<Vec<f64>> {
        self.get(key).map(|t| t.average_strategy())
    }

    /// Read-only snapshot of every information set, sorted by key.
    ///
    /// This is the accessor reporting layers consume.
    pub fn snapshot(&self) -> StrategySnapshot {
        let mut strategies: Vec<InfoSetStrategy> = self
            .read()
            .iter()
            .map(|(key, tally)| InfoSetStrategy {
                key: key.clone(),
                decision_index: tally.decision_index(),
                player_index: tally.player_index(),
                average_strategy: tally.average_strategy(),
                current_strategy: tally.current_strategy(),
                total_weight: tally.strategy_total(),
            })
            .collect();
        strategies.sort_by(|a, b| a.key.cmp(&b.key));
        StrategySnapshot { strategies }
    }

    /// Calculate the Convergence Indicator against an earlier snapshot.
    ///
    /// CI = 100 × mean over visited information sets of Σ|p_new − p_old|.
    /// Information sets discovered since the snapshot are compared against
    /// uniform. Returns infinity when nothing can be compared.
    pub fn calculate_ci(&self, previous: &StrategySnapshot) -> f64 {
        let current = self.snapshot();
        let mut total_change = 0.0;
        let mut compared = 0usize;

        for entry in &current.strategies {
            let old = previous.get(&entry.key);
            let old_total = old.map(|o| o.total_weight).unwrap_or(0.0);
            if entry.total_weight == 0.0 && old_total == 0.0 {
                continue;
            }
            let uniform = 1.0 / entry.average_strategy.len() as f64;
            let change: f64 = match old {
                Some(old) => entry
                    .average_strategy
                    .iter()
                    .zip(&old.average_strategy)
                    .map(|(&new, &old)| (new - old).abs())
                    .sum(),
                None => entry
                    .average_strategy
                    .iter()
                    .map(|&p| (p - uniform).abs())
                    .sum(),
            };
            total_change += change;
            compared += 1;
        }

        if compared == 0 {
            return f64::INFINITY;
        }
        100.0 * total_change / compared as f64
    }

    /// Export storage to serializable format.
    pub fn export(&self) -> TableExport {
        let mut tallies: Vec<TallyExport> = self
            .read()
            .iter()
            .map(|(key, tally)| TallyExport {
                key: key.clone(),
                decision_index: tally.decision_index(),
                player_index: tally.player_index(),
                cumulative_regret: tally.cumulative_regret(),
                cumulative_strategy: tally.cumulative_strategy(),
            })
            .collect();
        tallies.sort_by(|a, b| a.key.cmp(&b.key));
        TableExport { tallies }
    }

    /// Replace the contents with an exported table.
    pub fn import(&self, data: TableExport) {
        let mut tallies = self.write();
        tallies.clear();
        for entry in data.tallies {
            tallies.insert(
                entry.key,
                Arc::new(InformationSetTally::from_parts(
                    entry.decision_index,
                    entry.player_index,
                    entry.cumulative_regret,
                    entry.cumulative_strategy,
                )),
            );
        }
    }
}

/// Strategy of one information set at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoSetStrategy {
    /// Information set.
    pub key: InfoSetKey,
    /// Decision the information set belongs to.
    pub decision_index: usize,
    /// Acting player.
    pub player_index: usize,
    /// Normalised cumulative strategy.
    pub average_strategy: Vec<f64>,
    /// Regret-matched strategy for the next iteration.
    pub current_strategy: Vec<f64>,
    /// Sum of cumulative strategy weight; zero means never weighted.
    pub total_weight: f64,
}

/// Snapshot of all strategies, sorted by key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StrategySnapshot {
    /// One entry per information set.
    pub strategies: Vec<InfoSetStrategy>,
}

impl StrategySnapshot {
    /// Look up one information set.
    pub fn get(&self, key: &InfoSetKey) -> Option<&InfoSetStrategy> {
        self.strategies
            .binary_search_by(|s| s.key.cmp(key))
            .ok()
            .map(|i| &self.strategies[i])
    }

    /// Entries belonging to one decision.
    pub fn for_decision(&self, decision_index: usize) -> impl Iterator<Item = &InfoSetStrategy> {
        self.strategies
            .iter()
            .filter(move |s| s.decision_index == decision_index)
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// One exported tally.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TallyExport {
    /// Information set.
    pub key: InfoSetKey,
    /// Decision index.
    pub decision_index: usize,
    /// Acting player.
    pub player_index: usize,
    /// Cumulative regrets.
    pub cumulative_regret: Vec<f64>,
    /// Cumulative strategy sums.
    pub cumulative_strategy: Vec<f64>,
}

/// Serializable export format for the table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableExport {
    /// All tallies, sorted by key.
    pub tallies: Vec<TallyExport>,
}

impl TableExport {
    /// Check every tally against the catalog it is about to be used with.
    ///
    /// A tally must name a strategic decision of the catalog, agree with the
    /// key it is stored under and carry one regret and one strategy entry per
    /// action.
    pub fn validate(&self, catalog: &DecisionCatalog) -> Result<(), SolverError> {
        for entry in &self.tallies {
            let invalid = |reason: String| SolverError::InvalidCheckpoint(format!("{}: {}", entry.key, reason));
            let decision = catalog
                .decisions()
                .get(entry.decision_index)
                .ok_or_else(|| invalid(format!("unknown decision {}", entry.decision_index)))?;
            if decision.is_chance {
                return Err(invalid(format!("decision {} is a chance decision", decision.name)));
            }
            if entry.key.decision_index != entry.decision_index || entry.key.player != entry.player_index {
                return Err(invalid("key disagrees with tally".into()));
            }
            if entry.player_index != decision.player_index {
                return Err(invalid(format!(
                    "player {} does not act at decision {}",
                    entry.player_index, decision.name
                )));
            }
            let num_actions = decision.num_actions as usize;
            if entry.cumulative_regret.len() != num_actions || entry.cumulative_strategy.len() != num_actions {
                return Err(invalid(format!(
                    "expected {} actions, found {} regrets and {} strategy sums",
                    num_actions,
                    entry.cumulative_regret.len(),
                    entry.cumulative_strategy.len()
                )));
            }
            if entry
                .cumulative_regret
                .iter()
                .chain(&entry.cumulative_strategy)
                .any(|x| !x.is_finite())
            {
                return Err(invalid("non-finite sums".into()));
            }
        }
        Ok(())
    }
}

impl Clone for RegretTable {
    fn clone(&self) -> Self {
        let table = RegretTable::new();
        table.import(self.export());
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u8) -> InfoSetKey {
        InfoSetKey::new(0, 1, vec![n])
    }

    #[test]
    fn test_lazy_creation_returns_shared_tally() {
        let table = RegretTable::new();
        assert!(table.is_empty());
        let a = table.get_or_create(&key(1), 1, 0, 2);
        let b = table.get_or_create(&key(1), 1, 0, 2);
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(table.len(), 1);
        a.add_regrets(&[1.0, 0.0]);
        assert_eq!(b.current_strategy(), vec![1.0, 0.0]);
    }

    #[test]
    fn test_snapshot_is_sorted_and_normalised() {
        let table = RegretTable::new();
        table.get_or_create(&key(2), 1, 0, 2).add_strategy(&[1.0, 3.0]);
        table.get_or_create(&key(1), 1, 0, 2);
        let snapshot = table.snapshot();
        assert_eq!(snapshot.strategies.len(), 2);
        assert_eq!(snapshot.strategies[0].key, key(1));
        assert_eq!(snapshot.get(&key(2)).unwrap().average_strategy, vec![0.25, 0.75]);
        assert_eq!(snapshot.get(&key(1)).unwrap().average_strategy, vec![0.5, 0.5]);
        assert_eq!(snapshot.for_decision(1).count(), 2);
        assert!(snapshot.to_json().unwrap().contains("average_strategy"));
    }

    #[test]
    fn test_export_import_roundtrip_preserves_sums() {
        let table = RegretTable::new();
        let tally = table.get_or_create(&key(3), 1, 0, 3);
        tally.add_regrets(&[1.0, -2.0, 0.5]);
        tally.add_strategy(&[0.1, 0.2, 0.7]);

        let json = serde_json::to_string(&table.export()).unwrap();
        let restored = RegretTable::new();
        restored.import(serde_json::from_str(&json).unwrap());

        let again = restored.get(&key(3)).unwrap();
        assert_eq!(again.cumulative_regret(), vec![1.0, -2.0, 0.5]);
        assert_eq!(again.cumulative_strategy(), vec![0.1, 0.2, 0.7]);
        assert_eq!(again.decision_index(), 1);
    }

    #[test]
    fn test_export_validates_against_catalog() {
        use crate::cfr::game::Game;
        use crate::games::signaling::SignalingGame;

        let game = SignalingGame::new();
        let table = RegretTable::new();
        table.get_or_create(&key(1), 1, 0, 2).add_regrets(&[0.5, -0.5]);
        let export = table.export();
        assert!(export.validate(game.catalog()).is_ok());

        let rejected = |edit: fn(&mut TallyExport)| {
            let mut broken = export.clone();
            edit(&mut broken.tallies[0]);
            matches!(broken.validate(game.catalog()), Err(SolverError::InvalidCheckpoint(_)))
        };
        assert!(rejected(|t| t.decision_index = 99));
        assert!(rejected(|t| {
            t.decision_index = 0;
            t.key.decision_index = 0;
        }));
        assert!(rejected(|t| t.player_index = 1));
        assert!(rejected(|t| t.cumulative_regret.push(0.0)));
        assert!(rejected(|t| t.cumulative_strategy.truncate(1)));
        assert!(rejected(|t| t.cumulative_strategy[0] = f64::NAN));
    }

    #[test]
    fn test_ci_drops_when_strategy_is_stable() {
        let table = RegretTable::new();
        let tally = table.get_or_create(&key(1), 1, 0, 2);
        tally.add_strategy(&[1.0, 0.0]);
        let snapshot = table.snapshot();
        assert_eq!(table.calculate_ci(&snapshot), 0.0);

        tally.add_strategy(&[0.0, 1.0]);
        assert!((table.calculate_ci(&snapshot) - 100.0).abs() < 1e-9);
        assert_eq!(RegretTable::new().calculate_ci(&snapshot), f64::INFINITY);
    }
}

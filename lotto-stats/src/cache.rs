use std::collections::HashMap;
use std::sync::Arc;

use chrono::NaiveDate;

use lotto_db::models::Wheel;
use lotto_db::store::DrawStore;

use crate::delay::{DelayTable, OccurrenceIndex};
use crate::frequency::{compute_frequencies, FrequencyTable};
use crate::patterns::{compute_patterns, PatternSummary};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Memoized derived tables for one store version. Seeing a store with a
/// different version drops every entry before answering.
#[derive(Debug, Default)]
pub struct StatsCache {
    version: Option<u64>,
    index: Option<Arc<OccurrenceIndex>>,
    frequencies: HashMap<usize, Arc<FrequencyTable>>,
    delays: HashMap<NaiveDate, Arc<DelayTable>>,
    patterns: HashMap<(Wheel, usize), Arc<PatternSummary>>,
    stats: CacheStats,
}

impl StatsCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn version(&self) -> Option<u64> {
        self.version
    }

    pub fn len(&self) -> usize {
        self.frequencies.len() + self.delays.len() + self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn invalidate(&mut self) {
        self.index = None;
        self.frequencies.clear();
        self.delays.clear();
        self.patterns.clear();
        self.version = None;
    }

    fn sync(&mut self, store: &DrawStore) {
        if self.version == Some(store.version()) {
            return;
        }
        if let Some(old) = self.version {
            log::debug!(
                "store v{} replaced by v{}, dropping {} cached tables",
                old,
                store.version(),
                self.len()
            );
        }
        self.invalidate();
        self.version = Some(store.version());
    }

    pub fn frequencies(&mut self, store: &DrawStore, window_size: usize) -> Arc<FrequencyTable> {
        self.sync(store);
        if let Some(hit) = self.frequencies.get(&window_size) {
            self.stats.hits += 1;
            return Arc::clone(hit);
        }
        self.stats.misses += 1;
        let table = Arc::new(compute_frequencies(store, window_size));
        self.frequencies.insert(window_size, Arc::clone(&table));
        table
    }

    pub fn delays(&mut self, store: &DrawStore, as_of: NaiveDate) -> Arc<DelayTable> {
        self.sync(store);
        if let Some(hit) = self.delays.get(&as_of) {
            self.stats.hits += 1;
            return Arc::clone(hit);
        }
        self.stats.misses += 1;
        let index = self
            .index
            .get_or_insert_with(|| Arc::new(OccurrenceIndex::build(store)));
        let table = Arc::new(index.delays(as_of));
        self.delays.insert(as_of, Arc::clone(&table));
        table
    }

    pub fn patterns(
        &mut self,
        store: &DrawStore,
        wheel: &Wheel,
        window_size: usize,
    ) -> Arc<PatternSummary> {
        self.sync(store);
        let key = (wheel.clone(), window_size);
        if let Some(hit) = self.patterns.get(&key) {
            self.stats.hits += 1;
            return Arc::clone(hit);
        }
        self.stats.misses += 1;
        let summary = Arc::new(compute_patterns(store, wheel, window_size));
        self.patterns.insert(key, Arc::clone(&summary));
        summary
    }
}

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::StoreError;
use crate::models::{DrawRecord, RawRow, Wheel, MAX_NUMBER, MIN_NUMBER};
use crate::source::RawRowSource;

static NEXT_VERSION: AtomicU64 = AtomicU64::new(1);

fn next_version() -> u64 {
    NEXT_VERSION.fetch_add(1, Ordering::Relaxed)
}

/// Chronologically ordered draw history, partitioned by wheel.
///
/// Every constructed store gets a fresh, strictly increasing `version`, so a
/// store built by a refresh never shares a version with the one it replaces.
#[derive(Debug, Clone)]
pub struct DrawStore {
    version: u64,
    records: Vec<DrawRecord>,
    by_wheel: BTreeMap<Wheel, Vec<usize>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded: usize,
    pub rejected: usize,
    pub unknown_wheels: BTreeSet<String>,
}

impl DrawStore {
    pub fn empty() -> Self {
        Self::from_records(Vec::new())
    }

    /// Sorts by date (stable, so same-day rows keep source order) and indexes
    /// the records by wheel.
    pub fn from_records(mut records: Vec<DrawRecord>) -> Self {
        records.sort_by_key(|r| r.date());
        let mut by_wheel: BTreeMap<Wheel, Vec<usize>> = BTreeMap::new();
        for (idx, record) in records.iter().enumerate() {
            by_wheel.entry(record.wheel().clone()).or_default().push(idx);
        }
        Self {
            version: next_version(),
            records,
            by_wheel,
        }
    }

    /// Builds a store from raw rows. Malformed rows are logged and skipped;
    /// loading fails only when no row at all is valid.
    pub fn load<I>(rows: I) -> Result<(Self, LoadReport), StoreError>
    where
        I: IntoIterator<Item = RawRow>,
    {
        let mut report = LoadReport::default();
        let mut records = Vec::new();

        for row in rows {
            report.total_rows += 1;
            match row.parse() {
                Ok(record) => {
                    if let Wheel::Unknown(code) = record.wheel() {
                        if report.unknown_wheels.insert(code.clone()) {
                            log::warn!("line {}: unknown wheel code '{}' kept as-is", row.line, code);
                        }
                    }
                    records.push(record);
                }
                Err(e) => {
                    log::warn!("line {}: row skipped: {}", row.line, e);
                    report.rejected += 1;
                }
            }
        }

        if records.is_empty() {
            return Err(StoreError::NoValidRows {
                total: report.total_rows,
                rejected: report.rejected,
            });
        }

        report.loaded = records.len();
        log::info!(
            "loaded {} draws ({} rows rejected)",
            report.loaded,
            report.rejected
        );
        Ok((Self::from_records(records), report))
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[DrawRecord] {
        &self.records
    }

    /// Wheels present in the store, known wheels in archive order.
    pub fn wheels(&self) -> impl Iterator<Item = &Wheel> {
        self.by_wheel.keys()
    }

    pub fn wheel_len(&self, wheel: &Wheel) -> usize {
        self.by_wheel.get(wheel).map_or(0, Vec::len)
    }

    /// Draws of one wheel, oldest first. The iterator is cheap to clone, so it
    /// can be restarted from any point.
    pub fn draws_for(&self, wheel: &Wheel) -> WheelDraws<'_> {
        let indices = self.by_wheel.get(wheel).map_or(&[][..], Vec::as_slice);
        WheelDraws {
            indices: indices.iter(),
            records: &self.records,
        }
    }

    /// The `n` most recent draws of a wheel, most recent first. Shorter
    /// histories yield fewer draws.
    pub fn latest(&self, wheel: &Wheel, n: usize) -> Vec<&DrawRecord> {
        self.draws_for(wheel).rev().take(n).collect()
    }

    /// Distinct draw dates, oldest first.
    pub fn dates(&self) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self.records.iter().map(|r| r.date()).collect();
        dates.dedup();
        dates
    }

    pub fn latest_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date())
    }

    /// Every wheel's draw on a given date.
    pub fn draws_on(&self, date: NaiveDate) -> Vec<&DrawRecord> {
        let start = self.records.partition_point(|r| r.date() < date);
        self.records[start..]
            .iter()
            .take_while(|r| r.date() == date)
            .collect()
    }

    /// Numbers missing from the most recent draw of a wheel, ascending.
    /// Empty when the wheel has no draws.
    pub fn absent_from_latest(&self, wheel: &Wheel) -> Vec<u8> {
        match self.draws_for(wheel).next_back() {
            Some(last) => (MIN_NUMBER..=MAX_NUMBER).filter(|&n| !last.contains(n)).collect(),
            None => Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct WheelDraws<'a> {
    indices: std::slice::Iter<'a, usize>,
    records: &'a [DrawRecord],
}

impl<'a> Iterator for WheelDraws<'a> {
    type Item = &'a DrawRecord;

    fn next(&mut self) -> Option<Self::Item> {
        self.indices.next().map(|&i| &self.records[i])
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.indices.size_hint()
    }
}

impl DoubleEndedIterator for WheelDraws<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.indices.next_back().map(|&i| &self.records[i])
    }
}

impl ExactSizeIterator for WheelDraws<'_> {}

/// Owner of the current store snapshot. Readers hold an `Arc` to the store
/// they started with; a refresh swaps in a fully built replacement.
#[derive(Debug)]
pub struct StoreHandle {
    current: Arc<DrawStore>,
}

impl StoreHandle {
    pub fn new(store: DrawStore) -> Self {
        Self {
            current: Arc::new(store),
        }
    }

    pub fn snapshot(&self) -> Arc<DrawStore> {
        Arc::clone(&self.current)
    }

    /// Fetches and loads a new store. On any failure the prior store stays
    /// current.
    pub fn refresh<S>(&mut self, source: &mut S) -> Result<LoadReport, StoreError>
    where
        S: RawRowSource + ?Sized,
    {
        self.refresh_with(source, |_| Ok::<(), StoreError>(()))
    }

    /// Like `refresh`, but runs `commit` on the loaded store before it
    /// becomes current. A failing `commit` leaves the prior store current.
    pub fn refresh_with<S, F, E>(&mut self, source: &mut S, commit: F) -> Result<LoadReport, E>
    where
        S: RawRowSource + ?Sized,
        F: FnOnce(&DrawStore) -> Result<(), E>,
        E: From<StoreError>,
    {
        let rows = source.fetch_raw_rows().map_err(|e| {
            log::warn!("refresh failed, keeping store v{}: {}", self.current.version(), e);
            StoreError::from(e)
        })?;
        let (store, report) = DrawStore::load(rows)?;
        if let Err(e) = commit(&store) {
            log::warn!(
                "store v{} not committed, keeping store v{}",
                store.version(),
                self.current.version()
            );
            return Err(e);
        }
        self.replace(store);
        Ok(report)
    }

    pub fn replace(&mut self, store: DrawStore) {
        log::info!(
            "store v{} replaced by v{} ({} draws)",
            self.current.version(),
            store.version(),
            store.len()
        );
        self.current = Arc::new(store);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FetchError;
    use crate::fixtures::{date, record, rome_scenario};

    fn raw(line: usize, fields: &[&str]) -> RawRow {
        RawRow::new(line, fields.iter().copied())
    }

    #[test]
    fn test_load_skips_bad_rows() {
        let rows = vec![
            raw(1, &["2024-01-02", "BA", "1", "2", "3", "4", "5"]),
            raw(2, &["2024-01-02", "RM", "1", "1", "3", "4", "5"]),
            raw(3, &["2024-01-02", "XX", "6", "7", "8", "9", "10"]),
        ];
        let (store, report) = DrawStore::load(rows).unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(report.total_rows, 3);
        assert_eq!(report.loaded, 2);
        assert_eq!(report.rejected, 1);
        assert!(report.unknown_wheels.contains("XX"));
        assert_eq!(store.wheel_len(&Wheel::Unknown("XX".into())), 1);
    }

    #[test]
    fn test_load_all_malformed_fails() {
        let rows = vec![raw(1, &["bad"]), raw(2, &["2024-01-02", "BA", "0"])];
        match DrawStore::load(rows) {
            Err(StoreError::NoValidRows { total, rejected }) => {
                assert_eq!(total, 2);
                assert_eq!(rejected, 2);
            }
            other => panic!("expected NoValidRows, got {:?}", other),
        }
    }

    #[test]
    fn test_sorted_by_date_per_wheel() {
        let store = DrawStore::from_records(vec![
            record("2024-01-09", Wheel::Roma, &[5, 6, 7, 8, 9]),
            record("2024-01-02", Wheel::Roma, &[1, 2, 3, 4, 5]),
            record("2024-01-05", Wheel::Bari, &[10, 20, 30, 40, 50]),
        ]);
        let dates: Vec<_> = store.draws_for(&Wheel::Roma).map(|d| d.date()).collect();
        assert_eq!(dates, vec![date("2024-01-02"), date("2024-01-09")]);
        assert_eq!(store.latest_date(), Some(date("2024-01-09")));
    }

    #[test]
    fn test_draws_for_is_restartable() {
        let store = rome_scenario();
        let iter = store.draws_for(&Wheel::Roma);
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first.len(), 3);
        assert_eq!(first, second);
    }

    #[test]
    fn test_latest_most_recent_first() {
        let store = rome_scenario();
        let latest = store.latest(&Wheel::Roma, 2);
        assert_eq!(latest.len(), 2);
        assert_eq!(latest[0].numbers(), &[5, 6, 7, 8, 9]);
        assert_eq!(latest[1].numbers(), &[1, 10, 20, 30, 40]);

        assert_eq!(store.latest(&Wheel::Roma, 10).len(), 3);
        assert!(store.latest(&Wheel::Milano, 10).is_empty());
    }

    #[test]
    fn test_versions_increase() {
        let a = DrawStore::empty();
        let b = DrawStore::empty();
        assert!(b.version() > a.version());
    }

    #[test]
    fn test_draws_on_date() {
        let store = DrawStore::from_records(vec![
            record("2024-01-02", Wheel::Bari, &[1, 2, 3, 4, 5]),
            record("2024-01-02", Wheel::Roma, &[6, 7, 8, 9, 10]),
            record("2024-01-04", Wheel::Bari, &[11, 12, 13, 14, 15]),
        ]);
        assert_eq!(store.draws_on(date("2024-01-02")).len(), 2);
        assert_eq!(store.draws_on(date("2024-01-04")).len(), 1);
        assert!(store.draws_on(date("2024-01-03")).is_empty());
        assert_eq!(store.dates(), vec![date("2024-01-02"), date("2024-01-04")]);
    }

    #[test]
    fn test_absent_from_latest() {
        let store = rome_scenario();
        let absent = store.absent_from_latest(&Wheel::Roma);
        assert_eq!(absent.len(), 85);
        assert!(!absent.contains(&5));
        assert!(absent.contains(&1));
        assert!(store.absent_from_latest(&Wheel::Genova).is_empty());
    }

    #[test]
    fn test_refresh_failure_keeps_prior_store() {
        let mut handle = StoreHandle::new(rome_scenario());
        let before = handle.snapshot();

        let mut failing = || -> Result<Vec<RawRow>, FetchError> {
            Err(FetchError::Unavailable("network down".into()))
        };
        assert!(matches!(handle.refresh(&mut failing), Err(StoreError::Fetch(_))));
        assert_eq!(handle.snapshot().version(), before.version());

        let mut malformed = || -> Result<Vec<RawRow>, FetchError> { Ok(vec![raw(1, &["x"])]) };
        assert!(matches!(handle.refresh(&mut malformed), Err(StoreError::NoValidRows { .. })));
        assert_eq!(handle.snapshot().version(), before.version());
    }

    #[test]
    fn test_refresh_swaps_snapshot() {
        let mut handle = StoreHandle::new(rome_scenario());
        let before = handle.snapshot();

        let mut source = || -> Result<Vec<RawRow>, FetchError> {
            Ok(vec![raw(1, &["2024-02-01", "MI", "1", "2", "3", "4", "5"])])
        };
        let report = handle.refresh(&mut source).unwrap();
        assert_eq!(report.loaded, 1);

        let after = handle.snapshot();
        assert!(after.version() > before.version());
        assert_eq!(after.wheel_len(&Wheel::Milano), 1);
        // Readers holding the old snapshot still see the old data.
        assert_eq!(before.wheel_len(&Wheel::Roma), 3);
        assert_eq!(before.wheel_len(&Wheel::Milano), 0);
    }

    #[test]
    fn test_failed_commit_keeps_prior_store() {
        let mut handle = StoreHandle::new(rome_scenario());
        let before = handle.snapshot();
        let mut source = || -> Result<Vec<RawRow>, FetchError> {
            Ok(vec![raw(1, &["2024-02-01", "MI", "1", "2", "3", "4", "5"])])
        };

        let mut committed = None;
        let result = handle.refresh_with(&mut source, |store| {
            committed = Some(store.version());
            Err(anyhow::anyhow!("disk full"))
        });
        assert!(result.is_err());
        assert!(committed.is_some_and(|v| v > before.version()));
        assert_eq!(handle.snapshot().version(), before.version());
        assert_eq!(handle.snapshot().wheel_len(&Wheel::Roma), 3);

        let report = handle
            .refresh_with(&mut source, |_| Ok::<(), anyhow::Error>(()))
            .unwrap();
        assert_eq!(report.loaded, 1);
        assert_eq!(handle.snapshot().wheel_len(&Wheel::Milano), 1);
    }
}

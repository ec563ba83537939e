use std::collections::BTreeMap;

use chrono::NaiveDate;

use lotto_db::models::{Wheel, MAX_NUMBER, MIN_NUMBER, POOL_SIZE};
use lotto_db::store::DrawStore;

/// Reported delay for a number never drawn in the retained history.
pub const NEVER_SEEN: u32 = 999;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Delay {
    Days(u32),
    NeverSeen,
}

impl Delay {
    /// Day count, with the `NEVER_SEEN` sentinel for unseen numbers.
    pub fn as_days(self) -> u32 {
        match self {
            Delay::Days(d) => d,
            Delay::NeverSeen => NEVER_SEEN,
        }
    }
}

impl std::fmt::Display for Delay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Delay::Days(d) => write!(f, "{d}"),
            Delay::NeverSeen => write!(f, "{NEVER_SEEN} (never)"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberDelay {
    pub number: u8,
    pub delay: Delay,
}

/// For every wheel and number, the chronological dates the number was drawn.
/// Built once per store; answers "most recent occurrence on or before a
/// date" with a binary search.
#[derive(Debug, Clone)]
pub struct OccurrenceIndex {
    version: u64,
    by_wheel: BTreeMap<Wheel, Vec<Vec<NaiveDate>>>,
}

impl OccurrenceIndex {
    pub fn build(store: &DrawStore) -> Self {
        let mut by_wheel = BTreeMap::new();
        for wheel in store.wheels() {
            let mut dates: Vec<Vec<NaiveDate>> = vec![Vec::new(); POOL_SIZE];
            for draw in store.draws_for(wheel) {
                for &n in draw.numbers() {
                    dates[(n - 1) as usize].push(draw.date());
                }
            }
            by_wheel.insert(wheel.clone(), dates);
        }
        Self {
            version: store.version(),
            by_wheel,
        }
    }

    /// Version of the store the index was built from.
    pub fn version(&self) -> u64 {
        self.version
    }

    pub fn last_seen(&self, wheel: &Wheel, number: u8, as_of: NaiveDate) -> Option<NaiveDate> {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
            return None;
        }
        let dates = &self.by_wheel.get(wheel)?[(number - 1) as usize];
        let upto = dates.partition_point(|d| *d <= as_of);
        upto.checked_sub(1).map(|i| dates[i])
    }

    pub fn delay(&self, wheel: &Wheel, number: u8, as_of: NaiveDate) -> Delay {
        match self.last_seen(wheel, number, as_of) {
            Some(seen) => {
                let days = (as_of - seen).num_days();
                Delay::Days(u32::try_from(days).unwrap_or(u32::MAX))
            }
            None => Delay::NeverSeen,
        }
    }

    pub fn delays(&self, as_of: NaiveDate) -> DelayTable {
        let delays = self
            .by_wheel
            .keys()
            .map(|wheel| {
                let row = (MIN_NUMBER..=MAX_NUMBER)
                    .map(|n| self.delay(wheel, n, as_of))
                    .collect();
                (wheel.clone(), row)
            })
            .collect();
        DelayTable { as_of, delays }
    }
}

/// Delay of every number 1-90 per wheel, relative to `as_of`. Draws dated
/// after `as_of` are not part of the retained history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayTable {
    as_of: NaiveDate,
    delays: BTreeMap<Wheel, Vec<Delay>>,
}

impl DelayTable {
    pub fn as_of(&self) -> NaiveDate {
        self.as_of
    }

    /// `NeverSeen` for numbers outside 1-90 and for wheels without draws.
    pub fn get(&self, wheel: &Wheel, number: u8) -> Delay {
        if !(MIN_NUMBER..=MAX_NUMBER).contains(&number) {
            return Delay::NeverSeen;
        }
        self.delays
            .get(wheel)
            .map_or(Delay::NeverSeen, |row| row[(number - 1) as usize])
    }

    pub fn wheels(&self) -> impl Iterator<Item = &Wheel> {
        self.delays.keys()
    }

    /// All 90 numbers of a wheel in ascending order; empty for a wheel
    /// without draws.
    pub fn for_wheel(&self, wheel: &Wheel) -> Vec<NumberDelay> {
        self.delays
            .get(wheel)
            .map(|row| {
                row.iter()
                    .enumerate()
                    .map(|(i, &delay)| NumberDelay { number: i as u8 + 1, delay })
                    .collect()
            })
            .unwrap_or_default()
    }

    /// The `k` longest-absent numbers, never-seen first, ties by ascending
    /// number.
    pub fn most_delayed(&self, wheel: &Wheel, k: usize) -> Vec<NumberDelay> {
        let mut entries = self.for_wheel(wheel);
        entries.sort_by(|a, b| b.delay.cmp(&a.delay).then(a.number.cmp(&b.number)));
        entries.truncate(k);
        entries
    }
}

pub fn compute_delays(store: &DrawStore, as_of: NaiveDate) -> DelayTable {
    OccurrenceIndex::build(store).delays(as_of)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lotto_db::fixtures::{date, make_test_store, record, rome_scenario};
    use lotto_db::models::WHEELS;

    /// Straight scan from the most recent draw backward.
    fn scan_delay(store: &DrawStore, wheel: &Wheel, number: u8, as_of: NaiveDate) -> Delay {
        store
            .draws_for(wheel)
            .rev()
            .filter(|d| d.date() <= as_of)
            .find(|d| d.contains(number))
            .map_or(Delay::NeverSeen, |d| Delay::Days((as_of - d.date()).num_days() as u32))
    }

    #[test]
    fn test_rome_scenario_delays() {
        let store = rome_scenario();
        let as_of = date("2024-01-06");
        let table = compute_delays(&store, as_of);

        // 1 last appeared in the second draw, two days before the third
        assert_eq!(table.get(&Wheel::Roma, 1), Delay::Days(2));
        assert_eq!(table.get(&Wheel::Roma, 5), Delay::Days(0));
        assert_eq!(table.get(&Wheel::Roma, 2), Delay::Days(4));
        assert_eq!(table.get(&Wheel::Roma, 90), Delay::NeverSeen);
        assert_eq!(table.get(&Wheel::Roma, 90).as_days(), NEVER_SEEN);
        assert_eq!(table.get(&Wheel::Roma, 99).as_days(), 999);
    }

    #[test]
    fn test_as_of_after_last_draw() {
        let table = compute_delays(&rome_scenario(), date("2024-02-05"));
        assert_eq!(table.get(&Wheel::Roma, 5), Delay::Days(30));
    }

    #[test]
    fn test_draws_after_as_of_are_ignored() {
        let table = compute_delays(&rome_scenario(), date("2024-01-03"));
        assert_eq!(table.get(&Wheel::Roma, 1), Delay::Days(1));
        assert_eq!(table.get(&Wheel::Roma, 6), Delay::NeverSeen);
    }

    #[test]
    fn test_missing_wheel() {
        let table = compute_delays(&rome_scenario(), date("2024-01-06"));
        assert_eq!(table.get(&Wheel::Bari, 1), Delay::NeverSeen);
        assert!(table.for_wheel(&Wheel::Bari).is_empty());
        assert_eq!(table.for_wheel(&Wheel::Roma).len(), 90);
    }

    #[test]
    fn test_partial_draws_count() {
        let store = DrawStore::from_records(vec![record("2024-01-01", Wheel::Torino, &[4, 17])]);
        let table = compute_delays(&store, date("2024-01-11"));
        assert_eq!(table.get(&Wheel::Torino, 17), Delay::Days(10));
        assert_eq!(table.get(&Wheel::Torino, 18), Delay::NeverSeen);
    }

    #[test]
    fn test_index_matches_scan() {
        let store = make_test_store(50);
        for as_of in [date("2020-01-01"), date("2020-02-15"), date("2021-01-01")] {
            let table = compute_delays(&store, as_of);
            for wheel in WHEELS.iter() {
                for n in 1..=90u8 {
                    assert_eq!(table.get(wheel, n), scan_delay(&store, wheel, n, as_of));
                }
            }
        }
    }

    #[test]
    fn test_most_delayed() {
        let table = compute_delays(&rome_scenario(), date("2024-01-06"));
        let top = table.most_delayed(&Wheel::Roma, 80);
        assert_eq!(top.len(), 80);
        assert_eq!(top[0], NumberDelay { number: 11, delay: Delay::NeverSeen });
        let seen = table.most_delayed(&Wheel::Roma, 90);
        assert_eq!(seen[77], NumberDelay { number: 2, delay: Delay::Days(4) });
    }
}

use std::collections::BTreeMap;

use lotto_db::models::{DrawRecord, Wheel};
use lotto_db::store::DrawStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberCount {
    pub number: u8,
    pub frequency: u32,
}

/// Per-wheel occurrence counts over the trailing `window` draws. Numbers not
/// drawn in the window have no entry and read as 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable {
    window: usize,
    counts: BTreeMap<Wheel, BTreeMap<u8, u32>>,
    draws_counted: BTreeMap<Wheel, usize>,
}

impl FrequencyTable {
    pub fn window(&self) -> usize {
        self.window
    }

    pub fn get(&self, wheel: &Wheel, number: u8) -> u32 {
        self.counts
            .get(wheel)
            .and_then(|c| c.get(&number))
            .copied()
            .unwrap_or(0)
    }

    pub fn counts_for(&self, wheel: &Wheel) -> Option<&BTreeMap<u8, u32>> {
        self.counts.get(wheel)
    }

    /// Draws actually taken into account for a wheel (at most `window`).
    pub fn draws_counted(&self, wheel: &Wheel) -> usize {
        self.draws_counted.get(wheel).copied().unwrap_or(0)
    }

    pub fn total(&self, wheel: &Wheel) -> u32 {
        self.counts.get(wheel).map_or(0, |c| c.values().sum())
    }

    pub fn wheels(&self) -> impl Iterator<Item = &Wheel> {
        self.counts.keys()
    }

    /// `(wheel, number, frequency)` rows, by wheel then ascending number.
    pub fn rows(&self) -> impl Iterator<Item = (&Wheel, u8, u32)> {
        self.counts
            .iter()
            .flat_map(|(wheel, counts)| counts.iter().map(move |(&n, &f)| (wheel, n, f)))
    }
}

/// Occurrences of each number across `draws`.
pub fn count_numbers<'a, I>(draws: I) -> BTreeMap<u8, u32>
where
    I: IntoIterator<Item = &'a DrawRecord>,
{
    let mut counts = BTreeMap::new();
    for draw in draws {
        for &n in draw.numbers() {
            *counts.entry(n).or_insert(0) += 1;
        }
    }
    counts
}

pub fn compute_frequencies(store: &DrawStore, window_size: usize) -> FrequencyTable {
    let mut counts = BTreeMap::new();
    let mut draws_counted = BTreeMap::new();

    for wheel in store.wheels() {
        let tail = store.latest(wheel, window_size);
        if tail.is_empty() {
            continue;
        }
        draws_counted.insert(wheel.clone(), tail.len());
        counts.insert(wheel.clone(), count_numbers(tail));
    }

    FrequencyTable {
        window: window_size,
        counts,
        draws_counted,
    }
}

fn ranked(table: &FrequencyTable, wheel: &Wheel) -> Vec<NumberCount> {
    table
        .counts_for(wheel)
        .map(|counts| {
            counts
                .iter()
                .map(|(&number, &frequency)| NumberCount { number, frequency })
                .collect()
        })
        .unwrap_or_default()
}

/// The `k` most frequent numbers, ties broken by ascending number.
pub fn top_k(table: &FrequencyTable, wheel: &Wheel, k: usize) -> Vec<NumberCount> {
    let mut entries = ranked(table, wheel);
    entries.sort_by(|a, b| b.frequency.cmp(&a.frequency).then(a.number.cmp(&b.number)));
    entries.truncate(k);
    entries
}

/// The `k` least frequent observed numbers, ties broken by ascending number.
pub fn bottom_k(table: &FrequencyTable, wheel: &Wheel, k: usize) -> Vec<NumberCount> {
    let mut entries = ranked(table, wheel);
    entries.sort_by(|a, b| a.frequency.cmp(&b.frequency).then(a.number.cmp(&b.number)));
    entries.truncate(k);
    entries
}

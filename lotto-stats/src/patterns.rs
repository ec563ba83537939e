use lotto_db::models::{Wheel, LOW_MAX, PICK_COUNT};
use lotto_db::store::DrawStore;

/// Decade buckets 1-10, 11-20, ... 81-90.
pub const DECADES: usize = 9;
pub const SPLIT_CLASSES: usize = PICK_COUNT + 1;
/// Five sorted numbers hold at most four adjacent pairs.
pub const PAIR_CLASSES: usize = PICK_COUNT;

pub fn decade_of(number: u8) -> usize {
    ((number.max(1) - 1) / 10).min(DECADES as u8 - 1) as usize
}

/// Structure of one complete draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawPattern {
    pub odd: u8,
    pub low: u8,
    pub adjacent_pairs: u8,
    pub decades: [u8; DECADES],
}

pub fn draw_pattern(numbers: &[u8; PICK_COUNT]) -> DrawPattern {
    let odd = numbers.iter().filter(|&&n| n % 2 == 1).count() as u8;
    let low = numbers.iter().filter(|&&n| n <= LOW_MAX).count() as u8;

    let mut sorted = *numbers;
    sorted.sort_unstable();
    let pairs = sorted.windows(2).filter(|w| w[1] - w[0] == 1).count() as u8;

    let mut decades = [0u8; DECADES];
    for &n in numbers {
        decades[decade_of(n)] += 1;
    }

    DrawPattern {
        odd,
        low,
        adjacent_pairs: pairs.min(PAIR_CLASSES as u8 - 1),
        decades,
    }
}

/// A split of the five numbers into two sides, e.g. 3-2 for three odd and
/// two even numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SplitClass {
    pub first: u8,
}

impl std::fmt::Display for SplitClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.first, PICK_COUNT as u8 - self.first)
    }
}

/// Argmax over `(class, count)` pairs. Ties go to the class yielded first,
/// so the caller's iteration order is the canonical tie-break. `None` when
/// every count is zero.
pub fn most_common<C, I>(classes: I) -> Option<C>
where
    I: IntoIterator<Item = (C, u32)>,
{
    let mut best: Option<(C, u32)> = None;
    for (class, count) in classes {
        if count > best.as_ref().map_or(0, |(_, c)| *c) {
            best = Some((class, count));
        }
    }
    best.map(|(class, _)| class)
}

/// Draw counts per split class, indexed by the size of the first side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SplitCounts([u32; SPLIT_CLASSES]);

impl SplitCounts {
    fn record(&mut self, first: u8) {
        self.0[first as usize] += 1;
    }

    pub fn get(&self, class: SplitClass) -> u32 {
        self.0.get(class.first as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Canonical order: 5-0, 4-1, 3-2, 2-3, 1-4, 0-5.
    pub fn classes(&self) -> impl Iterator<Item = (SplitClass, u32)> + '_ {
        (0..SPLIT_CLASSES as u8)
            .rev()
            .map(move |first| (SplitClass { first }, self.0[first as usize]))
    }

    pub fn most_common(&self) -> Option<SplitClass> {
        most_common(self.classes())
    }
}

/// Draw counts per number of adjacent pairs, 0 through 4.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PairCounts([u32; PAIR_CLASSES]);

impl PairCounts {
    pub fn get(&self, pairs: u8) -> u32 {
        self.0.get(pairs as usize).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }

    /// Canonical order: 0, 1, 2, 3, 4.
    pub fn classes(&self) -> impl Iterator<Item = (u8, u32)> + '_ {
        self.0.iter().enumerate().map(|(i, &c)| (i as u8, c))
    }

    pub fn most_common(&self) -> Option<u8> {
        most_common(self.classes())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PatternSummary {
    pub wheel: Wheel,
    pub window: usize,
    /// Complete draws aggregated.
    pub draws: usize,
    /// Draws of the window skipped for missing numbers.
    pub skipped: usize,
    pub odd_even: SplitCounts,
    pub low_high: SplitCounts,
    pub adjacent_pairs: PairCounts,
    /// Average count of numbers per draw falling in each decade.
    pub decade_share: [f64; DECADES],
}

pub fn compute_patterns(store: &DrawStore, wheel: &Wheel, window_size: usize) -> PatternSummary {
    let mut summary = PatternSummary {
        wheel: wheel.clone(),
        window: window_size,
        draws: 0,
        skipped: 0,
        odd_even: SplitCounts::default(),
        low_high: SplitCounts::default(),
        adjacent_pairs: PairCounts::default(),
        decade_share: [0.0; DECADES],
    };

    let mut decade_tally = [0u32; DECADES];
    for draw in store.latest(wheel, window_size) {
        let Some(numbers) = draw.complete_numbers() else {
            summary.skipped += 1;
            continue;
        };
        let pattern = draw_pattern(&numbers);
        summary.odd_even.record(pattern.odd);
        summary.low_high.record(pattern.low);
        summary.adjacent_pairs.0[pattern.adjacent_pairs as usize] += 1;
        for (tally, &count) in decade_tally.iter_mut().zip(pattern.decades.iter()) {
            *tally += count as u32;
        }
        summary.draws += 1;
    }

    if summary.draws > 0 {
        for (share, &tally) in summary.decade_share.iter_mut().zip(decade_tally.iter()) {
            *share = tally as f64 / summary.draws as f64;
        }
    }
    summary
}

//! Deterministic draw histories shared by the workspace's tests.

use chrono::{Duration, NaiveDate};

use crate::models::{DrawRecord, Wheel, WHEELS};
use crate::store::DrawStore;

pub fn date(iso: &str) -> NaiveDate {
    NaiveDate::parse_from_str(iso, "%Y-%m-%d").expect("fixture date must be ISO")
}

pub fn record(iso: &str, wheel: Wheel, numbers: &[u8]) -> DrawRecord {
    DrawRecord::new(date(iso), wheel, numbers.to_vec()).expect("fixture draw must be valid")
}

/// ROMA: (2024-01-02, [1,2,3,4,5]), (2024-01-04, [1,10,20,30,40]),
/// (2024-01-06, [5,6,7,8,9]).
pub fn rome_scenario() -> DrawStore {
    DrawStore::from_records(vec![
        record("2024-01-02", Wheel::Roma, &[1, 2, 3, 4, 5]),
        record("2024-01-04", Wheel::Roma, &[1, 10, 20, 30, 40]),
        record("2024-01-06", Wheel::Roma, &[5, 6, 7, 8, 9]),
    ])
}

/// `n` complete draws per known wheel, two days apart starting 2020-01-02.
/// Numbers are spread with a stride of 17, so every draw is valid.
pub fn make_test_store(n: usize) -> DrawStore {
    let start = date("2020-01-02");
    let mut records = Vec::with_capacity(n * WHEELS.len());
    for (w, wheel) in WHEELS.iter().enumerate() {
        for i in 0..n {
            let base = (i * 7 + w * 3) % 90;
            let numbers: Vec<u8> = (0..5).map(|k| ((base + k * 17) % 90 + 1) as u8).collect();
            let day = start + Duration::days(2 * i as i64);
            records.push(DrawRecord::new(day, wheel.clone(), numbers).expect("stride keeps numbers distinct"));
        }
    }
    DrawStore::from_records(records)
}

use std::path::PathBuf;

use thiserror::Error;

/// A malformed raw row. Rows failing with this error are skipped by the
/// store loader.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("expected 3 to 7 fields (date, wheel, up to 5 numbers), got {found}")]
    Arity { found: usize },

    #[error("a draw holds 1 to 5 numbers, got {found}")]
    NumberCount { found: usize },

    #[error("invalid date '{0}' (expected YYYY-MM-DD)")]
    InvalidDate(String),

    #[error("number field {position} is not numeric: '{value}'")]
    NotNumeric { position: usize, value: String },

    #[error("number {value} out of range [1, 90]")]
    OutOfRange { value: i64 },

    #[error("duplicate number {0} in draw")]
    Duplicate(u8),

    #[error("number field {position} follows a missing field")]
    Gap { position: usize },

    #[error("field {position} is not valid UTF-8")]
    Encoding { position: usize },
}

/// The external data source could not deliver a complete dataset.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("cannot open archive {path:?}")]
    Open {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed reading archive at line {line}")]
    Read {
        line: usize,
        #[source]
        source: csv::Error,
    },

    #[error("data source unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no valid draw rows ({rejected} of {total} rows rejected)")]
    NoValidRows { total: usize, rejected: usize },

    #[error("refresh failed, prior data retained")]
    Fetch(#[from] FetchError),
}

use lotto_db::models::Wheel;
use thiserror::Error;

/// A windowed operation asked for at least as many draws as the history
/// holds. Distinct from an empty result: the data may simply not exist yet.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("wheel {wheel}: {available} complete draws, need more than {window}")]
pub struct InsufficientDataError {
    pub wheel: Wheel,
    pub available: usize,
    pub window: usize,
}

#[derive(Debug, Error)]
pub enum FeatureError {
    #[error(transparent)]
    InsufficientData(#[from] InsufficientDataError),

    #[error("window size must be at least 1")]
    EmptyWindow,

    #[error("shape mismatch: {0}")]
    Shape(String),

    #[error("regressor used before fit")]
    NotFitted,

    #[error("normal equations are not positive-definite")]
    Singular,
}

use ndarray::{s, Array1, Array2, Axis};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

use lotto_db::models::{Wheel, PICK_COUNT, POOL_SIZE};
use lotto_db::store::DrawStore;
use lotto_stats::frequency::count_numbers;

use crate::error::{FeatureError, InsufficientDataError};
use crate::scaler::MinMaxScaler;

/// Width of one feature row: `window` flattened scaled draws followed by
/// the global frequency of each number of the last draw in the window.
pub fn feature_width(window: usize) -> usize {
    PICK_COUNT * window + PICK_COUNT
}

/// Supervised samples for one wheel. Row `i` of `features` describes
/// draws `i..i + window` (chronological); row `i` of `labels` is the
/// scaled draw `i + window`.
#[derive(Debug, Clone)]
pub struct FeatureSet {
    pub wheel: Wheel,
    pub window: usize,
    pub features: Array2<f64>,
    pub labels: Array2<f64>,
    pub scaler: MinMaxScaler,
    /// Relative frequency of each number over the wheel's full history,
    /// indexed by `number - 1`.
    pub number_share: Vec<f64>,
    /// Feature row built from the last `window` draws, the input for
    /// forecasting the draw after the history ends.
    pub next_input: Array1<f64>,
}

#[derive(Debug, Clone)]
pub struct TrainTestSplit {
    pub x_train: Array2<f64>,
    pub y_train: Array2<f64>,
    pub x_test: Array2<f64>,
    pub y_test: Array2<f64>,
}

impl FeatureSet {
    pub fn len(&self) -> usize {
        self.features.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn n_features(&self) -> usize {
        self.features.ncols()
    }

    /// Holds out `ceil(len * test_fraction)` samples, at least one on each
    /// side. With a seed the samples are shuffled reproducibly first;
    /// without one the test set is the most recent tail.
    pub fn split(
        &self,
        test_fraction: f64,
        seed: Option<u64>,
    ) -> Result<TrainTestSplit, FeatureError> {
        let n = self.len();
        if n < 2 {
            return Err(FeatureError::Shape(format!(
                "{} samples cannot be split into train and test",
                n
            )));
        }
        if !(0.0..1.0).contains(&test_fraction) || test_fraction == 0.0 {
            return Err(FeatureError::Shape(format!(
                "test fraction {} outside (0, 1)",
                test_fraction
            )));
        }
        let n_test = ((n as f64 * test_fraction).ceil() as usize).clamp(1, n - 1);

        let mut order: Vec<usize> = (0..n).collect();
        let (train, test) = match seed {
            Some(seed) => {
                let mut rng = StdRng::seed_from_u64(seed);
                order.shuffle(&mut rng);
                let (test, train) = order.split_at(n_test);
                (train.to_vec(), test.to_vec())
            }
            None => {
                let (train, test) = order.split_at(n - n_test);
                (train.to_vec(), test.to_vec())
            }
        };

        Ok(TrainTestSplit {
            x_train: self.features.select(Axis(0), &train),
            y_train: self.labels.select(Axis(0), &train),
            x_test: self.features.select(Axis(0), &test),
            y_test: self.labels.select(Axis(0), &test),
        })
    }

    /// Maps a normalized prediction back to numbers in [1, 90].
    pub fn predicted_numbers(&self, prediction: ndarray::ArrayView1<f64>) -> Result<Vec<u8>, FeatureError> {
        self.scaler.to_numbers(prediction)
    }
}

fn feature_row(
    scaled: &Array2<f64>,
    raw: &[[u8; PICK_COUNT]],
    share: &[f64],
    start: usize,
    window: usize,
) -> Array1<f64> {
    let mut row = Array1::zeros(feature_width(window));
    let block = scaled.slice(s![start..start + window, ..]);
    for (dst, &v) in row.iter_mut().zip(block.iter()) {
        *dst = v;
    }
    let last = &raw[start + window - 1];
    for (k, &number) in last.iter().enumerate() {
        row[PICK_COUNT * window + k] = share[number as usize - 1];
    }
    row
}

/// Builds sliding-window samples from the complete draws of `wheel`.
/// Needs strictly more complete draws than `window_size`.
pub fn build_features(
    store: &DrawStore,
    wheel: &Wheel,
    window_size: usize,
) -> Result<FeatureSet, FeatureError> {
    if window_size == 0 {
        return Err(FeatureError::EmptyWindow);
    }
    let raw: Vec<[u8; PICK_COUNT]> = store
        .draws_for(wheel)
        .filter_map(|d| d.complete_numbers())
        .collect();
    if raw.len() <= window_size {
        return Err(InsufficientDataError {
            wheel: wheel.clone(),
            available: raw.len(),
            window: window_size,
        }
        .into());
    }

    let counts = count_numbers(store.draws_for(wheel).filter(|d| d.is_complete()));
    let total: u32 = counts.values().sum();
    let share: Vec<f64> = (1..=POOL_SIZE as u8)
        .map(|n| counts.get(&n).copied().unwrap_or(0) as f64 / total as f64)
        .collect();

    let matrix = Array2::from_shape_fn((raw.len(), PICK_COUNT), |(i, j)| raw[i][j] as f64);
    let scaler = MinMaxScaler::fit(&matrix)?;
    let scaled = scaler.transform(&matrix)?;

    let n_samples = raw.len() - window_size;
    let mut features = Array2::zeros((n_samples, feature_width(window_size)));
    for (i, mut dst) in features.axis_iter_mut(Axis(0)).enumerate() {
        dst.assign(&feature_row(&scaled, &raw, &share, i, window_size));
    }
    let labels = scaled.slice(s![window_size.., ..]).to_owned();
    let next_input = feature_row(&scaled, &raw, &share, raw.len() - window_size, window_size);

    log::debug!(
        "{}: {} samples of width {} from {} complete draws",
        wheel,
        n_samples,
        feature_width(window_size),
        raw.len()
    );

    Ok(FeatureSet {
        wheel: wheel.clone(),
        window: window_size,
        features,
        labels,
        scaler,
        number_share: share,
        next_input,
    })
}

use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use lotto_db::models::{MAX_NUMBER, MIN_NUMBER};

use crate::error::FeatureError;

/// Per-column min-max scaling to [0, 1], fitted once over a whole series.
/// A constant column scales with a unit range, so it maps to 0 and back.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MinMaxScaler {
    data_min: Array1<f64>,
    data_max: Array1<f64>,
}

impl MinMaxScaler {
    pub fn fit(data: &Array2<f64>) -> Result<Self, FeatureError> {
        if data.nrows() == 0 {
            return Err(FeatureError::Shape("cannot fit a scaler on zero rows".into()));
        }
        let data_min = data.fold_axis(Axis(0), f64::INFINITY, |&acc, &x| acc.min(x));
        let data_max = data.fold_axis(Axis(0), f64::NEG_INFINITY, |&acc, &x| acc.max(x));
        Ok(Self { data_min, data_max })
    }

    pub fn n_features(&self) -> usize {
        self.data_min.len()
    }

    pub fn data_min(&self) -> &Array1<f64> {
        &self.data_min
    }

    pub fn data_max(&self) -> &Array1<f64> {
        &self.data_max
    }

    fn range(&self) -> Array1<f64> {
        (&self.data_max - &self.data_min).mapv(|r| if r == 0.0 { 1.0 } else { r })
    }

    fn check_width(&self, width: usize) -> Result<(), FeatureError> {
        if width != self.n_features() {
            return Err(FeatureError::Shape(format!(
                "scaler fitted on {} columns, got {}",
                self.n_features(),
                width
            )));
        }
        Ok(())
    }

    pub fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        self.check_width(data.ncols())?;
        Ok((data - &self.data_min) / &self.range())
    }

    pub fn inverse_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        self.check_width(data.ncols())?;
        Ok(data * &self.range() + &self.data_min)
    }

    pub fn transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, FeatureError> {
        self.check_width(row.len())?;
        Ok((&row - &self.data_min) / &self.range())
    }

    pub fn inverse_transform_row(&self, row: ArrayView1<f64>) -> Result<Array1<f64>, FeatureError> {
        self.check_width(row.len())?;
        Ok(&row * &self.range() + &self.data_min)
    }

    /// Presentation only: inverts a normalized prediction and rounds each
    /// value to the nearest number in [1, 90].
    pub fn to_numbers(&self, normalized: ArrayView1<f64>) -> Result<Vec<u8>, FeatureError> {
        let raw = self.inverse_transform_row(normalized)?;
        Ok(raw
            .iter()
            .map(|&x| x.round().clamp(MIN_NUMBER as f64, MAX_NUMBER as f64) as u8)
            .collect())
    }
}

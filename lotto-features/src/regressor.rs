use ndarray::{Array1, Array2, Axis};

use crate::error::FeatureError;
use crate::linalg::{column_means, ridge_regression, with_bias};

/// A multi-output regressor over feature rows. Implementations are trained
/// on whatever `FeatureSet::split` produces.
pub trait Regressor {
    fn name(&self) -> &str;
    fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(), FeatureError>;
    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>, FeatureError>;
}

/// Predicts the training label mean for every input.
#[derive(Debug, Clone, Default)]
pub struct MeanRegressor {
    means: Option<Array1<f64>>,
}

impl Regressor for MeanRegressor {
    fn name(&self) -> &str {
        "mean"
    }

    fn fit(&mut self, _x: &Array2<f64>, y: &Array2<f64>) -> Result<(), FeatureError> {
        self.means = Some(
            column_means(y).ok_or_else(|| FeatureError::Shape("no training labels".into()))?,
        );
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        let means = self.means.as_ref().ok_or(FeatureError::NotFitted)?;
        Ok(Array2::from_shape_fn((x.nrows(), means.len()), |(_, j)| means[j]))
    }
}

/// Linear least squares with an L2 penalty and an unpenalized intercept.
#[derive(Debug, Clone)]
pub struct RidgeRegressor {
    lambda: f64,
    weights: Option<Array2<f64>>,
}

impl RidgeRegressor {
    pub fn new(lambda: f64) -> Self {
        Self { lambda, weights: None }
    }

    /// `[d + 1, k]`, the last row being the intercept.
    pub fn weights(&self) -> Option<&Array2<f64>> {
        self.weights.as_ref()
    }
}

impl Regressor for RidgeRegressor {
    fn name(&self) -> &str {
        "ridge"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array2<f64>) -> Result<(), FeatureError> {
        self.weights = Some(ridge_regression(&with_bias(x), y, self.lambda, 1)?);
        Ok(())
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        let w = self.weights.as_ref().ok_or(FeatureError::NotFitted)?;
        if x.ncols() + 1 != w.nrows() {
            return Err(FeatureError::Shape(format!(
                "fitted on {} features, got {}",
                w.nrows() - 1,
                x.ncols()
            )));
        }
        Ok(with_bias(x).dot(w))
    }
}

fn check_same(y: &Array2<f64>, y_hat: &Array2<f64>) -> Result<(), FeatureError> {
    if y.dim() != y_hat.dim() || y.is_empty() {
        return Err(FeatureError::Shape(format!(
            "cannot compare {:?} with {:?}",
            y.dim(),
            y_hat.dim()
        )));
    }
    Ok(())
}

pub fn mse(y: &Array2<f64>, y_hat: &Array2<f64>) -> Result<f64, FeatureError> {
    check_same(y, y_hat)?;
    Ok((y - y_hat).mapv(|e| e * e).sum() / y.len() as f64)
}

pub fn mae(y: &Array2<f64>, y_hat: &Array2<f64>) -> Result<f64, FeatureError> {
    check_same(y, y_hat)?;
    Ok((y - y_hat).mapv(f64::abs).sum() / y.len() as f64)
}

/// Per-output MSE, one value per label column.
pub fn mse_per_output(y: &Array2<f64>, y_hat: &Array2<f64>) -> Result<Array1<f64>, FeatureError> {
    check_same(y, y_hat)?;
    (y - y_hat)
        .mapv(|e| e * e)
        .mean_axis(Axis(0))
        .ok_or_else(|| FeatureError::Shape("no rows".into()))
}

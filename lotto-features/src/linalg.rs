use faer::linalg::solvers::Solve;
use faer::{Mat, Side};
use ndarray::{Array2, Axis};

use crate::error::FeatureError;

fn ndarray_to_faer(arr: &Array2<f64>) -> Mat<f64> {
    Mat::from_fn(arr.nrows(), arr.ncols(), |i, j| arr[[i, j]])
}

fn faer_to_ndarray(mat: &Mat<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat[(i, j)])
}

/// Returns X such that A * X = B, for symmetric positive-definite A.
pub fn cholesky_solve(a: &Array2<f64>, b: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
    if a.nrows() != a.ncols() || a.nrows() != b.nrows() {
        return Err(FeatureError::Shape(format!(
            "cannot solve {:?} * X = {:?}",
            a.dim(),
            b.dim()
        )));
    }
    let llt = ndarray_to_faer(a)
        .llt(Side::Lower)
        .map_err(|_| FeatureError::Singular)?;
    let x = llt.solve(&ndarray_to_faer(b));
    Ok(faer_to_ndarray(&x))
}

/// Appends a constant column of ones, giving the design matrix its intercept.
pub fn with_bias(x: &Array2<f64>) -> Array2<f64> {
    let mut out = Array2::ones((x.nrows(), x.ncols() + 1));
    out.slice_mut(ndarray::s![.., ..x.ncols()]).assign(x);
    out
}

/// Ridge regression on samples in rows.
///
/// - x: [n, d] design matrix
/// - y: [n, k] targets
/// - Returns W: [d, k] minimizing |XW - Y|^2 + lambda |W|^2
///
/// The last `unpenalized` columns of `x` are left out of the penalty, which
/// keeps an intercept column free.
pub fn ridge_regression(
    x: &Array2<f64>,
    y: &Array2<f64>,
    lambda: f64,
    unpenalized: usize,
) -> Result<Array2<f64>, FeatureError> {
    if x.nrows() != y.nrows() {
        return Err(FeatureError::Shape(format!(
            "{} samples but {} targets",
            x.nrows(),
            y.nrows()
        )));
    }
    let d = x.ncols();
    // A = X^T X + lambda * I  [d×d]
    let mut a = x.t().dot(x);
    for i in 0..d.saturating_sub(unpenalized) {
        a[[i, i]] += lambda;
    }
    // B = X^T Y  [d×k]
    let b = x.t().dot(y);
    cholesky_solve(&a, &b)
}

/// Column means, used as a fallback prediction.
pub fn column_means(y: &Array2<f64>) -> Option<ndarray::Array1<f64>> {
    y.mean_axis(Axis(0))
}

//! Least squares solver and first-degree polynomial fit.
//!
//! The temperature view overlays a straight line on the `(temp, cnt)` scatter:
//!
//! ```text
//! minimize Σ (y_i - (a + b x_i))^2
//! ```
//!
//! Implementation choices:
//! - We build the `n x 2` design matrix `[1, x_i]` and solve with SVD, which
//!   handles tall systems robustly (nalgebra's `QR::solve` only accepts square
//!   systems and will panic otherwise).
//! - Inputs are consumed in row order, so the same rows always produce
//!   bit-identical coefficients.

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    // Try progressively looser tolerances if strict solve fails.
    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

/// Fitted line `y = intercept + slope * x`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points used in the fit.
    pub n: usize,
}

impl LinearFit {
    pub fn predict(&self, x: f64) -> f64 {
        self.intercept + self.slope * x
    }
}

/// Fit a first-degree polynomial to `(x, y)` pairs.
///
/// Returns `None` for fewer than two points or when the solve fails.
pub fn fit_line(points: &[(f64, f64)]) -> Option<LinearFit> {
    let n = points.len();
    if n < 2 {
        return None;
    }

    let mut design = Vec::with_capacity(n * 2);
    for &(x, _) in points {
        design.push(1.0);
        design.push(x);
    }
    let x = DMatrix::from_row_slice(n, 2, &design);
    let y = DVector::from_iterator(n, points.iter().map(|&(_, y)| y));

    let beta = solve_least_squares(&x, &y)?;
    Some(LinearFit {
        intercept: beta[0],
        slope: beta[1],
        n,
    })
}

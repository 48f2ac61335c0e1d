//! Ridge (L2-regularized) least squares with an unpenalized intercept.
//!
//! We solve:
//!
//! ```text
//! minimize Σ (y_i − b − x_iᵀβ)² + α‖β‖²
//! ```
//!
//! by centering `X` and `y`, solving the normal equations
//! `(XcᵀXc + αI)β = Xcᵀ(y − ȳ)` and recovering `b = ȳ − x̄ᵀβ`.
//!
//! Implementation choices:
//! - For α > 0 the system matrix is symmetric positive definite, so Cholesky
//!   is the primary path.
//! - If Cholesky fails (α = 0 with collinear columns, or numerical trouble) we
//!   fall back to an SVD solve with progressively looser tolerances.
//! - The parameter dimension is tiny (a handful of features), so forming the
//!   normal equations is cheap and fully deterministic.

use nalgebra::{DMatrix, DVector};

#[derive(Debug, Clone, PartialEq)]
pub struct RidgeFit {
    pub intercept: f64,
    pub coefficients: DVector<f64>,
}

impl RidgeFit {
    pub fn predict(&self, x: &[f64]) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(x)
                .map(|(b, v)| b * v)
                .sum::<f64>()
    }
}

/// Fit ridge regression of `y` on the columns of `x`.
///
/// Returns `None` on shape mismatch, empty input, or if no finite solution
/// can be found.
pub fn solve_ridge(x: &DMatrix<f64>, y: &DVector<f64>, alpha: f64) -> Option<RidgeFit> {
    let (n, p) = x.shape();
    if n == 0 || n != y.len() || !(alpha.is_finite() && alpha >= 0.0) {
        return None;
    }

    let x_mean = DVector::from_iterator(p, x.column_iter().map(|c| c.mean()));
    let y_mean = y.mean();

    let mut xc = x.clone();
    for (j, mut col) in xc.column_iter_mut().enumerate() {
        col.add_scalar_mut(-x_mean[j]);
    }
    let yc = y.add_scalar(-y_mean);

    let mut gram = xc.transpose() * &xc;
    for j in 0..p {
        gram[(j, j)] += alpha;
    }
    let rhs = xc.transpose() * yc;

    let beta = solve_symmetric(gram, &rhs)?;
    let intercept = y_mean - x_mean.dot(&beta);
    if !intercept.is_finite() {
        return None;
    }

    Some(RidgeFit {
        intercept,
        coefficients: beta,
    })
}

fn solve_symmetric(a: DMatrix<f64>, b: &DVector<f64>) -> Option<DVector<f64>> {
    if let Some(chol) = a.clone().cholesky() {
        let beta = chol.solve(b);
        if beta.iter().all(|v| v.is_finite()) {
            return Some(beta);
        }
    }

    let svd = a.svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(b, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

//! Least-squares polynomial fitting.
//!
//! The abscissa is mapped onto `[-1, 1]` before building the Vandermonde
//! matrix, and the system is solved through its singular value
//! decomposition rather than normal equations. Wavenumbers in the thousands
//! raised to the fifth power would otherwise swamp the fit in rounding error.

use nalgebra::{DMatrix, DVector};

use crate::error::{ensure_same_len, Result, SignalError};

/// Relative size below which a singular value counts as zero.
const RANK_TOLERANCE: f64 = 1e-10;

/// A fitted polynomial in a scaled variable `t = (x - center) / half_span`.
#[derive(Debug, Clone, PartialEq)]
pub struct Polynomial {
    /// Coefficients in ascending power of `t`.
    coefficients: Vec<f64>,
    center: f64,
    half_span: f64,
}

impl Polynomial {
    /// Fit a polynomial of degree `order` to `(x, y)` by least squares over
    /// every sample.
    pub fn fit(x: &[f64], y: &[f64], order: usize) -> Result<Self> {
        ensure_same_len(x, y)?;
        let n = x.len();
        let m = order + 1;
        if n < m {
            return Err(SignalError::InsufficientData(format!(
                "polynomial of order {order} needs more than {order} samples, got {n}"
            )));
        }

        let (lo, hi) = x
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });
        if !lo.is_finite() || !hi.is_finite() {
            return Err(SignalError::InsufficientData(
                "wavenumber axis has no finite range".into(),
            ));
        }
        let center = (lo + hi) / 2.0;
        let half_span = if hi > lo { (hi - lo) / 2.0 } else { 1.0 };

        let t: Vec<f64> = x.iter().map(|&v| (v - center) / half_span).collect();
        let vandermonde = DMatrix::from_fn(n, m, |i, j| t[i].powi(j as i32));
        let rhs = DVector::from_column_slice(y);

        let coefficients = solve_least_squares(vandermonde, &rhs).ok_or_else(|| {
            SignalError::InsufficientData(format!(
                "wavenumber axis has too few distinct values for order {order}"
            ))
        })?;

        Ok(Self {
            coefficients,
            center,
            half_span,
        })
    }

    /// Degree of the polynomial.
    pub fn order(&self) -> usize {
        self.coefficients.len() - 1
    }

    /// Evaluate at `x` (Horner's scheme).
    pub fn evaluate(&self, x: f64) -> f64 {
        let t = (x - self.center) / self.half_span;
        self.coefficients
            .iter()
            .rev()
            .fold(0.0, |acc, &c| acc * t + c)
    }
}

/// Least-squares solution of `a · c ≈ b` through the SVD of `a`.
///
/// Returns `None` if `a` is numerically rank deficient.
fn solve_least_squares(a: DMatrix<f64>, b: &DVector<f64>) -> Option<Vec<f64>> {
    let columns = a.ncols();
    let svd = a.svd(true, true);
    let largest = svd.singular_values.max();
    let eps = RANK_TOLERANCE * largest.max(1.0);
    if svd.rank(eps) < columns {
        return None;
    }
    let solution = svd.solve(b, eps).ok()?;
    Some(solution.iter().copied().collect())
}

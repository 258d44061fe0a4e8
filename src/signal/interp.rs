use crate::error::{Result, SignalError};

/// Piecewise-linear interpolant over strictly increasing knots.
///
/// Outside the knot span the first or last segment is extended, so values
/// are extrapolated linearly rather than clamped.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearInterpolant {
    knots: Vec<(f64, f64)>,
}

impl LinearInterpolant {
    /// Build from `(x, y)` pairs in any order. Pairs are sorted by `x`;
    /// repeated `x` values keep the first pair seen.
    pub fn new(mut points: Vec<(f64, f64)>) -> Result<Self> {
        if points.iter().any(|(x, y)| !x.is_finite() || !y.is_finite()) {
            return Err(SignalError::InsufficientData(
                "interpolation support contains non-finite values".into(),
            ));
        }
        points.sort_by(|a, b| a.0.total_cmp(&b.0));
        points.dedup_by(|later, earlier| later.0 == earlier.0);

        if points.len() < 2 {
            return Err(SignalError::InsufficientData(format!(
                "interpolation needs 2 distinct support points, got {}",
                points.len()
            )));
        }
        Ok(Self { knots: points })
    }

    /// Support points, sorted by `x`.
    pub fn knots(&self) -> &[(f64, f64)] {
        &self.knots
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let last = self.knots.len() - 1;
        // index of the segment [k, k + 1] that covers x, or the nearest one
        let k = self
            .knots
            .partition_point(|&(kx, _)| kx <= x)
            .saturating_sub(1)
            .min(last - 1);
        let (x0, y0) = self.knots[k];
        let (x1, y1) = self.knots[k + 1];
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

//! Baseline estimation and normalization.
//!
//! Both correctors return the estimated baseline together with the spectrum
//! rescaled so the baseline sits at 100 % transmission:
//! `corrected[i] = spectrum[i] / baseline[i] * 100`.

use std::collections::BTreeSet;

use crate::error::{ensure_same_len, Result, SignalError};
use crate::signal::interp::LinearInterpolant;
use crate::signal::peaks::{local_maxima, select_by_distance};
use crate::signal::polyfit::Polynomial;

/// Smallest baseline value that may be divided by.
pub const MIN_BASELINE: f64 = 1e-12;

/// Number of highest samples forced into the anchor set by the fallback.
const FALLBACK_TOP_SAMPLES: usize = 5;

/// A spectrum renormalized against an estimated baseline.
#[derive(Debug, Clone, PartialEq)]
pub struct BaselineCorrection {
    /// `spectrum / baseline * 100`, aligned with the input.
    pub corrected: Vec<f64>,
    /// Estimated absorption-free level at each sample.
    pub baseline: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Polynomial baseline
// ---------------------------------------------------------------------------

/// Fit one global polynomial of degree `order` to the whole trace and
/// normalize against it.
pub fn correct_polynomial(
    wavenumber: &[f64],
    spectrum: &[f64],
    order: usize,
) -> Result<BaselineCorrection> {
    ensure_same_len(wavenumber, spectrum)?;
    if order >= spectrum.len() {
        return Err(SignalError::InsufficientData(format!(
            "polynomial order {order} needs more than {order} samples, got {}",
            spectrum.len()
        )));
    }

    let poly = Polynomial::fit(wavenumber, spectrum, order)?;
    let baseline: Vec<f64> = wavenumber.iter().map(|&w| poly.evaluate(w)).collect();
    let corrected = normalize(spectrum, &baseline)?;

    log::debug!("polynomial baseline of order {order} over {} samples", spectrum.len());

    Ok(BaselineCorrection {
        corrected,
        baseline,
    })
}

// ---------------------------------------------------------------------------
// Offset (anchor-interpolated) baseline
// ---------------------------------------------------------------------------

/// Interpolate a piecewise-linear baseline through absorption-free anchor
/// points and normalize against it.
///
/// Anchors are local maxima of the raw spectrum at or above
/// `max(spectrum) * threshold`, at least `window_size` samples apart. See
/// [`offset_anchors`] for the fallback used when fewer than two are found.
pub fn correct_offset(
    wavenumber: &[f64],
    spectrum: &[f64],
    window_size: usize,
    threshold: f64,
) -> Result<BaselineCorrection> {
    ensure_same_len(wavenumber, spectrum)?;

    let anchors = offset_anchors(spectrum, window_size, threshold)?;
    let support = anchors
        .iter()
        .map(|&i| (wavenumber[i], spectrum[i]))
        .collect();
    let interpolant = LinearInterpolant::new(support)?;

    let baseline: Vec<f64> = wavenumber.iter().map(|&w| interpolant.evaluate(w)).collect();
    let corrected = normalize(spectrum, &baseline)?;

    Ok(BaselineCorrection {
        corrected,
        baseline,
    })
}

/// Indices of the anchor points used by [`correct_offset`], ascending.
///
/// With fewer than two detected anchors the first and last finite samples
/// and the five highest samples are added, so the interpolation spans the
/// whole usable axis.
pub fn offset_anchors(spectrum: &[f64], window_size: usize, threshold: f64) -> Result<Vec<usize>> {
    if window_size == 0 {
        return Err(SignalError::InvalidParameter(
            "anchor window must be at least 1".into(),
        ));
    }
    if !(threshold > 0.0 && threshold <= 1.0) {
        return Err(SignalError::InvalidParameter(format!(
            "anchor threshold must be in (0, 1], got {threshold}"
        )));
    }
    if spectrum.is_empty() {
        return Err(SignalError::InsufficientData("spectrum is empty".into()));
    }

    let signal: Vec<Option<f64>> = spectrum.iter().map(|&v| v.is_finite().then_some(v)).collect();
    let max = spectrum
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::NEG_INFINITY, f64::max);
    let floor = max * threshold;

    let tall: Vec<usize> = local_maxima(&signal)
        .into_iter()
        .filter(|&i| spectrum[i] >= floor)
        .collect();
    let mut anchors = select_by_distance(&signal, &tall, window_size);

    if anchors.len() < 2 {
        log::warn!(
            "only {} baseline anchor(s) above {floor:.3}; using end points and highest samples",
            anchors.len()
        );
        let mut forced: BTreeSet<usize> = anchors.into_iter().collect();
        let finite = |i: &usize| spectrum[*i].is_finite();
        forced.extend((0..spectrum.len()).find(finite));
        forced.extend((0..spectrum.len()).rev().find(finite));

        let mut by_height: Vec<usize> = (0..spectrum.len())
            .filter(|&i| spectrum[i].is_finite())
            .collect();
        by_height.sort_by(|&a, &b| spectrum[b].total_cmp(&spectrum[a]).then(a.cmp(&b)));
        forced.extend(by_height.into_iter().take(FALLBACK_TOP_SAMPLES));

        anchors = forced.into_iter().collect();
    }

    log::debug!("offset baseline: {} anchors", anchors.len());
    Ok(anchors)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// `spectrum / baseline * 100`, refusing non-finite or non-positive baselines.
pub fn normalize(spectrum: &[f64], baseline: &[f64]) -> Result<Vec<f64>> {
    ensure_same_len(baseline, spectrum)?;
    spectrum
        .iter()
        .zip(baseline)
        .enumerate()
        .map(|(index, (&s, &b))| {
            if !b.is_finite() || b <= MIN_BASELINE {
                return Err(SignalError::InvalidBaseline { index, value: b });
            }
            Ok(s / b * 100.0)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn axis(n: usize) -> Vec<f64> {
        (0..n).map(|i| 1000.0 + i as f64).collect()
    }

    #[test]
    fn flat_spectrum_polynomial() {
        let w = axis(30);
        let s = vec![100.0; 30];
        let out = correct_polynomial(&w, &s, 3).unwrap();
        for (b, c) in out.baseline.iter().zip(&out.corrected) {
            assert!((b - 100.0).abs() < 1e-9);
            assert!((c - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn polynomial_order_bounds() {
        let w = axis(4);
        let s = vec![90.0; 4];
        assert!(correct_polynomial(&w, &s, 3).is_ok());
        assert!(matches!(
            correct_polynomial(&w, &s, 4),
            Err(SignalError::InsufficientData(_))
        ));
    }

    #[test]
    fn polynomial_removes_linear_tilt() {
        let w = axis(50);
        let s: Vec<f64> = w.iter().map(|&x| 80.0 + 0.2 * (x - 1000.0)).collect();
        let out = correct_polynomial(&w, &s, 1).unwrap();
        for c in &out.corrected {
            assert!((c - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn negative_baseline_is_reported() {
        let w = axis(10);
        let s: Vec<f64> = w.iter().map(|&x| 1005.0 - x).collect();
        let err = correct_polynomial(&w, &s, 1).unwrap_err();
        assert!(matches!(err, SignalError::InvalidBaseline { index: 5, .. }));
    }

    #[test]
    fn flat_spectrum_offset_uses_fallback() {
        let w = axis(21);
        let s = vec![100.0; 21];
        assert_eq!(offset_anchors(&s, 100, 0.99).unwrap(), vec![0, 1, 2, 3, 4, 20]);
        for window in [1, 5, 100] {
            let out = correct_offset(&w, &s, window, 0.99).unwrap();
            assert!(out.baseline.iter().all(|b| (b - 100.0).abs() < 1e-12));
            assert!(out.corrected.iter().all(|c| (c - 100.0).abs() < 1e-12));
        }
    }

    #[test]
    fn fallback_skips_undefined_end_points() {
        let w = axis(30);
        let mut s = vec![100.0; 30];
        s[0] = f64::NAN;
        s[29] = f64::INFINITY;
        assert_eq!(offset_anchors(&s, 100, 0.99).unwrap(), vec![1, 2, 3, 4, 5, 28]);

        // the undefined end samples still divide by an extrapolated baseline
        let out = correct_offset(&w, &s, 100, 0.99).unwrap();
        assert!(out.baseline.iter().all(|b| (b - 100.0).abs() < 1e-12));
        assert!(out.corrected[0].is_nan());
        assert!((out.corrected[15] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn offset_anchors_on_local_maxima() {
        // two high plateaus separated by an absorption band
        let mut s = vec![90.0; 40];
        s[5] = 99.0;
        s[20] = 60.0;
        s[34] = 98.5;
        let anchors = offset_anchors(&s, 10, 0.99).unwrap();
        assert_eq!(anchors, vec![5, 34]);

        let w = axis(40);
        let out = correct_offset(&w, &s, 10, 0.99).unwrap();
        assert!((out.baseline[5] - 99.0).abs() < 1e-12);
        assert!((out.baseline[34] - 98.5).abs() < 1e-12);
        // extrapolated beyond the last anchor, not clamped
        assert!(out.baseline[39] < 98.5);
        assert!((out.corrected[5] - 100.0).abs() < 1e-12);
    }

    #[test]
    fn offset_sorts_anchors_by_wavenumber() {
        // descending axis, as most instruments export
        let w: Vec<f64> = (0..30).map(|i| 4000.0 - 2.0 * f64::from(i)).collect();
        let s: Vec<f64> = w.iter().map(|&x| 50.0 + 0.01 * (x - 3940.0)).collect();
        let out = correct_offset(&w, &s, 3, 0.9).unwrap();
        for (b, v) in out.baseline.iter().zip(&s) {
            assert!((b - v).abs() < 1e-9);
        }
    }

    #[test]
    fn offset_parameter_checks() {
        let s = vec![1.0; 5];
        assert!(matches!(
            offset_anchors(&s, 0, 0.5),
            Err(SignalError::InvalidParameter(_))
        ));
        assert!(offset_anchors(&s, 3, 0.0).is_err());
        assert!(offset_anchors(&s, 3, 1.5).is_err());
        assert!(offset_anchors(&s, 3, f64::NAN).is_err());
        assert!(offset_anchors(&[], 3, 0.5).is_err());
    }

    #[test]
    fn single_sample_offset_is_insufficient() {
        assert!(matches!(
            correct_offset(&[1000.0], &[100.0], 3, 0.9),
            Err(SignalError::InsufficientData(_))
        ));
    }

    #[test]
    fn normalize_rejects_non_finite() {
        assert!(matches!(
            normalize(&[1.0, 1.0], &[1.0, f64::NAN]),
            Err(SignalError::InvalidBaseline { index: 1, .. })
        ));
        assert_eq!(normalize(&[50.0], &[200.0]).unwrap(), vec![25.0]);
    }
}

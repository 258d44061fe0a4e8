//! Local-extremum search with prominence and distance filtering.
//!
//! Absorption bands are dips in transmission, so [`detect_peaks`] negates the
//! smoothed trace and looks for local maxima of the result.
//!
//! # Algorithm
//!
//! 1. Local maxima: a sample (or flat run of samples) strictly higher than
//!    both neighbours. A flat run reports its middle sample, the leftmost of
//!    the two middle samples when the run has even width.
//! 2. Distance: maxima are visited from highest to lowest (ties by smaller
//!    index); every lower maximum closer than `min_distance` samples to a
//!    kept one is dropped.
//! 3. Prominence: walk outward on each side until the trace rises above the
//!    peak or ends; the lowest sample on each walk is a saddle. Prominence is
//!    the height above the higher of the two saddles.
//!
//! Undefined samples (`None`) are never peaks and act as the end of the
//! trace for the prominence walks.

use crate::error::{Result, SignalError};

/// A detected extremum before it is resolved against the raw spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakCandidate {
    /// Index into the smoothed trace.
    pub index: usize,
    /// Prominence in the units of the searched signal.
    pub prominence: f64,
}

/// Find absorption dips in a smoothed transmission trace.
///
/// Returns candidates sorted by ascending index.
pub fn detect_peaks(
    smoothed: &[Option<f64>],
    min_distance: usize,
    min_prominence: f64,
) -> Result<Vec<PeakCandidate>> {
    if !min_prominence.is_finite() || min_prominence < 0.0 {
        return Err(SignalError::InvalidParameter(format!(
            "minimum prominence must be a non-negative number, got {min_prominence}"
        )));
    }

    let inverted: Vec<Option<f64>> = smoothed.iter().map(|v| v.map(|x| -x)).collect();

    let maxima = local_maxima(&inverted);
    let spaced = select_by_distance(&inverted, &maxima, min_distance);
    let n_spaced = spaced.len();

    let candidates: Vec<PeakCandidate> = spaced
        .into_iter()
        .filter_map(|index| {
            prominence(&inverted, index).map(|prominence| PeakCandidate { index, prominence })
        })
        .filter(|c| c.prominence >= min_prominence)
        .collect();

    log::debug!(
        "peak search: {} maxima, {} after distance {min_distance}, {} with prominence >= {min_prominence}",
        maxima.len(),
        n_spaced,
        candidates.len()
    );

    Ok(candidates)
}

// ---------------------------------------------------------------------------
// Building blocks (shared with the offset baseline anchor search)
// ---------------------------------------------------------------------------

/// Indices of local maxima, ascending.
pub(crate) fn local_maxima(signal: &[Option<f64>]) -> Vec<usize> {
    let n = signal.len();
    let mut maxima = Vec::new();
    if n < 3 {
        return maxima;
    }

    let last = n - 1;
    let mut i = 1;
    while i < last {
        let (Some(prev), Some(cur)) = (signal[i - 1], signal[i]) else {
            i += 1;
            continue;
        };
        if prev < cur {
            // walk over a possible plateau
            let mut ahead = i + 1;
            while ahead < last && signal[ahead] == Some(cur) {
                ahead += 1;
            }
            if matches!(signal[ahead], Some(next) if next < cur) {
                maxima.push((i + ahead - 1) / 2);
                i = ahead;
            }
        }
        i += 1;
    }
    maxima
}

/// Prominence of the maximum at `peak`, or `None` if that sample is
/// undefined or out of range.
pub(crate) fn prominence(signal: &[Option<f64>], peak: usize) -> Option<f64> {
    let height = (*signal.get(peak)?)?;

    let mut left_min = height;
    for v in signal[..peak].iter().rev() {
        match v {
            Some(v) if *v <= height => left_min = left_min.min(*v),
            _ => break,
        }
    }

    let mut right_min = height;
    for v in &signal[peak + 1..] {
        match v {
            Some(v) if *v <= height => right_min = right_min.min(*v),
            _ => break,
        }
    }

    Some(height - left_min.max(right_min))
}

/// Thin `peaks` (ascending indices) so that no two survivors are closer
/// than `distance` samples. Higher maxima win; equal heights keep the
/// smaller index.
pub(crate) fn select_by_distance(signal: &[Option<f64>], peaks: &[usize], distance: usize) -> Vec<usize> {
    if distance <= 1 || peaks.len() < 2 {
        return peaks.to_vec();
    }

    let height = |i: usize| signal[peaks[i]].unwrap_or(f64::NEG_INFINITY);
    let mut order: Vec<usize> = (0..peaks.len()).collect();
    order.sort_by(|&a, &b| height(b).total_cmp(&height(a)).then(peaks[a].cmp(&peaks[b])));

    let mut keep = vec![true; peaks.len()];
    for &i in &order {
        if !keep[i] {
            continue;
        }
        for j in (0..i).rev() {
            if peaks[i] - peaks[j] >= distance {
                break;
            }
            keep[j] = false;
        }
        for j in i + 1..peaks.len() {
            if peaks[j] - peaks[i] >= distance {
                break;
            }
            keep[j] = false;
        }
    }

    peaks
        .iter()
        .zip(keep)
        .filter_map(|(&p, k)| k.then_some(p))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn defined(data: &[f64]) -> Vec<Option<f64>> {
        data.iter().copied().map(Some).collect()
    }

    #[test]
    fn single_dip() {
        let trace = defined(&[100.0, 90.0, 60.0, 90.0, 100.0]);
        let peaks = detect_peaks(&trace, 1, 0.0).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 2);
        assert!((peaks[0].prominence - 40.0).abs() < 1e-12);
    }

    #[test]
    fn plateau_reports_middle() {
        let odd = defined(&[0.0, 1.0, 3.0, 3.0, 3.0, 1.0, 0.0]);
        assert_eq!(local_maxima(&odd), vec![3]);

        let even = defined(&[0.0, 3.0, 3.0, 3.0, 3.0, 0.0]);
        assert_eq!(local_maxima(&even), vec![2]);
    }

    #[test]
    fn plateau_running_into_the_end_is_not_a_peak() {
        let trace = defined(&[0.0, 1.0, 2.0, 2.0, 2.0]);
        assert!(local_maxima(&trace).is_empty());
    }

    #[test]
    fn monotonic_has_no_maxima() {
        let trace = defined(&[1.0, 2.0, 3.0, 4.0]);
        assert!(local_maxima(&trace).is_empty());
        assert!(local_maxima(&defined(&[1.0, 2.0])).is_empty());
        assert!(local_maxima(&[]).is_empty());
    }

    #[test]
    fn prominence_uses_higher_saddle() {
        // peak at 3 is bounded by the deep valley on the right and a
        // shallow saddle on the left before the taller peak at 1
        let trace = defined(&[0.0, 5.0, 3.5, 4.5, 0.0]);
        assert!((prominence(&trace, 1).unwrap() - 5.0).abs() < 1e-12);
        assert!((prominence(&trace, 3).unwrap() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn prominence_of_undefined_or_missing_sample() {
        let trace = vec![Some(1.0), None, Some(1.0)];
        assert_eq!(prominence(&trace, 1), None);
        assert_eq!(prominence(&trace, 3), None);
        assert_eq!(prominence(&trace, 0), Some(0.0));
    }

    #[test]
    fn undefined_samples_are_never_peaks() {
        let trace = vec![None, Some(1.0), None, Some(0.0), Some(2.0), Some(0.0), None];
        assert_eq!(local_maxima(&trace), vec![4]);
    }

    #[test]
    fn undefined_edges_do_not_poison_prominence() {
        let trace = vec![None, Some(0.5), Some(2.0), Some(1.0), Some(0.0), None];
        let p = prominence(&trace, 2).unwrap();
        assert!(p.is_finite());
        // left walk stops at the undefined margin after seeing 0.5
        assert!((p - 1.5).abs() < 1e-12);
    }

    #[test]
    fn distance_keeps_higher_peak() {
        let trace = defined(&[0.0, 3.0, 1.0, 2.0, 0.0]);
        assert_eq!(select_by_distance(&trace, &[1, 3], 3), vec![1]);
        assert_eq!(select_by_distance(&trace, &[1, 3], 2), vec![1, 3]);
    }

    #[test]
    fn distance_tie_keeps_smaller_index() {
        let trace = defined(&[0.0, 2.0, 0.0, 2.0, 0.0]);
        assert_eq!(select_by_distance(&trace, &[1, 3], 5), vec![1]);
    }

    #[test]
    fn prominence_filter() {
        // dips at 1 and 3, the second is shallow
        let trace = defined(&[10.0, 2.0, 8.0, 7.0, 10.0]);
        let peaks = detect_peaks(&trace, 1, 2.0).unwrap();
        assert_eq!(peaks.len(), 1);
        assert_eq!(peaks[0].index, 1);
    }

    #[test]
    fn rejects_negative_prominence() {
        assert!(matches!(
            detect_peaks(&defined(&[1.0, 0.0, 1.0]), 1, -1.0),
            Err(SignalError::InvalidParameter(_))
        ));
        assert!(detect_peaks(&defined(&[1.0, 0.0, 1.0]), 1, f64::NAN).is_err());
    }

    #[test]
    fn deterministic() {
        let trace: Vec<Option<f64>> = (0..200)
            .map(|i| Some((f64::from(i) * 0.3).sin() * 10.0 + f64::from(i % 7)))
            .collect();
        let a = detect_peaks(&trace, 5, 0.5).unwrap();
        let b = detect_peaks(&trace, 5, 0.5).unwrap();
        assert_eq!(a, b);
        assert!(a.windows(2).all(|w| w[0].index < w[1].index));
        assert!(a.windows(2).all(|w| w[1].index - w[0].index >= 5));
    }
}

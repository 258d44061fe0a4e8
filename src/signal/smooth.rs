use crate::error::{Result, SignalError};

/// A smoothed trace: one slot per input sample, `None` where no full
/// window was available (or the window touched a non-finite sample).
pub type SmoothedTrace = Vec<Option<f64>>;

/// Centered moving average of `transmission` over `window_size` samples.
///
/// The output keeps the input length and alignment. The first `w / 2` and the
/// last `(w - 1) / 2` samples have no full window and are `None`; for odd
/// windows both margins are `w / 2`. An even window therefore sits half a
/// sample to the left of center.
///
/// Each window is summed left to right so results are bit-for-bit
/// reproducible.
pub fn smooth(transmission: &[f64], window_size: usize) -> Result<SmoothedTrace> {
    if window_size == 0 {
        return Err(SignalError::InvalidParameter(
            "smoothing window must be at least 1".into(),
        ));
    }
    if transmission.len() < window_size {
        return Err(SignalError::ShapeMismatch(format!(
            "trace has {} samples, smoothing window needs {window_size}",
            transmission.len()
        )));
    }

    let left = window_size / 2;
    let right = (window_size - 1) / 2;
    let n = transmission.len();

    let smoothed = (0..n)
        .map(|i| {
            if i < left || i + right >= n {
                return None;
            }
            let window = &transmission[i - left..=i + right];
            if window.iter().any(|v| !v.is_finite()) {
                return None;
            }
            let sum = window.iter().fold(0.0, |acc, &v| acc + v);
            Some(sum / window_size as f64)
        })
        .collect();

    Ok(smoothed)
}

use thiserror::Error;

// ---------------------------------------------------------------------------
// SignalError – failures of the numerical pipeline
// ---------------------------------------------------------------------------

/// Errors reported by the smoothing, peak picking and baseline stages.
///
/// All variants are recoverable: the caller is expected to surface the
/// message and let the user adjust parameters or input.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SignalError {
    /// Wavenumber / transmission lengths differ, or the trace is shorter
    /// than a window or degree requires.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Out-of-range scalar parameter (zero window, non-positive prominence, …).
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Not enough usable samples for a fit or an interpolation.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// A baseline value that cannot be divided by.
    #[error("invalid baseline at index {index}: {value}")]
    InvalidBaseline { index: usize, value: f64 },
}

/// Result alias used throughout the signal pipeline.
pub type Result<T> = std::result::Result<T, SignalError>;

/// Check that two index-aligned arrays have the same length.
pub(crate) fn ensure_same_len(wavenumber: &[f64], values: &[f64]) -> Result<()> {
    if wavenumber.len() != values.len() {
        return Err(SignalError::ShapeMismatch(format!(
            "wavenumber has {} samples but transmission has {}",
            wavenumber.len(),
            values.len()
        )));
    }
    Ok(())
}

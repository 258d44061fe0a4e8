//! End-to-end analysis of one spectrum or a whole dataset.

use rayon::prelude::*;

use crate::config::{AnalysisConfig, BaselineConfig, BaselineMethod, PeakConfig};
use crate::data::model::{SpectralDataset, Spectrum};
use crate::error::{ensure_same_len, Result};
use crate::signal::{
    correct_offset, correct_polynomial, detect_peaks, select_top_n, smooth, BaselineCorrection,
    PeakSelection,
};

// ---------------------------------------------------------------------------
// Single-stage entry points
// ---------------------------------------------------------------------------

/// Smooth, detect and rank absorption peaks.
///
/// Peak positions come from the smoothed trace; reported wavenumbers and
/// transmissions are read from the arrays passed in.
pub fn identify_peaks(
    wavenumber: &[f64],
    transmission: &[f64],
    config: &PeakConfig,
) -> Result<PeakSelection> {
    config.validate()?;
    ensure_same_len(wavenumber, transmission)?;

    let smoothed = smooth(transmission, config.window_size)?;
    let candidates = detect_peaks(&smoothed, config.min_distance, config.prominence)?;
    select_top_n(&candidates, wavenumber, transmission, config.num_peaks)
}

/// Run the configured baseline corrector, if any.
pub fn correct_baseline(
    wavenumber: &[f64],
    transmission: &[f64],
    config: &BaselineConfig,
) -> Result<Option<BaselineCorrection>> {
    config.validate()?;
    let correction = match config.method {
        BaselineMethod::None => return Ok(None),
        BaselineMethod::Polynomial => {
            correct_polynomial(wavenumber, transmission, config.polynomial.order)?
        }
        BaselineMethod::Offset => correct_offset(
            wavenumber,
            transmission,
            config.offset.window_size,
            config.offset.threshold,
        )?,
    };
    Ok(Some(correction))
}

// ---------------------------------------------------------------------------
// Per-spectrum report
// ---------------------------------------------------------------------------

/// Everything computed for one spectrum.
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumReport {
    pub name: String,
    /// Present when a baseline method was configured. Peaks were then
    /// picked on `correction.corrected`.
    pub correction: Option<BaselineCorrection>,
    pub peaks: PeakSelection,
}

/// Baseline-correct (if configured) and pick peaks on one spectrum.
pub fn analyze_spectrum(spectrum: &Spectrum, config: &AnalysisConfig) -> Result<SpectrumReport> {
    let correction = correct_baseline(&spectrum.wavenumber, &spectrum.transmission, &config.baseline)?;
    let trace = correction
        .as_ref()
        .map_or(spectrum.transmission.as_slice(), |c| c.corrected.as_slice());

    let peaks = identify_peaks(&spectrum.wavenumber, trace, &config.peaks)?;
    log::info!("{}: {} peaks", spectrum.name, peaks.len());

    Ok(SpectrumReport {
        name: spectrum.name.clone(),
        correction,
        peaks,
    })
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

/// Outcome for one spectrum of a batch.
#[derive(Debug)]
pub struct BatchEntry {
    /// Position of the spectrum in the dataset.
    pub index: usize,
    pub name: String,
    pub result: Result<SpectrumReport>,
}

/// Analyze every spectrum independently, in parallel.
///
/// Entries come back in dataset order. A failing spectrum is recorded in
/// its entry and does not stop the others.
pub fn analyze_dataset(dataset: &SpectralDataset, config: &AnalysisConfig) -> Vec<BatchEntry> {
    let entries: Vec<BatchEntry> = dataset
        .spectra
        .par_iter()
        .enumerate()
        .map(|(index, spectrum)| BatchEntry {
            index,
            name: spectrum.name.clone(),
            result: analyze_spectrum(spectrum, config),
        })
        .collect();

    for entry in &entries {
        if let Err(e) = &entry.result {
            log::warn!("{}: analysis failed: {e}", entry.name);
        }
    }
    entries
}

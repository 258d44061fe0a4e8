use crate::error::{ensure_same_len, Result, SignalError};
use crate::signal::peaks::PeakCandidate;

// ---------------------------------------------------------------------------
// Peak – a selected band resolved against the raw spectrum
// ---------------------------------------------------------------------------

/// A selected absorption band.
///
/// `index` comes from the smoothed trace; `wavenumber` and `transmission`
/// are read from the raw arrays at that index so markers sit on the
/// measured curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Peak {
    pub index: usize,
    pub wavenumber: f64,
    pub transmission: f64,
    pub prominence: f64,
}

/// Output of [`select_top_n`], ordered by ascending index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PeakSelection {
    /// Wavenumbers of the selected peaks.
    pub positions: Vec<f64>,
    /// Raw transmission at each selected peak.
    pub values: Vec<f64>,
    /// Indices of the selected peaks.
    pub indices: Vec<usize>,
    /// Prominence of each selected peak (smoothed-trace units).
    pub prominences: Vec<f64>,
}

impl PeakSelection {
    /// Number of selected peaks.
    pub fn len(&self) -> usize {
        self.indices.len()
    }

    /// Whether no peak was selected.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate the selection as [`Peak`] records, in position order.
    pub fn peaks(&self) -> impl Iterator<Item = Peak> + '_ {
        (0..self.len()).map(move |i| Peak {
            index: self.indices[i],
            wavenumber: self.positions[i],
            transmission: self.values[i],
            prominence: self.prominences[i],
        })
    }
}

impl FromIterator<Peak> for PeakSelection {
    fn from_iter<I: IntoIterator<Item = Peak>>(iter: I) -> Self {
        let mut selection = PeakSelection::default();
        for peak in iter {
            selection.indices.push(peak.index);
            selection.positions.push(peak.wavenumber);
            selection.values.push(peak.transmission);
            selection.prominences.push(peak.prominence);
        }
        selection
    }
}

// ---------------------------------------------------------------------------
// Top-N selection
// ---------------------------------------------------------------------------

/// Keep the `n` most prominent candidates and return them in position order.
///
/// Ties in prominence go to the smaller index. `n == 0` or an empty
/// candidate list yields an empty selection.
pub fn select_top_n(
    candidates: &[PeakCandidate],
    raw_wavenumber: &[f64],
    raw_transmission: &[f64],
    n: usize,
) -> Result<PeakSelection> {
    ensure_same_len(raw_wavenumber, raw_transmission)?;
    if let Some(c) = candidates.iter().find(|c| c.index >= raw_wavenumber.len()) {
        return Err(SignalError::ShapeMismatch(format!(
            "peak index {} outside a spectrum of {} samples",
            c.index,
            raw_wavenumber.len()
        )));
    }

    let mut ranked: Vec<&PeakCandidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        b.prominence
            .total_cmp(&a.prominence)
            .then(a.index.cmp(&b.index))
    });
    ranked.truncate(n);

    // selection is by prominence, presentation is by position
    ranked.sort_by_key(|c| c.index);

    let selection: PeakSelection = ranked
        .into_iter()
        .map(|c| Peak {
            index: c.index,
            wavenumber: raw_wavenumber[c.index],
            transmission: raw_transmission[c.index],
            prominence: c.prominence,
        })
        .collect();

    log::debug!(
        "selected {} of {} candidates (n = {n})",
        selection.len(),
        candidates.len()
    );

    Ok(selection)
}

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::error::{ensure_same_len, Result};

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value attached to a spectrum by the loader.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    Null,
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Spectrum – one measured transmission trace
// ---------------------------------------------------------------------------

/// A transmission spectrum as acquired.
///
/// The two axes are index-aligned and kept in acquisition order (usually
/// descending wavenumber); the pipeline never re-sorts them.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Display name (file stem or sample column).
    pub name: String,
    /// Wavenumber axis in cm⁻¹.
    pub wavenumber: Vec<f64>,
    /// Transmission in %, same length as `wavenumber`.
    pub transmission: Vec<f64>,
    /// Extra columns carried over from the source file.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Spectrum {
    /// Build a spectrum, checking that both axes have the same length.
    pub fn new(name: impl Into<String>, wavenumber: Vec<f64>, transmission: Vec<f64>) -> Result<Self> {
        ensure_same_len(&wavenumber, &transmission)?;
        Ok(Self {
            name: name.into(),
            wavenumber,
            transmission,
            metadata: BTreeMap::new(),
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.wavenumber.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavenumber.is_empty()
    }
}

// ---------------------------------------------------------------------------
// SpectralDataset – everything loaded from one file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct SpectralDataset {
    /// All spectra, in file order.
    pub spectra: Vec<Spectrum>,
    /// Sorted metadata column names seen across all spectra.
    pub column_names: Vec<String>,
}

impl SpectralDataset {
    /// Collect the metadata column names from the loaded spectra.
    pub fn from_spectra(spectra: Vec<Spectrum>) -> Self {
        let column_names: BTreeSet<String> = spectra
            .iter()
            .flat_map(|sp| sp.metadata.keys().cloned())
            .collect();
        SpectralDataset {
            spectra,
            column_names: column_names.into_iter().collect(),
        }
    }

    /// Number of spectra.
    pub fn len(&self) -> usize {
        self.spectra.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.spectra.is_empty()
    }

    /// Append the spectra of another dataset.
    pub fn extend(&mut self, other: SpectralDataset) {
        self.spectra.extend(other.spectra);
        let names: BTreeSet<String> = self
            .column_names
            .drain(..)
            .chain(other.column_names)
            .collect();
        self.column_names = names.into_iter().collect();
    }
}

//! Analysis parameters, optionally read from a TOML file.
//!
//! ```toml
//! # rusty-peaks.toml
//! [peaks]
//! num_peaks = 15
//! window_size = 7
//! prominence = 0.3
//! min_distance = 20
//!
//! [baseline]
//! method = "offset"
//!
//! [baseline.offset]
//! window_size = 100
//! threshold = 0.99
//! ```
//!
//! Every field is optional; missing ones take the defaults below.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::{self, SignalError};

/// Root configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    pub peaks: PeakConfig,
    pub baseline: BaselineConfig,
}

/// Parameters of the smoothing → detection → ranking pipeline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PeakConfig {
    /// How many of the most prominent peaks to keep.
    pub num_peaks: usize,
    /// Moving-average window (odd values keep the window centered).
    pub window_size: usize,
    /// Minimum prominence in transmission units.
    pub prominence: f64,
    /// Minimum separation between reported peaks, in samples.
    pub min_distance: usize,
}

impl Default for PeakConfig {
    fn default() -> Self {
        Self {
            num_peaks: 15,
            window_size: 7,
            prominence: 0.3,
            min_distance: 20,
        }
    }
}

impl PeakConfig {
    pub fn validate(&self) -> error::Result<()> {
        if self.window_size == 0 {
            return Err(SignalError::InvalidParameter(
                "smoothing window must be at least 1".into(),
            ));
        }
        if !(self.prominence.is_finite() && self.prominence > 0.0) {
            return Err(SignalError::InvalidParameter(format!(
                "prominence must be positive, got {}",
                self.prominence
            )));
        }
        Ok(())
    }
}

/// Which baseline corrector to run before peak picking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BaselineMethod {
    #[default]
    None,
    Polynomial,
    Offset,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaselineConfig {
    pub method: BaselineMethod,
    pub polynomial: PolynomialConfig,
    pub offset: OffsetConfig,
}

impl BaselineConfig {
    pub fn validate(&self) -> error::Result<()> {
        match self.method {
            BaselineMethod::None | BaselineMethod::Polynomial => Ok(()),
            BaselineMethod::Offset => self.offset.validate(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolynomialConfig {
    /// Degree of the fitted polynomial.
    pub order: usize,
}

impl Default for PolynomialConfig {
    fn default() -> Self {
        Self { order: 5 }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OffsetConfig {
    /// Minimum separation between anchors, in samples.
    pub window_size: usize,
    /// Anchors must reach this fraction of the spectrum maximum.
    pub threshold: f64,
}

impl Default for OffsetConfig {
    fn default() -> Self {
        Self {
            window_size: 100,
            threshold: 0.99,
        }
    }
}

impl OffsetConfig {
    pub fn validate(&self) -> error::Result<()> {
        if self.window_size == 0 {
            return Err(SignalError::InvalidParameter(
                "anchor window must be at least 1".into(),
            ));
        }
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(SignalError::InvalidParameter(format!(
                "anchor threshold must be in (0, 1], got {}",
                self.threshold
            )));
        }
        Ok(())
    }
}

impl AnalysisConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_str(&content)
    }

    /// Parse configuration from a TOML string.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse TOML configuration")
    }

    pub fn validate(&self) -> error::Result<()> {
        self.peaks.validate()?;
        self.baseline.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_full_config() {
        let toml = r#"
            [peaks]
            num_peaks = 10
            window_size = 9
            prominence = 0.5
            min_distance = 15

            [baseline]
            method = "polynomial"

            [baseline.polynomial]
            order = 3
        "#;

        let config = AnalysisConfig::from_str(toml).unwrap();
        assert_eq!(config.peaks.num_peaks, 10);
        assert_eq!(config.peaks.window_size, 9);
        assert_eq!(config.peaks.prominence, 0.5);
        assert_eq!(config.peaks.min_distance, 15);
        assert_eq!(config.baseline.method, BaselineMethod::Polynomial);
        assert_eq!(config.baseline.polynomial.order, 3);
        assert_eq!(config.baseline.offset, OffsetConfig::default());
    }

    #[test]
    fn empty_config_uses_reference_defaults() {
        let config = AnalysisConfig::from_str("").unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert_eq!(config.peaks.num_peaks, 15);
        assert_eq!(config.peaks.window_size, 7);
        assert_eq!(config.peaks.min_distance, 20);
        assert_eq!(config.baseline.method, BaselineMethod::None);
        assert_eq!(config.baseline.polynomial.order, 5);
        assert_eq!(config.baseline.offset.window_size, 100);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(AnalysisConfig::from_str("[peaks]\nnum_peak = 3\n").is_err());
    }

    #[test]
    fn validation() {
        let mut config = AnalysisConfig::default();
        config.peaks.prominence = 0.0;
        assert!(matches!(
            config.validate(),
            Err(SignalError::InvalidParameter(_))
        ));

        let mut config = AnalysisConfig::default();
        config.baseline.method = BaselineMethod::Offset;
        config.baseline.offset.threshold = 1.2;
        assert!(config.validate().is_err());

        // offset settings are ignored unless that method is selected
        config.baseline.method = BaselineMethod::Polynomial;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn from_file_reports_missing_path() {
        let err = AnalysisConfig::from_file(Path::new("/nonexistent/rusty-peaks.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}

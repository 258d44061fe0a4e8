//! Peak picking and baseline correction for infrared transmission spectra.
//!
//! The numerical pipeline lives in [`signal`]; [`analysis`] wires it to the
//! [`config`] structs and the loaded [`data`].
//!
//! ```
//! use rusty_peaks::analysis::identify_peaks;
//! use rusty_peaks::config::PeakConfig;
//!
//! let wavenumber: Vec<f64> = (1000..=1020).map(f64::from).collect();
//! let mut transmission = vec![100.0; 21];
//! transmission[10] = 40.0;
//!
//! let config = PeakConfig { num_peaks: 5, window_size: 3, prominence: 0.3, min_distance: 2 };
//! let peaks = identify_peaks(&wavenumber, &transmission, &config).unwrap();
//! assert_eq!(peaks.positions, vec![1010.0]);
//! assert_eq!(peaks.values, vec![40.0]);
//! ```

pub mod analysis;
pub mod config;
pub mod data;
pub mod error;
pub mod signal;

pub use error::{Result, SignalError};

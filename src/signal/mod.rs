//! Numerical core: smoothing, peak picking and baseline correction.
//!
//! Architecture:
//! ```text
//!   wavenumber, transmission
//!        │
//!        ├──────────────────────────────┐
//!        ▼                              ▼
//!   ┌──────────┐                  ┌────────────┐
//!   │  smooth   │  moving average  │  baseline   │  polynomial | offset
//!   └──────────┘                  └────────────┘
//!        │                              │
//!        ▼                              ▼
//!   ┌──────────┐                  corrected, baseline
//!   │  peaks    │  dips + prominence
//!   └──────────┘
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  rank     │  top-N by prominence → position order
//!   └──────────┘
//! ```
//!
//! Every function here is pure: inputs are borrowed, outputs freshly
//! allocated.

pub mod baseline;
pub mod interp;
pub mod peaks;
pub mod polyfit;
pub mod rank;
pub mod smooth;

pub use baseline::{correct_offset, correct_polynomial, BaselineCorrection};
pub use peaks::{detect_peaks, PeakCandidate};
pub use rank::{select_top_n, Peak, PeakSelection};
pub use smooth::{smooth, SmoothedTrace};

//! Data layer: spectrum types and file loading.
//!
//! Architecture:
//! ```text
//!  .csv / .json / .parquet
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → SpectralDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌────────────────┐
//!   │ SpectralDataset │  Vec<Spectrum>, metadata columns
//!   └────────────────┘
//!        │
//!        ▼
//!     analysis
//! ```

pub mod loader;
pub mod model;

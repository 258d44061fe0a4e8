//! # rusty-peaks
//!
//! Command-line front end for peak picking and baseline correction of
//! transmission spectra.
//!
//! ```bash
//! # Ten strongest bands of every spectrum in two exports
//! rusty-peaks peaks sample_A.csv sample_B.csv --num-peaks 10
//!
//! # Offset baseline, printed as a table
//! rusty-peaks baseline sample_A.csv --method offset
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};

use rusty_peaks::analysis::{analyze_dataset, correct_baseline};
use rusty_peaks::config::{AnalysisConfig, BaselineMethod};
use rusty_peaks::data::loader::load_file;
use rusty_peaks::data::model::SpectralDataset;

#[derive(Parser)]
#[command(name = "rusty-peaks")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbosity level (-v for info, -vv for debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML file with analysis parameters; flags override it
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the most prominent absorption peaks
    Peaks {
        /// Spectrum files (.csv, .json, .parquet)
        #[arg(value_name = "FILES", required = true)]
        files: Vec<PathBuf>,

        /// Number of peaks to report per spectrum
        #[arg(short = 'n', long)]
        num_peaks: Option<usize>,

        /// Moving-average window (odd values recommended)
        #[arg(short = 'w', long)]
        window_size: Option<usize>,

        /// Minimum prominence in transmission units
        #[arg(short = 'p', long)]
        prominence: Option<f64>,

        /// Minimum separation between peaks, in samples
        #[arg(long)]
        min_distance: Option<usize>,

        /// Baseline correction applied before peak picking
        #[arg(short = 'b', long, value_enum)]
        baseline: Option<BaselineMethod>,
    },

    /// Estimate and remove the baseline of a single spectrum
    Baseline {
        /// Spectrum file (.csv, .json, .parquet)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Correction method
        #[arg(short, long, value_enum)]
        method: Option<BaselineMethod>,

        /// Polynomial order
        #[arg(long)]
        order: Option<usize>,

        /// Minimum anchor separation for the offset method, in samples
        #[arg(long)]
        window_size: Option<usize>,

        /// Anchor threshold as a fraction of the spectrum maximum
        #[arg(long)]
        threshold: Option<f64>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let mut config = match &cli.config {
        Some(path) => AnalysisConfig::from_file(path)?,
        None => AnalysisConfig::default(),
    };

    match cli.command {
        Commands::Peaks {
            files,
            num_peaks,
            window_size,
            prominence,
            min_distance,
            baseline,
        } => {
            let peaks = &mut config.peaks;
            if let Some(n) = num_peaks {
                peaks.num_peaks = n;
            }
            if let Some(w) = window_size {
                peaks.window_size = w;
            }
            if let Some(p) = prominence {
                peaks.prominence = p;
            }
            if let Some(d) = min_distance {
                peaks.min_distance = d;
            }
            if let Some(method) = baseline {
                config.baseline.method = method;
            }
            config.validate().context("invalid analysis parameters")?;
            run_peaks(&files, &config)
        }
        Commands::Baseline {
            file,
            method,
            order,
            window_size,
            threshold,
        } => {
            let baseline = &mut config.baseline;
            baseline.method = method.unwrap_or(match baseline.method {
                BaselineMethod::None => BaselineMethod::Polynomial,
                configured => configured,
            });
            if let Some(o) = order {
                baseline.polynomial.order = o;
            }
            if let Some(w) = window_size {
                baseline.offset.window_size = w;
            }
            if let Some(t) = threshold {
                baseline.offset.threshold = t;
            }
            if baseline.method == BaselineMethod::None {
                bail!("no baseline method selected");
            }
            config.validate().context("invalid baseline parameters")?;
            run_baseline(&file, &config)
        }
    }
}

fn load_all(files: &[PathBuf]) -> Result<SpectralDataset> {
    let mut dataset = SpectralDataset::default();
    for path in files {
        dataset.extend(load_file(path)?);
    }
    Ok(dataset)
}

fn run_peaks(files: &[PathBuf], config: &AnalysisConfig) -> Result<()> {
    let dataset = load_all(files)?;
    let entries = analyze_dataset(&dataset, config);

    let mut failed = 0;
    for entry in &entries {
        match &entry.result {
            Ok(report) => {
                println!("== {} ({} peaks)", report.name, report.peaks.len());
                println!("{:>3}  {:>12}  {:>14}  {:>10}", "#", "wavenumber", "transmission", "prominence");
                for (rank, peak) in report.peaks.peaks().enumerate() {
                    println!(
                        "{:>3}  {:>12.2}  {:>14.3}  {:>10.3}",
                        rank + 1,
                        peak.wavenumber,
                        peak.transmission,
                        peak.prominence
                    );
                }
            }
            Err(e) => {
                log::error!("{}: {e}", entry.name);
                failed += 1;
            }
        }
    }

    if failed > 0 {
        bail!("{failed} of {} spectra could not be analyzed", entries.len());
    }
    Ok(())
}

fn run_baseline(file: &Path, config: &AnalysisConfig) -> Result<()> {
    let dataset = load_file(file)?;
    for spectrum in &dataset.spectra {
        let correction =
            correct_baseline(&spectrum.wavenumber, &spectrum.transmission, &config.baseline)
                .with_context(|| format!("{}: baseline correction failed", spectrum.name))?;
        let Some(correction) = correction else {
            continue;
        };

        println!("== {}", spectrum.name);
        println!("wavenumber\traw\tbaseline\tcorrected");
        for i in 0..spectrum.len() {
            println!(
                "{:.4}\t{:.4}\t{:.4}\t{:.4}",
                spectrum.wavenumber[i],
                spectrum.transmission[i],
                correction.baseline[i],
                correction.corrected[i]
            );
        }
    }
    Ok(())
}

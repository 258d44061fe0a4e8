use std::path::Path;
use std::sync::Arc;

use arrow::array::{Float64Array, Float64Builder, Int64Array, ListBuilder, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;

/// An absorption band: center (cm⁻¹), width (cm⁻¹), depth (% transmission).
type Band = (f64, f64, f64);

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Transmission trace: a slowly drifting baseline minus Gaussian bands.
fn generate_spectrum(
    wavenumbers: &[f64],
    bands: &[Band],
    drift: f64,
    noise_level: f64,
    rng: &mut SimpleRng,
) -> Vec<f64> {
    wavenumbers
        .iter()
        .map(|&wn| {
            let baseline = 96.0 - drift * (4000.0 - wn) / 3480.0;
            let absorption: f64 = bands
                .iter()
                .map(|&(mu, sigma, depth)| gaussian(wn, mu, sigma, depth))
                .sum();
            baseline - absorption + rng.gauss(0.0, noise_level)
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

/// Write one spectrum the way the instrument exports it: two header lines,
/// then `wavenumber,transmission` rows.
fn write_instrument_csv(path: &Path, sample: &str, wavenumbers: &[f64], y: &[f64]) -> csv::Result<()> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .from_path(path)?;
    writer.write_record([sample, "synthetic"])?;
    writer.write_record(["cm-1", "%T"])?;
    for (wn, t) in wavenumbers.iter().zip(y) {
        writer.write_record([format!("{wn:.1}"), format!("{t:.4}")])?;
    }
    writer.flush()?;
    Ok(())
}

fn main() {
    env_logger::init();
    let mut rng = SimpleRng::new(42);

    // Wavenumbers: 4000 → 520, step 2 (mid-IR, descending as exported)
    let wavenumbers: Vec<f64> = (0..1741).map(|i| 4000.0 - i as f64 * 2.0).collect();

    let drifts = [0.0, 4.0, 10.0];
    let sample_bands: Vec<(&str, Vec<Band>)> = vec![
        ("Polyethylene", vec![(2915.0, 12.0, 55.0), (2848.0, 10.0, 45.0), (1470.0, 8.0, 25.0), (720.0, 6.0, 20.0)]),
        ("Polystyrene", vec![(3026.0, 8.0, 30.0), (2920.0, 14.0, 35.0), (1601.0, 5.0, 20.0), (1493.0, 6.0, 35.0), (1452.0, 6.0, 30.0), (698.0, 8.0, 60.0)]),
        ("PMMA", vec![(2950.0, 15.0, 25.0), (1730.0, 10.0, 70.0), (1150.0, 20.0, 55.0), (985.0, 8.0, 20.0)]),
    ];

    let mut all_y: Vec<Vec<f64>> = Vec::new();
    let mut all_sample: Vec<String> = Vec::new();
    let mut all_drift: Vec<f64> = Vec::new();
    let mut all_id: Vec<i64> = Vec::new();

    for (sample, bands) in &sample_bands {
        for &drift in &drifts {
            let y = generate_spectrum(&wavenumbers, bands, drift, 0.15, &mut rng);

            let csv_path = format!("{}_drift{}.csv", sample.to_lowercase(), drift as i64);
            write_instrument_csv(Path::new(&csv_path), sample, &wavenumbers, &y)
                .expect("Failed to write CSV export");

            all_id.push(all_y.len() as i64);
            all_y.push(y);
            all_sample.push(sample.to_string());
            all_drift.push(drift);
        }
    }

    // Build Arrow arrays
    let mut x_builder = ListBuilder::new(Float64Builder::new());
    for _ in &all_y {
        x_builder.values().append_slice(&wavenumbers);
        x_builder.append(true);
    }
    let x_array = x_builder.finish();

    let mut y_builder = ListBuilder::new(Float64Builder::new());
    for row in &all_y {
        y_builder.values().append_slice(row);
        y_builder.append(true);
    }
    let y_array = y_builder.finish();

    let sample_array = StringArray::from(
        all_sample.iter().map(|s| s.as_str()).collect::<Vec<_>>(),
    );
    let drift_array = Float64Array::from(all_drift);
    let id_array = Int64Array::from(all_id);

    let schema = Arc::new(Schema::new(vec![
        Field::new("x", DataType::List(Arc::new(Field::new("item", DataType::Float64, true))), false),
        Field::new("y", DataType::List(Arc::new(Field::new("item", DataType::Float64, true))), false),
        Field::new("sample", DataType::Utf8, false),
        Field::new("drift", DataType::Float64, false),
        Field::new("measurement_id", DataType::Int64, false),
    ]));

    let batch = RecordBatch::try_new(
        schema.clone(),
        vec![
            Arc::new(x_array),
            Arc::new(y_array),
            Arc::new(sample_array),
            Arc::new(drift_array),
            Arc::new(id_array),
        ],
    )
    .expect("Failed to create RecordBatch");

    // Write Parquet
    let output_path = "sample_spectra.parquet";
    let file = std::fs::File::create(output_path).expect("Failed to create output file");
    let mut writer = ArrowWriter::try_new(file, schema, None).expect("Failed to create writer");
    writer.write(&batch).expect("Failed to write batch");
    writer.close().expect("Failed to close writer");

    log::info!("CSV exports written next to {output_path}");
    println!(
        "Wrote {} spectra ({} wavenumbers each) to {output_path}",
        all_y.len(),
        wavenumbers.len()
    );
}

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use arrow::array::{
    Array, AsArray, BooleanArray, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeListArray, ListArray, StringArray,
};
use arrow::datatypes::DataType;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde_json::Value as JsonValue;

use super::model::{MetadataValue, SpectralDataset, Spectrum};

/// Lines of instrument header preceding the data rows of an exported CSV.
const CSV_PREAMBLE_LINES: usize = 2;

/// Metadata columns used, in order, to name a spectrum.
const NAME_COLUMNS: [&str; 2] = ["name", "sample"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load a spectral dataset from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – instrument export: two header lines, then `wavenumber,transmission`
/// * `.json`    – `[{ "x": [...], "y": [...], ...meta }, ...]`
/// * `.parquet` – Parquet file with `x` and `y` list columns
pub fn load_file(path: &Path) -> Result<SpectralDataset> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let dataset = match ext.as_str() {
        "csv" => load_csv(path),
        "json" => load_json(path),
        "parquet" | "pq" => load_parquet(path),
        other => bail!("Unsupported file extension: .{other}"),
    }
    .with_context(|| format!("loading {}", path.display()))?;

    log::info!(
        "Loaded {} spectra from {} with columns {:?}",
        dataset.len(),
        path.display(),
        dataset.column_names
    );
    Ok(dataset)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("spectrum")
        .to_string()
}

/// Build a spectrum from loaded columns, naming it from its metadata.
fn named_spectrum(
    stem: &str,
    row: usize,
    x: Vec<f64>,
    y: Vec<f64>,
    metadata: BTreeMap<String, MetadataValue>,
) -> Result<Spectrum> {
    if x.len() != y.len() {
        bail!("Row {row}: x has {} values but y has {}", x.len(), y.len());
    }
    let name = NAME_COLUMNS
        .iter()
        .find_map(|col| match metadata.get(*col) {
            Some(MetadataValue::Null) | None => None,
            Some(v) => Some(v.to_string()),
        })
        .unwrap_or_else(|| format!("{stem}#{row}"));

    let mut spectrum = Spectrum::new(name, x, y)?;
    spectrum.metadata = metadata;
    Ok(spectrum)
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// Instrument export layout: two free-form header lines, then one
/// `wavenumber,transmission` pair per row with no column header.
/// The file holds exactly one spectrum, named after the file stem.
fn load_csv(path: &Path) -> Result<SpectralDataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .context("opening CSV")?;

    let mut wavenumber = Vec::new();
    let mut transmission = Vec::new();

    for (row_no, result) in reader.records().enumerate().skip(CSV_PREAMBLE_LINES) {
        let record = result.with_context(|| format!("CSV row {row_no}"))?;
        if record.iter().all(|field| field.is_empty()) {
            continue;
        }
        let w = parse_field(record.get(0), row_no, "wavenumber")?;
        let t = parse_field(record.get(1), row_no, "transmission")?;
        wavenumber.push(w);
        transmission.push(t);
    }

    if wavenumber.is_empty() {
        bail!("CSV has no data rows after the {CSV_PREAMBLE_LINES}-line header");
    }

    let spectrum = Spectrum::new(file_stem(path), wavenumber, transmission)?;
    Ok(SpectralDataset::from_spectra(vec![spectrum]))
}

fn parse_field(field: Option<&str>, row: usize, col: &str) -> Result<f64> {
    let tok = field.with_context(|| format!("CSV row {row}: missing {col} column"))?;
    tok.parse::<f64>()
        .with_context(|| format!("CSV row {row}, {col}: '{tok}' is not a number"))
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Expected JSON schema (records-oriented, the default `df.to_json(orient='records')`):
///
/// ```json
/// [
///   {
///     "x": [4000.0, 3998.0, ...],
///     "y": [98.2,   98.1,   ...],
///     "sample": "A"
///   },
///   ...
/// ]
/// ```
fn load_json(path: &Path) -> Result<SpectralDataset> {
    let text = std::fs::read_to_string(path).context("reading JSON file")?;
    let root: JsonValue = serde_json::from_str(&text).context("parsing JSON")?;

    let records = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let stem = file_stem(path);
    let mut spectra = Vec::with_capacity(records.len());

    for (i, rec) in records.iter().enumerate() {
        let obj = rec
            .as_object()
            .with_context(|| format!("Row {i} is not a JSON object"))?;

        let x = json_array_to_f64(obj.get("x"), i, "x")?;
        let y = json_array_to_f64(obj.get("y"), i, "y")?;

        let metadata = obj
            .iter()
            .filter(|(key, _)| key.as_str() != "x" && key.as_str() != "y")
            .map(|(key, val)| (key.clone(), json_to_metadata(val)))
            .collect();

        spectra.push(named_spectrum(&stem, i, x, y, metadata)?);
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

fn json_array_to_f64(val: Option<&JsonValue>, row: usize, col: &str) -> Result<Vec<f64>> {
    let arr = val
        .and_then(|v| v.as_array())
        .with_context(|| format!("Row {row}: missing or invalid '{col}' array"))?;

    arr.iter()
        .enumerate()
        .map(|(j, v)| {
            v.as_f64()
                .with_context(|| format!("Row {row}, {col}[{j}]: not a number"))
        })
        .collect()
}

fn json_to_metadata(val: &JsonValue) -> MetadataValue {
    match val {
        JsonValue::String(s) => MetadataValue::String(s.clone()),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                MetadataValue::Integer(i)
            } else if let Some(f) = n.as_f64() {
                MetadataValue::Float(f)
            } else {
                MetadataValue::String(n.to_string())
            }
        }
        JsonValue::Bool(b) => MetadataValue::Bool(*b),
        JsonValue::Null => MetadataValue::Null,
        other => MetadataValue::String(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file containing spectral data.
///
/// Expected schema:
/// - `x`: List<Float64> or LargeList<Float64> – wavenumber arrays
/// - `y`: List<Float64> or LargeList<Float64> – transmission arrays
/// - Any other columns are treated as metadata (strings, ints, floats, bools)
fn load_parquet(path: &Path) -> Result<SpectralDataset> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let stem = file_stem(path);
    let mut spectra = Vec::new();

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;
        let schema = batch.schema();

        let x_idx = schema
            .index_of("x")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'x' column"))?;
        let y_idx = schema
            .index_of("y")
            .map_err(|_| anyhow::anyhow!("Parquet file missing 'y' column"))?;

        let x_col = batch.column(x_idx);
        let y_col = batch.column(y_idx);

        let meta_cols: Vec<(usize, String)> = schema
            .fields()
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != x_idx && *i != y_idx)
            .map(|(i, f)| (i, f.name().clone()))
            .collect();

        for row in 0..batch.num_rows() {
            let global_row = spectra.len();
            let x = extract_f64_list(x_col, row)
                .with_context(|| format!("Row {global_row}: failed to read 'x'"))?;
            let y = extract_f64_list(y_col, row)
                .with_context(|| format!("Row {global_row}: failed to read 'y'"))?;

            let metadata = meta_cols
                .iter()
                .map(|(col_idx, col_name)| {
                    let value = extract_metadata_value(batch.column(*col_idx), row);
                    (col_name.clone(), value)
                })
                .collect();

            spectra.push(named_spectrum(&stem, global_row, x, y, metadata)?);
        }
    }

    Ok(SpectralDataset::from_spectra(spectra))
}

// -- Parquet / Arrow helpers --

/// Extract a `Vec<f64>` from a List or LargeList column at the given row.
fn extract_f64_list(col: &Arc<dyn Array>, row: usize) -> Result<Vec<f64>> {
    if col.is_null(row) {
        bail!("null value in list column");
    }

    let values_array = match col.data_type() {
        DataType::List(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<ListArray>()
                .context("expected ListArray")?;
            list_arr.value(row)
        }
        DataType::LargeList(_) => {
            let list_arr = col
                .as_any()
                .downcast_ref::<LargeListArray>()
                .context("expected LargeListArray")?;
            list_arr.value(row)
        }
        other => bail!("Expected List or LargeList column, got {other:?}"),
    };

    // null entries become NaN and are later treated as undefined samples
    if let Some(f64_arr) = values_array.as_any().downcast_ref::<Float64Array>() {
        Ok(f64_arr.iter().map(|v| v.unwrap_or(f64::NAN)).collect())
    } else if let Some(f32_arr) = values_array.as_any().downcast_ref::<Float32Array>() {
        Ok(f32_arr
            .iter()
            .map(|v| v.map_or(f64::NAN, f64::from))
            .collect())
    } else {
        bail!(
            "List inner type is {:?}, expected Float64 or Float32",
            values_array.data_type()
        )
    }
}

/// Extract a single metadata value from an Arrow column at a given row.
fn extract_metadata_value(col: &Arc<dyn Array>, row: usize) -> MetadataValue {
    if col.is_null(row) {
        return MetadataValue::Null;
    }
    let any = col.as_any();
    match col.data_type() {
        DataType::Utf8 => any
            .downcast_ref::<StringArray>()
            .map_or(MetadataValue::Null, |s| {
                MetadataValue::String(s.value(row).to_string())
            }),
        DataType::LargeUtf8 => MetadataValue::String(col.as_string::<i64>().value(row).to_string()),
        DataType::Int32 => any
            .downcast_ref::<Int32Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Integer(i64::from(a.value(row)))),
        DataType::Int64 => any
            .downcast_ref::<Int64Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Integer(a.value(row))),
        DataType::Float32 => any
            .downcast_ref::<Float32Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Float(f64::from(a.value(row)))),
        DataType::Float64 => any
            .downcast_ref::<Float64Array>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Float(a.value(row))),
        DataType::Boolean => any
            .downcast_ref::<BooleanArray>()
            .map_or(MetadataValue::Null, |a| MetadataValue::Bool(a.value(row))),
        other => MetadataValue::String(format!("{other:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use arrow::array::{Float64Builder, ListBuilder};
    use arrow::datatypes::{Field, Schema};
    use arrow::record_batch::RecordBatch;
    use parquet::arrow::ArrowWriter;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut f = std::fs::File::create(&path).unwrap();
        f.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn csv_instrument_export() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "sample_A.csv",
            "Instrument XYZ,Scan 32\ncm-1,%T\n4000.0,98.5\n3998.0, 97.25\n3996.0,96.0\n\n",
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        let sp = &ds.spectra[0];
        assert_eq!(sp.name, "sample_A");
        assert_eq!(sp.wavenumber, vec![4000.0, 3998.0, 3996.0]);
        assert_eq!(sp.transmission, vec![98.5, 97.25, 96.0]);
    }

    #[test]
    fn csv_bad_number_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.csv", "a\nb\n4000,98\n3998,oops\n");
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("oops"));
    }

    #[test]
    fn csv_without_rows_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "empty.csv", "header 1\nheader 2\n");
        assert!(load_file(&path).is_err());
    }

    #[test]
    fn json_records_with_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(
            &dir,
            "batch.json",
            r#"[
                {"x": [3000, 2998], "y": [90.0, 80.5], "sample": "A", "conc": 0.5},
                {"x": [3000, 2998], "y": [91.0, 81.5], "operator": null}
            ]"#,
        );
        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.spectra[0].name, "A");
        assert_eq!(ds.spectra[0].metadata["conc"], MetadataValue::Float(0.5));
        assert_eq!(ds.spectra[1].name, "batch#1");
        assert_eq!(ds.column_names, vec!["conc", "operator", "sample"]);
    }

    #[test]
    fn json_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_file(&dir, "bad.json", r#"[{"x": [1, 2], "y": [1]}]"#);
        let err = load_file(&path).unwrap_err();
        assert!(format!("{err:#}").contains("x has 2 values but y has 1"));
    }

    #[test]
    fn parquet_lists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("set.parquet");

        let mut x_builder = ListBuilder::new(Float64Builder::new());
        let mut y_builder = ListBuilder::new(Float64Builder::new());
        x_builder.values().append_slice(&[1000.0, 1001.0, 1002.0]);
        x_builder.append(true);
        y_builder.values().append_slice(&[99.0, 50.0, 99.0]);
        y_builder.append(true);

        let list = DataType::List(Arc::new(Field::new("item", DataType::Float64, true)));
        let schema = Arc::new(Schema::new(vec![
            Field::new("x", list.clone(), false),
            Field::new("y", list, false),
            Field::new("sample", DataType::Utf8, false),
        ]));
        let batch = RecordBatch::try_new(
            schema.clone(),
            vec![
                Arc::new(x_builder.finish()),
                Arc::new(y_builder.finish()),
                Arc::new(StringArray::from(vec!["KBr"])),
            ],
        )
        .unwrap();

        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, schema, None).unwrap();
        writer.write(&batch).unwrap();
        writer.close().unwrap();

        let ds = load_file(&path).unwrap();
        assert_eq!(ds.len(), 1);
        assert_eq!(ds.spectra[0].name, "KBr");
        assert_eq!(ds.spectra[0].transmission, vec![99.0, 50.0, 99.0]);
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("spectrum.spc")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension"));
        let err = load_file(Path::new("spectrum.txt")).unwrap_err();
        assert!(err.to_string().contains("Unsupported file extension: .txt"));
    }
}

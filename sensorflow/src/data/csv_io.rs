//! CSV reading and writing for [`Dataset`].

use super::dataset::{Cell, Dataset};
use crate::errors::{Result, SensorError};
use crate::utils::ensure_parent_dir;
use std::io::{Read, Write};
use std::path::Path;

/// Reads a headed CSV file.
///
/// Empty fields and `na`/`nan` markers are read as missing.
///
/// # Errors
///
/// Returns `SensorError::Csv` on unreadable or ragged input.
pub fn read_csv(path: impl AsRef<Path>) -> Result<Dataset> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| SensorError::io(path, e))?;
    read_csv_from(file, path)
}

/// Reads a headed CSV table from any reader.
///
/// `source` only labels errors.
///
/// # Errors
///
/// Returns `SensorError::Csv` on malformed input.
pub fn read_csv_from<R: Read>(reader: R, source: impl AsRef<Path>) -> Result<Dataset> {
    let source = source.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| SensorError::csv(source, e))?
        .iter()
        .map(str::to_string)
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.map_err(|e| SensorError::csv(source, e))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Dataset::from_rows(headers, rows)
}

/// Writes a dataset as a headed CSV file, creating parent directories.
///
/// # Errors
///
/// Returns `SensorError::Io` or `SensorError::Csv` on write failure.
pub fn write_csv(dataset: &Dataset, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    ensure_parent_dir(path)?;
    let file = std::fs::File::create(path).map_err(|e| SensorError::io(path, e))?;
    write_csv_to(dataset, file, path)
}

/// Writes a dataset as CSV to any writer.
///
/// # Errors
///
/// Returns `SensorError::Csv` on write failure.
pub fn write_csv_to<W: Write>(dataset: &Dataset, writer: W, target: impl AsRef<Path>) -> Result<()> {
    let target = target.as_ref();
    let mut writer = csv::Writer::from_writer(writer);

    writer
        .write_record(dataset.column_names())
        .map_err(|e| SensorError::csv(target, e))?;
    for index in 0..dataset.n_rows() {
        let row = dataset.columns().iter().map(|c| c.values()[index].to_string());
        writer
            .write_record(row)
            .map_err(|e| SensorError::csv(target, e))?;
    }
    writer
        .flush()
        .map_err(|e| SensorError::io(target, e))
}

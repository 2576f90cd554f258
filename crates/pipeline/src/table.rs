//! Tabular output
//!
//! Writes the assembled series as CSV with a fixed column schema.
//! Missing statistics stay empty cells; they are never written as zeros.

use std::io::Write;
use std::path::Path;

use verdis_core::{Error, Result};

use crate::series::SeriesRow;

/// Output column headers, in order
pub const COLUMNS: [&str; 6] = [
    "Month",
    "Years Since Epoch (t)",
    "Region",
    "Max NDVI",
    "Mean NDVI",
    "Min NDVI",
];

/// Write series rows as CSV to a file
pub fn write_table<P: AsRef<Path>>(rows: &[SeriesRow], path: P) -> Result<()> {
    let writer = csv::Writer::from_path(path.as_ref()).map_err(csv_error)?;
    write_rows(rows, writer)
}

/// Write series rows as CSV to any writer
pub fn write_table_to<W: Write>(rows: &[SeriesRow], writer: W) -> Result<()> {
    write_rows(rows, csv::Writer::from_writer(writer))
}

fn write_rows<W: Write>(rows: &[SeriesRow], mut writer: csv::Writer<W>) -> Result<()> {
    writer.write_record(COLUMNS).map_err(csv_error)?;

    for row in rows {
        writer
            .write_record([
                row.month.clone(),
                format!("{:.3}", row.years_since_epoch),
                row.region.clone(),
                format_stat(row.max),
                format_stat(row.mean),
                format_stat(row.min),
            ])
            .map_err(csv_error)?;
    }

    writer.flush()?;
    Ok(())
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.3}", v),
        None => String::new(),
    }
}

fn csv_error(err: csv::Error) -> Error {
    Error::Other(format!("CSV write error: {}", err))
}

//! CSV-folder import/export for networks and LOPF results.
//!
//! Static attributes live in one table per component kind (`generators.csv`,
//! …), series in `<kind>-<attribute>.csv` tables with one row per snapshot
//! and one column per component.

pub mod export;
pub mod network_csv;

use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};
use crate::network::Snapshot;

pub use export::{export_solution, read_solution};
pub use network_csv::{read_network, write_network};

/// Snapshot table shared by network and result folders.
pub(crate) const SNAPSHOTS: &str = "snapshots.csv";

/// One named column of a series table; `None` is written as an empty cell.
pub type SeriesColumn = (String, Vec<Option<f64>>);

pub(crate) fn csv_error(path: &Path) -> impl FnOnce(csv::Error) -> Error + '_ {
    move |source| Error::Csv {
        path: path.to_path_buf(),
        source,
    }
}

pub(crate) fn io_error(path: &Path) -> impl FnOnce(io::Error) -> Error + '_ {
    move |source| Error::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Creates `dir` (and parents) if missing.
pub(crate) fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir).map_err(io_error(dir))
}

/// Error for a table that must be present.
pub(crate) fn missing_table(path: PathBuf) -> Error {
    Error::Io {
        path,
        source: io::Error::new(io::ErrorKind::NotFound, "table is required"),
    }
}

pub(crate) fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let file = File::create(path).map_err(io_error(path))?;
    let mut wtr = csv::WriterBuilder::new().from_writer(io::BufWriter::new(file));
    for row in rows {
        wtr.serialize(row).map_err(csv_error(path))?;
    }
    wtr.flush().map_err(io_error(path))
}

/// Rows of an optional table; a missing file means no rows.
pub(crate) fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(csv_error(path))?;
    rdr.deserialize()
        .collect::<csv::Result<Vec<T>>>()
        .map_err(csv_error(path))
}

/// Writes a series table: a `snapshot` column followed by one column per entry.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_series(
    snapshots: &[Snapshot],
    columns: &[SeriesColumn],
    writer: impl Write,
) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    let mut header = vec!["snapshot"];
    header.extend(columns.iter().map(|(name, _)| name.as_str()));
    wtr.write_record(&header)?;

    for (t, snapshot) in snapshots.iter().enumerate() {
        let mut row = vec![snapshot.name.clone()];
        row.extend(columns.iter().map(|(_, values)| {
            values
                .get(t)
                .copied()
                .flatten()
                .map_or_else(String::new, |v| v.to_string())
        }));
        wtr.write_record(&row)?;
    }

    wtr.flush()?;
    Ok(())
}

pub(crate) fn write_series_file(
    path: &Path,
    snapshots: &[Snapshot],
    columns: &[SeriesColumn],
) -> Result<()> {
    let file = File::create(path).map_err(io_error(path))?;
    write_series(snapshots, columns, io::BufWriter::new(file)).map_err(csv_error(path))
}

/// Reads a series table written by [`write_series`].
///
/// Rows must follow `snapshots` in order; empty cells become `None`.
pub(crate) fn read_series_file(path: &Path, snapshots: &[Snapshot]) -> Result<Vec<SeriesColumn>> {
    let parse_error = |message: String| Error::Parse {
        path: PathBuf::from(path),
        message,
    };

    let mut rdr = csv::ReaderBuilder::new()
        .from_path(path)
        .map_err(csv_error(path))?;
    let headers = rdr.headers().map_err(csv_error(path))?.clone();
    let mut columns: Vec<SeriesColumn> = headers
        .iter()
        .skip(1)
        .map(|name| (name.to_string(), Vec::with_capacity(snapshots.len())))
        .collect();

    let mut rows = 0;
    for record in rdr.records() {
        let record = record.map_err(csv_error(path))?;
        let expected = snapshots.get(rows).map(|s| s.name.as_str());
        if record.get(0) != expected {
            return Err(parse_error(format!(
                "row {} is snapshot {:?}, expected {:?}",
                rows + 1,
                record.get(0),
                expected
            )));
        }
        for (i, (name, values)) in columns.iter_mut().enumerate() {
            let cell = record.get(i + 1).unwrap_or("").trim();
            if cell.is_empty() {
                values.push(None);
            } else {
                let v = cell
                    .parse::<f64>()
                    .map_err(|e| parse_error(format!("column \"{name}\": \"{cell}\": {e}")))?;
                values.push(Some(v));
            }
        }
        rows += 1;
    }
    if rows != snapshots.len() {
        return Err(parse_error(format!(
            "{rows} rows, expected one per snapshot ({})",
            snapshots.len()
        )));
    }
    Ok(columns)
}

//! LOPF results as a folder of CSV tables, written and read back.
//!
//! A folder written by [`export_solution`] can serve as stored reference
//! results: [`read_solution`] restores the same [`LopfSolution`].

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use serde::Deserialize;

use super::{
    SNAPSHOTS, SeriesColumn, csv_error, ensure_dir, io_error, missing_table, read_rows,
    read_series_file, write_rows, write_series_file,
};
use crate::error::{Error, Result};
use crate::lopf::{
    GeneratorResult, LineResult, LinkResult, LopfSolution, StorageUnitResult, StoreResult,
};
use crate::network::{ComponentKind, Snapshot};

const SUMMARY: &str = "summary.csv";
const NOMINAL: &str = "nominal.csv";

/// Column header of the nominal-capacity table.
const NOMINAL_HEADER: &str = "component,name,attribute,value";

/// Exports `solution` into `dir`: the snapshots, a summary, the optimised
/// capacities and one table per result series.
///
/// # Arguments
///
/// * `solution` - Solved LOPF
/// * `dir` - Output folder, created if missing
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) or [`Error::Csv`](crate::Error::Csv)
/// if a file cannot be written.
pub fn export_solution(solution: &LopfSolution, dir: &Path) -> Result<()> {
    ensure_dir(dir)?;
    write_rows(&dir.join(SNAPSHOTS), &solution.snapshots)?;

    let path = dir.join(SUMMARY);
    let file = File::create(&path).map_err(io_error(&path))?;
    write_summary_csv(solution, io::BufWriter::new(file)).map_err(csv_error(&path))?;

    let path = dir.join(NOMINAL);
    let file = File::create(&path).map_err(io_error(&path))?;
    write_nominal_csv(solution, io::BufWriter::new(file)).map_err(csv_error(&path))?;

    for (file, columns) in series_tables(solution) {
        if !columns.is_empty() {
            write_series_file(&dir.join(file), &solution.snapshots, &columns)?;
        }
    }
    log::info!("exported LOPF results to {}", dir.display());
    Ok(())
}

/// Writes objective, cost split and emissions as `metric,value` rows.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_summary_csv(solution: &LopfSolution, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(["metric", "value"])?;
    for (metric, value) in [
        ("objective", solution.objective),
        ("capital_costs", solution.capital_costs),
        ("marginal_costs", solution.marginal_costs),
        ("co2_emissions", solution.co2_emissions),
    ] {
        wtr.write_record([metric.to_string(), value.to_string()])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Writes every optimised capacity, one row per component.
///
/// # Errors
///
/// Returns a `csv::Error` if writing fails.
pub fn write_nominal_csv(solution: &LopfSolution, writer: impl Write) -> csv::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);
    wtr.write_record(NOMINAL_HEADER.split(','))?;

    let mut row = |kind: ComponentKind, name: &str, attribute: &str, value: f64| {
        wtr.write_record([kind.to_string().as_str(), name, attribute, value.to_string().as_str()])
    };
    for (name, r) in &solution.generators {
        row(ComponentKind::Generator, name, "p_nom_opt", r.p_nom_opt)?;
    }
    for (name, r) in &solution.storage_units {
        row(ComponentKind::StorageUnit, name, "p_nom_opt", r.p_nom_opt)?;
    }
    for (name, r) in &solution.links {
        row(ComponentKind::Link, name, "p_nom_opt", r.p_nom_opt)?;
    }
    for (name, r) in &solution.stores {
        row(ComponentKind::Store, name, "e_nom_opt", r.e_nom_opt)?;
    }
    for (name, r) in &solution.lines {
        row(ComponentKind::Line, name, "s_nom_opt", r.s_nom_opt)?;
    }
    wtr.flush()?;
    Ok(())
}

fn columns<'a, T: 'a>(
    items: impl IntoIterator<Item = (&'a String, &'a T)>,
    series: impl Fn(&T) -> &[f64],
) -> Vec<SeriesColumn> {
    items
        .into_iter()
        .map(|(name, r)| (name.clone(), series(r).iter().copied().map(Some).collect()))
        .collect()
}

fn series_tables(s: &LopfSolution) -> Vec<(&'static str, Vec<SeriesColumn>)> {
    vec![
        ("generators-p.csv", columns(&s.generators, |r| &r.p)),
        ("storage_units-p.csv", columns(&s.storage_units, |r| &r.p)),
        ("storage_units-p_dispatch.csv", columns(&s.storage_units, |r| &r.p_dispatch)),
        ("storage_units-p_store.csv", columns(&s.storage_units, |r| &r.p_store)),
        ("storage_units-state_of_charge.csv", columns(&s.storage_units, |r| &r.state_of_charge)),
        ("storage_units-spill.csv", columns(&s.storage_units, |r| &r.spill)),
        ("links-p0.csv", columns(&s.links, |r| &r.p0)),
        ("links-p1.csv", columns(&s.links, |r| &r.p1)),
        ("stores-e.csv", columns(&s.stores, |r| &r.e)),
        ("stores-p.csv", columns(&s.stores, |r| &r.p)),
        ("lines-p0.csv", columns(&s.lines, |r| &r.p0)),
    ]
}

#[derive(Debug, Deserialize)]
struct SummaryRow {
    metric: String,
    value: f64,
}

#[derive(Debug, Deserialize)]
struct NominalRow {
    component: String,
    name: String,
    attribute: String,
    value: f64,
}

/// Reads a folder written by [`export_solution`] back into a [`LopfSolution`].
///
/// `nominal.csv` decides which components the solution holds; every series
/// table column must name one of them, and each of them must end up with a
/// complete series per table.
///
/// # Errors
///
/// Returns [`Error::Io`] if `snapshots.csv`, `summary.csv` or `nominal.csv` is
/// missing, [`Error::Csv`] for malformed tables and [`Error::Parse`] for
/// unknown metrics or components, or incomplete series.
pub fn read_solution(dir: &Path) -> Result<LopfSolution> {
    let required = |file: &str| {
        let path = dir.join(file);
        if path.exists() {
            Ok(path)
        } else {
            Err(missing_table(path))
        }
    };

    let snapshots: Vec<Snapshot> = read_rows(&required(SNAPSHOTS)?)?;
    let mut solution = LopfSolution {
        snapshots,
        ..LopfSolution::default()
    };

    let path = required(SUMMARY)?;
    for row in read_rows::<SummaryRow>(&path)? {
        let field = match row.metric.as_str() {
            "objective" => &mut solution.objective,
            "capital_costs" => &mut solution.capital_costs,
            "marginal_costs" => &mut solution.marginal_costs,
            "co2_emissions" => &mut solution.co2_emissions,
            other => {
                return Err(Error::Parse {
                    path,
                    message: format!("unknown metric \"{other}\""),
                });
            }
        };
        *field = row.value;
    }

    let path = required(NOMINAL)?;
    for row in read_rows::<NominalRow>(&path)? {
        let NominalRow {
            component,
            name,
            attribute,
            value,
        } = row;
        match (component.as_str(), attribute.as_str()) {
            ("Generator", "p_nom_opt") => {
                let r = GeneratorResult {
                    p_nom_opt: value,
                    ..GeneratorResult::default()
                };
                solution.generators.insert(name, r);
            }
            ("StorageUnit", "p_nom_opt") => {
                let r = StorageUnitResult {
                    p_nom_opt: value,
                    ..StorageUnitResult::default()
                };
                solution.storage_units.insert(name, r);
            }
            ("Link", "p_nom_opt") => {
                let r = LinkResult {
                    p_nom_opt: value,
                    ..LinkResult::default()
                };
                solution.links.insert(name, r);
            }
            ("Store", "e_nom_opt") => {
                let r = StoreResult {
                    e_nom_opt: value,
                    ..StoreResult::default()
                };
                solution.stores.insert(name, r);
            }
            ("Line", "s_nom_opt") => {
                let r = LineResult {
                    s_nom_opt: value,
                    ..LineResult::default()
                };
                solution.lines.insert(name, r);
            }
            _ => {
                return Err(Error::Parse {
                    path,
                    message: format!("unexpected row {component},{name},{attribute}"),
                });
            }
        }
    }

    let snapshots = solution.snapshots.clone();
    let s = &mut solution;
    read_series_into(dir, "generators-p.csv", &snapshots, &mut s.generators, |r| &mut r.p)?;
    read_series_into(dir, "storage_units-p.csv", &snapshots, &mut s.storage_units, |r| &mut r.p)?;
    read_series_into(
        dir,
        "storage_units-p_dispatch.csv",
        &snapshots,
        &mut s.storage_units,
        |r| &mut r.p_dispatch,
    )?;
    read_series_into(
        dir,
        "storage_units-p_store.csv",
        &snapshots,
        &mut s.storage_units,
        |r| &mut r.p_store,
    )?;
    read_series_into(
        dir,
        "storage_units-state_of_charge.csv",
        &snapshots,
        &mut s.storage_units,
        |r| &mut r.state_of_charge,
    )?;
    read_series_into(dir, "storage_units-spill.csv", &snapshots, &mut s.storage_units, |r| {
        &mut r.spill
    })?;
    read_series_into(dir, "links-p0.csv", &snapshots, &mut s.links, |r| &mut r.p0)?;
    read_series_into(dir, "links-p1.csv", &snapshots, &mut s.links, |r| &mut r.p1)?;
    read_series_into(dir, "stores-e.csv", &snapshots, &mut s.stores, |r| &mut r.e)?;
    read_series_into(dir, "stores-p.csv", &snapshots, &mut s.stores, |r| &mut r.p)?;
    read_series_into(dir, "lines-p0.csv", &snapshots, &mut s.lines, |r| &mut r.p0)?;

    if let Some((file, name)) = incomplete_series(&solution) {
        return Err(Error::Parse {
            path: dir.join(file),
            message: format!("no complete series for \"{name}\""),
        });
    }
    log::info!(
        "read LOPF results from {}: objective {:.4}",
        dir.display(),
        solution.objective
    );
    Ok(solution)
}

/// Fills one series of each result from an optional series table.
fn read_series_into<T>(
    dir: &Path,
    file: &str,
    snapshots: &[Snapshot],
    results: &mut BTreeMap<String, T>,
    series: impl Fn(&mut T) -> &mut Vec<f64>,
) -> Result<()> {
    let path = dir.join(file);
    if !path.exists() {
        return Ok(());
    }
    for (name, values) in read_series_file(&path, snapshots)? {
        let values: Option<Vec<f64>> = values.into_iter().collect();
        match (results.get_mut(&name), values) {
            (Some(r), Some(v)) => *series(r) = v,
            _ => {
                return Err(Error::Parse {
                    path,
                    message: format!("column \"{name}\" has no row in {NOMINAL} or has gaps"),
                });
            }
        }
    }
    Ok(())
}

/// First result series that is not one value per snapshot, as (table, component).
fn incomplete_series(s: &LopfSolution) -> Option<(&'static str, String)> {
    let n = s.snapshots.len();
    series_tables(s)
        .into_iter()
        .flat_map(|(file, columns)| columns.into_iter().map(move |(name, v)| (file, name, v)))
        .find(|(_, _, values)| values.len() != n)
        .map(|(file, name, _)| (file, name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> LopfSolution {
        let mut s = LopfSolution {
            objective: 1234.5,
            capital_costs: 1000.0,
            marginal_costs: 234.5,
            co2_emissions: 7.25,
            snapshots: vec![Snapshot::new("0"), Snapshot::new("1")],
            ..LopfSolution::default()
        };
        s.snapshots[1].weighting = 3.0;
        s.generators.insert(
            "gas".into(),
            GeneratorResult {
                p: vec![1.0, 2.0],
                p_nom_opt: 2.0,
            },
        );
        s.links.insert(
            "hvdc".into(),
            LinkResult {
                p0: vec![3.0, -1.0],
                p1: vec![-2.9, 0.97],
                p_nom_opt: 3.0,
            },
        );
        s
    }

    #[test]
    fn summary_lists_costs() {
        let mut buf = Vec::new();
        write_summary_csv(&sample(), &mut buf).expect("summary should be written");
        let output = String::from_utf8(buf).expect("utf-8 output");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines[0], "metric,value");
        assert_eq!(lines[1], "objective,1234.5");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn nominal_table_has_one_row_per_component() {
        let mut buf = Vec::new();
        write_nominal_csv(&sample(), &mut buf).expect("nominal table should be written");
        let output = String::from_utf8(buf).expect("utf-8 output");
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(
            lines,
            vec![NOMINAL_HEADER, "Generator,gas,p_nom_opt,2", "Link,hvdc,p_nom_opt,3"]
        );
    }

    #[test]
    fn export_skips_empty_series_tables() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let dir = tmp.path().join("results");
        export_solution(&sample(), &dir).expect("solution should export");
        assert!(dir.join("summary.csv").exists());
        assert!(dir.join("snapshots.csv").exists());
        assert!(dir.join("generators-p.csv").exists());
        assert!(dir.join("links-p1.csv").exists());
        assert!(!dir.join("stores-e.csv").exists());

        let mut rdr = csv::ReaderBuilder::new()
            .from_path(dir.join("links-p0.csv"))
            .expect("links-p0.csv should open");
        let rows: Vec<csv::StringRecord> = rdr
            .records()
            .collect::<csv::Result<_>>()
            .expect("rows should parse");
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].get(1), Some("-1"));
    }

    #[test]
    fn exported_folder_reads_back_unchanged() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let solution = sample();
        export_solution(&solution, tmp.path()).expect("solution should export");
        let read = read_solution(tmp.path()).expect("solution should read back");
        assert_eq!(read, solution);
    }

    #[test]
    fn series_for_unlisted_component_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        export_solution(&sample(), tmp.path()).expect("solution should export");
        let ghost = "snapshot,ghost\n0,1\n1,2\n";
        std::fs::write(tmp.path().join("generators-p.csv"), ghost).expect("write generators-p.csv");
        assert!(matches!(
            read_solution(tmp.path()),
            Err(Error::Parse { .. })
        ));
    }

    #[test]
    fn missing_series_table_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        export_solution(&sample(), tmp.path()).expect("solution should export");
        std::fs::remove_file(tmp.path().join("links-p1.csv")).expect("remove links-p1.csv");
        let err = read_solution(tmp.path()).expect_err("incomplete results");
        assert!(err.to_string().contains("hvdc"), "{err}");
    }

    #[test]
    fn folder_without_summary_is_an_io_error() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        export_solution(&sample(), tmp.path()).expect("solution should export");
        std::fs::remove_file(tmp.path().join("summary.csv")).expect("remove summary.csv");
        assert!(matches!(read_solution(tmp.path()), Err(Error::Io { .. })));
    }
}

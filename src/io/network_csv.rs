//! Network import/export as a folder of CSV tables.

use std::path::Path;

use super::{
    SNAPSHOTS, SeriesColumn, ensure_dir, missing_table, read_rows, read_series_file, write_rows,
    write_series_file,
};
use crate::error::{Error, Result};
use crate::network::{
    Bus, Carrier, Component, ComponentKind, Dispatch, Generator, Line, Link, Load, Network,
    Snapshot, Store, StorageUnit,
};

fn table_path(dir: &Path, kind: ComponentKind) -> std::path::PathBuf {
    dir.join(format!("{}.csv", kind.table()))
}

fn series_path(dir: &Path, kind: ComponentKind, attr: &str) -> std::path::PathBuf {
    dir.join(format!("{}-{attr}.csv", kind.table()))
}

/// Applies each column of an optional series table to the component it names.
fn apply_series(
    dir: &Path,
    kind: ComponentKind,
    attr: &str,
    snapshots: &[Snapshot],
    mut apply: impl FnMut(&str, Vec<Option<f64>>) -> bool,
) -> Result<()> {
    let path = series_path(dir, kind, attr);
    if !path.exists() {
        return Ok(());
    }
    for (name, values) in read_series_file(&path, snapshots)? {
        if !apply(&name, values) {
            return Err(Error::Parse {
                path,
                message: format!("column \"{name}\" is not a {kind} (or has gaps)"),
            });
        }
    }
    Ok(())
}

/// Unwraps a series that must be complete; `None` if any cell is empty.
fn dense(values: Vec<Option<f64>>) -> Option<Vec<f64>> {
    values.into_iter().collect()
}

/// Reads a network from a folder written by [`write_network`].
///
/// `snapshots.csv` is required; every other table is optional. The folder
/// name becomes the network name.
///
/// # Errors
///
/// Returns [`Error::Csv`] or [`Error::Parse`] for malformed tables,
/// [`Error::Duplicate`] for repeated names and [`Error::InvalidNetwork`] if
/// the result fails validation.
pub fn read_network(dir: &Path) -> Result<Network> {
    let snapshots_path = dir.join(SNAPSHOTS);
    if !snapshots_path.exists() {
        return Err(missing_table(snapshots_path));
    }
    let mut network = Network {
        name: dir
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default(),
        snapshots: read_rows(&snapshots_path)?,
        ..Network::default()
    };

    let mut components: Vec<Component> = Vec::new();
    let carriers: Vec<Carrier> = read_rows(&table_path(dir, ComponentKind::Carrier))?;
    let buses: Vec<Bus> = read_rows(&table_path(dir, ComponentKind::Bus))?;
    let loads: Vec<Load> = read_rows(&table_path(dir, ComponentKind::Load))?;
    let generators: Vec<Generator> = read_rows(&table_path(dir, ComponentKind::Generator))?;
    let storage_units: Vec<StorageUnit> =
        read_rows(&table_path(dir, ComponentKind::StorageUnit))?;
    let links: Vec<Link> = read_rows(&table_path(dir, ComponentKind::Link))?;
    let stores: Vec<Store> = read_rows(&table_path(dir, ComponentKind::Store))?;
    let lines: Vec<Line> = read_rows(&table_path(dir, ComponentKind::Line))?;
    components.extend(carriers.into_iter().map(Component::from));
    components.extend(buses.into_iter().map(Component::from));
    components.extend(loads.into_iter().map(Component::from));
    components.extend(generators.into_iter().map(Component::from));
    components.extend(storage_units.into_iter().map(Component::from));
    components.extend(links.into_iter().map(Component::from));
    components.extend(stores.into_iter().map(Component::from));
    components.extend(lines.into_iter().map(Component::from));
    for component in components {
        network.add(component)?;
    }

    let snapshots = network.snapshots.clone();
    apply_series(dir, ComponentKind::Load, "p_set", &snapshots, |name, values| {
        match (network.loads.iter_mut().find(|c| c.name == name), dense(values)) {
            (Some(load), Some(v)) => {
                load.p_set = v;
                true
            }
            _ => false,
        }
    })?;
    apply_series(dir, ComponentKind::Generator, "p_max_pu", &snapshots, |name, values| {
        match (network.generators.iter_mut().find(|c| c.name == name), dense(values)) {
            (Some(g), Some(v)) => {
                g.p_max_pu_t = v;
                true
            }
            _ => false,
        }
    })?;
    apply_series(dir, ComponentKind::StorageUnit, "inflow", &snapshots, |name, values| {
        match (network.storage_units.iter_mut().find(|c| c.name == name), dense(values)) {
            (Some(su), Some(v)) => {
                su.inflow = v;
                true
            }
            _ => false,
        }
    })?;
    apply_series(
        dir,
        ComponentKind::StorageUnit,
        "state_of_charge_set",
        &snapshots,
        |name, values| match network.storage_units.iter_mut().find(|c| c.name == name) {
            Some(su) => {
                su.state_of_charge_set = values;
                true
            }
            None => false,
        },
    )?;

    network.validate()?;
    log::info!(
        "read network \"{}\" from {}: {} snapshots, {} buses, {} generators, {} storage units",
        network.name,
        dir.display(),
        network.snapshot_count(),
        network.buses.len(),
        network.generators.len(),
        network.storage_units.len()
    );
    Ok(network)
}

/// Writes `network` as a folder of CSV tables, creating `dir` if needed.
///
/// Empty component tables are written as empty files; series tables are only
/// written when at least one component carries that series.
///
/// # Errors
///
/// Returns [`Error::Io`] or [`Error::Csv`] if a file cannot be written.
pub fn write_network(network: &Network, dir: &Path) -> Result<()> {
    ensure_dir(dir)?;
    write_rows(&dir.join(SNAPSHOTS), &network.snapshots)?;
    write_rows(&table_path(dir, ComponentKind::Carrier), &network.carriers)?;
    write_rows(&table_path(dir, ComponentKind::Bus), &network.buses)?;
    write_rows(&table_path(dir, ComponentKind::Load), &network.loads)?;
    write_rows(&table_path(dir, ComponentKind::Generator), &network.generators)?;
    write_rows(&table_path(dir, ComponentKind::StorageUnit), &network.storage_units)?;
    write_rows(&table_path(dir, ComponentKind::Link), &network.links)?;
    write_rows(&table_path(dir, ComponentKind::Store), &network.stores)?;
    write_rows(&table_path(dir, ComponentKind::Line), &network.lines)?;

    let some = |v: &[f64]| v.iter().copied().map(Some).collect::<Vec<_>>();

    let p_set: Vec<SeriesColumn> = network
        .loads
        .iter()
        .map(|c| (c.name.clone(), some(&c.p_set)))
        .collect();
    let p_max_pu: Vec<SeriesColumn> = network
        .generators
        .iter()
        .filter(|g| g.dispatch == Dispatch::Variable && !g.p_max_pu_t.is_empty())
        .map(|g| (g.name.clone(), some(&g.p_max_pu_t)))
        .collect();
    let inflow: Vec<SeriesColumn> = network
        .storage_units
        .iter()
        .filter(|su| !su.inflow.is_empty())
        .map(|su| (su.name.clone(), some(&su.inflow)))
        .collect();
    let soc_set: Vec<SeriesColumn> = network
        .storage_units
        .iter()
        .filter(|su| su.state_of_charge_set.iter().any(Option::is_some))
        .map(|su| (su.name.clone(), su.state_of_charge_set.clone()))
        .collect();

    for (kind, attr, columns) in [
        (ComponentKind::Load, "p_set", p_set),
        (ComponentKind::Generator, "p_max_pu", p_max_pu),
        (ComponentKind::StorageUnit, "inflow", inflow),
        (ComponentKind::StorageUnit, "state_of_charge_set", soc_set),
    ] {
        if !columns.is_empty() {
            write_series_file(&series_path(dir, kind, attr), &network.snapshots, &columns)?;
        }
    }
    log::info!("wrote network \"{}\" to {}", network.name, dir.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Network {
        let mut n = Network::with_snapshots("sample", 3);
        n.snapshots[2].weighting = 2.0;
        n.add(Bus {
            name: "AC0".into(),
            ..Bus::default()
        })
        .expect("add Bus AC0");
        n.add(Load {
            name: "demand".into(),
            bus: "AC0".into(),
            p_set: vec![10.0, 12.5, 9.0],
        })
        .expect("add Load demand");
        n.add(Generator {
            name: "wind".into(),
            bus: "AC0".into(),
            dispatch: Dispatch::Variable,
            p_nom: 30.0,
            p_max_pu_t: vec![0.1, 0.2, 0.3],
            ..Generator::default()
        })
        .expect("add Generator wind");
        n.add(StorageUnit {
            name: "hydro".into(),
            bus: "AC0".into(),
            p_nom: 5.0,
            inflow: vec![1.0, 0.0, 2.0],
            state_of_charge_set: vec![None, Some(4.0), None],
            ..StorageUnit::default()
        })
        .expect("add StorageUnit hydro");
        n
    }

    #[test]
    fn folder_round_trip_keeps_series_and_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let dir = tmp.path().join("sample");
        let n = sample();
        write_network(&n, &dir).expect("network should be written");

        let read = read_network(&dir).expect("network should read back");
        assert_eq!(read.name, "sample");
        assert_eq!(read.snapshots, n.snapshots);
        assert_eq!(read.loads, n.loads);
        assert_eq!(read.generators, n.generators);
        assert_eq!(read.storage_units, n.storage_units);
        assert!(read.generators[0].p_nom_max.is_infinite());
    }

    #[test]
    fn missing_snapshots_table_is_an_error() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        assert!(matches!(read_network(tmp.path()), Err(Error::Io { .. })));
    }

    #[test]
    fn series_for_unknown_component_is_rejected() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let dir = tmp.path();
        write_network(&sample(), dir).expect("network should be written");
        let ghost = "snapshot,ghost\n0,1\n1,1\n2,1\n";
        std::fs::write(dir.join("loads-p_set.csv"), ghost).expect("write loads-p_set.csv");
        assert!(matches!(read_network(dir), Err(Error::Parse { .. })));
    }

    #[test]
    fn optional_columns_fall_back_to_defaults() {
        let tmp = tempfile::tempdir().expect("tempdir should be created");
        let dir = tmp.path();
        std::fs::write(dir.join("snapshots.csv"), "name\nnow\n").expect("write snapshots.csv");
        std::fs::write(dir.join("buses.csv"), "name\nAC0\n").expect("write buses.csv");
        let generators = "name,bus,p_nom\ngas,AC0,50\n";
        std::fs::write(dir.join("generators.csv"), generators).expect("write generators.csv");
        let n = read_network(dir).expect("network should read back");
        assert_eq!(n.snapshots[0].weighting, 1.0);
        assert_eq!(n.buses[0].carrier, "AC");
        assert_eq!(n.generators[0].efficiency, 1.0);
        assert_eq!(n.generators[0].p_nom, 50.0);
    }
}

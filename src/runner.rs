//! Reference solve, replacements and checks for one run configuration.

use std::fmt;
use std::path::Path;
use std::time::Instant;

use crate::check::{
    CheckReport, Tolerances, check_generator_replacement, check_storage_unit_replacement,
};
use crate::config::RunConfig;
use crate::error::{Error, Result};
use crate::io::read_solution;
use crate::lopf::{self, LopfOptions, LopfSolution};
use crate::network::{Network, Snapshot};
use crate::replace::{replace_generator, replace_storage_unit};

/// A replaced network's solution and how it compared to the reference.
#[derive(Debug, Clone)]
pub struct ReplacementOutcome {
    pub report: CheckReport,
    pub solution: LopfSolution,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub network: String,
    pub reference: LopfSolution,
    pub replacements: Vec<ReplacementOutcome>,
}

impl RunReport {
    /// True when every check of every replacement passed.
    pub fn passed(&self) -> bool {
        self.replacements.iter().all(|r| r.report.passed())
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Network: {}", self.network)?;
        writeln!(f, "{}", self.reference)?;
        for r in &self.replacements {
            writeln!(f, "{}", r.report)?;
        }
        write!(
            f,
            "{}/{} replacements reproduce the reference",
            self.replacements.iter().filter(|r| r.report.passed()).count(),
            self.replacements.len()
        )
    }
}

/// Replaces generator `name` in a copy of `network`, re-solves and compares.
///
/// # Errors
///
/// Propagates replacement, solver and lookup errors.
pub fn check_generator(
    network: &Network,
    reference: &LopfSolution,
    name: &str,
    options: &LopfOptions,
    tol: &Tolerances,
) -> Result<ReplacementOutcome> {
    let original = network.generator(name)?.clone();
    let mut replaced = network.clone();
    let names = replace_generator(&mut replaced, name)?;
    let solution = lopf::solve(&replaced, options)?;
    let report = check_generator_replacement(reference, &solution, &original, &names, tol)?;
    Ok(ReplacementOutcome { report, solution })
}

/// Replaces storage unit `name` in a copy of `network`, re-solves with the
/// sizing constraints the replacement returned, and compares.
///
/// # Errors
///
/// Propagates replacement, solver and lookup errors.
pub fn check_storage_unit(
    network: &Network,
    reference: &LopfSolution,
    name: &str,
    options: &LopfOptions,
    tol: &Tolerances,
) -> Result<ReplacementOutcome> {
    let original = network.storage_unit(name)?.clone();
    let mut replaced = network.clone();
    let names = replace_storage_unit(&mut replaced, name)?;
    let options = options
        .clone()
        .with_extra_constraints(names.extra_constraints.iter().cloned());
    let solution = lopf::solve(&replaced, &options)?;
    let report = check_storage_unit_replacement(reference, &solution, &original, &names, tol)?;
    Ok(ReplacementOutcome { report, solution })
}

/// Reads stored reference results for `network` from `dir`.
///
/// # Errors
///
/// Propagates read errors, and returns [`Error::Parse`] if the results cover
/// other snapshots than the network.
pub fn stored_reference(network: &Network, dir: &Path) -> Result<LopfSolution> {
    let reference = read_solution(dir)?;
    let names = |snapshots: &[Snapshot]| -> Vec<String> {
        snapshots.iter().map(|s| s.name.clone()).collect()
    };
    if names(&reference.snapshots) != names(&network.snapshots) {
        return Err(Error::Parse {
            path: dir.to_path_buf(),
            message: format!(
                "results cover {} snapshots that differ from the {} of network \"{}\"",
                reference.snapshots.len(),
                network.snapshot_count(),
                network.name
            ),
        });
    }
    log::info!("using stored reference results from {}", dir.display());
    Ok(reference)
}

/// Runs `config` against `network`: the reference (solved, or read from
/// `network.reference` when set), then one solve per configured replacement,
/// each on its own copy.
///
/// # Errors
///
/// Returns the first error from any solve, replacement or check. A check
/// that runs but fails is not an error; see [`RunReport::passed`].
pub fn run_on(network: &Network, config: &RunConfig) -> Result<RunReport> {
    let start = Instant::now();
    let options = config.lopf.options();
    let reference = match &config.network.reference {
        Some(dir) => stored_reference(network, dir)?,
        None => lopf::solve(network, &options)?,
    };

    let mut replacements = Vec::new();
    for name in &config.replace.generators {
        replacements.push(check_generator(
            network,
            &reference,
            name,
            &options,
            &config.tolerance,
        )?);
    }
    for name in &config.replace.storage_units {
        replacements.push(check_storage_unit(
            network,
            &reference,
            name,
            &options,
            &config.tolerance,
        )?);
    }

    let report = RunReport {
        network: network.name.clone(),
        reference,
        replacements,
    };
    log::info!(
        "run on \"{}\" finished in {:.2?}: {}",
        report.network,
        start.elapsed(),
        if report.passed() { "all checks passed" } else { "checks failed" }
    );
    Ok(report)
}

/// Loads the configured network and runs [`run_on`].
///
/// The configuration is assumed valid; call [`RunConfig::validate`] first.
///
/// # Errors
///
/// Propagates network loading errors and those of [`run_on`].
pub fn run(config: &RunConfig) -> Result<RunReport> {
    let network = config.network.load()?;
    run_on(&network, config)
}

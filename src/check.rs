//! Equivalence checks between a reference LOPF and one solved after a replacement.
//!
//! Each check compares a scalar or a series from the reference solution with
//! its counterpart in the replaced network and records the worst absolute
//! deviation, so a failing run says how far off it was.

use std::fmt;

use serde::Deserialize;

use crate::error::Result;
use crate::lopf::LopfSolution;
use crate::network::{Generator, StorageUnit};
use crate::replace::{GeneratorReplacement, StorageUnitReplacement};

/// How close two numbers must be to count as equal.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Tolerance {
    /// `|a - b| < 1.5 * 10^-places`.
    Decimal { places: i32 },
    /// `|a - b| <= atol + rtol * |expected|`.
    AllClose { rtol: f64, atol: f64 },
}

impl Tolerance {
    pub fn accepts(&self, actual: f64, expected: f64) -> bool {
        let diff = (actual - expected).abs();
        match *self {
            Tolerance::Decimal { places } => diff < 1.5 * 10f64.powi(-places),
            Tolerance::AllClose { rtol, atol } => diff <= atol + rtol * expected.abs(),
        }
    }
}

impl fmt::Display for Tolerance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tolerance::Decimal { places } => write!(f, "{places} decimals"),
            Tolerance::AllClose { rtol, atol } => write!(f, "rtol={rtol:e} atol={atol:e}"),
        }
    }
}

/// Tolerances for the three kinds of quantity a check compares.
///
/// Defaults are loose enough for an interior-point solve of two equivalent
/// LPs and tight enough to catch a wrong efficiency factor.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Tolerances {
    pub objective: Tolerance,
    /// Dispatch and energy series.
    pub series: Tolerance,
    /// Optimised nominal capacities.
    pub size: Tolerance,
}

impl Default for Tolerances {
    fn default() -> Self {
        Self {
            objective: Tolerance::AllClose {
                rtol: 1e-6,
                atol: 1e-4,
            },
            series: Tolerance::Decimal { places: 3 },
            size: Tolerance::AllClose {
                rtol: 1e-5,
                atol: 1e-3,
            },
        }
    }
}

/// Result of a single comparison.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub name: String,
    pub passed: bool,
    /// Largest absolute difference seen.
    pub max_deviation: f64,
    pub tolerance: Tolerance,
}

/// All comparisons made for one replaced component.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckReport {
    /// The component that was replaced, e.g. `Generator "Gas 0"`.
    pub subject: String,
    pub outcomes: Vec<CheckOutcome>,
}

impl CheckReport {
    fn new(subject: String) -> Self {
        Self {
            subject,
            outcomes: Vec::new(),
        }
    }

    pub fn passed(&self) -> bool {
        self.outcomes.iter().all(|o| o.passed)
    }

    pub fn outcome(&self, name: &str) -> Option<&CheckOutcome> {
        self.outcomes.iter().find(|o| o.name == name)
    }

    fn scalar(&mut self, name: &str, actual: f64, expected: f64, tolerance: Tolerance) {
        self.series(name, &[actual], &[expected], tolerance);
    }

    fn series(&mut self, name: &str, actual: &[f64], expected: &[f64], tolerance: Tolerance) {
        let mut passed = actual.len() == expected.len();
        let mut max_deviation: f64 = 0.0;
        for (a, e) in actual.iter().zip(expected) {
            max_deviation = max_deviation.max((a - e).abs());
            passed &= tolerance.accepts(*a, *e);
        }
        if !passed {
            log::warn!(
                "{}: check \"{name}\" failed, max deviation {max_deviation:e} ({tolerance})",
                self.subject
            );
        }
        self.outcomes.push(CheckOutcome {
            name: name.to_string(),
            passed,
            max_deviation,
            tolerance,
        });
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- Replacement Check: {} ---", self.subject)?;
        for o in &self.outcomes {
            writeln!(
                f,
                "[{}] {:<28} max deviation {:>10.3e}  ({})",
                if o.passed { "ok" } else { "FAIL" },
                o.name,
                o.max_deviation,
                o.tolerance
            )?;
        }
        write!(f, "Result: {}", if self.passed() { "PASSED" } else { "FAILED" })
    }
}

/// Compares a reference solve against one where `generator` was replaced.
///
/// # Arguments
///
/// * `reference` - solution of the unmodified network
/// * `replaced` - solution after [`replace_generator`](crate::replace::replace_generator)
/// * `generator` - the generator as it was before replacement
/// * `names` - components returned by the replacement
/// * `tol` - tolerances per quantity
///
/// # Errors
///
/// Returns [`Error::NotFound`](crate::Error::NotFound) if either solution lacks
/// one of the compared components.
pub fn check_generator_replacement(
    reference: &LopfSolution,
    replaced: &LopfSolution,
    generator: &Generator,
    names: &GeneratorReplacement,
    tol: &Tolerances,
) -> Result<CheckReport> {
    let gen_ref = reference.generator(&generator.name)?;
    let link = replaced.link(&names.link)?;

    let mut report = CheckReport::new(format!("Generator \"{}\"", generator.name));
    report.scalar("objective", replaced.objective, reference.objective, tol.objective);

    let delivered: Vec<f64> = link.p1.iter().map(|p| -p).collect();
    report.series("dispatch", &delivered, &gen_ref.p, tol.series);

    report.scalar(
        "p_nom_opt",
        link.p_nom_opt * generator.efficiency,
        gen_ref.p_nom_opt,
        tol.size,
    );
    Ok(report)
}

/// Compares a reference solve against one where `storage_unit` was replaced.
///
/// Checks the objective, that the store follows the state of charge, that
/// the two links together reproduce the unit's net output, and that both
/// link capacities map back to the unit's `p_nom_opt`.
///
/// # Errors
///
/// Returns [`Error::NotFound`](crate::Error::NotFound) if either solution lacks
/// one of the compared components.
pub fn check_storage_unit_replacement(
    reference: &LopfSolution,
    replaced: &LopfSolution,
    storage_unit: &StorageUnit,
    names: &StorageUnitReplacement,
    tol: &Tolerances,
) -> Result<CheckReport> {
    let su_ref = reference.storage_unit(&storage_unit.name)?;
    let store = replaced.store(&names.store)?;
    let dispatch = replaced.link(&names.dispatch_link)?;
    let charge = replaced.link(&names.store_link)?;

    let mut report = CheckReport::new(format!("StorageUnit \"{}\"", storage_unit.name));
    report.scalar("objective", replaced.objective, reference.objective, tol.objective);
    report.series("state_of_charge", &store.e, &su_ref.state_of_charge, tol.series);

    let net: Vec<f64> = dispatch
        .p1
        .iter()
        .zip(&charge.p0)
        .map(|(p1, p0)| -p1 - p0)
        .collect();
    report.series("dispatch", &net, &su_ref.p, tol.series);

    report.scalar("p_nom_opt (store link)", charge.p_nom_opt, su_ref.p_nom_opt, tol.size);
    report.scalar(
        "p_nom_opt (dispatch link)",
        dispatch.p_nom_opt * storage_unit.efficiency_dispatch,
        su_ref.p_nom_opt,
        tol.size,
    );
    Ok(report)
}

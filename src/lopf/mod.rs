//! Linear optimal power flow (LOPF) over all snapshots of a [`Network`].
//!
//! The whole horizon is one linear program: dispatch and storage levels per
//! snapshot, plus a capacity variable for every extendable component. The
//! objective is weighted marginal cost plus capital cost of extendable
//! capacity. Line flows follow the linearised power flow, expressed either
//! with voltage angles or with a cycle basis of the line graph.

pub mod constraints;
mod model;
pub mod solution;

use std::time::Instant;

use clap::ValueEnum;
use serde::Deserialize;

pub use constraints::{ExtraConstraint, NominalRef};
pub use solution::{
    GeneratorResult, LineResult, LinkResult, LopfSolution, StorageUnitResult, StoreResult,
};

use crate::error::Result;
use crate::network::Network;

/// How Kirchhoff's voltage law is imposed on AC lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Formulation {
    /// Voltage-angle variable per bus, one slack per sub-network.
    #[default]
    Angles,
    /// Zero weighted flow sum around every independent cycle.
    Kirchhoff,
}

/// Options for a single LOPF run.
#[derive(Debug, Clone, Default)]
pub struct LopfOptions {
    pub formulation: Formulation,
    /// Upper bound on total CO2 emissions (t).
    pub co2_limit: Option<f64>,
    pub extra_constraints: Vec<ExtraConstraint>,
}

impl LopfOptions {
    pub fn with_formulation(mut self, formulation: Formulation) -> Self {
        self.formulation = formulation;
        self
    }

    pub fn with_co2_limit(mut self, limit: f64) -> Self {
        self.co2_limit = Some(limit);
        self
    }

    pub fn with_extra_constraints(
        mut self,
        extra: impl IntoIterator<Item = ExtraConstraint>,
    ) -> Self {
        self.extra_constraints.extend(extra);
        self
    }
}

/// Solves the LOPF for every snapshot of `network`.
///
/// # Errors
///
/// Returns [`Error::InvalidNetwork`](crate::Error::InvalidNetwork) if the network
/// fails validation or an extra constraint is malformed, and
/// [`Error::Solver`](crate::Error::Solver) if the LP is infeasible or unbounded.
pub fn solve(network: &Network, options: &LopfOptions) -> Result<LopfSolution> {
    network.validate()?;
    log::info!(
        "solving LOPF for \"{}\": {} snapshots, {} buses, {:?} formulation",
        network.name,
        network.snapshot_count(),
        network.buses.len(),
        options.formulation
    );
    let start = Instant::now();
    let solution = model::build_and_solve(network, options)?;
    log::info!(
        "LOPF objective {:.4} (capital {:.4}, marginal {:.4}) in {:.2?}",
        solution.objective,
        solution.capital_costs,
        solution.marginal_costs,
        start.elapsed()
    );
    Ok(solution)
}

//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use lopf_sim::config::{ConfigError, RunConfig};
use lopf_sim::lopf::Formulation;

/// Linear optimal power flow with generator and storage-unit replacement checks.
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Solve the LOPF and print costs and optimised capacities.
    Solve(SolveArgs),

    /// Replace components, re-solve and check the results are unchanged.
    Check(CheckArgs),

    /// Write the configured network as a folder of CSV tables.
    ExportNetwork(ExportArgs),
}

/// Where the run configuration and network come from.
#[derive(Debug, Args)]
pub struct SourceArgs {
    /// Run configuration file (TOML).
    #[arg(long, conflicts_with = "preset")]
    pub config: Option<PathBuf>,

    /// Built-in preset (storage-hvdc, ac-dc-meshed).
    #[arg(long)]
    pub preset: Option<String>,

    /// Read the network from a CSV folder instead of the configured source.
    #[arg(long)]
    pub network: Option<PathBuf>,

    /// Override the random seed of a preset network.
    #[arg(long)]
    pub seed: Option<u64>,

    /// LOPF formulation.
    #[arg(long, value_enum)]
    pub formulation: Option<Formulation>,

    /// Upper bound on total CO2 emissions (t).
    #[arg(long)]
    pub co2_limit: Option<f64>,
}

#[derive(Debug, Args)]
pub struct SolveArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Export the solution as CSV tables into this folder.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct CheckArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Generator to replace (repeatable); overrides the configured list.
    #[arg(long = "generator")]
    pub generators: Vec<String>,

    /// Storage unit to replace (repeatable); overrides the configured list.
    #[arg(long = "storage-unit")]
    pub storage_units: Vec<String>,

    /// Check against stored results (a folder written by `solve --out`)
    /// instead of solving the reference.
    #[arg(long)]
    pub reference: Option<PathBuf>,

    /// Export reference and replaced solutions into this folder.
    #[arg(short, long)]
    pub out: Option<PathBuf>,
}

#[derive(Debug, Args)]
pub struct ExportArgs {
    #[command(flatten)]
    pub source: SourceArgs,

    /// Output folder.
    #[arg(required = true)]
    pub out: PathBuf,
}

impl SourceArgs {
    /// Builds the run configuration: `--config` file, else `--preset`, else
    /// the default, with command-line overrides applied on top.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file or preset cannot be loaded.
    pub fn resolve(&self) -> Result<RunConfig, ConfigError> {
        let mut cfg = if let Some(path) = &self.config {
            RunConfig::from_toml_file(path)?
        } else if let Some(name) = &self.preset {
            RunConfig::from_preset(name)?
        } else {
            RunConfig::default()
        };

        if let Some(path) = &self.network {
            cfg.network.path = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            cfg.network.seed = seed;
        }
        if let Some(formulation) = self.formulation {
            cfg.lopf.formulation = formulation;
        }
        if let Some(limit) = self.co2_limit {
            cfg.lopf.co2_limit = Some(limit);
        }
        Ok(cfg)
    }
}

//! Crate-wide error type.

use std::path::PathBuf;

use thiserror::Error;

use crate::network::ComponentKind;

/// Errors raised while editing, solving, or loading a network.
#[derive(Debug, Error)]
pub enum Error {
    /// A component with the same kind and name is already present.
    #[error("{kind} \"{name}\" already exists")]
    Duplicate { kind: ComponentKind, name: String },

    /// The requested component does not exist.
    #[error("{kind} \"{name}\" not found")]
    NotFound { kind: ComponentKind, name: String },

    /// The network failed validation before solving.
    #[error("invalid network: {0}")]
    InvalidNetwork(String),

    /// A replacement was requested for a modelling case it cannot express.
    #[error("cannot replace {kind} \"{name}\": {reason}")]
    Unsupported {
        kind: ComponentKind,
        name: String,
        reason: String,
    },

    /// The LP solver did not return an optimal solution.
    #[error("LOPF solver failed: {0}")]
    Solver(#[from] good_lp::ResolutionError),

    #[error("I/O error on \"{}\": {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error in \"{}\": {source}", .path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// A value in a CSV table could not be parsed.
    #[error("bad value in \"{}\": {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

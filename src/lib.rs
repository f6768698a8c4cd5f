//! Linear optimal power flow over a small multi-period network model, and
//! replacement of generators and storage units by buses, links and stores
//! with checks that the optimum is unchanged.

pub mod check;
pub mod config;
pub mod error;
pub mod io;
pub mod lopf;
pub mod network;
pub mod presets;
pub mod replace;
pub mod runner;

pub use error::{Error, Result};

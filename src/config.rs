//! TOML-based run configuration and preset definitions.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::check::{Tolerance, Tolerances};
use crate::error::Result;
use crate::lopf::{Formulation, LopfOptions};
use crate::network::Network;
use crate::presets;

/// Top-level run configuration parsed from TOML.
///
/// All fields have defaults matching the `storage-hvdc` preset. Load from
/// TOML with [`RunConfig::from_toml_file`] or use [`RunConfig::from_preset`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    /// Which network to load.
    #[serde(default)]
    pub network: NetworkConfig,
    /// LOPF formulation and global constraints.
    #[serde(default)]
    pub lopf: LopfConfig,
    /// Components to replace, each checked on its own copy of the network.
    #[serde(default)]
    pub replace: ReplaceConfig,
    /// Tolerances for the equivalence checks.
    #[serde(default)]
    pub tolerance: Tolerances,
}

/// Network source: a CSV folder, or a built-in preset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkConfig {
    /// Name of a built-in network (see [`presets::PRESETS`]).
    pub preset: String,
    /// CSV folder to read instead of the preset.
    pub path: Option<PathBuf>,
    /// Seed for the preset's load and wind profiles.
    pub seed: u64,
    /// Stored LOPF results to check against instead of solving the reference.
    pub reference: Option<PathBuf>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            preset: "storage-hvdc".to_string(),
            path: None,
            seed: 42,
            reference: None,
        }
    }
}

impl NetworkConfig {
    /// Reads the CSV folder if `path` is set, otherwise builds the preset.
    ///
    /// # Errors
    ///
    /// Propagates I/O, parse and validation errors from the source.
    pub fn load(&self) -> Result<Network> {
        match &self.path {
            Some(path) => crate::io::read_network(path),
            None => presets::from_preset(&self.preset, self.seed),
        }
    }
}

/// LOPF formulation and global constraints.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LopfConfig {
    /// `"angles"` or `"kirchhoff"`.
    pub formulation: Formulation,
    /// Upper bound on total CO2 emissions (t); none when absent.
    pub co2_limit: Option<f64>,
}

impl LopfConfig {
    pub fn options(&self) -> LopfOptions {
        LopfOptions {
            formulation: self.formulation,
            co2_limit: self.co2_limit,
            extra_constraints: Vec::new(),
        }
    }
}

/// Components to replace.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ReplaceConfig {
    /// Generator names.
    pub generators: Vec<String>,
    /// Storage unit names.
    pub storage_units: Vec<String>,
}

/// Configuration error with field path and constraint description.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("config error: {field}: {message}")]
pub struct ConfigError {
    /// Dotted field path (e.g., `"network.preset"`).
    pub field: String,
    /// Human-readable constraint description.
    pub message: String,
}

impl RunConfig {
    /// Returns the storage-HVDC preset: replaces a gas generator and an
    /// extendable battery in two AC areas joined by HVDC.
    pub fn storage_hvdc() -> Self {
        Self {
            network: NetworkConfig::default(),
            lopf: LopfConfig {
                formulation: Formulation::Kirchhoff,
                co2_limit: None,
            },
            replace: ReplaceConfig {
                generators: vec!["Gas 0".to_string()],
                storage_units: vec!["Storage 0".to_string()],
            },
            tolerance: Tolerances::default(),
        }
    }

    /// Returns the AC-DC meshed preset: replaces the Frankfurt gas plant and
    /// the Norwegian hydro unit.
    pub fn ac_dc_meshed() -> Self {
        Self {
            network: NetworkConfig {
                preset: "ac-dc-meshed".to_string(),
                ..NetworkConfig::default()
            },
            lopf: LopfConfig::default(),
            replace: ReplaceConfig {
                generators: vec!["Frankfurt Gas".to_string()],
                storage_units: vec!["Norway Hydro".to_string()],
            },
            tolerance: Tolerances::default(),
        }
    }

    /// Available preset names.
    pub const PRESETS: &[&str] = presets::PRESETS;

    /// Loads a run configuration from a named preset.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the preset name is unknown.
    pub fn from_preset(name: &str) -> Result<Self, ConfigError> {
        match name {
            "storage-hvdc" => Ok(Self::storage_hvdc()),
            "ac-dc-meshed" => Ok(Self::ac_dc_meshed()),
            _ => Err(ConfigError {
                field: "preset".to_string(),
                message: format!(
                    "unknown preset \"{name}\", available: {}",
                    Self::PRESETS.join(", ")
                ),
            }),
        }
    }

    /// Parses a run configuration from a TOML file.
    ///
    /// Relative `network.path` and `network.reference` values are resolved
    /// against the file's folder.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the file cannot be read or the TOML is invalid.
    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError {
            field: "config".to_string(),
            message: format!("cannot read \"{}\": {e}", path.display()),
        })?;
        let mut cfg = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            for folder in [&mut cfg.network.path, &mut cfg.network.reference] {
                if let Some(p) = folder.as_mut().filter(|p| p.is_relative()) {
                    *p = base.join(&*p);
                }
            }
        }
        Ok(cfg)
    }

    /// Parses a run configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the TOML is invalid or contains unknown fields.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(|e| ConfigError {
            field: "toml".to_string(),
            message: e.to_string(),
        })
    }

    /// Validates all fields and returns a list of errors.
    ///
    /// Returns an empty vector if configuration is valid.
    pub fn validate(&self) -> Vec<ConfigError> {
        let mut errors = Vec::new();

        let net = &self.network;
        if net.path.is_none() && !presets::PRESETS.contains(&net.preset.as_str()) {
            errors.push(ConfigError {
                field: "network.preset".into(),
                message: format!(
                    "unknown preset \"{}\", available: {}",
                    net.preset,
                    presets::PRESETS.join(", ")
                ),
            });
        }

        if let Some(limit) = self.lopf.co2_limit {
            if !(limit >= 0.0) {
                errors.push(ConfigError {
                    field: "lopf.co2_limit".into(),
                    message: "must be >= 0".into(),
                });
            }
        }

        for (field, names) in [
            ("replace.generators", &self.replace.generators),
            ("replace.storage_units", &self.replace.storage_units),
        ] {
            let mut seen = HashSet::new();
            for name in names {
                if name.trim().is_empty() {
                    errors.push(ConfigError {
                        field: field.into(),
                        message: "names must not be empty".into(),
                    });
                } else if !seen.insert(name) {
                    errors.push(ConfigError {
                        field: field.into(),
                        message: format!("\"{name}\" listed twice"),
                    });
                }
            }
        }

        let tol = &self.tolerance;
        for (field, t) in [
            ("tolerance.objective", tol.objective),
            ("tolerance.series", tol.series),
            ("tolerance.size", tol.size),
        ] {
            match t {
                Tolerance::Decimal { places } if !(0..=15).contains(&places) => {
                    errors.push(ConfigError {
                        field: field.into(),
                        message: format!("places must be in [0, 15], got {places}"),
                    });
                }
                Tolerance::AllClose { rtol, atol } if !(rtol >= 0.0 && atol >= 0.0) => {
                    errors.push(ConfigError {
                        field: field.into(),
                        message: "rtol and atol must be >= 0".into(),
                    });
                }
                _ => {}
            }
        }

        errors
    }
}

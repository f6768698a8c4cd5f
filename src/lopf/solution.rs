//! Solved dispatch, sizes and costs.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};
use crate::network::{ComponentKind, Snapshot};

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeneratorResult {
    /// Electrical output per snapshot (MW).
    pub p: Vec<f64>,
    pub p_nom_opt: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StorageUnitResult {
    /// Net output, `p_dispatch - p_store` (MW).
    pub p: Vec<f64>,
    pub p_dispatch: Vec<f64>,
    pub p_store: Vec<f64>,
    /// Energy at the end of each snapshot (MWh).
    pub state_of_charge: Vec<f64>,
    pub spill: Vec<f64>,
    pub p_nom_opt: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkResult {
    /// Withdrawal at `bus0` (MW).
    pub p0: Vec<f64>,
    /// Injection at `bus1` as a withdrawal, i.e. `-efficiency * p0`.
    pub p1: Vec<f64>,
    pub p_nom_opt: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreResult {
    /// Energy at the end of each snapshot (MWh).
    pub e: Vec<f64>,
    /// Power delivered to the bus (MW).
    pub p: Vec<f64>,
    pub e_nom_opt: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineResult {
    /// Flow from `bus0` to `bus1` (MW).
    pub p0: Vec<f64>,
    pub s_nom_opt: f64,
}

/// Result of a successful LOPF solve.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LopfSolution {
    /// Total system cost: `capital_costs + marginal_costs`.
    pub objective: f64,
    /// Annualised investment in extendable capacity.
    pub capital_costs: f64,
    /// Weighted operating costs.
    pub marginal_costs: f64,
    /// Total CO2 emitted (t).
    pub co2_emissions: f64,
    pub snapshots: Vec<Snapshot>,
    pub generators: BTreeMap<String, GeneratorResult>,
    pub storage_units: BTreeMap<String, StorageUnitResult>,
    pub links: BTreeMap<String, LinkResult>,
    pub stores: BTreeMap<String, StoreResult>,
    pub lines: BTreeMap<String, LineResult>,
}

fn lookup<'a, T>(map: &'a BTreeMap<String, T>, kind: ComponentKind, name: &str) -> Result<&'a T> {
    map.get(name).ok_or_else(|| Error::NotFound {
        kind,
        name: name.to_string(),
    })
}

impl LopfSolution {
    pub fn generator(&self, name: &str) -> Result<&GeneratorResult> {
        lookup(&self.generators, ComponentKind::Generator, name)
    }

    pub fn storage_unit(&self, name: &str) -> Result<&StorageUnitResult> {
        lookup(&self.storage_units, ComponentKind::StorageUnit, name)
    }

    pub fn link(&self, name: &str) -> Result<&LinkResult> {
        lookup(&self.links, ComponentKind::Link, name)
    }

    pub fn store(&self, name: &str) -> Result<&StoreResult> {
        lookup(&self.stores, ComponentKind::Store, name)
    }

    pub fn line(&self, name: &str) -> Result<&LineResult> {
        lookup(&self.lines, ComponentKind::Line, name)
    }
}

impl fmt::Display for LopfSolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "--- LOPF Solution ---")?;
        writeln!(f, "Objective:        {:.4}", self.objective)?;
        writeln!(f, "  capital costs:  {:.4}", self.capital_costs)?;
        writeln!(f, "  marginal costs: {:.4}", self.marginal_costs)?;
        writeln!(f, "CO2 emissions:    {:.4} t", self.co2_emissions)?;
        for (name, g) in &self.generators {
            let energy: f64 = g.p.iter().zip(&self.snapshots).map(|(p, s)| p * s.weighting).sum();
            writeln!(
                f,
                "Generator {name:<24} p_nom_opt={:>10.3}  energy={:>12.3} MWh",
                g.p_nom_opt, energy
            )?;
        }
        for (name, su) in &self.storage_units {
            writeln!(f, "StorageUnit {name:<22} p_nom_opt={:>10.3}", su.p_nom_opt)?;
        }
        for (name, l) in &self.links {
            writeln!(f, "Link {name:<29} p_nom_opt={:>10.3}", l.p_nom_opt)?;
        }
        for (name, s) in &self.stores {
            writeln!(f, "Store {name:<28} e_nom_opt={:>10.3}", s.e_nom_opt)?;
        }
        for (name, l) in &self.lines {
            writeln!(f, "Line {name:<29} s_nom_opt={:>10.3}", l.s_nom_opt)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_component_is_not_found() {
        let sol = LopfSolution::default();
        assert!(matches!(
            sol.link("nope"),
            Err(Error::NotFound {
                kind: ComponentKind::Link,
                ..
            })
        ));
    }

    #[test]
    fn display_lists_components() {
        let mut sol = LopfSolution {
            objective: 12.5,
            snapshots: vec![Snapshot::new("0")],
            ..LopfSolution::default()
        };
        sol.generators.insert(
            "gas".into(),
            GeneratorResult {
                p: vec![3.0],
                p_nom_opt: 10.0,
            },
        );
        let s = sol.to_string();
        assert!(s.contains("Objective:        12.5000"));
        assert!(s.contains("Generator gas"));
    }
}

//! In-memory power-network model: buses, generators, storage, links, stores and lines.

pub mod components;
/// Sub-network detection and cycle bases over the AC line graph.
pub mod topology;

pub use components::{
    Bus, Carrier, Component, ComponentKind, Dispatch, Generator, Line, Link, Load, Snapshot, Store,
    StorageUnit,
};
pub use topology::SubNetwork;

use crate::error::{Error, Result};

/// A multi-period network, edited in place and handed to the LOPF.
///
/// Names are unique per component kind. Series attached to components must
/// have one entry per snapshot (or be empty where the attribute is optional).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Network {
    pub name: String,
    pub snapshots: Vec<Snapshot>,
    pub carriers: Vec<Carrier>,
    pub buses: Vec<Bus>,
    pub loads: Vec<Load>,
    pub generators: Vec<Generator>,
    pub storage_units: Vec<StorageUnit>,
    pub links: Vec<Link>,
    pub stores: Vec<Store>,
    pub lines: Vec<Line>,
}

fn position<T>(items: &[T], name: &str, name_of: impl Fn(&T) -> &str) -> Option<usize> {
    items.iter().position(|c| name_of(c) == name)
}

impl Network {
    /// Creates an empty network with `n` unit-weighted snapshots named `0..n`.
    pub fn with_snapshots(name: impl Into<String>, n: usize) -> Self {
        Self {
            name: name.into(),
            snapshots: (0..n).map(|t| Snapshot::new(t.to_string())).collect(),
            ..Self::default()
        }
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.len()
    }

    /// Returns whether a component of `kind` named `name` exists.
    pub fn contains(&self, kind: ComponentKind, name: &str) -> bool {
        self.index_of(kind, name).is_some()
    }

    pub(crate) fn index_of(&self, kind: ComponentKind, name: &str) -> Option<usize> {
        match kind {
            ComponentKind::Carrier => position(&self.carriers, name, |c| &c.name),
            ComponentKind::Bus => position(&self.buses, name, |c| &c.name),
            ComponentKind::Load => position(&self.loads, name, |c| &c.name),
            ComponentKind::Generator => position(&self.generators, name, |c| &c.name),
            ComponentKind::StorageUnit => position(&self.storage_units, name, |c| &c.name),
            ComponentKind::Link => position(&self.links, name, |c| &c.name),
            ComponentKind::Store => position(&self.stores, name, |c| &c.name),
            ComponentKind::Line => position(&self.lines, name, |c| &c.name),
        }
    }

    /// Adds a component.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Duplicate`] if a component of the same kind and name exists.
    pub fn add(&mut self, component: impl Into<Component>) -> Result<()> {
        let component = component.into();
        let kind = component.kind();
        if self.contains(kind, component.name()) {
            return Err(Error::Duplicate {
                kind,
                name: component.name().to_string(),
            });
        }
        log::trace!("adding {kind} \"{}\"", component.name());
        match component {
            Component::Carrier(c) => self.carriers.push(c),
            Component::Bus(c) => self.buses.push(c),
            Component::Load(c) => self.loads.push(c),
            Component::Generator(c) => self.generators.push(c),
            Component::StorageUnit(c) => self.storage_units.push(c),
            Component::Link(c) => self.links.push(c),
            Component::Store(c) => self.stores.push(c),
            Component::Line(c) => self.lines.push(c),
        }
        Ok(())
    }

    /// Removes a component and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no such component exists.
    pub fn remove(&mut self, kind: ComponentKind, name: &str) -> Result<Component> {
        let idx = self.index_of(kind, name).ok_or_else(|| Error::NotFound {
            kind,
            name: name.to_string(),
        })?;
        log::trace!("removing {kind} \"{name}\"");
        Ok(match kind {
            ComponentKind::Carrier => self.carriers.remove(idx).into(),
            ComponentKind::Bus => self.buses.remove(idx).into(),
            ComponentKind::Load => self.loads.remove(idx).into(),
            ComponentKind::Generator => self.generators.remove(idx).into(),
            ComponentKind::StorageUnit => self.storage_units.remove(idx).into(),
            ComponentKind::Link => self.links.remove(idx).into(),
            ComponentKind::Store => self.stores.remove(idx).into(),
            ComponentKind::Line => self.lines.remove(idx).into(),
        })
    }

    fn not_found(kind: ComponentKind, name: &str) -> Error {
        Error::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn bus(&self, name: &str) -> Result<&Bus> {
        self.buses
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Self::not_found(ComponentKind::Bus, name))
    }

    pub fn carrier(&self, name: &str) -> Option<&Carrier> {
        self.carriers.iter().find(|c| c.name == name)
    }

    pub fn generator(&self, name: &str) -> Result<&Generator> {
        self.generators
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Self::not_found(ComponentKind::Generator, name))
    }

    pub fn storage_unit(&self, name: &str) -> Result<&StorageUnit> {
        self.storage_units
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Self::not_found(ComponentKind::StorageUnit, name))
    }

    pub fn link(&self, name: &str) -> Result<&Link> {
        self.links
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Self::not_found(ComponentKind::Link, name))
    }

    pub fn store(&self, name: &str) -> Result<&Store> {
        self.stores
            .iter()
            .find(|c| c.name == name)
            .ok_or_else(|| Self::not_found(ComponentKind::Store, name))
    }

    /// CO2 intensity of a carrier; unknown carriers emit nothing.
    pub fn co2_intensity(&self, carrier: &str) -> f64 {
        self.carrier(carrier).map_or(0.0, |c| c.co2_emissions)
    }

    /// Index of a bus in [`Network::buses`].
    pub fn bus_index(&self, name: &str) -> Result<usize> {
        position(&self.buses, name, |b| &b.name)
            .ok_or_else(|| Self::not_found(ComponentKind::Bus, name))
    }

    /// Connected components of the AC line graph.
    pub fn sub_networks(&self) -> Result<Vec<SubNetwork>> {
        topology::sub_networks(self)
    }

    /// Checks references, series lengths and physical parameters.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidNetwork`] describing every problem found.
    pub fn validate(&self) -> Result<()> {
        let mut problems = Vec::new();
        let n = self.snapshot_count();
        if n == 0 {
            problems.push("network has no snapshots".to_string());
        }
        for s in &self.snapshots {
            if !(s.weighting > 0.0) {
                problems.push(format!("snapshot \"{}\": weighting must be > 0", s.name));
            }
        }

        let mut check_bus = |owner: String, bus: &str| {
            if self.bus_index(bus).is_err() {
                problems.push(format!("{owner}: unknown bus \"{bus}\""));
            }
        };
        for c in &self.loads {
            check_bus(format!("Load \"{}\"", c.name), &c.bus);
        }
        for c in &self.generators {
            check_bus(format!("Generator \"{}\"", c.name), &c.bus);
        }
        for c in &self.storage_units {
            check_bus(format!("StorageUnit \"{}\"", c.name), &c.bus);
        }
        for c in &self.stores {
            check_bus(format!("Store \"{}\"", c.name), &c.bus);
        }
        for c in &self.links {
            check_bus(format!("Link \"{}\"", c.name), &c.bus0);
            check_bus(format!("Link \"{}\"", c.name), &c.bus1);
        }
        for c in &self.lines {
            check_bus(format!("Line \"{}\"", c.name), &c.bus0);
            check_bus(format!("Line \"{}\"", c.name), &c.bus1);
        }

        for c in &self.loads {
            if c.p_set.len() != n {
                problems.push(format!(
                    "Load \"{}\": p_set has {} values, expected {n}",
                    c.name,
                    c.p_set.len()
                ));
            }
        }
        for c in &self.generators {
            if c.efficiency <= 0.0 {
                problems.push(format!("Generator \"{}\": efficiency must be > 0", c.name));
            }
            if c.dispatch == Dispatch::Variable && c.p_max_pu_t.len() != n {
                problems.push(format!(
                    "Generator \"{}\": variable dispatch needs {n} p_max_pu values, got {}",
                    c.name,
                    c.p_max_pu_t.len()
                ));
            }
        }
        for c in &self.storage_units {
            if c.efficiency_store <= 0.0 || c.efficiency_dispatch <= 0.0 {
                problems.push(format!("StorageUnit \"{}\": efficiencies must be > 0", c.name));
            }
            if !c.inflow.is_empty() && c.inflow.len() != n {
                problems.push(format!(
                    "StorageUnit \"{}\": inflow has {} values, expected {n}",
                    c.name,
                    c.inflow.len()
                ));
            }
            if !c.state_of_charge_set.is_empty() && c.state_of_charge_set.len() != n {
                problems.push(format!(
                    "StorageUnit \"{}\": state_of_charge_set has {} values, expected {n}",
                    c.name,
                    c.state_of_charge_set.len()
                ));
            }
        }
        for c in &self.links {
            if c.efficiency <= 0.0 {
                problems.push(format!("Link \"{}\": efficiency must be > 0", c.name));
            }
        }
        for c in &self.lines {
            if c.x <= 0.0 {
                problems.push(format!("Line \"{}\": reactance x must be > 0", c.name));
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(Error::InvalidNetwork(problems.join("; ")))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_bus() -> Network {
        let mut n = Network::with_snapshots("test", 2);
        n.add(Bus {
            name: "a".into(),
            ..Bus::default()
        })
        .expect("add Bus a");
        n.add(Bus {
            name: "b".into(),
            ..Bus::default()
        })
        .expect("add Bus b");
        n
    }

    #[test]
    fn add_rejects_duplicates_per_kind() {
        let mut n = two_bus();
        let err = n.add(Bus {
            name: "a".into(),
            ..Bus::default()
        });
        assert!(matches!(err, Err(Error::Duplicate { kind: ComponentKind::Bus, .. })));

        // Same name, different kind is fine.
        let ok = n.add(Generator {
            name: "a".into(),
            bus: "a".into(),
            ..Generator::default()
        });
        assert!(ok.is_ok());
    }

    #[test]
    fn remove_returns_component() {
        let mut n = two_bus();
        let removed = n.remove(ComponentKind::Bus, "b");
        assert!(matches!(removed, Ok(Component::Bus(ref b)) if b.name == "b"));
        assert_eq!(n.buses.len(), 1);
        assert!(matches!(
            n.remove(ComponentKind::Bus, "b"),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn validate_reports_unknown_bus_and_bad_series() {
        let mut n = two_bus();
        n.add(Load {
            name: "l".into(),
            bus: "c".into(),
            p_set: vec![1.0],
        })
        .expect("add Load l");
        let err = n.validate().expect_err("invalid network").to_string();
        assert!(err.contains("unknown bus \"c\""), "{err}");
        assert!(err.contains("p_set has 1 values"), "{err}");
    }

    #[test]
    fn validate_requires_snapshots() {
        let n = Network::default();
        assert!(n.validate().is_err());
    }

    #[test]
    fn unknown_carrier_has_no_emissions() {
        let mut n = two_bus();
        n.add(Carrier {
            name: "gas".into(),
            co2_emissions: 0.2,
        })
        .expect("add Carrier gas");
        assert_eq!(n.co2_intensity("gas"), 0.2);
        assert_eq!(n.co2_intensity("wind"), 0.0);
    }
}

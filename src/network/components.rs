//! Component types held by a [`Network`](super::Network).
//!
//! Static attributes derive `serde` so the CSV folder reader can fill them
//! straight from a table row; per-snapshot series are skipped and loaded from
//! the companion `<kind>-<attr>.csv` tables instead.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Component kinds, used for naming errors and CSV tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ComponentKind {
    Carrier,
    Bus,
    Load,
    Generator,
    StorageUnit,
    Link,
    Store,
    Line,
}

impl ComponentKind {
    /// All kinds, in the order tables are written.
    pub const ALL: [ComponentKind; 8] = [
        ComponentKind::Carrier,
        ComponentKind::Bus,
        ComponentKind::Load,
        ComponentKind::Generator,
        ComponentKind::StorageUnit,
        ComponentKind::Link,
        ComponentKind::Store,
        ComponentKind::Line,
    ];

    /// Base name of the CSV table for this kind (e.g. `storage_units`).
    pub fn table(self) -> &'static str {
        match self {
            ComponentKind::Carrier => "carriers",
            ComponentKind::Bus => "buses",
            ComponentKind::Load => "loads",
            ComponentKind::Generator => "generators",
            ComponentKind::StorageUnit => "storage_units",
            ComponentKind::Link => "links",
            ComponentKind::Store => "stores",
            ComponentKind::Line => "lines",
        }
    }
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Carrier => "Carrier",
            ComponentKind::Bus => "Bus",
            ComponentKind::Load => "Load",
            ComponentKind::Generator => "Generator",
            ComponentKind::StorageUnit => "StorageUnit",
            ComponentKind::Link => "Link",
            ComponentKind::Store => "Store",
            ComponentKind::Line => "Line",
        };
        f.write_str(s)
    }
}

/// One optimisation period. `weighting` is its duration in hours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub name: String,
    #[serde(default = "unit_weighting")]
    pub weighting: f64,
}

fn unit_weighting() -> f64 {
    1.0
}

impl Snapshot {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            weighting: 1.0,
        }
    }
}

/// An energy carrier with its CO2 intensity (t per MWh of primary energy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Carrier {
    pub name: String,
    pub co2_emissions: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bus {
    pub name: String,
    pub carrier: String,
}

impl Default for Bus {
    fn default() -> Self {
        Self {
            name: String::new(),
            carrier: "AC".to_string(),
        }
    }
}

/// Fixed demand at a bus.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Load {
    pub name: String,
    pub bus: String,
    /// Demand per snapshot (MW).
    #[serde(skip)]
    pub p_set: Vec<f64>,
}

/// How a generator's availability is expressed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dispatch {
    /// Static `p_min_pu`/`p_max_pu` in every snapshot.
    #[default]
    Flexible,
    /// Availability follows the per-snapshot `p_max_pu` series.
    Variable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Generator {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub dispatch: Dispatch,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: f64,
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    /// Electrical output per unit of primary energy.
    pub efficiency: f64,
    /// Per-snapshot availability, used when `dispatch` is `Variable`.
    #[serde(skip)]
    pub p_max_pu_t: Vec<f64>,
}

impl Default for Generator {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            dispatch: Dispatch::Flexible,
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            efficiency: 1.0,
            p_max_pu_t: Vec::new(),
        }
    }
}

impl Generator {
    /// Upper availability (per unit of `p_nom`) in snapshot `t`.
    pub fn p_max_pu_at(&self, t: usize) -> f64 {
        match self.dispatch {
            Dispatch::Variable => self.p_max_pu_t.get(t).copied().unwrap_or(self.p_max_pu),
            Dispatch::Flexible => self.p_max_pu,
        }
    }
}

/// Storage with power and energy capacity coupled through `max_hours`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageUnit {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: f64,
    /// Negative: the charging limit as a fraction of `p_nom`.
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub max_hours: f64,
    pub efficiency_store: f64,
    pub efficiency_dispatch: f64,
    /// Fraction of the state of charge lost per hour.
    pub standing_loss: f64,
    pub cyclic_state_of_charge: bool,
    pub state_of_charge_initial: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
    /// Natural inflow per snapshot (MW); empty means none.
    #[serde(skip)]
    pub inflow: Vec<f64>,
    /// Fixed state of charge per snapshot where set; empty means none.
    #[serde(skip)]
    pub state_of_charge_set: Vec<Option<f64>>,
}

impl Default for StorageUnit {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: -1.0,
            p_max_pu: 1.0,
            max_hours: 1.0,
            efficiency_store: 1.0,
            efficiency_dispatch: 1.0,
            standing_loss: 0.0,
            cyclic_state_of_charge: false,
            state_of_charge_initial: 0.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
            inflow: Vec::new(),
            state_of_charge_set: Vec::new(),
        }
    }
}

impl StorageUnit {
    pub fn inflow_at(&self, t: usize) -> f64 {
        self.inflow.get(t).copied().unwrap_or(0.0)
    }

    pub fn state_of_charge_set_at(&self, t: usize) -> Option<f64> {
        self.state_of_charge_set.get(t).copied().flatten()
    }
}

/// Controllable directed flow from `bus0` to `bus1`.
///
/// `p0` is withdrawn at `bus0` and `efficiency * p0` is delivered at `bus1`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Link {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    pub p_nom: f64,
    pub p_nom_extendable: bool,
    pub p_nom_min: f64,
    pub p_nom_max: f64,
    pub p_min_pu: f64,
    pub p_max_pu: f64,
    pub efficiency: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Default for Link {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            p_nom: 0.0,
            p_nom_extendable: false,
            p_nom_min: 0.0,
            p_nom_max: f64::INFINITY,
            p_min_pu: 0.0,
            p_max_pu: 1.0,
            efficiency: 1.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// Energy reservoir attached to a single bus.
///
/// Positive `p` withdraws energy from the store into the bus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Store {
    pub name: String,
    pub bus: String,
    pub carrier: String,
    pub e_nom: f64,
    pub e_nom_extendable: bool,
    pub e_nom_min: f64,
    pub e_nom_max: f64,
    pub e_min_pu: f64,
    pub e_max_pu: f64,
    pub e_initial: f64,
    pub e_cyclic: bool,
    pub standing_loss: f64,
    pub marginal_cost: f64,
    pub capital_cost: f64,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus: String::new(),
            carrier: String::new(),
            e_nom: 0.0,
            e_nom_extendable: false,
            e_nom_min: 0.0,
            e_nom_max: f64::INFINITY,
            e_min_pu: 0.0,
            e_max_pu: 1.0,
            e_initial: 0.0,
            e_cyclic: false,
            standing_loss: 0.0,
            marginal_cost: 0.0,
            capital_cost: 0.0,
        }
    }
}

/// AC branch under the linearised (DC) power flow approximation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Line {
    pub name: String,
    pub bus0: String,
    pub bus1: String,
    /// Series reactance (per unit); flows are `(theta0 - theta1) / x`.
    pub x: f64,
    pub s_nom: f64,
    pub s_nom_extendable: bool,
    pub s_nom_min: f64,
    pub s_nom_max: f64,
    pub capital_cost: f64,
}

impl Default for Line {
    fn default() -> Self {
        Self {
            name: String::new(),
            bus0: String::new(),
            bus1: String::new(),
            x: 0.1,
            s_nom: 0.0,
            s_nom_extendable: false,
            s_nom_min: 0.0,
            s_nom_max: f64::INFINITY,
            capital_cost: 0.0,
        }
    }
}

/// Any component accepted by [`Network::add`](super::Network::add).
#[derive(Debug, Clone)]
pub enum Component {
    Carrier(Carrier),
    Bus(Bus),
    Load(Load),
    Generator(Generator),
    StorageUnit(StorageUnit),
    Link(Link),
    Store(Store),
    Line(Line),
}

impl Component {
    pub fn kind(&self) -> ComponentKind {
        match self {
            Component::Carrier(_) => ComponentKind::Carrier,
            Component::Bus(_) => ComponentKind::Bus,
            Component::Load(_) => ComponentKind::Load,
            Component::Generator(_) => ComponentKind::Generator,
            Component::StorageUnit(_) => ComponentKind::StorageUnit,
            Component::Link(_) => ComponentKind::Link,
            Component::Store(_) => ComponentKind::Store,
            Component::Line(_) => ComponentKind::Line,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Component::Carrier(c) => &c.name,
            Component::Bus(c) => &c.name,
            Component::Load(c) => &c.name,
            Component::Generator(c) => &c.name,
            Component::StorageUnit(c) => &c.name,
            Component::Link(c) => &c.name,
            Component::Store(c) => &c.name,
            Component::Line(c) => &c.name,
        }
    }
}

macro_rules! impl_into_component {
    ($($ty:ident),*) => {
        $(
            impl From<$ty> for Component {
                fn from(c: $ty) -> Self {
                    Component::$ty(c)
                }
            }
        )*
    };
}

impl_into_component!(Carrier, Bus, Load, Generator, StorageUnit, Link, Store, Line);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_modelling_conventions() {
        let su = StorageUnit::default();
        assert_eq!(su.p_min_pu, -1.0);
        assert_eq!(su.max_hours, 1.0);
        assert!(Generator::default().p_nom_max.is_infinite());
        assert_eq!(Bus::default().carrier, "AC");
    }

    #[test]
    fn variable_generator_reads_series() {
        let g = Generator {
            dispatch: Dispatch::Variable,
            p_max_pu_t: vec![0.2, 0.7],
            ..Generator::default()
        };
        assert_eq!(g.p_max_pu_at(1), 0.7);

        let flexible = Generator {
            p_max_pu: 0.9,
            p_max_pu_t: vec![0.2, 0.7],
            ..Generator::default()
        };
        assert_eq!(flexible.p_max_pu_at(1), 0.9);
    }

    #[test]
    fn component_reports_kind_and_name() {
        let c: Component = Store {
            name: "hydrogen".into(),
            ..Store::default()
        }
        .into();
        assert_eq!(c.kind(), ComponentKind::Store);
        assert_eq!(c.name(), "hydrogen");
        assert_eq!(c.kind().to_string(), "Store");
    }
}

//! Shared test fixtures for integration tests.
//!
//! Every network here has a unique LP optimum (distinct marginal costs,
//! lossy storage), so dispatch series can be compared exactly and not only
//! the objective.

#![allow(dead_code)]

use lopf_sim::network::{Bus, Carrier, Dispatch, Generator, Load, Network, StorageUnit};

/// Absolute comparison used for hand-computed optima.
pub fn close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol
}

/// One AC bus with a load following `demand`.
pub fn single_bus(name: &str, demand: &[f64]) -> Network {
    let mut n = Network::with_snapshots(name, demand.len());
    n.add(Bus {
        name: "AC0".into(),
        ..Bus::default()
    })
    .expect("add Bus AC0");
    n.add(Load {
        name: "demand".into(),
        bus: "AC0".into(),
        p_set: demand.to_vec(),
    })
    .expect("add Load demand");
    n
}

/// Extendable gas plant against fixed coal capacity, loads 20/20/108 MW.
///
/// Gas (capital 10, marginal 20, efficiency 0.5) is built to the 108 MW
/// peak since each MW saves 20 against coal in the peak hour. Objective is
/// 1080 capital plus 148 MWh at 20.
pub fn extendable_gas() -> Network {
    let mut n = single_bus("extendable-gas", &[20.0, 20.0, 108.0]);
    n.add(Carrier {
        name: "gas".into(),
        co2_emissions: 0.2,
    })
    .expect("add Carrier gas");
    n.add(Generator {
        name: "Gas".into(),
        bus: "AC0".into(),
        carrier: "gas".into(),
        p_nom_extendable: true,
        capital_cost: 10.0,
        marginal_cost: 20.0,
        efficiency: 0.5,
        ..Generator::default()
    })
    .expect("add Generator Gas");
    n.add(Generator {
        name: "Coal".into(),
        bus: "AC0".into(),
        p_nom: 200.0,
        marginal_cost: 40.0,
        ..Generator::default()
    })
    .expect("add Generator Coal");
    n
}

/// Cheap emitting coal (efficiency 0.5, 1 t CO2 per MWh electric) against
/// expensive clean solar, 100 MW load in one snapshot.
pub fn coal_and_solar() -> Network {
    let mut n = single_bus("coal-and-solar", &[100.0]);
    n.add(Carrier {
        name: "coal".into(),
        co2_emissions: 0.5,
    })
    .expect("add Carrier coal");
    n.add(Generator {
        name: "Coal".into(),
        bus: "AC0".into(),
        carrier: "coal".into(),
        p_nom: 200.0,
        marginal_cost: 10.0,
        efficiency: 0.5,
        ..Generator::default()
    })
    .expect("add Generator Coal");
    n.add(Generator {
        name: "Solar".into(),
        bus: "AC0".into(),
        p_nom: 200.0,
        marginal_cost: 30.0,
        ..Generator::default()
    })
    .expect("add Generator Solar");
    n
}

/// Wind in the first hour only, gas in reserve, and a lossy battery that
/// moves wind into the second hour. Loads are 50 MW in both hours.
pub fn wind_and_battery(extendable: bool) -> Network {
    let mut n = single_bus("wind-and-battery", &[50.0, 50.0]);
    n.add(Carrier {
        name: "battery".into(),
        co2_emissions: 0.0,
    })
    .expect("add Carrier battery");
    n.add(Generator {
        name: "Wind".into(),
        bus: "AC0".into(),
        dispatch: Dispatch::Variable,
        p_nom: 100.0,
        p_max_pu_t: vec![1.0, 0.0],
        marginal_cost: 0.5,
        ..Generator::default()
    })
    .expect("add Generator Wind");
    n.add(Generator {
        name: "Gas".into(),
        bus: "AC0".into(),
        p_nom: 100.0,
        marginal_cost: 50.0,
        ..Generator::default()
    })
    .expect("add Generator Gas");
    n.add(StorageUnit {
        name: "Battery".into(),
        bus: "AC0".into(),
        carrier: "battery".into(),
        p_nom: if extendable { 0.0 } else { 30.0 },
        p_nom_extendable: extendable,
        capital_cost: if extendable { 10.0 } else { 0.0 },
        max_hours: 2.0,
        efficiency_store: 0.9,
        efficiency_dispatch: 0.9,
        ..StorageUnit::default()
    })
    .expect("add StorageUnit Battery");
    n
}

/// Reservoir with natural inflow that it cannot fully use: 100 MWh arrive in
/// the first hour, the turbine is limited to 30 MW and the reservoir to
/// 30 MWh, so the surplus is spilled.
///
/// Optimum: 30 MW out in hour one, a full reservoir carried over with 1%
/// standing loss, and 0.9 * 0.99 * 30 = 26.73 MW out in hour two.
pub fn spilling_reservoir() -> Network {
    let mut n = single_bus("spilling-reservoir", &[40.0, 40.0]);
    n.add(Carrier {
        name: "hydro".into(),
        co2_emissions: 0.0,
    })
    .expect("add Carrier hydro");
    n.add(Generator {
        name: "Gas".into(),
        bus: "AC0".into(),
        p_nom: 100.0,
        marginal_cost: 50.0,
        ..Generator::default()
    })
    .expect("add Generator Gas");
    n.add(StorageUnit {
        name: "Reservoir".into(),
        bus: "AC0".into(),
        carrier: "hydro".into(),
        p_nom: 30.0,
        p_min_pu: 0.0,
        max_hours: 1.0,
        efficiency_dispatch: 0.9,
        standing_loss: 0.01,
        marginal_cost: 1.0,
        inflow: vec![100.0, 0.0],
        ..StorageUnit::default()
    })
    .expect("add StorageUnit Reservoir");
    n
}

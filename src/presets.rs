//! Built-in example networks.
//!
//! Load and wind profiles are a daily sinusoid with seeded Gaussian noise, so
//! a preset is reproducible for a given seed. Every generator gets its own
//! marginal cost (base price plus a small per-unit offset) and storage has a
//! standing loss, which keeps the LP optimum unique and lets replacement
//! checks compare dispatch and not just cost.

use std::f64::consts::PI;

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::config::ConfigError;
use crate::error::{Error, Result};
use crate::network::{Bus, Carrier, Dispatch, Generator, Line, Link, Load, Network, StorageUnit};

/// Available preset names.
pub const PRESETS: &[&str] = &["storage-hvdc", "ac-dc-meshed"];

/// Builds the preset network `name`.
///
/// # Errors
///
/// Returns [`Error::Config`] if the preset name is unknown.
pub fn from_preset(name: &str, seed: u64) -> Result<Network> {
    match name {
        "storage-hvdc" => storage_hvdc(seed),
        "ac-dc-meshed" => ac_dc_meshed(seed),
        _ => Err(Error::Config(ConfigError {
            field: "network.preset".to_string(),
            message: format!("unknown preset \"{name}\", available: {}", PRESETS.join(", ")),
        })),
    }
}

/// Standard normal sample scaled by `std_dev` (Box-Muller).
fn gaussian_noise(rng: &mut StdRng, std_dev: f64) -> f64 {
    if std_dev <= 0.0 {
        return 0.0;
    }
    let u1: f64 = rng.random::<f64>().clamp(1e-9, 1.0);
    let u2: f64 = rng.random::<f64>();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos() * std_dev
}

/// Demand per snapshot: `base + amp * sin(2 pi t / 24 + phase)` plus noise, never negative.
fn load_profile(rng: &mut StdRng, n_t: usize, base: f64, amp: f64, phase: f64) -> Vec<f64> {
    (0..n_t)
        .map(|t| {
            let x = 2.0 * PI * t as f64 / 24.0 + phase;
            (base + amp * x.sin() + gaussian_noise(rng, 0.03 * base)).max(0.0)
        })
        .collect()
}

/// Wind availability per unit: a slow swell with noise, clamped to `[0, 1]`.
fn wind_profile(rng: &mut StdRng, n_t: usize, mean: f64) -> Vec<f64> {
    let phase = rng.random::<f64>() * 2.0 * PI;
    (0..n_t)
        .map(|t| {
            let swell = 0.3 * (2.0 * PI * t as f64 / 12.0 + phase).sin();
            (mean + swell + gaussian_noise(rng, 0.05)).clamp(0.0, 1.0)
        })
        .collect()
}

fn add_bus(network: &mut Network, name: &str) -> Result<()> {
    network.add(Bus {
        name: name.to_string(),
        ..Bus::default()
    })
}

fn add_line(
    network: &mut Network,
    name: &str,
    bus0: &str,
    bus1: &str,
    x: f64,
    s_nom: f64,
) -> Result<()> {
    network.add(Line {
        name: name.to_string(),
        bus0: bus0.to_string(),
        bus1: bus1.to_string(),
        x,
        s_nom,
        ..Line::default()
    })
}

fn add_carriers(network: &mut Network) -> Result<()> {
    for (name, co2) in [("gas", 0.24), ("wind", 0.0), ("battery", 0.0)] {
        network.add(Carrier {
            name: name.to_string(),
            co2_emissions: co2,
        })?;
    }
    Ok(())
}

/// Two AC areas joined by an HVDC link, with wind, gas and extendable batteries.
///
/// Area A is a three-bus triangle (`AC0`..`AC2`), area B two buses (`AC3`,
/// `AC4`). Gas generators and storage units are extendable.
pub fn storage_hvdc(seed: u64) -> Result<Network> {
    const N_T: usize = 12;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut n = Network::with_snapshots("storage-hvdc", N_T);
    add_carriers(&mut n)?;

    for i in 0..5 {
        add_bus(&mut n, &format!("AC{i}"))?;
    }
    add_line(&mut n, "line 0-1", "AC0", "AC1", 0.10, 300.0)?;
    add_line(&mut n, "line 1-2", "AC1", "AC2", 0.15, 300.0)?;
    add_line(&mut n, "line 2-0", "AC2", "AC0", 0.12, 300.0)?;
    add_line(&mut n, "line 3-4", "AC3", "AC4", 0.10, 300.0)?;
    n.add(Link {
        name: "HVDC 2-3".to_string(),
        bus0: "AC2".to_string(),
        bus1: "AC3".to_string(),
        p_nom: 200.0,
        p_min_pu: -1.0,
        efficiency: 0.98,
        marginal_cost: 0.05,
        ..Link::default()
    })?;

    for i in 0..5 {
        let bus = format!("AC{i}");
        let fi = i as f64;
        n.add(Load {
            name: format!("load {i}"),
            bus: bus.clone(),
            p_set: load_profile(&mut rng, N_T, 60.0 + 10.0 * fi, 25.0, 0.3 * fi),
        })?;
        n.add(Generator {
            name: format!("Wind {i}"),
            bus: bus.clone(),
            carrier: "wind".to_string(),
            dispatch: Dispatch::Variable,
            p_nom: 80.0,
            p_max_pu_t: wind_profile(&mut rng, N_T, 0.45),
            marginal_cost: 0.1 + 0.01 * fi,
            ..Generator::default()
        })?;
        n.add(Generator {
            name: format!("Gas {i}"),
            bus,
            carrier: "gas".to_string(),
            p_nom_extendable: true,
            marginal_cost: 40.0 + 1.5 * fi + rng.random_range(0.0..0.5),
            capital_cost: 60.0 + 2.0 * fi,
            efficiency: 0.35 + 0.05 * fi,
            ..Generator::default()
        })?;
    }

    for i in [0, 3] {
        n.add(StorageUnit {
            name: format!("Storage {i}"),
            bus: format!("AC{i}"),
            carrier: "battery".to_string(),
            p_nom_extendable: true,
            max_hours: 4.0,
            efficiency_store: 0.9,
            efficiency_dispatch: 0.9,
            standing_loss: 0.01,
            cyclic_state_of_charge: true,
            marginal_cost: 0.2,
            capital_cost: 30.0 + 5.0 * i as f64,
            ..StorageUnit::default()
        })?;
    }

    log::debug!("built preset storage-hvdc with seed {seed}");
    Ok(n)
}

/// A meshed UK/German AC system with a Norwegian hydro area behind HVDC links.
///
/// The UK and German areas are each an AC triangle; Norway is a single bus
/// with a pumped-hydro unit fed by inflow. Some lines are extendable.
pub fn ac_dc_meshed(seed: u64) -> Result<Network> {
    const N_T: usize = 10;
    let mut rng = StdRng::seed_from_u64(seed);
    let mut n = Network::with_snapshots("ac-dc-meshed", N_T);
    add_carriers(&mut n)?;
    n.add(Carrier {
        name: "hydro".to_string(),
        co2_emissions: 0.0,
    })?;

    let uk = ["London", "Norwich", "Manchester"];
    let de = ["Bremen", "Hannover", "Frankfurt"];
    for bus in uk.iter().chain(&de).chain(&["Norway"]) {
        add_bus(&mut n, bus)?;
    }
    add_line(&mut n, "London-Norwich", "London", "Norwich", 0.08, 250.0)?;
    add_line(&mut n, "Norwich-Manchester", "Norwich", "Manchester", 0.11, 250.0)?;
    add_line(&mut n, "Manchester-London", "Manchester", "London", 0.09, 250.0)?;
    add_line(&mut n, "Bremen-Hannover", "Bremen", "Hannover", 0.07, 250.0)?;
    add_line(&mut n, "Hannover-Frankfurt", "Hannover", "Frankfurt", 0.10, 250.0)?;
    n.add(Line {
        name: "Frankfurt-Bremen".to_string(),
        bus0: "Frankfurt".to_string(),
        bus1: "Bremen".to_string(),
        x: 0.12,
        s_nom: 100.0,
        s_nom_extendable: true,
        s_nom_min: 100.0,
        capital_cost: 8.0,
        ..Line::default()
    })?;
    for (name, bus0, bus1, p_nom) in [
        ("Norwich-Bremen HVDC", "Norwich", "Bremen", 150.0),
        ("Norway-Manchester HVDC", "Norway", "Manchester", 120.0),
        ("Norway-Bremen HVDC", "Norway", "Bremen", 120.0),
    ] {
        n.add(Link {
            name: name.to_string(),
            bus0: bus0.to_string(),
            bus1: bus1.to_string(),
            p_nom,
            p_min_pu: -1.0,
            efficiency: 0.97,
            marginal_cost: 0.02,
            ..Link::default()
        })?;
    }

    for (i, bus) in uk.iter().chain(&de).enumerate() {
        let fi = i as f64;
        n.add(Load {
            name: format!("{bus} load"),
            bus: bus.to_string(),
            p_set: load_profile(&mut rng, N_T, 90.0 + 5.0 * fi, 30.0, 0.2 * fi),
        })?;
    }
    n.add(Load {
        name: "Norway load".to_string(),
        bus: "Norway".to_string(),
        p_set: load_profile(&mut rng, N_T, 40.0, 10.0, 0.0),
    })?;

    for (i, bus) in ["Manchester", "Bremen", "Frankfurt", "Norway"].iter().enumerate() {
        let fi = i as f64;
        n.add(Generator {
            name: format!("{bus} Wind"),
            bus: bus.to_string(),
            carrier: "wind".to_string(),
            dispatch: Dispatch::Variable,
            p_nom: 100.0,
            p_max_pu_t: wind_profile(&mut rng, N_T, 0.4),
            marginal_cost: 0.2 + 0.02 * fi,
            ..Generator::default()
        })?;
        n.add(Generator {
            name: format!("{bus} Gas"),
            bus: bus.to_string(),
            carrier: "gas".to_string(),
            p_nom: 50.0,
            p_nom_extendable: true,
            p_nom_min: 50.0,
            marginal_cost: 50.0 + 2.0 * fi + rng.random_range(0.0..0.5),
            capital_cost: 70.0 + 3.0 * fi,
            efficiency: 0.4 + 0.04 * fi,
            ..Generator::default()
        })?;
    }

    let inflow: Vec<f64> = (0..N_T)
        .map(|_| 15.0 + 10.0 * rng.random::<f64>())
        .collect();
    n.add(StorageUnit {
        name: "Norway Hydro".to_string(),
        bus: "Norway".to_string(),
        carrier: "hydro".to_string(),
        p_nom: 80.0,
        max_hours: 6.0,
        efficiency_store: 0.85,
        efficiency_dispatch: 0.9,
        standing_loss: 0.005,
        state_of_charge_initial: 200.0,
        marginal_cost: 0.5,
        inflow,
        ..StorageUnit::default()
    })?;

    log::debug!("built preset ac-dc-meshed with seed {seed}");
    Ok(n)
}

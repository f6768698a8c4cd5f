//! Rewrites generators and storage units into buses, links and stores.
//!
//! Each replacement keeps the LOPF optimum unchanged: the new components
//! carry the same costs, limits and efficiencies, only expressed in terms of
//! a separate bus for the primary energy carrier.

mod generator;
mod storage_unit;

pub use generator::{GeneratorReplacement, replace_generator};
pub use storage_unit::{INFLOW_CARRIER, StorageUnitReplacement, replace_storage_unit};

use crate::error::{Error, Result};
use crate::network::{Bus, Network};

/// Applies `edit` to a copy of `network` and keeps it only if every step succeeds.
fn staged<T>(network: &mut Network, edit: impl FnOnce(&mut Network) -> Result<T>) -> Result<T> {
    let mut draft = network.clone();
    let out = edit(&mut draft)?;
    *network = draft;
    Ok(out)
}

/// Adds the carrier bus `name`, or reuses it when it already carries `carrier`.
fn ensure_carrier_bus(network: &mut Network, name: &str, carrier: &str) -> Result<()> {
    match network.bus(name) {
        Ok(existing) if existing.carrier == carrier => {
            log::debug!("reusing carrier bus \"{name}\"");
            Ok(())
        }
        Ok(existing) => Err(Error::InvalidNetwork(format!(
            "bus \"{name}\" exists with carrier \"{}\", expected \"{carrier}\"",
            existing.carrier
        ))),
        Err(_) => network.add(Bus {
            name: name.to_string(),
            carrier: carrier.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn carrier_bus_is_reused_only_with_matching_carrier() {
        let mut n = Network::with_snapshots("buses", 1);
        ensure_carrier_bus(&mut n, "AC0 gas", "gas").expect("carrier bus should be ensured");
        ensure_carrier_bus(&mut n, "AC0 gas", "gas").expect("carrier bus should be ensured");
        assert_eq!(n.buses.len(), 1);
        assert!(matches!(
            ensure_carrier_bus(&mut n, "AC0 gas", "hydro"),
            Err(Error::InvalidNetwork(_))
        ));
    }

    #[test]
    fn failed_edit_is_discarded() {
        let mut n = Network::with_snapshots("buses", 1);
        let result = staged(&mut n, |draft| {
            ensure_carrier_bus(draft, "AC0 gas", "gas")?;
            ensure_carrier_bus(draft, "AC0 gas", "hydro")
        });
        assert!(result.is_err());
        assert!(n.buses.is_empty());

        let result = staged(&mut n, |draft| ensure_carrier_bus(draft, "AC0 gas", "gas"));
        assert!(result.is_ok());
        assert_eq!(n.buses.len(), 1);
    }
}

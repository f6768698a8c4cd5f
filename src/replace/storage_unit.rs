//! Storage-unit replacement: dispatch and store links around a store, plus an
//! inflow generator standing in for natural inflow.

use crate::error::{Error, Result};
use crate::lopf::{ExtraConstraint, NominalRef};
use crate::network::{Carrier, ComponentKind, Dispatch, Generator, Link, Network, Store};

/// Carrier of the generator that stands in for natural inflow.
pub const INFLOW_CARRIER: &str = "rain";

/// Names of the components that replaced a storage unit.
#[derive(Debug, Clone, PartialEq)]
pub struct StorageUnitReplacement {
    pub bus: String,
    /// Carrier bus to the unit's bus, sized in stored energy.
    pub dispatch_link: String,
    /// Unit's bus to the carrier bus.
    pub store_link: String,
    pub store: String,
    /// Curtailable generator delivering the inflow; curtailment is spillage.
    pub inflow_generator: String,
    /// Sizing constraints to pass to the LOPF; empty unless the unit was extendable.
    pub extra_constraints: Vec<ExtraConstraint>,
}

/// Replaces `name` with a carrier bus, two conversion links, a store and an
/// inflow generator.
///
/// A storage unit couples power and energy capacity through `max_hours`.
/// Once split into links and a store that coupling has to be restated, so for
/// an extendable unit the returned [`StorageUnitReplacement::extra_constraints`]
/// must be handed to [`lopf::solve`](crate::lopf::solve).
///
/// # Errors
///
/// Returns [`Error::Unsupported`] if any `state_of_charge_set` value is present,
/// since stores have no time-dependent energy limits. Returns
/// [`Error::Duplicate`] or [`Error::InvalidNetwork`] if a replacement name is
/// already taken. On any error the network is left as it was.
pub fn replace_storage_unit(network: &mut Network, name: &str) -> Result<StorageUnitReplacement> {
    let su = network.storage_unit(name)?.clone();

    if su.state_of_charge_set.iter().any(Option::is_some) {
        return Err(Error::Unsupported {
            kind: ComponentKind::StorageUnit,
            name: name.to_string(),
            reason: "stores have no time-dependent e_min_pu/e_max_pu, state_of_charge_set \
                     cannot be carried over"
                .to_string(),
        });
    }

    let carrier = su.carrier.as_str();
    let eta_d = su.efficiency_dispatch;
    let names = StorageUnitReplacement {
        bus: format!("{} {}", su.bus, carrier),
        dispatch_link: format!("{name} converter {carrier} to AC"),
        store_link: format!("{name} converter AC to {carrier}"),
        store: format!("{name} store {carrier}"),
        inflow_generator: format!("{name} inflow"),
        extra_constraints: if su.p_nom_extendable {
            vec![
                ExtraConstraint::NominalRatio {
                    lhs: NominalRef::store(format!("{name} store {carrier}")),
                    rhs: NominalRef::link(format!("{name} converter {carrier} to AC")),
                    ratio: su.max_hours * eta_d,
                },
                ExtraConstraint::NominalRatio {
                    lhs: NominalRef::store(format!("{name} store {carrier}")),
                    rhs: NominalRef::link(format!("{name} converter AC to {carrier}")),
                    ratio: su.max_hours,
                },
            ]
        } else {
            Vec::new()
        },
    };

    super::staged(network, |draft| {
        super::ensure_carrier_bus(draft, &names.bus, carrier)?;

        draft.add(Link {
            name: names.dispatch_link.clone(),
            bus0: names.bus.clone(),
            bus1: su.bus.clone(),
            p_nom: su.p_nom / eta_d,
            p_nom_extendable: su.p_nom_extendable,
            p_nom_min: su.p_nom_min / eta_d,
            p_nom_max: su.p_nom_max / eta_d,
            p_max_pu: su.p_max_pu,
            efficiency: eta_d,
            marginal_cost: su.marginal_cost * eta_d,
            capital_cost: su.capital_cost * eta_d,
            ..Link::default()
        })?;

        draft.add(Link {
            name: names.store_link.clone(),
            bus0: su.bus.clone(),
            bus1: names.bus.clone(),
            p_nom: su.p_nom,
            p_nom_extendable: su.p_nom_extendable,
            p_nom_min: su.p_nom_min,
            p_nom_max: su.p_nom_max,
            p_max_pu: -su.p_min_pu,
            efficiency: su.efficiency_store,
            ..Link::default()
        })?;

        draft.add(Store {
            name: names.store.clone(),
            bus: names.bus.clone(),
            carrier: carrier.to_string(),
            e_nom: su.p_nom * su.max_hours,
            e_nom_extendable: su.p_nom_extendable,
            e_nom_min: su.p_nom_min * su.max_hours,
            e_nom_max: su.p_nom_max * su.max_hours,
            e_initial: su.state_of_charge_initial,
            e_cyclic: su.cyclic_state_of_charge,
            standing_loss: su.standing_loss,
            ..Store::default()
        })?;

        if draft.carrier(INFLOW_CARRIER).is_none() {
            draft.add(Carrier {
                name: INFLOW_CARRIER.to_string(),
                co2_emissions: 0.0,
            })?;
        }

        let n_t = draft.snapshot_count();
        let inflow: Vec<f64> = (0..n_t).map(|t| su.inflow_at(t)).collect();
        let inflow_max = inflow.iter().copied().fold(0.0, f64::max);
        let p_max_pu_t = if inflow_max == 0.0 {
            vec![0.0; n_t]
        } else {
            inflow.iter().map(|i| i / inflow_max).collect()
        };
        draft.add(Generator {
            name: names.inflow_generator.clone(),
            bus: names.bus.clone(),
            carrier: INFLOW_CARRIER.to_string(),
            dispatch: Dispatch::Variable,
            p_nom: inflow_max,
            p_max_pu_t,
            ..Generator::default()
        })?;

        draft.remove(ComponentKind::StorageUnit, name).map(drop)
    })?;
    log::info!(
        "replaced StorageUnit \"{name}\" with bus \"{}\", links \"{}\" and \"{}\", store \"{}\", \
         generator \"{}\" ({} extra constraints)",
        names.bus,
        names.dispatch_link,
        names.store_link,
        names.store,
        names.inflow_generator,
        names.extra_constraints.len()
    );
    Ok(names)
}

//! Generator replacement: a carrier bus, a conversion link and a depleting store.

use crate::error::{Error, Result};
use crate::network::{ComponentKind, Dispatch, Link, Network, Store};

/// Names of the components that replaced a generator.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorReplacement {
    /// Bus of the generator's energy carrier.
    pub bus: String,
    /// Conversion from the carrier bus to the generator's bus.
    pub link: String,
    /// Store tracking the depletion of the carrier (and its emissions).
    pub store: String,
}

/// Replaces `name` with a carrier bus, a conversion link and a depleting store.
///
/// The link is sized in primary energy, so its capacity and costs are the
/// generator's divided and multiplied by the efficiency respectively; the
/// electrical output `-p1` equals the generator's dispatch. The store starts
/// empty and may only go negative, so `-e` is the cumulative fuel use.
///
/// # Errors
///
/// Returns [`Error::Unsupported`] for a generator with variable dispatch:
/// links only carry static per-unit limits. Returns [`Error::Duplicate`] or
/// [`Error::InvalidNetwork`] if a replacement name is already taken. On any
/// error the network is left as it was.
pub fn replace_generator(network: &mut Network, name: &str) -> Result<GeneratorReplacement> {
    let generator = network.generator(name)?.clone();

    if generator.dispatch != Dispatch::Flexible {
        return Err(Error::Unsupported {
            kind: ComponentKind::Generator,
            name: name.to_string(),
            reason: "links have no time-dependent p_max_pu, only flexible generators can be \
                     replaced"
                .to_string(),
        });
    }

    let carrier = generator.carrier.as_str();
    let eta = generator.efficiency;
    let names = GeneratorReplacement {
        bus: format!("{} {}", generator.bus, carrier),
        link: format!("{name} converter {carrier} to AC"),
        store: format!("{name} store {carrier}"),
    };

    super::staged(network, |draft| {
        super::ensure_carrier_bus(draft, &names.bus, carrier)?;

        draft.add(Link {
            name: names.link.clone(),
            bus0: names.bus.clone(),
            bus1: generator.bus.clone(),
            p_nom: generator.p_nom / eta,
            p_nom_extendable: generator.p_nom_extendable,
            p_nom_min: generator.p_nom_min / eta,
            p_nom_max: generator.p_nom_max / eta,
            p_min_pu: generator.p_min_pu,
            p_max_pu: generator.p_max_pu,
            efficiency: eta,
            marginal_cost: generator.marginal_cost * eta,
            capital_cost: generator.capital_cost * eta,
        })?;

        draft.add(Store {
            name: names.store.clone(),
            bus: names.bus.clone(),
            carrier: carrier.to_string(),
            e_nom_extendable: true,
            e_nom_min: f64::NEG_INFINITY,
            e_nom_max: 0.0,
            e_min_pu: 1.0,
            e_max_pu: 0.0,
            ..Store::default()
        })?;

        draft.remove(ComponentKind::Generator, name).map(drop)
    })?;
    log::info!(
        "replaced Generator \"{name}\" with bus \"{}\", link \"{}\", store \"{}\"",
        names.bus,
        names.link,
        names.store
    );
    Ok(names)
}

//! Components that cannot be expressed with links and stores, or whose
//! replacement names are taken, are refused without touching the network.

mod common;

use lopf_sim::Error;
use lopf_sim::network::{Bus, ComponentKind, Dispatch, Generator, Store};
use lopf_sim::replace::{replace_generator, replace_storage_unit};

#[test]
fn variable_generator_is_unsupported() {
    let mut n = common::wind_and_battery(false);
    let before = n.clone();
    let result = replace_generator(&mut n, "Wind");
    assert!(matches!(
        result,
        Err(Error::Unsupported {
            kind: ComponentKind::Generator,
            ..
        })
    ));
    assert_eq!(n.generators, before.generators);
    assert_eq!(n.buses, before.buses);
    assert!(n.links.is_empty());
}

#[test]
fn state_of_charge_set_is_unsupported() {
    let mut n = common::wind_and_battery(false);
    n.storage_units[0].state_of_charge_set = vec![None, Some(10.0)];
    let result = replace_storage_unit(&mut n, "Battery");
    assert!(matches!(
        result,
        Err(Error::Unsupported {
            kind: ComponentKind::StorageUnit,
            ..
        })
    ));
    assert!(n.contains(ComponentKind::StorageUnit, "Battery"));
    assert!(n.stores.is_empty());
}

#[test]
fn all_unset_state_of_charge_is_accepted() {
    let mut n = common::wind_and_battery(false);
    n.storage_units[0].state_of_charge_set = vec![None, None];
    replace_storage_unit(&mut n, "Battery").expect("Battery should be replaced");
}

#[test]
fn unknown_names_are_not_found() {
    let mut n = common::extendable_gas();
    assert!(matches!(
        replace_generator(&mut n, "Nuclear"),
        Err(Error::NotFound {
            kind: ComponentKind::Generator,
            ..
        })
    ));
    assert!(matches!(
        replace_storage_unit(&mut n, "Gas"),
        Err(Error::NotFound {
            kind: ComponentKind::StorageUnit,
            ..
        })
    ));
}

#[test]
fn carrier_bus_with_other_carrier_is_rejected() {
    let mut n = common::extendable_gas();
    n.add(Bus {
        name: "AC0 gas".into(),
        carrier: "AC".into(),
    })
    .expect("add Bus AC0 gas");
    assert!(matches!(
        replace_generator(&mut n, "Gas"),
        Err(Error::InvalidNetwork(_))
    ));
    assert!(n.contains(ComponentKind::Generator, "Gas"));
}

#[test]
fn generator_name_collision_leaves_network_unchanged() {
    let mut n = common::extendable_gas();
    n.add(Store {
        name: "Gas store gas".into(),
        bus: "AC0".into(),
        ..Store::default()
    })
    .expect("add Store Gas store gas");
    let before = n.clone();
    assert!(matches!(
        replace_generator(&mut n, "Gas"),
        Err(Error::Duplicate {
            kind: ComponentKind::Store,
            ..
        })
    ));
    assert_eq!(n, before);
}

#[test]
fn storage_unit_name_collision_leaves_network_unchanged() {
    let mut n = common::wind_and_battery(false);
    n.add(Generator {
        name: "Battery inflow".into(),
        bus: "AC0".into(),
        ..Generator::default()
    })
    .expect("add Generator Battery inflow");
    let before = n.clone();
    assert!(matches!(
        replace_storage_unit(&mut n, "Battery"),
        Err(Error::Duplicate {
            kind: ComponentKind::Generator,
            ..
        })
    ));
    assert_eq!(n, before);
}

#[test]
fn replaced_generator_cannot_be_replaced_twice() {
    let mut n = common::extendable_gas();
    replace_generator(&mut n, "Gas").expect("Gas should be replaced");
    assert!(matches!(
        replace_generator(&mut n, "Gas"),
        Err(Error::NotFound { .. })
    ));
}

#[test]
fn flexible_generator_with_minimum_output_is_accepted() {
    let mut n = common::single_bus("must-run", &[10.0]);
    n.add(Generator {
        name: "CHP".into(),
        bus: "AC0".into(),
        carrier: "gas".into(),
        dispatch: Dispatch::Flexible,
        p_nom: 20.0,
        p_min_pu: 0.25,
        efficiency: 0.4,
        ..Generator::default()
    })
    .expect("add Generator CHP");
    let names = replace_generator(&mut n, "CHP").expect("replacement should succeed");
    let link = n.link(&names.link).expect("link should exist");
    assert_eq!(link.p_min_pu, 0.25);
    assert!((link.p_nom - 50.0).abs() < 1e-9);
}

//! End-to-end runs of the built-in presets through the runner.

use lopf_sim::config::RunConfig;
use lopf_sim::lopf::Formulation;
use lopf_sim::runner;

fn run_preset(name: &str) -> runner::RunReport {
    let cfg = RunConfig::from_preset(name).expect("preset exists");
    runner::run(&cfg).unwrap_or_else(|e| panic!("{name}: {e}"))
}

#[test]
fn storage_hvdc_replacements_keep_objective() {
    let report = run_preset("storage-hvdc");
    assert_eq!(report.replacements.len(), 2);
    assert!(report.reference.objective > 0.0);
    for r in &report.replacements {
        let objective = r.report.outcome("objective");
        assert!(objective.is_some_and(|o| o.passed), "{}", r.report);
    }
}

#[test]
fn ac_dc_meshed_replacements_keep_objective() {
    let report = run_preset("ac-dc-meshed");
    assert_eq!(report.replacements.len(), 2);
    for r in &report.replacements {
        assert!(
            r.report.outcome("objective").is_some_and(|o| o.passed),
            "{}",
            r.report
        );
    }
    // Hydro replacement carries its inflow as a generator.
    let Some(hydro) = report
        .replacements
        .iter()
        .find(|r| r.report.subject.contains("Norway Hydro"))
    else {
        panic!("hydro replacement missing");
    };
    assert!(hydro.solution.generators.contains_key("Norway Hydro inflow"));
}

#[test]
fn formulations_agree_on_meshed_network() {
    let mut cfg = RunConfig::from_preset("ac-dc-meshed").expect("preset exists");
    cfg.replace.generators.clear();
    cfg.replace.storage_units.clear();

    let angles = runner::run(&cfg).expect("angles run should succeed");
    cfg.lopf.formulation = Formulation::Kirchhoff;
    let kirchhoff = runner::run(&cfg).expect("kirchhoff run should succeed");
    let scale = angles.reference.objective.abs().max(1.0);
    assert!((angles.reference.objective - kirchhoff.reference.objective).abs() < 1e-5 * scale);
    assert!(angles.replacements.is_empty());
    assert!(angles.passed());
}

#[test]
fn seed_changes_profiles_but_not_structure() {
    let mut cfg = RunConfig::from_preset("storage-hvdc").expect("preset exists");
    let a = cfg.network.load().expect("network should load");
    cfg.network.seed = 7;
    let b = cfg.network.load().expect("network should load");
    assert_eq!(a.buses, b.buses);
    assert_eq!(a.generators.len(), b.generators.len());
    assert_ne!(a.loads[0].p_set, b.loads[0].p_set);
}

//! Runs the `lopf-sim` binary end to end.

mod common;

use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use lopf_sim::io::write_network;
use lopf_sim::network::Generator;

fn lopf_sim(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_lopf-sim"))
        .args(args)
        .output()
        .expect("lopf-sim process should run")
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("temp paths should be UTF-8")
}

fn assert_exit(output: &Output, code: i32) {
    assert_eq!(
        output.status.code(),
        Some(code),
        "stdout={} stderr={}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
}

#[test]
fn solve_prints_objective() {
    let output = lopf_sim(&["solve", "--preset", "storage-hvdc", "--seed", "3"]);
    assert_exit(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- LOPF Solution ---"), "{stdout}");
    assert!(stdout.contains("Objective:"));
}

#[test]
fn unknown_preset_exits_with_error() {
    let output = lopf_sim(&["solve", "--preset", "atlantis"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown preset"));
}

#[test]
fn export_network_writes_tables() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let out = dir.path().join("meshed");
    let output = lopf_sim(&["export-network", "--preset", "ac-dc-meshed", path_str(&out)]);
    assert_exit(&output, 0);
    for table in ["snapshots.csv", "buses.csv", "lines.csv", "loads-p_set.csv"] {
        assert!(out.join(table).exists(), "{table} missing");
    }
}

#[test]
fn check_on_csv_network_passes_and_exports() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let network = dir.path().join("battery");
    write_network(&common::wind_and_battery(true), &network).expect("network should be written");
    let out = dir.path().join("results");

    let output = lopf_sim(&[
        "check",
        "--network",
        path_str(&network),
        "--storage-unit",
        "Battery",
        "--out",
        path_str(&out),
    ]);
    assert_exit(&output, 0);
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("--- Replacement Check: StorageUnit \"Battery\" ---"));
    assert!(stdout.contains("1/1 replacements reproduce the reference"));
    assert!(out.join("reference").join("summary.csv").exists());
    assert!(out.join("StorageUnit__Battery").join("stores-e.csv").exists());
}

#[test]
fn check_from_config_file_resolves_relative_network() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    write_network(&common::extendable_gas(), &dir.path().join("gas"))
        .expect("network should be written");
    let config = dir.path().join("run.toml");
    let toml = r#"
[network]
path = "gas"

[replace]
generators = ["Gas"]
"#;
    fs::write(&config, toml).expect("write run.toml");

    let output = lopf_sim(&["check", "--config", path_str(&config)]);
    assert_exit(&output, 0);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Result: PASSED"));
}

#[test]
fn invalid_config_lists_every_error() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let config = dir.path().join("bad.toml");
    let toml = r#"
[lopf]
co2_limit = -1.0

[replace]
generators = ["Gas 0", "Gas 0"]
"#;
    fs::write(&config, toml).expect("write bad.toml");

    let output = lopf_sim(&["check", "--config", path_str(&config)]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("lopf.co2_limit"), "{stderr}");
    assert!(stderr.contains("listed twice"), "{stderr}");
}

#[test]
fn check_against_stored_reference() {
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let network = dir.path().join("gas");
    write_network(&common::extendable_gas(), &network).expect("network should be written");
    let stored = dir.path().join("stored");

    let output = lopf_sim(&["solve", "--network", path_str(&network), "--out", path_str(&stored)]);
    assert_exit(&output, 0);

    let check = |reference: &Path| {
        lopf_sim(&[
            "check",
            "--network",
            path_str(&network),
            "--generator",
            "Gas",
            "--reference",
            path_str(reference),
        ])
    };
    let output = check(&stored);
    assert_exit(&output, 0);
    assert!(String::from_utf8_lossy(&output.stdout).contains("Result: PASSED"));

    // A stored objective that no longer matches the model is a failed check.
    let summary = fs::read_to_string(stored.join("summary.csv")).expect("read summary.csv");
    let drifted: String = summary
        .lines()
        .map(|line| if line.starts_with("objective,") { "objective,1" } else { line })
        .map(|line| format!("{line}\n"))
        .collect();
    fs::write(stored.join("summary.csv"), drifted).expect("write summary.csv");
    let output = check(&stored);
    assert_exit(&output, 2);
    assert!(String::from_utf8_lossy(&output.stdout).contains("[FAIL] objective"));

    let output = check(&dir.path().join("missing"));
    assert_exit(&output, 1);
}

#[test]
fn clashing_subjects_export_to_separate_folders() {
    let mut n = common::single_bus("twins", &[30.0, 70.0]);
    for (name, marginal_cost) in [("Gas 0", 20.0), ("Gas_0", 30.0)] {
        n.add(Generator {
            name: name.into(),
            bus: "AC0".into(),
            carrier: "gas".into(),
            p_nom: 50.0,
            marginal_cost,
            ..Generator::default()
        })
        .expect("add generator");
    }
    let dir = tempfile::tempdir().expect("tempdir should be created");
    let network = dir.path().join("twins");
    write_network(&n, &network).expect("network should be written");
    let out = dir.path().join("results");

    let output = lopf_sim(&[
        "check",
        "--network",
        path_str(&network),
        "--generator",
        "Gas 0",
        "--generator",
        "Gas_0",
        "--out",
        path_str(&out),
    ]);
    assert_exit(&output, 0);
    assert!(out.join("Generator__Gas_0").join("links-p0.csv").exists());
    assert!(out.join("Generator__Gas_0_2").join("links-p0.csv").exists());
}

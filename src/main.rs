//! lopf-sim entry point: CLI wiring and config-driven runs.

mod cli;

use std::collections::HashSet;
use std::path::Path;
use std::process;

use clap::Parser;

use cli::{CheckArgs, Cli, Command, ExportArgs, SolveArgs, SourceArgs};
use lopf_sim::config::RunConfig;
use lopf_sim::io::{export_solution, write_network};
use lopf_sim::{Result, lopf, runner};

/// Exit code when a replacement check fails.
const EXIT_CHECK_FAILED: i32 = 2;

const REFERENCE_FOLDER: &str = "reference";

/// Resolves and validates the configuration, exiting on any error.
fn load_config(source: &SourceArgs) -> RunConfig {
    let cfg = match source.resolve() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            process::exit(1);
        }
    };
    let errors = cfg.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        process::exit(1);
    }
    cfg
}

fn solve(args: &SolveArgs) -> Result<i32> {
    let cfg = load_config(&args.source);
    let network = cfg.network.load()?;
    let solution = lopf::solve(&network, &cfg.lopf.options())?;
    println!("{solution}");
    if let Some(out) = &args.out {
        export_solution(&solution, out)?;
        eprintln!("Solution written to {}", out.display());
    }
    Ok(0)
}

/// File-system friendly folder name for a check subject.
fn folder_name(subject: &str) -> String {
    subject
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect::<String>()
        .trim_matches('_')
        .to_string()
}

/// Folder names for `subjects`, suffixed `_2`, `_3`, ... where two would clash.
fn folder_names<'a>(subjects: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut used = HashSet::from([REFERENCE_FOLDER.to_string()]);
    subjects
        .into_iter()
        .map(|subject| {
            let base = folder_name(subject);
            let mut name = base.clone();
            let mut n = 2;
            while !used.insert(name.clone()) {
                name = format!("{base}_{n}");
                n += 1;
            }
            name
        })
        .collect()
}

fn check(args: &CheckArgs) -> Result<i32> {
    let mut cfg = load_config(&args.source);
    if !args.generators.is_empty() || !args.storage_units.is_empty() {
        cfg.replace.generators = args.generators.clone();
        cfg.replace.storage_units = args.storage_units.clone();
    }
    if let Some(dir) = &args.reference {
        cfg.network.reference = Some(dir.clone());
    }

    let report = runner::run(&cfg)?;
    println!("{report}");

    if let Some(out) = &args.out {
        export_solution(&report.reference, &out.join(REFERENCE_FOLDER))?;
        let subjects = report.replacements.iter().map(|r| r.report.subject.as_str());
        for (r, folder) in report.replacements.iter().zip(folder_names(subjects)) {
            export_solution(&r.solution, &out.join(folder))?;
        }
        eprintln!("Solutions written to {}", out.display());
    }
    Ok(if report.passed() { 0 } else { EXIT_CHECK_FAILED })
}

fn export_network(args: &ExportArgs) -> Result<i32> {
    let cfg = load_config(&args.source);
    let network = cfg.network.load()?;
    write_network(&network, Path::new(&args.out))?;
    eprintln!("Network written to {}", args.out.display());
    Ok(0)
}

fn execute(cli: &Cli) -> Result<i32> {
    match &cli.command {
        Command::Solve(args) => solve(args),
        Command::Check(args) => check(args),
        Command::ExportNetwork(args) => export_network(args),
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();

    match execute(&cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            process::exit(1);
        }
    }
}

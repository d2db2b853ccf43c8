//! Run a seeded funding round and print the JSON report.
//!
//! Usage: `simulate-round [config.json] [output.json]`

use anyhow::Context;
use simulation::config::SimulationConfig;
use simulation::engine::RoundSimulator;
use simulation::export::{build_export, export_json, write_to_file};
use simulation::scenarios;

fn main() -> Result<(), anyhow::Error> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => {
            let json = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path))?;
            SimulationConfig::from_json(&json)?
        }
        None => SimulationConfig::default(),
    };

    tracing::info!(seed = config.seed, transfers = config.transfers, "Starting round simulation");

    let report = RoundSimulator::run(config.clone())?;
    let scenarios = scenarios::run_all(config.seed)?;
    for s in &scenarios {
        tracing::info!(scenario = %s.name, passed = s.passed, "{}", s.details);
    }

    let export = build_export(&config, &report, scenarios);
    match args.next() {
        Some(out) => {
            write_to_file(&export, &out).with_context(|| format!("writing {}", out))?;
            tracing::info!("Report written to {}", out);
        }
        None => println!("{}", export_json(&export)?),
    }

    if !report.all_invariants_hold() {
        anyhow::bail!("round {} violated an invariant", report.seed);
    }
    Ok(())
}

//! Headless runner: load a scenario directory, run it under H1 and H2, and
//! print the comparison.
//!
//! ```text
//! RUST_LOG=info cargo run -p wagonflow-data --example headless_runner -- [SCENARIO_DIR] [PRIORITY_ID ...]
//! ```
//!
//! Without arguments the bundled `scenarios/two_mines` directory is used.
//! Destination ids after the directory form the H2 priority list.

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use wagonflow_core::batch::compare_heuristics;
use wagonflow_core::ordering::Heuristic;
use wagonflow_data::load_scenario;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut args = std::env::args().skip(1);
    let dir = args.next().map(PathBuf::from).unwrap_or_else(|| {
        PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("scenarios/two_mines")
    });
    let priority: Vec<String> = args.collect();

    let scenario = load_scenario(&dir)?;
    let h1 = scenario.config.clone();
    let h2 = scenario
        .config
        .clone()
        .with_heuristic(Heuristic::h2(priority));

    let (h1_result, h2_result, comparison) = compare_heuristics(&scenario.network, h1, h2)?;

    println!("{:<28} {:>16} {:>16}", "indicator", "H1", "H2");
    println!(
        "{:<28} {:>16.0} {:>16.0}",
        "profit (t.km)", h1_result.metrics.profit_tonne_km, h2_result.metrics.profit_tonne_km
    );
    println!(
        "{:<28} {:>16} {:>16}",
        "days simulated", h1_result.terminal_day, h2_result.terminal_day
    );
    println!(
        "{:<28} {:>15.2}% {:>15.2}%",
        "demand satisfied",
        h1_result.metrics.satisfaction_rate * 100.0,
        h2_result.metrics.satisfaction_rate * 100.0
    );

    println!();
    for dest in &h2_result.metrics.destinations {
        println!(
            "  {:<12} {:>8.1}% of {:>10.0} t",
            dest.id,
            dest.satisfaction_rate * 100.0,
            dest.annual_demand_tons
        );
    }

    println!();
    println!("{}", serde_json::to_string_pretty(&comparison)?);
    Ok(())
}

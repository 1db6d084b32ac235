use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use farmsim::{
    engine::{EngineBuilder, EngineSettings, FarmEvent},
    scenario::ScenarioLoader,
    snapshot,
};

#[derive(Debug, Parser)]
#[command(author, version, about = "Hour-by-hour farm simulation runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/spring_farm.yaml")]
    scenario: PathBuf,

    /// Override run length in simulated hours
    #[arg(long)]
    hours: Option<u64>,

    /// Override snapshot interval in hours (0 disables snapshots)
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Plant a crop before the run, as FIELD=CROP (repeatable)
    #[arg(long = "plant", value_parser = parse_planting)]
    plantings: Vec<(usize, String)>,

    /// Resume from a snapshot file instead of the scenario's start
    #[arg(long)]
    resume: Option<PathBuf>,

    /// Harvest crops into storage as soon as they mature
    #[arg(long)]
    auto_harvest: bool,
}

fn parse_planting(value: &str) -> Result<(usize, String), String> {
    let (field, crop) = value
        .split_once('=')
        .ok_or_else(|| format!("expected FIELD=CROP, got '{value}'"))?;
    let field = field
        .trim()
        .parse()
        .map_err(|err| format!("invalid field index '{field}': {err}"))?;
    Ok((field, crop.trim().to_string()))
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level)),
        )
        .with_target(false)
        .init();

    let hours = scenario.hours(cli.hours);
    let snapshot_interval = cli
        .snapshot_interval
        .unwrap_or(scenario.snapshot_interval_hours);
    let snapshot_dir = cli
        .snapshot_dir
        .unwrap_or_else(|| PathBuf::from("snapshots"));

    let settings = EngineSettings {
        scenario_name: scenario.name.clone(),
        seed: scenario.seed,
        snapshot_interval_ticks: snapshot_interval,
        snapshot_dir,
    };
    let mut engine = EngineBuilder::new(settings).with_farm_systems().build();

    let mut farm = match &cli.resume {
        Some(path) => {
            let record = snapshot::load(path)?;
            engine
                .restore(record, scenario.catalog())
                .with_context(|| format!("Failed to resume from {}", path.display()))?
        }
        None => engine.spawn_farm(&scenario)?,
    };
    info!(
        scenario = %scenario.name,
        start = %farm.now(),
        tick = engine.current_tick(),
        hours,
        "simulation starting"
    );

    for (field, crop) in &cli.plantings {
        farm.plant(*field, crop)
            .with_context(|| format!("Failed to plant {crop} in field {field}"))?;
    }

    let auto_harvest = cli.auto_harvest;
    engine.run_with_hook(&mut farm, hours, |report, farm| {
        if !auto_harvest {
            return;
        }
        for event in &report.events {
            if let FarmEvent::CropMatured { field, .. } = event {
                if let Err(err) = farm.harvest(*field) {
                    warn!(field, %err, "auto-harvest failed");
                }
            }
        }
    })?;

    println!(
        "Scenario '{}' stopped at {} after {} ticks. Funds: {:.2}, debt: {:.2}, credit score: {}, stored lots: {}, status: {}",
        scenario.name,
        farm.now(),
        engine.current_tick(),
        farm.funds(),
        farm.loan().total_debt,
        farm.loan().credit_score,
        farm.storage().len(),
        farm.status()
    );
    Ok(())
}

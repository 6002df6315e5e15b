use clap::Parser;
use log::{debug, info};

use crate::{
    animal::AnimalFate,
    config::Cli,
    model::AnimalType,
};

mod animal;
mod behavior;
mod config;
mod grid;
mod hunter;
mod model;
mod pacing;
mod relocation;
mod report;
mod simulation;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let _logger = flexi_logger::Logger::try_with_str(&cli.log_level)?
        .adaptive_format_for_stderr(flexi_logger::AdaptiveFormat::WithThread)
        .log_to_stderr()
        .start()?;

    let json = cli.json;
    let config = cli.into_config()?;
    debug!("Configuration {}", serde_json::to_string(&config)?);

    let outcome = simulation::run(config).await?;

    let hunted = outcome.count(|fate| matches!(fate, AnimalFate::Hunted { .. }));
    let winter = outcome.count(|fate| matches!(fate, AnimalFate::WinterDeath));
    let snapshot = &outcome.snapshot;
    info!(
        "Simulation finished: {} hunted, {} died wintering, {} left alive ({} bears, {} birds, {} pandas), {} hunters on the grid",
        hunted,
        winter,
        snapshot.total_animals(),
        snapshot.total_of(AnimalType::Bear),
        snapshot.total_of(AnimalType::Bird),
        snapshot.total_of(AnimalType::Panda),
        snapshot.total_hunters(),
    );
    for hunter in &outcome.hunters {
        info!(
            "hunter {} at {}: {} kills ({:?})",
            hunter.id, hunter.location, hunter.kills, hunter.fate
        );
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        print!("{}", snapshot);
    }

    Ok(())
}

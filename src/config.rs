use std::time::Duration;

use clap::Parser;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::behavior::Behavior;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArgumentError {
    #[error("'{0}' is not a number, please enter the number of hunters")]
    NotANumber(String),
    #[error("number of hunters must be non-negative, got {0}")]
    NegativeHunters(i64),
    #[error("grid must be at least 1x1, got {0}x{1}")]
    EmptyGrid(usize, usize),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    pub xlength: usize,
    pub ylength: usize,
    pub hunters: usize,
    pub animals_per_type: usize,
    pub tick: Duration,
    pub stationary_timeout: Duration,
    /// Upper bound on any agent's run time, `None` for no bound.
    pub lifetime: Option<Duration>,
    pub winter_death_probability: f64,
    pub feeding_stay_probability: f64,
    pub seed: Option<u64>,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        let behavior = Behavior::default();
        SimulationConfig {
            xlength: 3,
            ylength: 3,
            hunters: 0,
            animals_per_type: 1,
            tick: Duration::from_millis(1),
            stationary_timeout: Duration::from_secs(1),
            lifetime: None,
            winter_death_probability: behavior.winter_death_probability,
            feeding_stay_probability: behavior.feeding_stay_probability,
            seed: None,
        }
    }
}

impl SimulationConfig {
    pub fn behavior(&self) -> Behavior {
        Behavior {
            winter_death_probability: self.winter_death_probability,
            feeding_stay_probability: self.feeding_stay_probability,
        }
    }
}

#[derive(Debug, Parser)]
#[command(version)]
#[command(about = "Hunters and animals roaming a shared grid of sites, one task per agent")]
pub struct Cli {
    /// Number of hunters (non-negative)
    #[arg(allow_hyphen_values = true)]
    pub hunters: String,

    /// Grid rows
    #[arg(long, default_value_t = 3)]
    pub width: usize,

    /// Grid columns
    #[arg(long, default_value_t = 3)]
    pub height: usize,

    /// Animals of each type (bear, bird, panda)
    #[arg(long, default_value_t = 1)]
    pub animals_per_type: usize,

    /// Milliseconds an agent may stand still before it gives up
    #[arg(long, default_value_t = 1000)]
    pub stationary_timeout_ms: u64,

    /// Milliseconds any agent may run in total (unbounded when omitted)
    #[arg(long)]
    pub lifetime_ms: Option<u64>,

    /// Random seed for reproducible site types and placements
    #[arg(long)]
    pub seed: Option<u64>,

    /// Log specification, e.g. "info" or "debug"
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the final grid as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    pub fn into_config(self) -> Result<SimulationConfig, ArgumentError> {
        let hunters = parse_hunter_count(&self.hunters)?;
        if self.width == 0 || self.height == 0 {
            return Err(ArgumentError::EmptyGrid(self.width, self.height));
        }

        Ok(SimulationConfig {
            xlength: self.width,
            ylength: self.height,
            hunters,
            animals_per_type: self.animals_per_type,
            stationary_timeout: Duration::from_millis(self.stationary_timeout_ms),
            lifetime: self.lifetime_ms.map(Duration::from_millis),
            seed: self.seed,
            ..SimulationConfig::default()
        })
    }
}

pub fn parse_hunter_count(input: &str) -> Result<usize, ArgumentError> {
    let value = input
        .trim()
        .parse::<i64>()
        .map_err(|_| ArgumentError::NotANumber(input.to_string()))?;
    if value < 0 {
        return Err(ArgumentError::NegativeHunters(value));
    }
    usize::try_from(value).map_err(|_| ArgumentError::NotANumber(input.to_string()))
}

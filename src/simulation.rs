use std::sync::Arc;

use anyhow::Context;
use log::{debug, error, info};
use rand::{rngs::StdRng, SeedableRng};
use serde::Serialize;

use crate::{
    animal::{Animal, AnimalAgent, AnimalFate, AnimalReport},
    config::SimulationConfig,
    grid::{AnimalRef, Grid, SiteError},
    hunter::{Hunter, HunterAgent, HunterReport},
    model::{AnimalType, Location},
    report::GridSnapshot,
};

/// Starting positions of every agent.
#[derive(Debug, Clone, Default)]
pub struct Population {
    pub animals: Vec<(AnimalType, Location)>,
    pub hunters: Vec<Location>,
}

impl Population {
    pub fn random(config: &SimulationConfig, grid: &Grid, rng: &mut StdRng) -> Population {
        let bounds = grid.bounds();
        let mut animals = Vec::new();
        for _ in 0..config.animals_per_type {
            for kind in AnimalType::ALL {
                animals.push((kind, bounds.random_location(rng)));
            }
        }
        let hunters = (0..config.hunters)
            .map(|_| bounds.random_location(rng))
            .collect();

        Population { animals, hunters }
    }
}

#[derive(Debug, Serialize)]
pub struct SimulationOutcome {
    pub animals: Vec<AnimalReport>,
    pub hunters: Vec<HunterReport>,
    pub snapshot: GridSnapshot,
}

impl SimulationOutcome {
    pub fn count(&self, matches: impl Fn(&AnimalFate) -> bool) -> usize {
        self.animals
            .iter()
            .filter(|report| matches(&report.fate))
            .count()
    }
}

struct SeedSource {
    seed: Option<u64>,
    next: u64,
}

impl SeedSource {
    fn new(seed: Option<u64>) -> SeedSource {
        SeedSource { seed, next: 0 }
    }

    fn rng(&mut self) -> StdRng {
        let index = self.next;
        self.next += 1;
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(index)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Builds a random grid and population from the configuration and runs it.
pub async fn run(config: SimulationConfig) -> anyhow::Result<SimulationOutcome> {
    let mut seeds = SeedSource::new(config.seed);
    let grid = Grid::random(config.xlength, config.ylength, &mut seeds.rng());
    let population = Population::random(&config, &grid, &mut seeds.rng());
    run_with(config, grid, population).await
}

/// Places the population on the grid, runs one task per agent and waits for
/// all of them.
pub async fn run_with(
    config: SimulationConfig,
    grid: Grid,
    population: Population,
) -> anyhow::Result<SimulationOutcome> {
    let grid = Arc::new(grid);
    // offset past the streams used for grid and placement
    let mut seeds = SeedSource::new(config.seed.map(|seed| seed.wrapping_add(2)));

    let mut animals = Vec::with_capacity(population.animals.len());
    for (kind, location) in population.animals {
        let animal = Animal::new(kind, location);
        grid.site(location)
            .lock()
            .await
            .add_animal(AnimalRef {
                id: animal.id,
                kind,
            })
            .context("placing animal")?;
        animals.push(animal);
    }

    let mut hunters = Vec::with_capacity(population.hunters.len());
    for location in population.hunters {
        let hunter = Hunter::new(location);
        grid.site(location)
            .lock()
            .await
            .add_hunter(hunter.presence.clone())
            .context("placing hunter")?;
        hunters.push(hunter);
    }

    info!(
        "Simulation starting: {}x{} grid, {} animals, {} hunters",
        config.xlength,
        config.ylength,
        animals.len(),
        hunters.len()
    );

    let presences: Vec<_> = hunters.iter().map(|hunter| hunter.presence.clone()).collect();
    let hunter_tasks: Vec<_> = hunters
        .into_iter()
        .map(|hunter| HunterAgent::start(hunter, grid.clone(), &config, seeds.rng()))
        .collect();
    let animal_tasks: Vec<_> = animals
        .into_iter()
        .map(|animal| AnimalAgent::start(animal, grid.clone(), &config, seeds.rng()))
        .collect();

    let mut failure: Option<SiteError> = None;

    let mut hunter_reports = Vec::with_capacity(hunter_tasks.len());
    for (task, presence) in hunter_tasks.into_iter().zip(presences) {
        match task.await.context("hunter task panicked")? {
            Ok(mut report) => {
                // animals hunted after the hunter's task ended still count
                report.kills = presence.kills();
                hunter_reports.push(report);
            }
            Err(e) => {
                error!("hunter {} failed: {}", presence.id, e);
                failure.get_or_insert(e);
            }
        }
    }

    let mut animal_reports = Vec::with_capacity(animal_tasks.len());
    for task in animal_tasks {
        match task.await.context("animal task panicked")? {
            Ok(report) => animal_reports.push(report),
            Err(e) => {
                error!("animal task failed: {}", e);
                failure.get_or_insert(e);
            }
        }
    }

    if let Some(e) = failure {
        return Err(e).context("simulation aborted");
    }

    debug!("Simulation finished with {} animals on the grid", grid.animal_count());
    let snapshot = GridSnapshot::capture(&grid).await;

    Ok(SimulationOutcome {
        animals: animal_reports,
        hunters: hunter_reports,
        snapshot,
    })
}

#[cfg(test)]
mod tests {
    use std::{collections::HashMap, time::Duration};

    use crate::model::{AnimalId, AnimalStatus, SiteType};

    use super::*;

    fn fast_config() -> SimulationConfig {
        SimulationConfig {
            stationary_timeout: Duration::from_millis(100),
            lifetime: Some(Duration::from_millis(500)),
            seed: Some(42),
            ..SimulationConfig::default()
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn hunters_on_single_site_kill_the_animal_first_tick() {
        let grid = Grid::new(1, 1, |_| SiteType::Feeding);
        let origin = Location::new(0, 0);
        let population = Population {
            animals: vec![(AnimalType::Bear, origin)],
            hunters: vec![origin, origin],
        };

        let outcome = run_with(fast_config(), grid, population).await.unwrap();

        let animal = &outcome.animals[0];
        assert!(matches!(animal.fate, AnimalFate::Hunted { by: Some(_) }));
        assert_eq!(animal.status, AnimalStatus::Dead);
        assert_eq!(animal.ticks, 1);
        let kills: u32 = outcome.hunters.iter().map(|h| h.kills).sum();
        assert_eq!(kills, 1);
        assert_eq!(outcome.snapshot.total_animals(), 0);
        assert_eq!(outcome.snapshot.total_hunters(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn lone_bird_in_winter_without_hunters() {
        let grid = Grid::new(3, 3, |_| SiteType::Wintering);
        let population = Population {
            animals: vec![(AnimalType::Bird, Location::new(0, 0))],
            hunters: Vec::new(),
        };

        let outcome = run_with(fast_config(), grid, population).await.unwrap();

        let bird = &outcome.animals[0];
        assert!(matches!(
            bird.fate,
            AnimalFate::WinterDeath | AnimalFate::TimedOut
        ));
        let expected = usize::from(bird.status == AnimalStatus::Alive);
        assert_eq!(outcome.snapshot.total_animals(), expected);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn crowded_run_keeps_grid_consistent_with_agents() {
        let config = SimulationConfig {
            xlength: 5,
            ylength: 4,
            hunters: 6,
            animals_per_type: 4,
            ..fast_config()
        };

        let outcome = run(config).await.unwrap();
        let snapshot = &outcome.snapshot;

        // every surviving animal sits where it reported itself, dead ones nowhere
        let mut expected_animals: HashMap<Location, [usize; 3]> = HashMap::new();
        for report in &outcome.animals {
            if report.status == AnimalStatus::Alive {
                expected_animals.entry(report.location).or_default()[report.kind.index()] += 1;
            }
        }
        let mut expected_hunters: HashMap<Location, usize> = HashMap::new();
        for report in &outcome.hunters {
            *expected_hunters.entry(report.location).or_default() += 1;
        }
        for cell in &snapshot.cells {
            assert_eq!(
                cell.animals,
                expected_animals.get(&cell.location).copied().unwrap_or_default(),
                "animals at {}",
                cell.location
            );
            assert_eq!(
                cell.hunters,
                expected_hunters.get(&cell.location).copied().unwrap_or_default(),
                "hunters at {}",
                cell.location
            );
        }

        // one kill per hunted animal
        let hunted = outcome.count(|fate| matches!(fate, AnimalFate::Hunted { .. }));
        let kills: u32 = outcome.hunters.iter().map(|h| h.kills).sum();
        assert_eq!(kills as usize, hunted);

        let alive = outcome
            .animals
            .iter()
            .filter(|report| report.status == AnimalStatus::Alive)
            .count();
        assert_eq!(snapshot.total_animals(), alive);
        assert_eq!(outcome.animals.len(), 12);
        assert_eq!(outcome.hunters.len(), 6);
        assert_eq!(snapshot.total_hunters(), 6);

        // no animal id is stored on two sites
        let mut placed: HashMap<AnimalId, Location> = HashMap::new();
        for cell in &snapshot.cells {
            for id in &cell.residents {
                let previous = placed.insert(*id, cell.location);
                assert_eq!(previous, None, "animal {} on two sites", id);
            }
        }
        for report in &outcome.animals {
            match report.status {
                AnimalStatus::Alive => assert_eq!(placed.get(&report.id), Some(&report.location)),
                AnimalStatus::Dead => assert_eq!(placed.get(&report.id), None),
            }
        }
        assert_eq!(placed.len(), alive);
    }

    #[tokio::test]
    async fn seeded_population_is_reproducible() {
        let config = SimulationConfig {
            hunters: 3,
            seed: Some(9),
            ..SimulationConfig::default()
        };
        let mut first_seeds = SeedSource::new(config.seed);
        let mut second_seeds = SeedSource::new(config.seed);
        let first_grid = Grid::random(3, 3, &mut first_seeds.rng());
        let second_grid = Grid::random(3, 3, &mut second_seeds.rng());
        let first = Population::random(&config, &first_grid, &mut first_seeds.rng());
        let second = Population::random(&config, &second_grid, &mut second_seeds.rng());

        assert_eq!(first.animals, second.animals);
        assert_eq!(first.hunters, second.hunters);
        assert_eq!(first.animals.len(), 3);
        for (a, b) in first_grid.sites().iter().zip(second_grid.sites()) {
            assert_eq!(a.kind(), b.kind());
        }
    }
}

use std::sync::Arc;

use log::{debug, error, info};
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    behavior::propose_move,
    config::SimulationConfig,
    grid::{Grid, HunterRef, SiteError},
    model::{HunterId, Location},
    pacing::Pacing,
    relocation::relocate_hunter,
};

#[derive(Debug, Clone)]
pub struct Hunter {
    pub presence: HunterRef,
    pub location: Location,
}

impl Hunter {
    pub fn new(location: Location) -> Hunter {
        Hunter {
            presence: HunterRef::new(HunterId::new_v4()),
            location,
        }
    }

    pub fn id(&self) -> HunterId {
        self.presence.id
    }

    pub fn kills(&self) -> u32 {
        self.presence.kills()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HunterFate {
    NoAnimalsLeft,
    TimedOut,
    LifetimeExpired,
    /// Its presence was missing from its site when it tried to move.
    Displaced,
}

#[derive(Debug, Clone, Serialize)]
pub struct HunterReport {
    pub id: HunterId,
    pub location: Location,
    pub kills: u32,
    pub fate: HunterFate,
}

pub struct HunterAgent {
    hunter: Hunter,
    grid: Arc<Grid>,
    pacing: Pacing,
    rng: StdRng,
}

impl HunterAgent {
    /// The hunter must already be registered at its site.
    pub fn start(
        hunter: Hunter,
        grid: Arc<Grid>,
        config: &SimulationConfig,
        rng: StdRng,
    ) -> JoinHandle<Result<HunterReport, SiteError>> {
        let agent = HunterAgent {
            hunter,
            grid,
            pacing: Pacing::new(config),
            rng,
        };
        tokio::spawn(agent.run())
    }

    async fn run(mut self) -> Result<HunterReport, SiteError> {
        debug!("hunter {} starting at {}", self.hunter.id(), self.hunter.location);
        let grid = self.grid.clone();
        loop {
            if !grid.any_animal_alive() {
                info!("hunter {} sees no animals left", self.hunter.id());
                return Ok(self.report(HunterFate::NoAnimalsLeft));
            }
            if self.pacing.expired() {
                debug!("hunter {} ran out of time", self.hunter.id());
                return Ok(self.report(HunterFate::LifetimeExpired));
            }

            let candidate = propose_move(self.hunter.location, grid.bounds(), &mut self.rng);
            if candidate == self.hunter.location {
                if self.pacing.stay().await {
                    info!(
                        "hunter {} stood still too long, stopping after {:?}",
                        self.hunter.id(),
                        self.pacing.elapsed()
                    );
                    return Ok(self.report(HunterFate::TimedOut));
                }
                continue;
            }

            let id = self.hunter.id();
            match relocate_hunter(&grid, id, &mut self.hunter.location, candidate).await {
                Ok(()) => {}
                Err(SiteError::AgentNotFound(_)) => {
                    error!("hunter {} missing from {}", id, self.hunter.location);
                    return Ok(self.report(HunterFate::Displaced));
                }
                Err(e) => return Err(e),
            }
            self.pacing.moved().await;
        }
    }

    fn report(&self, fate: HunterFate) -> HunterReport {
        HunterReport {
            id: self.hunter.id(),
            location: self.hunter.location,
            kills: self.hunter.kills(),
            fate,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;

    use crate::{
        grid::AnimalRef,
        model::{AnimalId, AnimalType, SiteType},
    };

    use super::*;

    fn config() -> SimulationConfig {
        SimulationConfig {
            stationary_timeout: Duration::from_millis(50),
            lifetime: Some(Duration::from_secs(5)),
            ..SimulationConfig::default()
        }
    }

    async fn register(grid: &Grid, hunter: &Hunter) {
        grid.site(hunter.location)
            .lock()
            .await
            .add_hunter(hunter.presence.clone())
            .unwrap();
    }

    #[tokio::test]
    async fn hunter_stops_immediately_without_animals() {
        let grid = Arc::new(Grid::new(3, 3, |_| SiteType::Feeding));
        let hunter = Hunter::new(Location::new(1, 1));
        register(&grid, &hunter).await;

        let report = HunterAgent::start(hunter, grid.clone(), &config(), StdRng::seed_from_u64(1))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fate, HunterFate::NoAnimalsLeft);
        assert_eq!(report.location, Location::new(1, 1));
        assert_eq!(grid.site(report.location).lock().await.hunter_count(), 1);
    }

    #[tokio::test]
    async fn hunter_on_single_site_times_out() {
        let grid = Arc::new(Grid::new(1, 1, |_| SiteType::Feeding));
        let origin = Location::new(0, 0);
        grid.site(origin)
            .lock()
            .await
            .add_animal(AnimalRef {
                id: AnimalId::new_v4(),
                kind: AnimalType::Bear,
            })
            .unwrap();
        let hunter = Hunter::new(origin);
        register(&grid, &hunter).await;

        let report = HunterAgent::start(hunter, grid.clone(), &config(), StdRng::seed_from_u64(2))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fate, HunterFate::TimedOut);
        assert_eq!(grid.site(origin).lock().await.hunter_count(), 1);
    }

    #[tokio::test]
    async fn roaming_hunter_keeps_presence_consistent() {
        let grid = Arc::new(Grid::new(4, 4, |_| SiteType::Nesting));
        grid.site(Location::new(3, 3))
            .lock()
            .await
            .add_animal(AnimalRef {
                id: AnimalId::new_v4(),
                kind: AnimalType::Bird,
            })
            .unwrap();
        let hunter = Hunter::new(Location::new(0, 0));
        register(&grid, &hunter).await;
        let config = SimulationConfig {
            lifetime: Some(Duration::from_millis(100)),
            ..config()
        };

        let report = HunterAgent::start(hunter, grid.clone(), &config, StdRng::seed_from_u64(3))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fate, HunterFate::LifetimeExpired);
        for site in grid.sites() {
            let expected = usize::from(site.location() == report.location);
            assert_eq!(site.lock().await.hunter_count(), expected);
        }
    }

    #[tokio::test]
    async fn unregistered_hunter_is_displaced() {
        let grid = Arc::new(Grid::new(2, 2, |_| SiteType::Nesting));
        grid.site(Location::new(1, 1))
            .lock()
            .await
            .add_animal(AnimalRef {
                id: AnimalId::new_v4(),
                kind: AnimalType::Panda,
            })
            .unwrap();
        let hunter = Hunter::new(Location::new(0, 0));

        let report = HunterAgent::start(hunter, grid.clone(), &config(), StdRng::seed_from_u64(4))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(report.fate, HunterFate::Displaced);
        assert_eq!(report.location, Location::new(0, 0));
    }
}

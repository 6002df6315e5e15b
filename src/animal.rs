use std::sync::Arc;

use log::{debug, info, trace};
use rand::rngs::StdRng;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::{
    behavior::{Behavior, Decision},
    config::SimulationConfig,
    grid::{Grid, SiteError, SiteGuard},
    model::{AnimalId, AnimalStatus, AnimalType, HunterId, Location},
    pacing::Pacing,
    relocation::relocate_animal,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Animal {
    pub id: AnimalId,
    pub kind: AnimalType,
    pub status: AnimalStatus,
    pub location: Location,
}

impl Animal {
    pub fn new(kind: AnimalType, location: Location) -> Animal {
        Animal {
            id: AnimalId::new_v4(),
            kind,
            status: AnimalStatus::Alive,
            location,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AnimalFate {
    /// Credited to the hunter that had been at the site longest.
    Hunted { by: Option<HunterId> },
    WinterDeath,
    TimedOut,
    LifetimeExpired,
    /// Its site no longer held it when it tried to move.
    Vanished,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnimalReport {
    pub id: AnimalId,
    pub kind: AnimalType,
    pub status: AnimalStatus,
    pub location: Location,
    pub fate: AnimalFate,
    pub ticks: u64,
}

pub struct AnimalAgent {
    animal: Animal,
    grid: Arc<Grid>,
    behavior: Behavior,
    pacing: Pacing,
    rng: StdRng,
    ticks: u64,
}

impl AnimalAgent {
    /// The animal must already be registered at its site.
    pub fn start(
        animal: Animal,
        grid: Arc<Grid>,
        config: &SimulationConfig,
        rng: StdRng,
    ) -> JoinHandle<Result<AnimalReport, SiteError>> {
        let agent = AnimalAgent {
            animal,
            grid,
            behavior: config.behavior(),
            pacing: Pacing::new(config),
            rng,
            ticks: 0,
        };
        tokio::spawn(agent.run())
    }

    async fn run(mut self) -> Result<AnimalReport, SiteError> {
        debug!(
            "{:?} {} starting at {}",
            self.animal.kind, self.animal.id, self.animal.location
        );
        loop {
            if self.pacing.expired() {
                debug!("{} ran out of time", self.animal.id);
                return Ok(self.report(AnimalFate::LifetimeExpired));
            }
            self.ticks += 1;

            let grid = self.grid.clone();
            let candidate = {
                let mut site = grid.site(self.animal.location).lock().await;
                let decision = self.behavior.decide(
                    site.hunter_count(),
                    site.kind(),
                    self.animal.location,
                    grid.bounds(),
                    &mut self.rng,
                );
                match decision {
                    Decision::Hunted => return self.die(&mut site, true),
                    Decision::WinterDeath => return self.die(&mut site, false),
                    Decision::Stay => self.animal.location,
                    Decision::Move(candidate) => candidate,
                }
            };

            if candidate == self.animal.location {
                if self.pacing.stay().await {
                    info!(
                        "{} stood still too long, stopping after {:?}",
                        self.animal.id,
                        self.pacing.elapsed()
                    );
                    return Ok(self.report(AnimalFate::TimedOut));
                }
                continue;
            }

            match relocate_animal(&grid, self.animal.id, &mut self.animal.location, candidate).await {
                Ok(()) => {}
                Err(SiteError::AgentNotFound(_)) => {
                    info!("{} no longer at its site, stopping", self.animal.id);
                    self.animal.status = AnimalStatus::Dead;
                    return Ok(self.report(AnimalFate::Vanished));
                }
                Err(e) => return Err(e),
            }
            self.pacing.moved().await;
        }
    }

    /// Removes the animal from its (locked) site and marks it dead.
    fn die(&mut self, site: &mut SiteGuard<'_>, hunted: bool) -> Result<AnimalReport, SiteError> {
        match site.remove_animal(self.animal.id) {
            Ok(_) => {}
            Err(SiteError::AgentNotFound(_)) => {
                self.animal.status = AnimalStatus::Dead;
                return Ok(self.report(AnimalFate::Vanished));
            }
            Err(e) => return Err(e),
        }
        self.animal.status = AnimalStatus::Dead;

        let fate = if hunted {
            let by = site.hunters().first().map(|hunter| {
                hunter.credit_kill();
                hunter.id
            });
            info!(
                "{:?} {} hunted at {} by {:?}",
                self.animal.kind, self.animal.id, self.animal.location, by
            );
            AnimalFate::Hunted { by }
        } else {
            info!(
                "{:?} {} died wintering at {}",
                self.animal.kind, self.animal.id, self.animal.location
            );
            AnimalFate::WinterDeath
        };
        trace!("{} lived {} ticks", self.animal.id, self.ticks);

        Ok(self.report(fate))
    }

    fn report(&self, fate: AnimalFate) -> AnimalReport {
        AnimalReport {
            id: self.animal.id,
            kind: self.animal.kind,
            status: self.animal.status,
            location: self.animal.location,
            fate,
            ticks: self.ticks,
        }
    }
}

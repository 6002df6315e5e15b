use rand::Rng;

use crate::{
    grid::Bounds,
    model::{Location, SiteType},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    West,
    East,
    North,
    South,
}

impl Direction {
    pub fn random(rng: &mut impl Rng) -> Direction {
        match rng.gen_range(0..4) {
            0 => Direction::West,
            1 => Direction::East,
            2 => Direction::North,
            _ => Direction::South,
        }
    }

    /// One step in this direction. A step that would leave the grid is no step.
    pub fn step(self, from: Location, bounds: Bounds) -> Location {
        let Location { x, y } = from;
        match self {
            Direction::West if x > 0 => Location { x: x - 1, y },
            Direction::East if x + 1 < bounds.xlength => Location { x: x + 1, y },
            Direction::North if y > 0 => Location { x, y: y - 1 },
            Direction::South if y + 1 < bounds.ylength => Location { x, y: y + 1 },
            _ => from,
        }
    }
}

pub fn propose_move(from: Location, bounds: Bounds, rng: &mut impl Rng) -> Location {
    Direction::random(rng).step(from, bounds)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Hunted,
    WinterDeath,
    Stay,
    Move(Location),
}

#[derive(Debug, Clone, Copy)]
pub struct Behavior {
    pub winter_death_probability: f64,
    pub feeding_stay_probability: f64,
}

impl Default for Behavior {
    fn default() -> Self {
        Behavior {
            winter_death_probability: 0.5,
            feeding_stay_probability: 0.8,
        }
    }
}

impl Behavior {
    /// What an animal does this tick, given what it sees at its own site.
    /// A hunted animal never draws from `rng`.
    pub fn decide(
        &self,
        hunters_present: usize,
        site_type: SiteType,
        from: Location,
        bounds: Bounds,
        rng: &mut impl Rng,
    ) -> Decision {
        if hunters_present > 0 {
            return Decision::Hunted;
        }

        match site_type {
            SiteType::Nesting => Decision::Move(propose_move(from, bounds, rng)),
            SiteType::Wintering => {
                if rng.gen::<f64>() < self.winter_death_probability {
                    Decision::WinterDeath
                } else {
                    Decision::Move(propose_move(from, bounds, rng))
                }
            }
            SiteType::Feeding => {
                if rng.gen::<f64>() < self.feeding_stay_probability {
                    Decision::Stay
                } else {
                    Decision::Move(propose_move(from, bounds, rng))
                }
            }
        }
    }
}

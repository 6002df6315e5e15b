use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Location {
    pub x: usize,
    pub y: usize,
}

impl Location {
    pub fn new(x: usize, y: usize) -> Location {
        Location { x, y }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SiteType {
    Feeding,
    Nesting,
    Wintering,
}

impl SiteType {
    /// Numeric identifier used in the grid report.
    pub fn id(self) -> u8 {
        match self {
            SiteType::Feeding => 0,
            SiteType::Nesting => 1,
            SiteType::Wintering => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnimalType {
    Bear,
    Bird,
    Panda,
}

impl AnimalType {
    pub const ALL: [AnimalType; 3] = [AnimalType::Bear, AnimalType::Bird, AnimalType::Panda];

    pub fn index(self) -> usize {
        match self {
            AnimalType::Bear => 0,
            AnimalType::Bird => 1,
            AnimalType::Panda => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnimalStatus {
    Alive,
    Dead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub Uuid);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HunterId(pub Uuid);

impl AnimalId {
    pub fn new_v4() -> AnimalId {
        AnimalId(Uuid::new_v4())
    }
}

impl HunterId {
    pub fn new_v4() -> HunterId {
        HunterId(Uuid::new_v4())
    }
}

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl fmt::Display for HunterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

use std::{
    collections::TryReserveError,
    sync::{
        atomic::{AtomicU32, AtomicUsize, Ordering},
        Arc,
    },
};

use rand::Rng;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use crate::model::{AnimalId, AnimalType, HunterId, Location, SiteType};

#[derive(Debug, Error)]
pub enum SiteError {
    #[error("site storage could not grow: {0}")]
    ResourceExhausted(#[from] TryReserveError),
    #[error("agent {0} is not present at this site")]
    AgentNotFound(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub xlength: usize,
    pub ylength: usize,
}

impl Bounds {
    pub fn contains(&self, location: Location) -> bool {
        location.x < self.xlength && location.y < self.ylength
    }

    pub fn random_location(&self, rng: &mut impl Rng) -> Location {
        Location::new(rng.gen_range(0..self.xlength), rng.gen_range(0..self.ylength))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnimalRef {
    pub id: AnimalId,
    pub kind: AnimalType,
}

/// A hunter as registered at a site. The kill counter is shared with the
/// hunter's own task so a hunted animal can credit it.
#[derive(Debug, Clone)]
pub struct HunterRef {
    pub id: HunterId,
    kills: Arc<AtomicU32>,
}

impl HunterRef {
    pub fn new(id: HunterId) -> HunterRef {
        HunterRef {
            id,
            kills: Arc::new(AtomicU32::new(0)),
        }
    }

    pub fn credit_kill(&self) {
        self.kills.fetch_add(1, Ordering::AcqRel);
    }

    pub fn kills(&self) -> u32 {
        self.kills.load(Ordering::Acquire)
    }
}

#[derive(Debug, Default)]
struct Occupants {
    animals: Vec<AnimalRef>,
    hunters: Vec<HunterRef>,
}

#[derive(Debug)]
pub struct Site {
    location: Location,
    kind: SiteType,
    occupants: Mutex<Occupants>,
    // Mirrors occupants.animals.len(), only written with the lock held.
    animal_count: AtomicUsize,
}

/// Exclusive access to one site's occupants.
pub struct SiteGuard<'a> {
    site: &'a Site,
    occupants: MutexGuard<'a, Occupants>,
}

impl Site {
    fn new(location: Location, kind: SiteType) -> Site {
        Site {
            location,
            kind,
            occupants: Mutex::new(Occupants::default()),
            animal_count: AtomicUsize::new(0),
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn kind(&self) -> SiteType {
        self.kind
    }

    /// Lock-free read, may be stale by the time the caller acts on it.
    pub fn animal_count(&self) -> usize {
        self.animal_count.load(Ordering::Acquire)
    }

    pub async fn lock(&self) -> SiteGuard<'_> {
        SiteGuard {
            site: self,
            occupants: self.occupants.lock().await,
        }
    }
}

impl SiteGuard<'_> {
    pub fn location(&self) -> Location {
        self.site.location
    }

    pub fn kind(&self) -> SiteType {
        self.site.kind
    }

    pub fn animals(&self) -> &[AnimalRef] {
        &self.occupants.animals
    }

    pub fn hunters(&self) -> &[HunterRef] {
        &self.occupants.hunters
    }

    pub fn hunter_count(&self) -> usize {
        self.occupants.hunters.len()
    }

    #[cfg(test)]
    pub fn contains_animal(&self, id: AnimalId) -> bool {
        self.occupants.animals.iter().any(|animal| animal.id == id)
    }

    pub fn add_animal(&mut self, animal: AnimalRef) -> Result<(), SiteError> {
        self.occupants.animals.try_reserve(1)?;
        self.occupants.animals.push(animal);
        self.sync_animal_count();
        Ok(())
    }

    /// Removes by identity with swap-with-last, so the order of the remaining
    /// animals is not preserved.
    pub fn remove_animal(&mut self, id: AnimalId) -> Result<AnimalRef, SiteError> {
        let index = self
            .occupants
            .animals
            .iter()
            .position(|animal| animal.id == id)
            .ok_or(SiteError::AgentNotFound(id.0))?;
        let removed = self.occupants.animals.swap_remove(index);
        self.sync_animal_count();
        Ok(removed)
    }

    pub fn add_hunter(&mut self, hunter: HunterRef) -> Result<(), SiteError> {
        self.occupants.hunters.try_reserve(1)?;
        self.occupants.hunters.push(hunter);
        Ok(())
    }

    /// Keeps the remaining hunters in arrival order, so the first one is
    /// always the one that has been here longest.
    pub fn remove_hunter(&mut self, id: HunterId) -> Result<HunterRef, SiteError> {
        let index = self
            .occupants
            .hunters
            .iter()
            .position(|hunter| hunter.id == id)
            .ok_or(SiteError::AgentNotFound(id.0))?;
        Ok(self.occupants.hunters.remove(index))
    }

    fn sync_animal_count(&self) {
        self.site
            .animal_count
            .store(self.occupants.animals.len(), Ordering::Release);
    }
}

/// Two site locks taken in ascending location order.
pub struct LockedPair<'a> {
    // Fields drop in declaration order, so the later lock is released first.
    later: SiteGuard<'a>,
    earlier: SiteGuard<'a>,
}

impl<'a> LockedPair<'a> {
    /// Returns `(source, destination)`, where destination is the other site.
    pub fn split_mut(&mut self, source: Location) -> (&mut SiteGuard<'a>, &mut SiteGuard<'a>) {
        if self.earlier.location() == source {
            (&mut self.earlier, &mut self.later)
        } else {
            (&mut self.later, &mut self.earlier)
        }
    }
}

#[derive(Debug)]
pub struct Grid {
    bounds: Bounds,
    sites: Vec<Site>,
}

impl Grid {
    pub fn new(
        xlength: usize,
        ylength: usize,
        mut site_type: impl FnMut(Location) -> SiteType,
    ) -> Grid {
        assert!(xlength > 0 && ylength > 0, "grid must have at least one site");

        let mut sites = Vec::with_capacity(xlength * ylength);
        for x in 0..xlength {
            for y in 0..ylength {
                let location = Location { x, y };
                sites.push(Site::new(location, site_type(location)));
            }
        }

        Grid {
            bounds: Bounds { xlength, ylength },
            sites,
        }
    }

    /// Site types are drawn with roughly equal probability.
    pub fn random(xlength: usize, ylength: usize, rng: &mut impl Rng) -> Grid {
        Grid::new(xlength, ylength, |_| {
            let r = rng.gen::<f64>();
            if r < 0.33 {
                SiteType::Wintering
            } else if r < 0.66 {
                SiteType::Feeding
            } else {
                SiteType::Nesting
            }
        })
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn sites(&self) -> &[Site] {
        &self.sites
    }

    pub fn site(&self, location: Location) -> &Site {
        debug_assert!(self.bounds.contains(location));
        &self.sites[location.x * self.bounds.ylength + location.y]
    }

    /// Whether any site currently holds an animal. Reads without locking, so
    /// concurrent callers can get different answers at the same moment.
    pub fn any_animal_alive(&self) -> bool {
        self.sites.iter().any(|site| site.animal_count() > 0)
    }

    pub fn animal_count(&self) -> usize {
        self.sites.iter().map(|site| site.animal_count()).sum()
    }

    /// Locks two distinct sites in ascending `(x, y)` order.
    pub async fn lock_pair(&self, a: Location, b: Location) -> LockedPair<'_> {
        debug_assert_ne!(a, b);
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let earlier = self.site(low).lock().await;
        let later = self.site(high).lock().await;
        LockedPair { later, earlier }
    }
}

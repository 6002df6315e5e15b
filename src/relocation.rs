use log::trace;

use crate::{
    grid::{Grid, SiteError},
    model::{AnimalId, HunterId, Location},
};

/// Moves an animal from the site at `location` to the site at `target` and
/// stores `target` in `location`. Both sites stay locked for the whole
/// transfer. Returns `AgentNotFound` if the animal is no longer at its site,
/// in which case nothing changes.
pub async fn relocate_animal(
    grid: &Grid,
    id: AnimalId,
    location: &mut Location,
    target: Location,
) -> Result<(), SiteError> {
    if *location == target {
        return Ok(());
    }

    let mut sites = grid.lock_pair(*location, target).await;
    let (source, destination) = sites.split_mut(*location);

    let Some(animal) = source.animals().iter().find(|animal| animal.id == id).copied() else {
        return Err(SiteError::AgentNotFound(id.0));
    };

    // Insert first so a failed allocation leaves the animal where it was.
    destination.add_animal(animal)?;
    source.remove_animal(id)?;
    *location = target;

    trace!("animal {} moved {} -> {}", id, source.location(), target);
    Ok(())
}

/// Same as [`relocate_animal`] for a hunter's presence.
pub async fn relocate_hunter(
    grid: &Grid,
    id: HunterId,
    location: &mut Location,
    target: Location,
) -> Result<(), SiteError> {
    if *location == target {
        return Ok(());
    }

    let mut sites = grid.lock_pair(*location, target).await;
    let (source, destination) = sites.split_mut(*location);

    let Some(hunter) = source.hunters().iter().find(|hunter| hunter.id == id).cloned() else {
        return Err(SiteError::AgentNotFound(id.0));
    };

    destination.add_hunter(hunter)?;
    source.remove_hunter(id)?;
    *location = target;

    trace!("hunter {} moved {} -> {}", id, source.location(), target);
    Ok(())
}

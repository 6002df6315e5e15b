use std::fmt;

use serde::Serialize;

use crate::{
    grid::Grid,
    model::{AnimalId, AnimalType, Location, SiteType},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CellSnapshot {
    pub location: Location,
    pub site_type: SiteType,
    /// Indexed by [`AnimalType::index`]: bears, birds, pandas.
    pub animals: [usize; 3],
    pub hunters: usize,
    /// Ids of the animals on the site, in storage order.
    pub residents: Vec<AnimalId>,
}

#[derive(Debug, Clone, Serialize)]
pub struct GridSnapshot {
    pub xlength: usize,
    pub ylength: usize,
    pub cells: Vec<CellSnapshot>,
}

impl GridSnapshot {
    /// Locks one site at a time, so the result is only consistent once every
    /// agent task has finished.
    pub async fn capture(grid: &Grid) -> GridSnapshot {
        let mut cells = Vec::with_capacity(grid.sites().len());
        for site in grid.sites() {
            let guard = site.lock().await;
            let mut animals = [0; 3];
            let mut residents = Vec::with_capacity(guard.animals().len());
            for animal in guard.animals() {
                animals[animal.kind.index()] += 1;
                residents.push(animal.id);
            }
            cells.push(CellSnapshot {
                location: site.location(),
                site_type: site.kind(),
                animals,
                hunters: guard.hunter_count(),
                residents,
            });
        }

        let bounds = grid.bounds();
        GridSnapshot {
            xlength: bounds.xlength,
            ylength: bounds.ylength,
            cells,
        }
    }

    pub fn total_animals(&self) -> usize {
        self.cells.iter().map(|cell| cell.animals.iter().sum::<usize>()).sum()
    }

    pub fn total_of(&self, kind: AnimalType) -> usize {
        self.cells.iter().map(|cell| cell.animals[kind.index()]).sum()
    }

    pub fn total_hunters(&self) -> usize {
        self.cells.iter().map(|cell| cell.hunters).sum()
    }
}

impl fmt::Display for GridSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(self.ylength) {
            for cell in row {
                let [bears, birds, pandas] = cell.animals;
                write!(
                    f,
                    "|{}-{{{}, {}, {}}}{{{}}}|",
                    cell.site_type.id(),
                    bears,
                    birds,
                    pandas,
                    cell.hunters
                )?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

//! Saving and restoring the population between runs.
//!
//! A snapshot is a flat list of animal attribute bundles plus the current
//! (year, week). Cells are referenced by key rather than by index so that a
//! snapshot stays valid against any landscape with the same cell keys.
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::PathBuf;

use log::info;
use serde::{Deserialize, Serialize};

use crate::animal::{Animal, AnimalId, HistoryEntry, InfectionRecord, VaccinationRecord};
use crate::context::Context;
use crate::error::RabiesError;
use crate::landscape::{CellId, Landscape};
use crate::population::{population_data, population_data_mut};
use crate::species::Sex;
use crate::time::SimTime;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub cell: String,
    pub time: SimTime,
}

/// Every attribute of an animal, with cells named by key.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AnimalRecord {
    pub id: AnimalId,
    pub sex: Sex,
    pub birth: SimTime,
    pub age_weeks: u32,
    pub parent: Option<AnimalId>,
    pub cell: String,
    pub independent: bool,
    pub death: Option<SimTime>,
    pub history: Vec<HistoryRecord>,
    pub offspring: Vec<AnimalId>,
    pub infections: Vec<InfectionRecord>,
    pub vaccinations: Vec<VaccinationRecord>,
    pub has_dispersed: bool,
    pub mating_weeks: Vec<u8>,
    pub pending_birth_week: Option<u8>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationSnapshot {
    pub year: u32,
    pub week: u8,
    pub animals: Vec<AnimalRecord>,
}

fn cell_key(landscape: &Landscape, animal: &Animal, cell: CellId) -> Result<String, RabiesError> {
    landscape.cell(cell).map(|c| c.key().to_string()).map_err(|_| {
        RabiesError::MissingReference(format!(
            "animal {} refers to unknown cell {cell}",
            animal.id()
        ))
    })
}

impl AnimalRecord {
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the animal refers to a
    /// cell that is not in `landscape`.
    pub fn from_animal(animal: &Animal, landscape: &Landscape) -> Result<AnimalRecord, RabiesError> {
        let history = animal
            .history()
            .iter()
            .map(|entry| {
                Ok(HistoryRecord {
                    cell: cell_key(landscape, animal, entry.cell)?,
                    time: entry.time,
                })
            })
            .collect::<Result<Vec<_>, RabiesError>>()?;
        Ok(AnimalRecord {
            id: animal.id(),
            sex: animal.sex(),
            birth: animal.birth(),
            age_weeks: animal.age_weeks(),
            parent: animal.parent(),
            cell: cell_key(landscape, animal, animal.cell())?,
            independent: animal.is_independent(),
            death: animal.death(),
            history,
            offspring: animal.offspring().to_vec(),
            infections: animal.infections().to_vec(),
            vaccinations: animal.vaccinations().to_vec(),
            has_dispersed: animal.has_dispersed(),
            mating_weeks: animal.mating_weeks().to_vec(),
            pending_birth_week: animal.pending_birth_week,
        })
    }

    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the record names a cell
    /// that is not in `landscape`.
    pub fn into_animal(self, landscape: &Landscape) -> Result<Animal, RabiesError> {
        let id = self.id;
        let resolve = |key: &str| {
            landscape.cell_id(key).ok_or_else(|| {
                RabiesError::MissingReference(format!("animal {id} refers to unknown cell {key}"))
            })
        };
        let history = self
            .history
            .iter()
            .map(|entry| {
                Ok(HistoryEntry {
                    cell: resolve(&entry.cell)?,
                    time: entry.time,
                })
            })
            .collect::<Result<Vec<_>, RabiesError>>()?;
        Ok(Animal {
            id,
            sex: self.sex,
            birth: self.birth,
            age_weeks: self.age_weeks,
            parent: self.parent,
            cell: resolve(&self.cell)?,
            independent: self.independent,
            death: self.death,
            history,
            offspring: self.offspring,
            infections: self.infections,
            vaccinations: self.vaccinations,
            has_dispersed: self.has_dispersed,
            mating_weeks: self.mating_weeks,
            pending_birth_week: self.pending_birth_week,
        })
    }
}

/// Somewhere a population snapshot can be written to and read back from.
pub trait PopulationStore {
    /// # Errors
    ///
    /// Returns an error if the snapshot cannot be written.
    fn write_snapshot(&self, snapshot: &PopulationSnapshot) -> Result<(), RabiesError>;

    /// # Errors
    ///
    /// Returns an error if no snapshot can be read.
    fn read_snapshot(&self) -> Result<PopulationSnapshot, RabiesError>;
}

/// Stores a snapshot as one JSON document.
#[derive(Clone, Debug)]
pub struct JsonPopulationStore {
    path: PathBuf,
}

impl JsonPopulationStore {
    pub fn new(path: impl Into<PathBuf>) -> JsonPopulationStore {
        JsonPopulationStore { path: path.into() }
    }
}

impl PopulationStore for JsonPopulationStore {
    fn write_snapshot(&self, snapshot: &PopulationSnapshot) -> Result<(), RabiesError> {
        info!(
            "writing {} animals to {}",
            snapshot.animals.len(),
            self.path.display()
        );
        let mut writer = BufWriter::new(File::create(&self.path)?);
        serde_json::to_writer(&mut writer, snapshot)?;
        writer.flush()?;
        Ok(())
    }

    fn read_snapshot(&self) -> Result<PopulationSnapshot, RabiesError> {
        info!("reading population from {}", self.path.display());
        let reader = BufReader::new(File::open(&self.path)?);
        Ok(serde_json::from_reader(reader)?)
    }
}

pub trait ContextPersistenceExt {
    /// Captures every animal, living and dead, and the current time.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the population has not
    /// been initialized.
    fn snapshot_population(&self) -> Result<PopulationSnapshot, RabiesError>;

    /// Replaces the population with the animals of `snapshot` and sets the
    /// clock to its time. The species and landscape stay as they are.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` for an invalid week and
    /// `RabiesError::MissingReference` if the population has not been
    /// initialized or a record names an unknown cell. The population is
    /// unchanged on error.
    fn restore_population(&mut self, snapshot: PopulationSnapshot) -> Result<(), RabiesError>;
}

impl ContextPersistenceExt for Context {
    fn snapshot_population(&self) -> Result<PopulationSnapshot, RabiesError> {
        let data = population_data(self).ok_or_else(|| {
            RabiesError::MissingReference("population has not been initialized".to_string())
        })?;
        let landscape = &data.setup()?.landscape;
        let animals = data
            .animals
            .values()
            .chain(&data.pending_births)
            .map(|animal| AnimalRecord::from_animal(animal, landscape))
            .collect::<Result<Vec<_>, RabiesError>>()?;
        info!("captured {} animals at {}", animals.len(), data.time);
        Ok(PopulationSnapshot {
            year: data.time.year,
            week: data.time.week,
            animals,
        })
    }

    fn restore_population(&mut self, snapshot: PopulationSnapshot) -> Result<(), RabiesError> {
        let time = SimTime::new(snapshot.year, snapshot.week)?;
        let data = population_data_mut(self);
        let landscape = std::rc::Rc::clone(&data.setup()?.landscape);
        let animals = snapshot
            .animals
            .into_iter()
            .map(|record| record.into_animal(&landscape))
            .collect::<Result<Vec<_>, RabiesError>>()?;

        data.animals.clear();
        data.occupancy.clear();
        data.pending_births.clear();
        data.next_id = 0;
        for animal in animals {
            data.insert_animal(animal);
        }
        data.time = time;
        if let Some(setup) = data.setup.as_mut() {
            setup.start = time;
        }
        info!("restored {} animals at {time}", data.animals.len());
        Ok(())
    }
}

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::landscape::CellId;
use crate::species::Sex;
use crate::time::SimTime;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AnimalId(pub u64);

impl fmt::Display for AnimalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A cell the animal arrived in and when.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub cell: CellId,
    pub time: SimTime,
}

/// An infection acquired at `infected_at`: `incubation_weeks` of incubation
/// followed by `infectious_weeks` of shedding.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfectionRecord {
    pub infected_at: SimTime,
    pub incubation_weeks: u32,
    pub infectious_weeks: u32,
    pub source: Option<AnimalId>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaccinationRecord {
    pub vaccinated_at: SimTime,
    pub immunity_weeks: u32,
}

/// One simulated individual.
#[derive(Clone, Debug, PartialEq)]
pub struct Animal {
    pub(crate) id: AnimalId,
    pub(crate) sex: Sex,
    pub(crate) birth: SimTime,
    pub(crate) age_weeks: u32,
    pub(crate) parent: Option<AnimalId>,
    pub(crate) cell: CellId,
    pub(crate) independent: bool,
    pub(crate) death: Option<SimTime>,
    pub(crate) history: Vec<HistoryEntry>,
    pub(crate) offspring: Vec<AnimalId>,
    pub(crate) infections: Vec<InfectionRecord>,
    pub(crate) vaccinations: Vec<VaccinationRecord>,
    pub(crate) has_dispersed: bool,
    // Mating weeks for the current annual cycle, one per reproduction pulse;
    // 0 means the pulse produced no mating this year.
    pub(crate) mating_weeks: Vec<u8>,
    pub(crate) pending_birth_week: Option<u8>,
}

impl Animal {
    /// A living animal in `cell` whose first history entry is its arrival
    /// at `time`.
    #[must_use]
    pub fn new(
        id: AnimalId,
        sex: Sex,
        age_weeks: u32,
        parent: Option<AnimalId>,
        cell: CellId,
        birth: SimTime,
        time: SimTime,
    ) -> Animal {
        Animal {
            id,
            sex,
            birth,
            age_weeks,
            parent,
            cell,
            independent: false,
            death: None,
            history: vec![HistoryEntry { cell, time }],
            offspring: Vec::new(),
            infections: Vec::new(),
            vaccinations: Vec::new(),
            has_dispersed: false,
            mating_weeks: Vec::new(),
            pending_birth_week: None,
        }
    }

    #[must_use]
    pub fn id(&self) -> AnimalId {
        self.id
    }

    #[must_use]
    pub fn sex(&self) -> Sex {
        self.sex
    }

    #[must_use]
    pub fn birth(&self) -> SimTime {
        self.birth
    }

    #[must_use]
    pub fn age_weeks(&self) -> u32 {
        self.age_weeks
    }

    /// Completed years of age.
    #[must_use]
    pub fn age_years(&self) -> u32 {
        self.age_weeks / u32::from(crate::time::WEEKS_PER_YEAR)
    }

    #[must_use]
    pub fn parent(&self) -> Option<AnimalId> {
        self.parent
    }

    #[must_use]
    pub fn cell(&self) -> CellId {
        self.cell
    }

    #[must_use]
    pub fn is_independent(&self) -> bool {
        self.independent
    }

    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.death.is_none()
    }

    #[must_use]
    pub fn death(&self) -> Option<SimTime> {
        self.death
    }

    #[must_use]
    pub fn history(&self) -> &[HistoryEntry] {
        &self.history
    }

    #[must_use]
    pub fn offspring(&self) -> &[AnimalId] {
        &self.offspring
    }

    #[must_use]
    pub fn infections(&self) -> &[InfectionRecord] {
        &self.infections
    }

    #[must_use]
    pub fn vaccinations(&self) -> &[VaccinationRecord] {
        &self.vaccinations
    }

    #[must_use]
    pub fn has_dispersed(&self) -> bool {
        self.has_dispersed
    }

    #[must_use]
    pub fn mating_weeks(&self) -> &[u8] {
        &self.mating_weeks
    }

    pub(crate) fn kill(&mut self, time: SimTime) {
        if self.death.is_none() {
            self.death = Some(time);
        }
    }

    pub(crate) fn move_to(&mut self, cell: CellId, time: SimTime) {
        self.cell = cell;
        self.history.push(HistoryEntry { cell, time });
    }
}

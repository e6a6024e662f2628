//! The interface between the population and an external transmission model.
//!
//! Transmission itself is decided elsewhere. This module keeps the infection
//! and vaccination records on each animal, answers whether an animal is
//! infectious or immune at a given time, and summarizes a cell's occupants
//! into the inputs a transmission model needs.
use log::trace;

use crate::animal::{Animal, AnimalId, InfectionRecord, VaccinationRecord};
use crate::context::Context;
use crate::error::RabiesError;
use crate::landscape::CellId;
use crate::lifecycle::Lifecycle;
use crate::population::{population_data, population_data_mut, ContextPopulationExt};
use crate::time::SimTime;

pub trait DiseaseModel {
    /// Whether the animal has been infected at or before `time`, whatever
    /// stage the infection is in.
    fn is_infected(&self, animal: &Animal, time: SimTime) -> bool;
    fn is_infectious(&self, animal: &Animal, time: SimTime) -> bool;
    fn is_immune(&self, animal: &Animal, time: SimTime) -> bool;
}

/// Answers from the records kept on the animal: an infection is infectious
/// after its incubation period for `infectious_weeks`; a vaccination
/// protects for `immunity_weeks` from the week it was given.
#[derive(Copy, Clone, Debug, Default)]
pub struct RecordBasedDisease;

impl DiseaseModel for RecordBasedDisease {
    fn is_infected(&self, animal: &Animal, time: SimTime) -> bool {
        animal
            .infections()
            .iter()
            .any(|record| time.weeks_since(record.infected_at) >= 0)
    }

    fn is_infectious(&self, animal: &Animal, time: SimTime) -> bool {
        animal.infections().iter().any(|record| {
            let elapsed = time.weeks_since(record.infected_at);
            let start = i64::from(record.incubation_weeks);
            elapsed >= start && elapsed < start + i64::from(record.infectious_weeks)
        })
    }

    fn is_immune(&self, animal: &Animal, time: SimTime) -> bool {
        animal.vaccinations().iter().any(|record| {
            let elapsed = time.weeks_since(record.vaccinated_at);
            elapsed >= 0 && elapsed < i64::from(record.immunity_weeks)
        })
    }
}

/// The occupants of one cell as seen by a transmission model.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CellContactInputs {
    pub infectious: Vec<AnimalId>,
    /// Living occupants that are neither infected nor immune.
    pub susceptible: Vec<AnimalId>,
    pub immune: usize,
}

pub trait ContextDiseaseExt {
    /// Appends an infection record to a living animal.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if no such animal exists and
    /// `RabiesError::Error` if it is dead.
    fn record_infection(&mut self, id: AnimalId, record: InfectionRecord) -> Result<(), RabiesError>;

    /// Appends a vaccination record to a living animal.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if no such animal exists and
    /// `RabiesError::Error` if it is dead.
    fn record_vaccination(
        &mut self,
        id: AnimalId,
        record: VaccinationRecord,
    ) -> Result<(), RabiesError>;

    fn cell_contact_inputs(
        &self,
        cell: CellId,
        time: SimTime,
        model: &impl DiseaseModel,
    ) -> CellContactInputs;

    /// The contact rate of animal `id` within its cell (`within`) or towards
    /// neighbouring cells in the current week.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the population has not
    /// been initialized or no such animal exists.
    fn animal_contact_rate(
        &self,
        id: AnimalId,
        overall_rate: f64,
        within: bool,
    ) -> Result<f64, RabiesError>;
}

fn living_animal_mut(context: &mut Context, id: AnimalId) -> Result<&mut Animal, RabiesError> {
    let animal = population_data_mut(context)
        .animals
        .get_mut(&id)
        .ok_or_else(|| RabiesError::MissingReference(format!("no animal with id {id}")))?;
    if animal.is_alive() {
        Ok(animal)
    } else {
        Err(RabiesError::Error(format!("animal {id} is dead")))
    }
}

impl ContextDiseaseExt for Context {
    fn record_infection(&mut self, id: AnimalId, record: InfectionRecord) -> Result<(), RabiesError> {
        trace!("animal {id} infected at {}", record.infected_at);
        living_animal_mut(self, id)?.infections.push(record);
        Ok(())
    }

    fn record_vaccination(
        &mut self,
        id: AnimalId,
        record: VaccinationRecord,
    ) -> Result<(), RabiesError> {
        trace!("animal {id} vaccinated at {}", record.vaccinated_at);
        living_animal_mut(self, id)?.vaccinations.push(record);
        Ok(())
    }

    fn cell_contact_inputs(
        &self,
        cell: CellId,
        time: SimTime,
        model: &impl DiseaseModel,
    ) -> CellContactInputs {
        let mut inputs = CellContactInputs::default();
        let Some(data) = population_data(self) else {
            return inputs;
        };
        for id in self.cell_occupants(cell) {
            let Some(animal) = data.animals.get(&id) else {
                continue;
            };
            if model.is_infectious(animal, time) {
                inputs.infectious.push(id);
            } else if model.is_immune(animal, time) {
                inputs.immune += 1;
            } else if !model.is_infected(animal, time) {
                inputs.susceptible.push(id);
            }
        }
        inputs
    }

    fn animal_contact_rate(
        &self,
        id: AnimalId,
        overall_rate: f64,
        within: bool,
    ) -> Result<f64, RabiesError> {
        let data = population_data(self).ok_or_else(|| {
            RabiesError::MissingReference("population has not been initialized".to_string())
        })?;
        let setup = data.setup()?;
        let animal = data
            .animals
            .get(&id)
            .ok_or_else(|| RabiesError::MissingReference(format!("no animal with id {id}")))?;
        Lifecycle::new(&setup.params, setup.behavior).cell_contact_rate(
            overall_rate,
            data.time.week,
            animal.sex(),
            within,
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::landscape::Landscape;
    use crate::random::ContextRandomExt;
    use crate::species::test_support::fox_parameters;
    use crate::species::{Sex, SpeciesBehavior};
    use assert_approx_eq::assert_approx_eq;

    fn time(year: u32, week: u8) -> SimTime {
        SimTime::new(year, week).unwrap()
    }

    fn context() -> Context {
        let mut context = Context::new();
        context.init_random(42);
        context.init_population(
            fox_parameters(),
            SpeciesBehavior::Fox,
            Landscape::hex_grid(3, 3, 4.0).unwrap(),
            time(2, 10),
        );
        context
    }

    fn infection(at: SimTime) -> InfectionRecord {
        InfectionRecord {
            infected_at: at,
            incubation_weeks: 3,
            infectious_weeks: 2,
            source: None,
        }
    }

    #[test]
    fn infectious_window_follows_incubation() {
        let mut context = context();
        let id = context.add_animal(Sex::Male, 80, CellId(0)).unwrap();
        context.record_infection(id, infection(time(2, 10))).unwrap();
        let animal = context.get_animal(id).unwrap();
        let model = RecordBasedDisease;
        assert!(!model.is_infectious(animal, time(2, 12)));
        assert!(model.is_infectious(animal, time(2, 13)));
        assert!(model.is_infectious(animal, time(2, 14)));
        assert!(!model.is_infectious(animal, time(2, 15)));
        assert!(model.is_infected(animal, time(2, 10)));
        assert!(!model.is_infected(animal, time(2, 9)));
    }

    #[test]
    fn vaccination_wears_off() {
        let mut context = context();
        let id = context.add_animal(Sex::Female, 80, CellId(0)).unwrap();
        context
            .record_vaccination(
                id,
                VaccinationRecord {
                    vaccinated_at: time(2, 50),
                    immunity_weeks: 4,
                },
            )
            .unwrap();
        let animal = context.get_animal(id).unwrap();
        let model = RecordBasedDisease;
        assert!(!model.is_immune(animal, time(2, 49)));
        assert!(model.is_immune(animal, time(3, 1)));
        assert!(!model.is_immune(animal, time(3, 2)));
    }

    #[test]
    fn unknown_animal_is_missing_reference() {
        let mut context = context();
        assert!(matches!(
            context.record_infection(AnimalId(99), infection(time(2, 10))),
            Err(RabiesError::MissingReference(_))
        ));
    }

    #[test]
    fn contact_inputs_partition_occupants() {
        let mut context = context();
        let sick = context.add_animal(Sex::Male, 80, CellId(4)).unwrap();
        let vaccinated = context.add_animal(Sex::Female, 80, CellId(4)).unwrap();
        let healthy = context.add_animal(Sex::Female, 80, CellId(4)).unwrap();
        let elsewhere = context.add_animal(Sex::Male, 80, CellId(5)).unwrap();
        context.record_infection(sick, infection(time(2, 1))).unwrap();
        context
            .record_vaccination(
                vaccinated,
                VaccinationRecord {
                    vaccinated_at: time(2, 1),
                    immunity_weeks: 52,
                },
            )
            .unwrap();

        let inputs = context.cell_contact_inputs(CellId(4), time(2, 5), &RecordBasedDisease);
        assert_eq!(inputs.infectious, vec![sick]);
        assert_eq!(inputs.susceptible, vec![healthy]);
        assert_eq!(inputs.immune, 1);
        assert!(!inputs.susceptible.contains(&elsewhere));
    }

    #[test]
    fn later_infection_leaves_animal_susceptible() {
        let mut context = context();
        let id = context.add_animal(Sex::Female, 80, CellId(2)).unwrap();
        context.record_infection(id, infection(time(2, 20))).unwrap();

        let before = context.cell_contact_inputs(CellId(2), time(2, 12), &RecordBasedDisease);
        assert_eq!(before.susceptible, vec![id]);
        assert!(before.infectious.is_empty());

        // Incubating: neither susceptible nor yet infectious.
        let incubating = context.cell_contact_inputs(CellId(2), time(2, 21), &RecordBasedDisease);
        assert!(incubating.susceptible.is_empty());
        assert!(incubating.infectious.is_empty());
    }

    #[test]
    fn contact_rate_uses_current_week() {
        let mut context = context();
        let id = context.add_animal(Sex::Male, 80, CellId(0)).unwrap();
        assert_approx_eq!(context.animal_contact_rate(id, 4.0, false).unwrap(), 1.0);
        assert_approx_eq!(context.animal_contact_rate(id, 4.0, true).unwrap(), 3.0);
        assert!(context.animal_contact_rate(AnimalId(50), 1.0, true).is_err());
    }
}

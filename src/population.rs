//! The population of animals on a landscape and the weekly driver that
//! applies the lifecycle to every one of them.
//!
//! A week is processed as a unit. Cell densities are counted once at the
//! start of the week; each living animal then runs through the lifecycle in
//! ascending id order, drawing from one named random stream per concern.
//! Newborns wait in a pending list and join the population at the end of the
//! week, so nothing reacts to offspring born in the same week.
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use crate::animal::{Animal, AnimalId};
use crate::context::Context;
use crate::data_plugin::define_data_plugin;
use crate::error::RabiesError;
use crate::hashing::{HashMap, HashMapExt};
use crate::landscape::{CellId, Landscape};
use crate::lifecycle::Lifecycle;
use crate::random::{
    ContextRandomExt, DispersalPathRng, MortalityRng, MovementRng, ReproductionRng, SeedingRng,
};
use crate::report::{ContextReportExt, LifecycleEvent, LifecycleReportItem};
use crate::species::{Sex, SpeciesBehavior, SpeciesParameters};
use crate::time::SimTime;

/// Counts for one simulated week.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSummary {
    pub time: SimTime,
    pub births: usize,
    pub deaths: usize,
    pub dispersals: usize,
    pub independent: usize,
    /// Living animals at the end of the week, newborns included.
    pub population: usize,
}

#[derive(Clone)]
pub(crate) struct PopulationSetup {
    pub(crate) params: Rc<SpeciesParameters>,
    pub(crate) behavior: SpeciesBehavior,
    pub(crate) landscape: Rc<Landscape>,
    pub(crate) start: SimTime,
}

pub(crate) struct PopulationData {
    pub(crate) setup: Option<PopulationSetup>,
    pub(crate) animals: BTreeMap<AnimalId, Animal>,
    // Living animals only.
    pub(crate) occupancy: HashMap<CellId, BTreeSet<AnimalId>>,
    pub(crate) pending_births: Vec<Animal>,
    pub(crate) next_id: u64,
    pub(crate) time: SimTime,
    pub(crate) prune_dead: bool,
    pub(crate) summaries: Vec<WeekSummary>,
    run_error: Option<RabiesError>,
}

impl Default for PopulationData {
    fn default() -> Self {
        PopulationData {
            setup: None,
            animals: BTreeMap::new(),
            occupancy: HashMap::new(),
            pending_births: Vec::new(),
            next_id: 0,
            time: SimTime { year: 0, week: 1 },
            prune_dead: false,
            summaries: Vec::new(),
            run_error: None,
        }
    }
}

impl PopulationData {
    pub(crate) fn setup(&self) -> Result<&PopulationSetup, RabiesError> {
        self.setup.as_ref().ok_or_else(|| {
            RabiesError::MissingReference("population has not been initialized".to_string())
        })
    }

    pub(crate) fn occupy(&mut self, id: AnimalId, cell: CellId) {
        self.occupancy.entry(cell).or_default().insert(id);
    }

    pub(crate) fn insert_animal(&mut self, animal: Animal) {
        if animal.is_alive() {
            self.occupy(animal.id(), animal.cell());
        }
        self.next_id = self.next_id.max(animal.id().0 + 1);
        self.animals.insert(animal.id(), animal);
    }

    fn living_count(&self) -> usize {
        self.animals.values().filter(|a| a.is_alive()).count()
    }
}

define_data_plugin!(PopulationPlugin, PopulationData, PopulationData::default());

pub(crate) fn population_data(context: &Context) -> Option<&PopulationData> {
    context.get_data_container(PopulationPlugin)
}

pub(crate) fn population_data_mut(context: &mut Context) -> &mut PopulationData {
    context.get_data_mut(PopulationPlugin)
}

pub trait ContextPopulationExt {
    /// Installs the species, its behaviour and the landscape, and sets the
    /// clock to `start`. Any existing population is discarded.
    fn init_population(
        &mut self,
        params: SpeciesParameters,
        behavior: SpeciesBehavior,
        landscape: Landscape,
        start: SimTime,
    );

    /// Whether dead animals are dropped at the end of each week rather than
    /// kept with their death date.
    fn set_prune_dead(&mut self, prune_dead: bool);

    /// Adds a living animal aged `age_weeks` to `cell` at the current time.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the population has not
    /// been initialized or `cell` is not part of the landscape.
    fn add_animal(&mut self, sex: Sex, age_weeks: u32, cell: CellId) -> Result<AnimalId, RabiesError>;

    /// Fills every cell with `carrying_capacity * initial_density` (rounded)
    /// independent animals of random sex and age. Returns the number added.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::ConfigError` for a negative or non-finite
    /// density and `RabiesError::MissingReference` if the population has not
    /// been initialized.
    fn seed_population(&mut self, initial_density: f64) -> Result<usize, RabiesError>;

    fn get_animal(&self, id: AnimalId) -> Option<&Animal>;

    /// Ids of all living animals in ascending order.
    fn living_animals(&self) -> Vec<AnimalId>;

    /// Ids of the living animals in `cell` in ascending order.
    fn cell_occupants(&self, cell: CellId) -> Vec<AnimalId>;

    fn population_size(&self) -> usize;

    /// The (year, week) the next call to `step_week` will simulate.
    fn current_time(&self) -> SimTime;

    fn species_parameters(&self) -> Option<Rc<SpeciesParameters>>;

    fn landscape(&self) -> Option<Rc<Landscape>>;

    /// Simulates one week for every living animal and advances the clock.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::MissingReference` if the population has not
    /// been initialized or refers to an unknown cell, and propagates errors
    /// from the lifecycle and from writing the lifecycle report.
    fn step_week(&mut self) -> Result<WeekSummary, RabiesError>;

    /// Schedules one plan per week for `weeks` weeks and executes them. The
    /// run stops at the first failing week.
    ///
    /// # Errors
    ///
    /// Returns the error of the first failing week.
    fn run_weeks(&mut self, weeks: u32) -> Result<Vec<WeekSummary>, RabiesError>;

    /// Summaries of every week simulated so far.
    fn week_summaries(&self) -> &[WeekSummary];
}

impl ContextPopulationExt for Context {
    fn init_population(
        &mut self,
        params: SpeciesParameters,
        behavior: SpeciesBehavior,
        landscape: Landscape,
        start: SimTime,
    ) {
        info!(
            "initializing {} population ({behavior}) on {} cells at {start}",
            params.name(),
            landscape.len()
        );
        let prune_dead = population_data_mut(self).prune_dead;
        *population_data_mut(self) = PopulationData {
            setup: Some(PopulationSetup {
                params: Rc::new(params),
                behavior,
                landscape: Rc::new(landscape),
                start,
            }),
            time: start,
            prune_dead,
            ..PopulationData::default()
        };
    }

    fn set_prune_dead(&mut self, prune_dead: bool) {
        population_data_mut(self).prune_dead = prune_dead;
    }

    fn add_animal(&mut self, sex: Sex, age_weeks: u32, cell: CellId) -> Result<AnimalId, RabiesError> {
        let data = population_data_mut(self);
        let setup = data.setup()?.clone();
        setup.landscape.cell(cell)?;
        let id = AnimalId(data.next_id);
        let time = data.time;

        let mut animal = Animal::new(id, sex, age_weeks, None, cell, time.earlier_by(age_weeks), time);
        animal.independent = age_weeks >= setup.params.independence_age();
        let lifecycle = Lifecycle::new(&setup.params, setup.behavior);
        self.sample(ReproductionRng, |stream| {
            lifecycle.draw_mating_weeks(&mut animal, stream)
        })?;
        trace!("added {sex} {id} aged {age_weeks} to cell {cell}");
        population_data_mut(self).insert_animal(animal);
        Ok(id)
    }

    fn seed_population(&mut self, initial_density: f64) -> Result<usize, RabiesError> {
        if !initial_density.is_finite() || initial_density < 0.0 {
            return Err(RabiesError::ConfigError(format!(
                "initial density {initial_density} must be a non-negative number"
            )));
        }
        let setup = population_data_mut(self).setup()?.clone();
        let min_age = i64::from(setup.params.independence_age());
        let max_age = i64::from(setup.params.adult_age()) + 51;
        let mut added = 0;
        for (cell, properties) in setup.landscape.cells() {
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let count = (properties.carrying_capacity() * initial_density).round() as usize;
            for _ in 0..count {
                let (sex, age) = self.sample(SeedingRng, |stream| {
                    let sex = if stream.uniform_real(0.0, 100.0) < setup.params.male_percent() {
                        Sex::Male
                    } else {
                        Sex::Female
                    };
                    (sex, stream.uniform_int(min_age, max_age))
                });
                let age = u32::try_from(age).unwrap_or(0).min(setup.params.max_age(sex) - 1);
                self.add_animal(sex, age, cell)?;
                added += 1;
            }
        }
        info!("seeded {added} animals");
        Ok(added)
    }

    fn get_animal(&self, id: AnimalId) -> Option<&Animal> {
        population_data(self).and_then(|data| data.animals.get(&id))
    }

    fn living_animals(&self) -> Vec<AnimalId> {
        population_data(self).map_or_else(Vec::new, |data| {
            data.animals
                .values()
                .filter(|animal| animal.is_alive())
                .map(Animal::id)
                .collect()
        })
    }

    fn cell_occupants(&self, cell: CellId) -> Vec<AnimalId> {
        population_data(self)
            .and_then(|data| data.occupancy.get(&cell))
            .map_or_else(Vec::new, |occupants| occupants.iter().copied().collect())
    }

    fn population_size(&self) -> usize {
        population_data(self).map_or(0, PopulationData::living_count)
    }

    fn current_time(&self) -> SimTime {
        population_data(self).map_or(SimTime { year: 0, week: 1 }, |data| data.time)
    }

    fn species_parameters(&self) -> Option<Rc<SpeciesParameters>> {
        population_data(self)
            .and_then(|data| data.setup.as_ref())
            .map(|setup| Rc::clone(&setup.params))
    }

    fn landscape(&self) -> Option<Rc<Landscape>> {
        population_data(self)
            .and_then(|data| data.setup.as_ref())
            .map(|setup| Rc::clone(&setup.landscape))
    }

    fn step_week(&mut self) -> Result<WeekSummary, RabiesError> {
        let mut data = std::mem::take(population_data_mut(self));
        let result = simulate_week(self, &mut data);
        *population_data_mut(self) = data;
        result
    }

    fn run_weeks(&mut self, weeks: u32) -> Result<Vec<WeekSummary>, RabiesError> {
        let data = population_data_mut(self);
        let start = data.setup()?.start;
        let first_summary = data.summaries.len();
        let elapsed = u32::try_from(data.time.weeks_since(start)).unwrap_or(0);
        let now = self.get_current_time();

        for week in elapsed..elapsed + weeks {
            let plan_time = f64::from(week).max(now);
            self.add_plan(plan_time, |context| {
                if let Err(error) = context.step_week() {
                    population_data_mut(context).run_error = Some(error);
                    context.shutdown();
                }
            });
        }
        self.execute();

        let data = population_data_mut(self);
        match data.run_error.take() {
            Some(error) => Err(error),
            None => Ok(data.summaries[first_summary..].to_vec()),
        }
    }

    fn week_summaries(&self) -> &[WeekSummary] {
        match population_data(self) {
            Some(data) => &data.summaries,
            None => &[],
        }
    }
}

struct WeekEvents {
    summary: WeekSummary,
    report: Vec<LifecycleReportItem>,
}

impl WeekEvents {
    fn record(&mut self, animal: &Animal, event: LifecycleEvent) {
        match event {
            LifecycleEvent::Birth => self.summary.births += 1,
            LifecycleEvent::Dispersal => self.summary.dispersals += 1,
            LifecycleEvent::Independence => self.summary.independent += 1,
            LifecycleEvent::Death => self.summary.deaths += 1,
        }
        self.report.push(LifecycleReportItem {
            year: self.summary.time.year,
            week: self.summary.time.week,
            animal_id: animal.id(),
            event,
            cell: animal.cell(),
        });
    }
}

#[allow(clippy::too_many_lines)]
fn simulate_week(context: &Context, data: &mut PopulationData) -> Result<WeekSummary, RabiesError> {
    let setup = data.setup()?.clone();
    let params = &setup.params;
    let landscape = &setup.landscape;
    let lifecycle = Lifecycle::new(params, setup.behavior);
    let time = data.time;
    let week = time.week;

    // Densities are frozen at the start of the week.
    let mut density: HashMap<CellId, usize> = HashMap::new();
    for (cell, occupants) in &data.occupancy {
        let count = occupants
            .iter()
            .filter_map(|id| data.animals.get(id))
            .filter(|animal| {
                setup
                    .behavior
                    .counts_toward_density(params.age_class(animal.age_weeks()))
            })
            .count();
        density.insert(*cell, count);
    }

    let mut events = WeekEvents {
        summary: WeekSummary {
            time,
            births: 0,
            deaths: 0,
            dispersals: 0,
            independent: 0,
            population: 0,
        },
        report: Vec::new(),
    };

    let living: Vec<AnimalId> = data
        .animals
        .values()
        .filter(|animal| animal.is_alive())
        .map(Animal::id)
        .collect();

    for id in living {
        let animal = data.animals.get_mut(&id).ok_or_else(|| {
            RabiesError::MissingReference(format!("animal {id} vanished during the week"))
        })?;

        lifecycle.reset_dispersal(animal, week);
        if week == 1 {
            context.sample(ReproductionRng, |stream| {
                lifecycle.draw_mating_weeks(animal, stream)
            })?;
        }
        lifecycle.age(animal);

        let plan = context.sample(MovementRng, |stream| {
            lifecycle.plan_dispersal(animal, week, stream)
        })?;
        if let Some(plan) = plan {
            let from = animal.cell();
            let path = context.sample(DispersalPathRng, |stream| {
                landscape.calculate_path(from, plan.hops, plan.bias, stream)
            })?;
            if let Some(to) = lifecycle.relocate(animal, &path, time) {
                if let Some(occupants) = data.occupancy.get_mut(&from) {
                    occupants.remove(&id);
                }
                data.occupancy.entry(to).or_default().insert(id);
            }
            events.record(animal, LifecycleEvent::Dispersal);
        }

        if lifecycle.mate(animal, week)? {
            trace!("animal {id} mated in {time}");
        }
        let litter = context.sample(ReproductionRng, |stream| {
            if lifecycle.give_birth(animal, week, stream)? {
                lifecycle.n_babies(stream)
            } else {
                Ok(0)
            }
        })?;
        for _ in 0..litter {
            let baby_id = AnimalId(data.next_id);
            data.next_id += 1;
            let baby = context.sample(ReproductionRng, |stream| {
                lifecycle.create_baby(animal, baby_id, time, stream)
            })?;
            trace!("animal {id} gave birth to {baby_id}");
            events.record(&baby, LifecycleEvent::Birth);
            data.pending_births.push(baby);
        }

        if lifecycle.become_independent(animal) {
            events.record(animal, LifecycleEvent::Independence);
        }

        let cell = animal.cell();
        let capacity = landscape.cell(cell)?.carrying_capacity();
        let count = density.get(&cell).copied().unwrap_or(0);
        let died = context.sample(MortalityRng, |stream| {
            lifecycle.mortality(animal, time, count, capacity, stream)
        });
        if died {
            events.record(animal, LifecycleEvent::Death);
            if let Some(occupants) = data.occupancy.get_mut(&cell) {
                occupants.remove(&id);
            }
        }
    }

    data.occupancy.retain(|_, occupants| !occupants.is_empty());
    for baby in std::mem::take(&mut data.pending_births) {
        data.insert_animal(baby);
    }
    if data.prune_dead {
        data.animals.retain(|_, animal| animal.is_alive());
    }
    data.time = time.next();

    events.summary.population = data.living_count();
    debug!(
        "{time}: {} births, {} deaths, {} dispersals, population {}",
        events.summary.births,
        events.summary.deaths,
        events.summary.dispersals,
        events.summary.population
    );
    data.summaries.push(events.summary);

    if context.has_report::<LifecycleReportItem>() {
        for item in events.report {
            context.send_report(item)?;
        }
    }
    Ok(events.summary)
}

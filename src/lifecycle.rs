//! The weekly decisions of a single animal.
//!
//! Every operation takes the species parameters explicitly through
//! [`Lifecycle`] and draws from the stream it is handed, so the same engine
//! serves every species and each decision consumes a predictable slice of
//! its stream. The population driver calls these in a fixed order each week:
//! dispersal reset, aging, dispersal, mating and birth, independence,
//! mortality.
use log::{trace, warn};

use crate::animal::{Animal, AnimalId};
use crate::error::{check_week, RabiesError};
use crate::landscape::{CellId, Direction};
use crate::random::RandomStream;
use crate::species::{Sex, SpeciesBehavior, SpeciesParameters};
use crate::time::{SimTime, WEEKS_PER_YEAR};

/// Where a dispersing animal is heading: the number of hops to walk and the
/// preferred heading.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct DispersalPlan {
    pub hops: usize,
    pub bias: Direction,
}

#[derive(Copy, Clone, Debug)]
pub struct Lifecycle<'a> {
    params: &'a SpeciesParameters,
    behavior: SpeciesBehavior,
}

impl<'a> Lifecycle<'a> {
    #[must_use]
    pub fn new(params: &'a SpeciesParameters, behavior: SpeciesBehavior) -> Lifecycle<'a> {
        Lifecycle { params, behavior }
    }

    #[must_use]
    pub fn params(&self) -> &'a SpeciesParameters {
        self.params
    }

    #[must_use]
    pub fn behavior(&self) -> SpeciesBehavior {
        self.behavior
    }

    /// Clears the "has dispersed" flag when a new dispersal cycle starts.
    pub fn reset_dispersal(&self, animal: &mut Animal, week: u8) {
        if self.behavior.clears_dispersal_flag(week) {
            animal.has_dispersed = false;
        }
    }

    pub fn age(&self, animal: &mut Animal) {
        animal.age_weeks += 1;
    }

    /// Decides whether `animal` disperses this week and, if so, how far and
    /// in which direction.
    ///
    /// The animal is marked as dispersed as soon as the decision is "yes",
    /// whether or not the path later moves it.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn plan_dispersal(
        &self,
        animal: &mut Animal,
        week: u8,
        stream: &mut RandomStream,
    ) -> Result<Option<DispersalPlan>, RabiesError> {
        check_week(week)?;
        if !animal.is_alive() || animal.has_dispersed {
            return Ok(None);
        }
        let age_class = self.params.age_class(animal.age_weeks);
        if !self.params.is_movement_week(animal.sex, age_class, week)? {
            return Ok(None);
        }
        let odds = self
            .params
            .cumulative_movement_percent(animal.sex, age_class, week)?;
        if stream.uniform_real(0.0, 100.0) >= odds {
            return Ok(None);
        }
        animal.has_dispersed = true;

        let hops = self
            .params
            .dispersal_distance(animal.sex, age_class, stream.next_uniform01());
        let bias = Direction::from_index(usize::try_from(stream.uniform_int(0, 5)).unwrap_or(0));
        trace!("animal {} disperses {hops} cells heading {bias}", animal.id);
        Ok(Some(DispersalPlan { hops, bias }))
    }

    /// Moves the animal to the last cell of `path`. Returns the new cell,
    /// or `None` if the path is empty.
    pub fn relocate(&self, animal: &mut Animal, path: &[CellId], time: SimTime) -> Option<CellId> {
        let destination = *path.last()?;
        animal.move_to(destination, time);
        Some(destination)
    }

    /// Draws the mating weeks of a female for the coming annual cycle, one
    /// per reproduction pulse. Males never mate in this model.
    ///
    /// A pulse with positive variance picks its week from a Gaussian around
    /// the mean, redrawn until the rounded week falls in 0-52; week 0 means
    /// no mating from that pulse.
    ///
    /// # Errors
    ///
    /// Propagates `RabiesError::RangeError` from the Gaussian draw.
    pub fn draw_mating_weeks(
        &self,
        animal: &mut Animal,
        stream: &mut RandomStream,
    ) -> Result<(), RabiesError> {
        animal.mating_weeks.clear();
        if animal.sex != Sex::Female {
            return Ok(());
        }
        let gestation = self.params.gestation_period();
        for pulse in self.params.reproduction_pulses() {
            let week = if pulse.variance > 0.0 {
                loop {
                    let draw = stream.gaussian(pulse.mean_week, pulse.variance)?.round();
                    if (0.0..=f64::from(WEEKS_PER_YEAR)).contains(&draw) {
                        break draw;
                    }
                }
            } else {
                pulse.mean_week.round().clamp(0.0, f64::from(WEEKS_PER_YEAR))
            };
            #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
            let week = week as u8;
            animal
                .mating_weeks
                .push(self.behavior.mating_week(week, gestation));
        }
        Ok(())
    }

    /// Whether a living female mates this week. A successful mating sets the
    /// week in which she will give birth.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn mate(&self, animal: &mut Animal, week: u8) -> Result<bool, RabiesError> {
        check_week(week)?;
        if !animal.is_alive() || animal.sex != Sex::Female {
            return Ok(false);
        }
        if !animal.mating_weeks.contains(&week) {
            return Ok(false);
        }
        animal.pending_birth_week = Some(
            self.behavior
                .birth_week(week, self.params.gestation_period()),
        );
        trace!("animal {} mated in week {week}", animal.id);
        Ok(true)
    }

    /// Whether a mated female gives birth this week: her birth week has come
    /// and a percentage draw falls under the birth odds of her age class.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn give_birth(
        &self,
        animal: &mut Animal,
        week: u8,
        stream: &mut RandomStream,
    ) -> Result<bool, RabiesError> {
        check_week(week)?;
        if !animal.is_alive() || animal.pending_birth_week != Some(week) {
            return Ok(false);
        }
        animal.pending_birth_week = None;
        let odds = self.params.birth_odds(self.params.age_class(animal.age_weeks));
        if odds <= 0.0 {
            return Ok(false);
        }
        Ok(stream.uniform_real(0.0, 100.0) < odds)
    }

    /// The size of a litter, at least 1.
    ///
    /// Walks the cumulative litter-size table. If the table is exhausted
    /// before reaching the draw, the size comes from the configured mean and
    /// variance instead, bounded to `1..=max_litter_size`.
    ///
    /// # Errors
    ///
    /// Propagates `RabiesError::RangeError` from the Gaussian fallback.
    pub fn n_babies(&self, stream: &mut RandomStream) -> Result<u32, RabiesError> {
        let draw = stream.next_uniform01();
        if let Some(size) = self.params.litter_size_from_draw(draw) {
            return Ok(size.max(1));
        }
        let mean = self.params.litter_size_mean();
        let variance = self.params.litter_size_variance();
        let size = if variance > 0.0 {
            stream.gaussian(mean, variance)?.round()
        } else {
            mean.round()
        };
        let max = self.params.max_litter_size().max(1);
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let size = size.clamp(1.0, f64::from(max)) as u32;
        warn!("litter size table exhausted at draw {draw}; using {size}");
        Ok(size)
    }

    /// A newborn of `mother`, located in her cell.
    ///
    /// # Errors
    ///
    /// Propagates errors from drawing the newborn's mating weeks.
    pub fn create_baby(
        &self,
        mother: &mut Animal,
        id: AnimalId,
        time: SimTime,
        stream: &mut RandomStream,
    ) -> Result<Animal, RabiesError> {
        let sex = if stream.uniform_real(0.0, 100.0) < self.params.male_percent() {
            Sex::Male
        } else {
            Sex::Female
        };
        let mut baby = Animal::new(id, sex, 0, Some(mother.id), mother.cell, time, time);
        self.draw_mating_weeks(&mut baby, stream)?;
        mother.offspring.push(id);
        Ok(baby)
    }

    /// True exactly in the week the animal reaches the independence age.
    pub fn become_independent(&self, animal: &mut Animal) -> bool {
        if animal.age_weeks == self.params.independence_age() {
            animal.independent = true;
            true
        } else {
            false
        }
    }

    /// The probability, in `[0, 1]`, that `animal` dies this week.
    ///
    /// Young of the year use `1 - exp(-(annual - baseline) / 52)` where
    /// `baseline` is the mean mortality of surviving mothers. Older animals
    /// use the logistic density response
    /// `po / (1 + exp(-(density - beta) * alpha))` with
    /// `po = 1 - exp(-annual)` and `density` the count of density-relevant
    /// occupants of the cell divided by its carrying capacity.
    #[must_use]
    pub fn weekly_hazard(&self, animal: &Animal, density_count: usize, carrying_capacity: f64) -> f64 {
        let annual = self.params.annual_mortality(animal.sex, animal.age_years());
        let age_class = self.params.age_class(animal.age_weeks);
        let hazard = if age_class.is_young_of_year() {
            1.0 - (-(annual - self.params.baseline_mean_mortality()) / f64::from(WEEKS_PER_YEAR)).exp()
        } else {
            let po = 1.0 - (-annual).exp();
            if po <= 0.0 {
                return 0.0;
            }
            #[allow(clippy::cast_precision_loss)]
            let density = if carrying_capacity > 0.0 {
                density_count as f64 / carrying_capacity
            } else {
                f64::INFINITY
            };
            let (alpha, beta) = self.params.density_constants(po);
            po / (1.0 + (-(density - beta) * alpha).exp())
        };
        if hazard.is_nan() {
            0.0
        } else {
            hazard.clamp(0.0, 1.0)
        }
    }

    /// Whether the animal is dead at the end of this week. Animals past the
    /// maximum age of their sex always die; the rest die when a uniform draw
    /// falls under their weekly hazard.
    pub fn mortality(
        &self,
        animal: &mut Animal,
        time: SimTime,
        density_count: usize,
        carrying_capacity: f64,
        stream: &mut RandomStream,
    ) -> bool {
        if !animal.is_alive() {
            return true;
        }
        if animal.age_weeks >= self.params.max_age(animal.sex) {
            trace!("animal {} reached maximum age", animal.id);
            animal.kill(time);
            return true;
        }
        let hazard = self.weekly_hazard(animal, density_count, carrying_capacity);
        if stream.next_uniform01() < hazard {
            trace!("animal {} died (hazard {hazard:.4})", animal.id);
            animal.kill(time);
            true
        } else {
            false
        }
    }

    /// The contact rate an animal of `sex` contributes within its own cell
    /// (`within`) or to neighbouring cells, given the overall rate.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn cell_contact_rate(
        &self,
        overall_rate: f64,
        week: u8,
        sex: Sex,
        within: bool,
    ) -> Result<f64, RabiesError> {
        let home_range = self.params.home_range(sex, week)?;
        Ok(if within {
            overall_rate * (1.0 - home_range)
        } else {
            overall_rate * home_range
        })
    }
}

//! Species parameters: the per-species tables of rates that drive the
//! lifecycle, indexed by week of year, age in years, sex, age class and
//! dispersal distance.
//!
//! Parameters arrive as a [`SpeciesParameterValues`] (a plain serde bundle,
//! usually read by a [`SpeciesParameterLoader`]) and are validated into an
//! immutable [`SpeciesParameters`], which also precomputes the derived
//! values the lifecycle needs every week: cumulative movement odds,
//! cumulative distance and litter-size distributions, maximum ages and the
//! baseline mortality of surviving mothers.
mod behavior;
mod loader;

pub use behavior::SpeciesBehavior;
pub use loader::{JsonSpeciesLoader, SpeciesParameterLoader};

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::{check_week, RabiesError};
use crate::time::WEEKS_PER_YEAR;

/// Number of one-year slots in the mortality tables.
pub const MORTALITY_YEARS: usize = 8;
/// Number of slots in the movement-distance tables (0-49 cells).
pub const MAX_DISPERSAL_DISTANCE: usize = 50;
/// Hard upper bound on lifespan, in weeks.
pub const DEFAULT_MAX_AGE_WEEKS: u32 = 415;
pub const DEFAULT_DENSITY_BETA: f64 = 1.5;

const WEEKS: usize = WEEKS_PER_YEAR as usize;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
pub enum Sex {
    Male,
    Female,
}

/// Age classes in increasing order of age. An animal only ever moves
/// forward through them.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, EnumIter, Display,
)]
pub enum AgeClass {
    YoungOfYear,
    Juvenile,
    Adult,
}

impl AgeClass {
    #[must_use]
    pub fn is_young_of_year(self) -> bool {
        self == AgeClass::YoungOfYear
    }
}

/// One table per sex and per age group (young of year, or juvenile/adult).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SexAgeTables<T> {
    pub male_young_of_year: Vec<T>,
    pub male_juvenile_adult: Vec<T>,
    pub female_young_of_year: Vec<T>,
    pub female_juvenile_adult: Vec<T>,
}

impl<T> SexAgeTables<T> {
    pub fn get(&self, sex: Sex, age_class: AgeClass) -> &[T] {
        match (sex, age_class.is_young_of_year()) {
            (Sex::Male, true) => &self.male_young_of_year,
            (Sex::Male, false) => &self.male_juvenile_adult,
            (Sex::Female, true) => &self.female_young_of_year,
            (Sex::Female, false) => &self.female_juvenile_adult,
        }
    }

    fn tables(&self) -> [(&'static str, &[T]); 4] {
        [
            ("male_young_of_year", self.male_young_of_year.as_slice()),
            ("male_juvenile_adult", self.male_juvenile_adult.as_slice()),
            ("female_young_of_year", self.female_young_of_year.as_slice()),
            ("female_juvenile_adult", self.female_juvenile_adult.as_slice()),
        ]
    }

    fn map<U>(&self, f: impl Fn(&[T]) -> Vec<U>) -> SexAgeTables<U> {
        SexAgeTables {
            male_young_of_year: f(self.male_young_of_year.as_slice()),
            male_juvenile_adult: f(self.male_juvenile_adult.as_slice()),
            female_young_of_year: f(self.female_young_of_year.as_slice()),
            female_juvenile_adult: f(self.female_juvenile_adult.as_slice()),
        }
    }
}

/// A birth pulse. With a positive variance the week is drawn from a
/// normal distribution every year; with zero variance `mean_week` is used
/// as a fixed week. Week 0 means "no reproduction event".
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReproductionPulse {
    pub mean_week: f64,
    #[serde(default)]
    pub variance: f64,
}

/// Logistic density-dependence constants. Values only take effect when the
/// matching `*_user_defined` flag is set; otherwise they are computed.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DensityDependence {
    #[serde(default)]
    pub alpha: f64,
    #[serde(default = "default_beta")]
    pub beta: f64,
    #[serde(default)]
    pub alpha_user_defined: bool,
    #[serde(default)]
    pub beta_user_defined: bool,
}

fn default_beta() -> f64 {
    DEFAULT_DENSITY_BETA
}

impl Default for DensityDependence {
    fn default() -> Self {
        DensityDependence {
            alpha: 0.0,
            beta: DEFAULT_DENSITY_BETA,
            alpha_user_defined: false,
            beta_user_defined: false,
        }
    }
}

fn default_max_litter_size() -> u32 {
    8
}

fn default_max_age() -> u32 {
    DEFAULT_MAX_AGE_WEEKS
}

/// The raw, unvalidated parameter bundle for one species.
///
/// Mortality and home-range values are probabilities in `[0, 1]`; movement
/// distances are probabilities per distance; the gender ratio and birth
/// odds are percentages. Ages are in weeks.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpeciesParameterValues {
    pub name: String,
    pub male_mortality: Vec<f64>,
    pub female_mortality: Vec<f64>,
    pub male_home_range: Vec<f64>,
    pub female_home_range: Vec<f64>,
    pub movement_weeks: SexAgeTables<bool>,
    pub movement_distance: SexAgeTables<f64>,
    pub litter_size_mean: f64,
    pub litter_size_variance: f64,
    #[serde(default = "default_max_litter_size")]
    pub max_litter_size: u32,
    /// Probabilities of litter sizes `1..=n`; derived from the mean and
    /// variance when absent.
    #[serde(default)]
    pub litter_size_table: Option<Vec<f64>>,
    pub male_percent: f64,
    pub juvenile_birth_odds: f64,
    pub adult_birth_odds: f64,
    pub independence_age: u32,
    pub adult_age: u32,
    pub reproduction_pulses: Vec<ReproductionPulse>,
    #[serde(default)]
    pub gestation_period: u8,
    #[serde(default)]
    pub density: DensityDependence,
    #[serde(default = "default_max_age")]
    pub max_age: u32,
}

/// Validated, read-only parameters for one species.
#[derive(Clone, Debug)]
pub struct SpeciesParameters {
    values: SpeciesParameterValues,
    cumulative_movement_percent: SexAgeTables<f64>,
    cumulative_distance: SexAgeTables<f64>,
    litter_size_probabilities: Vec<f64>,
    max_age_male: u32,
    max_age_female: u32,
    baseline_mean_mortality: f64,
}

fn config_error<T>(message: String) -> Result<T, RabiesError> {
    Err(RabiesError::ConfigError(message))
}

fn check_length<T>(name: &str, values: &[T], expected: usize) -> Result<(), RabiesError> {
    if values.len() == expected {
        Ok(())
    } else {
        config_error(format!(
            "{name} has {} entries, expected {expected}",
            values.len()
        ))
    }
}

fn check_bounds(name: &str, values: &[f64], max: f64) -> Result<(), RabiesError> {
    match values
        .iter()
        .position(|v| !v.is_finite() || *v < 0.0 || *v > max)
    {
        None => Ok(()),
        Some(i) => config_error(format!(
            "{name}[{i}] = {} is outside [0, {max}]",
            values[i]
        )),
    }
}

fn cumulative(values: &[f64]) -> Vec<f64> {
    values
        .iter()
        .scan(0.0, |sum, v| {
            *sum += v;
            Some(*sum)
        })
        .collect()
}

/// For each week, the percentage of the season's movement weeks that have
/// elapsed by the end of that week. Zero in weeks where movement is not
/// permitted.
#[allow(clippy::cast_precision_loss)]
fn cumulative_movement(weeks: &[bool]) -> Vec<f64> {
    let total = weeks.iter().filter(|w| **w).count();
    let mut so_far = 0usize;
    weeks
        .iter()
        .map(|movable| {
            if *movable {
                so_far += 1;
                100.0 * so_far as f64 / total as f64
            } else {
                0.0
            }
        })
        .collect()
}

/// Normal density over litter sizes `1..=max`, normalised to sum to one.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn litter_size_distribution(mean: f64, variance: f64, max: u32) -> Vec<f64> {
    let sizes = 1..=max;
    if variance <= 0.0 {
        let fixed = mean.round().clamp(1.0, f64::from(max)) as u32;
        return sizes.map(|k| if k == fixed { 1.0 } else { 0.0 }).collect();
    }
    let density: Vec<f64> = sizes
        .map(|k| {
            let d = f64::from(k) - mean;
            (-d * d / (2.0 * variance)).exp() / (2.0 * PI * variance).sqrt()
        })
        .collect();
    let total: f64 = density.iter().sum();
    if total <= 0.0 {
        // The mean is so far from 1..=max that every density underflowed.
        let fixed = mean.round().clamp(1.0, f64::from(max)) as usize;
        return (1..=max as usize)
            .map(|k| if k == fixed { 1.0 } else { 0.0 })
            .collect();
    }
    density.into_iter().map(|d| d / total).collect()
}

/// Survivorship-weighted mean annual mortality of females in their
/// reproductive years (one year old and older).
fn mean_mortality_of_mothers(female_mortality: &[f64]) -> f64 {
    let mut survivorship = 1.0;
    let mut weighted = 0.0;
    let mut total = 0.0;
    for (year, mortality) in female_mortality.iter().enumerate() {
        if year >= 1 {
            weighted += survivorship * mortality;
            total += survivorship;
        }
        survivorship *= 1.0 - mortality;
    }
    if total > 0.0 {
        weighted / total
    } else {
        0.0
    }
}

/// The age in weeks at which an animal dies of old age: the end of the
/// first year with 100% mortality, or `hard_max`, whichever is smaller.
#[allow(clippy::cast_possible_truncation)]
fn max_age_from_mortality(mortality: &[f64], hard_max: u32) -> u32 {
    mortality
        .iter()
        .position(|m| *m >= 1.0)
        .map_or(hard_max, |year| {
            ((year as u32 + 1) * u32::from(WEEKS_PER_YEAR)).min(hard_max)
        })
}

impl TryFrom<SpeciesParameterValues> for SpeciesParameters {
    type Error = RabiesError;

    fn try_from(values: SpeciesParameterValues) -> Result<Self, Self::Error> {
        SpeciesParameters::new(values)
    }
}

impl SpeciesParameters {
    /// Validates `values` and computes the derived tables.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::ConfigError` describing the first problem
    /// found.
    pub fn new(values: SpeciesParameterValues) -> Result<SpeciesParameters, RabiesError> {
        let name = &values.name;
        check_length("male_mortality", &values.male_mortality, MORTALITY_YEARS)?;
        check_length("female_mortality", &values.female_mortality, MORTALITY_YEARS)?;
        check_bounds("male_mortality", &values.male_mortality, 1.0)?;
        check_bounds("female_mortality", &values.female_mortality, 1.0)?;
        check_length("male_home_range", &values.male_home_range, WEEKS)?;
        check_length("female_home_range", &values.female_home_range, WEEKS)?;
        check_bounds("male_home_range", &values.male_home_range, 1.0)?;
        check_bounds("female_home_range", &values.female_home_range, 1.0)?;

        for (table, weeks) in values.movement_weeks.tables() {
            check_length(&format!("movement_weeks.{table}"), weeks, WEEKS)?;
        }
        for (table, distances) in values.movement_distance.tables() {
            let table = format!("movement_distance.{table}");
            check_length(&table, distances, MAX_DISPERSAL_DISTANCE)?;
            check_bounds(&table, distances, 1.0)?;
        }

        check_bounds("male_percent", &[values.male_percent], 100.0)?;
        check_bounds("juvenile_birth_odds", &[values.juvenile_birth_odds], 100.0)?;
        check_bounds("adult_birth_odds", &[values.adult_birth_odds], 100.0)?;

        if values.independence_age == 0 || values.independence_age >= values.adult_age {
            return config_error(format!(
                "{name}: independence age ({}) must be positive and below adult age ({})",
                values.independence_age, values.adult_age
            ));
        }
        if values.max_age == 0 {
            return config_error(format!("{name}: max_age must be positive"));
        }

        if values.reproduction_pulses.is_empty() || values.reproduction_pulses.len() > 3 {
            return config_error(format!(
                "{name}: expected 1 to 3 reproduction pulses, found {}",
                values.reproduction_pulses.len()
            ));
        }
        for pulse in &values.reproduction_pulses {
            if !(0.0..=f64::from(WEEKS_PER_YEAR)).contains(&pulse.mean_week)
                || !pulse.variance.is_finite()
                || pulse.variance < 0.0
            {
                return config_error(format!("{name}: invalid reproduction pulse {pulse:?}"));
            }
        }
        if values.gestation_period >= WEEKS_PER_YEAR {
            return config_error(format!(
                "{name}: gestation period {} is not shorter than a year",
                values.gestation_period
            ));
        }

        if !values.litter_size_mean.is_finite()
            || values.litter_size_mean < 1.0
            || values.litter_size_variance < 0.0
            || values.max_litter_size == 0
        {
            return config_error(format!(
                "{name}: invalid litter size mean {} / variance {} / max {}",
                values.litter_size_mean, values.litter_size_variance, values.max_litter_size
            ));
        }
        let litter_size_probabilities = match &values.litter_size_table {
            Some(table) => {
                if table.is_empty() {
                    return config_error(format!("{name}: litter_size_table is empty"));
                }
                check_bounds("litter_size_table", table, 1.0)?;
                table.clone()
            }
            None => litter_size_distribution(
                values.litter_size_mean,
                values.litter_size_variance,
                values.max_litter_size,
            ),
        };

        let density = values.density;
        if !density.beta.is_finite() || (density.alpha_user_defined && !density.alpha.is_finite())
        {
            return config_error(format!("{name}: invalid density constants {density:?}"));
        }

        let max_age_male = max_age_from_mortality(&values.male_mortality, values.max_age);
        let max_age_female = max_age_from_mortality(&values.female_mortality, values.max_age);
        let baseline_mean_mortality = mean_mortality_of_mothers(&values.female_mortality);

        Ok(SpeciesParameters {
            cumulative_movement_percent: values.movement_weeks.map(cumulative_movement),
            cumulative_distance: values.movement_distance.map(cumulative),
            litter_size_probabilities,
            max_age_male,
            max_age_female,
            baseline_mean_mortality,
            values,
        })
    }

    /// Parses and validates parameters from a JSON document.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::JsonError` for malformed JSON and
    /// `RabiesError::ConfigError` for invalid values.
    pub fn from_json_str(json: &str) -> Result<SpeciesParameters, RabiesError> {
        let values: SpeciesParameterValues = serde_json::from_str(json)?;
        SpeciesParameters::new(values)
    }

    #[must_use]
    pub fn values(&self) -> &SpeciesParameterValues {
        &self.values
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.values.name
    }

    #[must_use]
    pub fn independence_age(&self) -> u32 {
        self.values.independence_age
    }

    #[must_use]
    pub fn adult_age(&self) -> u32 {
        self.values.adult_age
    }

    #[must_use]
    pub fn age_class(&self, age_weeks: u32) -> AgeClass {
        if age_weeks < self.values.independence_age {
            AgeClass::YoungOfYear
        } else if age_weeks < self.values.adult_age {
            AgeClass::Juvenile
        } else {
            AgeClass::Adult
        }
    }

    /// Annual mortality probability for `sex` at `age_years`. Ages past the
    /// end of the table use the last year.
    #[must_use]
    pub fn annual_mortality(&self, sex: Sex, age_years: u32) -> f64 {
        let table = match sex {
            Sex::Male => &self.values.male_mortality,
            Sex::Female => &self.values.female_mortality,
        };
        let index = usize::try_from(age_years).map_or(MORTALITY_YEARS - 1, |age| {
            age.min(MORTALITY_YEARS - 1)
        });
        table[index]
    }

    #[must_use]
    pub fn max_age(&self, sex: Sex) -> u32 {
        match sex {
            Sex::Male => self.max_age_male,
            Sex::Female => self.max_age_female,
        }
    }

    #[must_use]
    pub fn max_age_male(&self) -> u32 {
        self.max_age_male
    }

    #[must_use]
    pub fn max_age_female(&self) -> u32 {
        self.max_age_female
    }

    /// Mean annual mortality of surviving mothers, subtracted from the raw
    /// young-of-year rate when computing its weekly hazard.
    #[must_use]
    pub fn baseline_mean_mortality(&self) -> f64 {
        self.baseline_mean_mortality
    }

    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn home_range(&self, sex: Sex, week: u8) -> Result<f64, RabiesError> {
        check_week(week)?;
        let table = match sex {
            Sex::Male => &self.values.male_home_range,
            Sex::Female => &self.values.female_home_range,
        };
        Ok(table[usize::from(week - 1)])
    }

    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn is_movement_week(
        &self,
        sex: Sex,
        age_class: AgeClass,
        week: u8,
    ) -> Result<bool, RabiesError> {
        check_week(week)?;
        Ok(self.values.movement_weeks.get(sex, age_class)[usize::from(week - 1)])
    }

    /// Percentage (0-100) of the movement season completed by the end of
    /// `week`; zero outside the season.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn cumulative_movement_percent(
        &self,
        sex: Sex,
        age_class: AgeClass,
        week: u8,
    ) -> Result<f64, RabiesError> {
        check_week(week)?;
        Ok(self.cumulative_movement_percent.get(sex, age_class)[usize::from(week - 1)])
    }

    /// The dispersal distance, in cells, selected by a uniform draw in
    /// `[0, 1)`: the first distance whose cumulative probability reaches the
    /// draw. Draws beyond the table total select the longest distance with
    /// non-zero probability.
    #[must_use]
    pub fn dispersal_distance(&self, sex: Sex, age_class: AgeClass, draw: f64) -> usize {
        let table = self.cumulative_distance.get(sex, age_class);
        table.iter().position(|c| *c >= draw).unwrap_or_else(|| {
            self.values
                .movement_distance
                .get(sex, age_class)
                .iter()
                .rposition(|p| *p > 0.0)
                .unwrap_or(0)
        })
    }

    /// Probabilities of litter sizes `1..=n`.
    #[must_use]
    pub fn litter_size_probabilities(&self) -> &[f64] {
        &self.litter_size_probabilities
    }

    /// The litter size selected by a uniform draw in `[0, 1)`, or `None` if
    /// the table sums to less than the draw.
    #[must_use]
    pub fn litter_size_from_draw(&self, draw: f64) -> Option<u32> {
        let mut sum = 0.0;
        for (index, probability) in self.litter_size_probabilities.iter().enumerate() {
            sum += probability;
            if sum >= draw {
                return u32::try_from(index + 1).ok();
            }
        }
        None
    }

    /// Largest litter size this species can produce: the length of the
    /// litter table in use, configured or derived.
    #[must_use]
    pub fn max_litter_size(&self) -> u32 {
        u32::try_from(self.litter_size_probabilities.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn litter_size_mean(&self) -> f64 {
        self.values.litter_size_mean
    }

    #[must_use]
    pub fn litter_size_variance(&self) -> f64 {
        self.values.litter_size_variance
    }

    #[must_use]
    pub fn male_percent(&self) -> f64 {
        self.values.male_percent
    }

    /// Birth odds (percent) for a female of `age_class`; young of the year
    /// never give birth.
    #[must_use]
    pub fn birth_odds(&self, age_class: AgeClass) -> f64 {
        match age_class {
            AgeClass::YoungOfYear => 0.0,
            AgeClass::Juvenile => self.values.juvenile_birth_odds,
            AgeClass::Adult => self.values.adult_birth_odds,
        }
    }

    #[must_use]
    pub fn reproduction_pulses(&self) -> &[ReproductionPulse] {
        &self.values.reproduction_pulses
    }

    #[must_use]
    pub fn gestation_period(&self) -> u8 {
        self.values.gestation_period
    }

    /// The logistic constants `(alpha, beta)` for a base weekly hazard
    /// `po`. Beta defaults to 1.5 and alpha to `beta * 4 / po` unless the
    /// configuration overrides them.
    #[must_use]
    pub fn density_constants(&self, po: f64) -> (f64, f64) {
        let density = &self.values.density;
        let beta = if density.beta_user_defined {
            density.beta
        } else {
            DEFAULT_DENSITY_BETA
        };
        let alpha = if density.alpha_user_defined {
            density.alpha
        } else {
            beta * 4.0 / po
        };
        (alpha, beta)
    }
}

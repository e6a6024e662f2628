use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

use crate::species::AgeClass;
use crate::time::WEEKS_PER_YEAR;

/// Species-specific behaviour, selected once when the population is built.
///
/// The lifecycle engine is shared by all species; the few places where
/// foxes and raccoons differ are answered here.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SpeciesBehavior {
    /// Disperses at most once per annual cycle; births fall on the drawn
    /// reproduction week.
    Fox,
    /// May disperse again in any permitted week; mating precedes the
    /// reproduction week by the gestation period.
    Raccoon,
}

impl SpeciesBehavior {
    /// Gestation used for raccoons when the configuration does not give one.
    pub const RACCOON_DEFAULT_GESTATION: u8 = 9;

    /// Whether the "has dispersed" flag is cleared at the start of `week`.
    #[must_use]
    pub fn clears_dispersal_flag(self, week: u8) -> bool {
        match self {
            SpeciesBehavior::Fox => week == 1,
            SpeciesBehavior::Raccoon => true,
        }
    }

    /// Weeks between mating and giving birth, given the configured period.
    #[must_use]
    pub fn gestation_weeks(self, configured: u8) -> u8 {
        match self {
            SpeciesBehavior::Fox => 0,
            SpeciesBehavior::Raccoon if configured == 0 => Self::RACCOON_DEFAULT_GESTATION,
            SpeciesBehavior::Raccoon => configured,
        }
    }

    /// The mating week for a drawn reproduction week. Week 0 stays 0 ("no
    /// event"); otherwise the gestation offset is subtracted, floored at 1.
    #[must_use]
    pub fn mating_week(self, reproduction_week: u8, configured_gestation: u8) -> u8 {
        if reproduction_week == 0 {
            return 0;
        }
        let gestation = self.gestation_weeks(configured_gestation);
        reproduction_week.saturating_sub(gestation).max(1)
    }

    /// The week of birth for a mating in `mating_week`, wrapping into the
    /// next year.
    #[must_use]
    pub fn birth_week(self, mating_week: u8, configured_gestation: u8) -> u8 {
        let gestation = self.gestation_weeks(configured_gestation);
        (mating_week.max(1) - 1 + gestation) % WEEKS_PER_YEAR + 1
    }

    /// Whether animals of `age_class` count toward the density pressure
    /// used by density-dependent mortality.
    #[must_use]
    pub fn counts_toward_density(self, age_class: AgeClass) -> bool {
        match self {
            SpeciesBehavior::Fox | SpeciesBehavior::Raccoon => !age_class.is_young_of_year(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn dispersal_flag_reset() {
        assert!(SpeciesBehavior::Fox.clears_dispersal_flag(1));
        assert!(!SpeciesBehavior::Fox.clears_dispersal_flag(2));
        assert!(SpeciesBehavior::Raccoon.clears_dispersal_flag(30));
    }

    #[test]
    fn gestation_offsets() {
        assert_eq!(SpeciesBehavior::Fox.mating_week(16, 9), 16);
        assert_eq!(SpeciesBehavior::Raccoon.mating_week(16, 9), 7);
        assert_eq!(SpeciesBehavior::Raccoon.mating_week(5, 9), 1);
        assert_eq!(SpeciesBehavior::Raccoon.mating_week(0, 9), 0);
        assert_eq!(SpeciesBehavior::Raccoon.mating_week(20, 0), 11);
    }

    #[test]
    fn birth_week_wraps() {
        assert_eq!(SpeciesBehavior::Fox.birth_week(16, 9), 16);
        assert_eq!(SpeciesBehavior::Raccoon.birth_week(7, 9), 16);
        assert_eq!(SpeciesBehavior::Raccoon.birth_week(50, 9), 7);
    }

    #[test]
    fn density_classes() {
        assert!(!SpeciesBehavior::Fox.counts_toward_density(AgeClass::YoungOfYear));
        assert!(SpeciesBehavior::Fox.counts_toward_density(AgeClass::Juvenile));
        assert!(SpeciesBehavior::Raccoon.counts_toward_density(AgeClass::Adult));
    }

    #[test]
    fn parses_names() {
        assert_eq!(
            SpeciesBehavior::from_str("raccoon").unwrap(),
            SpeciesBehavior::Raccoon
        );
        assert_eq!(SpeciesBehavior::Fox.to_string(), "fox");
        let parsed: SpeciesBehavior = serde_json::from_str("\"fox\"").unwrap();
        assert_eq!(parsed, SpeciesBehavior::Fox);
    }
}

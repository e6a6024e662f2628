//! Simulated calendar time: a year and a week of the 52-week annual cycle.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{check_week, RabiesError};

pub const WEEKS_PER_YEAR: u8 = 52;

/// A (year, week) pair with `week` in 1-52.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SimTime {
    pub year: u32,
    pub week: u8,
}

impl SimTime {
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `week` is outside 1-52.
    pub fn new(year: u32, week: u8) -> Result<SimTime, RabiesError> {
        check_week(week)?;
        Ok(SimTime { year, week })
    }

    /// The following week, rolling over into week 1 of the next year.
    #[must_use]
    pub fn next(self) -> SimTime {
        if self.week >= WEEKS_PER_YEAR {
            SimTime {
                year: self.year + 1,
                week: 1,
            }
        } else {
            SimTime {
                year: self.year,
                week: self.week + 1,
            }
        }
    }

    /// Number of weeks from `earlier` to `self`; negative if `earlier` is later.
    #[must_use]
    pub fn weeks_since(self, earlier: SimTime) -> i64 {
        self.absolute_week() - earlier.absolute_week()
    }

    /// The time `weeks` weeks before `self`, saturating at week 1 of year 0.
    #[must_use]
    pub fn earlier_by(self, weeks: u32) -> SimTime {
        let per_year = i64::from(WEEKS_PER_YEAR);
        let absolute = (self.absolute_week() - i64::from(weeks)).max(1);
        let year = (absolute - 1) / per_year;
        let week = (absolute - 1) % per_year + 1;
        SimTime {
            year: u32::try_from(year).unwrap_or(0),
            week: u8::try_from(week).unwrap_or(1),
        }
    }

    fn absolute_week(self) -> i64 {
        i64::from(self.year) * i64::from(WEEKS_PER_YEAR) + i64::from(self.week)
    }
}

impl fmt::Display for SimTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-W{:02}", self.year, self.week)
    }
}

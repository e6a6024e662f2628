use std::fmt::{self, Debug, Display};
use std::io;

/// Provides `RabiesError` and maps other errors to
/// convert to a `RabiesError`
///
/// The variants follow the error taxonomy of the simulator: configuration
/// problems are reported at load time, range problems when a lifecycle
/// operation receives an argument outside its domain, and missing references
/// when a record points at something that does not exist. None of them are
/// recoverable inside a run; they all bubble up to the caller.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum RabiesError {
    IoError(io::Error),
    JsonError(serde_json::Error),
    CsvError(csv::Error),
    ConfigError(String),
    RangeError(String),
    MissingReference(String),
    Error(String),
}

impl From<io::Error> for RabiesError {
    fn from(error: io::Error) -> Self {
        RabiesError::IoError(error)
    }
}

impl From<serde_json::Error> for RabiesError {
    fn from(error: serde_json::Error) -> Self {
        RabiesError::JsonError(error)
    }
}

impl From<csv::Error> for RabiesError {
    fn from(error: csv::Error) -> Self {
        RabiesError::CsvError(error)
    }
}

impl From<String> for RabiesError {
    fn from(error: String) -> Self {
        RabiesError::Error(error)
    }
}

impl From<&str> for RabiesError {
    fn from(error: &str) -> Self {
        RabiesError::Error(error.to_string())
    }
}

impl std::error::Error for RabiesError {}

impl Display for RabiesError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Error: {self:?}")?;
        Ok(())
    }
}

/// Checks that `week` is a week of the year (1-52).
///
/// # Errors
///
/// Returns `RabiesError::RangeError` when the week is outside 1-52.
pub fn check_week(week: u8) -> Result<(), RabiesError> {
    if (1..=crate::time::WEEKS_PER_YEAR).contains(&week) {
        Ok(())
    } else {
        Err(RabiesError::RangeError(format!(
            "week {week} is outside the range 1-52"
        )))
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn week_range() {
        assert!(check_week(1).is_ok());
        assert!(check_week(52).is_ok());
        assert!(matches!(check_week(0), Err(RabiesError::RangeError(_))));
        assert!(matches!(check_week(53), Err(RabiesError::RangeError(_))));
    }

    #[test]
    fn converts_from_str() {
        let error: RabiesError = "bad".into();
        assert_eq!(format!("{error}"), "Error: Error(\"bad\")");
    }
}

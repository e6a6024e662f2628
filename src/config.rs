//! Run configuration read from JSON.
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};

use crate::error::{check_week, RabiesError};
use crate::log::LoggingConfig;
use crate::species::SpeciesBehavior;
use crate::time::SimTime;

fn default_start_week() -> u8 {
    1
}

fn default_initial_density() -> f64 {
    1.0
}

/// Settings for one simulation run. Species parameters and the landscape
/// are loaded separately through their loaders.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfig {
    pub seed: u64,
    pub start_year: u32,
    #[serde(default = "default_start_week")]
    pub start_week: u8,
    pub weeks_to_run: u32,
    pub species: SpeciesBehavior,
    #[serde(default)]
    pub prune_dead: bool,
    /// Animals seeded per unit of carrying capacity.
    #[serde(default = "default_initial_density")]
    pub initial_density: f64,
    /// Where to write the CSV lifecycle report, if anywhere.
    #[serde(default)]
    pub report_file: Option<PathBuf>,
    /// Left as is when absent.
    #[serde(default)]
    pub logging: Option<LoggingConfig>,
}

impl SimulationConfig {
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` for a start week outside 1-52 and
    /// `RabiesError::ConfigError` for a negative initial density.
    pub fn validate(&self) -> Result<(), RabiesError> {
        check_week(self.start_week)?;
        if !self.initial_density.is_finite() || self.initial_density < 0.0 {
            return Err(RabiesError::ConfigError(format!(
                "initial_density {} must be a non-negative number",
                self.initial_density
            )));
        }
        Ok(())
    }

    #[must_use]
    pub fn start_time(&self) -> SimTime {
        SimTime {
            year: self.start_year,
            week: self.start_week,
        }
    }
}

/// Reads and validates a `SimulationConfig` from a JSON file.
///
/// # Errors
///
/// Returns `RabiesError::IoError` or `RabiesError::JsonError` if the file
/// cannot be read or parsed, and the errors of
/// [`SimulationConfig::validate`].
pub fn load_config_from_json(path: &Path) -> Result<SimulationConfig, RabiesError> {
    info!("loading simulation configuration from {}", path.display());
    let reader = BufReader::new(File::open(path)?);
    let config: SimulationConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_config(json: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_with_defaults() {
        let file = write_config(
            r#"{"seed": 42, "start_year": 2020, "weeks_to_run": 104, "species": "raccoon"}"#,
        );
        let config = load_config_from_json(file.path()).unwrap();
        assert_eq!(config.seed, 42);
        assert_eq!(config.species, SpeciesBehavior::Raccoon);
        assert_eq!(config.start_time(), SimTime::new(2020, 1).unwrap());
        assert!(!config.prune_dead);
        assert_eq!(config.report_file, None);
        assert_eq!(config.logging, None);
    }

    #[test]
    fn loads_logging_section() {
        let file = write_config(
            r#"{"seed": 1, "start_year": 1, "weeks_to_run": 1, "species": "fox",
                "logging": {"modules": {"rabies_abm::landscape": "trace"}}}"#,
        );
        let logging = load_config_from_json(file.path()).unwrap().logging.unwrap();
        assert_eq!(logging.level, "off");
        assert_eq!(logging.modules["rabies_abm::landscape"], "trace");
    }

    #[test]
    fn rejects_bad_start_week() {
        let file = write_config(
            r#"{"seed": 1, "start_year": 1, "start_week": 53, "weeks_to_run": 1, "species": "fox"}"#,
        );
        assert!(matches!(
            load_config_from_json(file.path()),
            Err(RabiesError::RangeError(_))
        ));
    }

    #[test]
    fn rejects_unknown_species() {
        let file = write_config(
            r#"{"seed": 1, "start_year": 1, "weeks_to_run": 1, "species": "badger"}"#,
        );
        assert!(matches!(
            load_config_from_json(file.path()),
            Err(RabiesError::JsonError(_))
        ));
    }

    #[test]
    fn rejects_negative_density() {
        let file = write_config(
            r#"{"seed": 1, "start_year": 1, "weeks_to_run": 1, "species": "fox", "initial_density": -2}"#,
        );
        assert!(matches!(
            load_config_from_json(file.path()),
            Err(RabiesError::ConfigError(_))
        ));
    }
}

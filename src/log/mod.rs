//! Diagnostic logging for the simulator. Logging describes what the engine is doing
//! (per-animal decisions at `trace`, weekly summaries at `debug`, loads and snapshots at
//! `info`); model output goes to the lifecycle report instead.
//!
//! The five logging macros `error!`, `warn!`, `info!`, `debug!` and `trace!` are re-exported
//! from the `log` crate:
//!
//! ```rust
//! use rabies_abm::log::info;
//!
//! pub fn do_a_thing() {
//!     info!("A thing is being done.");
//! }
//! ```
//!
//! Logging is off until a level is set, either from a run configuration through
//! [`configure_logging`] or directly:
//!
//! ```rust
//! use rabies_abm::log::{set_module_filter, set_log_level, LevelFilter};
//!
//! pub fn setup_logging() {
//!     set_log_level(LevelFilter::Info);
//!     // Per-animal dispersal decisions.
//!     set_module_filter("rabies_abm::lifecycle", LevelFilter::Trace);
//! }
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

pub use log::{debug, error, info, trace, warn, LevelFilter};
use std::collections::hash_map::Entry;

use crate::error::RabiesError;
use crate::hashing::HashMap;
#[cfg(feature = "logging")]
use log4rs::Handle;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::sync::LazyLock;
use std::sync::{Mutex, MutexGuard};

// Logging disabled
const DEFAULT_LOG_LEVEL: LevelFilter = LevelFilter::Off;
// Stream creation is logged once per stream per seed and is rarely useful.
const DEFAULT_MODULE_FILTERS: [(&str, LevelFilter); 1] = [("rabies_abm::random", LevelFilter::Info)];

/// A global instance of the logging configuration.
static LOG_CONFIGURATION: LazyLock<Mutex<LogConfiguration>> = LazyLock::new(Mutex::default);

/// The logging section of a run configuration. Levels are named as in `LevelFilter`
/// (`"off"`, `"warn"`, `"trace"`, ...), case-insensitively.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_level_name")]
    pub level: String,
    /// Levels for individual module paths, e.g. `"rabies_abm::landscape"`.
    #[serde(default)]
    pub modules: BTreeMap<String, String>,
}

fn default_level_name() -> String {
    "off".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: default_level_name(),
            modules: BTreeMap::new(),
        }
    }
}

/// The maximum level for messages emitted from one module path (e.g. `"rabies_abm::lifecycle"`).
#[derive(Debug, PartialEq)]
struct ModuleLogConfiguration {
    module: String,
    level: LevelFilter,
}

impl From<(&str, LevelFilter)> for ModuleLogConfiguration {
    fn from((module, level): (&str, LevelFilter)) -> Self {
        Self {
            module: module.to_string(),
            level,
        }
    }
}

/// Holds logging configuration: the filter levels of modules and a handle to the global logger.
///
/// Because loggers are globally installed, only one instance of this struct exists. The
/// public API are free functions which fetch the singleton and call the appropriate member
/// function.
#[derive(Debug)]
pub(in crate::log) struct LogConfiguration {
    /// The level filter for modules without an explicitly set filter. `LevelFilter::Off`
    /// disables logging.
    pub(in crate::log) global_log_level: LevelFilter,
    pub(in crate::log) module_configurations: HashMap<String, ModuleLogConfiguration>,

    #[cfg(feature = "logging")]
    root_handle: Option<Handle>,
}

impl Default for LogConfiguration {
    fn default() -> Self {
        let module_configurations = DEFAULT_MODULE_FILTERS
            .map(|(module, level)| (module.to_string(), (module, level).into()));
        let module_configurations = HashMap::from_iter(module_configurations);
        Self {
            global_log_level: DEFAULT_LOG_LEVEL,
            module_configurations,

            #[cfg(feature = "logging")]
            root_handle: None,
        }
    }
}

impl LogConfiguration {
    pub(in crate::log) fn set_log_level(&mut self, level: LevelFilter) {
        self.global_log_level = level;
        self.set_config();
    }

    /// Returns true if the configuration was mutated, false otherwise.
    fn insert_module_filter(&mut self, module: &str, level: LevelFilter) -> bool {
        match self.module_configurations.entry(module.to_string()) {
            Entry::Occupied(mut entry) => {
                let module_config = entry.get_mut();
                if module_config.level == level {
                    return false;
                }
                module_config.level = level;
            }
            Entry::Vacant(entry) => {
                entry.insert((module, level).into());
            }
        }
        true
    }

    pub(in crate::log) fn set_module_filter(&mut self, module: &str, level: LevelFilter) {
        if self.insert_module_filter(module, level) {
            self.set_config();
        }
    }

    fn apply(&mut self, level: LevelFilter, module_filters: &[(String, LevelFilter)]) {
        self.global_log_level = level;
        for (module, level) in module_filters {
            self.insert_module_filter(module, *level);
        }
        self.set_config();
    }

    pub(in crate::log) fn remove_module_filter(&mut self, module: &str) {
        if self.module_configurations.remove(module).is_some() {
            self.set_config();
        }
    }
}

// The public API

/// Enables the logger with no global level filter / full logging. Equivalent to
/// `set_log_level(LevelFilter::Trace)`.
pub fn enable_logging() {
    set_log_level(LevelFilter::Trace);
}

/// Disables logging completely. Equivalent to `set_log_level(LevelFilter::Off)`.
pub fn disable_logging() {
    set_log_level(LevelFilter::Off);
}

/// Sets the global log level. A global filter level of `LevelFilter::Off` disables logging.
pub fn set_log_level(level: LevelFilter) {
    get_log_configuration().set_log_level(level);
}

/// Sets a level filter for the given module path.
pub fn set_module_filter(module_path: &str, level_filter: LevelFilter) {
    get_log_configuration().set_module_filter(module_path, level_filter);
}

/// Removes a module-specific level filter for the given module path. The global level filter will
/// apply to the module.
pub fn remove_module_filter(module_path: &str) {
    get_log_configuration().remove_module_filter(module_path);
}

/// Applies the logging section of a run configuration: the global level plus any per-module
/// levels, all in one logger rebuild.
///
/// # Errors
///
/// Returns `RabiesError::ConfigError` if a level name is not one of `off`, `error`, `warn`,
/// `info`, `debug` or `trace`. Nothing is changed in that case.
pub fn configure_logging(config: &LoggingConfig) -> Result<(), RabiesError> {
    let level = parse_level(&config.level)?;
    let module_filters = config
        .modules
        .iter()
        .map(|(module, level)| Ok((module.clone(), parse_level(level)?)))
        .collect::<Result<Vec<_>, RabiesError>>()?;
    get_log_configuration().apply(level, &module_filters);
    Ok(())
}

fn parse_level(name: &str) -> Result<LevelFilter, RabiesError> {
    LevelFilter::from_str(name)
        .map_err(|_| RabiesError::ConfigError(format!("unknown log level {name:?}")))
}

fn get_log_configuration() -> MutexGuard<'static, LogConfiguration> {
    LOG_CONFIGURATION.lock().expect("Mutex poisoned")
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::{error, trace};

    // Force logging tests to run serially for consistent behavior.
    static TEST_MUTEX: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn test_set_log_level() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_log_level(LevelFilter::Error);
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Error);
            error!("test_set_log_level: global set to error");
            trace!("test_set_log_level: NOT EMITTED");
        }
        disable_logging();
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn test_set_remove_module_filter() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        set_module_filter("rabies_abm::lifecycle", LevelFilter::Debug);
        assert_eq!(
            get_log_configuration()
                .module_configurations
                .get("rabies_abm::lifecycle"),
            Some(&("rabies_abm::lifecycle", LevelFilter::Debug).into())
        );
        remove_module_filter("rabies_abm::lifecycle");
        assert!(!get_log_configuration()
            .module_configurations
            .contains_key("rabies_abm::lifecycle"));
    }

    #[test]
    fn test_configure_logging() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        let config: LoggingConfig = serde_json::from_str(
            r#"{"level": "warn", "modules": {"rabies_abm::population": "DEBUG"}}"#,
        )
        .unwrap();
        configure_logging(&config).unwrap();
        {
            let config = get_log_configuration();
            assert_eq!(config.global_log_level, LevelFilter::Warn);
            assert_eq!(
                config.module_configurations.get("rabies_abm::population"),
                Some(&("rabies_abm::population", LevelFilter::Debug).into())
            );
            // Defaults survive alongside configured modules.
            assert!(config.module_configurations.contains_key("rabies_abm::random"));
        }

        remove_module_filter("rabies_abm::population");
        configure_logging(&LoggingConfig::default()).unwrap();
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }

    #[test]
    fn test_unknown_level_is_rejected() {
        let _guard = TEST_MUTEX.lock().expect("Mutex poisoned");
        let config = LoggingConfig {
            level: "loud".to_string(),
            modules: BTreeMap::new(),
        };
        assert!(matches!(
            configure_logging(&config),
            Err(RabiesError::ConfigError(_))
        ));
        assert_eq!(get_log_configuration().global_log_level, LevelFilter::Off);
    }
}

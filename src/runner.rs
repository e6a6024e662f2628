use log::info;

use crate::config::SimulationConfig;
use crate::context::Context;
use crate::error::RabiesError;
use crate::landscape::Landscape;
use crate::log::configure_logging;
use crate::population::ContextPopulationExt;
use crate::random::ContextRandomExt;
use crate::report::{ContextReportExt, LifecycleReportItem};
use crate::species::SpeciesParameters;

/// Builds a `Context` ready to run: logging configured if requested, random
/// streams seeded, the population seeded, and the lifecycle report opened.
///
/// # Errors
///
/// Returns configuration errors from validating `config`, and errors from
/// opening the report or seeding the population.
pub fn build_context(
    config: &SimulationConfig,
    params: SpeciesParameters,
    landscape: Landscape,
) -> Result<Context, RabiesError> {
    config.validate()?;
    if let Some(logging) = &config.logging {
        configure_logging(logging)?;
    }
    let mut context = Context::new();
    context.init_random(config.seed);
    context.set_prune_dead(config.prune_dead);
    context.init_population(params, config.species, landscape, config.start_time());
    if let Some(path) = &config.report_file {
        context.add_report::<LifecycleReportItem>(path)?;
    }
    context.seed_population(config.initial_density)?;
    Ok(context)
}

/// Runs a full simulation
///
/// # Parameters
/// - `setup_fn`: called with the built context before the first week, e.g.
///   to add animals or record infections
///
/// # Errors
/// Returns an error if building the context, the setup function or any
/// simulated week fails
pub fn run_simulation<F>(
    config: &SimulationConfig,
    params: SpeciesParameters,
    landscape: Landscape,
    setup_fn: F,
) -> Result<Context, RabiesError>
where
    F: FnOnce(&mut Context) -> Result<(), RabiesError>,
{
    let mut context = build_context(config, params, landscape)?;
    setup_fn(&mut context)?;
    info!(
        "running {} weeks from {}",
        config.weeks_to_run,
        config.start_time()
    );
    context.run_weeks(config.weeks_to_run)?;
    info!(
        "finished at {} with {} living animals",
        context.current_time(),
        context.population_size()
    );
    Ok(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landscape::CellId;
    use crate::species::test_support::fox_parameters;
    use crate::species::{Sex, SpeciesBehavior};
    use crate::time::SimTime;
    use tempfile::tempdir;

    fn config() -> SimulationConfig {
        SimulationConfig {
            seed: 11,
            start_year: 1,
            start_week: 20,
            weeks_to_run: 12,
            species: SpeciesBehavior::Fox,
            prune_dead: false,
            initial_density: 1.0,
            report_file: None,
            logging: None,
        }
    }

    #[test]
    fn build_seeds_population() {
        let landscape = Landscape::hex_grid(4, 4, 2.0).unwrap();
        let context = build_context(&config(), fox_parameters(), landscape).unwrap();
        assert_eq!(context.population_size(), 32);
        assert_eq!(context.current_time(), SimTime::new(1, 20).unwrap());
        assert_eq!(context.get_base_seed(), 11);
    }

    #[test]
    fn run_applies_setup_then_weeks() {
        let context = run_simulation(
            &config(),
            fox_parameters(),
            Landscape::hex_grid(4, 4, 2.0).unwrap(),
            |context| {
                context.add_animal(Sex::Female, 80, CellId(0))?;
                Ok(())
            },
        )
        .unwrap();
        assert_eq!(context.week_summaries().len(), 12);
        assert_eq!(context.current_time(), SimTime::new(1, 32).unwrap());
    }

    #[test]
    fn bad_log_level_is_config_error() {
        let mut config = config();
        config.logging = Some(crate::log::LoggingConfig {
            level: "verbose".to_string(),
            modules: std::collections::BTreeMap::new(),
        });
        let result = build_context(&config, fox_parameters(), Landscape::hex_grid(2, 2, 1.0).unwrap());
        assert!(matches!(result, Err(RabiesError::ConfigError(_))));
    }

    #[test]
    fn setup_error_stops_the_run() {
        let result = run_simulation(
            &config(),
            fox_parameters(),
            Landscape::hex_grid(2, 2, 1.0).unwrap(),
            |context| {
                context.add_animal(Sex::Female, 80, CellId(99))?;
                Ok(())
            },
        );
        assert!(matches!(result, Err(RabiesError::MissingReference(_))));
    }

    #[test]
    fn report_file_is_written() {
        let dir = tempdir().unwrap();
        let mut config = config();
        config.report_file = Some(dir.path().join("out").join("lifecycle.csv"));
        run_simulation(
            &config,
            fox_parameters(),
            Landscape::hex_grid(4, 4, 2.0).unwrap(),
            |context| {
                // Dies of old age in the first week.
                let max_age = fox_parameters().max_age(Sex::Male);
                context.add_animal(Sex::Male, max_age - 1, CellId(3))?;
                Ok(())
            },
        )
        .unwrap();
        let mut reader =
            csv::Reader::from_path(dir.path().join("out").join("lifecycle.csv")).unwrap();
        let headers: Vec<String> = reader
            .headers()
            .unwrap()
            .iter()
            .map(str::to_string)
            .collect();
        assert_eq!(headers, ["year", "week", "animal_id", "event", "cell"]);
        assert!(reader.records().count() >= 1);
    }
}

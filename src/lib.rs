//! An individual-based simulator of wildlife populations for rabies models
//!
//! Each simulated fox or raccoon ages, disperses, mates, gives birth and
//! dies week by week on a landscape of hexagonal cells. The rules are
//! parameterized per species by tables indexed by week of year, age, sex
//! and dispersal distance, and every stochastic decision draws from a named,
//! seedable random stream so that runs can be replayed exactly.
//!
//! The central object of a simulation is the `Context`, which owns all of
//! its state and provides the core services the rest of the crate builds on:
//! * Maintaining a notion of time (one unit is one simulated week)
//! * Scheduling plans to run at some point in the future and executing them
//!   in order
//! * Holding module-specific data so that modules can share it
//! * Handing out reproducible random streams
//!
//! A run is usually assembled from:
//! * A species parameter set and a landscape, read through
//!   [`species::SpeciesParameterLoader`] and [`landscape::LandscapeLoader`].
//! * A population, seeded from the landscape's carrying capacities and
//!   stepped one week at a time by [`population::ContextPopulationExt`].
//! * An external transmission model, which reads contact inputs and records
//!   infections through [`disease::ContextDiseaseExt`].
//! * Optional outputs: the CSV lifecycle report and population snapshots.
pub mod animal;
pub mod config;
pub mod context;
pub mod data_plugin;
pub mod disease;
pub mod error;
pub mod hashing;
pub mod landscape;
pub mod lifecycle;
pub mod log;
pub mod persistence;
pub mod plan;
pub mod population;
pub mod prelude;
pub mod random;
pub mod report;
pub mod runner;
pub mod species;
pub mod time;

pub use animal::{Animal, AnimalId};
pub use config::{load_config_from_json, SimulationConfig};
pub use context::Context;
pub use error::RabiesError;
pub use landscape::{CellId, Direction, Landscape};
pub use plan::{ExecutionPhase, PlanId};
pub use population::{ContextPopulationExt, WeekSummary};
pub use random::{ContextRandomExt, RandomStream};
pub use runner::{build_context, run_simulation};
pub use species::{Sex, SpeciesBehavior, SpeciesParameters};
pub use time::SimTime;

// Re-exported for use in the `define_rng!` and `define_report!` macros.
pub use csv;
pub use paste;

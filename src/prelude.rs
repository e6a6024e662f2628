pub use crate::animal::{Animal, AnimalId};
pub use crate::context::Context;
pub use crate::disease::{ContextDiseaseExt, DiseaseModel, RecordBasedDisease};
pub use crate::error::RabiesError;
pub use crate::landscape::{CellId, Landscape};
pub use crate::log::{debug, error, info, trace, warn};
pub use crate::persistence::ContextPersistenceExt;
pub use crate::population::ContextPopulationExt;
pub use crate::random::ContextRandomExt;
pub use crate::report::ContextReportExt;
pub use crate::species::{Sex, SpeciesBehavior, SpeciesParameters};
pub use crate::time::SimTime;
pub use crate::{define_data_plugin, define_report, define_rng};

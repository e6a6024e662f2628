mod context_ext;
mod macros;
mod stream;

use std::any::TypeId;
use std::cell::RefCell;

pub use context_ext::ContextRandomExt;
pub use macros::define_rng;
pub use stream::{GaussianView, RandomStream, UniformView};

use crate::hashing::{HashMap, HashMapExt};
use crate::define_data_plugin;

pub trait RngId: Copy + Clone + 'static {
    fn get_name() -> &'static str;
}

struct RngData {
    base_seed: u64,
    streams: RefCell<HashMap<TypeId, RandomStream>>,
}

// Registers a data container which stores:
// * base_seed: A base seed for all streams
// * streams: A map of streams, keyed by their RngId. Note that this is
//   stored in a RefCell to allow for mutable borrow without requiring a
//   mutable borrow of the Context itself.
define_data_plugin!(
    RngPlugin,
    RngData,
    RngData {
        base_seed: 0,
        streams: RefCell::new(HashMap::new()),
    }
);

// The logical streams used by the simulator. Each stochastic concern draws
// from its own stream so that, for example, changing the movement tables
// does not perturb the mortality draws.
define_rng!(pub MovementRng);
define_rng!(pub DispersalPathRng);
define_rng!(pub ReproductionRng);
define_rng!(pub MortalityRng);
define_rng!(pub SeedingRng);

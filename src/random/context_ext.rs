use std::any::TypeId;
use std::cell::RefMut;

use log::trace;

use crate::context::Context;
use crate::error::RabiesError;
use crate::random::{RandomStream, RngData, RngId, RngPlugin};

/// Gets a mutable reference to the stream associated with the given
/// [`RngId`]. If the stream has not been used before, one will be created
/// from the base seed set with `init_random`.
///
/// # Panics
///
/// Panics if `init_random` was not called, or if the stream is already
/// borrowed.
fn get_stream<R: RngId>(context: &Context) -> RefMut<'_, RandomStream> {
    let data_container: &RngData = context
        .get_data_container(RngPlugin)
        .expect("You must initialize the random number generator with a base seed");

    let streams = data_container.streams.try_borrow_mut().unwrap();
    RefMut::map(streams, |streams| {
        streams.entry(TypeId::of::<R>()).or_insert_with(|| {
            trace!(
                "creating new stream {} (base seed={})",
                R::get_name(),
                data_container.base_seed
            );
            RandomStream::from_master_seed(data_container.base_seed, R::get_name())
        })
    })
}

// This is a trait extension on Context for
// random number generation functionality.
pub trait ContextRandomExt {
    /// Initializes the `RngPlugin` data container with a base seed. Streams
    /// are created lazily when first sampled, so any existing streams are
    /// dropped and will be re-seeded.
    fn init_random(&mut self, base_seed: u64);

    fn get_base_seed(&self) -> u64;

    /// Applies `sampler` to the stream associated with the given [`RngId`].
    fn sample<R: RngId, T>(&self, rng_id: R, sampler: impl FnOnce(&mut RandomStream) -> T) -> T;

    /// Replays the stream associated with `rng_id` from its start point.
    fn reset_stream<R: RngId>(&self, rng_id: R);

    fn sample_uniform01<R: RngId>(&self, rng_id: R) -> f64 {
        self.sample(rng_id, RandomStream::next_uniform01)
    }

    fn sample_uniform_real<R: RngId>(&self, rng_id: R, min: f64, max: f64) -> f64 {
        self.sample(rng_id, |stream| stream.uniform_real(min, max))
    }

    fn sample_uniform_int<R: RngId>(&self, rng_id: R, min: i64, max: i64) -> i64 {
        self.sample(rng_id, |stream| stream.uniform_int(min, max))
    }

    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `variance <= 0`.
    fn sample_gaussian<R: RngId>(
        &self,
        rng_id: R,
        mean: f64,
        variance: f64,
    ) -> Result<f64, RabiesError> {
        self.sample(rng_id, |stream| stream.gaussian(mean, variance))
    }

    /// True with probability `p`.
    fn sample_bool<R: RngId>(&self, rng_id: R, p: f64) -> bool {
        self.sample_uniform01(rng_id) < p
    }
}

impl ContextRandomExt for Context {
    fn init_random(&mut self, base_seed: u64) {
        trace!("initializing random module");
        let data_container = self.get_data_mut(RngPlugin);
        data_container.base_seed = base_seed;

        // Clear any existing streams so they get re-seeded
        data_container.streams.get_mut().clear();
    }

    fn get_base_seed(&self) -> u64 {
        self.get_data_container(RngPlugin)
            .expect("You must initialize the random number generator with a base seed")
            .base_seed
    }

    fn sample<R: RngId, T>(&self, _rng_id: R, sampler: impl FnOnce(&mut RandomStream) -> T) -> T {
        let mut stream = get_stream::<R>(self);
        sampler(&mut stream)
    }

    fn reset_stream<R: RngId>(&self, _rng_id: R) {
        get_stream::<R>(self).reset();
    }
}

#[cfg(test)]
mod test {
    use crate::context::Context;
    use crate::define_rng;
    use crate::random::{ContextRandomExt, RandomStream};

    define_rng!(FooRng);
    define_rng!(BarRng);

    #[test]
    fn get_rng_basic() {
        let mut context = Context::new();
        context.init_random(42);

        assert_ne!(
            context.sample_uniform01(FooRng),
            context.sample_uniform01(FooRng)
        );
    }

    #[test]
    #[should_panic(expected = "You must initialize the random number generator with a base seed")]
    fn panic_if_not_initialized() {
        let context = Context::new();
        context.sample_uniform01(FooRng);
    }

    #[test]
    fn multiple_rng_types() {
        let mut context = Context::new();
        context.init_random(42);

        assert_ne!(
            context.sample_uniform01(FooRng),
            context.sample_uniform01(BarRng)
        );
    }

    #[test]
    fn streams_are_independent() {
        // Interleaving draws from another stream does not change a stream's sequence.
        let mut context = Context::new();
        context.init_random(42);
        let plain: Vec<f64> = (0..5).map(|_| context.sample_uniform01(FooRng)).collect();

        context.init_random(42);
        let interleaved: Vec<f64> = (0..5)
            .map(|_| {
                context.sample_uniform01(BarRng);
                context.sample_uniform01(FooRng)
            })
            .collect();
        assert_eq!(plain, interleaved);
    }

    #[test]
    fn reset_seed() {
        let mut context = Context::new();
        context.init_random(42);

        let run_0 = context.sample_uniform01(FooRng);
        let run_1 = context.sample_uniform01(FooRng);

        // Reset with same seed, ensure we get the same values
        context.init_random(42);
        assert_eq!(run_0, context.sample_uniform01(FooRng));
        assert_eq!(run_1, context.sample_uniform01(FooRng));

        // Reset with different seed, ensure we get different values
        context.init_random(88);
        assert_ne!(run_0, context.sample_uniform01(FooRng));
        assert_ne!(run_1, context.sample_uniform01(FooRng));
    }

    #[test]
    fn reset_single_stream() {
        let mut context = Context::new();
        context.init_random(7);
        let first = context.sample_uniform01(FooRng);
        let bar = context.sample_uniform01(BarRng);
        context.reset_stream(FooRng);
        assert_eq!(first, context.sample_uniform01(FooRng));
        assert_ne!(bar, context.sample_uniform01(BarRng));
    }

    #[test]
    fn matches_free_standing_stream() {
        let mut context = Context::new();
        context.init_random(1);
        let mut stream = RandomStream::from_master_seed(1, "FooRng");
        for _ in 0..100 {
            assert_eq!(context.sample_uniform01(FooRng), stream.next_uniform01());
        }
    }

    #[test]
    fn sample_helpers() {
        let mut context = Context::new();
        context.init_random(42);
        let i = context.sample_uniform_int(FooRng, 0, 9);
        assert!((0..=9).contains(&i));
        let r = context.sample_uniform_real(FooRng, 5.0, 6.0);
        assert!((5.0..6.0).contains(&r));
        assert!(context.sample_gaussian(FooRng, 0.0, 1.0).is_ok());
        assert!(!context.sample_bool(FooRng, 0.0));
        assert!(context.sample_bool(FooRng, 1.0));
    }
}

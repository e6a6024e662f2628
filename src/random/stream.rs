//! Seedable, replayable random streams and the uniform and Gaussian views
//! that every stochastic decision in the simulator draws through.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::RabiesError;
use crate::hashing::hash_str;

/// An independent pseudo-random sequence.
///
/// Two streams built from the same seed produce identical sequences for the
/// same sequence of calls. The generator is `StdRng`, whose output for a
/// given seed is fixed for a given `rand` release on every platform.
#[derive(Clone, Debug)]
pub struct RandomStream {
    seed: u64,
    rng: StdRng,
    // Second deviate of the last polar transform, handed out on the next draw.
    spare_gaussian: Option<f64>,
}

impl RandomStream {
    #[must_use]
    pub fn new(seed: u64) -> RandomStream {
        RandomStream {
            seed,
            rng: StdRng::seed_from_u64(seed),
            spare_gaussian: None,
        }
    }

    /// Creates the stream for the logical purpose `name` under a master
    /// seed. Different names give uncorrelated streams.
    #[must_use]
    pub fn from_master_seed(master_seed: u64, name: &str) -> RandomStream {
        RandomStream::new(master_seed.wrapping_add(hash_str(name)))
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Replays this stream from its own start point. Other streams are not
    /// affected.
    pub fn reset(&mut self) {
        self.rng = StdRng::seed_from_u64(self.seed);
        self.spare_gaussian = None;
    }

    /// A uniform real in `[0, 1)`.
    pub fn next_uniform01(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    pub fn uniform(&mut self) -> UniformView<'_> {
        UniformView { stream: self }
    }

    pub fn gaussian_view(&mut self) -> GaussianView<'_> {
        GaussianView { stream: self }
    }

    /// Shorthand for `self.uniform().real(min, max)`.
    pub fn uniform_real(&mut self, min: f64, max: f64) -> f64 {
        self.uniform().real(min, max)
    }

    /// Shorthand for `self.uniform().int(min, max)`.
    pub fn uniform_int(&mut self, min: i64, max: i64) -> i64 {
        self.uniform().int(min, max)
    }

    /// Shorthand for `self.gaussian_view().sample(mean, variance)`.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `variance <= 0`.
    pub fn gaussian(&mut self, mean: f64, variance: f64) -> Result<f64, RabiesError> {
        self.gaussian_view().sample(mean, variance)
    }
}

/// Uniform reals and integers over a stream.
pub struct UniformView<'a> {
    stream: &'a mut RandomStream,
}

impl UniformView<'_> {
    /// A uniform real in `[min, max)`; `min` when `max <= min`.
    pub fn real(&mut self, min: f64, max: f64) -> f64 {
        if max <= min {
            return min;
        }
        min + (max - min) * self.stream.next_uniform01()
    }

    /// A uniform integer in `[min, max]`; `min` when `max <= min`.
    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    pub fn int(&mut self, min: i64, max: i64) -> i64 {
        if max <= min {
            return min;
        }
        let span = (max - min + 1) as f64;
        let offset = (self.stream.next_uniform01() * span).floor() as i64;
        (min + offset).min(max)
    }
}

/// Normal deviates over a stream.
///
/// Uses the polar form of the Box-Muller transform: pairs of uniforms are
/// rejected until they fall inside the unit circle, and each accepted pair
/// yields two deviates. The second one is cached on the stream and returned
/// by the following call.
pub struct GaussianView<'a> {
    stream: &'a mut RandomStream,
}

impl GaussianView<'_> {
    /// A standard normal deviate.
    pub fn standard(&mut self) -> f64 {
        if let Some(spare) = self.stream.spare_gaussian.take() {
            return spare;
        }
        loop {
            let v1 = 2.0 * self.stream.next_uniform01() - 1.0;
            let v2 = 2.0 * self.stream.next_uniform01() - 1.0;
            let s = v1 * v1 + v2 * v2;
            if s > 0.0 && s < 1.0 {
                let factor = (-2.0 * s.ln() / s).sqrt();
                self.stream.spare_gaussian = Some(v1 * factor);
                return v2 * factor;
            }
        }
    }

    /// A normal deviate with the given mean and variance.
    ///
    /// # Errors
    ///
    /// Returns `RabiesError::RangeError` if `variance <= 0`.
    pub fn sample(&mut self, mean: f64, variance: f64) -> Result<f64, RabiesError> {
        if variance.is_nan() || variance <= 0.0 {
            return Err(RabiesError::RangeError(format!(
                "gaussian variance must be positive, got {variance}"
            )));
        }
        Ok(mean + variance.sqrt() * self.standard())
    }
}

use crate::error::{ConfigError, Error, Result};
use crate::Time;

use rand::SeedableRng;
use rand_distr::{Distribution, Exp};
use rand_pcg::Pcg64;

/// Source of the delays the engine schedules events with.
///
/// The engine samples inter-arrival times and service durations through this trait, one boxed implementor per
/// stream. [`RandomGenerator`] is the production implementor; tests may substitute a scripted one to drive the engine
/// through an exact sequence of timestamps.
pub trait DelaySampler: Send {
    /// Draw the next delay in simulation time units.
    ///
    /// # Errors
    ///
    /// Implementors should return [`Error::UnconfiguredGenerator`] when they cannot produce a value because they were
    /// never parameterized. The engine treats any error as fatal and aborts the run.
    fn sample(&mut self) -> Result<Time>;
}

/// Exponentially distributed delays with a configured mean, rounded to whole time units.
///
/// Every generator owns its own PCG stream, so the arrival and service processes of one simulation never share
/// random state.
#[derive(Debug, Clone)]
pub struct RandomGenerator {
    mean: Option<Time>,
    distribution: Option<Exp<f64>>,
    rng: Pcg64,
}

impl RandomGenerator {
    /// Create a generator with the given mean. A `None` seed draws one from the thread RNG.
    ///
    /// # Errors
    ///
    /// A zero mean is rejected with [`Error::InvalidConfig`].
    pub fn new(mean: Time, seed: Option<u64>) -> Result<Self> {
        let mut generator = Self::unconfigured(seed);
        generator.configure(mean)?;
        Ok(generator)
    }

    /// Create a generator that must be [`configure()`]d before it can be sampled.
    ///
    /// [`configure()`]: RandomGenerator::configure
    pub fn unconfigured(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => Pcg64::seed_from_u64(seed),
            None => Pcg64::from_rng(&mut rand::rng()),
        };
        Self {
            mean: None,
            distribution: None,
            rng,
        }
    }

    /// Set the mean of the distribution; the rate becomes `1 / mean`.
    ///
    /// # Errors
    ///
    /// A zero mean is rejected with [`Error::InvalidConfig`] and leaves the generator unchanged.
    pub fn configure(&mut self, mean: Time) -> Result {
        if mean == 0 {
            return Err(ConfigError::NonPositiveMean("generator mean").into());
        }
        let distribution =
            Exp::new(1.0 / mean as f64).map_err(|_| Error::from(ConfigError::NonPositiveMean("generator mean")))?;
        self.mean = Some(mean);
        self.distribution = Some(distribution);
        Ok(())
    }

    /// The configured mean, if any.
    pub fn mean(&self) -> Option<Time> {
        self.mean
    }
}

impl DelaySampler for RandomGenerator {
    fn sample(&mut self) -> Result<Time> {
        let distribution = self.distribution.as_ref().ok_or(Error::UnconfiguredGenerator)?;
        // f64 -> u64 casts saturate, so a pathological draw cannot wrap
        Ok(distribution.sample(&mut self.rng).round() as Time)
    }
}

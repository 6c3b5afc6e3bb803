use crate::error::{ConfigError, Result};
use crate::Time;

use serde::{Deserialize, Serialize};

/// Convergence precision used when none is given.
pub const DEFAULT_PRECISION: f64 = 1e-3;

/// Measurement interval used by [`SimulationConfigBuilder::measurement_enabled()`].
pub const DEFAULT_MEASUREMENT_INTERVAL: Time = 100;

/// Number of processed timestamps between two snapshot publications.
pub const DEFAULT_PUBLISH_EVERY: u64 = 1024;

/// Convert a number of decimal places into a precision, i.e. `10^-places`.
///
/// Operators usually think of the stopping rule as "agree to three decimals" rather than as `0.001`.
pub fn precision_from_exponent(places: u32) -> f64 {
    10f64.powi(-(places as i32))
}

/// Immutable parameters of one simulation run.
///
/// Build one through [`SimulationConfig::builder()`] or deserialize it; either way call [`validate()`] (the builder
/// and [`SimulationSession::new()`] do so) before handing it to an engine.
///
/// [`validate()`]: SimulationConfig::validate
/// [`SimulationSession::new()`]: crate::SimulationSession::new
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Mean time between two arrivals.
    pub arrival_mean: Time,
    /// Mean service duration.
    pub service_mean: Time,
    /// Number of service units. Zero means unbounded.
    #[serde(default)]
    pub servers: u32,
    /// Largest normalized standard deviation that still counts as converged.
    #[serde(default = "default_precision")]
    pub precision: f64,
    /// Interval between measurement events, `None` when periodic measurement is disabled.
    #[serde(default)]
    pub measurement: Option<Time>,
    /// Seed for the arrival and service streams. Seeded from the thread RNG when absent.
    #[serde(default)]
    pub seed: Option<u64>,
    /// Samples every checked metric must hold before the run may stop.
    #[serde(default)]
    pub min_samples: u64,
    /// Simulation time after which the run is cancelled.
    #[serde(default)]
    pub max_time: Option<Time>,
    /// Processed timestamps between snapshot publications.
    #[serde(default = "default_publish_every")]
    pub publish_every: u64,
}

fn default_precision() -> f64 {
    DEFAULT_PRECISION
}

fn default_publish_every() -> u64 {
    DEFAULT_PUBLISH_EVERY
}

impl SimulationConfig {
    /// Start building a configuration with the two mandatory rate parameters.
    pub fn builder(arrival_mean: Time, service_mean: Time) -> SimulationConfigBuilder {
        SimulationConfigBuilder {
            config: SimulationConfig {
                arrival_mean,
                service_mean,
                servers: 0,
                precision: DEFAULT_PRECISION,
                measurement: None,
                seed: None,
                min_samples: 0,
                max_time: None,
                publish_every: DEFAULT_PUBLISH_EVERY,
            },
        }
    }

    /// Check every parameter.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] describing the first parameter found to be out of range.
    ///
    /// [`Error::InvalidConfig`]: crate::Error::InvalidConfig
    pub fn validate(&self) -> Result {
        if self.arrival_mean == 0 {
            return Err(ConfigError::NonPositiveMean("arrival mean").into());
        }
        if self.service_mean == 0 {
            return Err(ConfigError::NonPositiveMean("service mean").into());
        }
        if !self.precision.is_finite() || self.precision <= 0.0 {
            return Err(ConfigError::InvalidPrecision(self.precision).into());
        }
        if self.measurement == Some(0) {
            return Err(ConfigError::ZeroMeasurementInterval.into());
        }
        if self.publish_every == 0 {
            return Err(ConfigError::ZeroPublishPeriod.into());
        }
        Ok(())
    }

    /// Offered load per server, `service_mean / (arrival_mean * c)`. Unbounded servers count as one, which gives
    /// the mean number of busy servers instead.
    pub fn utilization(&self) -> f64 {
        let servers = self.servers.max(1) as f64;
        self.service_mean as f64 / (self.arrival_mean as f64 * servers)
    }

    /// Whether the queue is stable. Unbounded servers are always stable.
    pub fn is_stable(&self) -> bool {
        self.servers == 0 || self.utilization() < 1.0
    }
}

/// Chained construction of a [`SimulationConfig`].
#[derive(Debug, Clone)]
pub struct SimulationConfigBuilder {
    config: SimulationConfig,
}

impl SimulationConfigBuilder {
    pub fn servers(mut self, servers: u32) -> Self {
        self.config.servers = servers;
        self
    }

    pub fn precision(mut self, precision: f64) -> Self {
        self.config.precision = precision;
        self
    }

    /// Enable periodic measurement events every `interval` time units.
    pub fn measurement_interval(mut self, interval: Time) -> Self {
        self.config.measurement = Some(interval);
        self
    }

    /// Enable or disable periodic measurement, keeping the default interval.
    pub fn measurement_enabled(mut self, enabled: bool) -> Self {
        self.config.measurement = enabled.then_some(DEFAULT_MEASUREMENT_INTERVAL);
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.config.seed = Some(seed);
        self
    }

    pub fn min_samples(mut self, min_samples: u64) -> Self {
        self.config.min_samples = min_samples;
        self
    }

    pub fn max_time(mut self, max_time: Time) -> Self {
        self.config.max_time = Some(max_time);
        self
    }

    pub fn publish_every(mut self, steps: u64) -> Self {
        self.config.publish_every = steps;
        self
    }

    /// Validate and return the configuration.
    ///
    /// # Errors
    ///
    /// See [`SimulationConfig::validate()`].
    pub fn build(self) -> Result<SimulationConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}

use thiserror::Error;

/// Errors that may be encountered while configuring or executing a simulation.
///
/// The [`InvalidConfig`] variant is returned before an engine is ever built, so a rejected configuration never
/// starts a run. [`BackInTime`], [`UnconfiguredGenerator`] and [`EmptyEventQueue`] all indicate a broken invariant
/// inside the engine rather than a recoverable condition, and [`TimeOverflow`] means a drawn delay ran past the end
/// of the clock. The run that hits any of them is aborted and the error is handed back to the caller of
/// [`SimulationEngine::run()`] or [`SimulationSession::wait()`].
///
/// Failing to converge is not an error. A run that never satisfies the stopping rule keeps going until it is
/// cancelled.
///
/// [`InvalidConfig`]: Error::InvalidConfig
/// [`BackInTime`]: Error::BackInTime
/// [`UnconfiguredGenerator`]: Error::UnconfiguredGenerator
/// [`EmptyEventQueue`]: Error::EmptyEventQueue
/// [`TimeOverflow`]: Error::TimeOverflow
/// [`SimulationEngine::run()`]: crate::SimulationEngine::run
/// [`SimulationSession::wait()`]: crate::SimulationSession::wait
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// The configuration was rejected during validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] ConfigError),
    /// The event queue rejected an event that would have been scheduled for a time that has already passed.
    #[error("event execution time {scheduled} is less than current simulation time {now}")]
    BackInTime { scheduled: u64, now: u64 },
    /// A random generator was sampled before a mean was configured.
    #[error("random generator sampled before a mean was configured")]
    UnconfiguredGenerator,
    /// A delay drawn at `now` would push an event past the largest representable time.
    #[error("delay {delay} drawn at simulation time {now} overflows the clock")]
    TimeOverflow { now: u64, delay: u64 },
    /// The engine asked for the next timestamp but nothing was scheduled.
    #[error("event queue is empty at simulation time {0}")]
    EmptyEventQueue(u64),
    /// [`SimulationSession::start()`] was called on a session that already started.
    ///
    /// [`SimulationSession::start()`]: crate::SimulationSession::start
    #[error("simulation session has already been started")]
    AlreadyStarted,
    /// [`SimulationSession::wait()`] was called on a session that was never started.
    ///
    /// [`SimulationSession::wait()`]: crate::SimulationSession::wait
    #[error("simulation session was never started")]
    NotStarted,
    /// The engine thread could not be spawned or panicked while running.
    #[error("engine thread failed: {0}")]
    EngineThread(String),
}

/// Reasons a [`SimulationConfig`] can fail validation.
///
/// [`SimulationConfig`]: crate::SimulationConfig
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("{0} must be a positive number of time units")]
    NonPositiveMean(&'static str),
    #[error("precision must be a positive, finite number, got {0}")]
    InvalidPrecision(f64),
    #[error("measurement interval must be positive")]
    ZeroMeasurementInterval,
    #[error("snapshot publication period must be at least one step")]
    ZeroPublishPeriod,
}

/// [`std::result::Result`]`<T, `[`mmc_sim::Error`]`>`
///
/// A type alias that simplifies the signatures of various functions in this crate. The success type defaults to
/// `()` for operations that only report failure.
///
/// [`mmc_sim::Error`]: Error
pub type Result<T = ()> = std::result::Result<T, Error>;

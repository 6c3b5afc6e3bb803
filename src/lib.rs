//! # Overview
//!
//! mmc-sim estimates the steady-state behavior of an M/M/c queue (Poisson arrivals, exponential service times, `c`
//! identical servers, `c = 0` meaning unbounded) by discrete-event simulation. It tracks four metrics:
//!
//! * **N**, the number of requests in the system,
//! * **T**, the sojourn time of a request,
//! * **NQ**, the number of requests waiting for a server,
//! * **TQ**, the waiting time of a request,
//!
//! and stops on its own once their running estimates have settled below a configured precision.
//!
//! The crate is organized around a few small pieces:
//!
//! * A [`SimulationConfig`] holds the validated, immutable parameters of a run.
//! * An [`EventQueue`] keeps the scheduled [`Event`]s in time order, several per timestamp if need be.
//! * A [`Var`] accumulates the running statistics of one metric and decides whether it has converged.
//! * A [`SimulationEngine`] owns the queue, the state and two [`DelaySampler`]s, and processes one timestamp per
//!   [`step()`] until the stopping rule holds.
//! * A [`SimulationSession`] runs an engine on a background thread, publishes [`Snapshot`]s for observers and handles
//!   cancellation.
//!
//! # Stopping rule
//!
//! A run has converged once the mean of N is positive and the normalized standard deviation of N and T (and of NQ and
//! TQ when the number of servers is bounded) is at most the configured precision. The statistic is the standard
//! deviation divided by the sample count, a heuristic that keeps shrinking as samples accumulate. It gives no formal
//! guarantee; an overloaded queue may run until it is cancelled.
//!
//! # Logging
//!
//! The crate reports through [`tracing`] and never installs a subscriber itself. Run starts and ends are logged at
//! `INFO`, session lifecycle at `DEBUG`, and every processed timestamp at `TRACE`.
//!
//! [`step()`]: SimulationEngine::step
//! [`tracing`]: https://docs.rs/tracing

mod config;
mod engine;
mod error;
mod events;
mod generator;
mod session;
mod snapshot;
mod statistics;

pub use config::{
    precision_from_exponent, SimulationConfig, SimulationConfigBuilder, DEFAULT_MEASUREMENT_INTERVAL,
    DEFAULT_PRECISION, DEFAULT_PUBLISH_EVERY,
};
pub use engine::{CancelHandle, SimulationEngine};
pub use error::{ConfigError, Error, Result};
pub use events::{Event, EventKind, EventQueue};
pub use generator::{DelaySampler, RandomGenerator};
pub use session::SimulationSession;
pub use snapshot::{Metric, MetricSnapshot, RunPhase, Snapshot};
pub use statistics::Var;

/// Simulation clock, in abstract time units.
pub type Time = u64;

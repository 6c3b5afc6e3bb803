use crate::events::{Event, EventKind, EventQueue};
use crate::generator::{DelaySampler, RandomGenerator};
use crate::snapshot::{MetricSnapshot, RunPhase, Snapshot};
use crate::statistics::Var;
use crate::{Error, SimulationConfig, Time};

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

/// Offset between the arrival and service stream seeds derived from one configured seed.
const SERVICE_STREAM_SEED_OFFSET: u64 = 0x9E37_79B9_7F4A_7C15;

/// Cloneable, thread-safe request to stop an engine.
///
/// The engine polls the flag before processing each timestamp, so a cancellation takes effect at the next timestamp
/// boundary and never in the middle of one.
#[derive(Debug, Clone, Default)]
pub struct CancelHandle {
    flag: Arc<AtomicBool>,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Acquire)
    }
}

/// Mutable state of one run. Owned by the engine; observers only ever see [`Snapshot`]s of it.
#[derive(Debug, Default)]
struct SimulationState {
    simulation_time: Time,
    /// Requests in the system, waiting or in service.
    in_system: u64,
    queue_length: u64,
    /// Creation times of requests waiting for a server, oldest first.
    pending: VecDeque<Time>,
    n: Var,
    t: Var,
    nq: Var,
    tq: Var,
}

impl SimulationState {
    fn busy_servers(&self) -> u64 {
        self.in_system - self.queue_length
    }
}

/// Discrete-event simulation of an M/M/c queue.
///
/// The expected workflow for an engine is:
///
/// 1. Build a validated [`SimulationConfig`].
/// 2. Pass it to [`new()`], or to [`with_samplers()`] to control the delays it draws.
/// 3. Call [`run()`], or [`step()`] repeatedly. Handle any error either returns.
/// 4. Read the results through [`snapshot()`].
///
/// Construction schedules the first arrival (and the first measurement, when enabled), so the engine is ready to run
/// as soon as it exists.
///
/// [`new()`]: SimulationEngine::new
/// [`with_samplers()`]: SimulationEngine::with_samplers
/// [`run()`]: SimulationEngine::run
/// [`step()`]: SimulationEngine::step
/// [`snapshot()`]: SimulationEngine::snapshot
pub struct SimulationEngine {
    config: SimulationConfig,
    arrivals: Box<dyn DelaySampler>,
    services: Box<dyn DelaySampler>,
    event_queue: EventQueue,
    state: SimulationState,
    phase: RunPhase,
    cancel: CancelHandle,
    steps: u64,
}

impl SimulationEngine {
    /// Build an engine with exponential arrival and service generators.
    ///
    /// When the configuration carries a seed, the two streams are seeded from it deterministically, and two engines
    /// built from the same configuration produce the same run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails validation.
    pub fn new(config: SimulationConfig) -> crate::Result<Self> {
        config.validate()?;
        let service_seed = config.seed.map(|seed| seed.wrapping_add(SERVICE_STREAM_SEED_OFFSET));
        let arrivals = RandomGenerator::new(config.arrival_mean, config.seed)?;
        let services = RandomGenerator::new(config.service_mean, service_seed)?;
        Self::with_samplers(config, Box::new(arrivals), Box::new(services))
    }

    /// Build an engine that draws its delays from the given samplers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails validation, or whatever error the arrival sampler
    /// reports for the first draw.
    pub fn with_samplers(
        config: SimulationConfig,
        arrivals: Box<dyn DelaySampler>,
        services: Box<dyn DelaySampler>,
    ) -> crate::Result<Self> {
        config.validate()?;
        let mut engine = Self {
            config,
            arrivals,
            services,
            event_queue: EventQueue::new(0),
            state: SimulationState::default(),
            phase: RunPhase::Initializing,
            cancel: CancelHandle::new(),
            steps: 0,
        };

        let first_arrival = engine.arrivals.sample()?;
        engine.event_queue.schedule(Event::new(EventKind::Arrival, first_arrival, 0))?;
        if let Some(interval) = engine.config.measurement {
            engine.event_queue.schedule(Event::new(EventKind::Measure, interval, 0))?;
        }
        Ok(engine)
    }

    /// A handle that stops this engine's [`run()`] from any thread.
    ///
    /// [`run()`]: SimulationEngine::run
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    pub fn simulation_time(&self) -> Time {
        self.state.simulation_time
    }

    /// Shared access to the scheduled events.
    pub fn event_queue(&self) -> &EventQueue {
        &self.event_queue
    }

    /// Number of requests waiting for a server.
    pub fn queue_length(&self) -> u64 {
        self.state.queue_length
    }

    /// Number of requests in the system.
    pub fn in_system(&self) -> u64 {
        self.state.in_system
    }

    /// Copy the current metrics.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            simulation_time: self.state.simulation_time,
            phase: self.phase,
            precision: self.config.precision,
            n: MetricSnapshot::from(&self.state.n),
            t: MetricSnapshot::from(&self.state.t),
            nq: MetricSnapshot::from(&self.state.nq),
            tq: MetricSnapshot::from(&self.state.tq),
        }
    }

    /// Execute timestamps until the run converges, is cancelled, or fails.
    ///
    /// Follows this loop:
    ///
    /// 1. Has cancellation been requested, or has the clock passed `max_time`? If so, finish as `Cancelled`.
    /// 2. Process every event at the earliest scheduled timestamp through [`step()`].
    /// 3. Every `publish_every` steps, hand the observer a fresh snapshot.
    /// 4. If the stopping rule holds, finish as `Converged`. Otherwise go back to step 1.
    ///
    /// The observer receives one last snapshot, carrying the terminal phase, before this method returns.
    ///
    /// # Errors
    ///
    /// An invariant violation inside [`step()`] aborts the run: the phase becomes `Aborted`, the observer still gets
    /// the final snapshot, and the error is returned unchanged.
    ///
    /// [`step()`]: SimulationEngine::step
    pub fn run<Observer>(&mut self, mut observer: Observer) -> crate::Result<Snapshot>
    where
        Observer: FnMut(&Snapshot),
    {
        if self.phase.is_terminal() {
            return Ok(self.snapshot());
        }
        self.phase = RunPhase::Running;
        info!(
            arrival_mean = self.config.arrival_mean,
            service_mean = self.config.service_mean,
            servers = self.config.servers,
            precision = self.config.precision,
            measurement = ?self.config.measurement,
            utilization = self.config.utilization(),
            "starting simulation"
        );
        if !self.config.is_stable() {
            warn!(
                utilization = self.config.utilization(),
                "offered load saturates the servers; the run may never converge"
            );
        }
        observer(&self.snapshot());

        while self.phase == RunPhase::Running {
            if self.cancel.is_cancelled() || self.past_time_limit() {
                self.phase = RunPhase::Cancelled;
                break;
            }

            if let Err(err) = self.step() {
                self.phase = RunPhase::Aborted;
                error!(time = self.state.simulation_time, %err, "simulation aborted");
                observer(&self.snapshot());
                return Err(err);
            }

            if self.steps % self.config.publish_every == 0 {
                observer(&self.snapshot());
            }
        }

        let snapshot = self.snapshot();
        info!(
            phase = %snapshot.phase,
            time = snapshot.simulation_time,
            n = snapshot.n.mean,
            t = snapshot.t.mean,
            nq = snapshot.nq.mean,
            tq = snapshot.tq.mean,
            "simulation finished"
        );
        observer(&snapshot);
        Ok(snapshot)
    }

    /// Process every event scheduled at the earliest timestamp, then evaluate the stopping rule.
    ///
    /// Events that the processed ones schedule for the same timestamp (zero-length delays) are left for the next
    /// call, which handles them before the clock advances. Calling this on an engine in a terminal phase does nothing.
    ///
    /// # Errors
    ///
    /// * [`Error::EmptyEventQueue`] if nothing is scheduled. A running engine always has a pending arrival, so this
    ///   indicates a broken invariant.
    /// * Any error from the delay samplers or the event queue.
    pub fn step(&mut self) -> crate::Result<RunPhase> {
        if self.phase.is_terminal() {
            return Ok(self.phase);
        }
        self.phase = RunPhase::Running;

        let (now, bucket) = self
            .event_queue
            .pop_next()
            .ok_or(Error::EmptyEventQueue(self.state.simulation_time))?;
        self.state.simulation_time = now;
        self.steps += 1;
        trace!(time = now, events = bucket.len(), "processing timestamp");

        for event in bucket {
            trace!(%event, "executing");
            match event.kind() {
                EventKind::Arrival => self.on_arrival(now)?,
                EventKind::ServiceFinished => self.on_service_finished(now, &event)?,
                EventKind::Measure => self.on_measure(now)?,
            }
        }

        if self.has_converged() {
            self.phase = RunPhase::Converged;
            debug!(time = now, steps = self.steps, "stopping rule satisfied");
        }
        Ok(self.phase)
    }

    fn on_arrival(&mut self, now: Time) -> crate::Result {
        let next_arrival = later(now, self.arrivals.sample()?)?;
        self.event_queue.schedule(Event::new(EventKind::Arrival, next_arrival, now))?;

        let servers = u64::from(self.config.servers);
        let all_busy = servers > 0 && self.state.busy_servers() >= servers;

        self.state.in_system += 1;
        self.state.n.record(self.state.in_system);
        self.state.t.set_current(0);
        self.state.tq.set_current(0);

        if all_busy {
            self.state.queue_length += 1;
            self.state.nq.record(self.state.queue_length);
            self.state.pending.push_back(now);
        } else {
            self.start_service(now, now)?;
        }
        Ok(())
    }

    fn on_service_finished(&mut self, now: Time, event: &Event) -> crate::Result {
        self.state.in_system -= 1;
        self.state.t.record(event.elapsed());

        if let Some(created) = self.state.pending.pop_front() {
            self.state.queue_length -= 1;
            self.state.nq.record(self.state.queue_length);
            self.state.tq.record(now - created);
            self.start_service(now, created)?;
        }
        Ok(())
    }

    fn on_measure(&mut self, now: Time) -> crate::Result {
        for var in [&mut self.state.n, &mut self.state.t, &mut self.state.nq, &mut self.state.tq] {
            var.resample();
        }

        if let Some(interval) = self.config.measurement {
            self.event_queue.schedule(Event::new(EventKind::Measure, later(now, interval)?, now))?;
        }
        Ok(())
    }

    /// Schedule the end of service for a request that entered the system at `created`.
    fn start_service(&mut self, now: Time, created: Time) -> crate::Result {
        let finish = later(now, self.services.sample()?)?;
        self.event_queue.schedule(Event::new(EventKind::ServiceFinished, finish, created))
    }

    fn has_converged(&self) -> bool {
        let precision = self.config.precision;
        let min_samples = self.config.min_samples;
        let settled = |var: &Var| var.count() >= min_samples && var.has_converged(precision);

        let state = &self.state;
        state.n.mean() > 0.0
            && settled(&state.n)
            && settled(&state.t)
            && (self.config.servers == 0 || (settled(&state.nq) && settled(&state.tq)))
    }

    fn past_time_limit(&self) -> bool {
        self.config
            .max_time
            .is_some_and(|limit| self.state.simulation_time > limit)
    }
}

/// `now + delay`, failing instead of wrapping past the end of the clock.
fn later(now: Time, delay: Time) -> crate::Result<Time> {
    now.checked_add(delay).ok_or(Error::TimeOverflow { now, delay })
}

impl std::fmt::Debug for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("SimulationEngine")
            .field("config", &self.config)
            .field("phase", &self.phase)
            .field("event_queue", &self.event_queue)
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Display for SimulationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "Simulation at time {} ({})", self.state.simulation_time, self.phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_test::traced_test;

    /// Replays a fixed list of delays, then repeats the last one forever.
    struct Script {
        delays: VecDeque<Time>,
        last: Time,
    }

    impl Script {
        fn boxed(delays: &[Time]) -> Box<dyn DelaySampler> {
            Box::new(Self {
                delays: delays.iter().copied().collect(),
                last: *delays.last().unwrap(),
            })
        }
    }

    impl DelaySampler for Script {
        fn sample(&mut self) -> crate::Result<Time> {
            Ok(self.delays.pop_front().unwrap_or(self.last))
        }
    }

    struct Broken;

    impl DelaySampler for Broken {
        fn sample(&mut self) -> crate::Result<Time> {
            Err(Error::UnconfiguredGenerator)
        }
    }

    fn config(servers: u32) -> SimulationConfig {
        SimulationConfig::builder(10, 10)
            .servers(servers)
            .precision(1e-9)
            .build()
            .unwrap()
    }

    #[test]
    fn construction_schedules_first_arrival_and_measure() {
        let config = SimulationConfig::builder(10, 10).measurement_interval(25).build().unwrap();
        let engine = SimulationEngine::with_samplers(config, Script::boxed(&[7]), Script::boxed(&[3])).unwrap();

        assert_eq!(Some(7), engine.event_queue().next_time());
        assert_eq!(2, engine.event_queue().len());
        assert_eq!(EventKind::Measure, engine.event_queue().events_at(25).next().unwrap().kind());
        assert_eq!(RunPhase::Initializing, engine.phase());
    }

    #[test]
    fn arrival_with_free_server_starts_service() {
        let mut engine = SimulationEngine::with_samplers(config(1), Script::boxed(&[10, 100]), Script::boxed(&[4])).unwrap();

        engine.step().unwrap();
        assert_eq!(10, engine.simulation_time());
        assert_eq!(1, engine.in_system());
        assert_eq!(0, engine.queue_length());
        let finished: Vec<&Event> = engine.event_queue().events_at(14).collect();
        assert_eq!(1, finished.len());
        assert_eq!(10, finished[0].created());

        engine.step().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(14, snapshot.simulation_time);
        assert_eq!(4, snapshot.t.current);
        assert_eq!(0, engine.in_system());
        assert_eq!(0, snapshot.nq.samples);
    }

    #[test]
    fn waiting_request_gets_its_own_waiting_time() {
        // arrivals at 10 and 15, service takes 20
        let mut engine =
            SimulationEngine::with_samplers(config(1), Script::boxed(&[10, 5, 1000]), Script::boxed(&[20])).unwrap();

        engine.step().unwrap();
        engine.step().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(15, snapshot.simulation_time);
        assert_eq!(1, snapshot.nq.samples, "queued arrival should record NQ once");
        assert_eq!(1, snapshot.nq.current);
        assert_eq!(1, engine.queue_length());
        assert_eq!(2, engine.in_system());

        engine.step().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(30, snapshot.simulation_time);
        assert_eq!(1, snapshot.tq.samples);
        assert_eq!(30 - 15, snapshot.tq.current);
        assert_eq!(20, snapshot.t.current);
        assert_eq!(0, engine.queue_length());

        // the dequeued request's sojourn time includes its wait
        engine.step().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(50, snapshot.simulation_time);
        assert_eq!(50 - 15, snapshot.t.current);
        assert_eq!(0, engine.in_system());
    }

    #[test]
    fn pending_requests_are_served_first_in_first_out() {
        // arrivals at 10, 12, 13; service takes 20
        let mut engine =
            SimulationEngine::with_samplers(config(1), Script::boxed(&[10, 2, 1, 1000]), Script::boxed(&[20])).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
        }
        assert_eq!(2, engine.queue_length());
        assert_eq!(2, engine.snapshot().nq.current);

        engine.step().unwrap();
        assert_eq!(30, engine.simulation_time());
        assert_eq!(30 - 12, engine.snapshot().tq.current);

        engine.step().unwrap();
        assert_eq!(50, engine.simulation_time());
        assert_eq!(50 - 13, engine.snapshot().tq.current);
        assert_eq!(2, engine.snapshot().tq.samples);
        assert_eq!(0, engine.queue_length());
    }

    #[test]
    fn zero_delay_events_run_before_the_clock_advances() {
        let mut engine = SimulationEngine::with_samplers(config(0), Script::boxed(&[5, 100]), Script::boxed(&[0])).unwrap();

        engine.step().unwrap();
        assert_eq!(Some(5), engine.event_queue().next_time());
        engine.step().unwrap();
        assert_eq!(5, engine.simulation_time());
        assert_eq!(1, engine.snapshot().t.samples);
        assert_eq!(0, engine.snapshot().t.current);
        assert_eq!(Some(105), engine.event_queue().next_time());
    }

    #[test]
    fn measure_resamples_current_values() {
        let config = SimulationConfig::builder(10, 10)
            .servers(1)
            .measurement_interval(12)
            .precision(1e-9)
            .build()
            .unwrap();
        let mut engine =
            SimulationEngine::with_samplers(config, Script::boxed(&[10, 1000]), Script::boxed(&[50])).unwrap();

        engine.step().unwrap();
        engine.step().unwrap();
        let snapshot = engine.snapshot();
        assert_eq!(12, snapshot.simulation_time);
        assert_eq!(2, snapshot.n.samples);
        assert_eq!(1, snapshot.n.current);
        assert_eq!(1, snapshot.nq.samples);
        assert_eq!(0, snapshot.nq.current);
        assert_eq!(1, snapshot.t.samples);
        assert_eq!(1, snapshot.tq.samples);
        assert_eq!(Some(24), engine.event_queue().events_at(24).next().map(Event::scheduled));
    }

    #[test]
    fn measure_repeats_the_last_observed_population() {
        // one request from 10 to 15, measurement at 100 while the system is empty
        let config = SimulationConfig::builder(10, 10)
            .servers(1)
            .measurement_interval(100)
            .precision(1e-9)
            .build()
            .unwrap();
        let mut engine =
            SimulationEngine::with_samplers(config, Script::boxed(&[10, 1000]), Script::boxed(&[5])).unwrap();
        for _ in 0..3 {
            engine.step().unwrap();
        }
        let snapshot = engine.snapshot();

        assert_eq!(100, snapshot.simulation_time);
        assert_eq!(0, engine.in_system());
        assert_eq!(2, snapshot.n.samples);
        assert_eq!(1, snapshot.n.current);
        assert_eq!(1.0, snapshot.n.mean);
        assert_eq!(2, snapshot.t.samples);
        assert_eq!(5.0, snapshot.t.mean);
        assert_eq!(1, snapshot.tq.samples);
        assert_eq!(0, snapshot.tq.current);
    }

    #[test]
    fn overflowing_arrival_delay_aborts_the_run() {
        let mut engine =
            SimulationEngine::with_samplers(config(1), Script::boxed(&[5, Time::MAX]), Script::boxed(&[1])).unwrap();
        let err = engine.run(|_| {}).unwrap_err();

        assert_eq!(Error::TimeOverflow { now: 5, delay: Time::MAX }, err);
        assert_eq!(RunPhase::Aborted, engine.phase());
        assert_eq!(5, engine.simulation_time());
    }

    #[test]
    fn overflowing_service_delay_is_reported() {
        let mut engine =
            SimulationEngine::with_samplers(config(1), Script::boxed(&[5, 10]), Script::boxed(&[Time::MAX - 2])).unwrap();

        assert_eq!(Err(Error::TimeOverflow { now: 5, delay: Time::MAX - 2 }), engine.step());
    }

    #[test]
    fn counts_never_decrease() {
        let config = SimulationConfig::builder(20, 15)
            .servers(2)
            .measurement_interval(30)
            .precision(1e-12)
            .min_samples(u64::MAX)
            .seed(7)
            .build()
            .unwrap();
        let mut engine = SimulationEngine::new(config).unwrap();
        let mut previous = engine.snapshot();
        for _ in 0..5_000 {
            engine.step().unwrap();
            let snapshot = engine.snapshot();
            assert!(snapshot.simulation_time >= previous.simulation_time);
            assert!(snapshot.n.samples >= previous.n.samples);
            assert!(snapshot.t.samples >= previous.t.samples);
            assert!(snapshot.nq.samples >= previous.nq.samples);
            assert!(snapshot.tq.samples >= previous.tq.samples);
            previous = snapshot;
        }
    }

    #[test]
    fn sampler_failure_aborts_the_run() {
        let mut engine = SimulationEngine::with_samplers(config(1), Script::boxed(&[3]), Box::new(Broken)).unwrap();
        let mut last = None;
        let err = engine.run(|snapshot| last = Some(*snapshot)).unwrap_err();

        assert_eq!(Error::UnconfiguredGenerator, err);
        assert_eq!(RunPhase::Aborted, engine.phase());
        assert_eq!(Some(RunPhase::Aborted), last.map(|snapshot| snapshot.phase));
    }

    #[test]
    fn broken_arrival_sampler_fails_construction() {
        let result = SimulationEngine::with_samplers(config(1), Box::new(Broken), Script::boxed(&[3]));
        assert!(matches!(result, Err(Error::UnconfiguredGenerator)));
    }

    #[test]
    fn cancelled_engine_stops_before_processing() {
        let mut engine = SimulationEngine::with_samplers(config(1), Script::boxed(&[3]), Script::boxed(&[1])).unwrap();
        engine.cancel_handle().cancel();
        let snapshot = engine.run(|_| {}).unwrap();

        assert_eq!(RunPhase::Cancelled, snapshot.phase);
        assert_eq!(0, snapshot.simulation_time);
        assert_eq!(0, snapshot.n.samples);
    }

    #[test]
    fn time_limit_cancels_the_run() {
        let config = SimulationConfig::builder(10, 10)
            .precision(1e-300)
            .min_samples(u64::MAX)
            .max_time(10_000)
            .seed(3)
            .build()
            .unwrap();
        let mut engine = SimulationEngine::new(config).unwrap();
        let snapshot = engine.run(|_| {}).unwrap();

        assert_eq!(RunPhase::Cancelled, snapshot.phase);
        assert!(snapshot.simulation_time > 10_000);
    }

    #[test]
    fn deterministic_stream_converges() {
        // constant delays: every metric has zero spread after its first sample
        let mut engine = SimulationEngine::with_samplers(config(0), Script::boxed(&[10]), Script::boxed(&[5])).unwrap();
        let snapshot = engine.run(|_| {}).unwrap();

        assert_eq!(RunPhase::Converged, snapshot.phase);
        assert_eq!(15, snapshot.simulation_time);
        assert_eq!(1.0, snapshot.n.mean);
        assert_eq!(5.0, snapshot.t.mean);
    }

    #[test]
    fn min_samples_delays_convergence() {
        let config = SimulationConfig::builder(10, 10).min_samples(50).precision(1e-9).build().unwrap();
        let mut engine = SimulationEngine::with_samplers(config, Script::boxed(&[10]), Script::boxed(&[5])).unwrap();
        let snapshot = engine.run(|_| {}).unwrap();

        assert_eq!(RunPhase::Converged, snapshot.phase);
        assert_eq!(50, snapshot.t.samples);
        assert_eq!(50 * 10 + 5, snapshot.simulation_time);
    }

    #[test]
    fn observer_sees_every_publication() {
        let config = SimulationConfig::builder(10, 10)
            .precision(1e-300)
            .max_time(1_000)
            .publish_every(10)
            .build()
            .unwrap();
        let mut engine = SimulationEngine::with_samplers(config, Script::boxed(&[10]), Script::boxed(&[5, 6])).unwrap();
        let mut published = Vec::new();
        engine.run(|snapshot| published.push(*snapshot)).unwrap();

        assert_eq!(RunPhase::Running, published[0].phase);
        assert_eq!(0, published[0].n.samples);
        assert_eq!(RunPhase::Cancelled, published.last().unwrap().phase);
        // 201 steps, the last one at 1006, before the limit trips
        assert_eq!(1 + 20 + 1, published.len());
    }

    #[test]
    fn terminal_engine_ignores_further_steps() {
        let mut engine = SimulationEngine::with_samplers(config(0), Script::boxed(&[10]), Script::boxed(&[5])).unwrap();
        engine.run(|_| {}).unwrap();
        let before = engine.snapshot();

        assert_eq!(RunPhase::Converged, engine.step().unwrap());
        assert_eq!(before, engine.snapshot());
        assert_eq!(before, engine.run(|_| {}).unwrap());
    }

    #[traced_test]
    #[test]
    fn run_logs_start_and_finish() {
        let mut engine = SimulationEngine::with_samplers(config(0), Script::boxed(&[10]), Script::boxed(&[5])).unwrap();
        engine.run(|_| {}).unwrap();

        assert!(logs_contain("starting simulation"));
        assert!(logs_contain("simulation finished"));
    }
}

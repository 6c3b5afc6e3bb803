use crate::engine::{CancelHandle, SimulationEngine};
use crate::snapshot::{RunPhase, Snapshot};
use crate::{Error, SimulationConfig};

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use tracing::debug;

/// State shared between the session and its engine thread.
#[derive(Debug)]
struct Shared {
    latest: Mutex<Snapshot>,
    subscribers: Mutex<Subscribers>,
}

#[derive(Debug, Default)]
struct Subscribers {
    waiting: Vec<Sender<Snapshot>>,
    /// Set once the final snapshot has been delivered; late subscribers get it immediately.
    final_snapshot: Option<Snapshot>,
}

impl Shared {
    fn publish(&self, snapshot: &Snapshot) {
        *lock(&self.latest) = *snapshot;
    }

    fn finish(&self, snapshot: Snapshot) {
        self.publish(&snapshot);
        let mut subscribers = lock(&self.subscribers);
        subscribers.final_snapshot = Some(snapshot);
        for subscriber in subscribers.waiting.drain(..) {
            // a dropped receiver just means nobody is listening any more
            let _ = subscriber.send(snapshot);
        }
    }
}

/// Snapshots and subscriber lists stay consistent even if a holder panicked, so poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Runs one [`SimulationEngine`] on a background thread.
///
/// The engine publishes whole [`Snapshot`] values into the session as it runs; [`snapshot()`] copies the latest one
/// out, so callers never observe a metric halfway through an update and never touch engine state directly.
///
/// Subscribers registered through [`subscribe()`] receive exactly one message, the final snapshot, when the run
/// reaches a terminal phase.
///
/// Dropping a session that is still running cancels it and waits for the engine thread to exit.
///
/// [`snapshot()`]: SimulationSession::snapshot
/// [`subscribe()`]: SimulationSession::subscribe
#[derive(Debug)]
pub struct SimulationSession {
    engine: Option<SimulationEngine>,
    cancel: CancelHandle,
    shared: Arc<Shared>,
    handle: Option<JoinHandle<crate::Result<Snapshot>>>,
    outcome: Option<crate::Result<Snapshot>>,
}

impl SimulationSession {
    /// Validate the configuration and prepare an engine for it. Nothing runs until [`start()`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if the configuration fails validation.
    ///
    /// [`start()`]: SimulationSession::start
    pub fn new(config: SimulationConfig) -> crate::Result<Self> {
        Ok(Self::from_engine(SimulationEngine::new(config)?))
    }

    /// Wrap an already constructed engine.
    pub fn from_engine(engine: SimulationEngine) -> Self {
        let shared = Shared {
            latest: Mutex::new(engine.snapshot()),
            subscribers: Mutex::new(Subscribers::default()),
        };
        Self {
            cancel: engine.cancel_handle(),
            engine: Some(engine),
            shared: Arc::new(shared),
            handle: None,
            outcome: None,
        }
    }

    /// Receive the final snapshot once the run ends.
    pub fn subscribe(&self) -> Receiver<Snapshot> {
        let (sender, receiver) = mpsc::channel();
        let mut subscribers = lock(&self.shared.subscribers);
        match subscribers.final_snapshot {
            Some(snapshot) => {
                let _ = sender.send(snapshot);
            },
            None => subscribers.waiting.push(sender),
        }
        receiver
    }

    /// Start the engine on its own thread and return immediately.
    ///
    /// # Errors
    ///
    /// * [`Error::AlreadyStarted`] if the session was started before.
    /// * [`Error::EngineThread`] if the thread could not be spawned.
    pub fn start(&mut self) -> crate::Result {
        let mut engine = self.engine.take().ok_or(Error::AlreadyStarted)?;
        let shared = Arc::clone(&self.shared);

        let handle = thread::Builder::new()
            .name("mmc-sim-engine".into())
            .spawn(move || {
                let result = engine.run(|snapshot| shared.publish(snapshot));
                shared.finish(engine.snapshot());
                result
            })
            .map_err(|err| Error::EngineThread(err.to_string()))?;

        debug!("engine thread started");
        self.handle = Some(handle);
        Ok(())
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        *lock(&self.shared.latest)
    }

    pub fn phase(&self) -> RunPhase {
        self.snapshot().phase
    }

    /// Whether the engine thread is still executing.
    pub fn is_running(&self) -> bool {
        self.handle.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Ask the engine to stop at its next timestamp boundary and wait for its thread to exit.
    ///
    /// Cancelling a session that already finished simply returns its outcome. Cancelling one that never started marks
    /// it cancelled without running anything.
    ///
    /// # Errors
    ///
    /// Returns the error that aborted the run, if any, or [`Error::EngineThread`] if the thread panicked.
    pub fn cancel(&mut self) -> crate::Result<Snapshot> {
        debug!("cancellation requested");
        self.cancel.cancel();
        if let Some(mut engine) = self.engine.take() {
            let result = engine.run(|_| {});
            self.shared.finish(engine.snapshot());
            self.outcome = Some(result);
        }
        self.wait()
    }

    /// Wait for the run to end on its own.
    ///
    /// # Errors
    ///
    /// * The error that aborted the run, if any.
    /// * [`Error::EngineThread`] if the thread panicked.
    /// * [`Error::NotStarted`] if the session was neither started nor cancelled, as waiting would never return.
    pub fn wait(&mut self) -> crate::Result<Snapshot> {
        if let Some(handle) = self.handle.take() {
            let result = handle.join().unwrap_or_else(|_| {
                let mut snapshot = self.snapshot();
                snapshot.phase = RunPhase::Aborted;
                self.shared.finish(snapshot);
                Err(Error::EngineThread("engine thread panicked".into()))
            });
            debug!("engine thread joined");
            self.outcome = Some(result);
        }
        self.outcome.clone().unwrap_or(Err(Error::NotStarted))
    }
}

impl Drop for SimulationSession {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.cancel.cancel();
            let _ = self.wait();
        }
    }
}

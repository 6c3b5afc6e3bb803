use crate::Time;

use std::fmt::{Display, Formatter};

/// The closed set of things that can happen in the queueing system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    /// A new request enters the system.
    Arrival,
    /// A server finishes working on a request.
    ServiceFinished,
    /// Periodic re-sampling of the current metric values.
    Measure,
}

impl Display for EventKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        let name = match self {
            Self::Arrival => "arrival",
            Self::ServiceFinished => "service finished",
            Self::Measure => "measure",
        };
        f.write_str(name)
    }
}

/// A scheduled occurrence of an [`EventKind`].
///
/// `created` is the timestamp the event's request entered the system, which is at most `scheduled`. When the event
/// fires, `scheduled - created` is the time the request has spent in the system so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
    scheduled: Time,
    created: Time,
}

impl Event {
    /// # Panics
    ///
    /// Debug builds assert that `created <= scheduled`.
    pub fn new(kind: EventKind, scheduled: Time, created: Time) -> Self {
        debug_assert!(created <= scheduled, "event created after it was scheduled");
        Self {
            kind,
            scheduled,
            created,
        }
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn scheduled(&self) -> Time {
        self.scheduled
    }

    pub fn created(&self) -> Time {
        self.created
    }

    /// Time elapsed between creation and the scheduled execution.
    pub fn elapsed(&self) -> Time {
        self.scheduled - self.created
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{} at {} (created {})", self.kind, self.scheduled, self.created)
    }
}

pub(crate) mod event;

pub use event::{Event, EventKind};

use crate::{Error, Time};

use std::collections::BTreeMap;

/// Time-ordered multimap of scheduled events.
///
/// Events are grouped into buckets by execution time. Buckets come out in ascending order of time, and events within
/// a bucket keep the order in which they were scheduled. The engine consumes one whole bucket per step, so all
/// processing for a timestamp completes before the clock moves on.
///
/// The queue tracks the time of the last bucket handed out through [`pop_next()`] and refuses to schedule anything
/// before it: such an event would never execute and almost certainly points to a missing offset at the call site.
///
/// [`pop_next()`]: EventQueue::pop_next
#[derive(Debug, Default)]
pub struct EventQueue {
    buckets: BTreeMap<Time, Vec<Event>>,
    last_execution_time: Time,
    len: usize,
}

impl EventQueue {
    /// Construct a new [`EventQueue`] with no scheduled events and a clock initialized to the provided time.
    pub fn new(start_time: Time) -> Self {
        Self {
            buckets: BTreeMap::new(),
            last_execution_time: start_time,
            len: 0,
        }
    }

    /// Schedule the provided event at its execution time.
    ///
    /// # Errors
    ///
    /// If the event's time is less than the current clock time, returns an [`Error::BackInTime`] with no modifications
    /// to the queue.
    pub fn schedule(&mut self, event: Event) -> crate::Result {
        if event.scheduled() < self.last_execution_time {
            return Err(Error::BackInTime {
                scheduled: event.scheduled(),
                now: self.last_execution_time,
            });
        }

        self.buckets.entry(event.scheduled()).or_default().push(event);
        self.len += 1;
        Ok(())
    }

    /// Earliest time at which an event is scheduled, if any.
    pub fn next_time(&self) -> Option<Time> {
        self.buckets.keys().next().copied()
    }

    /// All events scheduled at exactly `time`, in scheduling order.
    pub fn events_at(&self, time: Time) -> impl Iterator<Item = &Event> + '_ {
        self.buckets.get(&time).into_iter().flatten()
    }

    /// Remove and return every event scheduled at exactly `time`.
    pub fn remove_all(&mut self, time: Time) -> Vec<Event> {
        let removed = self.buckets.remove(&time).unwrap_or_default();
        self.len -= removed.len();
        removed
    }

    /// Crate-internal function to pop the earliest bucket from the queue. Updates the current clock time to match the
    /// execution time of the popped bucket.
    pub(crate) fn pop_next(&mut self) -> Option<(Time, Vec<Event>)> {
        let time = self.next_time()?;
        self.last_execution_time = time;
        Some((time, self.remove_all(time)))
    }

    /// The time of the bucket most recently popped.
    pub fn current_time(&self) -> Time {
        self.last_execution_time
    }

    /// Number of scheduled events across all buckets.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Display for EventQueue {
    fn fmt(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(
            formatter,
            "EventQueue with {} scheduled events at current time {}",
            self.len, self.last_execution_time
        )
    }
}

//! Debounced write-behind scheduling.
//!
//! A mutation schedules a flush `delay` from now; another mutation inside the
//! window cancels it and schedules a fresh one. The caller polls with the
//! current time and flushes when [`DebouncedWriter::poll`] says so, so the
//! last write always wins.

use std::time::{Duration, Instant};

#[derive(Clone, Debug)]
pub struct DebouncedWriter {
    delay: Duration,
    deadline: Option<Instant>,
}

impl DebouncedWriter {
    pub fn new(delay: Duration) -> Self {
        DebouncedWriter {
            delay,
            deadline: None,
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// (Re)schedule a flush `delay` after `now`.
    pub fn schedule(&mut self, now: Instant) {
        self.deadline = Some(now + self.delay);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_pending(&self) -> bool {
        self.deadline.is_some()
    }

    /// Time left before the pending flush is due.
    pub fn time_until_due(&self, now: Instant) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(now))
    }

    /// Returns true exactly once per window, when the deadline has passed.
    pub fn poll(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if now >= deadline => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    /// Take a pending flush regardless of the deadline (shutdown).
    pub fn take_pending(&mut self) -> bool {
        self.deadline.take().is_some()
    }
}

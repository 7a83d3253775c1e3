//! Virtual alarm timeline
//!
//! The overlay schedules alarms through a plain function and expects them to
//! come back after the requested delay. In a browser that function wraps a
//! timer; elsewhere a `Timeline` stores the alarms against a virtual clock
//! and releases them in due order, which keeps scenarios deterministic.

use std::collections::BTreeMap;

use web_time::Duration;

use crate::AlarmMessage;

/// Alarms pending against a virtual clock
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    now: Duration,
    sequence: u64,
    pending: BTreeMap<(Duration, u64), AlarmMessage>,
}

impl Timeline {
    /// Creates an empty timeline at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores an alarm due `delay` after the current time
    ///
    /// Alarms due at the same instant are released in scheduling order.
    pub fn schedule(&mut self, message: AlarmMessage, delay: Duration) {
        self.pending.insert((self.now + delay, self.sequence), message);
        self.sequence += 1;
    }

    /// Releases the earliest alarm due no later than `deadline`
    ///
    /// The clock moves to the released alarm's due time. When nothing is due
    /// the clock moves to `deadline` and `None` is returned.
    pub fn pop_until(&mut self, deadline: Duration) -> Option<AlarmMessage> {
        match self.next_due() {
            Some(due) if due <= deadline => {
                self.now = self.now.max(due);
                self.pending.pop_first().map(|(_, message)| message)
            }
            _ => {
                self.now = self.now.max(deadline);
                None
            }
        }
    }

    /// Releases the earliest pending alarm regardless of its due time
    pub fn pop_next(&mut self) -> Option<AlarmMessage> {
        let ((due, _), message) = self.pending.pop_first()?;
        self.now = self.now.max(due);
        Some(message)
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.now
    }

    /// Due time of the earliest pending alarm
    pub fn next_due(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(due, _)| *due)
    }

    /// Number of pending alarms
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether no alarm is pending
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

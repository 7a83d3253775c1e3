//! Countdown timer
//!
//! The counter decrements a number of display seconds once per scheduled
//! tick and terminates when it reaches zero. Ticks are not timed here: each
//! tick schedules the next one through the caller-provided scheduling
//! function, and the host delivers it back through `receive_alarm`.
//!
//! A run is identified by an [`Id`]. Stopping the counter forgets the id, so
//! a tick that was already scheduled when `stop` ran is dropped on delivery
//! instead of producing a late observation.

use serde::{Deserialize, Serialize};
use web_time::Duration;

use crate::id::Id;

/// Lifecycle of a countdown run
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum CounterState {
    /// Ticking; a tick is scheduled
    #[default]
    Running,
    /// Reached zero and reported expiry
    Terminated,
    /// Cancelled from outside before reaching zero
    Stopped,
}

/// Alarm messages scheduled by the counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmMessage {
    /// One tick of the run identified by `id`
    Tick {
        /// The run this tick belongs to
        id: Id,
    },
}

/// Observations produced while handling a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// The counter was decremented; carries the remaining display seconds
    Tick(u64),
    /// The counter reached zero; emitted exactly once per run
    Expired,
}

/// A countdown run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Counter {
    id: Id,
    remaining: u64,
    interval: Duration,
    state: CounterState,
}

impl Counter {
    /// Starts a new countdown and schedules its first tick
    ///
    /// # Arguments
    ///
    /// * `initial_seconds` - Display seconds to count down from
    /// * `interval` - Real time between two ticks
    /// * `schedule_message` - Function to schedule the next tick
    pub fn start<S: FnMut(crate::AlarmMessage, Duration)>(
        initial_seconds: u64,
        interval: Duration,
        mut schedule_message: S,
    ) -> Self {
        let counter = Self {
            id: Id::new(),
            remaining: initial_seconds,
            interval,
            state: CounterState::Running,
        };

        schedule_message(AlarmMessage::Tick { id: counter.id }.into(), interval);

        counter
    }

    /// Cancels the countdown
    ///
    /// Stopping an already terminated or stopped counter does nothing.
    ///
    /// # Returns
    ///
    /// `true` if the counter was running
    pub fn stop(&mut self) -> bool {
        if self.state == CounterState::Running {
            self.state = CounterState::Stopped;
            true
        } else {
            false
        }
    }

    /// Handles a scheduled tick
    ///
    /// Ticks of another run, or of this run after it stopped or terminated,
    /// are ignored.
    ///
    /// # Returns
    ///
    /// The observation produced by the tick, if it was live
    pub fn receive_alarm<S: FnMut(crate::AlarmMessage, Duration)>(
        &mut self,
        message: &AlarmMessage,
        mut schedule_message: S,
    ) -> Option<Event> {
        let AlarmMessage::Tick { id } = message;

        if *id != self.id || self.state != CounterState::Running {
            tracing::trace!(tick = %id, "dropping stale countdown tick");
            return None;
        }

        if self.remaining == 0 {
            self.state = CounterState::Terminated;
            return Some(Event::Expired);
        }

        self.remaining -= 1;
        schedule_message(AlarmMessage::Tick { id: self.id }.into(), self.interval);

        Some(Event::Tick(self.remaining))
    }

    /// Display seconds left
    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    /// Current lifecycle state
    pub fn state(&self) -> CounterState {
        self.state
    }

    /// Whether ticks are still being delivered
    pub fn is_running(&self) -> bool {
        self.state == CounterState::Running
    }
}

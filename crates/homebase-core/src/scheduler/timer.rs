//! Cancellable debounce timer as a plain state machine.
//!
//! The timer never sleeps by itself. Callers pass `now` in, which keeps
//! arm/cancel/fire testable without waiting on any clock.

use std::time::Duration;

use tokio::time::Instant;

#[derive(Debug, Default, Clone)]
pub struct DebounceTimer {
    deadline: Option<Instant>,
    arm_count: u64,
}

impl DebounceTimer {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            deadline: None,
            arm_count: 0,
        }
    }

    /// Arm the timer to fire `window` after `now`, replacing any pending deadline.
    pub fn arm(&mut self, now: Instant, window: Duration) {
        self.deadline = Some(now + window);
        self.arm_count += 1;
    }

    /// Disarm. Returns whether a deadline was pending.
    pub fn cancel(&mut self) -> bool {
        self.deadline.take().is_some()
    }

    /// Fire if the deadline has been reached; firing disarms the timer.
    pub fn fire(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    #[must_use]
    pub const fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    /// How many times the timer has been (re)armed.
    #[must_use]
    pub const fn arm_count(&self) -> u64 {
        self.arm_count
    }
}

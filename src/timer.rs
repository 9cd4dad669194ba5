//! Retransmission timer over an injectable clock.
//!
//! Go-Back-N uses exactly **one** timer per sender, tied to the oldest
//! unacknowledged segment rather than to individual segments:
//! - armed when the window goes from empty to non-empty,
//! - restarted on every ACK that advances the window,
//! - canceled when the window drains,
//! - expired when the armed timestamp is older than the retransmission
//!   interval, which triggers a full-window retransmit.
//!
//! Time is read through the [`Clock`] trait so the expiry logic can be
//! driven deterministically in tests without real delays.

use std::time::{Duration, Instant};

/// Source of monotonic time.
pub trait Clock {
    fn now(&self) -> Instant;
}

/// The real wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Single retransmission timer for one sender instance.
#[derive(Debug)]
pub struct RetransmitTimer<C: Clock = SystemClock> {
    clock: C,
    interval: Duration,
    armed_at: Option<Instant>,
}

impl RetransmitTimer<SystemClock> {
    /// Timer over the system clock with the given retransmission interval.
    pub fn new(interval: Duration) -> Self {
        Self::with_clock(interval, SystemClock)
    }
}

impl<C: Clock> RetransmitTimer<C> {
    /// Timer over an explicit clock (tests inject a manual one).
    pub fn with_clock(interval: Duration, clock: C) -> Self {
        Self {
            clock,
            interval,
            armed_at: None,
        }
    }

    /// Start (or restart) the timer from the current instant.
    pub fn arm(&mut self) {
        self.armed_at = Some(self.clock.now());
    }

    /// Disarm the timer; [`expired`](Self::expired) returns `false` until
    /// the next [`arm`](Self::arm).
    pub fn cancel(&mut self) {
        self.armed_at = None;
    }

    pub fn is_armed(&self) -> bool {
        self.armed_at.is_some()
    }

    /// `true` when the timer is armed and the retransmission interval has
    /// elapsed since it was last armed.
    pub fn expired(&self) -> bool {
        match self.armed_at {
            Some(armed_at) => self.clock.now().duration_since(armed_at) > self.interval,
            None => false,
        }
    }
}

// ---------------------------------------------------------------------------
// Manual clock for deterministic tests
// ---------------------------------------------------------------------------

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// A clock that only moves when the test advances it.  Clones share the
    /// same underlying time so a test can hold one handle while the timer
    /// owns another.
    #[derive(Debug, Clone)]
    pub(crate) struct ManualClock {
        epoch: Instant,
        offset: Arc<Mutex<Duration>>,
    }

    impl ManualClock {
        pub(crate) fn new() -> Self {
            Self {
                epoch: Instant::now(),
                offset: Arc::new(Mutex::new(Duration::ZERO)),
            }
        }

        pub(crate) fn advance(&self, by: Duration) {
            *self.offset.lock().unwrap() += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> Instant {
            self.epoch + *self.offset.lock().unwrap()
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

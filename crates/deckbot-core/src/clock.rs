#![forbid(unsafe_code)]

//! Monotonic clocks.
//!
//! Screens read time through the [`Clock`] trait so that time-driven behavior
//! (typematic repeat, idle redraws, spinners) can be driven deterministically
//! in tests. Time is expressed as a [`Duration`] since an arbitrary epoch.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic time source.
pub trait Clock {
    /// Time elapsed since the clock's epoch. Never decreases.
    fn now_mono(&self) -> Duration;
}

/// Shared clock handle handed to screens.
///
/// The shell is single-threaded, so `Rc` is enough.
pub type ClockHandle = Rc<dyn Clock>;

/// Monotonic clock backed by `std::time::Instant`.
#[derive(Debug)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }

    /// Convenience constructor for a shared handle.
    #[must_use]
    pub fn handle() -> ClockHandle {
        Rc::new(Self::new())
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_mono(&self) -> Duration {
        self.epoch.elapsed()
    }
}

/// Deterministic monotonic clock controlled by the caller.
///
/// Interior mutability lets a test keep one `Rc<DeterministicClock>` and
/// advance it while screens hold clones of the same handle.
#[derive(Debug, Default)]
pub struct DeterministicClock {
    now: Cell<Duration>,
}

impl DeterministicClock {
    /// Create a clock starting at `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            now: Cell::new(Duration::ZERO),
        }
    }

    /// Set current monotonic time. Ignored if it would move time backwards.
    pub fn set(&self, now: Duration) {
        if now >= self.now.get() {
            self.now.set(now);
        }
    }

    /// Advance monotonic time by `dt`.
    pub fn advance(&self, dt: Duration) {
        self.now.set(self.now.get().saturating_add(dt));
    }
}

impl Clock for DeterministicClock {
    fn now_mono(&self) -> Duration {
        self.now.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_starts_at_zero() {
        let clock = DeterministicClock::new();
        assert_eq!(clock.now_mono(), Duration::ZERO);
    }

    #[test]
    fn deterministic_advance_and_set() {
        let clock = DeterministicClock::new();
        clock.advance(Duration::from_millis(40));
        assert_eq!(clock.now_mono(), Duration::from_millis(40));
        clock.set(Duration::from_millis(100));
        assert_eq!(clock.now_mono(), Duration::from_millis(100));
    }

    #[test]
    fn deterministic_never_goes_backwards() {
        let clock = DeterministicClock::new();
        clock.set(Duration::from_secs(2));
        clock.set(Duration::from_secs(1));
        assert_eq!(clock.now_mono(), Duration::from_secs(2));
    }

    #[test]
    fn shared_handle_sees_advances() {
        let clock = Rc::new(DeterministicClock::new());
        let handle: ClockHandle = clock.clone();
        clock.advance(Duration::from_millis(5));
        assert_eq!(handle.now_mono(), Duration::from_millis(5));
    }

    #[test]
    fn monotonic_is_non_decreasing() {
        let clock = MonotonicClock::new();
        let a = clock.now_mono();
        let b = clock.now_mono();
        assert!(b >= a);
    }
}

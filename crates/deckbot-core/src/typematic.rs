#![forbid(unsafe_code)]

//! Typematic (auto-repeat) state machine for held directional input.
//!
//! Turns "a direction is being held" into a stream of discrete steps: one step
//! immediately on press, a pause of [`TypematicConfig::initial_delay`], then
//! repeats whose interval shrinks linearly with how long the direction has been
//! held, down to [`TypematicConfig::min_rate`].
//!
//! # Invariants
//!
//! 1. At most one source owns the repeat timer at any time.
//! 2. Every call to [`input`](TypematicController::input) transitions the
//!    state atomically; timers are never half-updated.
//! 3. Zeroing the direction, reversing it, or a different source taking over
//!    resets both the pending and repeat timers.
//! 4. The controller never reads a clock itself. Callers pass `now`, so the
//!    schedule is fully deterministic under test.
//!
//! # Example
//!
//! ```
//! use deckbot_core::typematic::{TypematicConfig, TypematicController};
//! use std::time::Duration;
//!
//! let mut tm = TypematicController::new(TypematicConfig::default());
//! let ms = Duration::from_millis;
//!
//! // The press itself steps once.
//! assert_eq!(tm.input("hat", 1, ms(0)), Some(1));
//! // Nothing more until the initial delay elapses.
//! assert_eq!(tm.poll(ms(499)), None);
//! assert_eq!(tm.poll(ms(500)), Some(1));
//! ```

use std::time::Duration;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Timing constants for typematic repeat.
#[derive(Debug, Clone, PartialEq)]
pub struct TypematicConfig {
    /// How long a direction must be held before repeating starts (default: 500ms).
    pub initial_delay: Duration,

    /// Repeat interval at the moment repeating starts from zero hold (default: 100ms).
    pub rate: Duration,

    /// How much the interval shrinks per second held (default: 0.01s per s).
    pub rate_gain: f64,

    /// Shortest interval the acceleration may reach (default: 20ms).
    pub min_rate: Duration,
}

impl Default for TypematicConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_millis(500),
            rate: Duration::from_millis(100),
            rate_gain: 0.01,
            min_rate: Duration::from_millis(20),
        }
    }
}

impl TypematicConfig {
    /// Repeat interval after the direction has been held for `held`.
    #[must_use]
    pub fn interval_after(&self, held: Duration) -> Duration {
        let shrink = held.mul_f64(self.rate_gain.max(0.0));
        self.rate.saturating_sub(shrink).max(self.min_rate)
    }
}

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

/// Where the controller is in its press / delay / repeat cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TypematicPhase<S> {
    /// No direction held.
    #[default]
    Idle,
    /// Direction held, waiting out the initial delay.
    Pending {
        source: S,
        direction: i8,
        pressed_at: Duration,
    },
    /// Direction held past the delay; repeating.
    Repeating {
        source: S,
        direction: i8,
        pressed_at: Duration,
        last_tick_at: Duration,
    },
}

/// Typematic state machine.
///
/// `S` identifies an input source (the d-pad, an analog stick, a keyboard).
/// Two sources can demand directions at the same time; whichever reported a
/// nonzero direction most recently owns the repeat timer.
#[derive(Debug, Clone)]
pub struct TypematicController<S> {
    config: TypematicConfig,
    phase: TypematicPhase<S>,
}

impl<S: Copy + PartialEq> TypematicController<S> {
    /// Create a controller with the given timing.
    #[must_use]
    pub fn new(config: TypematicConfig) -> Self {
        Self {
            config,
            phase: TypematicPhase::Idle,
        }
    }

    /// Create a controller with default timing.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(TypematicConfig::default())
    }

    /// Feed a directional input from `source`.
    ///
    /// `direction` is reduced to its sign. Returns the step to apply
    /// immediately, if any: a fresh press steps once, a repeated report of the
    /// held direction does not.
    pub fn input(&mut self, source: S, direction: i8, now: Duration) -> Option<i8> {
        let direction = direction.signum();
        match self.owner() {
            None => {
                if direction == 0 {
                    return None;
                }
                self.press(source, direction, now)
            }
            Some((owner, held)) if owner == source => {
                if direction == held {
                    None
                } else if direction == 0 {
                    self.phase = TypematicPhase::Idle;
                    None
                } else {
                    self.press(source, direction, now)
                }
            }
            Some(_) => {
                if direction == 0 {
                    self.phase = TypematicPhase::Idle;
                    None
                } else {
                    self.press(source, direction, now)
                }
            }
        }
    }

    /// Advance timers to `now`.
    ///
    /// Returns a repeat step when one is due. Call this on every poll; at most
    /// one repeat is emitted per call.
    pub fn poll(&mut self, now: Duration) -> Option<i8> {
        match self.phase {
            TypematicPhase::Idle => None,
            TypematicPhase::Pending {
                source,
                direction,
                pressed_at,
            } => {
                if now.saturating_sub(pressed_at) < self.config.initial_delay {
                    return None;
                }
                self.phase = TypematicPhase::Repeating {
                    source,
                    direction,
                    pressed_at,
                    last_tick_at: now,
                };
                Some(direction)
            }
            TypematicPhase::Repeating {
                source,
                direction,
                pressed_at,
                last_tick_at,
            } => {
                let held = now.saturating_sub(pressed_at);
                if now.saturating_sub(last_tick_at) < self.config.interval_after(held) {
                    return None;
                }
                self.phase = TypematicPhase::Repeating {
                    source,
                    direction,
                    pressed_at,
                    last_tick_at: now,
                };
                Some(direction)
            }
        }
    }

    /// Current phase.
    #[must_use]
    pub fn phase(&self) -> &TypematicPhase<S> {
        &self.phase
    }

    /// The source that owns the timer and the direction it holds.
    #[must_use]
    pub fn owner(&self) -> Option<(S, i8)> {
        match self.phase {
            TypematicPhase::Idle => None,
            TypematicPhase::Pending {
                source, direction, ..
            }
            | TypematicPhase::Repeating {
                source, direction, ..
            } => Some((source, direction)),
        }
    }

    /// Whether a direction is currently held.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self.phase, TypematicPhase::Idle)
    }

    /// Time left until the next step is due, if one is scheduled.
    ///
    /// Hosts that sleep between polls can use this to wake up on time.
    #[must_use]
    pub fn time_until_next(&self, now: Duration) -> Option<Duration> {
        match self.phase {
            TypematicPhase::Idle => None,
            TypematicPhase::Pending { pressed_at, .. } => Some(
                self.config
                    .initial_delay
                    .saturating_sub(now.saturating_sub(pressed_at)),
            ),
            TypematicPhase::Repeating {
                pressed_at,
                last_tick_at,
                ..
            } => {
                let interval = self.config.interval_after(now.saturating_sub(pressed_at));
                Some(interval.saturating_sub(now.saturating_sub(last_tick_at)))
            }
        }
    }

    /// Drop any held direction.
    pub fn reset(&mut self) {
        self.phase = TypematicPhase::Idle;
    }

    /// Get a reference to the current configuration.
    #[must_use]
    pub fn config(&self) -> &TypematicConfig {
        &self.config
    }

    fn press(&mut self, source: S, direction: i8, now: Duration) -> Option<i8> {
        self.phase = TypematicPhase::Pending {
            source,
            direction,
            pressed_at: now,
        };
        Some(direction)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

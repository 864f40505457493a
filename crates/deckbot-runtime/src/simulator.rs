#![forbid(unsafe_code)]

//! Deterministic host simulator for testing.
//!
//! `HostSimulator` drives a [`Host`] without a terminal. Time comes from a
//! shared [`DeterministicClock`] that advances by a fixed frame interval per
//! tick, so time-driven screens (typematic repeat, idle redraws) behave the
//! same on every run.
//!
//! # Example
//!
//! ```ignore
//! let clock = Rc::new(DeterministicClock::new());
//! let menu = VerticalMenuScreen::new(items, clock.clone())?;
//! let mut sim = HostSimulator::new(menu, clock);
//!
//! sim.send(InputEvent::ButtonDown(Button::A))?;
//! assert!(sim.surface().contains_text("Connect"));
//! ```

use std::rc::Rc;
use std::time::Duration;

use deckbot_core::clock::{Clock, DeterministicClock};
use deckbot_core::event::InputEvent;
use deckbot_render::Surface;

use crate::host::{Host, HostError, HostState};
use crate::screen::Screen;

/// Default surface size for simulated runs.
pub const DEFAULT_SIZE: (u16, u16) = (48, 16);

/// Smallest time step; simulated time always moves forward.
pub const MIN_FRAME_INTERVAL: Duration = Duration::from_millis(1);

/// Headless driver for a [`Host`].
pub struct HostSimulator {
    host: Host,
    surface: Surface,
    clock: Rc<DeterministicClock>,
    frame_interval: Duration,
    ticks: u64,
    frames: u64,
}

impl HostSimulator {
    /// Create a simulator running `root` at 30 ticks per second.
    pub fn new(root: impl Screen, clock: Rc<DeterministicClock>) -> Self {
        Self::from_boxed(Box::new(root), clock)
    }

    pub fn from_boxed(root: Box<dyn Screen>, clock: Rc<DeterministicClock>) -> Self {
        let (width, height) = DEFAULT_SIZE;
        Self {
            host: Host::from_boxed(root),
            surface: Surface::new(width, height),
            clock,
            frame_interval: Duration::from_millis(33),
            ticks: 0,
            frames: 0,
        }
    }

    /// Change the time step applied after each tick.
    ///
    /// Steps below [`MIN_FRAME_INTERVAL`] are raised to it.
    #[must_use]
    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval.max(MIN_FRAME_INTERVAL);
        self
    }

    /// Change the surface size.
    #[must_use]
    pub fn with_size(mut self, width: u16, height: u16) -> Self {
        self.surface.resize(width, height);
        self
    }

    /// One host tick at the current time, then advance the clock.
    pub fn tick<I>(&mut self, events: I) -> Result<HostState, HostError>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        self.host.pump(events);
        if self.host.frame_due() && self.host.is_running() {
            self.frames += 1;
        }
        let state = self.host.draw(&mut self.surface);
        self.ticks += 1;
        self.clock.advance(self.frame_interval);
        state
    }

    /// Tick with a single event.
    pub fn send(&mut self, event: InputEvent) -> Result<HostState, HostError> {
        self.tick([event])
    }

    /// Tick `n` times with no input.
    pub fn idle(&mut self, n: usize) -> Result<HostState, HostError> {
        let mut state = self.host.state();
        for _ in 0..n {
            state = self.tick([])?;
        }
        Ok(state)
    }

    /// Tick with no input until `duration` of simulated time has passed.
    pub fn idle_for(&mut self, duration: Duration) -> Result<HostState, HostError> {
        let until = self.clock.now_mono() + duration;
        let mut state = self.host.state();
        while self.clock.now_mono() < until {
            state = self.tick([])?;
        }
        Ok(state)
    }

    /// Move time forward without ticking.
    pub fn advance(&self, dt: Duration) {
        self.clock.advance(dt);
    }

    pub fn host(&self) -> &Host {
        &self.host
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn clock(&self) -> &Rc<DeterministicClock> {
        &self.clock
    }

    /// Ticks run so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Ticks in which the active screen ran a frame.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::screen::ScreenRunResult;
    use deckbot_core::clock::ClockHandle;
    use deckbot_render::Rgb;

    /// Redraws twice a second and shows the time.
    struct Ticker {
        clock: ClockHandle,
        last: Option<Duration>,
    }

    impl Screen for Ticker {
        fn handle_event(&mut self, _event: &InputEvent) -> bool {
            false
        }
        fn should_render_frame(&mut self) -> bool {
            let now = self.clock.now_mono();
            self.last
                .is_none_or(|last| now.saturating_sub(last) >= Duration::from_millis(500))
        }
        fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
            let now = self.clock.now_mono();
            self.last = Some(now);
            surface.fill(Rgb::BLACK);
            surface.draw_text(0, 0, &format!("{}ms", now.as_millis()), Rgb::WHITE, Rgb::BLACK);
            ScreenRunResult::Continue
        }
    }

    #[test]
    fn clock_advances_per_tick() {
        let clock = Rc::new(DeterministicClock::new());
        let handle: ClockHandle = clock.clone();
        let mut sim = HostSimulator::new(Ticker { clock: handle, last: None }, clock)
            .with_frame_interval(Duration::from_millis(100));

        sim.idle(10).unwrap();
        assert_eq!(sim.ticks(), 10);
        assert_eq!(sim.clock().now_mono(), Duration::from_secs(1));
        // Frames at 0ms and 500ms.
        assert_eq!(sim.frames(), 2);
        assert!(sim.surface().row_text(0).starts_with("500ms"));
    }

    #[test]
    fn zero_frame_interval_still_moves_time() {
        let clock = Rc::new(DeterministicClock::new());
        let handle: ClockHandle = clock.clone();
        let mut sim = HostSimulator::new(Ticker { clock: handle, last: None }, clock)
            .with_frame_interval(Duration::ZERO);

        sim.idle_for(Duration::from_millis(5)).unwrap();
        assert_eq!(sim.ticks(), 5);
        assert_eq!(sim.clock().now_mono(), Duration::from_millis(5));
    }

    #[test]
    fn idle_for_covers_the_duration() {
        let clock = Rc::new(DeterministicClock::new());
        let handle: ClockHandle = clock.clone();
        let mut sim = HostSimulator::new(Ticker { clock: handle, last: None }, clock)
            .with_frame_interval(Duration::from_millis(250))
            .with_size(10, 1);

        sim.idle_for(Duration::from_secs(2)).unwrap();
        assert_eq!(sim.ticks(), 8);
        assert_eq!(sim.frames(), 4);
        assert_eq!(sim.surface().width(), 10);
    }
}

#![forbid(unsafe_code)]

//! Diagnostic screens: a bouncing square and an input event log.

use std::time::Duration;

use deckbot_core::clock::ClockHandle;
use deckbot_core::event::InputEvent;
use deckbot_core::geometry::Rect;
use deckbot_render::{Rgb, Surface};
use deckbot_runtime::screen::{Screen, ScreenRunResult};
use tracing::info;

const SQUARE: (i32, i32) = (6, 3);
const LOG_REFRESH: Duration = Duration::from_secs(1);

/// A white square bouncing off the edges. Ends the program after a fixed
/// number of frames.
pub struct SampleScreen {
    clock: ClockHandle,
    interval: Duration,
    last_render: Option<Duration>,
    pos: (i32, i32),
    going_right: bool,
    going_down: bool,
    frames_remaining: u32,
}

impl SampleScreen {
    pub fn new(frames: u32, clock: ClockHandle) -> Self {
        Self {
            clock,
            interval: Duration::ZERO,
            last_render: None,
            pos: (0, 0),
            going_right: true,
            going_down: true,
            frames_remaining: frames,
        }
    }

    /// Minimum time between frames (default: every tick).
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Top-left corner of the square.
    pub fn position(&self) -> (i32, i32) {
        self.pos
    }

    fn step(&mut self, width: i32, height: i32) {
        self.pos.0 += if self.going_right { 2 } else { -2 };
        self.pos.1 += if self.going_down { 1 } else { -1 };
        if self.pos.0 + SQUARE.0 > width {
            self.going_right = false;
        } else if self.pos.0 < 0 {
            self.going_right = true;
        }
        if self.pos.1 + SQUARE.1 > height {
            self.going_down = false;
        } else if self.pos.1 < 0 {
            self.going_down = true;
        }
    }
}

impl Screen for SampleScreen {
    fn name(&self) -> &str {
        "sample"
    }

    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        true
    }

    fn should_render_frame(&mut self) -> bool {
        let now = self.clock.now_mono();
        self.last_render
            .is_none_or(|last| now.saturating_sub(last) >= self.interval)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        self.last_render = Some(self.clock.now_mono());
        surface.fill(Rgb::BLACK);
        let (x, y) = (self.pos.0.max(0), self.pos.1.max(0));
        if let (Ok(x), Ok(y)) = (u16::try_from(x), u16::try_from(y)) {
            surface.fill_rect(Rect::new(x, y, SQUARE.0 as u16, SQUARE.1 as u16), Rgb::WHITE);
        }
        self.step(i32::from(surface.width()), i32::from(surface.height()));

        self.frames_remaining = self.frames_remaining.saturating_sub(1);
        if self.frames_remaining == 0 {
            info!("sample screen finished");
            return ScreenRunResult::Exit;
        }
        ScreenRunResult::Continue
    }
}

/// Shows every event it receives, newest at the bottom.
pub struct EventLogScreen {
    clock: ClockHandle,
    log: Vec<String>,
    last_render: Option<Duration>,
}

impl EventLogScreen {
    pub fn new(clock: ClockHandle) -> Self {
        Self {
            clock,
            log: Vec::new(),
            last_render: None,
        }
    }

    /// Lines still held; older lines are dropped once they scroll off.
    pub fn lines(&self) -> &[String] {
        &self.log
    }
}

impl Screen for EventLogScreen {
    fn name(&self) -> &str {
        "event log"
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.log.push(format!("{event:?}"));
        true
    }

    fn should_render_frame(&mut self) -> bool {
        let now = self.clock.now_mono();
        self.last_render
            .is_none_or(|last| now.saturating_sub(last) > LOG_REFRESH)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        self.last_render = Some(self.clock.now_mono());
        surface.fill(Rgb::BLACK);
        if self.log.is_empty() {
            self.log.push("EMPTY".to_string());
        }

        let visible = usize::from(surface.height());
        if self.log.len() > visible {
            self.log.drain(..self.log.len() - visible);
        }
        let mut y = surface.height();
        for line in self.log.iter().rev() {
            y -= 1;
            surface.draw_text(0, y, line, Rgb::WHITE, Rgb::BLACK);
        }
        ScreenRunResult::Continue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deckbot_core::clock::DeterministicClock;
    use deckbot_core::event::Button;
    use std::rc::Rc;

    #[test]
    fn square_bounces_inside_surface() {
        let mut s = SampleScreen::new(1000, Rc::new(DeterministicClock::new()));
        let mut surface = Surface::new(20, 8);
        for _ in 0..200 {
            s.run_frame(&mut surface);
            let (x, y) = s.position();
            assert!((-2..=20 - SQUARE.0 + 2).contains(&x), "x = {x}");
            assert!((-1..=8 - SQUARE.1 + 1).contains(&y), "y = {y}");
        }
    }

    #[test]
    fn square_is_drawn() {
        let mut s = SampleScreen::new(10, Rc::new(DeterministicClock::new()));
        let mut surface = Surface::new(20, 8);
        s.run_frame(&mut surface);
        assert_eq!(surface.get(0, 0).map(|c| c.bg), Some(Rgb::WHITE));
        assert_eq!(surface.get(5, 2).map(|c| c.bg), Some(Rgb::WHITE));
        assert_eq!(surface.get(6, 3).map(|c| c.bg), Some(Rgb::BLACK));
    }

    #[test]
    fn exits_after_frame_count() {
        let mut s = SampleScreen::new(3, Rc::new(DeterministicClock::new()));
        let mut surface = Surface::new(20, 8);
        assert!(s.run_frame(&mut surface).is_continue());
        assert!(s.run_frame(&mut surface).is_continue());
        assert!(matches!(s.run_frame(&mut surface), ScreenRunResult::Exit));
    }

    #[test]
    fn interval_throttles_frames() {
        let clock = Rc::new(DeterministicClock::new());
        let mut s = SampleScreen::new(10, clock.clone()).with_interval(Duration::from_millis(100));
        assert!(s.should_render_frame());
        s.run_frame(&mut Surface::new(20, 8));
        clock.advance(Duration::from_millis(50));
        assert!(!s.should_render_frame());
        clock.advance(Duration::from_millis(50));
        assert!(s.should_render_frame());
    }

    #[test]
    fn empty_log_shows_placeholder() {
        let mut s = EventLogScreen::new(Rc::new(DeterministicClock::new()));
        let mut surface = Surface::new(20, 3);
        s.run_frame(&mut surface);
        assert!(surface.row_text(2).starts_with("EMPTY"));
    }

    #[test]
    fn log_keeps_newest_visible_lines() {
        let mut s = EventLogScreen::new(Rc::new(DeterministicClock::new()));
        for _ in 0..5 {
            s.handle_event(&InputEvent::hat(0, 1));
        }
        assert!(s.handle_event(&InputEvent::ButtonDown(Button::B)));
        let mut surface = Surface::new(40, 3);
        s.run_frame(&mut surface);
        assert_eq!(s.lines().len(), 3);
        assert!(surface.row_text(2).starts_with("ButtonDown(Button(1))"));
        assert!(surface.row_text(0).starts_with("HatMotion"));
    }
}

#![forbid(unsafe_code)]

//! Single-line text prompt.
//!
//! Typed text is appended, Backspace removes the last character and Enter
//! returns the text as a `String`. The text may be empty; callers decide what
//! an empty answer means. A cancellable prompt also leaves on Escape or
//! button B and returns nothing.

use std::time::Duration;

use deckbot_core::clock::ClockHandle;
use deckbot_core::event::{Button, InputEvent, KeyCode, KeyEventKind};
use deckbot_core::geometry::Rect;
use deckbot_render::{Rgb, Surface, text_width};
use deckbot_runtime::screen::{Screen, ScreenRunResult};
use tracing::debug;

/// Redraw period without input (blinks the cursor).
const IDLE_REFRESH: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
enum Outcome {
    Submitted,
    Cancelled,
}

/// Asks for a line of text.
pub struct TextInputScreen {
    prompt: String,
    text: String,
    allow_cancel: bool,
    outcome: Option<Outcome>,
    clock: ClockHandle,
    last_render: Option<Duration>,
    cursor_on: bool,
}

impl TextInputScreen {
    pub fn new(prompt: impl Into<String>, clock: ClockHandle) -> Self {
        Self {
            prompt: prompt.into(),
            text: String::new(),
            allow_cancel: false,
            outcome: None,
            clock,
            last_render: None,
            cursor_on: true,
        }
    }

    /// Start with `text` already entered.
    #[must_use]
    pub fn prefill(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// Let Escape or button B leave without an answer.
    #[must_use]
    pub fn cancellable(mut self) -> Self {
        self.allow_cancel = true;
        self
    }

    /// Text entered so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    fn cancel(&mut self) -> bool {
        if !self.allow_cancel {
            return false;
        }
        self.outcome = Some(Outcome::Cancelled);
        true
    }

    fn draw(&mut self, surface: &mut Surface) {
        surface.fill(Rgb::BLACK);
        let area = surface.rect();
        let prompt_y = area.height / 4;
        surface.draw_text_centered(area, prompt_y, &self.prompt, Rgb::WHITE, Rgb::BLACK);

        let box_width = (area.width * 3 / 4).max(4);
        let boxed = Rect::new(
            area.x + (area.width.saturating_sub(box_width)) / 2,
            prompt_y + 2,
            box_width.min(area.width),
            3,
        );
        surface.draw_border(boxed, Rgb::WHITE, Rgb::BLACK);

        // Keep the tail visible when the text outgrows the box.
        let inner = boxed.width.saturating_sub(3);
        let mut shown = self.text.as_str();
        while text_width(shown) > usize::from(inner) {
            let mut chars = shown.chars();
            chars.next();
            shown = chars.as_str();
        }
        let end = surface.draw_text(boxed.x + 1, boxed.y + 1, shown, Rgb::WHITE, Rgb::BLACK);
        if self.cursor_on {
            surface.put_char(end, boxed.y + 1, '_', Rgb::WHITE, Rgb::BLACK);
        }
    }
}

impl Screen for TextInputScreen {
    fn name(&self) -> &str {
        "text input"
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match event {
            InputEvent::Text(text) => {
                self.text.push_str(text);
                true
            }
            InputEvent::Key(key) if key.kind != KeyEventKind::Release => {
                match key.code {
                    KeyCode::Backspace => {
                        self.text.pop();
                        true
                    }
                    KeyCode::Enter => {
                        self.outcome = Some(Outcome::Submitted);
                        true
                    }
                    KeyCode::Escape => self.cancel(),
                    _ => false,
                }
            }
            InputEvent::ButtonDown(Button::B) => self.cancel(),
            _ => false,
        }
    }

    fn should_render_frame(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        let now = self.clock.now_mono();
        self.last_render
            .is_none_or(|last| now.saturating_sub(last) >= IDLE_REFRESH)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        let now = self.clock.now_mono();
        match self.outcome {
            Some(Outcome::Submitted) => {
                debug!(prompt = %self.prompt, len = self.text.len(), "text submitted");
                ScreenRunResult::return_with(std::mem::take(&mut self.text))
            }
            Some(Outcome::Cancelled) => {
                debug!(prompt = %self.prompt, "text input cancelled");
                ScreenRunResult::return_none()
            }
            None => {
                if self
                    .last_render
                    .is_some_and(|last| now.saturating_sub(last) >= IDLE_REFRESH)
                {
                    self.cursor_on = !self.cursor_on;
                }
                self.last_render = Some(now);
                self.draw(surface);
                ScreenRunResult::Continue
            }
        }
    }
}

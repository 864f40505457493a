#![forbid(unsafe_code)]

//! Remote driving screen.
//!
//! Mirrors both analog sticks as dials and forwards every stick change to the
//! robot link. Redraws after every tenth stick event, whenever the link state
//! changes, and at least once a second. Button B returns to the caller.

use std::rc::Rc;
use std::time::Duration;

use deckbot_core::clock::ClockHandle;
use deckbot_core::event::{Axis, Button, InputEvent};
use deckbot_render::{Rgb, Surface};
use deckbot_runtime::screen::{Screen, ScreenRunResult};
use tracing::debug;

use crate::link::{DriveCommand, LinkState, RobotLink};

/// Stick events between forced redraws.
const EVENTS_PER_FRAME: u32 = 10;
const IDLE_REFRESH: Duration = Duration::from_secs(1);

/// Drives a robot from the sticks.
pub struct TeleopScreen {
    link: Rc<dyn RobotLink>,
    clock: ClockHandle,
    command: DriveCommand,
    events_without_render: u32,
    last_render: Option<Duration>,
    shown_state: Option<LinkState>,
    leaving: bool,
}

impl TeleopScreen {
    pub fn new(link: Rc<dyn RobotLink>, clock: ClockHandle) -> Self {
        Self {
            link,
            clock,
            command: DriveCommand::default(),
            events_without_render: 0,
            last_render: None,
            shown_state: None,
            leaving: false,
        }
    }

    /// Current stick positions.
    pub fn command(&self) -> DriveCommand {
        self.command
    }

    fn draw(&self, surface: &mut Surface, state: &LinkState, sent: u64) {
        surface.fill(Rgb::BLACK);
        let area = surface.rect();
        let cy = i32::from(area.center_y());
        let r = (i32::from(area.height) / 2 - 2)
            .min(i32::from(area.width) / 8 - 1)
            .max(1);

        let dials = [
            (i32::from(area.width) / 4, self.command.left, Rgb::SKY),
            (i32::from(area.width) * 3 / 4, self.command.right, Rgb::RED),
        ];
        for (cx, (x, y), knob) in dials {
            // Crosshair first so the ring and knob sit on top.
            let (left, top) = ((cx - 2 * r).max(0), (cy - r).max(0));
            if let (Ok(left), Ok(top), Ok(cxu), Ok(cyu)) = (
                u16::try_from(left),
                u16::try_from(top),
                u16::try_from(cx),
                u16::try_from(cy),
            ) {
                let width = u16::try_from(4 * r + 1).unwrap_or(0);
                let height = u16::try_from(2 * r + 1).unwrap_or(0);
                surface.hline(left, cyu, width, '─', Rgb::GRAY, Rgb::BLACK);
                surface.vline(cxu, top, height, '│', Rgb::GRAY, Rgb::BLACK);
            }
            surface.draw_ring(cx, cy, r, 'o', Rgb::WHITE);

            let kx = cx + (x * 2.0 * r as f32).round() as i32;
            let ky = cy + (y * r as f32).round() as i32;
            surface.draw_disc(kx, ky, 0, knob);
        }

        let state = match state {
            LinkState::Connecting => "connecting".to_string(),
            LinkState::Connected => "connected".to_string(),
            LinkState::Failed(reason) => format!("failed: {reason}"),
            LinkState::Closed => "closed".to_string(),
        };
        let line = format!("{}  {state}  sent {sent}  B: back", self.link.address());
        let y = area.bottom().saturating_sub(1);
        surface.draw_text_centered(area, y, &line, Rgb::WHITE, Rgb::BLACK);
    }
}

impl Screen for TeleopScreen {
    fn name(&self) -> &str {
        "teleop"
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        match *event {
            InputEvent::ButtonDown(Button::B) => {
                self.leaving = true;
                true
            }
            InputEvent::AxisMotion { axis, value } => {
                let value = value.clamp(-1.0, 1.0);
                match axis {
                    Axis::LEFT_X => self.command.left.0 = value,
                    Axis::LEFT_Y => self.command.left.1 = value,
                    Axis::RIGHT_X => self.command.right.0 = value,
                    Axis::RIGHT_Y => self.command.right.1 = value,
                    _ => return false,
                }
                if let Err(err) = self.link.send(self.command) {
                    debug!(%err, "drive command dropped");
                }
                self.events_without_render += 1;
                if self.events_without_render >= EVENTS_PER_FRAME {
                    self.events_without_render = 0;
                    return true;
                }
                false
            }
            _ => false,
        }
    }

    fn should_render_frame(&mut self) -> bool {
        if self.leaving {
            return true;
        }
        if self.shown_state.as_ref() != Some(&self.link.status().state) {
            return true;
        }
        let now = self.clock.now_mono();
        self.last_render
            .is_none_or(|last| now.saturating_sub(last) > IDLE_REFRESH)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        if self.leaving {
            debug!(address = self.link.address(), "leaving teleop");
            return ScreenRunResult::return_none();
        }
        let status = self.link.status();
        self.draw(surface, &status.state, status.commands_sent);
        self.shown_state = Some(status.state);
        self.last_render = Some(self.clock.now_mono());
        self.events_without_render = 0;
        ScreenRunResult::Continue
    }
}

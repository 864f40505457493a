#![forbid(unsafe_code)]

//! Connecting to a robot and handing over to teleop.
//!
//! [`connect_session`] is a rendering flow. While the link connects it shows a
//! spinner, drawing only when the spinner advances and skipping the other
//! polls. Button B gives up. Once connected it calls [`TeleopScreen`]
//! and closes the link when teleop returns. A failed link shows the reason
//! until A or B is pressed.

use std::rc::Rc;

use deckbot_core::clock::ClockHandle;
use deckbot_core::event::{Button, InputEvent};
use deckbot_render::{Rgb, Surface};
use deckbot_runtime::rendering_generator::{HandshakeError, RenderingGeneratorScreen};
use deckbot_runtime::screen::ScreenData;
use tracing::info;

use crate::link::{LinkState, RobotLink};
use crate::teleop::TeleopScreen;

const SPINNER: [char; 4] = ['|', '/', '-', '\\'];
const SPINNER_STEP_MS: u128 = 125;

fn pressed(events: &[InputEvent], buttons: &[Button]) -> bool {
    events
        .iter()
        .any(|e| buttons.iter().any(|&b| e.is_button_down(b)))
}

fn draw_connecting(surface: &mut Surface, address: &str, spin: char) {
    surface.fill(Rgb::BLACK);
    let area = surface.rect();
    let y = area.center_y();
    let line = format!("Connecting to {address} {spin}");
    surface.draw_text_centered(area, y.saturating_sub(1), &line, Rgb::WHITE, Rgb::BLACK);
    surface.draw_text_centered(area, y + 1, "B: cancel", Rgb::GRAY, Rgb::BLACK);
}

fn draw_failure(surface: &mut Surface, address: &str, reason: &str) {
    surface.fill(Rgb::BLACK);
    let area = surface.rect();
    let y = area.center_y();
    let line = format!("Could not connect to {address}");
    surface.draw_text_centered(area, y.saturating_sub(1), &line, Rgb::RED, Rgb::BLACK);
    surface.draw_text_centered(area, y, reason, Rgb::WHITE, Rgb::BLACK);
    surface.draw_text_centered(area, y + 2, "A/B: back", Rgb::GRAY, Rgb::BLACK);
}

/// Flow that connects `link` and runs teleop on it.
pub fn connect_session(
    link: Rc<dyn RobotLink>,
    clock: ClockHandle,
) -> Result<RenderingGeneratorScreen, HandshakeError> {
    let name = format!("connect {}", link.address());
    RenderingGeneratorScreen::new(name, move |co| async move {
        co.handshake().await;
        let address = link.address().to_string();
        let mut shown_spin = None;

        loop {
            let reason = match link.status().state {
                LinkState::Connecting => {
                    let step = clock.now_mono().as_millis() / SPINNER_STEP_MS;
                    let spin = SPINNER[(step % SPINNER.len() as u128) as usize];
                    let events = if shown_spin != Some(spin) {
                        shown_spin = Some(spin);
                        co.render(|s| draw_connecting(s, &address, spin)).await
                    } else {
                        co.ignore().await
                    };
                    if pressed(&events, &[Button::B]) {
                        info!(address = %address, "connection cancelled");
                        link.close();
                        return ScreenData::none();
                    }
                    continue;
                }
                LinkState::Connected => {
                    info!(address = %address, "starting teleop");
                    co.call(TeleopScreen::new(Rc::clone(&link), Rc::clone(&clock))).await;
                    link.close();
                    return ScreenData::none();
                }
                LinkState::Failed(reason) => reason,
                LinkState::Closed => "connection closed".to_string(),
            };

            let mut events = co.render(|s| draw_failure(s, &address, &reason)).await;
            while !pressed(&events, &[Button::A, Button::B]) {
                events = co.ignore().await;
            }
            link.close();
            return ScreenData::none();
        }
    })
}

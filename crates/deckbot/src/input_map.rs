#![forbid(unsafe_code)]

//! Keyboard stand-ins for the handheld's gamepad.
//!
//! Terminals report key presses but rarely releases, so every synthesized
//! gamepad press (hat, stick) is released on the following tick unless the
//! same control is pressed again in that tick. Key and text events are passed
//! through alongside, so text prompts keep working.
//!
//! | Key            | Gamepad events                           |
//! |----------------|------------------------------------------|
//! | arrows         | hat motion, released next tick           |
//! | Enter, Space   | button A down + up                       |
//! | Esc            | button B down + up                       |
//! | `w a s d`      | left stick full deflection, re-centred   |
//! | `i j k l`      | right stick full deflection, re-centred  |
//! | Ctrl+C         | quit                                     |

use crossterm::event::{Event, KeyCode as CtKeyCode, KeyEventKind as CtKeyEventKind, KeyModifiers};
use deckbot_core::event::{Axis, Button, InputEvent};

/// Turns terminal events into gamepad-flavoured [`InputEvent`]s.
#[derive(Debug, Default)]
pub struct InputMapper {
    deferred: Vec<InputEvent>,
}

/// Hat index or axis a synthesized event belongs to.
#[derive(Debug, PartialEq, Eq)]
enum Control {
    Hat(u8),
    Axis(Axis),
}

fn control(event: &InputEvent) -> Option<Control> {
    match *event {
        InputEvent::HatMotion { hat, .. } => Some(Control::Hat(hat)),
        InputEvent::AxisMotion { axis, .. } => Some(Control::Axis(axis)),
        _ => None,
    }
}

fn stick(c: char) -> Option<(Axis, f32)> {
    Some(match c {
        'w' => (Axis::LEFT_Y, -1.0),
        's' => (Axis::LEFT_Y, 1.0),
        'a' => (Axis::LEFT_X, -1.0),
        'd' => (Axis::LEFT_X, 1.0),
        'i' => (Axis::RIGHT_Y, -1.0),
        'k' => (Axis::RIGHT_Y, 1.0),
        'j' => (Axis::RIGHT_X, -1.0),
        'l' => (Axis::RIGHT_X, 1.0),
        _ => return None,
    })
}

fn click(button: Button, out: &mut Vec<InputEvent>) {
    out.push(InputEvent::ButtonDown(button));
    out.push(InputEvent::ButtonUp(button));
}

impl InputMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map one tick's worth of terminal events.
    pub fn tick<I>(&mut self, raw: I) -> Vec<InputEvent>
    where
        I: IntoIterator<Item = Event>,
    {
        let releases = std::mem::take(&mut self.deferred);
        let mut fresh = Vec::new();
        for event in raw {
            self.map(event, &mut fresh);
        }

        let mut out: Vec<InputEvent> = releases
            .into_iter()
            .filter(|release| {
                let target = control(release);
                !fresh.iter().any(|e| control(e).is_some() && control(e) == target)
            })
            .collect();
        out.extend(fresh);
        out
    }

    fn map(&mut self, event: Event, out: &mut Vec<InputEvent>) {
        let Event::Key(key) = &event else {
            out.extend(InputEvent::from_crossterm(event));
            return;
        };
        if key.kind == CtKeyEventKind::Release {
            return;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == CtKeyCode::Char('c') {
            out.push(InputEvent::Quit);
            return;
        }

        let code = key.code;
        out.extend(InputEvent::from_crossterm(event));
        match code {
            CtKeyCode::Up => self.hat(0, 1, out),
            CtKeyCode::Down => self.hat(0, -1, out),
            CtKeyCode::Left => self.hat(-1, 0, out),
            CtKeyCode::Right => self.hat(1, 0, out),
            CtKeyCode::Enter => click(Button::A, out),
            CtKeyCode::Esc => click(Button::B, out),
            CtKeyCode::Char(c) => {
                out.push(InputEvent::Text(c.to_string()));
                if c == ' ' {
                    click(Button::A, out);
                } else if let Some((axis, value)) = stick(c) {
                    out.push(InputEvent::axis(axis, value));
                    self.defer(InputEvent::axis(axis, 0.0));
                }
            }
            _ => {}
        }
    }

    fn hat(&mut self, x: i8, y: i8, out: &mut Vec<InputEvent>) {
        out.push(InputEvent::hat(x, y));
        self.defer(InputEvent::hat(0, 0));
    }

    fn defer(&mut self, release: InputEvent) {
        let target = control(&release);
        self.deferred.retain(|e| control(e) != target);
        self.deferred.push(release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyEvent as CtKeyEvent;
    use deckbot_core::event::KeyCode;

    fn press(code: CtKeyCode) -> Event {
        Event::Key(CtKeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn arrow_is_hat_then_release() {
        let mut m = InputMapper::new();
        let first = m.tick([press(CtKeyCode::Up)]);
        assert_eq!(first, vec![InputEvent::key(KeyCode::Up), InputEvent::hat(0, 1)]);
        assert_eq!(m.tick([]), vec![InputEvent::hat(0, 0)]);
        assert!(m.tick([]).is_empty());
    }

    #[test]
    fn repeated_arrow_keeps_hat_held() {
        let mut m = InputMapper::new();
        m.tick([press(CtKeyCode::Down)]);
        let held = m.tick([press(CtKeyCode::Down)]);
        assert!(!held.contains(&InputEvent::hat(0, 0)));
        assert_eq!(m.tick([]), vec![InputEvent::hat(0, 0)]);
    }

    #[test]
    fn enter_and_escape_click_buttons() {
        let mut m = InputMapper::new();
        let events = m.tick([press(CtKeyCode::Enter), press(CtKeyCode::Esc)]);
        assert_eq!(
            events,
            vec![
                InputEvent::key(KeyCode::Enter),
                InputEvent::ButtonDown(Button::A),
                InputEvent::ButtonUp(Button::A),
                InputEvent::key(KeyCode::Escape),
                InputEvent::ButtonDown(Button::B),
                InputEvent::ButtonUp(Button::B),
            ]
        );
    }

    #[test]
    fn letters_are_text_and_sticks() {
        let mut m = InputMapper::new();
        let events = m.tick([press(CtKeyCode::Char('w')), press(CtKeyCode::Char('x'))]);
        assert!(events.contains(&InputEvent::Text("w".into())));
        assert!(events.contains(&InputEvent::axis(Axis::LEFT_Y, -1.0)));
        assert!(events.contains(&InputEvent::Text("x".into())));
        assert_eq!(m.tick([]), vec![InputEvent::axis(Axis::LEFT_Y, 0.0)]);
    }

    #[test]
    fn ctrl_c_quits() {
        let mut m = InputMapper::new();
        let ctrl_c = Event::Key(CtKeyEvent::new(CtKeyCode::Char('c'), KeyModifiers::CONTROL));
        assert_eq!(m.tick([ctrl_c]), vec![InputEvent::Quit]);
    }

    #[test]
    fn releases_and_resize_are_dropped() {
        let mut m = InputMapper::new();
        let mut release = CtKeyEvent::new(CtKeyCode::Up, KeyModifiers::NONE);
        release.kind = CtKeyEventKind::Release;
        assert!(m.tick([Event::Key(release), Event::Resize(80, 24)]).is_empty());
    }

    #[test]
    fn paste_is_text() {
        let mut m = InputMapper::new();
        assert_eq!(
            m.tick([Event::Paste("10.0.0.2".into())]),
            vec![InputEvent::Text("10.0.0.2".into())]
        );
    }
}

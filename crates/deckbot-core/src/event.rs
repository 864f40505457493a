#![forbid(unsafe_code)]

//! Canonical input/event types.
//!
//! Screens receive structured [`InputEvent`]s regardless of where they came
//! from: a physical gamepad, a keyboard, or a test script. Gamepad numbering
//! follows the SDL layout of the handheld's built-in controller.
//!
//! # Design Notes
//!
//! - Hat `y` is `+1` when pushed up, matching SDL; menus invert it so that
//!   "up" moves the selection towards the first row.
//! - Axis values are normalized to `-1.0..=1.0`, negative is up/left.
//! - `KeyEventKind` defaults to `Press` when the source cannot tell.

use bitflags::bitflags;
#[cfg(feature = "crossterm")]
use crossterm::event as cte;

/// Canonical input event.
#[derive(Debug, Clone, PartialEq)]
pub enum InputEvent {
    /// A keyboard event.
    Key(KeyEvent),

    /// Committed text (typed characters or a paste).
    Text(String),

    /// D-pad ("hat") position changed.
    HatMotion {
        /// Hat index; the handheld has exactly one.
        hat: u8,
        /// Horizontal position, `-1` left to `+1` right.
        x: i8,
        /// Vertical position, `-1` down to `+1` up.
        y: i8,
    },

    /// A gamepad button was pressed.
    ButtonDown(Button),

    /// A gamepad button was released.
    ButtonUp(Button),

    /// An analog axis moved.
    AxisMotion {
        /// Which axis moved.
        axis: Axis,
        /// New position in `-1.0..=1.0`.
        value: f32,
    },

    /// The platform asked the application to close.
    Quit,
}

impl InputEvent {
    /// Key press with no modifiers.
    #[must_use]
    pub const fn key(code: KeyCode) -> Self {
        Self::Key(KeyEvent::new(code))
    }

    /// Hat motion on the first hat.
    #[must_use]
    pub const fn hat(x: i8, y: i8) -> Self {
        Self::HatMotion { hat: 0, x, y }
    }

    /// Axis motion.
    #[must_use]
    pub const fn axis(axis: Axis, value: f32) -> Self {
        Self::AxisMotion { axis, value }
    }

    /// Check whether this is a press of `button`.
    #[must_use]
    pub fn is_button_down(&self, button: Button) -> bool {
        matches!(self, Self::ButtonDown(b) if *b == button)
    }

    /// Check whether this is a key press (or repeat) of `code`.
    #[must_use]
    pub fn is_key_press(&self, code: KeyCode) -> bool {
        matches!(self, Self::Key(k) if k.code == code && k.kind != KeyEventKind::Release)
    }

    /// Convert a crossterm event into an [`InputEvent`].
    ///
    /// Returns `None` for events the shell has no use for (mouse, focus,
    /// resize).
    #[must_use]
    #[cfg(feature = "crossterm")]
    pub fn from_crossterm(event: cte::Event) -> Option<Self> {
        match event {
            cte::Event::Key(key) => map_key_event(key).map(Self::Key),
            cte::Event::Paste(text) => Some(Self::Text(text)),
            _ => None,
        }
    }
}

/// A gamepad button, numbered like SDL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Button(pub u8);

impl Button {
    /// Confirm.
    pub const A: Self = Self(0);
    /// Back / cancel.
    pub const B: Self = Self(1);
    pub const X: Self = Self(2);
    pub const Y: Self = Self(3);

    /// Short label for logs and on-screen hints.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            0 => "A",
            1 => "B",
            2 => "X",
            3 => "Y",
            _ => "?",
        }
    }
}

/// An analog axis, numbered like SDL on the handheld.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Axis(pub u8);

impl Axis {
    pub const LEFT_X: Self = Self(0);
    /// Left stick vertical; up is negative.
    pub const LEFT_Y: Self = Self(1);
    pub const RIGHT_X: Self = Self(3);
    /// Right stick vertical; up is negative.
    pub const RIGHT_Y: Self = Self(4);
}

/// A keyboard event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// The key code that was pressed.
    pub code: KeyCode,

    /// Modifier keys held during the event.
    pub modifiers: Modifiers,

    /// The type of key event (press, repeat, or release).
    pub kind: KeyEventKind,
}

impl KeyEvent {
    /// Create a new key event with default modifiers and Press kind.
    #[must_use]
    pub const fn new(code: KeyCode) -> Self {
        Self {
            code,
            modifiers: Modifiers::NONE,
            kind: KeyEventKind::Press,
        }
    }

    /// Create a key event with modifiers.
    #[must_use]
    pub const fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }

    /// Create a key event with a specific kind.
    #[must_use]
    pub const fn with_kind(mut self, kind: KeyEventKind) -> Self {
        self.kind = kind;
        self
    }

    /// Check if this is a specific character key.
    #[must_use]
    pub fn is_char(&self, c: char) -> bool {
        matches!(self.code, KeyCode::Char(ch) if ch == c)
    }

    /// Check if Ctrl modifier is held.
    #[must_use]
    pub const fn ctrl(&self) -> bool {
        self.modifiers.contains(Modifiers::CTRL)
    }
}

/// Key codes for keyboard events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    /// A regular character key.
    Char(char),
    Enter,
    Escape,
    Backspace,
    Tab,
    Up,
    Down,
    Left,
    Right,
    Home,
    End,
}

/// The type of key event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum KeyEventKind {
    /// Key was pressed (default when not distinguishable).
    #[default]
    Press,

    /// Key is being held (repeat event).
    Repeat,

    /// Key was released.
    Release,
}

bitflags! {
    /// Modifier keys that can be held during a key event.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Modifiers: u8 {
        /// No modifiers.
        const NONE  = 0b0000;
        /// Shift key.
        const SHIFT = 0b0001;
        /// Alt/Option key.
        const ALT   = 0b0010;
        /// Control key.
        const CTRL  = 0b0100;
    }
}

impl Default for Modifiers {
    fn default() -> Self {
        Self::NONE
    }
}

#[cfg(feature = "crossterm")]
fn map_key_event(event: cte::KeyEvent) -> Option<KeyEvent> {
    let code = match event.code {
        cte::KeyCode::Char(c) => KeyCode::Char(c),
        cte::KeyCode::Enter => KeyCode::Enter,
        cte::KeyCode::Esc => KeyCode::Escape,
        cte::KeyCode::Backspace => KeyCode::Backspace,
        cte::KeyCode::Tab => KeyCode::Tab,
        cte::KeyCode::Up => KeyCode::Up,
        cte::KeyCode::Down => KeyCode::Down,
        cte::KeyCode::Left => KeyCode::Left,
        cte::KeyCode::Right => KeyCode::Right,
        cte::KeyCode::Home => KeyCode::Home,
        cte::KeyCode::End => KeyCode::End,
        _ => return None,
    };
    let kind = match event.kind {
        cte::KeyEventKind::Press => KeyEventKind::Press,
        cte::KeyEventKind::Repeat => KeyEventKind::Repeat,
        cte::KeyEventKind::Release => KeyEventKind::Release,
    };
    let mut modifiers = Modifiers::NONE;
    if event.modifiers.contains(cte::KeyModifiers::SHIFT) {
        modifiers |= Modifiers::SHIFT;
    }
    if event.modifiers.contains(cte::KeyModifiers::ALT) {
        modifiers |= Modifiers::ALT;
    }
    if event.modifiers.contains(cte::KeyModifiers::CONTROL) {
        modifiers |= Modifiers::CTRL;
    }
    Some(KeyEvent {
        code,
        modifiers,
        kind,
    })
}

#![forbid(unsafe_code)]

//! Vertical selection menu.
//!
//! Rows are stacked top to bottom and centred horizontally. The selected row
//! is scrolled to the vertical centre of the surface and its color cycles
//! red, green, blue on every frame.
//!
//! # Input
//!
//! | Input                          | Effect                                  |
//! |--------------------------------|-----------------------------------------|
//! | hat up/down                    | move selection (typematic source `Hat`) |
//! | left stick vertical, `|v|>0.8` | move selection (typematic source `Stick`)|
//! | button A                       | return the selected key                 |
//! | button B                       | return nothing, if cancellable          |
//!
//! With nothing selected, "down" selects the first row and "up" the last.
//! Selection wraps at both ends.

use std::any::Any;
use std::fmt;
use std::time::Duration;

use deckbot_core::clock::ClockHandle;
use deckbot_core::event::{Axis, Button, InputEvent};
use deckbot_core::typematic::{TypematicConfig, TypematicController};
use deckbot_render::{Rgb, Surface};
use deckbot_runtime::screen::{Screen, ScreenData, ScreenRunResult};
use tracing::debug;

/// Colors the selected row cycles through, one step per frame.
const HIGHLIGHTS: [Rgb; 3] = [Rgb::RED, Rgb::GREEN, Rgb::BLUE];

/// Menu timing and input thresholds.
#[derive(Debug, Clone)]
pub struct MenuConfig {
    /// Redraw at least this often even without input (default: 333ms).
    pub idle_refresh: Duration,
    /// Auto-repeat for held directions.
    pub typematic: TypematicConfig,
    /// Stick deflection needed to count as a direction (default: 0.8).
    pub axis_threshold: f32,
    /// Blank rows between items (default: 1).
    pub row_spacing: u16,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            idle_refresh: Duration::from_millis(333),
            typematic: TypematicConfig::default(),
            axis_threshold: 0.8,
            row_spacing: 1,
        }
    }
}

/// Typematic sources a menu distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Hat,
    Stick,
}

/// Invalid menu construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MenuError {
    /// A menu needs at least one row.
    Empty,
    /// The requested default key is not one of the rows.
    UnknownDefault,
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "menu has no items"),
            Self::UnknownDefault => write!(f, "default item is not one of the menu's keys"),
        }
    }
}

impl std::error::Error for MenuError {}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Selected(usize),
    Cancelled,
}

/// Shows rows one below the other and returns the key of the chosen one.
///
/// Returns `ScreenData` holding a `K` on selection, empty data on cancel.
pub struct VerticalMenuScreen<K> {
    items: Vec<(K, String)>,
    selected: Option<usize>,
    allow_cancel: bool,
    outcome: Option<Outcome>,
    highlight: usize,
    typematic: TypematicController<InputSource>,
    clock: ClockHandle,
    last_render: Option<Duration>,
    config: MenuConfig,
}

impl<K: Any + Clone + PartialEq> VerticalMenuScreen<K> {
    /// A menu over `(key, label)` rows with nothing selected.
    pub fn new(items: Vec<(K, String)>, clock: ClockHandle) -> Result<Self, MenuError> {
        if items.is_empty() {
            return Err(MenuError::Empty);
        }
        let config = MenuConfig::default();
        Ok(Self {
            items,
            selected: None,
            allow_cancel: false,
            outcome: None,
            highlight: 0,
            typematic: TypematicController::new(config.typematic.clone()),
            clock,
            last_render: None,
            config,
        })
    }

    /// Start with the row keyed `key` selected.
    pub fn with_default(mut self, key: &K) -> Result<Self, MenuError> {
        let index = self
            .items
            .iter()
            .position(|(k, _)| k == key)
            .ok_or(MenuError::UnknownDefault)?;
        self.selected = Some(index);
        Ok(self)
    }

    /// Let button B leave the menu without a selection.
    #[must_use]
    pub fn cancellable(mut self) -> Self {
        self.allow_cancel = true;
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: MenuConfig) -> Self {
        self.typematic = TypematicController::new(config.typematic.clone());
        self.config = config;
        self
    }

    /// Index of the selected row.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    /// Key of the selected row.
    pub fn selected_key(&self) -> Option<&K> {
        self.selected.map(|i| &self.items[i].0)
    }

    fn step(&mut self, direction: i8) {
        let len = self.items.len();
        self.selected = Some(match self.selected {
            None if direction > 0 => 0,
            None => len - 1,
            Some(i) => (i as isize + isize::from(direction)).rem_euclid(len as isize) as usize,
        });
    }

    fn direction_input(&mut self, source: InputSource, direction: i8) -> bool {
        let now = self.clock.now_mono();
        match self.typematic.input(source, direction, now) {
            Some(step) => {
                self.step(step);
                true
            }
            None => false,
        }
    }

    fn draw(&mut self, surface: &mut Surface) {
        surface.fill(Rgb::BLACK);
        let area = surface.rect();
        let spacing = i32::from(self.config.row_spacing);
        let pitch = 1 + spacing;
        let centre = i32::from(area.center_y());
        let rows = self.items.len() as i32;
        let first = match self.selected {
            Some(s) => centre - s as i32 * pitch,
            None => centre - (rows * pitch - spacing) / 2,
        };

        if self.selected.is_some() {
            self.highlight = (self.highlight + 1) % HIGHLIGHTS.len();
        }
        for (i, (_, label)) in self.items.iter().enumerate() {
            let y = first + i as i32 * pitch;
            let Ok(y) = u16::try_from(y) else { continue };
            if y >= area.height {
                continue;
            }
            if self.selected == Some(i) {
                let text = format!("> {label} <");
                surface.draw_text_centered(area, y, &text, HIGHLIGHTS[self.highlight], Rgb::BLACK);
            } else {
                surface.draw_text_centered(area, y, label, Rgb::WHITE, Rgb::BLACK);
            }
        }
    }
}

impl<K: Any + Clone + PartialEq> Screen for VerticalMenuScreen<K> {
    fn name(&self) -> &str {
        "menu"
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        match *event {
            InputEvent::HatMotion { y, .. } => self.direction_input(InputSource::Hat, -y.signum()),
            InputEvent::AxisMotion { axis, value } if axis == Axis::LEFT_Y => {
                let direction = if value.abs() > self.config.axis_threshold {
                    if value > 0.0 { 1 } else { -1 }
                } else {
                    0
                };
                self.direction_input(InputSource::Stick, direction)
            }
            InputEvent::ButtonDown(Button::A) => match self.selected {
                Some(i) => {
                    self.outcome = Some(Outcome::Selected(i));
                    true
                }
                None => false,
            },
            InputEvent::ButtonDown(Button::B) if self.allow_cancel => {
                self.outcome = Some(Outcome::Cancelled);
                true
            }
            _ => false,
        }
    }

    fn should_render_frame(&mut self) -> bool {
        if self.outcome.is_some() {
            return true;
        }
        let now = self.clock.now_mono();
        if let Some(step) = self.typematic.poll(now) {
            self.step(step);
            return true;
        }
        self.last_render
            .is_none_or(|last| now.saturating_sub(last) > self.config.idle_refresh)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        self.last_render = Some(self.clock.now_mono());
        match self.outcome {
            Some(Outcome::Selected(i)) => {
                debug!(row = i, label = %self.items[i].1, "menu selection");
                ScreenRunResult::ReturnToCaller(ScreenData::new(self.items[i].0.clone()))
            }
            Some(Outcome::Cancelled) => {
                debug!("menu cancelled");
                ScreenRunResult::return_none()
            }
            None => {
                self.draw(surface);
                ScreenRunResult::Continue
            }
        }
    }
}

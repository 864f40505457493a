#![forbid(unsafe_code)]

//! Core: input events, geometry, monotonic clocks, and typematic repeat.
//!
//! Everything in this crate is independent of how frames are drawn or how
//! screens are navigated. The runtime and the concrete screens build on these
//! leaf types.

pub mod clock;
pub mod event;
pub mod geometry;
pub mod typematic;

pub use clock::{Clock, ClockHandle, DeterministicClock, MonotonicClock};
pub use event::{Axis, Button, InputEvent, KeyCode, KeyEvent, KeyEventKind, Modifiers};
pub use geometry::Rect;
pub use typematic::{TypematicConfig, TypematicController, TypematicPhase};

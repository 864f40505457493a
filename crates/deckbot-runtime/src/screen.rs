#![forbid(unsafe_code)]

//! The screen contract.
//!
//! A [`Screen`] is one full-surface UI state. The [`Host`](crate::host::Host)
//! keeps exactly one screen active and suspends the others on a stack.
//! Screens navigate by returning a [`ScreenRunResult`] from
//! [`run_frame`](Screen::run_frame): stay, exit the program, push a child, or
//! pop back to the caller with a [`ScreenData`] payload.
//!
//! # Call order
//!
//! Per host tick the active screen sees, in order:
//!
//! 1. zero or more [`handle_event`](Screen::handle_event) calls;
//! 2. exactly one [`should_render_frame`](Screen::should_render_frame) poll;
//! 3. [`run_frame`](Screen::run_frame) if either of the above asked for it.
//!
//! A screen resumed from the stack additionally gets one
//! [`receive_data`](Screen::receive_data) call immediately followed by an
//! unpolled `run_frame`.

use std::any::Any;
use std::fmt;

use deckbot_core::event::InputEvent;
use deckbot_render::Surface;

/// Payload carried by [`ScreenRunResult::ReturnToCaller`].
///
/// Either empty (a cancelled prompt, a child with nothing to report) or a
/// single value of any `'static` type.
#[derive(Default)]
pub struct ScreenData(Option<Box<dyn Any>>);

impl ScreenData {
    /// No data.
    pub const fn none() -> Self {
        Self(None)
    }

    /// Wrap a value.
    pub fn new<T: Any>(value: T) -> Self {
        Self(Some(Box::new(value)))
    }

    pub fn is_none(&self) -> bool {
        self.0.is_none()
    }

    pub fn is_some(&self) -> bool {
        self.0.is_some()
    }

    /// Whether the payload is a `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.0.as_ref().is_some_and(|v| v.is::<T>())
    }

    /// Take the payload out as a `T`, or get `self` back unchanged.
    pub fn downcast<T: Any>(self) -> Result<T, Self> {
        match self.0 {
            Some(boxed) => match boxed.downcast::<T>() {
                Ok(value) => Ok(*value),
                Err(boxed) => Err(Self(Some(boxed))),
            },
            None => Err(self),
        }
    }

    /// Borrow the payload as a `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0.as_ref().and_then(|v| v.downcast_ref::<T>())
    }

    /// The payload as a `T`, treating empty and mistyped payloads alike.
    pub fn take<T: Any>(self) -> Option<T> {
        self.downcast().ok()
    }
}

impl fmt::Debug for ScreenData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            None => f.write_str("ScreenData(None)"),
            Some(_) => f.write_str("ScreenData(..)"),
        }
    }
}

/// What the host should do after a frame.
pub enum ScreenRunResult {
    /// Stay on this screen.
    Continue,
    /// Stop the program.
    Exit,
    /// Suspend this screen and make the given one active.
    CallAnother(Box<dyn Screen>),
    /// Pop back to the caller, handing it the data.
    ReturnToCaller(ScreenData),
}

impl ScreenRunResult {
    /// `CallAnother` with a freshly boxed screen.
    pub fn call(screen: impl Screen) -> Self {
        Self::CallAnother(Box::new(screen))
    }

    /// `ReturnToCaller` with a value.
    pub fn return_with<T: Any>(value: T) -> Self {
        Self::ReturnToCaller(ScreenData::new(value))
    }

    /// `ReturnToCaller` with no data.
    pub fn return_none() -> Self {
        Self::ReturnToCaller(ScreenData::none())
    }

    pub fn is_continue(&self) -> bool {
        matches!(self, Self::Continue)
    }

    /// Short variant label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Continue => "continue",
            Self::Exit => "exit",
            Self::CallAnother(_) => "call",
            Self::ReturnToCaller(_) => "return",
        }
    }
}

impl fmt::Debug for ScreenRunResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Continue => f.write_str("Continue"),
            Self::Exit => f.write_str("Exit"),
            Self::CallAnother(screen) => f.debug_tuple("CallAnother").field(&screen.name()).finish(),
            Self::ReturnToCaller(data) => f.debug_tuple("ReturnToCaller").field(data).finish(),
        }
    }
}

/// How a coroutine-backed screen finishes.
///
/// Bodies may return plain data (popped back to the caller) or a full
/// [`ScreenRunResult`] (propagated as-is, so a flow can end the program or
/// chain into another call on its way out).
#[derive(Debug)]
pub enum Finish {
    Return(ScreenData),
    Result(ScreenRunResult),
}

impl Finish {
    /// The result the host should apply.
    ///
    /// `Continue` cannot end a flow, so it is turned into an empty return.
    pub fn into_run_result(self) -> ScreenRunResult {
        match self {
            Self::Return(data) => ScreenRunResult::ReturnToCaller(data),
            Self::Result(ScreenRunResult::Continue) => {
                tracing::warn!("coroutine finished with Continue; returning to caller with no data");
                ScreenRunResult::return_none()
            }
            Self::Result(result) => result,
        }
    }
}

impl From<ScreenData> for Finish {
    fn from(data: ScreenData) -> Self {
        Self::Return(data)
    }
}

impl From<ScreenRunResult> for Finish {
    fn from(result: ScreenRunResult) -> Self {
        Self::Result(result)
    }
}

impl From<()> for Finish {
    fn from((): ()) -> Self {
        Self::Return(ScreenData::none())
    }
}

/// One full-surface UI state.
pub trait Screen: 'static {
    /// Label for logs and tests.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// React to one input event. Return `true` if a frame should be drawn soon.
    ///
    /// May be called any number of times between frames.
    fn handle_event(&mut self, event: &InputEvent) -> bool;

    /// Polled once per tick regardless of input. Return `true` to request a frame.
    fn should_render_frame(&mut self) -> bool;

    /// Draw into `surface` and decide what happens next.
    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult;

    /// A child this screen called has returned.
    ///
    /// `from` is the finished child, handed over so the caller can inspect or
    /// keep it. Called exactly once per return, before the next `run_frame`.
    fn receive_data(&mut self, from: Box<dyn Screen>, data: ScreenData) {
        let _ = (from, data);
    }
}

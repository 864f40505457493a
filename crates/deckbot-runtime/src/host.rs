#![forbid(unsafe_code)]

//! The host loop: one active screen, a stack of suspended callers.
//!
//! Embedders drive the host once per tick:
//!
//! ```ignore
//! let mut host = Host::new(MainMenu::new());
//! loop {
//!     host.pump(poll_input());
//!     if host.draw(&mut surface)? == HostState::Exiting {
//!         break;
//!     }
//!     present(&surface);
//! }
//! ```
//!
//! # Transition table
//!
//! | `run_frame` result   | Effect                                              |
//! |----------------------|-----------------------------------------------------|
//! | `Continue`           | none                                                |
//! | `Exit`               | host moves to `Exiting`                             |
//! | `CallAnother(s)`     | push active, `s` becomes active                     |
//! | `ReturnToCaller(d)`  | pop caller, `receive_data`, re-run caller's frame   |
//!
//! `ReturnToCaller` re-applies the table to the caller's immediate frame in a
//! loop, so arbitrarily long chains of screens returning straight through
//! their callers use constant stack depth.
//!
//! # Failure Modes
//!
//! - A root screen returning to a caller that does not exist:
//!   [`HostError::StackUnderflow`]. The host moves to `Exiting`.

use std::fmt;

use deckbot_core::event::InputEvent;
use deckbot_render::Surface;
use tracing::{debug, debug_span, error, info};

use crate::screen::{Screen, ScreenRunResult};

/// Lifecycle of a [`Host`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostState {
    Running,
    Exiting,
}

/// Fatal navigation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostError {
    /// The root screen returned to a caller; the stack was empty.
    StackUnderflow { screen: String },
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StackUnderflow { screen } => {
                write!(f, "screen `{screen}` returned to a caller but the screen stack is empty")
            }
        }
    }
}

impl std::error::Error for HostError {}

/// Owns the active screen and the call stack.
pub struct Host {
    active: Box<dyn Screen>,
    stack: Vec<Box<dyn Screen>>,
    state: HostState,
    frame_due: bool,
}

impl Host {
    /// Start with `root` as the active screen.
    pub fn new(root: impl Screen) -> Self {
        Self::from_boxed(Box::new(root))
    }

    pub fn from_boxed(root: Box<dyn Screen>) -> Self {
        debug!(screen = root.name(), "host started");
        Self {
            active: root,
            stack: Vec::new(),
            state: HostState::Running,
            frame_due: false,
        }
    }

    pub fn state(&self) -> HostState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == HostState::Running
    }

    /// Number of suspended callers below the active screen.
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn active_name(&self) -> &str {
        self.active.name()
    }

    /// Names from the root to the active screen.
    pub fn stack_names(&self) -> Vec<&str> {
        self.stack
            .iter()
            .map(|s| s.name())
            .chain(std::iter::once(self.active.name()))
            .collect()
    }

    /// Whether the last [`pump`](Self::pump) asked for a frame.
    pub fn frame_due(&self) -> bool {
        self.frame_due
    }

    /// Dispatch input to the active screen and poll it for a frame.
    ///
    /// [`InputEvent::Quit`] ends the program without reaching the screen.
    pub fn pump<I>(&mut self, events: I) -> HostState
    where
        I: IntoIterator<Item = InputEvent>,
    {
        if self.state == HostState::Exiting {
            return self.state;
        }
        for event in events {
            if matches!(event, InputEvent::Quit) {
                info!(screen = self.active.name(), "quit requested");
                self.state = HostState::Exiting;
                return self.state;
            }
            if self.active.handle_event(&event) {
                self.frame_due = true;
            }
        }
        if self.active.should_render_frame() {
            self.frame_due = true;
        }
        self.state
    }

    /// Run the active screen's frame if one is due and apply the result.
    pub fn draw(&mut self, surface: &mut Surface) -> Result<HostState, HostError> {
        if self.state == HostState::Exiting || !self.frame_due {
            return Ok(self.state);
        }
        self.frame_due = false;

        let _span = debug_span!("deckbot.host.draw", screen = self.active.name()).entered();
        let mut result = self.active.run_frame(surface);
        loop {
            match result {
                ScreenRunResult::Continue => break,
                ScreenRunResult::Exit => {
                    info!(screen = self.active.name(), "exit requested");
                    self.state = HostState::Exiting;
                    break;
                }
                ScreenRunResult::CallAnother(next) => {
                    let caller = std::mem::replace(&mut self.active, next);
                    self.stack.push(caller);
                    debug!(
                        screen = self.active.name(),
                        depth = self.stack.len(),
                        "called screen"
                    );
                    break;
                }
                ScreenRunResult::ReturnToCaller(data) => {
                    let Some(caller) = self.stack.pop() else {
                        let screen = self.active.name().to_string();
                        error!(%screen, "return with an empty screen stack");
                        self.state = HostState::Exiting;
                        return Err(HostError::StackUnderflow { screen });
                    };
                    let finished = std::mem::replace(&mut self.active, caller);
                    debug!(
                        from = finished.name(),
                        to = self.active.name(),
                        depth = self.stack.len(),
                        "returned to caller"
                    );
                    self.active.receive_data(finished, data);
                    result = self.active.run_frame(surface);
                }
            }
        }
        Ok(self.state)
    }

    /// [`pump`](Self::pump) then [`draw`](Self::draw).
    pub fn tick<I>(&mut self, events: I, surface: &mut Surface) -> Result<HostState, HostError>
    where
        I: IntoIterator<Item = InputEvent>,
    {
        self.pump(events);
        self.draw(surface)
    }
}

impl fmt::Debug for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Host")
            .field("stack", &self.stack_names())
            .field("state", &self.state)
            .field("frame_due", &self.frame_due)
            .finish()
    }
}

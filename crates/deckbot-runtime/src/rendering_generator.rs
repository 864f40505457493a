#![forbid(unsafe_code)]

//! Coroutine-backed screens that draw their own frames.
//!
//! A [`RenderingGeneratorScreen`] runs an `async` body that owns the whole
//! screen lifecycle: it sees input, decides when to draw, draws, and may call
//! sub-screens mid-flow. The body talks to the adapter through [`RenderCo`]:
//!
//! ```
//! use deckbot_runtime::rendering_generator::RenderingGeneratorScreen;
//! use deckbot_runtime::screen::ScreenData;
//! use deckbot_core::event::Button;
//! use deckbot_render::Rgb;
//!
//! let screen = RenderingGeneratorScreen::new("hello", |co| async move {
//!     co.handshake().await;
//!     loop {
//!         let events = co.render(|s| {
//!             s.fill(Rgb::BLACK);
//!             s.draw_text(0, 0, "Press B", Rgb::WHITE, Rgb::BLACK);
//!         }).await;
//!         if events.iter().any(|e| e.is_button_down(Button::B)) {
//!             return ScreenData::none();
//!         }
//!     }
//! });
//! assert!(screen.is_ok());
//! ```
//!
//! # Protocol
//!
//! The body yields [`Signal`]s and is resumed with [`Wake`]s:
//!
//! | Body yields              | Adapter answers with            |
//! |--------------------------|---------------------------------|
//! | `SupportsRendering`      | `Ack` (once, at construction)   |
//! | `Ignore`                 | `Opportunity(events)` next poll |
//! | `WantToRender`           | `Surface` on the next frame     |
//! | `Frame(surface)`         | `Opportunity(events)` next poll |
//! | `Call(screen)`           | `Returned(data)` from the child |
//!
//! Every `should_render_frame` poll resumes the body once with the events
//! buffered by `handle_event` since the previous poll. The body's reply to the
//! handshake acknowledgement stands in for the first poll's reply, so the
//! first poll does not resume the body.
//!
//! # Invariants
//!
//! 1. At most one pending action exists between a poll and the next
//!    `run_frame`. One that survives into the next poll is a protocol bug,
//!    logged at `warn` and discarded.
//! 2. Each buffered event reaches the body exactly once, in arrival order.
//! 3. The surface is moved into the body only for the duration of a draw and
//!    always handed back with the frame.
//! 4. Once the body returns, every entry point surfaces the result: polls and
//!    `handle_event` answer `true`, the next `run_frame` returns it.
//!
//! # Failure Modes
//!
//! - `run_frame` with nothing pending: `warn`, the last frame stays visible.
//! - The body awaiting a foreign future: fatal (logged, then panic).

use std::fmt;
use std::future::Future;

use deckbot_core::event::InputEvent;
use deckbot_render::Surface;
use tracing::{debug, error, warn};

use crate::coroutine::{Coroutine, CoroutineError, CoroutineState, Suspender};
use crate::screen::{Finish, Screen, ScreenData, ScreenRunResult};

/// Protocol version announced by [`RenderCo::handshake`].
pub const PROTOCOL_VERSION: u32 = 1;

/// What a rendering body hands to the adapter.
pub enum Signal {
    /// Handshake; must be the first thing a body yields.
    SupportsRendering { version: u32 },
    /// Lend me the surface on the next frame.
    WantToRender,
    /// Nothing to draw this poll.
    Ignore,
    /// Run a child screen and give me its result.
    Call(Box<dyn Screen>),
    /// The surface, drawn.
    Frame(Surface),
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SupportsRendering { version } => {
                f.debug_struct("SupportsRendering").field("version", version).finish()
            }
            Self::WantToRender => f.write_str("WantToRender"),
            Self::Ignore => f.write_str("Ignore"),
            Self::Call(screen) => f.debug_tuple("Call").field(&screen.name()).finish(),
            Self::Frame(_) => f.write_str("Frame(..)"),
        }
    }
}

/// What the adapter hands back to a rendering body.
#[derive(Debug)]
pub enum Wake {
    /// Handshake accepted.
    Ack,
    /// A poll, with the events received since the previous one.
    Opportunity(Vec<InputEvent>),
    /// The surface to draw into.
    Surface(Surface),
    /// A called child returned.
    Returned(ScreenData),
}

impl Wake {
    fn label(&self) -> &'static str {
        match self {
            Self::Ack => "ack",
            Self::Opportunity(_) => "opportunity",
            Self::Surface(_) => "surface",
            Self::Returned(_) => "returned",
        }
    }
}

/// Construction failure of a [`RenderingGeneratorScreen`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandshakeError {
    /// The body's first yield was not a handshake.
    MissingHandshake,
    /// The body speaks a protocol version this adapter does not.
    UnsupportedVersion { found: u32, expected: u32 },
    /// The body returned before the handshake completed.
    Finished,
    /// The coroutine machinery failed.
    Coroutine(CoroutineError),
}

impl fmt::Display for HandshakeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingHandshake => write!(f, "rendering body did not open with a handshake"),
            Self::UnsupportedVersion { found, expected } => {
                write!(f, "rendering protocol version {found} not supported (expected {expected})")
            }
            Self::Finished => write!(f, "rendering body finished before the handshake"),
            Self::Coroutine(err) => write!(f, "rendering body failed: {err}"),
        }
    }
}

impl std::error::Error for HandshakeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Coroutine(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CoroutineError> for HandshakeError {
    fn from(err: CoroutineError) -> Self {
        Self::Coroutine(err)
    }
}

/// Handle a rendering body uses to talk to its adapter.
pub struct RenderCo {
    suspender: Suspender<Signal, Wake>,
}

impl RenderCo {
    /// Announce rendering support. Must be awaited before anything else.
    pub async fn handshake(&self) {
        let wake = self
            .suspender
            .suspend(Signal::SupportsRendering {
                version: PROTOCOL_VERSION,
            })
            .await;
        if !matches!(wake, Wake::Ack) {
            warn!(got = wake.label(), "handshake answered with something other than ack");
        }
    }

    /// Skip this poll; resolves to the events of the next one.
    pub async fn ignore(&self) -> Vec<InputEvent> {
        let wake = self.suspender.suspend(Signal::Ignore).await;
        self.events_from(wake)
    }

    /// Draw a frame with `draw`; resolves to the events of the next poll.
    ///
    /// If the host skips the frame, `draw` is not called and the events of
    /// the next poll are returned straight away.
    pub async fn render(&self, draw: impl FnOnce(&mut Surface)) -> Vec<InputEvent> {
        let mut surface = match self.suspender.suspend(Signal::WantToRender).await {
            Wake::Surface(surface) => surface,
            Wake::Opportunity(events) => return events,
            other => return self.events_from(other),
        };
        draw(&mut surface);
        let wake = self.suspender.suspend(Signal::Frame(surface)).await;
        self.events_from(wake)
    }

    /// Run `screen` as a child and wait for what it returns.
    pub async fn call(&self, screen: impl Screen) -> ScreenData {
        self.call_boxed(Box::new(screen)).await
    }

    /// [`call`](Self::call) for an already boxed screen.
    pub async fn call_boxed(&self, screen: Box<dyn Screen>) -> ScreenData {
        match self.suspender.suspend(Signal::Call(screen)).await {
            Wake::Returned(data) => data,
            other => {
                warn!(got = other.label(), "call answered without a child result");
                ScreenData::none()
            }
        }
    }

    fn events_from(&self, wake: Wake) -> Vec<InputEvent> {
        match wake {
            Wake::Opportunity(events) => events,
            other => {
                warn!(got = other.label(), "expected a poll opportunity");
                Vec::new()
            }
        }
    }
}

#[derive(Debug, Default)]
enum Pending {
    #[default]
    None,
    SendDisplay,
    ReturnStored(ScreenRunResult),
}

type Step = Result<CoroutineState<Signal, Finish>, CoroutineError>;

/// Adapter turning a rendering body into a [`Screen`].
pub struct RenderingGeneratorScreen {
    name: String,
    co: Coroutine<Signal, Wake, Finish>,
    pending: Pending,
    events: Vec<InputEvent>,
    bail_with: Option<ScreenRunResult>,
    primed: bool,
}

impl RenderingGeneratorScreen {
    /// Build the screen, run the handshake, and take the body's first reply.
    pub fn new<F, Fut, T>(name: impl Into<String>, body: F) -> Result<Self, HandshakeError>
    where
        F: FnOnce(RenderCo) -> Fut,
        Fut: Future<Output = T> + 'static,
        T: Into<Finish>,
    {
        let name = name.into();
        let mut co = Coroutine::new(move |suspender| {
            let fut = body(RenderCo { suspender });
            async move {
                let finish: Finish = fut.await.into();
                finish
            }
        });

        match co.start()? {
            CoroutineState::Yielded(Signal::SupportsRendering { version }) => {
                if version != PROTOCOL_VERSION {
                    return Err(HandshakeError::UnsupportedVersion {
                        found: version,
                        expected: PROTOCOL_VERSION,
                    });
                }
            }
            CoroutineState::Yielded(_) => return Err(HandshakeError::MissingHandshake),
            CoroutineState::Complete(_) => return Err(HandshakeError::Finished),
        }

        let first = co.resume(Wake::Ack)?;
        let mut screen = Self {
            name,
            co,
            pending: Pending::None,
            events: Vec::new(),
            bail_with: None,
            primed: true,
        };
        screen.absorb(Ok(first), false);
        debug!(screen = %screen.name, pending = ?screen.pending, "rendering screen ready");
        Ok(screen)
    }

    /// Whether the body has returned.
    pub fn is_finished(&self) -> bool {
        self.co.is_finished()
    }

    /// Record the body's reply. Returns whether the host should run a frame.
    fn absorb(&mut self, step: Step, after_return: bool) -> bool {
        match step {
            Ok(CoroutineState::Yielded(Signal::WantToRender)) => {
                self.pending = Pending::SendDisplay;
                true
            }
            Ok(CoroutineState::Yielded(Signal::Ignore)) => {
                if after_return {
                    self.pending = Pending::ReturnStored(ScreenRunResult::Continue);
                    true
                } else {
                    false
                }
            }
            Ok(CoroutineState::Yielded(Signal::Call(child))) => {
                debug!(screen = %self.name, child = child.name(), "rendering screen calls child");
                self.pending = Pending::ReturnStored(ScreenRunResult::CallAnother(child));
                true
            }
            Ok(CoroutineState::Yielded(signal)) => {
                self.fatal(&format!("unexpected {signal:?} outside a draw"))
            }
            Ok(CoroutineState::Complete(finish)) => {
                let result = finish.into_run_result();
                debug!(screen = %self.name, result = result.kind(), "rendering body finished");
                self.bail_with = Some(result);
                true
            }
            Err(err) => self.fatal(&err.to_string()),
        }
    }

    fn resume(&mut self, wake: Wake) -> Step {
        self.co.resume(wake)
    }

    fn fatal(&self, what: &str) -> ! {
        error!(screen = %self.name, what, "rendering body failed");
        panic!("rendering screen `{}`: {what}", self.name);
    }

    fn discard_stale_pending(&mut self) {
        if !matches!(self.pending, Pending::None) {
            warn!(
                screen = %self.name,
                pending = ?self.pending,
                "protocol violation: pending action survived a full cycle; discarding"
            );
            self.pending = Pending::None;
        }
    }
}

impl Screen for RenderingGeneratorScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_event(&mut self, event: &InputEvent) -> bool {
        if self.bail_with.is_some() {
            return true;
        }
        self.events.push(event.clone());
        false
    }

    fn should_render_frame(&mut self) -> bool {
        if self.bail_with.is_some() {
            return true;
        }
        if self.primed {
            self.primed = false;
            return !matches!(self.pending, Pending::None);
        }
        self.discard_stale_pending();
        let events = std::mem::take(&mut self.events);
        let step = self.resume(Wake::Opportunity(events));
        self.absorb(step, false)
    }

    fn run_frame(&mut self, surface: &mut Surface) -> ScreenRunResult {
        if let Some(result) = self.bail_with.take() {
            return result;
        }
        match std::mem::take(&mut self.pending) {
            Pending::None => {
                warn!(screen = %self.name, "protocol violation: run_frame with nothing pending");
                ScreenRunResult::Continue
            }
            Pending::ReturnStored(result) => result,
            Pending::SendDisplay => {
                let lent = std::mem::take(surface);
                match self.resume(Wake::Surface(lent)) {
                    Ok(CoroutineState::Yielded(Signal::Frame(drawn))) => {
                        *surface = drawn;
                        ScreenRunResult::Continue
                    }
                    Ok(CoroutineState::Yielded(signal)) => {
                        self.fatal(&format!("drew nothing and yielded {signal:?}"))
                    }
                    Ok(CoroutineState::Complete(_)) => self.fatal("finished while holding the surface"),
                    Err(err) => self.fatal(&err.to_string()),
                }
            }
        }
    }

    fn receive_data(&mut self, from: Box<dyn Screen>, data: ScreenData) {
        if self.bail_with.is_some() {
            warn!(screen = %self.name, from = from.name(), "child returned to a finished body");
            return;
        }
        if self.co.is_finished() {
            // The body ended by calling `from`; its answer is ours.
            debug!(screen = %self.name, from = from.name(), "forwarding tail call result");
            self.pending = Pending::None;
            self.bail_with = Some(ScreenRunResult::ReturnToCaller(data));
            return;
        }
        debug!(screen = %self.name, from = from.name(), "rendering screen resumed");
        self.discard_stale_pending();
        let step = self.resume(Wake::Returned(data));
        self.absorb(step, true);
    }
}

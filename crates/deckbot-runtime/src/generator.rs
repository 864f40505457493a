#![forbid(unsafe_code)]

//! Screens written as straight-line flows over sub-screens.
//!
//! A [`GeneratorScreen`] runs an `async` body that "calls" other screens as
//! if they were functions:
//!
//! ```
//! use deckbot_runtime::generator::GeneratorScreen;
//! use deckbot_runtime::screen::ScreenData;
//! # use deckbot_runtime::screen::{Screen, ScreenRunResult};
//! # use deckbot_core::event::InputEvent;
//! # use deckbot_render::Surface;
//! # struct Prompt(&'static str);
//! # impl Screen for Prompt {
//! #     fn handle_event(&mut self, _: &InputEvent) -> bool { false }
//! #     fn should_render_frame(&mut self) -> bool { false }
//! #     fn run_frame(&mut self, _: &mut Surface) -> ScreenRunResult { ScreenRunResult::Continue }
//! # }
//!
//! let flow = GeneratorScreen::new("add server", |co| async move {
//!     let Some(name) = co.call(Prompt("Name")).await.take::<String>() else {
//!         return ScreenData::none();
//!     };
//!     let Some(address) = co.call(Prompt("Address")).await.take::<String>() else {
//!         return ScreenData::none();
//!     };
//!     ScreenData::new((name, address))
//! });
//! ```
//!
//! The screen itself never draws. Each `call` becomes a
//! [`ScreenRunResult::CallAnother`]; the child's return value is delivered
//! through [`Screen::receive_data`], which resumes the body up to its next
//! call (or completion). `run_frame` only replays that captured decision.
//!
//! # Failure Modes
//!
//! - `run_frame` twice without an intervening `receive_data`: logged at
//!   `error`, debug-asserted, answered with `Continue`.
//! - The body awaiting a foreign future, or being resumed after completion:
//!   fatal. The adapter logs and panics.

use std::future::Future;

use deckbot_core::event::InputEvent;
use deckbot_render::Surface;
use tracing::{debug, error};

use crate::coroutine::{Coroutine, CoroutineError, CoroutineState, Suspender};
use crate::screen::{Finish, Screen, ScreenData, ScreenRunResult};

/// Handle a generator body uses to call sub-screens.
pub struct ScreenCaller {
    suspender: Suspender<Box<dyn Screen>, ScreenData>,
}

impl ScreenCaller {
    /// Run `screen` as a child and wait for what it returns.
    pub async fn call(&self, screen: impl Screen) -> ScreenData {
        self.call_boxed(Box::new(screen)).await
    }

    /// [`call`](Self::call) for an already boxed screen.
    pub async fn call_boxed(&self, screen: Box<dyn Screen>) -> ScreenData {
        self.suspender.suspend(screen).await
    }
}

type Step = Result<CoroutineState<Box<dyn Screen>, Finish>, CoroutineError>;

/// Adapter turning a flow body into a [`Screen`].
pub struct GeneratorScreen {
    name: String,
    co: Coroutine<Box<dyn Screen>, ScreenData, Finish>,
    decision: Option<ScreenRunResult>,
}

impl GeneratorScreen {
    /// Build the screen and run `body` to its first call.
    ///
    /// The body may finish with `()`, [`ScreenData`], or a
    /// [`ScreenRunResult`] (see [`Finish`]).
    pub fn new<F, Fut, T>(name: impl Into<String>, body: F) -> Self
    where
        F: FnOnce(ScreenCaller) -> Fut,
        Fut: Future<Output = T> + 'static,
        T: Into<Finish>,
    {
        let co = Coroutine::new(move |suspender| {
            let fut = body(ScreenCaller { suspender });
            async move {
                let finish: Finish = fut.await.into();
                finish
            }
        });
        let mut screen = Self {
            name: name.into(),
            co,
            decision: None,
        };
        let step = screen.co.start();
        screen.capture(step);
        screen
    }

    /// Whether the body has returned.
    pub fn is_finished(&self) -> bool {
        self.co.is_finished()
    }

    fn capture(&mut self, step: Step) {
        match step {
            Ok(CoroutineState::Yielded(child)) => {
                debug!(screen = %self.name, child = child.name(), "generator calls child");
                self.decision = Some(ScreenRunResult::CallAnother(child));
            }
            Ok(CoroutineState::Complete(finish)) => {
                let result = finish.into_run_result();
                debug!(screen = %self.name, result = result.kind(), "generator finished");
                self.decision = Some(result);
            }
            Err(err) => {
                error!(screen = %self.name, %err, "generator body failed");
                panic!("generator screen `{}`: {err}", self.name);
            }
        }
    }
}

impl Screen for GeneratorScreen {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        false
    }

    fn should_render_frame(&mut self) -> bool {
        true
    }

    fn run_frame(&mut self, _surface: &mut Surface) -> ScreenRunResult {
        match self.decision.take() {
            Some(decision) => decision,
            None => {
                error!(screen = %self.name, "run_frame replayed without new data from a child");
                debug_assert!(false, "generator screen `{}` ran a frame twice", self.name);
                ScreenRunResult::Continue
            }
        }
    }

    fn receive_data(&mut self, from: Box<dyn Screen>, data: ScreenData) {
        if self.co.is_finished() {
            // The body ended by calling `from`; its answer is ours.
            debug!(screen = %self.name, from = from.name(), "forwarding tail call result");
            self.decision = Some(ScreenRunResult::ReturnToCaller(data));
            return;
        }
        debug!(screen = %self.name, from = from.name(), "generator resumed");
        let step = self.co.resume(data);
        self.capture(step);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf(&'static str);

    impl Screen for Leaf {
        fn name(&self) -> &str {
            self.0
        }
        fn handle_event(&mut self, _event: &InputEvent) -> bool {
            false
        }
        fn should_render_frame(&mut self) -> bool {
            false
        }
        fn run_frame(&mut self, _surface: &mut Surface) -> ScreenRunResult {
            ScreenRunResult::Continue
        }
    }

    fn expect_call(result: ScreenRunResult, name: &str) {
        match result {
            ScreenRunResult::CallAnother(screen) => assert_eq!(screen.name(), name),
            other => panic!("expected call to {name}, got {other:?}"),
        }
    }

    #[test]
    fn first_call_is_captured_at_construction() {
        let mut screen = GeneratorScreen::new("flow", |co| async move {
            co.call(Leaf("first")).await;
        });
        assert!(screen.should_render_frame());
        assert!(!screen.handle_event(&InputEvent::Quit));
        expect_call(screen.run_frame(&mut Surface::default()), "first");
    }

    #[test]
    fn data_flows_into_the_body() {
        let mut screen = GeneratorScreen::new("adder", |co| async move {
            let a = co.call(Leaf("a")).await.take::<u32>().unwrap_or(0);
            let b = co.call(Leaf("b")).await.take::<u32>().unwrap_or(0);
            ScreenData::new(a + b)
        });
        let mut surface = Surface::default();
        expect_call(screen.run_frame(&mut surface), "a");
        screen.receive_data(Box::new(Leaf("a")), ScreenData::new(2u32));
        expect_call(screen.run_frame(&mut surface), "b");
        screen.receive_data(Box::new(Leaf("b")), ScreenData::new(3u32));
        assert!(screen.is_finished());
        match screen.run_frame(&mut surface) {
            ScreenRunResult::ReturnToCaller(data) => assert_eq!(data.take::<u32>(), Some(5)),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn immediate_completion_returns_on_first_frame() {
        let mut screen = GeneratorScreen::new("empty", |_co| async {});
        assert!(matches!(
            screen.run_frame(&mut Surface::default()),
            ScreenRunResult::ReturnToCaller(d) if d.is_none()
        ));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "ran a frame twice")]
    fn replay_without_data_asserts() {
        let mut screen = GeneratorScreen::new("flow", |co| async move {
            co.call(Leaf("only")).await;
        });
        let mut surface = Surface::default();
        let _ = screen.run_frame(&mut surface);
        let _ = screen.run_frame(&mut surface);
    }

    #[test]
    #[should_panic(expected = "generator screen `stuck`")]
    fn stalled_body_is_fatal() {
        let _ = GeneratorScreen::new("stuck", |_co| async {
            std::future::pending::<()>().await;
        });
    }
}

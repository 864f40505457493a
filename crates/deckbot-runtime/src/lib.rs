#![forbid(unsafe_code)]

//! Screen navigation runtime.
//!
//! - [`screen`]: the [`Screen`] contract and navigation results.
//! - [`host`]: the [`Host`] loop owning the active screen and call stack.
//! - [`coroutine`]: single-step executor for `async` bodies.
//! - [`generator`]: flows that call sub-screens like functions.
//! - [`rendering_generator`]: flows that also draw their own frames.
//! - [`simulator`]: headless driver for tests.

pub mod coroutine;
pub mod generator;
pub mod host;
pub mod rendering_generator;
pub mod screen;
pub mod simulator;

pub use coroutine::{Coroutine, CoroutineError, CoroutineState, Suspender};
pub use generator::{GeneratorScreen, ScreenCaller};
pub use host::{Host, HostError, HostState};
pub use rendering_generator::{HandshakeError, RenderCo, RenderingGeneratorScreen};
pub use screen::{Finish, Screen, ScreenData, ScreenRunResult};
pub use simulator::HostSimulator;

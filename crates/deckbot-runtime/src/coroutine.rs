#![forbid(unsafe_code)]

//! Single-step executor for `async` bodies used as coroutines.
//!
//! A [`Coroutine`] wraps a future built from a closure that receives a
//! [`Suspender`]. Each `suspender.suspend(value).await` inside the body hands
//! `value` out to whoever is driving the coroutine and parks the body until
//! [`Coroutine::resume`] supplies the reply.
//!
//! The body is polled with a no-op waker, exactly once per `start`/`resume`.
//! Nothing else ever wakes it: a body that awaits any future other than a
//! [`Suspend`] stalls, and the executor reports that as
//! [`CoroutineError::Stalled`] instead of hanging.
//!
//! # Invariants
//!
//! 1. Outside of `start`/`resume` the body is parked at a `suspend` point or
//!    finished. It is never observed mid-step.
//! 2. The airlock slot holds at most one value: the yielded value on the way
//!    out, the reply on the way in.
//! 3. After `Complete` or an error the body is dropped; further resumes
//!    return [`CoroutineError::Finished`].
//!
//! # Example
//!
//! ```
//! use deckbot_runtime::coroutine::{Coroutine, CoroutineState};
//!
//! let mut co = Coroutine::new(|s| async move {
//!     let a: u32 = s.suspend("first").await;
//!     let b: u32 = s.suspend("second").await;
//!     a + b
//! });
//!
//! assert!(matches!(co.start(), Ok(CoroutineState::Yielded("first"))));
//! assert!(matches!(co.resume(1), Ok(CoroutineState::Yielded("second"))));
//! assert!(matches!(co.resume(2), Ok(CoroutineState::Complete(3))));
//! ```

use std::cell::RefCell;
use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use std::task::{Context, Poll, Waker};

enum Slot<Y, R> {
    Empty,
    Yielded(Y),
    Resumed(R),
}

type SharedSlot<Y, R> = Rc<RefCell<Slot<Y, R>>>;

/// Handle a coroutine body uses to yield values and receive replies.
pub struct Suspender<Y, R> {
    slot: SharedSlot<Y, R>,
}

impl<Y, R> Clone for Suspender<Y, R> {
    fn clone(&self) -> Self {
        Self {
            slot: Rc::clone(&self.slot),
        }
    }
}

impl<Y, R> Suspender<Y, R> {
    /// Yield `value` to the driver; resolves to the driver's reply.
    pub fn suspend(&self, value: Y) -> Suspend<Y, R> {
        Suspend {
            slot: Rc::clone(&self.slot),
            value: Some(value),
        }
    }
}

/// Future returned by [`Suspender::suspend`].
#[must_use = "a suspend point does nothing unless awaited"]
pub struct Suspend<Y, R> {
    slot: SharedSlot<Y, R>,
    value: Option<Y>,
}

impl<Y, R> Unpin for Suspend<Y, R> {}

impl<Y, R> Future for Suspend<Y, R> {
    type Output = R;

    fn poll(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<R> {
        let this = self.get_mut();
        let mut slot = this.slot.borrow_mut();
        if let Some(value) = this.value.take() {
            *slot = Slot::Yielded(value);
            return Poll::Pending;
        }
        match std::mem::replace(&mut *slot, Slot::Empty) {
            Slot::Resumed(reply) => Poll::Ready(reply),
            other => {
                *slot = other;
                Poll::Pending
            }
        }
    }
}

/// Outcome of one coroutine step.
#[derive(Debug, PartialEq)]
pub enum CoroutineState<Y, O> {
    /// The body suspended with a value.
    Yielded(Y),
    /// The body returned.
    Complete(O),
}

/// Misuse of a [`Coroutine`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoroutineError {
    /// `resume` before `start`.
    NotStarted,
    /// `start` called twice.
    AlreadyStarted,
    /// The body already completed, stalled, or was abandoned.
    Finished,
    /// The body awaited something other than a suspend point.
    Stalled,
}

impl fmt::Display for CoroutineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotStarted => write!(f, "coroutine resumed before it was started"),
            Self::AlreadyStarted => write!(f, "coroutine started twice"),
            Self::Finished => write!(f, "coroutine already finished"),
            Self::Stalled => write!(f, "coroutine awaited a future that is not a suspend point"),
        }
    }
}

impl std::error::Error for CoroutineError {}

/// A resumable computation yielding `Y`, receiving `R`, returning `O`.
pub struct Coroutine<Y, R, O> {
    slot: SharedSlot<Y, R>,
    body: Option<Pin<Box<dyn Future<Output = O>>>>,
    started: bool,
}

impl<Y: 'static, R: 'static, O: 'static> Coroutine<Y, R, O> {
    /// Build a coroutine. The body does not run until [`start`](Self::start).
    pub fn new<F, Fut>(body: F) -> Self
    where
        F: FnOnce(Suspender<Y, R>) -> Fut,
        Fut: Future<Output = O> + 'static,
    {
        let slot: SharedSlot<Y, R> = Rc::new(RefCell::new(Slot::Empty));
        let suspender = Suspender {
            slot: Rc::clone(&slot),
        };
        Self {
            slot,
            body: Some(Box::pin(body(suspender))),
            started: false,
        }
    }

    /// Run the body up to its first suspension.
    pub fn start(&mut self) -> Result<CoroutineState<Y, O>, CoroutineError> {
        if self.started {
            return Err(CoroutineError::AlreadyStarted);
        }
        self.started = true;
        self.step()
    }

    /// Deliver `reply` to the pending suspension and run to the next one.
    pub fn resume(&mut self, reply: R) -> Result<CoroutineState<Y, O>, CoroutineError> {
        if !self.started {
            return Err(CoroutineError::NotStarted);
        }
        if self.body.is_none() {
            return Err(CoroutineError::Finished);
        }
        *self.slot.borrow_mut() = Slot::Resumed(reply);
        self.step()
    }

    /// Whether `start` has been called.
    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Whether the body has completed (or was dropped after an error).
    pub fn is_finished(&self) -> bool {
        self.started && self.body.is_none()
    }

    fn step(&mut self) -> Result<CoroutineState<Y, O>, CoroutineError> {
        let Some(body) = self.body.as_mut() else {
            return Err(CoroutineError::Finished);
        };
        let mut cx = Context::from_waker(Waker::noop());
        let polled = body.as_mut().poll(&mut cx);
        let slot = std::mem::replace(&mut *self.slot.borrow_mut(), Slot::Empty);
        match polled {
            Poll::Ready(output) => {
                self.body = None;
                Ok(CoroutineState::Complete(output))
            }
            Poll::Pending => match slot {
                Slot::Yielded(value) => Ok(CoroutineState::Yielded(value)),
                Slot::Empty | Slot::Resumed(_) => {
                    self.body = None;
                    Err(CoroutineError::Stalled)
                }
            },
        }
    }
}

impl<Y, R, O> fmt::Debug for Coroutine<Y, R, O> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Coroutine")
            .field("started", &self.started)
            .field("finished", &(self.started && self.body.is_none()))
            .finish()
    }
}

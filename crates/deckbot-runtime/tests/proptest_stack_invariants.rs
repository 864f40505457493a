//! Property-based invariant tests for host navigation.
//!
//! 1. After any sequence of calls and returns, the host's stack matches a
//!    reference LIFO simulation.
//! 2. Every return delivers its data to the screen directly below the
//!    returning one, naming the returning screen as the sender.
//! 3. Long chains of immediate returns unwind in a single draw without
//!    growing the call stack.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use deckbot_core::event::InputEvent;
use deckbot_render::Surface;
use deckbot_runtime::host::{Host, HostState};
use deckbot_runtime::screen::{Screen, ScreenData, ScreenRunResult};
use proptest::prelude::*;

// ── Scripted screens ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Op {
    Call,
    Return(u32),
}

#[derive(Default)]
struct Shared {
    next: Option<Op>,
    next_id: usize,
    received: Vec<(usize, String, Option<u32>)>,
}

struct Node {
    id: usize,
    name: String,
    shared: Rc<RefCell<Shared>>,
}

impl Node {
    fn new(id: usize, shared: &Rc<RefCell<Shared>>) -> Self {
        Self {
            id,
            name: node_name(id),
            shared: Rc::clone(shared),
        }
    }
}

fn node_name(id: usize) -> String {
    format!("n{id}")
}

impl Screen for Node {
    fn name(&self) -> &str {
        &self.name
    }

    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        false
    }

    fn should_render_frame(&mut self) -> bool {
        self.shared.borrow().next.is_some()
    }

    fn run_frame(&mut self, _surface: &mut Surface) -> ScreenRunResult {
        let op = self.shared.borrow_mut().next.take();
        match op {
            Some(Op::Call) => {
                let id = {
                    let mut shared = self.shared.borrow_mut();
                    shared.next_id += 1;
                    shared.next_id
                };
                ScreenRunResult::call(Node::new(id, &self.shared))
            }
            Some(Op::Return(value)) => ScreenRunResult::return_with(value),
            None => ScreenRunResult::Continue,
        }
    }

    fn receive_data(&mut self, from: Box<dyn Screen>, data: ScreenData) {
        self.shared
            .borrow_mut()
            .received
            .push((self.id, from.name().to_string(), data.take::<u32>()));
    }
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![Just(Op::Call), any::<u32>().prop_map(Op::Return)]
}

// ═════════════════════════════════════════════════════════════════════════
// 1-2. Host stack matches a reference LIFO
// ═════════════════════════════════════════════════════════════════════════

proptest! {
    #[test]
    fn stack_matches_reference_lifo(ops in proptest::collection::vec(op_strategy(), 0..80)) {
        let shared: Rc<RefCell<Shared>> = Rc::default();
        let mut host = Host::new(Node::new(0, &shared));
        let mut surface = Surface::default();
        let mut model: Vec<usize> = vec![0];
        let mut next_id = 0usize;

        for op in ops {
            if matches!(op, Op::Return(_)) && model.len() == 1 {
                continue;
            }
            shared.borrow_mut().next = Some(op);
            prop_assert_eq!(host.tick([], &mut surface), Ok(HostState::Running));

            match op {
                Op::Call => {
                    next_id += 1;
                    model.push(next_id);
                }
                Op::Return(value) => {
                    let child = model.pop().unwrap();
                    let caller = *model.last().unwrap();
                    let last = shared.borrow().received.last().cloned();
                    prop_assert_eq!(last, Some((caller, node_name(child), Some(value))));
                }
            }

            let expected: Vec<String> = model.iter().map(|&id| node_name(id)).collect();
            prop_assert_eq!(host.stack_names(), expected);
            prop_assert_eq!(host.depth(), model.len() - 1);
        }
    }
}

// ═════════════════════════════════════════════════════════════════════════
// 3. Chained immediate returns
// ═════════════════════════════════════════════════════════════════════════

/// Calls one deeper link until `remaining` hits zero; bounces returns upward.
struct Link {
    remaining: usize,
    called: bool,
    bounce: Option<u32>,
    root_result: Option<Rc<Cell<Option<u32>>>>,
}

impl Screen for Link {
    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        false
    }

    fn should_render_frame(&mut self) -> bool {
        true
    }

    fn run_frame(&mut self, _surface: &mut Surface) -> ScreenRunResult {
        if let Some(value) = self.bounce.take() {
            return ScreenRunResult::return_with(value + 1);
        }
        if self.remaining == 0 {
            return ScreenRunResult::return_with(0u32);
        }
        if !self.called {
            self.called = true;
            return ScreenRunResult::call(Link {
                remaining: self.remaining - 1,
                called: false,
                bounce: None,
                root_result: None,
            });
        }
        ScreenRunResult::Continue
    }

    fn receive_data(&mut self, _from: Box<dyn Screen>, data: ScreenData) {
        let value = data.take::<u32>();
        match &self.root_result {
            Some(slot) => slot.set(value),
            None => self.bounce = value,
        }
    }
}

#[test]
fn deep_return_chain_unwinds_in_one_draw() {
    const DEPTH: usize = 10_000;
    let result = Rc::new(Cell::new(None));
    let mut host = Host::new(Link {
        remaining: DEPTH,
        called: false,
        bounce: None,
        root_result: Some(Rc::clone(&result)),
    });
    let mut surface = Surface::default();

    for _ in 0..DEPTH {
        host.tick([], &mut surface).unwrap();
    }
    assert_eq!(host.depth(), DEPTH);
    assert_eq!(result.get(), None);

    host.tick([], &mut surface).unwrap();
    assert_eq!(host.depth(), 0);
    assert_eq!(result.get(), Some(DEPTH as u32 - 1));
}

//! Connecting, teleop hand-over and failure display.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use deckbot_core::clock::{ClockHandle, DeterministicClock};
use deckbot_core::event::{Axis, Button, InputEvent};
use deckbot_render::Surface;
use deckbot_runtime::screen::{Screen, ScreenData, ScreenRunResult};
use deckbot_runtime::simulator::HostSimulator;
use deckbot_screens::connect::connect_session;
use deckbot_screens::link::{DriveCommand, LinkError, LinkState, LinkStatus, RobotLink};
use deckbot_screens::main_menu::{AppContext, LinkFactory, main_menu};
use deckbot_screens::servers::{MemoryDirectory, Server, ServerDirectory};

// ============================================================================
// Helpers
// ============================================================================

/// Link whose state the test sets by hand.
struct ScriptedLink {
    state: RefCell<LinkState>,
    sent: RefCell<Vec<DriveCommand>>,
    closed: Cell<bool>,
}

impl ScriptedLink {
    fn new(state: LinkState) -> Rc<Self> {
        Rc::new(Self {
            state: RefCell::new(state),
            sent: RefCell::default(),
            closed: Cell::new(false),
        })
    }

    fn set(&self, state: LinkState) {
        *self.state.borrow_mut() = state;
    }
}

impl RobotLink for ScriptedLink {
    fn address(&self) -> &str {
        "10.0.0.2:1"
    }

    fn status(&self) -> LinkStatus {
        LinkStatus {
            state: self.state.borrow().clone(),
            commands_sent: self.sent.borrow().len() as u64,
            last_command: self.sent.borrow().last().copied(),
        }
    }

    fn send(&self, command: DriveCommand) -> Result<(), LinkError> {
        if *self.state.borrow() != LinkState::Connected {
            return Err(LinkError::NotConnected);
        }
        self.sent.borrow_mut().push(command);
        Ok(())
    }

    fn close(&self) {
        self.closed.set(true);
    }
}

/// Calls one screen on its first frame and keeps what comes back.
struct Launcher {
    child: Option<Box<dyn Screen>>,
    returned: Rc<Cell<bool>>,
}

impl Screen for Launcher {
    fn name(&self) -> &str {
        "launcher"
    }
    fn handle_event(&mut self, _event: &InputEvent) -> bool {
        false
    }
    fn should_render_frame(&mut self) -> bool {
        self.child.is_some()
    }
    fn run_frame(&mut self, _surface: &mut Surface) -> ScreenRunResult {
        match self.child.take() {
            Some(child) => ScreenRunResult::CallAnother(child),
            None => ScreenRunResult::Continue,
        }
    }
    fn receive_data(&mut self, _from: Box<dyn Screen>, _data: ScreenData) {
        self.returned.set(true);
    }
}

fn session(link: &Rc<ScriptedLink>) -> (HostSimulator, Rc<Cell<bool>>) {
    let clock = Rc::new(DeterministicClock::new());
    let handle: ClockHandle = clock.clone();
    let screen = connect_session(link.clone(), handle).unwrap();
    let returned = Rc::new(Cell::new(false));
    let launcher = Launcher {
        child: Some(Box::new(screen)),
        returned: Rc::clone(&returned),
    };
    let mut sim = HostSimulator::new(launcher, clock);
    // Push the session, then let it draw.
    sim.idle(2).unwrap();
    (sim, returned)
}

// ============================================================================
// Session on its own
// ============================================================================

#[test]
fn connecting_can_be_cancelled() {
    let link = ScriptedLink::new(LinkState::Connecting);
    let (mut sim, returned) = session(&link);
    assert_eq!(sim.host().stack_names(), vec!["launcher", "connect 10.0.0.2:1"]);
    assert!(sim.surface().contains_text("Connecting to 10.0.0.2:1"));

    sim.idle(10).unwrap();
    assert!(!returned.get());

    sim.send(InputEvent::ButtonDown(Button::B)).unwrap();
    assert_eq!(sim.host().stack_names(), vec!["launcher"]);
    assert!(returned.get());
    assert!(link.closed.get());
}

#[test]
fn spinner_redraws_only_when_it_turns() {
    let link = ScriptedLink::new(LinkState::Connecting);
    let (mut sim, _) = session(&link);
    let before = sim.frames();
    // 33ms ticks, spinner turns every 125ms: about one frame in four.
    sim.idle(40).unwrap();
    let drawn = sim.frames() - before;
    assert!((8..=12).contains(&drawn), "drew {drawn} frames");
}

#[test]
fn connected_link_hands_over_to_teleop() {
    let link = ScriptedLink::new(LinkState::Connecting);
    let (mut sim, returned) = session(&link);
    link.set(LinkState::Connected);
    sim.idle(2).unwrap();
    assert_eq!(
        sim.host().stack_names(),
        vec!["launcher", "connect 10.0.0.2:1", "teleop"]
    );
    assert!(sim.surface().contains_text("connected"));

    sim.send(InputEvent::axis(Axis::LEFT_X, 0.5)).unwrap();
    assert_eq!(link.sent.borrow().len(), 1);
    assert!(!link.closed.get());

    sim.send(InputEvent::ButtonDown(Button::B)).unwrap();
    assert_eq!(sim.host().stack_names(), vec!["launcher"]);
    assert!(returned.get());
    assert!(link.closed.get());
}

#[test]
fn failure_is_shown_until_dismissed() {
    let link = ScriptedLink::new(LinkState::Failed("no route to host".into()));
    let (mut sim, returned) = session(&link);
    assert!(sim.surface().contains_text("Could not connect to 10.0.0.2:1"));
    assert!(sim.surface().contains_text("no route to host"));

    sim.send(InputEvent::ButtonDown(Button::X)).unwrap();
    sim.idle(5).unwrap();
    assert!(!returned.get());

    sim.send(InputEvent::ButtonDown(Button::A)).unwrap();
    assert!(returned.get());
    assert!(link.closed.get());
}

// ============================================================================
// From the main menu
// ============================================================================

#[test]
fn connect_from_server_menu_and_back() {
    let clock = Rc::new(DeterministicClock::new());
    let dir: Rc<RefCell<dyn ServerDirectory>> = Rc::new(RefCell::new(MemoryDirectory::with_servers([
        Server::new("rover", "10.0.0.2:1"),
    ])));
    let link = ScriptedLink::new(LinkState::Connected);
    let opened: Rc<RefCell<Vec<String>>> = Rc::default();
    let factory: LinkFactory = {
        let link = link.clone();
        let opened = Rc::clone(&opened);
        Rc::new(move |address: &str| -> Rc<dyn RobotLink> {
            opened.borrow_mut().push(address.to_string());
            link.clone()
        })
    };
    let ctx = AppContext::new(clock.clone(), dir).with_links(factory);
    let mut sim = HostSimulator::new(main_menu(ctx), clock);
    sim.idle(2).unwrap();

    // Select the server, then "Connect" (the default row).
    sim.send(InputEvent::hat(0, -1)).unwrap();
    sim.send(InputEvent::hat(0, 0)).unwrap();
    sim.send(InputEvent::ButtonDown(Button::A)).unwrap();
    sim.idle(1).unwrap();
    sim.send(InputEvent::ButtonDown(Button::A)).unwrap();
    assert_eq!(*opened.borrow(), vec!["10.0.0.2:1".to_string()]);

    sim.idle(2).unwrap();
    assert_eq!(
        sim.host().stack_names(),
        vec!["main menu", "connect 10.0.0.2:1", "teleop"]
    );

    sim.send(InputEvent::ButtonDown(Button::B)).unwrap();
    assert!(link.closed.get());
    assert_eq!(sim.host().stack_names(), vec!["main menu", "menu"]);
    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("Connect to this server"));
}

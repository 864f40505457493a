//! The root flow driven through a simulated host.

use std::cell::RefCell;
use std::rc::Rc;

use deckbot_core::clock::DeterministicClock;
use deckbot_core::event::{Button, InputEvent, KeyCode};
use deckbot_runtime::host::HostState;
use deckbot_runtime::simulator::HostSimulator;
use deckbot_screens::main_menu::{AppContext, main_menu};
use deckbot_screens::servers::{MemoryDirectory, Server, ServerDirectory};

fn app(servers: Vec<Server>) -> (HostSimulator, Rc<RefCell<MemoryDirectory>>) {
    let clock = Rc::new(DeterministicClock::new());
    let dir = Rc::new(RefCell::new(MemoryDirectory::with_servers(servers)));
    let shared: Rc<RefCell<dyn ServerDirectory>> = dir.clone();
    let ctx = AppContext::new(clock.clone(), shared);
    let mut sim = HostSimulator::new(main_menu(ctx), clock);
    sim.idle(2).unwrap();
    (sim, dir)
}

/// Press a direction on the hat and let go.
fn hat(sim: &mut HostSimulator, y: i8) {
    sim.send(InputEvent::hat(0, y)).unwrap();
    sim.send(InputEvent::hat(0, 0)).unwrap();
}

fn press(sim: &mut HostSimulator, button: Button) -> HostState {
    sim.send(InputEvent::ButtonDown(button)).unwrap()
}

fn key(code: KeyCode) -> InputEvent {
    InputEvent::key(code)
}

#[test]
fn empty_directory_lists_add_and_exit() {
    let (sim, _) = app(vec![]);
    assert_eq!(sim.host().stack_names(), vec!["main menu", "menu"]);
    assert!(sim.surface().contains_text("Add a new server..."));
    assert!(sim.surface().contains_text("Exit program"));
}

#[test]
fn exit_program_ends_the_host() {
    let (mut sim, _) = app(vec![]);
    // Up from nothing selects the last row.
    hat(&mut sim, 1);
    assert!(sim.surface().contains_text("> Exit program <"));
    assert_eq!(press(&mut sim, Button::A), HostState::Exiting);
}

#[test]
fn adding_a_server() {
    let (mut sim, dir) = app(vec![]);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    assert_eq!(sim.host().active_name(), "text input");

    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("What should the new server be called?"));
    assert!(sim.surface().contains_text("New Server_"));

    sim.send(key(KeyCode::Enter)).unwrap();
    assert_eq!(sim.host().active_name(), "text input");
    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("What should the address for server"));

    sim.send(InputEvent::Text("10.0.0.2:8765".into())).unwrap();
    sim.send(key(KeyCode::Enter)).unwrap();
    assert_eq!(sim.host().active_name(), "menu");
    assert_eq!(dir.borrow().list(), vec![Server::new("New Server", "10.0.0.2:8765")]);

    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("View server \"New Server\""));
}

#[test]
fn cancelling_address_adds_nothing() {
    let (mut sim, dir) = app(vec![]);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    sim.send(key(KeyCode::Enter)).unwrap();
    assert_eq!(sim.host().active_name(), "text input");

    press(&mut sim, Button::B);
    assert_eq!(sim.host().stack_names(), vec!["main menu", "menu"]);
    assert!(dir.borrow().is_empty());
}

#[test]
fn empty_name_skips_address_prompt() {
    let (mut sim, dir) = app(vec![]);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);

    let mut erase = vec![key(KeyCode::Backspace); "New Server".len()];
    erase.push(key(KeyCode::Enter));
    sim.tick(erase).unwrap();
    assert_eq!(sim.host().stack_names(), vec!["main menu", "menu"]);
    assert!(dir.borrow().is_empty());
}

#[test]
fn renaming_a_server_from_its_menu() {
    let (mut sim, dir) = app(vec![Server::new("rover", "10.0.0.2:1")]);
    assert!(sim.surface().contains_text("View server \"rover\""));

    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("> Connect to this server <"));
    assert!(sim.surface().contains_text("Name: rover (edit?)"));
    assert!(sim.surface().contains_text("Address: 10.0.0.2:1 (edit?)"));

    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    assert_eq!(sim.host().active_name(), "text input");

    let mut edit = vec![key(KeyCode::Backspace); "rover".len()];
    edit.push(InputEvent::Text("scout".into()));
    edit.push(key(KeyCode::Enter));
    sim.tick(edit).unwrap();
    assert_eq!(dir.borrow().get(0).map(|s| s.name), Some("scout".to_string()));

    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("Name: scout (edit?)"));

    // Back out of the server menu to the refreshed list.
    press(&mut sim, Button::B);
    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("View server \"scout\""));
}

#[test]
fn cancelled_edit_keeps_address() {
    let (mut sim, dir) = app(vec![Server::new("rover", "10.0.0.2:1")]);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    hat(&mut sim, -1);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    sim.idle(1).unwrap();
    assert!(sim.surface().contains_text("What should the new address for this server be?"));

    press(&mut sim, Button::B);
    assert_eq!(dir.borrow().get(0).map(|s| s.address), Some("10.0.0.2:1".to_string()));
    assert_eq!(sim.host().stack_names(), vec!["main menu", "menu"]);
}

#[test]
fn quit_event_ends_from_anywhere() {
    let (mut sim, _) = app(vec![]);
    hat(&mut sim, -1);
    press(&mut sim, Button::A);
    assert_eq!(sim.send(InputEvent::Quit).unwrap(), HostState::Exiting);
}

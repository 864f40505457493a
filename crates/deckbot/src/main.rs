#![forbid(unsafe_code)]

//! deckbot: terminal front end for the robot-controller shell.
//!
//! Run with `cargo run -p deckbot`. See `--help` for options and controls.

mod cli;
mod input_map;
mod logging;
mod terminal;

use std::cell::RefCell;
use std::fmt;
use std::io::{self, Write};
use std::process;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::{self, Event};
use deckbot_core::clock::{ClockHandle, MonotonicClock};
use deckbot_render::Surface;
use deckbot_runtime::{Host, HostError, HostState};
use deckbot_screens::{AppContext, EventLogScreen, MemoryDirectory, SampleScreen, main_menu};
use tracing::{error, info};

use crate::cli::{Opts, StartScreen};
use crate::input_map::InputMapper;
use crate::terminal::{Presenter, TerminalSession};

/// Frames the bouncing sample runs for before exiting.
const SAMPLE_FRAMES: u32 = 750;

#[derive(Debug)]
enum RunError {
    Io(io::Error),
    Host(HostError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "terminal error: {e}"),
            Self::Host(e) => write!(f, "navigation error: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Host(e) => Some(e),
        }
    }
}

impl From<io::Error> for RunError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<HostError> for RunError {
    fn from(e: HostError) -> Self {
        Self::Host(e)
    }
}

fn main() {
    let opts = Opts::parse();
    if let Err(e) = logging::init(&opts) {
        eprintln!("Failed to set up logging: {e}");
        process::exit(1);
    }
    info!(fps = opts.fps, start = ?opts.start, "deckbot starting");

    if let Err(e) = run(&opts) {
        error!(error = %e, "deckbot stopped");
        eprintln!("{e}");
        process::exit(1);
    }
    info!("deckbot exited");
}

fn root_screen(start: StartScreen, clock: ClockHandle) -> Host {
    match start {
        StartScreen::Menu => {
            let servers = Rc::new(RefCell::new(MemoryDirectory::new()));
            Host::new(main_menu(AppContext::new(clock, servers)))
        }
        StartScreen::Sample => Host::new(SampleScreen::new(SAMPLE_FRAMES, clock)),
        StartScreen::Events => Host::new(EventLogScreen::new(clock)),
    }
}

/// Drain everything the terminal has queued without blocking.
fn poll_terminal() -> io::Result<Vec<Event>> {
    let mut events = Vec::new();
    while event::poll(Duration::ZERO)? {
        events.push(event::read()?);
    }
    Ok(events)
}

fn run(opts: &Opts) -> Result<(), RunError> {
    let session = TerminalSession::new()?;
    let (width, height) = session.size()?;

    let mut host = root_screen(opts.start, MonotonicClock::handle());
    let mut surface = Surface::new(width, height);
    let mut presenter = Presenter::new();
    let mut mapper = InputMapper::new();
    let mut stdout = io::stdout();
    let frame = Duration::from_secs(1) / opts.fps;

    loop {
        let started = Instant::now();

        let raw = poll_terminal()?;
        for event in &raw {
            if let Event::Resize(w, h) = *event {
                surface.resize(w, h);
                presenter.invalidate();
            }
        }

        host.pump(mapper.tick(raw));
        if host.draw(&mut surface)? == HostState::Exiting {
            break;
        }
        presenter.present(&mut stdout, &surface)?;

        if let Some(rest) = frame.checked_sub(started.elapsed()) {
            std::thread::sleep(rest);
        }
    }

    stdout.flush()?;
    drop(session);
    Ok(())
}

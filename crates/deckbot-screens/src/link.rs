#![forbid(unsafe_code)]

//! Connection to a robot.
//!
//! A [`RobotLink`] accepts drive commands and exposes a snapshot of its
//! connection state. Screens read the snapshot during polls and never block on
//! the link.
//!
//! [`LoopbackLink`] runs the connection on a background thread. It validates
//! the address, "connects" after a configurable delay and counts the commands
//! it receives, which is enough to drive the UI without a robot.
//!
//! # Invariants
//!
//! 1. The status snapshot only moves forward:
//!    `Connecting -> Connected | Failed`, then `Closed` after [`RobotLink::close`].
//! 2. `send` never blocks; commands are queued to the worker.
//! 3. Dropping a `LoopbackLink` closes it and joins the worker.

use std::fmt;
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;
use std::time::Duration;

use tracing::{debug, info, warn};

/// Stick positions sent to the robot, each axis in `-1.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DriveCommand {
    pub left: (f32, f32),
    pub right: (f32, f32),
}

/// Connection lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    Failed(String),
    Closed,
}

/// Latest view of a link.
#[derive(Debug, Clone, PartialEq)]
pub struct LinkStatus {
    pub state: LinkState,
    pub commands_sent: u64,
    pub last_command: Option<DriveCommand>,
}

impl Default for LinkStatus {
    fn default() -> Self {
        Self {
            state: LinkState::Connecting,
            commands_sent: 0,
            last_command: None,
        }
    }
}

/// Why a command could not be sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError {
    /// The link has not finished connecting, or failed to.
    NotConnected,
    /// The link was closed.
    Closed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotConnected => write!(f, "robot link is not connected"),
            Self::Closed => write!(f, "robot link is closed"),
        }
    }
}

impl std::error::Error for LinkError {}

/// A connection to one robot.
pub trait RobotLink {
    /// The address this link was opened for.
    fn address(&self) -> &str;

    /// Snapshot of the connection state.
    fn status(&self) -> LinkStatus;

    /// Queue a drive command.
    fn send(&self, command: DriveCommand) -> Result<(), LinkError>;

    /// Shut the connection down. Idempotent.
    fn close(&self);
}

/// Check that `address` looks like `host:port`.
pub fn validate_address(address: &str) -> Result<(), String> {
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(format!("address `{address}` has no port"));
    };
    if host.is_empty() {
        return Err(format!("address `{address}` has no host"));
    }
    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(format!("invalid port `{port}`")),
        Ok(_) => Ok(()),
    }
}

enum LinkMessage {
    Drive(DriveCommand),
    Close,
}

/// Background-thread link that accepts commands without a robot attached.
pub struct LoopbackLink {
    address: String,
    status: Arc<Mutex<LinkStatus>>,
    sender: mpsc::Sender<LinkMessage>,
    worker: Option<thread::JoinHandle<()>>,
}

impl LoopbackLink {
    /// Start connecting to `address`; the link reports `Connected` after
    /// `delay` if the address is valid.
    pub fn connect(address: impl Into<String>, delay: Duration) -> Self {
        let address = address.into();
        let status = Arc::new(Mutex::new(LinkStatus::default()));
        let (sender, receiver) = mpsc::channel();

        let shared = Arc::clone(&status);
        let target = address.clone();
        let worker = thread::spawn(move || run_worker(&target, delay, &shared, &receiver));

        debug!(address = %address, "loopback link started");
        Self {
            address,
            status,
            sender,
            worker: Some(worker),
        }
    }
}

fn set_state(status: &Mutex<LinkStatus>, state: LinkState) {
    status.lock().unwrap_or_else(PoisonError::into_inner).state = state;
}

fn run_worker(
    address: &str,
    delay: Duration,
    status: &Mutex<LinkStatus>,
    receiver: &mpsc::Receiver<LinkMessage>,
) {
    // Connecting: only a close can interrupt the delay.
    match receiver.recv_timeout(delay) {
        Ok(LinkMessage::Close) | Err(RecvTimeoutError::Disconnected) => {
            set_state(status, LinkState::Closed);
            return;
        }
        Ok(LinkMessage::Drive(_)) | Err(RecvTimeoutError::Timeout) => {}
    }

    if let Err(reason) = validate_address(address) {
        warn!(address, %reason, "robot link failed");
        set_state(status, LinkState::Failed(reason));
        // Stay alive until closed so the snapshot keeps the failure.
        while let Ok(message) = receiver.recv() {
            if matches!(message, LinkMessage::Close) {
                break;
            }
        }
        set_state(status, LinkState::Closed);
        return;
    }

    info!(address, "robot link connected");
    set_state(status, LinkState::Connected);
    loop {
        match receiver.recv() {
            Ok(LinkMessage::Drive(command)) => {
                let mut guard = status.lock().unwrap_or_else(PoisonError::into_inner);
                guard.commands_sent += 1;
                guard.last_command = Some(command);
            }
            Ok(LinkMessage::Close) | Err(_) => break,
        }
    }
    set_state(status, LinkState::Closed);
    info!(address, "robot link closed");
}

impl RobotLink for LoopbackLink {
    fn address(&self) -> &str {
        &self.address
    }

    fn status(&self) -> LinkStatus {
        self.status.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    fn send(&self, command: DriveCommand) -> Result<(), LinkError> {
        match self.status().state {
            LinkState::Connected => self
                .sender
                .send(LinkMessage::Drive(command))
                .map_err(|_| LinkError::Closed),
            LinkState::Closed => Err(LinkError::Closed),
            LinkState::Connecting | LinkState::Failed(_) => Err(LinkError::NotConnected),
        }
    }

    fn close(&self) {
        // The worker may already be gone; nothing left to tell it then.
        let _ = self.sender.send(LinkMessage::Close);
    }
}

impl Drop for LoopbackLink {
    fn drop(&mut self) {
        self.close();
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

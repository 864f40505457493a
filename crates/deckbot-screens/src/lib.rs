#![forbid(unsafe_code)]

//! Concrete screens of the robot-controller shell.
//!
//! - [`menu`]: vertical selection menu with typematic navigation.
//! - [`text_input`]: single-line prompt.
//! - [`teleop`]: stick dials that drive a [`RobotLink`].
//! - [`connect`]: rendering flow that connects and hands over to teleop.
//! - [`main_menu`]: the root flow over the [`ServerDirectory`].
//! - [`sample`]: diagnostic screens.

pub mod connect;
pub mod link;
pub mod main_menu;
pub mod menu;
pub mod sample;
pub mod servers;
pub mod teleop;
pub mod text_input;

pub use connect::connect_session;
pub use link::{DriveCommand, LinkError, LinkState, LinkStatus, LoopbackLink, RobotLink};
pub use main_menu::{AppContext, LinkFactory, main_menu};
pub use menu::{InputSource, MenuConfig, MenuError, VerticalMenuScreen};
pub use sample::{EventLogScreen, SampleScreen};
pub use servers::{MemoryDirectory, NoSuchServer, Server, ServerDirectory};
pub use teleop::TeleopScreen;
pub use text_input::TextInputScreen;

#![forbid(unsafe_code)]

//! The root flow: server list, server details and connecting.
//!
//! ```text
//! main menu ── View server "x" ──> server menu ── Connect ──> connect_session ──> teleop
//!          │                                  ├─ Name: .. (edit?) ──> prompt
//!          │                                  ├─ Address: .. (edit?) ──> prompt
//!          │                                  └─ Return to server list
//!          ├─ Add a new server... ──> name prompt ──> address prompt
//!          └─ Exit program
//! ```
//!
//! Cancelling a prompt, or answering it with empty text, abandons that step
//! and goes back to the menu it came from.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use deckbot_core::clock::ClockHandle;
use deckbot_runtime::generator::{GeneratorScreen, ScreenCaller};
use deckbot_runtime::screen::ScreenRunResult;
use tracing::{error, info, warn};

use crate::connect::connect_session;
use crate::link::{LoopbackLink, RobotLink};
use crate::menu::{MenuConfig, MenuError, VerticalMenuScreen};
use crate::servers::{Server, ServerDirectory};
use crate::text_input::TextInputScreen;

/// How long a [`LoopbackLink`] pretends to connect.
pub const LOOPBACK_CONNECT_DELAY: Duration = Duration::from_millis(750);

/// Opens a link to an address.
pub type LinkFactory = Rc<dyn Fn(&str) -> Rc<dyn RobotLink>>;

/// Everything the root flow needs from the outside.
#[derive(Clone)]
pub struct AppContext {
    pub clock: ClockHandle,
    pub servers: Rc<RefCell<dyn ServerDirectory>>,
    pub links: LinkFactory,
    pub menu: MenuConfig,
}

impl AppContext {
    /// Context with loopback links and default menu timing.
    pub fn new(clock: ClockHandle, servers: Rc<RefCell<dyn ServerDirectory>>) -> Self {
        Self {
            clock,
            servers,
            links: Rc::new(|address: &str| -> Rc<dyn RobotLink> {
                Rc::new(LoopbackLink::connect(address, LOOPBACK_CONNECT_DELAY))
            }),
            menu: MenuConfig::default(),
        }
    }

    #[must_use]
    pub fn with_links(mut self, links: LinkFactory) -> Self {
        self.links = links;
        self
    }

    #[must_use]
    pub fn with_menu_config(mut self, menu: MenuConfig) -> Self {
        self.menu = menu;
        self
    }

    fn menu<K>(&self, items: Vec<(K, String)>) -> Result<VerticalMenuScreen<K>, MenuError>
    where
        K: std::any::Any + Clone + PartialEq,
    {
        Ok(VerticalMenuScreen::new(items, Rc::clone(&self.clock))?.with_config(self.menu.clone()))
    }

    fn prompt(&self, text: impl Into<String>) -> TextInputScreen {
        TextInputScreen::new(text, Rc::clone(&self.clock)).cancellable()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainChoice {
    Server(usize),
    Add,
    Exit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ServerChoice {
    Connect,
    EditName,
    EditAddress,
    Back,
}

/// Ask with `prompt`; empty or cancelled answers are `None`.
async fn ask(co: &ScreenCaller, prompt: TextInputScreen) -> Option<String> {
    co.call(prompt)
        .await
        .take::<String>()
        .filter(|text| !text.is_empty())
}

/// The application's root screen. Ends the program on "Exit program".
pub fn main_menu(ctx: AppContext) -> GeneratorScreen {
    GeneratorScreen::new("main menu", move |co| async move {
        loop {
            let mut items: Vec<(MainChoice, String)> = ctx
                .servers
                .borrow()
                .list()
                .into_iter()
                .enumerate()
                .map(|(i, server)| (MainChoice::Server(i), format!("View server \"{}\"", server.name)))
                .collect();
            items.push((MainChoice::Add, "Add a new server...".to_string()));
            items.push((MainChoice::Exit, "Exit program".to_string()));

            let menu = match ctx.menu(items) {
                Ok(menu) => menu,
                Err(err) => {
                    error!(%err, "could not build main menu");
                    return ScreenRunResult::Exit;
                }
            };
            match co.call(menu).await.take::<MainChoice>() {
                Some(MainChoice::Exit) => {
                    info!("exit chosen from main menu");
                    return ScreenRunResult::Exit;
                }
                Some(MainChoice::Add) => add_server(&co, &ctx).await,
                Some(MainChoice::Server(index)) => {
                    if let Err(err) = server_menu(&co, &ctx, index).await {
                        error!(%err, index, "could not build server menu");
                        return ScreenRunResult::Exit;
                    }
                }
                None => {}
            }
        }
    })
}

async fn add_server(co: &ScreenCaller, ctx: &AppContext) {
    let name_prompt = ctx
        .prompt("What should the new server be called?")
        .prefill("New Server");
    let Some(name) = ask(co, name_prompt).await else {
        return;
    };
    let address_prompt = ctx.prompt(format!("What should the address for server \"{name}\" be?"));
    let Some(address) = ask(co, address_prompt).await else {
        return;
    };
    let index = ctx.servers.borrow_mut().add(Server::new(name, address));
    info!(index, "server added");
}

async fn server_menu(co: &ScreenCaller, ctx: &AppContext, index: usize) -> Result<(), MenuError> {
    loop {
        let Some(server) = ctx.servers.borrow().get(index) else {
            warn!(index, "server vanished from the directory");
            return Ok(());
        };
        let items = vec![
            (ServerChoice::Connect, "Connect to this server".to_string()),
            (ServerChoice::EditName, format!("Name: {} (edit?)", server.name)),
            (ServerChoice::EditAddress, format!("Address: {} (edit?)", server.address)),
            (ServerChoice::Back, "Return to server list".to_string()),
        ];
        let menu = ctx.menu(items)?.with_default(&ServerChoice::Connect)?.cancellable();

        let updated = match co.call(menu).await.take::<ServerChoice>() {
            None | Some(ServerChoice::Back) => return Ok(()),
            Some(ServerChoice::Connect) => {
                let link = (ctx.links)(&server.address);
                match connect_session(link, Rc::clone(&ctx.clock)) {
                    Ok(session) => {
                        co.call(session).await;
                    }
                    Err(err) => error!(%err, address = %server.address, "could not start session"),
                }
                None
            }
            Some(ServerChoice::EditName) => {
                let prompt = ctx
                    .prompt("What should the new name for this server be?")
                    .prefill(server.name.clone());
                ask(co, prompt).await.map(|name| Server { name, ..server })
            }
            Some(ServerChoice::EditAddress) => {
                let prompt = ctx
                    .prompt("What should the new address for this server be?")
                    .prefill(server.address.clone());
                ask(co, prompt).await.map(|address| Server { address, ..server })
            }
        };

        if let Some(server) = updated {
            if let Err(err) = ctx.servers.borrow_mut().update(index, server) {
                warn!(%err, "server edit lost");
            }
        }
    }
}

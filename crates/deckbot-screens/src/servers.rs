#![forbid(unsafe_code)]

//! Saved robot servers.
//!
//! Flows only see the [`ServerDirectory`] trait. [`MemoryDirectory`] keeps
//! entries for the lifetime of the process.

use std::fmt;

/// One saved robot endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    pub address: String,
}

impl Server {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }
}

/// Lookup of a server index that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoSuchServer(pub usize);

impl fmt::Display for NoSuchServer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "no server at index {}", self.0)
    }
}

impl std::error::Error for NoSuchServer {}

/// Ordered list of saved servers.
pub trait ServerDirectory {
    /// All servers in display order.
    fn list(&self) -> Vec<Server>;

    /// The server at `index`.
    fn get(&self, index: usize) -> Option<Server>;

    /// Append a server, returning its index.
    fn add(&mut self, server: Server) -> usize;

    /// Replace the server at `index`.
    fn update(&mut self, index: usize, server: Server) -> Result<(), NoSuchServer>;
}

/// In-process [`ServerDirectory`].
#[derive(Debug, Clone, Default)]
pub struct MemoryDirectory {
    servers: Vec<Server>,
}

impl MemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_servers(servers: impl IntoIterator<Item = Server>) -> Self {
        Self {
            servers: servers.into_iter().collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.servers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.servers.is_empty()
    }
}

impl ServerDirectory for MemoryDirectory {
    fn list(&self) -> Vec<Server> {
        self.servers.clone()
    }

    fn get(&self, index: usize) -> Option<Server> {
        self.servers.get(index).cloned()
    }

    fn add(&mut self, server: Server) -> usize {
        self.servers.push(server);
        self.servers.len() - 1
    }

    fn update(&mut self, index: usize, server: Server) -> Result<(), NoSuchServer> {
        let slot = self.servers.get_mut(index).ok_or(NoSuchServer(index))?;
        *slot = server;
        Ok(())
    }
}

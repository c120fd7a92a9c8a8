//! Hot-module-reload channel.
//!
//! # Data Flow
//! ```text
//! watcher.rs (file change)
//!     → HmrHub::publish(HmrEvent)
//!     → broadcast to every /__hmr WebSocket task
//!     → JSON text frame to the browser
//! ```
//!
//! # Design Decisions
//! - Only full reloads are sent; there is no module graph
//! - Slow clients that lag behind the broadcast buffer skip missed events
//! - The advertised endpoint uses the proxy hint (`protocol`, `clientPort`),
//!   not the bind address

pub mod watcher;

use std::fmt;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::config::{DevProxySettings, HmrProtocol};

pub use watcher::ContentWatcher;

/// WebSocket path served by the dev server.
pub const HMR_PATH: &str = "/__hmr";

const CHANNEL_CAPACITY: usize = 64;

/// A message pushed to HMR clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum HmrEvent {
    /// First message on every connection.
    Connected,

    /// Content changed; clients reload the page.
    FullReload {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },

    /// The config file changed; the server must be restarted to pick it up.
    ConfigChanged { path: String },
}

/// Fan-out of HMR events to connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    tx: broadcast::Sender<HmrEvent>,
}

impl HmrHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HmrEvent> {
        self.tx.subscribe()
    }

    /// Send an event to all clients, returning how many received it.
    pub fn publish(&self, event: HmrEvent) -> usize {
        match self.tx.send(event) {
            Ok(clients) => clients,
            // No subscribers
            Err(_) => 0,
        }
    }

    pub fn client_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client-facing address of the HMR channel: `protocol://host:port`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HmrEndpoint {
    pub protocol: HmrProtocol,
    pub host: String,
    pub port: u16,
}

impl HmrEndpoint {
    /// Combine the proxy hint with the host clients used to reach us.
    pub fn new(settings: &DevProxySettings, external_host: &str) -> Self {
        Self {
            protocol: settings.protocol(),
            host: external_host.to_string(),
            port: settings.client_port(),
        }
    }
}

impl fmt::Display for HmrEndpoint {
    // Written by hand: `url::Url` drops default ports, and the port must
    // always be explicit here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "{}://[{}]:{}", self.protocol, self.host, self.port)
        } else {
            write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
        }
    }
}

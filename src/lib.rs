//! Dev server shim for static sites.
//!
//! Loads a site configuration (origin URL, integrations, bind address, HMR
//! proxy hint), validates it into an immutable [`Configuration`], and serves a
//! content directory with a hot-reload WebSocket channel.

pub mod config;
pub mod hmr;
pub mod http;
pub mod integration;
pub mod lifecycle;
pub mod observability;

pub use config::{load, load_file, ConfigError, Configuration};
pub use http::DevServer;
pub use integration::{Integration, IntegrationRegistry};
pub use lifecycle::Shutdown;

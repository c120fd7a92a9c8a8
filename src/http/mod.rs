//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection (bound on server.host:server.port)
//!     → server.rs (Axum router, middleware)
//!     → /__hmr          → websocket.rs (HMR event stream)
//!     → /__devhost/hmr  → server.rs (advertised HMR endpoint)
//!     → anything else   → static files from the content root
//!     → response.rs (integration headers)
//!     → Send to client
//! ```

pub mod response;
pub mod server;
pub mod websocket;

pub use server::{AppState, DevServer, ServerError, HMR_INFO_PATH};

//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML/JSON)
//!     → loader.rs (read & deserialize into schema::ConfigSource)
//!     → [CLI overrides applied to the raw source]
//!     → validation.rs (field checks, defaults, fail fast)
//!     → Configuration (validated, immutable)
//!     → shared via Arc with the dev server
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; a changed file requires a restart
//! - Optional fields get defaults at validation time, not in serde
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod resolved;
pub mod schema;
pub mod validation;

pub use loader::{load, load_file, load_str, parse_str, read_file, Format, LoadError};
pub use resolved::{Configuration, DevProxySettings, HmrProtocol, IntegrationSpec, ServerSettings};
pub use schema::{ConfigSource, IntegrationEntry, ServerOverrides};
pub use validation::ConfigError;

//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick the filter from `RUST_LOG`, falling back to the CLI level
//!
//! # Design Decisions
//! - Uses the tracing crate for structured logging
//! - `RUST_LOG` wins over the command line so operators can always override

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Filter used when neither `RUST_LOG` nor `--log-level` is given.
pub const DEFAULT_DIRECTIVES: &str = "devhost=info,tower_http=info";

/// Build the filter: `RUST_LOG` if set, else `level` for this crate.
pub fn filter(level: Option<&str>) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match level {
        Some(level) => EnvFilter::new(format!("devhost={level},tower_http={level}")),
        None => EnvFilter::new(DEFAULT_DIRECTIVES),
    })
}

/// Install the global subscriber.
///
/// Returns `false` if one was already installed (e.g. by a test harness).
pub fn init(level: Option<&str>) -> bool {
    tracing_subscriber::registry()
        .with(filter(level))
        .with(tracing_subscriber::fmt::layer())
        .try_init()
        .is_ok()
}

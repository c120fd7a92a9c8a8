//! Integration subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration.integrations (ordered IntegrationSpec list)
//!     → IntegrationRegistry::resolve (identifier → Arc<dyn Integration>)
//!     → apply_all (in declaration order, into one BuildContext)
//!     → BuildContext read by the dev server (watch paths, headers)
//! ```
//!
//! # Design Decisions
//! - Integrations are opaque capabilities: the loader never looks inside them
//! - Unknown identifiers resolve to `ExternalIntegration`, a pass-through
//!   that only records its name
//! - Empty lists and duplicate entries are passed through unchanged

pub mod headers;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use url::Url;

use crate::config::IntegrationSpec;

pub use headers::HeadersIntegration;

/// Errors raised while resolving or applying integrations.
#[derive(Debug, Error)]
pub enum IntegrationError {
    /// Options given to an integration were not usable.
    #[error("integration '{name}': invalid options: {reason}")]
    InvalidOptions { name: String, reason: String },

    /// The integration failed while applying itself.
    #[error("integration '{name}' failed: {reason}")]
    Apply { name: String, reason: String },
}

/// A build-time extension unit.
pub trait Integration: Send + Sync {
    /// Identifier used in logs and in `BuildContext::applied`.
    fn name(&self) -> &str;

    /// Contribute to the build context.
    fn apply(&self, ctx: &mut BuildContext) -> Result<(), IntegrationError>;
}

impl fmt::Debug for dyn Integration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Integration").field("name", &self.name()).finish()
    }
}

/// State integrations contribute to before the dev server starts.
#[derive(Debug, Clone)]
pub struct BuildContext {
    site: Url,
    applied: Vec<String>,
    watch_paths: Vec<PathBuf>,
    response_headers: Vec<(String, String)>,
}

impl BuildContext {
    pub fn new(site: Url) -> Self {
        Self {
            site,
            applied: Vec::new(),
            watch_paths: Vec::new(),
            response_headers: Vec::new(),
        }
    }

    pub fn site(&self) -> &Url {
        &self.site
    }

    /// Names of integrations applied so far, in order.
    pub fn applied(&self) -> &[String] {
        &self.applied
    }

    /// Extra paths whose changes should trigger a reload.
    pub fn watch_paths(&self) -> &[PathBuf] {
        &self.watch_paths
    }

    /// Headers added to every dev server response.
    pub fn response_headers(&self) -> &[(String, String)] {
        &self.response_headers
    }

    pub fn add_watch_path(&mut self, path: impl Into<PathBuf>) {
        self.watch_paths.push(path.into());
    }

    pub fn add_response_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.response_headers.push((name.into(), value.into()));
    }

    fn record_applied(&mut self, name: &str) {
        self.applied.push(name.to_string());
    }
}

/// An integration this process has no implementation for.
///
/// It is supplied by a collaborator outside the dev server, so applying it
/// only records that it was declared.
#[derive(Debug, Clone)]
pub struct ExternalIntegration {
    name: String,
}

impl ExternalIntegration {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl Integration for ExternalIntegration {
    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, _ctx: &mut BuildContext) -> Result<(), IntegrationError> {
        tracing::debug!(integration = %self.name, "External integration passed through");
        Ok(())
    }
}

/// Builds an integration from its options.
pub type IntegrationFactory =
    Arc<dyn Fn(&serde_json::Value) -> Result<Arc<dyn Integration>, IntegrationError> + Send + Sync>;

/// Maps integration identifiers to factories.
#[derive(Clone, Default)]
pub struct IntegrationRegistry {
    factories: HashMap<String, IntegrationFactory>,
}

impl IntegrationRegistry {
    /// An empty registry; every identifier resolves as external.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with the integrations shipped in this crate.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(headers::NAME, |options| {
            Ok(Arc::new(HeadersIntegration::from_options(options)?) as Arc<dyn Integration>)
        });
        registry
    }

    /// Register a factory, replacing any previous one for `name`.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&serde_json::Value) -> Result<Arc<dyn Integration>, IntegrationError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(name.into(), Arc::new(factory));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Resolve declared integrations, preserving order and duplicates.
    pub fn resolve(
        &self,
        specs: &[IntegrationSpec],
    ) -> Result<Vec<Arc<dyn Integration>>, IntegrationError> {
        specs
            .iter()
            .map(|spec| match self.factories.get(&spec.name) {
                Some(factory) => factory(&spec.options),
                None => {
                    tracing::info!(
                        integration = %spec.name,
                        "No built-in implementation, treating as external"
                    );
                    Ok(Arc::new(ExternalIntegration::new(spec.name.clone())) as Arc<dyn Integration>)
                }
            })
            .collect()
    }
}

impl fmt::Debug for IntegrationRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("IntegrationRegistry")
            .field("factories", &names)
            .finish()
    }
}

/// Apply integrations in order, stopping at the first failure.
pub fn apply_all(
    integrations: &[Arc<dyn Integration>],
    ctx: &mut BuildContext,
) -> Result<(), IntegrationError> {
    for integration in integrations {
        integration.apply(ctx)?;
        ctx.record_applied(integration.name());
        tracing::info!(integration = %integration.name(), "Integration applied");
    }
    Ok(())
}

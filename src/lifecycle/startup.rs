//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and apply integrations
//! - Bind the listener on `server.host:server.port`
//! - Start the content watcher
//! - Hand the listener to the dev server
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Subsystems initialize in order, not concurrently
//! - The listener is bound last so traffic only arrives when ready

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use notify::RecommendedWatcher;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::config::Configuration;
use crate::hmr::{ContentWatcher, HmrEndpoint, HmrHub};
use crate::http::{DevServer, ServerError};
use crate::integration::{self, BuildContext, IntegrationError, IntegrationRegistry};
use crate::lifecycle::Shutdown;

/// Options that come from the command line rather than the config file.
#[derive(Debug, Clone, Default)]
pub struct ServeOptions {
    /// Directory served for non-HMR paths.
    pub root: Option<PathBuf>,

    /// Config file to watch for changes.
    pub config_path: Option<PathBuf>,

    /// Start the file watcher.
    pub watch: bool,
}

/// Errors that abort startup.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Integration(#[from] IntegrationError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error("content root {} is not a directory", .0.display())]
    InvalidRoot(PathBuf),

    #[error("failed to bind {host}:{port}: {source}")]
    Bind {
        host: String,
        port: u16,
        source: std::io::Error,
    },

    #[error("failed to start file watcher: {0}")]
    Watch(#[from] notify::Error),

    #[error("server error: {0}")]
    Serve(#[source] std::io::Error),
}

/// A dev server accepting connections in a background task.
pub struct RunningServer {
    local_addr: SocketAddr,
    hub: HmrHub,
    build: BuildContext,
    task: JoinHandle<Result<(), std::io::Error>>,
    _watcher: Option<RecommendedWatcher>,
}

impl RunningServer {
    /// Address actually bound (differs from the config when port is 0).
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn hub(&self) -> &HmrHub {
        &self.hub
    }

    /// What the integrations contributed.
    pub fn build_context(&self) -> &BuildContext {
        &self.build
    }

    /// Wait for the server task to finish.
    pub async fn wait(self) -> Result<(), StartupError> {
        match self.task.await {
            Ok(result) => result.map_err(StartupError::Serve),
            Err(join_error) => Err(StartupError::Serve(std::io::Error::other(join_error))),
        }
    }
}

/// Bring the dev server up and return once it is accepting connections.
pub async fn start(
    config: Configuration,
    options: ServeOptions,
    registry: &IntegrationRegistry,
    shutdown: Shutdown,
) -> Result<RunningServer, StartupError> {
    let config = Arc::new(config);

    if let Some(root) = &options.root {
        if !root.is_dir() {
            return Err(StartupError::InvalidRoot(root.clone()));
        }
    }

    // 1. Integrations, in declaration order
    let integrations = registry.resolve(config.integrations())?;
    let mut build = BuildContext::new(config.site_url().clone());
    integration::apply_all(&integrations, &mut build)?;

    // 2. Server
    let hub = HmrHub::new();
    let server = DevServer::new(
        config.clone(),
        &build,
        options.root.as_deref(),
        hub.clone(),
        shutdown.clone(),
    )?;

    // 3. Listener
    let host = config.server().host();
    let port = config.server().port();
    let bind_error = |source: std::io::Error| StartupError::Bind {
        host: host.to_string(),
        port,
        source,
    };
    let listener = TcpListener::bind((host, port)).await.map_err(bind_error)?;
    let local_addr = listener.local_addr().map_err(bind_error)?;

    // 4. Watcher
    let watcher = if options.watch {
        let mut watcher =
            ContentWatcher::new(hub.clone()).extra_paths(build.watch_paths().to_vec());
        if let Some(root) = &options.root {
            watcher = watcher.root(root.clone());
        }
        if let Some(path) = &options.config_path {
            watcher = watcher.config_path(path.clone());
        }
        Some(watcher.run()?)
    } else {
        None
    };

    let external_host = config.site_url().host_str().unwrap_or(host);
    let endpoint = HmrEndpoint::new(config.dev_proxy(), external_host);
    tracing::info!(
        address = %local_addr,
        hmr = %endpoint,
        integrations = ?build.applied(),
        "Dev server ready"
    );

    let stop = shutdown.subscribe();
    let task = tokio::spawn(server.run(listener, stop));

    Ok(RunningServer {
        local_addr,
        hub,
        build,
        task,
        _watcher: watcher,
    })
}

/// Start the dev server and serve until shutdown.
pub async fn run(
    config: Configuration,
    options: ServeOptions,
    registry: &IntegrationRegistry,
    shutdown: Shutdown,
) -> Result<(), StartupError> {
    start(config, options, registry, shutdown).await?.wait().await
}

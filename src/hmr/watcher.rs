//! File watcher that turns content changes into HMR events.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};

use crate::hmr::{HmrEvent, HmrHub};

/// Watches the content root, extra integration paths, and the config file.
pub struct ContentWatcher {
    root: Option<PathBuf>,
    extra_paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    hub: HmrHub,
}

impl ContentWatcher {
    /// Create a watcher publishing into `hub`.
    pub fn new(hub: HmrHub) -> Self {
        Self {
            root: None,
            extra_paths: Vec::new(),
            config_path: None,
            hub,
        }
    }

    /// Content root; reload paths are reported relative to it.
    pub fn root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    pub fn extra_paths(mut self, paths: impl IntoIterator<Item = PathBuf>) -> Self {
        self.extra_paths.extend(paths);
        self
    }

    /// Config file; a change to it is reported, never applied.
    pub fn config_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_path = Some(path.into());
        self
    }

    /// Start watching on notify's background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let ContentWatcher {
            root,
            extra_paths,
            config_path,
            hub,
        } = self;

        // Event paths are matched by prefix, so compare canonical forms.
        let root = root.map(canonical);
        let extra_paths: Vec<_> = extra_paths.into_iter().map(canonical).collect();
        let config_path = config_path.map(canonical);

        // Editors often save by renaming a new file over the old one, which
        // drops a watch placed on the file itself; watch its directory.
        let config_dir = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(|dir| if dir.as_os_str().is_empty() { Path::new(".") } else { dir })
            .map(Path::to_path_buf);

        let scope = WatchScope {
            root: root.clone(),
            extra_paths: extra_paths.clone(),
            config_path: config_path.clone(),
        };

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if let Some(hmr_event) = scope.classify(&event) {
                        if let HmrEvent::ConfigChanged { path } = &hmr_event {
                            tracing::warn!(
                                path = %path,
                                "Config file changed; restart the server to apply it"
                            );
                        } else {
                            tracing::debug!(event = ?hmr_event, "Content change detected");
                        }
                        let clients = hub.publish(hmr_event);
                        tracing::debug!(clients, "HMR event published");
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        if let Some(root) = &root {
            watcher.watch(root, RecursiveMode::Recursive)?;
        }
        for path in &extra_paths {
            watcher.watch(path, RecursiveMode::Recursive)?;
        }
        if let Some(dir) = &config_dir {
            watcher.watch(dir, RecursiveMode::NonRecursive)?;
        }

        tracing::info!(
            root = ?root,
            extra_paths = extra_paths.len(),
            config = ?config_path,
            "Content watcher started"
        );
        Ok(watcher)
    }
}

/// What the watcher reports on.
#[derive(Debug, Clone, Default)]
struct WatchScope {
    root: Option<PathBuf>,
    extra_paths: Vec<PathBuf>,
    config_path: Option<PathBuf>,
}

impl WatchScope {
    /// Map a raw notify event to the HMR event it should produce, if any.
    ///
    /// Siblings of the config file are seen too (its directory is watched);
    /// they only count when they also sit under the root or an extra path.
    fn classify(&self, event: &Event) -> Option<HmrEvent> {
        if !matches!(
            event.kind,
            EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_)
        ) {
            return None;
        }

        if let Some(config) = &self.config_path {
            if let Some(path) = event.paths.iter().find(|p| same_file(p, config)) {
                return Some(HmrEvent::ConfigChanged {
                    path: path.display().to_string(),
                });
            }
        }

        let path = event.paths.iter().find(|path| self.is_content(path))?;
        let relative = self
            .root
            .as_deref()
            .and_then(|root| path.strip_prefix(root).ok())
            .unwrap_or(path);
        Some(HmrEvent::FullReload {
            path: Some(relative.display().to_string()),
        })
    }

    fn is_content(&self, path: &Path) -> bool {
        self.root.iter().chain(&self.extra_paths).any(|dir| path.starts_with(dir))
    }
}

fn canonical(path: PathBuf) -> PathBuf {
    path.canonicalize().unwrap_or(path)
}

fn same_file(a: &Path, b: &Path) -> bool {
    if a == b {
        return true;
    }
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

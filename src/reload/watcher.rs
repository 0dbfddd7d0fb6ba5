//! File watching and the hot reload task.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};

use crate::module::ModuleGraph;
use crate::reload::resolver::{ChangeOutcome, ChangeResolver};

/// Watches directories and forwards changed file paths.
pub struct RouteWatcher {
    dirs: Vec<PathBuf>,
    tx: mpsc::UnboundedSender<PathBuf>,
}

impl RouteWatcher {
    /// Create a watcher for `dirs`.
    ///
    /// Returns the watcher and a receiver for changed paths.
    pub fn new(dirs: Vec<PathBuf>) -> (Self, mpsc::UnboundedReceiver<PathBuf>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { dirs: collapse_nested(dirs), tx }, rx)
    }

    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Start watching. The returned set must be kept alive.
    pub fn run(self) -> Result<WatchSet, notify::Error> {
        let tx = self.tx.clone();

        let watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if event.kind.is_modify() || event.kind.is_create() {
                        for path in event.paths {
                            tracing::trace!(path = %path.display(), "File change detected");
                            let _ = tx.send(path);
                        }
                    }
                }
                Err(e) => tracing::error!("Watch error: {:?}", e),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        let mut set = WatchSet {
            watcher,
            dirs: Vec::new(),
        };
        for dir in self.dirs {
            set.watch(dir)?;
        }
        Ok(set)
    }
}

/// A running watcher and the directories it covers.
pub struct WatchSet {
    watcher: RecommendedWatcher,
    dirs: Vec<PathBuf>,
}

impl WatchSet {
    pub fn dirs(&self) -> &[PathBuf] {
        &self.dirs
    }

    /// Watch `dir` recursively unless an ancestor is already watched.
    /// Returns whether a new watch was added.
    pub fn watch(&mut self, dir: PathBuf) -> Result<bool, notify::Error> {
        if self.dirs.iter().any(|d| dir.starts_with(d)) {
            return Ok(false);
        }
        if !dir.is_dir() {
            tracing::warn!(path = %dir.display(), "Not watching missing directory");
            return Ok(false);
        }
        self.watcher.watch(&dir, RecursiveMode::Recursive)?;
        tracing::info!(path = %dir.display(), "Watching for changes");
        self.dirs.push(dir);
        Ok(true)
    }

    /// Watch every directory in `dirs` not covered yet. Failures are logged.
    pub fn extend(&mut self, dirs: Vec<PathBuf>) -> Vec<PathBuf> {
        let mut added = Vec::new();
        for dir in collapse_nested(dirs) {
            match self.watch(dir.clone()) {
                Ok(true) => added.push(dir),
                Ok(false) => {}
                Err(e) => tracing::warn!(path = %dir.display(), error = %e, "Failed to watch directory"),
            }
        }
        added
    }
}

/// Drop directories already covered by a recursive watch on an ancestor.
fn collapse_nested(mut dirs: Vec<PathBuf>) -> Vec<PathBuf> {
    dirs.sort();
    dirs.dedup();
    let mut kept: Vec<PathBuf> = Vec::new();
    for dir in dirs {
        if !kept.iter().any(|k| dir.starts_with(k)) {
            kept.push(dir);
        }
    }
    kept
}

/// Directories to watch: the routes root, the configured external
/// directories, and (when none are configured) the parent directory of every
/// module in the import graph that lives outside the routes root.
pub fn watch_targets(routes_dir: &Path, watch_dirs: &[PathBuf], graph: &ModuleGraph) -> Vec<PathBuf> {
    let mut dirs = vec![routes_dir.to_path_buf()];
    if watch_dirs.is_empty() {
        dirs.extend(
            graph
                .modules()
                .into_iter()
                .filter(|m| !m.starts_with(routes_dir))
                .filter_map(|m| m.parent().map(Path::to_path_buf)),
        );
    } else {
        dirs.extend(watch_dirs.iter().cloned());
    }
    collapse_nested(dirs)
}

/// Drains change events and applies them one at a time.
pub struct HotReloader {
    resolver: Arc<ChangeResolver>,
    debounce: Duration,
    watches: Option<(WatchSet, Arc<ModuleGraph>)>,
}

impl HotReloader {
    pub fn new(resolver: Arc<ChangeResolver>, debounce: Duration) -> Self {
        Self {
            resolver,
            debounce,
            watches: None,
        }
    }

    /// Own the running watcher. Unless external directories are configured,
    /// directories of modules first imported by a reload get watched too.
    pub fn with_watches(mut self, watches: WatchSet, graph: Arc<ModuleGraph>) -> Self {
        self.watches = Some((watches, graph));
        self
    }

    pub fn resolver(&self) -> &ChangeResolver {
        &self.resolver
    }

    /// Run until shutdown or until the event channel closes.
    ///
    /// Events arriving within the debounce window of each other form one
    /// burst; duplicate paths in a burst are handled once, in receipt order.
    pub async fn run(
        mut self,
        mut events: mpsc::UnboundedReceiver<PathBuf>,
        mut shutdown: broadcast::Receiver<()>,
    ) {
        tracing::info!(debounce_ms = self.debounce.as_millis() as u64, "Hot reload started");

        'outer: loop {
            let first = tokio::select! {
                _ = shutdown.recv() => break,
                next = events.recv() => match next {
                    Some(path) => path,
                    None => break,
                },
            };

            let mut burst = vec![first];
            loop {
                tokio::select! {
                    _ = shutdown.recv() => break 'outer,
                    next = tokio::time::timeout(self.debounce, events.recv()) => match next {
                        Ok(Some(path)) => {
                            if !burst.contains(&path) {
                                burst.push(path);
                            }
                        }
                        Ok(None) | Err(_) => break,
                    },
                }
            }

            for path in burst {
                let outcome = self.resolver.handle_change(&path).await;
                tracing::debug!(path = %path.display(), outcome = outcome.label(), "Change handled");
                if matches!(outcome, ChangeOutcome::Applied(_)) {
                    self.refresh_watches();
                }
            }
        }

        tracing::info!("Hot reload stopped");
    }

    fn refresh_watches(&mut self) {
        let Some((watches, graph)) = &mut self.watches else {
            return;
        };
        let targets = watch_targets(self.resolver.routes_dir(), self.resolver.watch_dirs(), graph);
        for dir in watches.extend(targets) {
            tracing::debug!(path = %dir.display(), "Watching newly imported directory");
        }
    }
}

//! Change resolution: from a changed file to the route overrides to refresh.
//!
//! # Responsibilities
//! - Classify a changed path (route file, other file under the routes root,
//!   external module)
//! - Treat files under the routes root that are not routes like external
//!   modules, without the allow-list
//! - Walk importer edges backward from external modules to route files
//! - Reload affected route files and publish them in the override registry
//!
//! # Design Decisions
//! - The importer walk is an explicit work-list with a visited set, so
//!   cycles terminate and no module is expanded twice
//! - Each affected route file is reloaded at most once per change
//! - A failed reload leaves the previous override (or static route) serving

use std::collections::{HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::config::AutoloadConfig;
use crate::module::{
    normalize_path, resolve_path, DiscoveryError, Export, ImportGraph, LoadError, ModuleLoader,
    RouteFilter,
};
use crate::observability::metrics;
use crate::reload::registry::OverrideRegistry;
use crate::routing::{to_posix, PathTranslator, RouteKey, RouteMethod};

/// A route file that could not be reloaded.
#[derive(Debug, Error)]
pub enum ReloadError {
    #[error("failed to reload {}: {source}", .path.display())]
    Load {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    #[error("{} doesn't have a default export", .path.display())]
    MissingDefaultExport { path: PathBuf },

    #[error("default export of {} is not a handler", .path.display())]
    NonCallableExport { path: PathBuf },

    #[error("cannot reload {}: {message}", .path.display())]
    Rejected { path: PathBuf, message: String },
}

impl ReloadError {
    pub fn path(&self) -> &Path {
        match self {
            ReloadError::Load { path, .. }
            | ReloadError::MissingDefaultExport { path }
            | ReloadError::NonCallableExport { path }
            | ReloadError::Rejected { path, .. } => path,
        }
    }
}

/// What a change event led to.
#[derive(Debug)]
pub enum ChangeOutcome {
    /// Not a route file and nothing under the routes root imports it, or
    /// outside the watched directories.
    Ignored,
    /// An external module that no route file depends on.
    NoImporters,
    /// Every affected route was reloaded.
    Applied(Vec<RouteKey>),
    /// At least one affected route failed to reload. Routes that did reload
    /// are live.
    Failed(Vec<ReloadError>),
}

impl ChangeOutcome {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            ChangeOutcome::Ignored => "ignored",
            ChangeOutcome::NoImporters => "no_importers",
            ChangeOutcome::Applied(_) => "applied",
            ChangeOutcome::Failed(_) => "failed",
        }
    }
}

/// Maps changed files to override updates.
pub struct ChangeResolver {
    routes_dir: PathBuf,
    filter: RouteFilter,
    translator: PathTranslator,
    watch_dirs: Vec<PathBuf>,
    loader: Arc<dyn ModuleLoader>,
    graph: Arc<dyn ImportGraph>,
    overrides: OverrideRegistry,
}

impl ChangeResolver {
    /// `routes_dir` should be the canonical root returned by the static pass.
    pub fn new(
        routes_dir: impl Into<PathBuf>,
        config: &AutoloadConfig,
        loader: Arc<dyn ModuleLoader>,
        graph: Arc<dyn ImportGraph>,
        overrides: OverrideRegistry,
    ) -> Result<Self, DiscoveryError> {
        Ok(Self {
            routes_dir: normalize_path(&routes_dir.into()),
            filter: RouteFilter::new(&config.pattern)?,
            translator: PathTranslator::new(config.prefix.clone(), &config.default_method),
            watch_dirs: Vec::new(),
            loader,
            graph,
            overrides,
        })
    }

    /// Only consider external changes under these directories.
    pub fn with_watch_dirs(mut self, dirs: impl IntoIterator<Item = PathBuf>) -> Self {
        self.watch_dirs = dirs.into_iter().map(|d| resolve_path(&d)).collect();
        self
    }

    pub fn routes_dir(&self) -> &Path {
        &self.routes_dir
    }

    pub fn watch_dirs(&self) -> &[PathBuf] {
        &self.watch_dirs
    }

    pub fn overrides(&self) -> &OverrideRegistry {
        &self.overrides
    }

    /// Posix path relative to the routes root, if `path` is a route file.
    fn route_relative(&self, path: &Path) -> Option<String> {
        let relative = path.strip_prefix(&self.routes_dir).ok()?;
        let relative = to_posix(&relative.to_string_lossy());
        self.filter.matches(&relative).then_some(relative)
    }

    /// Route files that depend on `changed`, found by walking importer edges
    /// backward until a route file is reached.
    pub fn affected_routes(&self, changed: &Path) -> Vec<PathBuf> {
        let start = normalize_path(changed);
        let mut affected = Vec::new();
        let mut visited = HashSet::from([start.clone()]);
        let mut queue = VecDeque::from([start]);

        while let Some(module) = queue.pop_front() {
            for importer in self.graph.importers_of(&module) {
                if !visited.insert(importer.clone()) {
                    continue;
                }
                if self.route_relative(&importer).is_some() {
                    affected.push(importer);
                } else {
                    queue.push_back(importer);
                }
            }
        }

        affected
    }

    /// Handle one change event.
    pub async fn handle_change(&self, path: &Path) -> ChangeOutcome {
        let path = normalize_path(path);

        let targets = if path.starts_with(&self.routes_dir) {
            if self.route_relative(&path).is_some() {
                vec![path.clone()]
            } else {
                // Not a route itself, but route files may import it.
                let affected = self.affected_routes(&path);
                if affected.is_empty() {
                    tracing::trace!(path = %path.display(), "Ignoring non-route file");
                    return self.finish(&path, ChangeOutcome::Ignored);
                }
                affected
            }
        } else {
            if !self.watch_dirs.is_empty() && !self.watch_dirs.iter().any(|d| path.starts_with(d)) {
                tracing::trace!(path = %path.display(), "Ignoring change outside watched directories");
                return self.finish(&path, ChangeOutcome::Ignored);
            }
            let affected = self.affected_routes(&path);
            if affected.is_empty() {
                tracing::debug!(path = %path.display(), "No route depends on changed module");
                return self.finish(&path, ChangeOutcome::NoImporters);
            }
            affected
        };

        let mut applied = Vec::new();
        let mut errors = Vec::new();
        for target in targets {
            match self.reload(&target).await {
                Ok(key) => applied.push(key),
                Err(e) => {
                    tracing::error!(error = %e, "Reload failed; keeping previous handler");
                    errors.push(e);
                }
            }
        }

        let outcome = if errors.is_empty() {
            ChangeOutcome::Applied(applied)
        } else {
            ChangeOutcome::Failed(errors)
        };
        self.finish(&path, outcome)
    }

    fn finish(&self, path: &Path, outcome: ChangeOutcome) -> ChangeOutcome {
        metrics::record_reload(outcome.label());
        if let ChangeOutcome::Applied(keys) = &outcome {
            tracing::info!(path = %path.display(), routes = keys.len(), "Hot reload applied");
        }
        outcome
    }

    /// Load a route file again and publish it as an override.
    pub async fn reload(&self, file: &Path) -> Result<RouteKey, ReloadError> {
        let rejected = |message: String| ReloadError::Rejected {
            path: file.to_path_buf(),
            message,
        };

        let relative = file
            .strip_prefix(&self.routes_dir)
            .map_err(|_| rejected("not under the routes directory".into()))?;
        let route = self.translator.translate(&to_posix(&relative.to_string_lossy()));
        let method = RouteMethod::parse(&route.method)
            .ok_or_else(|| rejected(format!("unknown method `{}`", route.method)))?;

        let module = self
            .loader
            .load(file)
            .await
            .map_err(|source| ReloadError::Load {
                path: file.to_path_buf(),
                source,
            })?;
        let handler = match module.default {
            Some(Export::Handler(handler)) => handler,
            Some(Export::Value(_)) => {
                return Err(ReloadError::NonCallableExport {
                    path: file.to_path_buf(),
                })
            }
            None => {
                return Err(ReloadError::MissingDefaultExport {
                    path: file.to_path_buf(),
                })
            }
        };

        let key = RouteKey::new(method, route.pattern);
        self.overrides.set(&key, handler);
        tracing::info!(route = %key, file = %file.display(), "Route reloaded");
        Ok(key)
    }
}

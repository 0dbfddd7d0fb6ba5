//! Startup orchestration.
//!
//! # Responsibilities
//! - Run the static loading pass into an axum Router
//! - In development mode, install override dispatch and prepare the
//!   change resolver
//! - Start the watcher and the hot reload task on request
//!
//! # Design Decisions
//! - Fail fast: any static loading error is fatal
//! - Routes are fully registered before a listener is served
//! - The hot reload task owns the watcher; it stops watching on shutdown

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::task::JoinHandle;

use crate::autoload::{AutoloadError, Autoloader, LoadReport};
use crate::config::AppConfig;
use crate::http::AxumRegistrar;
use crate::lifecycle::Shutdown;
use crate::module::{ModuleGraph, ModuleLoader};
use crate::reload::{watch_targets, ChangeResolver, HotReloader, OverrideRegistry, RouteWatcher};

/// Development-mode state.
pub struct DevMode {
    pub overrides: OverrideRegistry,
    pub resolver: Arc<ChangeResolver>,
    pub watch_dirs: Vec<PathBuf>,
    graph: Arc<ModuleGraph>,
    debounce: Duration,
}

/// A loaded application, ready to serve.
pub struct Application {
    pub router: Router,
    pub report: LoadReport,
    pub dev: Option<DevMode>,
}

impl Application {
    /// Load routes according to `config`.
    ///
    /// `graph` is the import graph the loader records into; pass an empty
    /// graph for loaders that have no imports.
    pub async fn build(
        config: &AppConfig,
        loader: Arc<dyn ModuleLoader>,
        graph: Arc<ModuleGraph>,
    ) -> Result<Self, AutoloadError> {
        let autoloader = Autoloader::new(config.routes.clone(), loader.clone());

        let overrides = config.hot_reload.enabled.then(OverrideRegistry::new);
        let mut registrar = match &overrides {
            Some(registry) => AxumRegistrar::new().with_overrides(registry.clone()),
            None => AxumRegistrar::new(),
        };

        let report = autoloader.load_into(&mut registrar).await?;
        let router = registrar.into_router();

        let dev = match overrides {
            Some(overrides) => {
                let resolver = ChangeResolver::new(
                    report.routes_dir.clone(),
                    &config.routes,
                    loader,
                    graph.clone(),
                    overrides.clone(),
                )?
                .with_watch_dirs(config.hot_reload.watch_dirs.clone());
                let watch_dirs = watch_targets(&report.routes_dir, resolver.watch_dirs(), &graph);
                Some(DevMode {
                    overrides,
                    resolver: Arc::new(resolver),
                    watch_dirs,
                    graph,
                    debounce: Duration::from_millis(config.hot_reload.debounce_ms),
                })
            }
            None => None,
        };

        Ok(Self { router, report, dev })
    }

    /// Start watching and spawn the hot reload task. Returns `None` outside
    /// development mode.
    pub fn start_hot_reload(
        &self,
        shutdown: &Shutdown,
    ) -> Result<Option<JoinHandle<()>>, notify::Error> {
        let Some(dev) = &self.dev else {
            return Ok(None);
        };

        let (watcher, events) = RouteWatcher::new(dev.watch_dirs.clone());
        let watches = watcher.run()?;

        let reloader = HotReloader::new(dev.resolver.clone(), dev.debounce)
            .with_watches(watches, dev.graph.clone());
        Ok(Some(tokio::spawn(reloader.run(events, shutdown.subscribe()))))
    }
}

//! Static route loading.
//!
//! # Data Flow
//! ```text
//! AutoloadConfig
//!     → resolve routes_dir (must exist and be a directory)
//!     → FileLister (pattern, routes_dir) → relative paths
//!     → PathTranslator → RouteFile { method, pattern }
//!     → sort by specificity
//!     → for each file: ModuleLoader → default export → RouteRegistrar
//!     → LoadReport
//! ```
//!
//! # Design Decisions
//! - Files are loaded one at a time, in registration order
//! - Load failures and missing default exports are fatal unless
//!   `skip_import_errors`; non-callable exports and registrar rejections are
//!   always skipped with a warning
//! - The routes root is canonicalised so paths agree with watcher events

pub mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

pub use error::{AutoloadError, SkipReason};

use crate::config::AutoloadConfig;
use crate::http::registrar::RouteRegistrar;
use crate::module::{resolve_path, Export, FileLister, GlobLister, ModuleLoader};
use crate::observability::metrics;
use crate::routing::{sort_by_specificity, PathTranslator, Route, RouteFile, RouteKey, RouteMethod};

/// A discovered file that was not registered.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: SkipReason,
}

/// Result of a successful loading pass.
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Canonical routes root.
    pub routes_dir: PathBuf,
    /// Registered routes, in registration order.
    pub registered: Vec<RouteKey>,
    pub skipped: Vec<SkippedFile>,
}

/// Discovered route files, in registration order.
#[derive(Debug, Clone, Serialize)]
pub struct RouteTable {
    pub routes_dir: PathBuf,
    pub files: Vec<RouteFile>,
}

/// Discovers, loads and registers route files.
pub struct Autoloader {
    config: AutoloadConfig,
    loader: Arc<dyn ModuleLoader>,
    lister: Arc<dyn FileLister>,
}

impl Autoloader {
    pub fn new(config: AutoloadConfig, loader: Arc<dyn ModuleLoader>) -> Self {
        Self {
            config,
            loader,
            lister: Arc::new(GlobLister),
        }
    }

    /// Replace the file lister.
    pub fn with_lister(mut self, lister: Arc<dyn FileLister>) -> Self {
        self.lister = lister;
        self
    }

    pub fn config(&self) -> &AutoloadConfig {
        &self.config
    }

    /// Translator configured with this loader's prefix and default method.
    pub fn translator(&self) -> PathTranslator {
        PathTranslator::new(self.config.prefix.clone(), &self.config.default_method)
    }

    /// Absolute, canonical routes root. Fails when it is missing or a file.
    pub fn resolve_routes_dir(&self) -> Result<PathBuf, AutoloadError> {
        let dir = &self.config.routes_dir;
        let absolute = if dir.is_absolute() {
            dir.clone()
        } else {
            std::env::current_dir().unwrap_or_default().join(dir)
        };

        match std::fs::metadata(&absolute) {
            Err(_) => Err(AutoloadError::DirectoryNotFound { path: absolute }),
            Ok(meta) if !meta.is_dir() => Err(AutoloadError::NotADirectory { path: absolute }),
            Ok(_) => Ok(resolve_path(&absolute)),
        }
    }

    /// Discover and translate route files without loading them.
    ///
    /// An empty result is an error unless `skip_no_routes` is set.
    pub fn discover(&self) -> Result<RouteTable, AutoloadError> {
        let routes_dir = self.resolve_routes_dir()?;
        let relative = self.lister.list_files(&self.config.pattern, &routes_dir)?;

        if relative.is_empty() && !self.config.skip_no_routes {
            return Err(AutoloadError::NoRoutesFound { path: routes_dir });
        }

        let translator = self.translator();
        let mut files: Vec<RouteFile> = relative.iter().map(|p| translator.translate(p)).collect();
        sort_by_specificity(&mut files);

        Ok(RouteTable { routes_dir, files })
    }

    /// Load every route file and register it.
    pub async fn load_into<R>(&self, registrar: &mut R) -> Result<LoadReport, AutoloadError>
    where
        R: RouteRegistrar + ?Sized,
    {
        let table = self.discover()?;
        let mut report = LoadReport {
            routes_dir: table.routes_dir.clone(),
            ..LoadReport::default()
        };

        if table.files.is_empty() {
            tracing::warn!(routes_dir = %table.routes_dir.display(), "No route files found");
            return Ok(report);
        }

        for file in table.files {
            let path = table.routes_dir.join(&file.path);
            match self.load_file(&file, &path, &mut *registrar).await? {
                Ok(key) => {
                    metrics::record_route_registered(key.method.key());
                    report.registered.push(key);
                }
                Err(reason) => {
                    metrics::record_route_skipped(reason.label());
                    report.skipped.push(SkippedFile { path, reason });
                }
            }
        }

        tracing::info!(
            routes_dir = %report.routes_dir.display(),
            registered = report.registered.len(),
            skipped = report.skipped.len(),
            "Routes loaded"
        );
        Ok(report)
    }

    /// Outer error is fatal; inner error is a skip.
    async fn load_file<R>(
        &self,
        file: &RouteFile,
        path: &Path,
        registrar: &mut R,
    ) -> Result<Result<RouteKey, SkipReason>, AutoloadError>
    where
        R: RouteRegistrar + ?Sized,
    {
        let module = match self.loader.load(path).await {
            Ok(module) => module,
            Err(source) if self.config.skip_import_errors => {
                tracing::warn!(file = %path.display(), error = %source, "Skipping route file that failed to load");
                return Ok(Err(SkipReason::LoadFailed(source.to_string())));
            }
            Err(source) => {
                return Err(AutoloadError::ModuleLoad {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let handler = match module.default {
            Some(Export::Handler(handler)) => handler,
            Some(Export::Value(_)) => {
                tracing::warn!(file = %path.display(), "Default export is not a handler; skipping");
                return Ok(Err(SkipReason::NonCallableExport));
            }
            None if self.config.skip_import_errors => {
                tracing::warn!(file = %path.display(), "No default export; skipping");
                return Ok(Err(SkipReason::MissingDefaultExport));
            }
            None => {
                return Err(AutoloadError::MissingDefaultExport {
                    path: path.to_path_buf(),
                })
            }
        };

        let Some(method) = RouteMethod::parse(&file.method) else {
            let reason = format!("unknown method `{}`", file.method);
            tracing::warn!(file = %path.display(), reason = %reason, "Route rejected");
            return Ok(Err(SkipReason::Rejected(reason)));
        };

        let route = Route {
            method,
            pattern: file.pattern.clone(),
            handler,
            source: path.to_path_buf(),
        };
        let key = route.key();
        match registrar.register(route) {
            Ok(()) => {
                tracing::debug!(route = %key, file = %file.path, "Route registered");
                Ok(Ok(key))
            }
            Err(e) => {
                tracing::warn!(route = %key, file = %path.display(), error = %e, "Route rejected");
                Ok(Err(SkipReason::Rejected(e.to_string())))
            }
        }
    }
}

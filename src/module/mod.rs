//! Module collaborators.
//!
//! # Data Flow
//! ```text
//! routes_dir + pattern
//!     → discovery.rs (enumerate relative file paths)
//!
//! absolute file path
//!     → ModuleLoader (registry.rs | manifest.rs)
//!     → Module { default: Option<Export> }
//!     → graph.rs records import edges (manifest loader)
//! ```
//!
//! # Design Decisions
//! - Loading is an injected capability; the core never reads modules itself
//! - Rust has no runtime import, so handlers come either from a registry
//!   filled at compile time or from response manifests read from disk
//! - Paths are normalised lexically so graph keys and watcher events agree

pub mod discovery;
pub mod graph;
pub mod handler;
pub mod manifest;
pub mod registry;

use std::path::{Component, Path, PathBuf};

use futures_util::future::BoxFuture;
use thiserror::Error;

pub use discovery::{DiscoveryError, FileLister, GlobLister, RouteFilter};
pub use graph::{ImportGraph, ModuleGraph};
pub use handler::{HandlerFuture, RouteHandler};
pub use manifest::ManifestLoader;
pub use registry::ModuleRegistry;

/// The default export of a module.
#[derive(Debug, Clone)]
pub enum Export {
    /// A callable route handler.
    Handler(RouteHandler),
    /// Exported data that cannot be called.
    Value(serde_json::Value),
}

/// A loaded module.
#[derive(Debug, Clone, Default)]
pub struct Module {
    pub default: Option<Export>,
}

impl Module {
    /// A module whose default export is a handler.
    pub fn handler(handler: RouteHandler) -> Self {
        Self {
            default: Some(Export::Handler(handler)),
        }
    }

    /// A module whose default export is plain data.
    pub fn value(value: serde_json::Value) -> Self {
        Self {
            default: Some(Export::Value(value)),
        }
    }

    /// A module with no default export.
    pub fn empty() -> Self {
        Self::default()
    }
}

/// Errors raised while loading a module.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("module {} not found", .path.display())]
    NotFound { path: PathBuf },

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid manifest {}: {message}", .path.display())]
    InvalidManifest { path: PathBuf, message: String },
}

/// Loads the module behind a file path.
pub trait ModuleLoader: Send + Sync {
    /// Load (or reload) the module at an absolute path.
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Module, LoadError>>;
}

/// Lexically normalise a path: drop `.`, resolve `..` against preceding
/// components. Does not touch the filesystem.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out.iter().map(|c| c.as_os_str()).collect()
}

/// Canonicalise when the path exists, otherwise normalise lexically.
pub fn resolve_path(path: &Path) -> PathBuf {
    std::fs::canonicalize(path).unwrap_or_else(|_| normalize_path(path))
}

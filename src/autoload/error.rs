//! Static loading errors and skip reasons.

use std::path::PathBuf;

use thiserror::Error;

use crate::module::{DiscoveryError, LoadError};

/// Fatal errors of the static loading pass.
#[derive(Debug, Error)]
pub enum AutoloadError {
    /// The routes root does not exist.
    #[error("Directory {} doesn't exist", .path.display())]
    DirectoryNotFound { path: PathBuf },

    /// The routes root exists but is a file.
    #[error("{} isn't a directory", .path.display())]
    NotADirectory { path: PathBuf },

    /// No file matched the pattern.
    #[error(
        "No matches found in {} (you can disable this error with the 'skip_no_routes' option set to true)",
        .path.display()
    )]
    NoRoutesFound { path: PathBuf },

    /// A route module has no default export.
    #[error(
        "{} doesn't have a default export (you can disable this error with the 'skip_import_errors' option set to true)",
        .path.display()
    )]
    MissingDefaultExport { path: PathBuf },

    /// A route module failed to load.
    #[error(
        "failed to load {} (you can disable this error with the 'skip_import_errors' option set to true): {source}",
        .path.display()
    )]
    ModuleLoad {
        path: PathBuf,
        #[source]
        source: LoadError,
    },

    /// Files could not be enumerated.
    #[error(transparent)]
    Discovery(#[from] DiscoveryError),
}

impl AutoloadError {
    /// The path the error is about, if any.
    pub fn path(&self) -> Option<&PathBuf> {
        match self {
            AutoloadError::DirectoryNotFound { path }
            | AutoloadError::NotADirectory { path }
            | AutoloadError::NoRoutesFound { path }
            | AutoloadError::MissingDefaultExport { path }
            | AutoloadError::ModuleLoad { path, .. } => Some(path),
            AutoloadError::Discovery(_) => None,
        }
    }
}

/// Why a discovered file was not registered. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// No default export (only when `skip_import_errors` is set).
    MissingDefaultExport,
    /// The default export is not callable.
    NonCallableExport,
    /// Loading failed (only when `skip_import_errors` is set).
    LoadFailed(String),
    /// The host framework rejected the route.
    Rejected(String),
}

impl SkipReason {
    /// Short label for logs and metrics.
    pub fn label(&self) -> &'static str {
        match self {
            SkipReason::MissingDefaultExport => "missing_default_export",
            SkipReason::NonCallableExport => "non_callable_export",
            SkipReason::LoadFailed(_) => "load_failed",
            SkipReason::Rejected(_) => "rejected",
        }
    }
}

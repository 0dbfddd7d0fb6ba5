//! File-based route autoloading for axum.
//!
//! Route files under a directory become HTTP routes: the file path is the URL
//! pattern, an optional `(method)` group picks the method, and the file's
//! default export is the handler. In development mode edits to route files,
//! or to modules they import, are picked up without a restart.

// Core subsystems
pub mod autoload;
pub mod config;
pub mod http;
pub mod module;
pub mod reload;
pub mod routing;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use autoload::{AutoloadError, Autoloader, LoadReport};
pub use config::schema::AppConfig;
pub use http::{AxumRegistrar, HttpServer, RouteRegistrar};
pub use lifecycle::{Application, Shutdown};
pub use module::{ManifestLoader, ModuleGraph, ModuleLoader, ModuleRegistry, RouteHandler};
pub use reload::OverrideRegistry;

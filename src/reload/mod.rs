//! Hot reload subsystem.
//!
//! # Data Flow
//! ```text
//! filesystem event (notify)
//!     → watcher.rs RouteWatcher → mpsc channel of paths
//!     → watcher.rs HotReloader (debounce, one path at a time)
//!     → resolver.rs ChangeResolver (route file | importer walk)
//!     → ModuleLoader (fresh module)
//!     → registry.rs OverrideRegistry::set
//!
//! Incoming request
//!     → middleware.rs override_dispatch
//!     → OverrideRegistry::resolve → override handler | static route
//! ```
//!
//! # Design Decisions
//! - Only active in development mode (`hot_reload.enabled`)
//! - Static routes stay registered; overrides shadow them
//! - One registry per server instance, shared by cloning

pub mod middleware;
pub mod registry;
pub mod resolver;
pub mod watcher;

pub use middleware::{override_dispatch, OverrideDispatch};
pub use registry::{OverrideMatch, OverrideRegistry};
pub use resolver::{ChangeOutcome, ChangeResolver, ReloadError};
pub use watcher::{watch_targets, HotReloader, RouteWatcher, WatchSet};

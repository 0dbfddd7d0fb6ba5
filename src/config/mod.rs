//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → CLI flags override individual fields
//!     → passed by value to the loader, server and reloader
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route edits are hot-reloaded, config is not
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, parse_config, ConfigError};
pub use schema::{AppConfig, AutoloadConfig, HotReloadConfig, ObservabilityConfig, ServerConfig};

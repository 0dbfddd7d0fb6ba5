//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Default glob for route discovery.
pub const DEFAULT_PATTERN: &str = "**/*.{toml,json}";

/// Default routes directory, relative to the working directory.
pub const DEFAULT_ROUTES_DIR: &str = "./routes";

/// Default method for files without a `(method)` group.
pub const DEFAULT_METHOD: &str = "get";

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener settings.
    pub server: ServerConfig,

    /// Route discovery and loading.
    pub routes: AutoloadConfig,

    /// Development-mode hot reload.
    pub hot_reload: HotReloadConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
            request_timeout_secs: 30,
        }
    }
}

/// Route discovery and loading options.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AutoloadConfig {
    /// Glob selecting route files, relative to `routes_dir`.
    pub pattern: String,

    /// Prefix prepended to every derived route (e.g. "/api").
    pub prefix: String,

    /// Directory searched for route files.
    pub routes_dir: PathBuf,

    /// Method used when a file name has no `(method)` group.
    pub default_method: String,

    /// Do not fail when no route file is found.
    pub skip_no_routes: bool,

    /// Log and skip files that fail to load or have no default export.
    pub skip_import_errors: bool,
}

impl Default for AutoloadConfig {
    fn default() -> Self {
        Self {
            pattern: DEFAULT_PATTERN.to_string(),
            prefix: String::new(),
            routes_dir: PathBuf::from(DEFAULT_ROUTES_DIR),
            default_method: DEFAULT_METHOD.to_string(),
            skip_no_routes: false,
            skip_import_errors: false,
        }
    }
}

/// Hot reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HotReloadConfig {
    /// Enable development mode: override dispatch plus file watching.
    pub enabled: bool,

    /// External directories whose edits are traced through the import graph.
    /// Empty means every change is considered.
    pub watch_dirs: Vec<PathBuf>,

    /// Window for collapsing bursts of change events, in milliseconds.
    pub debounce_ms: u64,
}

impl Default for HotReloadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            watch_dirs: Vec::new(),
            debounce_ms: 50,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.routes.pattern, DEFAULT_PATTERN);
        assert_eq!(config.routes.routes_dir, PathBuf::from("./routes"));
        assert_eq!(config.routes.default_method, "get");
        assert!(!config.routes.skip_no_routes);
        assert!(!config.routes.skip_import_errors);
        assert!(!config.hot_reload.enabled);
        assert!(config.hot_reload.watch_dirs.is_empty());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [routes]
            prefix = "/api"
            routes_dir = "test/routes"

            [hot_reload]
            enabled = true
            watch_dirs = ["src/shared"]
            "#,
        )
        .unwrap();

        assert_eq!(config.routes.prefix, "/api");
        assert_eq!(config.routes.routes_dir, PathBuf::from("test/routes"));
        assert_eq!(config.routes.pattern, DEFAULT_PATTERN);
        assert!(config.hot_reload.enabled);
        assert_eq!(config.hot_reload.watch_dirs, vec![PathBuf::from("src/shared")]);
        assert_eq!(config.hot_reload.debounce_ms, 50);
        assert_eq!(config.server.bind_address, "127.0.0.1:3000");
    }
}

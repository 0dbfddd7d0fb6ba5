//! Compile-time module registry.
//!
//! Rust handlers cannot be imported from a file at runtime, so applications
//! register them up front, keyed by the route file they stand for. The files
//! themselves still live under the routes directory (they drive discovery and
//! naming); the registry supplies what each one exports.
//!
//! Entries can be replaced while the server runs, which is how an embedding
//! application pushes a new handler for a file it has rebuilt.

use std::path::{Path, PathBuf};

use dashmap::DashMap;
use futures_util::future::BoxFuture;

use crate::module::{normalize_path, resolve_path, LoadError, Module, ModuleLoader, RouteHandler};

/// Path-keyed registry of modules.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    root: Option<PathBuf>,
    modules: DashMap<PathBuf, Module>,
}

impl ModuleRegistry {
    /// Registry whose keys are absolute paths.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry whose relative keys are resolved against `root`.
    pub fn with_root(root: impl AsRef<Path>) -> Self {
        Self {
            root: Some(resolve_path(root.as_ref())),
            modules: DashMap::new(),
        }
    }

    fn key(&self, path: &Path) -> PathBuf {
        match &self.root {
            Some(root) if path.is_relative() => normalize_path(&root.join(path)),
            _ => normalize_path(path),
        }
    }

    /// Insert or replace the module for a path.
    pub fn insert(&self, path: impl AsRef<Path>, module: Module) {
        let key = self.key(path.as_ref());
        tracing::debug!(path = %key.display(), "Module registered");
        self.modules.insert(key, module);
    }

    /// Shorthand for registering a handler as the default export.
    pub fn insert_handler(&self, path: impl AsRef<Path>, handler: RouteHandler) {
        self.insert(path, Module::handler(handler));
    }

    pub fn remove(&self, path: impl AsRef<Path>) -> Option<Module> {
        self.modules.remove(&self.key(path.as_ref())).map(|(_, m)| m)
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}

impl ModuleLoader for ModuleRegistry {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Module, LoadError>> {
        let key = self.key(path);
        let found = self.modules.get(&key).map(|r| r.value().clone());
        Box::pin(async move { found.ok_or(LoadError::NotFound { path: key }) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::module::Export;

    #[tokio::test]
    async fn test_load_registered_module() {
        let registry = ModuleRegistry::new();
        registry.insert_handler("/routes/index.rs", RouteHandler::new(|_req| async { "ok" }));

        let module = registry.load(Path::new("/routes/./index.rs")).await.unwrap();
        assert!(matches!(module.default, Some(Export::Handler(_))));
    }

    #[tokio::test]
    async fn test_missing_module_is_not_found() {
        let registry = ModuleRegistry::new();
        let err = registry.load(Path::new("/routes/nope.rs")).await.unwrap_err();
        assert!(matches!(err, LoadError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_relative_keys_use_root() {
        let registry = ModuleRegistry::with_root("/definitely/not/on/disk");
        registry.insert("users/[id].rs", Module::value(serde_json::json!(1)));

        let module = registry
            .load(Path::new("/definitely/not/on/disk/users/[id].rs"))
            .await
            .unwrap();
        assert!(matches!(module.default, Some(Export::Value(_))));
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_insert_replaces() {
        let registry = ModuleRegistry::new();
        registry.insert("/r/a.rs", Module::empty());
        registry.insert_handler("/r/a.rs", RouteHandler::new(|_req| async { "new" }));
        let module = registry.load(Path::new("/r/a.rs")).await.unwrap();
        assert!(module.default.is_some());
        assert_eq!(registry.len(), 1);
    }
}

//! Module import graph.
//!
//! Records which module imports which, so an edit to a shared file can be
//! traced back to the route files that depend on it. The graph may contain
//! cycles; consumers must track visited nodes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use dashmap::DashMap;

use crate::module::normalize_path;

/// Source of importer edges.
pub trait ImportGraph: Send + Sync {
    /// Modules that directly import `module`.
    fn importers_of(&self, module: &Path) -> Vec<PathBuf>;
}

/// Concurrent in-memory import graph.
#[derive(Debug, Default)]
pub struct ModuleGraph {
    /// module -> modules it imports.
    imports: DashMap<PathBuf, Vec<PathBuf>>,
    /// module -> modules importing it.
    importers: DashMap<PathBuf, HashSet<PathBuf>>,
}

impl ModuleGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the outgoing edges of `module`.
    pub fn set_imports(&self, module: &Path, imports: Vec<PathBuf>) {
        let module = normalize_path(module);
        let imports: Vec<PathBuf> = imports.iter().map(|p| normalize_path(p)).collect();

        let previous = self.imports.insert(module.clone(), imports.clone());
        for old in previous.unwrap_or_default() {
            if let Some(mut set) = self.importers.get_mut(&old) {
                set.remove(&module);
            }
            self.importers.remove_if(&old, |_, set| set.is_empty());
        }
        for imported in imports {
            self.importers
                .entry(imported)
                .or_default()
                .insert(module.clone());
        }
    }

    /// Add a single edge: `module` imports `imported`.
    pub fn add_import(&self, module: &Path, imported: &Path) {
        let module = normalize_path(module);
        let imported = normalize_path(imported);
        {
            let mut outgoing = self.imports.entry(module.clone()).or_default();
            if !outgoing.contains(&imported) {
                outgoing.push(imported.clone());
            }
        }
        self.importers.entry(imported).or_default().insert(module);
    }

    /// Modules imported by `module`, in declaration order.
    pub fn imports_of(&self, module: &Path) -> Vec<PathBuf> {
        self.imports
            .get(&normalize_path(module))
            .map(|r| r.value().clone())
            .unwrap_or_default()
    }

    /// Every module that appears in the graph.
    pub fn modules(&self) -> Vec<PathBuf> {
        let mut all: HashSet<PathBuf> = self.imports.iter().map(|r| r.key().clone()).collect();
        all.extend(self.importers.iter().map(|r| r.key().clone()));
        let mut all: Vec<PathBuf> = all.into_iter().collect();
        all.sort();
        all
    }

    /// Drop a module's outgoing edges.
    pub fn remove_module(&self, module: &Path) {
        self.set_imports(module, Vec::new());
        self.imports.remove(&normalize_path(module));
    }
}

impl ImportGraph for ModuleGraph {
    fn importers_of(&self, module: &Path) -> Vec<PathBuf> {
        let mut importers: Vec<PathBuf> = self
            .importers
            .get(&normalize_path(module))
            .map(|r| r.value().iter().cloned().collect())
            .unwrap_or_default();
        importers.sort();
        importers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_importers_are_reverse_edges() {
        let graph = ModuleGraph::new();
        graph.add_import(Path::new("/r/a.toml"), Path::new("/shared/x.toml"));
        graph.add_import(Path::new("/r/b.toml"), Path::new("/shared/x.toml"));

        assert_eq!(
            graph.importers_of(Path::new("/shared/x.toml")),
            vec![PathBuf::from("/r/a.toml"), PathBuf::from("/r/b.toml")]
        );
        assert!(graph.importers_of(Path::new("/r/a.toml")).is_empty());
    }

    #[test]
    fn test_set_imports_replaces_edges() {
        let graph = ModuleGraph::new();
        let route = Path::new("/r/a.toml");
        graph.set_imports(route, vec![PathBuf::from("/s/one.toml")]);
        graph.set_imports(route, vec![PathBuf::from("/s/two.toml")]);

        assert!(graph.importers_of(Path::new("/s/one.toml")).is_empty());
        assert_eq!(graph.importers_of(Path::new("/s/two.toml")), vec![route.to_path_buf()]);
        assert_eq!(graph.imports_of(route), vec![PathBuf::from("/s/two.toml")]);
    }

    #[test]
    fn test_dropped_imports_leave_the_graph() {
        let graph = ModuleGraph::new();
        let route = Path::new("/r/a.toml");
        graph.set_imports(route, vec![PathBuf::from("/s/one.toml")]);
        graph.add_import(Path::new("/r/b.toml"), Path::new("/s/two.toml"));
        graph.set_imports(route, vec![PathBuf::from("/s/two.toml")]);

        assert_eq!(
            graph.modules(),
            vec![
                PathBuf::from("/r/a.toml"),
                PathBuf::from("/r/b.toml"),
                PathBuf::from("/s/two.toml"),
            ]
        );

        graph.remove_module(route);
        graph.remove_module(Path::new("/r/b.toml"));
        assert!(graph.modules().is_empty());
    }

    #[test]
    fn test_paths_normalised() {
        let graph = ModuleGraph::new();
        graph.add_import(Path::new("/r/./a.toml"), Path::new("/r/../s/x.toml"));
        assert_eq!(graph.importers_of(Path::new("/s/x.toml")), vec![PathBuf::from("/r/a.toml")]);
    }

    #[test]
    fn test_remove_module() {
        let graph = ModuleGraph::new();
        graph.add_import(Path::new("/r/a.toml"), Path::new("/s/x.toml"));
        graph.remove_module(Path::new("/r/a.toml"));
        assert!(graph.importers_of(Path::new("/s/x.toml")).is_empty());
        assert!(!graph.modules().contains(&PathBuf::from("/r/a.toml")));
    }
}

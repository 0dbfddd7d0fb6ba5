//! Route file discovery.
//!
//! Enumerates files under the routes root that match the configured glob.
//! Patterns support `**`, `*`, `?`, character classes and one level of
//! `{a,b}` alternation per group (expanded into several globs).

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use thiserror::Error;
use walkdir::WalkDir;

use crate::routing::to_posix;

/// Errors raised while enumerating route files.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("invalid file pattern `{pattern}`: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("failed to walk {}: {message}", .root.display())]
    Walk { root: PathBuf, message: String },
}

/// Enumerates candidate route files.
pub trait FileLister: Send + Sync {
    /// Relative (posix) paths of files under `root` matching `pattern`.
    fn list_files(&self, pattern: &str, root: &Path) -> Result<Vec<String>, DiscoveryError>;
}

const MATCH_OPTIONS: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

/// Compiled file pattern, used both for discovery and to decide whether a
/// changed file under the routes root is a route.
#[derive(Debug, Clone)]
pub struct RouteFilter {
    source: String,
    patterns: Vec<Pattern>,
}

impl RouteFilter {
    pub fn new(pattern: &str) -> Result<Self, DiscoveryError> {
        let mut patterns = Vec::new();
        for expanded in expand_braces(pattern) {
            let compiled = Pattern::new(&expanded).map_err(|e| DiscoveryError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            patterns.push(compiled);
            // `**/` should also match files at the top level.
            if let Some(rest) = expanded.strip_prefix("**/") {
                if let Ok(compiled) = Pattern::new(rest) {
                    patterns.push(compiled);
                }
            }
        }
        Ok(Self {
            source: pattern.to_string(),
            patterns,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Whether a relative path matches.
    pub fn matches(&self, relative: &str) -> bool {
        let relative = to_posix(relative);
        self.patterns
            .iter()
            .any(|p| p.matches_with(&relative, MATCH_OPTIONS))
    }
}

/// Walks the filesystem and filters with a [`RouteFilter`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobLister;

impl FileLister for GlobLister {
    fn list_files(&self, pattern: &str, root: &Path) -> Result<Vec<String>, DiscoveryError> {
        let filter = RouteFilter::new(pattern)?;
        let mut files = Vec::new();

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|e| DiscoveryError::Walk {
                root: root.to_path_buf(),
                message: e.to_string(),
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let Ok(relative) = entry.path().strip_prefix(root) else {
                continue;
            };
            let relative = to_posix(&relative.to_string_lossy());
            if filter.matches(&relative) {
                files.push(relative);
            }
        }

        files.sort();
        Ok(files)
    }
}

/// Expand `{a,b}` groups: `**/*.{toml,json}` → `**/*.toml`, `**/*.json`.
pub fn expand_braces(pattern: &str) -> Vec<String> {
    let Some(open) = pattern.find('{') else {
        return vec![pattern.to_string()];
    };
    let Some(len) = pattern[open..].find('}') else {
        return vec![pattern.to_string()];
    };
    let close = open + len;
    let (head, body, tail) = (&pattern[..open], &pattern[open + 1..close], &pattern[close + 1..]);
    body.split(',')
        .flat_map(|alt| expand_braces(&format!("{}{}{}", head, alt, tail)))
        .collect()
}

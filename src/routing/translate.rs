//! File path → (method, pattern) translation.
//!
//! # Grammar
//! ```text
//! index.toml            → /
//! users/index.toml      → /users
//! users/[id].toml       → /users/:id
//! files/[...rest].toml  → /files/*
//! (post)users.toml      → POST /users
//! (delete)/users/x.toml → DELETE /users/x
//! ```
//!
//! # Design Decisions
//! - Pure function of (relative path, prefix, default method)
//! - Only the first method group sets the method; later groups are stripped
//! - Empty segments never produce doubled slashes

use serde::Serialize;

use crate::routing::pattern::{RoutePattern, Segment};
use crate::routing::specificity::SpecificityRank;

/// A discovered route file, parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteFile {
    /// Path relative to the routes root, posix separators.
    pub path: String,
    /// Lower-cased method token.
    pub method: String,
    /// Derived URL pattern.
    pub pattern: RoutePattern,
}

impl RouteFile {
    /// Ordering key for registration.
    pub fn rank(&self) -> SpecificityRank {
        SpecificityRank::of(self)
    }
}

/// Converts relative file paths into route files.
#[derive(Debug, Clone)]
pub struct PathTranslator {
    prefix: String,
    default_method: String,
}

impl PathTranslator {
    pub fn new(prefix: impl Into<String>, default_method: impl AsRef<str>) -> Self {
        Self {
            prefix: prefix.into(),
            default_method: default_method.as_ref().trim().to_ascii_lowercase(),
        }
    }

    pub fn default_method(&self) -> &str {
        &self.default_method
    }

    /// Translate a path relative to the routes root.
    pub fn translate(&self, relative: &str) -> RouteFile {
        let path = to_posix(relative);
        let mut raw: Vec<String> = strip_extension(&path)
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        drop_trailing_index(&mut raw);

        let mut method = None;
        let mut remaining = Vec::with_capacity(raw.len());
        for segment in raw {
            match split_method_group(&segment) {
                Some((token, rest)) => {
                    if method.is_none() {
                        method = Some(token.to_ascii_lowercase());
                    }
                    if !rest.is_empty() {
                        remaining.push(rest.to_string());
                    }
                }
                None => remaining.push(segment),
            }
        }

        drop_trailing_index(&mut remaining);

        let segments = remaining.iter().filter_map(|s| parse_segment(s)).collect();

        RouteFile {
            path,
            method: method.unwrap_or_else(|| self.default_method.clone()),
            pattern: RoutePattern::new(&self.prefix, segments),
        }
    }
}

/// Convert Windows separators to `/` and drop a leading `./` or `/`.
pub fn to_posix(path: &str) -> String {
    let replaced = path.replace('\\', "/");
    let trimmed = replaced.trim_start_matches("./").trim_start_matches('/');
    trimmed.to_string()
}

fn strip_extension(path: &str) -> &str {
    let file_start = path.rfind('/').map(|i| i + 1).unwrap_or(0);
    match path[file_start..].rfind('.') {
        // A leading dot is a hidden file name, not an extension.
        Some(0) | None => path,
        Some(dot) => &path[..file_start + dot],
    }
}

fn drop_trailing_index(segments: &mut Vec<String>) {
    if segments.last().map(String::as_str) == Some("index") {
        segments.pop();
    }
}

/// Split `(post)users` into `("post", "users")` and `(post)` into `("post", "")`.
fn split_method_group(segment: &str) -> Option<(&str, &str)> {
    let rest = segment.strip_prefix('(')?;
    let close = rest.find(')')?;
    Some((&rest[..close], &rest[close + 1..]))
}

fn parse_segment(segment: &str) -> Option<Segment> {
    if let Some(inner) = segment.strip_prefix('[').and_then(|s| s.strip_suffix(']')) {
        if let Some(name) = inner.strip_prefix("...") {
            return (!name.is_empty()).then(|| Segment::CatchAll(name.to_string()));
        }
        return (!inner.is_empty()).then(|| Segment::Param(inner.to_string()));
    }
    Some(Segment::Static(segment.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translate(path: &str) -> (String, String) {
        let file = PathTranslator::new("", "get").translate(path);
        (file.method, file.pattern.to_string())
    }

    #[test]
    fn test_index_maps_to_root() {
        assert_eq!(translate("index.toml"), ("get".into(), "/".into()));
        assert_eq!(translate("users/index.toml"), ("get".into(), "/users".into()));
    }

    #[test]
    fn test_index_only_when_last_segment() {
        assert_eq!(translate("index/users.toml").1, "/index/users");
        assert_eq!(translate("Index.toml").1, "/Index");
    }

    #[test]
    fn test_dynamic_and_catch_all() {
        assert_eq!(translate("users/[id].toml").1, "/users/:id");
        assert_eq!(translate("users/[...rest].toml").1, "/users/*");
        assert_eq!(translate("[org]/[repo]/index.json").1, "/:org/:repo");
    }

    #[test]
    fn test_method_group() {
        assert_eq!(translate("(post)users.toml"), ("post".into(), "/users".into()));
        assert_eq!(translate("users/(delete)[id].toml"), ("delete".into(), "/users/:id".into()));
        assert_eq!(translate("(PUT)/users/[id].toml"), ("put".into(), "/users/:id".into()));
        assert_eq!(translate("users/(post).toml"), ("post".into(), "/users".into()));
        assert_eq!(translate("(post)index.toml"), ("post".into(), "/".into()));
    }

    #[test]
    fn test_first_method_group_wins() {
        assert_eq!(translate("(post)/(put)users.toml"), ("post".into(), "/users".into()));
    }

    #[test]
    fn test_default_method_used() {
        let file = PathTranslator::new("", "PATCH").translate("users.toml");
        assert_eq!(file.method, "patch");
    }

    #[test]
    fn test_prefix() {
        let translator = PathTranslator::new("/api", "get");
        assert_eq!(translator.translate("users/[id].toml").pattern.to_string(), "/api/users/:id");
        assert_eq!(translator.translate("index.toml").pattern.to_string(), "/api");
    }

    #[test]
    fn test_no_doubled_slashes() {
        assert_eq!(translate("users//[].toml").1, "/users");
        assert_eq!(translate("[...].toml").1, "/");
        assert_eq!(translate("./a\\b.toml").1, "/a/b");
    }

    #[test]
    fn test_only_last_extension_stripped() {
        assert_eq!(translate("v1.2/users.list.toml").1, "/v1.2/users.list");
        assert_eq!(translate("users").1, "/users");
    }

    #[test]
    fn test_translation_is_idempotent() {
        let translator = PathTranslator::new("/api", "get");
        for path in ["index.toml", "users/[id].toml", "(post)a/[...b].json", "x/y/z.toml"] {
            assert_eq!(translator.translate(path), translator.translate(path));
        }
    }
}

//! Route matching logic.
//!
//! # Responsibilities
//! - Match a concrete request path against a route pattern
//! - Extract named parameters (`:id`, catch-all remainder)
//! - Combine method and path conditions
//!
//! # Design Decisions
//! - Static segments are case-sensitive and matched exactly
//! - Trailing slashes are significant, as in axum (`/users/` is not `/users`)
//! - A catch-all needs at least one remaining segment
//! - No regex to guarantee O(n) matching

use axum::http::Method;

use crate::routing::method::RouteMethod;
use crate::routing::pattern::{RoutePattern, Segment};

/// Parameters extracted from a matched path, in pattern order.
///
/// Inserted into request extensions before a route handler runs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteParams(Vec<(String, String)>);

impl RouteParams {
    /// Look up a parameter by name.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Trait for matching request paths against conditions.
pub trait Matcher: Send + Sync + std::fmt::Debug {
    /// Returns the extracted parameters if the path matches.
    fn match_path(&self, path: &str) -> Option<RouteParams>;
}

impl Matcher for RoutePattern {
    fn match_path(&self, path: &str) -> Option<RouteParams> {
        let rest = strip_prefix_segments(path, self.prefix())?;
        let parts: Vec<&str> = if rest.is_empty() || (rest == "/" && self.prefix().is_empty()) {
            Vec::new()
        } else {
            rest.strip_prefix('/')?.split('/').collect()
        };

        let mut params = Vec::new();
        let mut idx = 0;
        for segment in self.segments() {
            match segment {
                Segment::Static(text) => {
                    if parts.get(idx) != Some(&text.as_str()) {
                        return None;
                    }
                    idx += 1;
                }
                Segment::Param(name) => {
                    let value = parts.get(idx).filter(|v| !v.is_empty())?;
                    params.push((name.clone(), (*value).to_string()));
                    idx += 1;
                }
                Segment::CatchAll(name) => {
                    let remainder = parts.get(idx..).map(|p| p.join("/")).unwrap_or_default();
                    if remainder.is_empty() {
                        return None;
                    }
                    params.push((name.clone(), remainder));
                    idx = parts.len();
                }
            }
        }

        (idx == parts.len()).then_some(RouteParams(params))
    }
}

/// Matches both the HTTP method and the path.
#[derive(Debug, Clone)]
pub struct RouteMatcher {
    method: RouteMethod,
    pattern: RoutePattern,
}

impl RouteMatcher {
    pub fn new(method: RouteMethod, pattern: RoutePattern) -> Self {
        Self { method, pattern }
    }

    /// Returns the extracted parameters if method and path both match.
    pub fn matches(&self, method: &Method, path: &str) -> Option<RouteParams> {
        if !self.method.accepts(method) {
            return None;
        }
        self.pattern.match_path(path)
    }
}

fn strip_prefix_segments<'a>(path: &'a str, prefix: &str) -> Option<&'a str> {
    if prefix.is_empty() {
        return Some(path);
    }
    let rest = path.strip_prefix(prefix)?;
    // The prefix must end on a segment boundary: `/api` must not match `/apis`.
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}

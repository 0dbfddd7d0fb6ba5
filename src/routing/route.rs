//! Registration units handed to a host router.

use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::module::RouteHandler;
use crate::routing::method::RouteMethod;
use crate::routing::pattern::RoutePattern;

/// Identity of a registered route: method plus pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteKey {
    pub method: RouteMethod,
    pub pattern: RoutePattern,
}

impl RouteKey {
    pub fn new(method: RouteMethod, pattern: RoutePattern) -> Self {
        Self { method, pattern }
    }

    /// Flat lookup key: upper-case method immediately followed by the
    /// pattern (`GET/users/:id`, `ALL/api`).
    pub fn lookup_key(&self) -> String {
        lookup_key(self.method.key(), &self.pattern.to_string())
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.method, self.pattern)
    }
}

impl Serialize for RouteKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Build the flat lookup key from a method token and a path or pattern.
pub fn lookup_key(method: &str, path: &str) -> String {
    let mut key = method.to_ascii_uppercase();
    key.push_str(path);
    key
}

/// One route ready for registration.
#[derive(Debug, Clone)]
pub struct Route {
    pub method: RouteMethod,
    pub pattern: RoutePattern,
    pub handler: RouteHandler,
    /// File the route was loaded from.
    pub source: PathBuf,
}

impl Route {
    pub fn key(&self) -> RouteKey {
        RouteKey::new(self.method.clone(), self.pattern.clone())
    }
}

//! Live override table consulted before static routes.
//!
//! # Responsibilities
//! - Hold the latest handler for every route reloaded since startup
//! - Answer exact key lookups (`METHOD` + pattern)
//! - Resolve a concrete request path against overrides and the statically
//!   registered routes, so an override only wins where its route would
//!
//! # Design Decisions
//! - Lock-free reads via ArcSwap; writers copy the table (rcu)
//! - Reads never block the reload task and vice versa
//! - Static routes are recorded (without handlers) so pattern resolution
//!   respects precedence: an override for `/users/:id` never answers a
//!   request that the static `/users/new` route owns

use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use axum::http::Method;

use crate::module::RouteHandler;
use crate::routing::{
    head_fallback, lookup_key, Matcher, RouteKey, RouteMatcher, RouteMethod, RouteParams,
};

/// A resolved override.
#[derive(Debug, Clone)]
pub struct OverrideMatch {
    pub key: RouteKey,
    pub handler: RouteHandler,
    pub params: RouteParams,
}

#[derive(Debug, Clone)]
struct KnownRoute {
    key: RouteKey,
    lookup: String,
    matcher: RouteMatcher,
}

#[derive(Debug, Clone, Default)]
struct OverrideTable {
    /// Lookup key to live handler.
    handlers: HashMap<String, (RouteKey, RouteHandler)>,
    /// Every route the table knows about, most specific first.
    routes: Vec<KnownRoute>,
}

impl OverrideTable {
    fn know(&mut self, key: RouteKey) {
        let lookup = key.lookup_key();
        if self.routes.iter().any(|r| r.lookup == lookup) {
            return;
        }
        let matcher = RouteMatcher::new(key.method.clone(), key.pattern.clone());
        self.routes.push(KnownRoute {
            key,
            lookup,
            matcher,
        });
        self.routes.sort_by_cached_key(|r| {
            (
                r.key.pattern.catch_all_count(),
                r.key.pattern.dynamic_count(),
                Reverse(r.key.pattern.depth()),
                r.key.pattern.to_string(),
                // Specific methods before `ALL` on the same pattern.
                matches!(r.key.method, RouteMethod::All),
                r.key.method.key().to_string(),
            )
        });
    }
}

enum Lookup {
    Override(OverrideMatch),
    /// A route matched but has no override.
    Static,
    Miss,
}

impl OverrideTable {
    fn lookup(&self, method: &Method, path: &str) -> Lookup {
        for token in [method.as_str(), RouteMethod::All.key()] {
            if let Some((key, handler)) = self.handlers.get(&lookup_key(token, path)) {
                return Lookup::Override(OverrideMatch {
                    key: key.clone(),
                    handler: handler.clone(),
                    params: key.pattern.match_path(path).unwrap_or_default(),
                });
            }
        }

        let Some((route, params)) = self
            .routes
            .iter()
            .find_map(|r| r.matcher.matches(method, path).map(|params| (r, params)))
        else {
            return Lookup::Miss;
        };
        match self.handlers.get(&route.lookup) {
            Some((key, handler)) => Lookup::Override(OverrideMatch {
                key: key.clone(),
                handler: handler.clone(),
                params,
            }),
            None => Lookup::Static,
        }
    }
}

/// Shared override registry. Cloning is cheap and clones share the table.
#[derive(Debug, Clone)]
pub struct OverrideRegistry {
    table: Arc<ArcSwap<OverrideTable>>,
}

impl Default for OverrideRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl OverrideRegistry {
    pub fn new() -> Self {
        Self {
            table: Arc::new(ArcSwap::from_pointee(OverrideTable::default())),
        }
    }

    /// Record a statically registered route so pattern resolution can defer
    /// to it.
    pub fn register_static(&self, key: &RouteKey) {
        self.table.rcu(|current| {
            let mut next = OverrideTable::clone(current);
            next.know(key.clone());
            next
        });
    }

    /// Install or replace the override for a route.
    pub fn set(&self, key: &RouteKey, handler: RouteHandler) {
        self.table.rcu(|current| {
            let mut next = OverrideTable::clone(current);
            next.know(key.clone());
            next.handlers
                .insert(key.lookup_key(), (key.clone(), handler.clone()));
            next
        });
    }

    /// Drop the override for a route. Returns the handler that was removed.
    pub fn remove(&self, key: &RouteKey) -> Option<RouteHandler> {
        let lookup = key.lookup_key();
        let previous = self
            .table
            .load()
            .handlers
            .get(&lookup)
            .map(|(_, h)| h.clone());
        if previous.is_some() {
            self.table.rcu(|current| {
                let mut next = OverrideTable::clone(current);
                next.handlers.remove(&lookup);
                next
            });
        }
        previous
    }

    /// Exact lookup by method token and pattern text (`get`, `/users/:id`).
    pub fn get(&self, method: &str, path: &str) -> Option<RouteHandler> {
        self.table
            .load()
            .handlers
            .get(&lookup_key(method, path))
            .map(|(_, h)| h.clone())
    }

    /// Resolve a concrete request against the table.
    ///
    /// Order: exact `METHOD` + path key, exact `ALL` + path key, then the
    /// first known route (most specific first) whose method and pattern
    /// match. The last step only yields a hit when that route has an override.
    /// A `HEAD` request that no route answers is retried as `GET`.
    pub fn resolve(&self, method: &Method, path: &str) -> Option<OverrideMatch> {
        let table = self.table.load();
        if table.handlers.is_empty() {
            return None;
        }

        match table.lookup(method, path) {
            Lookup::Override(hit) => Some(hit),
            Lookup::Static => None,
            Lookup::Miss => match table.lookup(&head_fallback(method)?, path) {
                Lookup::Override(hit) => Some(hit),
                Lookup::Static | Lookup::Miss => None,
            },
        }
    }

    /// Number of live overrides.
    pub fn len(&self) -> usize {
        self.table.load().handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.load().handlers.is_empty()
    }

    /// Keys of live overrides, sorted.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.table.load().handlers.keys().cloned().collect();
        keys.sort();
        keys
    }
}

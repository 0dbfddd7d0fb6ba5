//! Route registration into the host router.
//!
//! # Responsibilities
//! - Accept `(method, pattern, handler)` registrations in specificity order
//! - Convert derived patterns to axum path syntax (`{id}`, `{*rest}`)
//! - Reject routes the host cannot express instead of panicking
//! - Optionally put override dispatch in front of every route
//!
//! # Design Decisions
//! - First registration wins: a later route with the same shape and an
//!   overlapping method is skipped with [`RegisterError::Duplicate`]
//! - Parameter names are canonicalised per path shape, so `/users/:id` and
//!   `/users/:user/posts` share one `{id}` node; handlers read params from the
//!   [`RouteParams`] extension which keeps the file's own names
//! - axum cannot hold a named parameter and a catch-all under the same
//!   parent. A catch-all registered after such a parameter, and every
//!   catch-all after it, is served from the router fallback, which tries the
//!   deferred routes in registration order. A request whose path matches an
//!   axum route but whose method does not still gets axum's 405
//! - Override dispatch is applied once, at [`AxumRegistrar::into_router`]

use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::Request;
use axum::http::{Method, StatusCode};
use axum::middleware::from_fn_with_state;
use axum::response::{IntoResponse, Response};
use axum::routing::{any, on, MethodFilter, MethodRouter};
use axum::Router;
use thiserror::Error;

use crate::http::request::ExtractIdentity;
use crate::module::{HandlerFuture, RouteHandler};
use crate::reload::middleware::{override_dispatch, OverrideDispatch};
use crate::reload::registry::OverrideRegistry;
use crate::routing::{
    head_fallback, Matcher, Route, RouteKey, RouteMatcher, RouteMethod, RoutePattern, Segment,
};

/// Why the host refused a route.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegisterError {
    #[error("{key} is shadowed by {existing}")]
    Duplicate { key: RouteKey, existing: RouteKey },

    #[error("method `{method}` is not supported by the router")]
    UnsupportedMethod { method: String },

    #[error("cannot express `{pattern}`: {message}")]
    InvalidPath { pattern: String, message: String },
}

/// Receives routes from the loader.
pub trait RouteRegistrar {
    fn register(&mut self, route: Route) -> Result<(), RegisterError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeKind {
    Param,
    CatchAll,
}

/// A pattern converted to axum syntax, not yet committed.
struct AxumPath {
    path: String,
    /// Shape prefix to the canonical param name chosen for it.
    names: Vec<(String, String)>,
    /// Parent shape of every dynamic segment.
    nodes: Vec<(String, NodeKind)>,
}

/// A route axum cannot hold, served from the fallback.
struct DeferredRoute {
    matcher: RouteMatcher,
    handler: RouteHandler,
}

/// Registers routes on an axum [`Router`].
pub struct AxumRegistrar {
    router: Router,
    /// Path shape to the methods already registered on it.
    taken: HashMap<String, Vec<RouteKey>>,
    /// Shape prefix (ending in a dynamic segment) to the axum param name.
    param_names: HashMap<String, String>,
    /// Parent shape to the kind of dynamic child axum holds there.
    dynamic_nodes: HashMap<String, NodeKind>,
    deferred: Vec<DeferredRoute>,
    registered: Vec<RouteKey>,
    dispatch: Option<OverrideDispatch>,
}

impl Default for AxumRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

impl AxumRegistrar {
    pub fn new() -> Self {
        Self::from_router(Router::new())
    }

    /// Register on top of an existing router. A fallback set on `router` is
    /// replaced if any route has to be deferred.
    pub fn from_router(router: Router) -> Self {
        Self {
            router,
            taken: HashMap::new(),
            param_names: HashMap::new(),
            dynamic_nodes: HashMap::new(),
            deferred: Vec::new(),
            registered: Vec::new(),
            dispatch: None,
        }
    }

    /// Consult `registry` before every registered route.
    pub fn with_overrides(mut self, registry: OverrideRegistry) -> Self {
        self.dispatch = Some(OverrideDispatch::new(registry));
        self
    }

    /// Replace the identity adapter used by override dispatch.
    pub fn with_identity(mut self, identity: Arc<dyn ExtractIdentity>) -> Self {
        self.dispatch = self.dispatch.map(|d| d.with_identity(identity));
        self
    }

    /// Routes registered so far, in registration order.
    pub fn routes(&self) -> &[RouteKey] {
        &self.registered
    }

    /// Finish registration.
    pub fn into_router(self) -> Router {
        let mut router = self.router;
        if !self.deferred.is_empty() {
            let deferred = Arc::new(self.deferred);
            router = router.fallback(move |req: Request| dispatch_deferred(deferred.clone(), req));
        }
        match self.dispatch {
            Some(dispatch) => router.layer(from_fn_with_state(dispatch, override_dispatch)),
            None => router,
        }
    }

    fn axum_path(&self, pattern: &RoutePattern) -> Result<AxumPath, RegisterError> {
        let invalid = |message: String| RegisterError::InvalidPath {
            pattern: pattern.to_string(),
            message,
        };

        for segment in pattern.prefix().split('/') {
            if segment.contains(['{', '}']) || segment.starts_with([':', '*']) {
                return Err(invalid(format!("prefix segment `{segment}` uses reserved characters")));
            }
        }

        let mut path = pattern.prefix().to_string();
        let mut shape = pattern.prefix().to_string();
        let mut names: Vec<(String, String)> = Vec::new();
        let mut nodes = Vec::new();
        let last = pattern.segments().len().saturating_sub(1);

        for (i, segment) in pattern.segments().iter().enumerate() {
            match segment {
                Segment::Static(s) => {
                    if s.contains(['{', '}']) || s.starts_with([':', '*']) {
                        return Err(invalid(format!("segment `{s}` uses reserved characters")));
                    }
                    path.push('/');
                    path.push_str(s);
                    shape.push('/');
                    shape.push_str(s);
                }
                Segment::Param(name) | Segment::CatchAll(name) => {
                    let catch_all = segment.is_catch_all();
                    if catch_all && i != last {
                        return Err(invalid("catch-all must be the last segment".into()));
                    }
                    if name.contains(['{', '}', '*']) {
                        return Err(invalid(format!("parameter `{name}` uses reserved characters")));
                    }
                    let kind = if catch_all { NodeKind::CatchAll } else { NodeKind::Param };
                    nodes.push((shape.clone(), kind));

                    shape.push_str(if catch_all { "/*" } else { "/:" });
                    let mut canonical = self
                        .param_names
                        .get(&shape)
                        .cloned()
                        .unwrap_or_else(|| name.clone());
                    // axum rejects repeated names within one path.
                    while names.iter().any(|(_, n)| *n == canonical) {
                        canonical.push('_');
                    }
                    path.push_str(if catch_all { "/{*" } else { "/{" });
                    path.push_str(&canonical);
                    path.push('}');
                    names.push((shape.clone(), canonical));
                }
            }
        }

        if path.is_empty() {
            path.push('/');
        }
        Ok(AxumPath { path, names, nodes })
    }

    /// The kind axum already holds at a node where `nodes` wants the other
    /// kind, if any. A parameter clashing with a catch-all takes precedence.
    fn node_conflict(&self, nodes: &[(String, NodeKind)]) -> Option<(NodeKind, NodeKind)> {
        let clashes: Vec<(NodeKind, NodeKind)> = nodes
            .iter()
            .filter_map(|(node, kind)| {
                let held = *self.dynamic_nodes.get(node)?;
                (held != *kind).then_some((held, *kind))
            })
            .collect();
        clashes
            .iter()
            .find(|(_, wanted)| *wanted == NodeKind::Param)
            .or_else(|| clashes.first())
            .copied()
    }
}

fn method_filter(method: &RouteMethod) -> Result<Option<MethodFilter>, RegisterError> {
    match method {
        RouteMethod::All => Ok(None),
        RouteMethod::Only(m) => MethodFilter::try_from(m.clone())
            .map(Some)
            .map_err(|_| RegisterError::UnsupportedMethod {
                method: m.to_string(),
            }),
    }
}

fn method_router<F>(filter: Option<MethodFilter>, endpoint: F) -> MethodRouter
where
    F: Fn(Request) -> HandlerFuture + Clone + Send + Sync + 'static,
{
    match filter {
        Some(filter) => on(filter, endpoint),
        None => any(endpoint),
    }
}

async fn dispatch_deferred(routes: Arc<Vec<DeferredRoute>>, mut req: Request) -> Response {
    let hit = {
        let path = req.uri().path();
        let find = |method: &Method| {
            routes.iter().find_map(|r| {
                r.matcher
                    .matches(method, path)
                    .map(|params| (r.handler.clone(), params))
            })
        };
        find(req.method()).or_else(|| find(&head_fallback(req.method())?))
    };

    match hit {
        Some((handler, params)) => {
            req.extensions_mut().insert(params);
            handler.call(req).await
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

impl RouteRegistrar for AxumRegistrar {
    fn register(&mut self, route: Route) -> Result<(), RegisterError> {
        let key = route.key();
        let shape = route.pattern.shape();

        if let Some(existing) = self
            .taken
            .get(&shape)
            .and_then(|keys| keys.iter().find(|k| k.method.overlaps(&route.method)))
        {
            return Err(RegisterError::Duplicate {
                key,
                existing: existing.clone(),
            });
        }

        let filter = method_filter(&route.method)?;
        let target = self.axum_path(&route.pattern)?;

        let defer = match self.node_conflict(&target.nodes) {
            Some((NodeKind::CatchAll, NodeKind::Param)) => {
                return Err(RegisterError::InvalidPath {
                    pattern: route.pattern.to_string(),
                    message: "a catch-all was registered at the same position first".into(),
                });
            }
            Some(_) => true,
            // Keep catch-alls in registration order once one is deferred.
            None => !self.deferred.is_empty() && route.pattern.catch_all_count() > 0,
        };

        if defer {
            tracing::debug!(route = %key, source = %route.source.display(), "Serving route from fallback");
            self.deferred.push(DeferredRoute {
                matcher: RouteMatcher::new(route.method.clone(), route.pattern.clone()),
                handler: route.handler.clone(),
            });
        } else {
            let handler = route.handler.clone();
            let pattern = route.pattern.clone();
            let endpoint = move |mut req: Request| {
                if let Some(params) = pattern.match_path(req.uri().path()) {
                    req.extensions_mut().insert(params);
                }
                handler.call(req)
            };

            tracing::debug!(route = %key, path = %target.path, source = %route.source.display(), "Registering route");

            self.router = std::mem::take(&mut self.router)
                .route(&target.path, method_router(filter, endpoint));
            self.param_names.extend(target.names);
            for (node, kind) in target.nodes {
                self.dynamic_nodes.entry(node).or_insert(kind);
            }
        }

        if let Some(dispatch) = &self.dispatch {
            dispatch.registry().register_static(&key);
        }
        self.taken.entry(shape).or_default().push(key.clone());
        self.registered.push(key);
        Ok(())
    }
}

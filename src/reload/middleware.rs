//! Override dispatch middleware.
//!
//! Installed in front of every statically registered route when hot reload
//! is on. A request that resolves to a live override is answered by the
//! override handler; everything else continues down the stack untouched.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;

use crate::http::request::{ExtractIdentity, UriPathIdentity};
use crate::observability::metrics;
use crate::reload::registry::OverrideRegistry;

/// State for [`override_dispatch`].
#[derive(Clone)]
pub struct OverrideDispatch {
    registry: OverrideRegistry,
    identity: Arc<dyn ExtractIdentity>,
}

impl OverrideDispatch {
    pub fn new(registry: OverrideRegistry) -> Self {
        Self {
            registry,
            identity: Arc::new(UriPathIdentity),
        }
    }

    /// Replace the request identity adapter.
    pub fn with_identity(mut self, identity: Arc<dyn ExtractIdentity>) -> Self {
        self.identity = identity;
        self
    }

    pub fn registry(&self) -> &OverrideRegistry {
        &self.registry
    }
}

impl std::fmt::Debug for OverrideDispatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OverrideDispatch")
            .field("overrides", &self.registry.len())
            .finish()
    }
}

/// Serve the live override for the request if one exists.
pub async fn override_dispatch(
    State(dispatch): State<OverrideDispatch>,
    mut request: Request,
    next: Next,
) -> Response {
    let identity = dispatch.identity.extract(&request);
    match dispatch.registry.resolve(&identity.method, &identity.path) {
        Some(hit) => {
            tracing::debug!(
                method = %identity.method,
                path = %identity.path,
                route = %hit.key,
                "Serving reloaded handler"
            );
            metrics::record_override_hit();
            request.extensions_mut().insert(hit.params);
            hit.handler.call(request).await
        }
        None => next.run(request).await,
    }
}

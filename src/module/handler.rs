//! Type-erased route handlers.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use axum::extract::Request;
use axum::handler::Handler;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;

/// Future returned by a [`RouteHandler`].
pub type HandlerFuture = BoxFuture<'static, Response>;

type HandlerFn = dyn Fn(Request) -> HandlerFuture + Send + Sync;

/// A cloneable async function from request to response.
///
/// Cloning is cheap (one `Arc`); replacing a handler means swapping the
/// whole value, never mutating it in place.
#[derive(Clone)]
pub struct RouteHandler {
    inner: Arc<HandlerFn>,
}

impl RouteHandler {
    /// Wrap an async closure.
    pub fn new<F, Fut, R>(f: F) -> Self
    where
        F: Fn(Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = R> + Send + 'static,
        R: IntoResponse + 'static,
    {
        Self {
            inner: Arc::new(move |req: Request| -> HandlerFuture {
                let fut = f(req);
                Box::pin(async move { fut.await.into_response() })
            }),
        }
    }

    /// Wrap any stateless axum handler, so extractors work as usual.
    pub fn from_handler<H, T>(handler: H) -> Self
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        Self {
            inner: Arc::new(move |req: Request| -> HandlerFuture {
                Box::pin(handler.clone().call(req, ()))
            }),
        }
    }

    /// Invoke the handler.
    pub fn call(&self, req: Request) -> HandlerFuture {
        (self.inner)(req)
    }

    /// Whether two values share the same underlying function.
    pub fn ptr_eq(&self, other: &RouteHandler) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("ptr", &Arc::as_ptr(&self.inner))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_closure_handler() {
        let handler = RouteHandler::new(|_req| async { (StatusCode::CREATED, "made") });
        let res = handler.call(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    #[tokio::test]
    async fn test_axum_handler() {
        async fn hello() -> &'static str {
            "hello"
        }
        let handler = RouteHandler::from_handler(hello);
        let res = handler.call(Request::new(Body::empty())).await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = axum::body::to_bytes(res.into_body(), 1024).await.unwrap();
        assert_eq!(&body[..], b"hello");
    }

    #[test]
    fn test_clone_shares_function() {
        let a = RouteHandler::new(|_req| async { "a" });
        let b = a.clone();
        let c = RouteHandler::new(|_req| async { "a" });
        assert!(a.ptr_eq(&b));
        assert!(!a.ptr_eq(&c));
    }
}

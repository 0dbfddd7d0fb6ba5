//! HTTP subsystem.
//!
//! # Data Flow
//! ```text
//! Route (method, pattern, handler)
//!     → registrar.rs (axum path syntax, duplicate detection)
//!     → axum Router [+ override dispatch layer in dev mode]
//!     → server.rs (request ID, trace, timeout layers)
//!     → TcpListener
//!
//! Incoming request
//!     → request.rs (request ID, identity for override lookup)
//!     → matched route handler (RouteParams in extensions)
//! ```

pub mod registrar;
pub mod request;
pub mod server;

pub use registrar::{AxumRegistrar, RegisterError, RouteRegistrar};
pub use request::{
    extract_request_identity, ExtractIdentity, OriginalPathIdentity, RequestIdentity, UriPathIdentity,
    UuidRequestId, X_REQUEST_ID,
};
pub use server::HttpServer;

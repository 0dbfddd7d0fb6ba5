//! Shared utilities for integration tests.

#![allow(dead_code)]

use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::Request;
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Router;
use route_autoload::config::ServerConfig;
use route_autoload::{HttpServer, ManifestLoader, ModuleGraph, Shutdown};
use tempfile::TempDir;
use tokio::net::TcpListener;
use tower::ServiceExt;

/// A temporary project with a `routes/` directory.
pub struct RouteTree {
    _dir: TempDir,
    root: PathBuf,
}

impl RouteTree {
    pub fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().canonicalize().unwrap();
        fs::create_dir_all(root.join("routes")).unwrap();
        Self { _dir: dir, root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn routes_dir(&self) -> PathBuf {
        self.root.join("routes")
    }

    /// Write a file relative to the project root and return its path.
    pub fn write(&self, relative: &str, content: &str) -> PathBuf {
        let path = self.root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, content).unwrap();
        path
    }

    /// Write a route manifest answering with `body`.
    pub fn route(&self, relative: &str, body: &str) -> PathBuf {
        self.write(&format!("routes/{relative}"), &manifest(body))
    }
}

/// A manifest whose default export answers with a plain-text body.
pub fn manifest(body: &str) -> String {
    format!("[default]\nbody = {:?}\n", body)
}

/// Manifest loader plus the graph it records into.
pub fn manifest_loader() -> (Arc<ManifestLoader>, Arc<ModuleGraph>) {
    let graph = Arc::new(ModuleGraph::new());
    (Arc::new(ManifestLoader::new(graph.clone())), graph)
}

/// Send one request through a router in-process.
pub async fn send(router: &Router, method: Method, uri: &str) -> (StatusCode, HeaderMap, String) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let headers = response.headers().clone();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, headers, String::from_utf8(bytes.to_vec()).unwrap())
}

/// GET a path and return the body.
pub async fn get_body(router: &Router, uri: &str) -> String {
    send(router, Method::GET, uri).await.2
}

/// Serve `routes` on an ephemeral port.
pub async fn start_server(routes: Router) -> (SocketAddr, Shutdown) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Shutdown::new();
    let server = HttpServer::new(routes, &ServerConfig::default());
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    (addr, shutdown)
}

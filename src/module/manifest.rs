//! Response manifests.
//!
//! A manifest is a TOML or JSON file whose default export describes a fixed
//! response. Manifests can import shared files; imported headers are merged
//! into the route's response, and every import is recorded in the
//! [`ModuleGraph`] so edits to shared files reach the routes using them.
//!
//! ```toml
//! imports = ["../shared/cors.toml"]
//!
//! [default]
//! status = 200
//! content_type = "text/plain"
//! body = "hello"
//! headers = { x-powered-by = "route-autoload" }
//! ```

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::header::{HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use futures_util::future::BoxFuture;
use serde::Deserialize;

use crate::module::{normalize_path, LoadError, Module, ModuleGraph, ModuleLoader, RouteHandler};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ManifestDocument {
    imports: Vec<String>,
    headers: BTreeMap<String, String>,
    default: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ResponseSpec {
    #[serde(default = "default_status")]
    status: u16,
    body: Option<String>,
    json: Option<serde_json::Value>,
    content_type: Option<String>,
    #[serde(default)]
    headers: BTreeMap<String, String>,
}

fn default_status() -> u16 {
    200
}

/// A fully validated response, cloned for every request.
#[derive(Debug, Clone)]
struct PreparedResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: String,
}

impl IntoResponse for PreparedResponse {
    fn into_response(self) -> Response {
        (self.status, self.headers, self.body).into_response()
    }
}

/// Loads response manifests from disk, recording import edges.
#[derive(Debug, Clone)]
pub struct ManifestLoader {
    graph: Arc<ModuleGraph>,
}

impl ManifestLoader {
    pub fn new(graph: Arc<ModuleGraph>) -> Self {
        Self { graph }
    }

    /// The graph populated by this loader.
    pub fn graph(&self) -> &Arc<ModuleGraph> {
        &self.graph
    }

    async fn load_manifest(&self, path: &Path) -> Result<Module, LoadError> {
        let path = normalize_path(path);
        let doc = read_document(&path).await?;

        let mut queue: VecDeque<PathBuf> = self.record_imports(&path, &doc).into();
        let mut visited: HashSet<PathBuf> = HashSet::from([path.clone()]);
        let mut headers = BTreeMap::new();

        // Breadth-first over imports; cycles are cut by `visited`.
        while let Some(next) = queue.pop_front() {
            if !visited.insert(next.clone()) {
                continue;
            }
            let imported = read_document(&next).await?;
            queue.extend(self.record_imports(&next, &imported));
            headers.extend(imported.headers);
        }

        match doc.default {
            None => Ok(Module::empty()),
            Some(serde_json::Value::Object(map)) => {
                let spec: ResponseSpec = serde_json::from_value(serde_json::Value::Object(map))
                    .map_err(|e| LoadError::InvalidManifest {
                        path: path.clone(),
                        message: e.to_string(),
                    })?;
                let prepared = prepare(&path, spec, headers)?;
                Ok(Module::handler(RouteHandler::new(move |_req| {
                    let response = prepared.clone();
                    async move { response }
                })))
            }
            Some(other) => Ok(Module::value(other)),
        }
    }

    fn record_imports(&self, module: &Path, doc: &ManifestDocument) -> Vec<PathBuf> {
        let base = module.parent().unwrap_or_else(|| Path::new("/"));
        let imports: Vec<PathBuf> = doc
            .imports
            .iter()
            .map(|i| normalize_path(&base.join(i)))
            .collect();
        self.graph.set_imports(module, imports.clone());
        imports
    }
}

impl ModuleLoader for ManifestLoader {
    fn load<'a>(&'a self, path: &'a Path) -> BoxFuture<'a, Result<Module, LoadError>> {
        Box::pin(self.load_manifest(path))
    }
}

async fn read_document(path: &Path) -> Result<ManifestDocument, LoadError> {
    let content = tokio::fs::read_to_string(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            LoadError::NotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source: e,
            }
        }
    })?;

    let is_json = path.extension().and_then(|e| e.to_str()) == Some("json");
    let parsed: Result<ManifestDocument, String> = if is_json {
        serde_json::from_str(&content).map_err(|e| e.to_string())
    } else {
        toml::from_str(&content).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| LoadError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

fn prepare(
    path: &Path,
    spec: ResponseSpec,
    imported_headers: BTreeMap<String, String>,
) -> Result<PreparedResponse, LoadError> {
    let invalid = |message: String| LoadError::InvalidManifest {
        path: path.to_path_buf(),
        message,
    };

    let status = StatusCode::from_u16(spec.status)
        .map_err(|_| invalid(format!("invalid status code {}", spec.status)))?;

    let (body, default_type) = match (spec.body, spec.json) {
        (Some(_), Some(_)) => return Err(invalid("`body` and `json` are mutually exclusive".into())),
        (Some(body), None) => (body, "text/plain; charset=utf-8"),
        (None, Some(json)) => (json.to_string(), "application/json"),
        (None, None) => (String::new(), "text/plain; charset=utf-8"),
    };

    let mut merged = imported_headers;
    merged.extend(spec.headers);

    let mut headers = HeaderMap::new();
    for (name, value) in &merged {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| invalid(format!("invalid header name `{}`", name)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|_| invalid(format!("invalid value for header `{}`", name)))?;
        headers.insert(name, value);
    }

    let content_type = spec.content_type.as_deref().unwrap_or(default_type);
    if spec.content_type.is_some() || !headers.contains_key(CONTENT_TYPE) {
        let value = HeaderValue::from_str(content_type)
            .map_err(|_| invalid(format!("invalid content type `{}`", content_type)))?;
        headers.insert(CONTENT_TYPE, value);
    }

    Ok(PreparedResponse {
        status,
        headers,
        body,
    })
}

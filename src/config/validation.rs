//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check the discovery pattern compiles
//! - Check the default method is a usable method token
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Directory existence is not checked here; the loader reports it at startup

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::AppConfig;
use crate::module::RouteFilter;
use crate::routing::RouteMethod;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.server.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "server.bind_address",
            format!("`{}` is not a socket address", config.server.bind_address),
        ));
    }
    if config.server.request_timeout_secs == 0 {
        errors.push(ValidationError::new("server.request_timeout_secs", "must be greater than 0"));
    }

    let routes = &config.routes;
    if routes.routes_dir.as_os_str().is_empty() {
        errors.push(ValidationError::new("routes.routes_dir", "must not be empty"));
    }
    if let Err(e) = RouteFilter::new(&routes.pattern) {
        errors.push(ValidationError::new("routes.pattern", e.to_string()));
    }
    if RouteMethod::parse(&routes.default_method).is_none() {
        errors.push(ValidationError::new(
            "routes.default_method",
            format!("`{}` is not an HTTP method", routes.default_method),
        ));
    }
    if routes.prefix.chars().any(|c| c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | '{' | '}')) {
        errors.push(ValidationError::new(
            "routes.prefix",
            "must not contain whitespace, brackets or parentheses",
        ));
    }
    if routes
        .prefix
        .split('/')
        .any(|segment| segment.starts_with([':', '*']))
    {
        errors.push(ValidationError::new(
            "routes.prefix",
            "segments must not start with `:` or `*`",
        ));
    }

    if config.hot_reload.debounce_ms > 10_000 {
        errors.push(ValidationError::new("hot_reload.debounce_ms", "must be at most 10000"));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("`{}` is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

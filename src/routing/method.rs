//! HTTP method tokens derived from route file names.
//!
//! File names carry methods as lower-case tokens (`(post)users.toml`). The
//! token is kept verbatim on the parsed file; conversion to a real method
//! happens at registration time, where an unknown token is a per-file error.

use std::fmt;

use axum::http::Method;

/// The method a route responds to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteMethod {
    /// Responds to every method (`(all)` in a file name).
    All,
    /// A single HTTP method.
    Only(Method),
}

impl RouteMethod {
    /// Parse a method token. Case-insensitive; `all` and `any` map to [`RouteMethod::All`].
    ///
    /// Returns `None` when the token is not a valid HTTP method token.
    pub fn parse(token: &str) -> Option<Self> {
        let upper = token.trim().to_ascii_uppercase();
        if upper.is_empty() {
            return None;
        }
        if upper == "ALL" || upper == "ANY" {
            return Some(RouteMethod::All);
        }
        Method::from_bytes(upper.as_bytes()).ok().map(RouteMethod::Only)
    }

    /// Upper-cased key fragment used by the override registry (`GET`, `ALL`).
    pub fn key(&self) -> &str {
        match self {
            RouteMethod::All => "ALL",
            RouteMethod::Only(m) => m.as_str(),
        }
    }

    /// Whether a request with `method` is served by this route.
    pub fn accepts(&self, method: &Method) -> bool {
        match self {
            RouteMethod::All => true,
            RouteMethod::Only(m) => m == method,
        }
    }

    /// Whether two route methods can answer the same request.
    pub fn overlaps(&self, other: &RouteMethod) -> bool {
        match (self, other) {
            (RouteMethod::All, _) | (_, RouteMethod::All) => true,
            (RouteMethod::Only(a), RouteMethod::Only(b)) => a == b,
        }
    }
}

/// The method to retry with when nothing answers `method`. axum serves
/// `HEAD` from `GET` routes, so lookups outside the router do the same.
pub fn head_fallback(method: &Method) -> Option<Method> {
    (method == Method::HEAD).then_some(Method::GET)
}

impl fmt::Display for RouteMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_standard_and_all() {
        assert_eq!(RouteMethod::parse("post"), Some(RouteMethod::Only(Method::POST)));
        assert_eq!(RouteMethod::parse("GET"), Some(RouteMethod::Only(Method::GET)));
        assert_eq!(RouteMethod::parse("all"), Some(RouteMethod::All));
        assert_eq!(RouteMethod::parse("any"), Some(RouteMethod::All));
        assert_eq!(RouteMethod::parse(""), None);
        assert_eq!(RouteMethod::parse("not a method"), None);
    }

    #[test]
    fn test_key_is_upper_case() {
        assert_eq!(RouteMethod::parse("delete").unwrap().key(), "DELETE");
        assert_eq!(RouteMethod::All.key(), "ALL");
    }

    #[test]
    fn test_overlap() {
        let get = RouteMethod::Only(Method::GET);
        let post = RouteMethod::Only(Method::POST);
        assert!(get.overlaps(&get));
        assert!(!get.overlaps(&post));
        assert!(RouteMethod::All.overlaps(&post));
        assert!(RouteMethod::All.accepts(&Method::PATCH));
        assert!(!post.accepts(&Method::GET));
    }

    #[test]
    fn test_head_falls_back_to_get() {
        assert_eq!(head_fallback(&Method::HEAD), Some(Method::GET));
        assert_eq!(head_fallback(&Method::GET), None);
        assert_eq!(head_fallback(&Method::POST), None);
    }
}

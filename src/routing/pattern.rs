//! Route patterns.
//!
//! A pattern is a normalised prefix followed by a list of segments. The
//! canonical string form uses `:name` for dynamic segments and `*` for a
//! catch-all, e.g. `/api/users/:id` or `/files/*`.

use std::fmt;

use serde::Serialize;

/// One segment of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Segment {
    /// Literal text, matched exactly.
    Static(String),
    /// Named dynamic segment, matches exactly one path segment.
    Param(String),
    /// Catch-all, consumes the remainder of the path.
    CatchAll(String),
}

impl Segment {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Segment::Param(_))
    }

    pub fn is_catch_all(&self) -> bool {
        matches!(self, Segment::CatchAll(_))
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Static(s) => f.write_str(s),
            Segment::Param(name) => write!(f, ":{}", name),
            Segment::CatchAll(_) => f.write_str("*"),
        }
    }
}

/// A derived URL pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RoutePattern {
    prefix: String,
    segments: Vec<Segment>,
}

impl RoutePattern {
    /// Build a pattern from a raw prefix and segments.
    ///
    /// The prefix is normalised to have a leading `/` and no trailing `/`;
    /// an empty or `/` prefix becomes empty.
    pub fn new(prefix: &str, segments: Vec<Segment>) -> Self {
        Self {
            prefix: normalize_prefix(prefix),
            segments,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of segments after the prefix.
    pub fn depth(&self) -> usize {
        self.segments.len()
    }

    pub fn dynamic_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_dynamic()).count()
    }

    pub fn catch_all_count(&self) -> usize {
        self.segments.iter().filter(|s| s.is_catch_all()).count()
    }

    /// Whether the pattern contains only literal segments.
    pub fn is_static(&self) -> bool {
        self.segments.iter().all(|s| matches!(s, Segment::Static(_)))
    }

    /// The pattern with parameter names erased (`/users/:`), so two patterns
    /// that match exactly the same paths share a shape.
    pub fn shape(&self) -> String {
        let mut out = self.prefix.clone();
        for segment in &self.segments {
            out.push('/');
            match segment {
                Segment::Static(s) => out.push_str(s),
                Segment::Param(_) => out.push(':'),
                Segment::CatchAll(_) => out.push('*'),
            }
        }
        if out.is_empty() {
            out.push('/');
        }
        out
    }
}

impl fmt::Display for RoutePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.segments.is_empty() {
            return if self.prefix.is_empty() {
                f.write_str("/")
            } else {
                f.write_str(&self.prefix)
            };
        }
        f.write_str(&self.prefix)?;
        for segment in &self.segments {
            write!(f, "/{}", segment)?;
        }
        Ok(())
    }
}

impl Serialize for RoutePattern {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_matches('/');
    if trimmed.is_empty() {
        String::new()
    } else {
        format!("/{}", trimmed)
    }
}

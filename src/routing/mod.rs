//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Route Derivation (at startup and on reload):
//!     relative file path
//!     → translate.rs (strip extension, index, method group, brackets)
//!     → RouteFile { path, method, pattern }
//!     → specificity.rs (registration order)
//!
//! Incoming Request (method, path):
//!     → matcher.rs (evaluate pattern against concrete path)
//!     → Return: RouteParams or NoMatch
//! ```
//!
//! # Design Decisions
//! - Derivation is pure: same file path always yields the same route
//! - Registration order: static > dynamic > catch-all
//! - First match wins for hosts that dispatch in registration order
//! - No regex in hot path (segment comparison only)

pub mod matcher;
pub mod method;
pub mod pattern;
pub mod route;
pub mod specificity;
pub mod translate;

pub use matcher::{Matcher, RouteMatcher, RouteParams};
pub use method::{head_fallback, RouteMethod};
pub use pattern::{RoutePattern, Segment};
pub use route::{lookup_key, Route, RouteKey};
pub use specificity::{sort_by_specificity, sorted_by_specificity, SpecificityRank};
pub use translate::{to_posix, PathTranslator, RouteFile};

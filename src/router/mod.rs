//! # Router Module
//!
//! Path matching and route resolution for switchyard.
//!
//! ## Overview
//!
//! The router is responsible for:
//! - Compiling route patterns into typed segments ([`compile`])
//! - Building a segment trie from `(method, pattern)` registrations
//! - Matching incoming requests with deterministic precedence
//! - Binding path parameters for the matched route
//!
//! ## Architecture
//!
//! Two phases, like every other table in the crate:
//!
//! 1. **Registration**: [`RouterBuilder::register`] inserts compiled patterns
//!    into a mutable arena trie.
//!
//! 2. **Matching**: [`RouterBuilder::freeze`] yields a read-only [`Router`];
//!    [`Router::route`] walks it depth-first with backtracking and returns a
//!    [`RouteMatch`] or `None`.
//!
//! ## Precedence
//!
//! At every path level: literal, then parameter (an optional trailing parameter
//! that is present counts as a parameter), then wildcard. If the preferred
//! branch dead-ends deeper down, the next branch at the same level is tried, so
//! `/users/me` beats `/users/:id` no matter which was registered first, and
//! `/users/me/friends` still reaches `/users/:id/friends`.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use switchyard::middleware::handler_fn;
//! use switchyard::router::{compile, RouterBuilder};
//! use switchyard::HandlerResponse;
//!
//! # fn main() -> Result<(), switchyard::router::PatternError> {
//! let ok = handler_fn(|_ctx| Ok(HandlerResponse::json(200, serde_json::json!({}))));
//!
//! let mut builder = RouterBuilder::new();
//! builder.register(Method::GET, &compile("/pets/:id")?, ok);
//! let router = builder.freeze();
//!
//! let m = router.route(&Method::GET, "/pets/123").unwrap();
//! assert_eq!(m.get_path_param("id"), Some("123"));
//! # Ok(())
//! # }
//! ```
//!
//! ## Performance
//!
//! Matching cost is proportional to path depth, not to the number of routes.
//! Literal edges are binary-searched; captures borrow from the request path
//! until they are bound.

mod core;
mod pattern;
mod radix;

pub use core::{
    ParamVec, RouteEntry, RouteInfo, RouteMatch, Router, RouterBuilder, TrailingParam,
    MAX_INLINE_PARAMS,
};
pub use pattern::{compile, join_patterns, CompiledPattern, PathSegment, PatternError};
pub use radix::{split_path, Captures, NodeId, RadixBuilder, RadixTree};

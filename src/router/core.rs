//! Router core module - hot path for request routing.
//!
//! [`RouterBuilder`] accepts compiled patterns during setup and
//! [`RouterBuilder::freeze`] produces the read-only [`Router`] used at dispatch.

#![deny(clippy::inefficient_to_string)]
#![deny(clippy::format_push_string)]
#![deny(clippy::unnecessary_to_owned)]

use http::Method;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::pattern::{CompiledPattern, PathSegment};
use super::radix::{split_path, RadixBuilder, RadixTree};
use crate::middleware::Endpoint;

/// Maximum number of path parameters before heap allocation.
pub const MAX_INLINE_PARAMS: usize = 8;

/// Stack-allocated parameter storage for the hot path.
///
/// Param names are `Arc<str>` because they come from the route table and are
/// shared by every request; values are per-request data from the URL.
pub type ParamVec = SmallVec<[(Arc<str>, String); MAX_INLINE_PARAMS]>;

/// Which storage slot of an optional trailing parameter an entry occupies.
///
/// When two patterns land on the same node and method, a [`Required`] entry
/// outranks either optional variant whatever the registration order:
/// `/users/:id` beats the present form of `/users/:name?`, and `/users` beats
/// its absent form.
///
/// [`Required`]: TrailingParam::Required
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrailingParam {
    /// Pattern has no optional trailing parameter
    Required,
    /// Stored at the node before the optional segment; the parameter is unbound
    Absent,
    /// Stored at the parameter child; the parameter is bound
    Present,
}

impl TrailingParam {
    /// Whether an entry of this kind keeps its slot against `incoming`.
    fn outranks(self, incoming: TrailingParam) -> bool {
        self == TrailingParam::Required && incoming != TrailingParam::Required
    }
}

/// A composed callable plus what it needs to bind parameters.
#[derive(Clone)]
pub struct RouteEntry {
    /// Composed middleware chain ending in the route handler
    pub endpoint: Endpoint,
    /// Pattern as displayed in logs and metrics (e.g. `/users/:id?`)
    pub pattern: Arc<str>,
    /// Names to bind, in descent order
    pub param_names: Arc<[Arc<str>]>,
    /// Optional trailing parameter variant
    pub trailing: TrailingParam,
}

impl fmt::Debug for RouteEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteEntry")
            .field("pattern", &self.pattern)
            .field("param_names", &self.param_names)
            .field("trailing", &self.trailing)
            .finish_non_exhaustive()
    }
}

/// Result of successfully matching a request path to a route.
#[derive(Debug, Clone)]
pub struct RouteMatch {
    /// The selected entry
    pub entry: RouteEntry,
    /// Parameters bound from the path, in descent order
    pub path_params: ParamVec,
}

impl RouteMatch {
    /// Get a path parameter by name.
    #[inline]
    #[must_use]
    pub fn get_path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    /// Convert path_params to HashMap.
    /// Note: This allocates - use get_path_param() in hot paths instead
    #[must_use]
    pub fn path_params_map(&self) -> HashMap<String, String> {
        self.path_params
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    /// The pattern that matched.
    #[must_use]
    pub fn pattern(&self) -> &str {
        &self.entry.pattern
    }
}

/// One row of the routing table, for listings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteInfo {
    /// HTTP method
    pub method: Method,
    /// Full pattern
    pub pattern: String,
}

/// Mutable routing table used during setup.
#[derive(Default)]
pub struct RouterBuilder {
    tree: RadixBuilder<RouteEntry>,
    routes: Vec<RouteInfo>,
}

impl RouterBuilder {
    /// Create an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `endpoint` for `method` under a compiled pattern.
    ///
    /// A pattern ending in an optional parameter is stored twice: once without
    /// the final segment ([`TrailingParam::Absent`]) and once with it
    /// ([`TrailingParam::Present`]). Registering the same method and shape twice
    /// replaces the earlier entry, except that a required entry is never
    /// displaced by an optional variant (see [`TrailingParam`]).
    pub fn register(&mut self, method: Method, pattern: &CompiledPattern, endpoint: Endpoint) {
        let shown: Arc<str> = Arc::from(pattern.to_string());
        let names = pattern.param_names();
        let segments = pattern.segments();

        if pattern.has_optional_tail() {
            let absent = RouteEntry {
                endpoint: Arc::clone(&endpoint),
                pattern: Arc::clone(&shown),
                param_names: Arc::from(&names[..names.len() - 1]),
                trailing: TrailingParam::Absent,
            };
            self.insert(&method, &segments[..segments.len() - 1], absent);

            let present = RouteEntry {
                endpoint,
                pattern: Arc::clone(&shown),
                param_names: Arc::from(names),
                trailing: TrailingParam::Present,
            };
            self.insert(&method, segments, present);
        } else {
            let entry = RouteEntry {
                endpoint,
                pattern: Arc::clone(&shown),
                param_names: Arc::from(names),
                trailing: TrailingParam::Required,
            };
            self.insert(&method, segments, entry);
        }

        debug!(
            method = %method,
            pattern = %shown,
            "Route registered"
        );
        self.routes.push(RouteInfo {
            method,
            pattern: shown.to_string(),
        });
    }

    /// Store `entry`, settling a slot collision by rank: a required entry
    /// stays against an optional variant; otherwise the newer entry wins.
    fn insert(&mut self, method: &Method, segments: &[PathSegment], entry: RouteEntry) {
        match self.tree.get_mut(segments, method) {
            Some(existing) if existing.trailing.outranks(entry.trailing) => {
                warn!(
                    method = %method,
                    pattern = %entry.pattern,
                    kept = %existing.pattern,
                    "Route shape already taken by a required pattern - new entry ignored"
                );
            }
            Some(existing) => {
                warn!(
                    method = %method,
                    pattern = %entry.pattern,
                    replaced = %existing.pattern,
                    "Route shape registered twice - earlier entry replaced"
                );
                *existing = entry;
            }
            None => {
                self.tree.insert(segments, method.clone(), entry);
            }
        }
    }

    /// Number of register calls so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Whether nothing has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Freeze into a read-only [`Router`].
    #[must_use]
    pub fn freeze(self) -> Router {
        let tree = self.tree.freeze();

        let routes_summary: Vec<String> = self
            .routes
            .iter()
            .take(10)
            .map(|r| format!("{} {}", r.method, r.pattern))
            .collect();
        info!(
            routes_count = self.routes.len(),
            node_count = tree.node_count(),
            routes_summary = ?routes_summary,
            "Routing table frozen"
        );

        Router {
            tree,
            routes: self.routes,
        }
    }
}

/// Read-only router matching `(method, path)` to a [`RouteMatch`].
///
/// Cloning duplicates the node arena; each worker can hold its own copy.
#[derive(Clone)]
pub struct Router {
    tree: RadixTree<RouteEntry>,
    routes: Vec<RouteInfo>,
}

impl Router {
    /// Match an HTTP request to a route.
    ///
    /// Precedence per path level is literal, then parameter, then wildcard,
    /// with backtracking when a more specific branch dead-ends deeper down.
    ///
    /// # Returns
    ///
    /// * `Some(RouteMatch)` - If a matching route is found
    /// * `None` - No pattern matched for this method (including when the path
    ///   only matches under other methods)
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let segments = split_path(path);
        let (entry, captures) = self.tree.find(method, &segments)?;

        let mut path_params = ParamVec::new();
        for (name, value) in entry.param_names.iter().zip(captures) {
            path_params.push((Arc::clone(name), value.into_owned()));
        }

        Some(RouteMatch {
            entry: entry.clone(),
            path_params,
        })
    }

    /// Methods registered on any pattern matching `path`, in no particular order.
    ///
    /// Used to tell "method not allowed" apart from "not found" when that
    /// policy is enabled; [`Router::route`] itself does not distinguish them.
    #[must_use]
    pub fn allowed_methods(&self, path: &str) -> Vec<Method> {
        let segments = split_path(path);
        self.tree.methods_for(&segments)
    }

    /// All registered routes in registration order.
    #[must_use]
    pub fn routes(&self) -> &[RouteInfo] {
        &self.routes
    }

    /// Every registered pattern in registration order.
    #[must_use]
    pub fn get_all_path_patterns(&self) -> Vec<String> {
        self.routes.iter().map(|r| r.pattern.clone()).collect()
    }
}

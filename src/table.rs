//! # Route Table
//!
//! The setup-time registry of groups and routes.
//!
//! ## Groups
//!
//! Groups form a tree rooted at [`RouteTable::root`]. Each group has a path
//! prefix and an ordered middleware list, and refers to its parent by
//! [`GroupId`]. Registering a route in a group resolves:
//!
//! - the full pattern: every ancestor prefix root-first, then the group's own,
//!   then the route suffix
//! - the effective middleware: every ancestor's list outer to inner, then the
//!   group's own, then any route-specific middleware
//!
//! The chain is composed right there, so middleware added to a group later
//! only applies to routes registered after it.
//!
//! ## Example
//!
//! ```rust
//! use http::Method;
//! use switchyard::middleware::{ErrorMiddleware, TracingMiddleware};
//! use switchyard::{AppConfig, HandlerRequest, HandlerResponse, RouteTable};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), switchyard::router::PatternError> {
//! let mut table = RouteTable::new();
//! let root = table.root();
//! table.use_middleware(root, Arc::new(TracingMiddleware));
//! table.use_middleware(root, Arc::new(ErrorMiddleware::new()));
//!
//! table.scope(root, "/api", |api| {
//!     api.get("/pets/:id", |ctx| {
//!         let id = ctx.param("id").unwrap_or_default().to_string();
//!         Ok(HandlerResponse::json(200, serde_json::json!({ "id": id })))
//!     })?;
//!     Ok(())
//! })?;
//!
//! let app = table.freeze(AppConfig::default());
//! let res = app.handle(HandlerRequest::new(Method::GET, "/api/pets/7"));
//! assert_eq!(res.status, 200);
//! # Ok(())
//! # }
//! ```

use http::Method;
use std::sync::Arc;
use tracing::debug;

use crate::config::AppConfig;
use crate::context::Context;
use crate::dispatcher::{default_not_found, App};
use crate::middleware::{compose, handler_fn, Endpoint, HandlerResult, Middleware};
use crate::router::{compile, join_patterns, CompiledPattern, PatternError, RouterBuilder};

/// Handle to a group inside one [`RouteTable`].
///
/// An id is an index into the table that created it and means nothing to any
/// other table. Passing it to a different table either panics (index out of
/// range) or silently addresses an unrelated group of that table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(usize);

impl GroupId {
    const ROOT: GroupId = GroupId(0);
}

#[derive(Default)]
struct Group {
    prefix: String,
    parent: Option<GroupId>,
    middlewares: Vec<Arc<dyn Middleware>>,
}

/// Mutable registry of groups and routes, frozen into an [`App`].
pub struct RouteTable {
    groups: Vec<Group>,
    router: RouterBuilder,
    not_found: Option<Endpoint>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new()
    }
}

macro_rules! method_helpers {
    ($($name:ident => $method:expr),* $(,)?) => {
        $(
            #[doc = concat!("Register a closure for `", stringify!($method), "`.")]
            pub fn $name<F>(&mut self, group: GroupId, suffix: &str, handler: F) -> Result<(), PatternError>
            where
                F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
            {
                self.register(group, $method, suffix, handler_fn(handler))
            }
        )*
    };
}

impl RouteTable {
    /// A table holding only the root group (empty prefix, no middleware).
    #[must_use]
    pub fn new() -> Self {
        Self {
            groups: vec![Group::default()],
            router: RouterBuilder::new(),
            not_found: None,
        }
    }

    /// The root group.
    #[must_use]
    pub fn root(&self) -> GroupId {
        GroupId::ROOT
    }

    fn group(&self, id: GroupId) -> &Group {
        &self.groups[id.0]
    }

    /// Create a child of `parent` with the given path prefix.
    ///
    /// # Panics
    ///
    /// Panics if `parent` was not created by this table.
    pub fn create_group(&mut self, parent: GroupId, prefix: &str) -> GroupId {
        assert!(
            parent.0 < self.groups.len(),
            "group {} does not belong to this route table",
            parent.0
        );
        let id = GroupId(self.groups.len());
        self.groups.push(Group {
            prefix: prefix.to_string(),
            parent: Some(parent),
            middlewares: Vec::new(),
        });
        debug!(
            group = id.0,
            parent = parent.0,
            prefix = %prefix,
            "Group created"
        );
        id
    }

    /// Append middleware to a group's list.
    ///
    /// # Panics
    ///
    /// Panics if `group` was not created by this table.
    pub fn use_middleware(&mut self, group: GroupId, middleware: Arc<dyn Middleware>) {
        self.groups[group.0].middlewares.push(middleware);
    }

    /// Groups from the root down to `group`.
    fn lineage(&self, group: GroupId) -> Vec<GroupId> {
        let mut chain = vec![group];
        let mut current = group;
        while let Some(parent) = self.group(current).parent {
            chain.push(parent);
            current = parent;
        }
        chain.reverse();
        chain
    }

    /// Full prefix of `group`: ancestor prefixes root-first.
    ///
    /// # Panics
    ///
    /// Panics if `group` was not created by this table.
    #[must_use]
    pub fn full_prefix(&self, group: GroupId) -> String {
        self.lineage(group)
            .into_iter()
            .fold(String::new(), |acc, id| join_patterns(&acc, &self.group(id).prefix))
    }

    /// Effective middleware of `group`, outermost first.
    ///
    /// # Panics
    ///
    /// Panics if `group` was not created by this table.
    #[must_use]
    pub fn effective_middleware(&self, group: GroupId) -> Vec<Arc<dyn Middleware>> {
        self.lineage(group)
            .into_iter()
            .flat_map(|id| self.group(id).middlewares.iter().map(Arc::clone))
            .collect()
    }

    /// Register `handler` for `method` at `suffix` inside `group`.
    pub fn register(
        &mut self,
        group: GroupId,
        method: Method,
        suffix: &str,
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        self.register_with(group, method, suffix, &[], handler)
    }

    /// Like [`RouteTable::register`], with middleware that wraps only this route
    /// (innermost, after every group's list).
    pub fn register_with(
        &mut self,
        group: GroupId,
        method: Method,
        suffix: &str,
        route_middleware: &[Arc<dyn Middleware>],
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        self.register_paths_with(group, method, &[suffix], route_middleware, handler)
    }

    /// Register one handler under several suffixes.
    ///
    /// Every pattern is compiled before anything is inserted, so a bad pattern
    /// leaves the table unchanged. All paths share one composed chain.
    pub fn register_paths(
        &mut self,
        group: GroupId,
        method: Method,
        suffixes: &[&str],
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        self.register_paths_with(group, method, suffixes, &[], handler)
    }

    fn register_paths_with(
        &mut self,
        group: GroupId,
        method: Method,
        suffixes: &[&str],
        route_middleware: &[Arc<dyn Middleware>],
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        let prefix = self.full_prefix(group);
        let patterns = suffixes
            .iter()
            .map(|suffix| compile(&join_patterns(&prefix, suffix)))
            .collect::<Result<Vec<CompiledPattern>, PatternError>>()?;

        let mut middlewares = self.effective_middleware(group);
        middlewares.extend(route_middleware.iter().map(Arc::clone));
        let endpoint = compose(&middlewares, handler);

        for pattern in &patterns {
            debug!(
                method = %method,
                pattern = %pattern,
                middleware_count = middlewares.len(),
                "Registering route"
            );
            self.router
                .register(method.clone(), pattern, Arc::clone(&endpoint));
        }
        Ok(())
    }

    method_helpers! {
        get => Method::GET,
        post => Method::POST,
        put => Method::PUT,
        patch => Method::PATCH,
        delete => Method::DELETE,
        head => Method::HEAD,
        options => Method::OPTIONS,
    }

    /// Create a group under `parent` and populate it through a [`GroupBuilder`].
    pub fn scope<F>(&mut self, parent: GroupId, prefix: &str, f: F) -> Result<GroupId, PatternError>
    where
        F: FnOnce(&mut GroupBuilder<'_>) -> Result<(), PatternError>,
    {
        let id = self.create_group(parent, prefix);
        let mut builder = GroupBuilder { table: self, id };
        f(&mut builder)?;
        Ok(id)
    }

    /// Replace the not-found fallback.
    ///
    /// The fallback is wrapped in the root group's middleware at freeze time.
    pub fn not_found(&mut self, handler: Endpoint) {
        self.not_found = Some(handler);
    }

    /// Number of `(method, pattern)` registrations so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.router.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.router.is_empty()
    }

    /// Freeze into a read-only [`App`].
    #[must_use]
    pub fn freeze(self, config: AppConfig) -> App {
        let fallback = self
            .not_found
            .unwrap_or_else(|| default_not_found(&config));
        let not_found = compose(&self.groups[GroupId::ROOT.0].middlewares, fallback);
        App::new(self.router.freeze(), not_found, config)
    }
}

/// Scoped view of one group, handed to [`RouteTable::scope`] closures.
pub struct GroupBuilder<'t> {
    table: &'t mut RouteTable,
    id: GroupId,
}

macro_rules! scoped_method_helpers {
    ($($name:ident),* $(,)?) => {
        $(
            #[doc = concat!("Shorthand for [`RouteTable::", stringify!($name), "`] in this group.")]
            pub fn $name<F>(&mut self, suffix: &str, handler: F) -> Result<(), PatternError>
            where
                F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
            {
                self.table.$name(self.id, suffix, handler)
            }
        )*
    };
}

impl GroupBuilder<'_> {
    /// The group being built.
    #[must_use]
    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn use_middleware(&mut self, middleware: Arc<dyn Middleware>) -> &mut Self {
        self.table.use_middleware(self.id, middleware);
        self
    }

    pub fn register(&mut self, method: Method, suffix: &str, handler: Endpoint) -> Result<(), PatternError> {
        self.table.register(self.id, method, suffix, handler)
    }

    pub fn register_with(
        &mut self,
        method: Method,
        suffix: &str,
        route_middleware: &[Arc<dyn Middleware>],
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        self.table
            .register_with(self.id, method, suffix, route_middleware, handler)
    }

    pub fn register_paths(
        &mut self,
        method: Method,
        suffixes: &[&str],
        handler: Endpoint,
    ) -> Result<(), PatternError> {
        self.table.register_paths(self.id, method, suffixes, handler)
    }

    scoped_method_helpers!(get, post, put, patch, delete, head, options);

    /// Nested group under this one.
    pub fn scope<F>(&mut self, prefix: &str, f: F) -> Result<GroupId, PatternError>
    where
        F: FnOnce(&mut GroupBuilder<'_>) -> Result<(), PatternError>,
    {
        self.table.scope(self.id, prefix, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::HandlerResponse;

    fn ok() -> Endpoint {
        handler_fn(|_ctx| Ok(HandlerResponse::empty(204)))
    }

    #[test]
    #[should_panic(expected = "does not belong to this route table")]
    fn test_group_from_another_table_is_rejected() {
        let mut other = RouteTable::new();
        let api = other.create_group(other.root(), "/api");
        let mut table = RouteTable::new();
        table.create_group(api, "/v1");
    }

    #[test]
    #[should_panic]
    fn test_middleware_on_foreign_group_panics() {
        let mut other = RouteTable::new();
        let api = other.create_group(other.root(), "/api");
        let mut table = RouteTable::new();
        table.use_middleware(api, Arc::new(crate::middleware::RecoverMiddleware));
    }

    #[test]
    fn test_full_prefix_joins_ancestors() {
        let mut table = RouteTable::new();
        let api = table.create_group(table.root(), "/api/");
        let v1 = table.create_group(api, "v1");
        let admin = table.create_group(v1, "/admin");
        assert_eq!(table.full_prefix(table.root()), "/");
        assert_eq!(table.full_prefix(admin), "/api/v1/admin");
    }

    #[test]
    fn test_effective_middleware_order() {
        let mut table = RouteTable::new();
        let root = table.root();
        let a: Arc<dyn Middleware> = Arc::new(crate::middleware::TracingMiddleware);
        let b: Arc<dyn Middleware> = Arc::new(crate::middleware::RecoverMiddleware);
        let child = table.create_group(root, "/x");
        table.use_middleware(child, Arc::clone(&b));
        table.use_middleware(root, Arc::clone(&a));

        let effective = table.effective_middleware(child);
        assert_eq!(effective.len(), 2);
        assert!(Arc::ptr_eq(&effective[0], &a));
        assert!(Arc::ptr_eq(&effective[1], &b));
    }

    #[test]
    fn test_bad_pattern_in_batch_inserts_nothing() {
        let mut table = RouteTable::new();
        let root = table.root();
        let err = table
            .register_paths(root, Method::GET, &["/ok", "/bad/*rest/tail"], ok())
            .unwrap_err();
        assert!(matches!(err, PatternError::NotTerminal { .. }));
        assert!(table.is_empty());
    }

    #[test]
    fn test_scope_returns_group_and_registers() {
        let mut table = RouteTable::new();
        let root = table.root();
        let id = table
            .scope(root, "/pets", |g| {
                g.get("/", |_ctx| Ok(HandlerResponse::empty(200)))?;
                g.scope("/:id", |inner| inner.delete("/", |_ctx| Ok(HandlerResponse::empty(204))))?;
                Ok(())
            })
            .unwrap();
        assert_eq!(table.full_prefix(id), "/pets");
        assert_eq!(table.len(), 2);

        let app = table.freeze(AppConfig::default());
        assert!(app.route(&Method::GET, "/pets").is_some());
        assert!(app.route(&Method::DELETE, "/pets/3").is_some());
    }
}

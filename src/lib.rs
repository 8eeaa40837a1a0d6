//! # switchyard
//!
//! **switchyard** is the request-dispatch core of an HTTP framework: a segment
//! trie that turns `(method, path)` into a handler plus named parameters, and a
//! middleware composer that wraps each handler in its chain once, when the route
//! is registered.
//!
//! ## Overview
//!
//! Routes are declared against a tree of groups. Each group carries a path
//! prefix and a middleware stack; a route inherits every ancestor's prefix and
//! middleware. Freezing the table produces an immutable [`App`] that can be
//! cloned into as many `may` coroutines as you like.
//!
//! ## Architecture
//!
//! - **[`router`]** - Pattern compiler and the arena-backed segment trie
//! - **[`middleware`]** - `Handler`/`Middleware` traits, the onion composer and built-in layers
//! - **[`table`]** - Group tree and route registration
//! - **[`dispatcher`]** - Frozen [`App`], request and response types
//! - **[`context`]** - Per-request state handed to handlers
//! - **[`worker_pool`]** - Coroutine workers fed over a channel
//! - **[`config`]** / **[`logging`]** - YAML/TOML configuration and `tracing` setup
//! - **[`manifest`]** / **[`cli`]** - Declarative route files and the `switchyard` binary
//!
//! ### Matching rules
//!
//! Patterns are `/`-separated. A segment is a literal, `:name` (one segment),
//! `:name?` (optional, final only) or `*name` (rest of the path, final only).
//! When several routes could match, literals beat parameters, parameters beat a
//! present optional, and wildcards come last. The search backtracks, so a
//! literal branch that dead-ends further down does not hide a parameter branch.
//!
//! ```mermaid
//! sequenceDiagram
//!     participant Client
//!     participant App
//!     participant Router
//!     participant Chain as Composed Chain
//!     participant Handler
//!
//!     Client->>App: handle(GET /api/pets/42)
//!     App->>Router: route(GET, "/api/pets/42")
//!     Router-->>App: RouteMatch { id = "42" }
//!     App->>Chain: call(ctx)
//!     Chain->>Chain: outer middleware (before)
//!     Chain->>Handler: call(ctx)
//!     Handler-->>Chain: HandlerResponse
//!     Chain->>Chain: outer middleware (after)
//!     Chain-->>App: HandlerResponse
//!     App-->>Client: 200
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use switchyard::middleware::TracingMiddleware;
//! use switchyard::{AppConfig, HandlerRequest, HandlerResponse, RouteTable};
//! use http::Method;
//! use serde_json::json;
//!
//! let mut table = RouteTable::new();
//! let root = table.root();
//! table.use_middleware(root, Arc::new(TracingMiddleware));
//!
//! let api = table.create_group(root, "/api");
//! table.get(api, "/pets/:id", |ctx| {
//!     let id = ctx.param("id").unwrap_or_default().to_string();
//!     Ok(HandlerResponse::json(200, json!({ "id": id })))
//! })?;
//!
//! let app = table.freeze(AppConfig::default());
//! let res = app.handle(HandlerRequest::new(Method::GET, "/api/pets/42"));
//! assert_eq!(res.status, 200);
//! assert_eq!(res.body["id"], "42");
//! # Ok::<(), switchyard::router::PatternError>(())
//! ```

pub mod cli;
pub mod config;
pub mod context;
pub mod dispatcher;
pub mod echo;
pub mod ids;
pub mod logging;
pub mod manifest;
pub mod middleware;
pub mod router;
pub mod table;
pub mod worker_pool;

pub use config::{AppConfig, ConfigError};
pub use context::Context;
pub use dispatcher::{App, HandlerRequest, HandlerResponse, HeaderVec};
pub use ids::RequestId;
pub use middleware::{compose, from_fn, handler_fn, Endpoint, Handler, HandlerResult, Middleware, Next};
pub use router::{compile, PatternError, RouteMatch, Router, RouterBuilder};
pub use table::{GroupBuilder, GroupId, RouteTable};
pub use worker_pool::{WorkerPool, WorkerPoolMetrics};

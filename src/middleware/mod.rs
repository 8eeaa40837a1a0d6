//! # Middleware Module
//!
//! Interceptors that wrap route handlers, and the composer that nests them.
//!
//! ## Shape
//!
//! A [`Middleware`] receives the request [`Context`](crate::Context) and a
//! [`Next`] continuation. It may run code before and after `next.run(ctx)`,
//! rewrite the response, convert an error, or skip `next` entirely to answer
//! early (auth failures, cached responses).
//!
//! ## Composition
//!
//! [`compose`] builds the chain once, when a route is registered. Each route
//! gets a single [`Endpoint`] that is shared by every request to it.
//!
//! ## Built-in Middleware
//!
//! - [`TracingMiddleware`] - `request` span with status and latency
//! - [`MetricsMiddleware`] - request counts and latency, per route pattern
//! - [`ErrorMiddleware`] - converts `Err` results into JSON error responses
//! - [`RecoverMiddleware`] - converts panics into 500 responses
//!
//! Closures become middleware through [`from_fn`]:
//!
//! ```rust
//! use switchyard::middleware::from_fn;
//!
//! let add_server_header = from_fn(|ctx, next| {
//!     let mut res = next.run(ctx)?;
//!     res.set_header("server", "switchyard".to_string());
//!     Ok(res)
//! });
//! # let _ = add_server_header;
//! ```

mod chain;
mod core;
mod error;
mod metrics;
mod recover;
mod tracing;

pub use chain::compose;
pub use core::{from_fn, handler_fn, Endpoint, Handler, HandlerResult, Middleware, Next};
pub use error::{ErrorMiddleware, HttpError};
pub use metrics::{MetricsMiddleware, RouteStats};
pub use recover::RecoverMiddleware;
pub use tracing::TracingMiddleware;

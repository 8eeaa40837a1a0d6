//! # Dispatcher Module
//!
//! Turns a decoded request into a response using the frozen routing table.
//!
//! ## Request Flow
//!
//! 1. A [`HandlerRequest`] becomes a fresh [`Context`](crate::Context)
//! 2. The router matches `(method, path)` to a [`RouteMatch`](crate::router::RouteMatch)
//! 3. The match moves into the context and the route's composed chain runs
//! 4. No match runs the not-found fallback, or answers 405 when
//!    [`AppConfig::handle_method_not_allowed`](crate::AppConfig) is set
//!
//! ## Error Handling
//!
//! - Errors are expected to be converted by middleware such as
//!   [`ErrorMiddleware`](crate::middleware::ErrorMiddleware)
//! - An error that escapes the chain is logged and becomes a 500
//! - Panics are only caught when
//!   [`RecoverMiddleware`](crate::middleware::RecoverMiddleware) is installed
//!   (or by the [`WorkerPool`](crate::WorkerPool) as a last resort)

mod app;
mod core;

pub(crate) use app::default_not_found;
pub use app::App;
pub use core::{HandlerRequest, HandlerResponse, HeaderVec, MAX_INLINE_HEADERS};

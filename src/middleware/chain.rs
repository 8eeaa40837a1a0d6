//! Onion composition of middleware around a handler.
//!
//! [`compose`] runs once per route registration. It folds the middleware list
//! right to left into nested [`Link`]s so the first middleware in the list is
//! the outermost layer:
//!
//! ```text
//! compose([A, B], H)
//!   A.handle(ctx, next = B.handle(ctx, next = H.call(ctx)))
//! ```
//!
//! Requests then walk the prebuilt links; nothing is allocated per request.

use std::sync::Arc;

use super::core::{Endpoint, Handler, HandlerResult, Middleware, Next};
use crate::context::Context;

/// One layer of a composed chain.
struct Link {
    middleware: Arc<dyn Middleware>,
    next: Endpoint,
}

impl Handler for Link {
    fn call(&self, ctx: &mut Context) -> HandlerResult {
        self.middleware.handle(ctx, Next::new(self.next.as_ref()))
    }
}

/// Compose `middlewares` (outermost first) around `handler`.
///
/// An empty list returns `handler` itself.
#[must_use]
pub fn compose(middlewares: &[Arc<dyn Middleware>], handler: Endpoint) -> Endpoint {
    middlewares.iter().rev().fold(handler, |next, middleware| {
        Arc::new(Link {
            middleware: Arc::clone(middleware),
            next,
        })
    })
}

use std::sync::Arc;

use crate::context::Context;
use crate::dispatcher::HandlerResponse;

/// Result returned by handlers, middleware and composed chains.
///
/// Errors travel outward through `next.run(ctx)?` until some middleware
/// converts them into a response.
pub type HandlerResult = anyhow::Result<HandlerResponse>;

/// The terminal callable of a route.
///
/// Implemented for every `Fn(&mut Context) -> HandlerResult` closure.
pub trait Handler: Send + Sync {
    fn call(&self, ctx: &mut Context) -> HandlerResult;
}

impl<F> Handler for F
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync,
{
    fn call(&self, ctx: &mut Context) -> HandlerResult {
        self(ctx)
    }
}

/// A shared, ready-to-run callable: a bare handler or a composed chain.
pub type Endpoint = Arc<dyn Handler>;

/// Wrap a closure as an [`Endpoint`].
pub fn handler_fn<F>(f: F) -> Endpoint
where
    F: Fn(&mut Context) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// An interceptor wrapped around a handler.
///
/// Work before `next.run(ctx)` happens on the way in, work after it on the way
/// out. Returning without calling `next` short-circuits the rest of the chain.
pub trait Middleware: Send + Sync {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult;
}

impl<F> Middleware for F
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync,
{
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        self(ctx, next)
    }
}

/// Wrap a closure as a shareable middleware.
///
/// ```
/// use switchyard::middleware::from_fn;
///
/// let timing = from_fn(|ctx, next| {
///     let mut res = next.run(ctx)?;
///     res.set_header("x-seen", "1".to_string());
///     Ok(res)
/// });
/// # let _ = timing;
/// ```
pub fn from_fn<F>(f: F) -> Arc<dyn Middleware>
where
    F: Fn(&mut Context, Next<'_>) -> HandlerResult + Send + Sync + 'static,
{
    Arc::new(f)
}

/// Continuation handed to a middleware: the remainder of the chain.
///
/// Consumed by [`Next::run`], so a middleware can invoke it at most once.
pub struct Next<'a> {
    rest: &'a dyn Handler,
}

impl<'a> Next<'a> {
    pub(crate) fn new(rest: &'a dyn Handler) -> Self {
        Self { rest }
    }

    /// Run the rest of the chain.
    pub fn run(self, ctx: &mut Context) -> HandlerResult {
        self.rest.call(ctx)
    }
}

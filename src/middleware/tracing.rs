use std::time::Instant;

use tracing::{field, info_span, warn};

use super::core::{HandlerResult, Middleware, Next};
use crate::context::Context;

/// Opens a `request` span around the rest of the chain.
///
/// Status and latency are recorded on the span once the inner chain returns.
/// Place it first so the span covers every other middleware.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingMiddleware;

impl Middleware for TracingMiddleware {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let span = info_span!(
            "request",
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            route = ctx.route_pattern().unwrap_or(""),
            status = field::Empty,
            latency_ms = field::Empty,
        );
        let start = Instant::now();

        span.in_scope(|| {
            let result = next.run(ctx);
            let latency_ms = start.elapsed().as_millis() as u64;
            span.record("latency_ms", latency_ms);
            match &result {
                Ok(res) => {
                    span.record("status", res.status);
                }
                Err(err) => {
                    warn!(error = %err, latency_ms, "Request failed inside chain");
                }
            }
            result
        })
    }
}

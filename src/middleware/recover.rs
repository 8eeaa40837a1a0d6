use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::error;

use super::core::{HandlerResult, Middleware, Next};
use crate::context::Context;
use crate::dispatcher::HandlerResponse;

/// Turns a panic in any inner layer into a 500 response.
///
/// Requires `panic = "unwind"`; with `abort` the process still dies.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecoverMiddleware;

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "<non-string panic payload>"
    }
}

impl Middleware for RecoverMiddleware {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| next.run(ctx)));
        match outcome {
            Ok(result) => result,
            Err(panic) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    panic_message = panic_message(panic.as_ref()),
                    "Handler panicked - recovered"
                );
                Ok(HandlerResponse::error(500, "Internal Server Error"))
            }
        }
    }
}

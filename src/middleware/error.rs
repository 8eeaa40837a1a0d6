use thiserror::Error;
use tracing::{error, warn};

use super::core::{HandlerResult, Middleware, Next};
use crate::context::Context;
use crate::dispatcher::HandlerResponse;

/// An error that already knows its HTTP status.
///
/// Handlers return it through `anyhow` (`Err(HttpError::not_found("pet").into())`
/// or `bail!`) and [`ErrorMiddleware`] turns it into a response with that status.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status}: {message}")]
pub struct HttpError {
    pub status: u16,
    pub message: String,
}

impl HttpError {
    #[must_use]
    pub fn new(status: u16, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(400, message)
    }

    #[must_use]
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(401, message)
    }

    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(404, message)
    }
}

/// Converts `Err` results from inner layers into JSON error responses.
///
/// An [`HttpError`] anywhere in the error chain keeps its status and message.
/// Anything else becomes a 500 whose body does not leak the error text unless
/// `expose_details` is set.
#[derive(Debug, Default, Clone, Copy)]
pub struct ErrorMiddleware {
    expose_details: bool,
}

impl ErrorMiddleware {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Include the error message in 500 bodies (useful in development).
    #[must_use]
    pub fn expose_details(mut self, expose: bool) -> Self {
        self.expose_details = expose;
        self
    }

    fn convert(&self, ctx: &Context, err: &anyhow::Error) -> HandlerResponse {
        if let Some(http) = err.chain().find_map(|e| e.downcast_ref::<HttpError>()) {
            warn!(
                request_id = %ctx.request_id(),
                path = %ctx.path(),
                status = http.status,
                error = %http.message,
                "Handler returned HTTP error"
            );
            return HandlerResponse::error(http.status, &http.message);
        }

        error!(
            request_id = %ctx.request_id(),
            method = %ctx.method(),
            path = %ctx.path(),
            error = ?err,
            "Handler error converted to 500"
        );
        if self.expose_details {
            HandlerResponse::json(
                500,
                serde_json::json!({
                    "error": "Internal Server Error",
                    "details": format!("{err:#}"),
                }),
            )
        } else {
            HandlerResponse::error(500, "Internal Server Error")
        }
    }
}

impl Middleware for ErrorMiddleware {
    fn handle(&self, ctx: &mut Context, next: Next<'_>) -> HandlerResult {
        match next.run(ctx) {
            Ok(res) => Ok(res),
            Err(err) => Ok(self.convert(ctx, &err)),
        }
    }
}

use std::sync::Arc;
use std::time::Instant;

use http::Method;
use tracing::{debug, error, info};

use super::core::{HandlerRequest, HandlerResponse};
use crate::config::AppConfig;
use crate::context::Context;
use crate::middleware::{handler_fn, Endpoint};
use crate::router::{RouteMatch, Router};

/// The read-only dispatch core produced by [`RouteTable::freeze`](crate::RouteTable::freeze).
///
/// Holds the frozen [`Router`], the not-found fallback and the config. Nothing
/// in it is mutated after construction, so one `App` can serve any number of
/// concurrent requests; a [`WorkerPool`](crate::WorkerPool) gives each worker
/// its own copy instead.
#[derive(Clone)]
pub struct App {
    router: Router,
    not_found: Endpoint,
    config: AppConfig,
}

impl App {
    pub(crate) fn new(router: Router, not_found: Endpoint, config: AppConfig) -> Self {
        info!(
            routes_count = router.routes().len(),
            handle_method_not_allowed = config.handle_method_not_allowed,
            "App ready"
        );
        Self {
            router,
            not_found,
            config,
        }
    }

    #[must_use]
    pub fn router(&self) -> &Router {
        &self.router
    }

    #[must_use]
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Match without running anything.
    #[must_use]
    pub fn route(&self, method: &Method, path: &str) -> Option<RouteMatch> {
        let path = path.split_once('?').map_or(path, |(p, _)| p);
        self.router.route(method, path)
    }

    /// Dispatch one request and always produce a response.
    pub fn handle(&self, req: HandlerRequest) -> HandlerResponse {
        let mut ctx = Context::from_request(req);
        self.handle_context(&mut ctx)
    }

    /// Dispatch with a caller-built [`Context`].
    ///
    /// On a match the route's composed chain runs; otherwise the not-found
    /// fallback does (or a 405 when enabled and another method matches).
    /// An `Err` that no middleware converted is logged and answered with 500.
    pub fn handle_context(&self, ctx: &mut Context) -> HandlerResponse {
        let start = Instant::now();

        let endpoint = match self.router.route(ctx.method(), ctx.path()) {
            Some(route_match) => {
                debug!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    route_pattern = %route_match.entry.pattern,
                    path_params = ?route_match.path_params,
                    match_us = start.elapsed().as_micros(),
                    "Route matched"
                );
                let endpoint = Arc::clone(&route_match.entry.endpoint);
                ctx.set_route_match(route_match);
                endpoint
            }
            None => {
                debug!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    match_us = start.elapsed().as_micros(),
                    "No route matched"
                );
                if let Some(res) = self.method_not_allowed(ctx) {
                    return res;
                }
                Arc::clone(&self.not_found)
            }
        };

        let response = match endpoint.call(ctx) {
            Ok(res) => res,
            Err(err) => {
                error!(
                    request_id = %ctx.request_id(),
                    method = %ctx.method(),
                    path = %ctx.path(),
                    route = ctx.route_pattern().unwrap_or(""),
                    error = ?err,
                    "Unhandled error reached dispatcher - returning 500"
                );
                HandlerResponse::error(500, "Internal Server Error")
            }
        };

        debug!(
            request_id = %ctx.request_id(),
            status = response.status,
            duration_us = start.elapsed().as_micros(),
            "Request dispatched"
        );
        response
    }

    fn method_not_allowed(&self, ctx: &Context) -> Option<HandlerResponse> {
        if !self.config.handle_method_not_allowed {
            return None;
        }
        let allowed = self.router.allowed_methods(ctx.path());
        if allowed.is_empty() {
            return None;
        }

        let mut names: Vec<&str> = allowed.iter().map(Method::as_str).collect();
        names.sort_unstable();
        let allow = names.join(", ");

        debug!(
            method = %ctx.method(),
            path = %ctx.path(),
            allow = %allow,
            "Method not allowed"
        );
        let mut res = HandlerResponse::error(405, "Method Not Allowed");
        res.set_header("allow", allow);
        Some(res)
    }
}

/// Default fallback: 404 with the configured message.
pub(crate) fn default_not_found(config: &AppConfig) -> Endpoint {
    let message = config
        .not_found_body
        .clone()
        .unwrap_or_else(|| "Not Found".to_string());
    handler_fn(move |_ctx| Ok(HandlerResponse::error(404, &message)))
}

//! Per-request state threaded through a composed chain.
//!
//! A [`Context`] is created for every request, handed by `&mut` to each
//! middleware in turn and finally to the handler, then dropped. It owns the
//! [`RouteMatch`] so bound parameters live exactly as long as the request.
//!
//! Middleware pass values inward through two stores:
//!
//! - a string-keyed JSON store ([`Context::set_data`]) for loosely typed values
//! - typed [`http::Extensions`] for anything `Clone + Send + Sync + 'static`

use http::{Extensions, Method};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::dispatcher::{HandlerRequest, HeaderVec};
use crate::ids::{RequestId, REQUEST_ID_HEADER};
use crate::router::{ParamVec, RouteMatch};

/// Request data plus a mutable store shared along the chain.
#[derive(Debug)]
pub struct Context {
    request_id: RequestId,
    method: Method,
    path: String,
    query_params: ParamVec,
    headers: HeaderVec,
    body: Option<Value>,
    route_match: Option<RouteMatch>,
    data: HashMap<String, Value>,
    extensions: Extensions,
}

/// Split `target` into path and decoded query pairs.
fn split_target(target: &str) -> (String, ParamVec) {
    match target.split_once('?') {
        Some((path, query)) => {
            let params = url::form_urlencoded::parse(query.as_bytes())
                .map(|(k, v)| (Arc::from(k.as_ref()), v.into_owned()))
                .collect();
            (path.to_string(), params)
        }
        None => (target.to_string(), ParamVec::new()),
    }
}

impl Context {
    /// Context for a bare method and request target (`/path?query`).
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query_params) = split_target(target);
        Self {
            request_id: RequestId::new(),
            method,
            path,
            query_params,
            headers: HeaderVec::new(),
            body: None,
            route_match: None,
            data: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    /// Context for a decoded request.
    ///
    /// The request id is taken from an `x-request-id` header when it parses.
    #[must_use]
    pub fn from_request(req: HandlerRequest) -> Self {
        let (path, query_params) = split_target(&req.path);
        let request_id = match req.get_header(REQUEST_ID_HEADER) {
            Some(value) => RequestId::from_header_or_new(Some(value)),
            None => req.request_id,
        };
        Self {
            request_id,
            method: req.method,
            path,
            query_params,
            headers: req.headers,
            body: req.body,
            route_match: None,
            data: HashMap::new(),
            extensions: Extensions::new(),
        }
    }

    pub(crate) fn set_route_match(&mut self, route_match: RouteMatch) {
        self.route_match = Some(route_match);
    }

    #[must_use]
    pub fn request_id(&self) -> RequestId {
        self.request_id
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Path without the query string.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The match that selected this request's route, once routed.
    #[must_use]
    pub fn route_match(&self) -> Option<&RouteMatch> {
        self.route_match.as_ref()
    }

    /// Pattern of the matched route, e.g. `/users/:id`.
    #[must_use]
    pub fn route_pattern(&self) -> Option<&str> {
        self.route_match.as_ref().map(RouteMatch::pattern)
    }

    /// Bound path parameter by name.
    ///
    /// An optional parameter that was absent from the path is `None`; a
    /// wildcard that matched nothing is `Some("")`.
    #[inline]
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.route_match.as_ref()?.get_path_param(name)
    }

    /// All bound path parameters in descent order.
    #[must_use]
    pub fn params(&self) -> &[(Arc<str>, String)] {
        match &self.route_match {
            Some(m) => m.path_params.as_slice(),
            None => &[],
        }
    }

    /// Get a query parameter by name
    ///
    /// Repeated keys (`?limit=10&limit=20`) resolve to the last occurrence.
    #[inline]
    #[must_use]
    pub fn query(&self, name: &str) -> Option<&str> {
        self.query_params
            .iter()
            .rfind(|(k, _)| k.as_ref() == name)
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn query_params(&self) -> &ParamVec {
        &self.query_params
    }

    /// Get a header by name (case-insensitive)
    #[inline]
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderVec {
        &self.headers
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// Take the body out, leaving `None`.
    pub fn take_body(&mut self) -> Option<Value> {
        self.body.take()
    }

    /// Store a value for later middleware or the handler.
    pub fn set_data(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.data.insert(key.into(), value)
    }

    #[must_use]
    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    pub fn extensions_mut(&mut self) -> &mut Extensions {
        &mut self.extensions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_query_is_split_and_decoded() {
        let ctx = Context::new(Method::GET, "/search?q=hello%20world&limit=10&limit=20");
        assert_eq!(ctx.path(), "/search");
        assert_eq!(ctx.query("q"), Some("hello world"));
        assert_eq!(ctx.query("limit"), Some("20"));
        assert_eq!(ctx.query("missing"), None);
    }

    #[test]
    fn test_unrouted_context_has_no_params() {
        let ctx = Context::new(Method::GET, "/users/42");
        assert!(ctx.params().is_empty());
        assert_eq!(ctx.param("id"), None);
        assert_eq!(ctx.route_pattern(), None);
    }

    #[test]
    fn test_request_id_header_is_honoured() {
        let id = RequestId::new();
        let req = HandlerRequest::new(Method::GET, "/").with_header("X-Request-Id", id.to_string());
        let ctx = Context::from_request(req);
        assert_eq!(ctx.request_id(), id);
    }

    #[test]
    fn test_data_and_extensions() {
        #[derive(Clone, Debug, PartialEq)]
        struct User(u32);

        let mut ctx = Context::new(Method::GET, "/");
        assert!(ctx.set_data("role", json!("admin")).is_none());
        ctx.extensions_mut().insert(User(7));

        assert_eq!(ctx.get_data("role"), Some(&json!("admin")));
        assert_eq!(ctx.extensions().get::<User>(), Some(&User(7)));
        assert_eq!(ctx.remove_data("role"), Some(json!("admin")));
        assert!(ctx.get_data("role").is_none());
    }
}

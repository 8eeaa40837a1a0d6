use serde_json::{json, Map, Value};

use crate::dispatcher::HandlerResponse;
use crate::middleware::{handler_fn, Endpoint};

fn pairs_to_object<'a>(pairs: impl Iterator<Item = (&'a str, &'a str)>) -> Value {
    let map: Map<String, Value> = pairs
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    Value::Object(map)
}

/// Handler that answers with a description of the request it received.
///
/// Used for manifest routes, where handlers are only named, and handy for
/// checking what a route binds.
#[must_use]
pub fn echo_handler(name: &str) -> Endpoint {
    let name = name.to_string();
    handler_fn(move |ctx| {
        let body = json!({
            "handler": name,
            "method": ctx.method().as_str(),
            "path": ctx.path(),
            "route": ctx.route_pattern(),
            "params": pairs_to_object(ctx.params().iter().map(|(k, v)| (k.as_ref(), v.as_str()))),
            "query": pairs_to_object(ctx.query_params().iter().map(|(k, v)| (k.as_ref(), v.as_str()))),
            "body": ctx.body(),
        });
        Ok(HandlerResponse::json(200, body))
    })
}

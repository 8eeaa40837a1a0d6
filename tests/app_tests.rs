#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use serde_json::json;
use switchyard::ids::REQUEST_ID_HEADER;
use switchyard::{App, AppConfig, Context, HandlerRequest, HandlerResponse, RouteTable};

fn pet_app(config: AppConfig) -> App {
    let mut table = RouteTable::new();
    let root = table.root();
    table
        .get(root, "/pets/:id", |ctx| {
            Ok(HandlerResponse::json(
                200,
                json!({
                    "id": ctx.param("id"),
                    "verbose": ctx.query("verbose"),
                    "request_id": ctx.request_id().to_string(),
                }),
            ))
        })
        .unwrap();
    table
        .put(root, "/pets/:id", |ctx| {
            let body = ctx.take_body().unwrap_or_default();
            Ok(HandlerResponse::json(200, body))
        })
        .unwrap();
    table
        .get(root, "/fail", |_ctx| Err(anyhow::anyhow!("unhandled")))
        .unwrap();
    table.freeze(config)
}

#[test]
fn test_match_binds_params_and_query() {
    let app = pet_app(AppConfig::default());
    let res = app.handle(HandlerRequest::new(Method::GET, "/pets/7?verbose=yes"));
    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "7");
    assert_eq!(res.body["verbose"], "yes");
}

#[test]
fn test_body_reaches_handler() {
    let app = pet_app(AppConfig::default());
    let res = app.handle(
        HandlerRequest::new(Method::PUT, "/pets/7").with_body(json!({ "name": "Rex" })),
    );
    assert_eq!(res.body["name"], "Rex");
}

#[test]
fn test_unmatched_path_is_404() {
    let app = pet_app(AppConfig::default());
    let res = app.handle(HandlerRequest::new(Method::GET, "/owners"));
    assert_eq!(res.status, 404);
}

#[test]
fn test_not_found_body_from_config() {
    let config = AppConfig {
        not_found_body: Some("nothing here".to_string()),
        ..AppConfig::default()
    };
    let app = pet_app(config);
    let res = app.handle(HandlerRequest::new(Method::GET, "/owners"));
    assert_eq!(res.status, 404);
    assert!(res.body.to_string().contains("nothing here"));
}

#[test]
fn test_method_mismatch_is_404_by_default() {
    let app = pet_app(AppConfig::default());
    let res = app.handle(HandlerRequest::new(Method::DELETE, "/pets/7"));
    assert_eq!(res.status, 404);
    assert!(res.get_header("allow").is_none());
}

#[test]
fn test_method_mismatch_is_405_when_enabled() {
    let config = AppConfig {
        handle_method_not_allowed: true,
        ..AppConfig::default()
    };
    let app = pet_app(config);
    let res = app.handle(HandlerRequest::new(Method::DELETE, "/pets/7"));
    assert_eq!(res.status, 405);
    assert_eq!(res.get_header("allow"), Some("GET, PUT"));

    // an unknown path is still a plain 404
    let res = app.handle(HandlerRequest::new(Method::DELETE, "/owners"));
    assert_eq!(res.status, 404);
}

#[test]
fn test_unhandled_error_becomes_500() {
    let app = pet_app(AppConfig::default());
    let res = app.handle(HandlerRequest::new(Method::GET, "/fail"));
    assert_eq!(res.status, 500);
}

#[test]
fn test_request_id_header_is_honoured() {
    let app = pet_app(AppConfig::default());
    let id = "01ARZ3NDEKTSV4RRFFQ69G5FAV";
    let res = app.handle(HandlerRequest::new(Method::GET, "/pets/1").with_header(REQUEST_ID_HEADER, id));
    assert_eq!(res.body["request_id"], id);
}

#[test]
fn test_handle_context_exposes_route_match() {
    let app = pet_app(AppConfig::default());
    let mut ctx = Context::new(Method::GET, "/pets/9");
    let res = app.handle_context(&mut ctx);
    assert_eq!(res.status, 200);
    assert_eq!(ctx.route_pattern(), Some("/pets/:id"));
    assert_eq!(ctx.param("id"), Some("9"));
}

#[test]
fn test_app_clones_share_routes() {
    let app = pet_app(AppConfig::default());
    let copy = app.clone();
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let app = copy.clone();
            std::thread::spawn(move || {
                app.handle(HandlerRequest::new(Method::GET, format!("/pets/{i}")))
                    .status
            })
        })
        .collect();
    for handle in handles {
        assert_eq!(handle.join().unwrap(), 200);
    }
    assert_eq!(app.router().routes().len(), 3);
}

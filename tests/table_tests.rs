#![allow(clippy::unwrap_used, clippy::expect_used)]

use http::Method;
use std::sync::{Arc, Mutex};
use switchyard::middleware::{from_fn, handler_fn, Middleware};
use switchyard::{AppConfig, Context, HandlerRequest, HandlerResponse, PatternError, RouteTable};

type Log = Arc<Mutex<Vec<&'static str>>>;

fn tag(log: &Log, name: &'static str) -> Arc<dyn Middleware> {
    let log = Arc::clone(log);
    from_fn(move |ctx: &mut Context, next| {
        log.lock().unwrap().push(name);
        next.run(ctx)
    })
}

#[test]
fn test_nested_groups_apply_prefixes_and_middleware_root_first() {
    let log: Log = Arc::default();
    let mut table = RouteTable::new();
    let root = table.root();
    table.use_middleware(root, tag(&log, "root"));

    let api = table.create_group(root, "/api");
    table.use_middleware(api, tag(&log, "api"));
    let v1 = table.create_group(api, "/v1");
    table.use_middleware(v1, tag(&log, "v1"));

    table
        .register_with(
            v1,
            Method::GET,
            "/users/:id",
            &[tag(&log, "route")],
            handler_fn(|ctx| {
                Ok(HandlerResponse::json(
                    200,
                    serde_json::json!({ "id": ctx.param("id") }),
                ))
            }),
        )
        .unwrap();

    let app = table.freeze(AppConfig::default());
    let res = app.handle(HandlerRequest::new(Method::GET, "/api/v1/users/5"));

    assert_eq!(res.status, 200);
    assert_eq!(res.body["id"], "5");
    assert_eq!(*log.lock().unwrap(), vec!["root", "api", "v1", "route"]);
}

#[test]
fn test_sibling_groups_do_not_share_middleware() {
    let log: Log = Arc::default();
    let mut table = RouteTable::new();
    let root = table.root();
    let public = table.create_group(root, "/public");
    let admin = table.create_group(root, "/admin");
    table.use_middleware(admin, tag(&log, "admin"));

    table.get(public, "/ping", |_ctx| Ok(HandlerResponse::empty(200))).unwrap();
    table.get(admin, "/ping", |_ctx| Ok(HandlerResponse::empty(200))).unwrap();
    let app = table.freeze(AppConfig::default());

    app.handle(HandlerRequest::new(Method::GET, "/public/ping"));
    assert!(log.lock().unwrap().is_empty());
    app.handle(HandlerRequest::new(Method::GET, "/admin/ping"));
    assert_eq!(*log.lock().unwrap(), vec!["admin"]);
}

#[test]
fn test_middleware_added_later_only_wraps_later_routes() {
    let log: Log = Arc::default();
    let mut table = RouteTable::new();
    let root = table.root();

    table.get(root, "/early", |_ctx| Ok(HandlerResponse::empty(200))).unwrap();
    table.use_middleware(root, tag(&log, "late"));
    table.get(root, "/later", |_ctx| Ok(HandlerResponse::empty(200))).unwrap();
    let app = table.freeze(AppConfig::default());

    app.handle(HandlerRequest::new(Method::GET, "/early"));
    assert!(log.lock().unwrap().is_empty());
    app.handle(HandlerRequest::new(Method::GET, "/later"));
    assert_eq!(*log.lock().unwrap(), vec!["late"]);
}

#[test]
fn test_register_paths_shares_one_chain() {
    let mut table = RouteTable::new();
    let root = table.root();
    let api = table.create_group(root, "/api");
    table
        .register_paths(
            api,
            Method::GET,
            &["/pets", "/animals", "/pets/:id?"],
            handler_fn(|ctx| {
                Ok(HandlerResponse::json(
                    200,
                    serde_json::json!({ "route": ctx.route_pattern(), "id": ctx.param("id") }),
                ))
            }),
        )
        .unwrap();
    let app = table.freeze(AppConfig::default());

    let a = app.route(&Method::GET, "/api/pets").unwrap();
    let b = app.route(&Method::GET, "/api/animals").unwrap();
    let c = app.route(&Method::GET, "/api/pets/3").unwrap();
    assert!(Arc::ptr_eq(&a.entry.endpoint, &b.entry.endpoint));
    assert!(Arc::ptr_eq(&a.entry.endpoint, &c.entry.endpoint));

    let res = app.handle(HandlerRequest::new(Method::GET, "/api/pets/3"));
    assert_eq!(res.body["route"], "/api/pets/:id?");
    assert_eq!(res.body["id"], "3");
}

#[test]
fn test_bad_pattern_leaves_table_unchanged() {
    let mut table = RouteTable::new();
    let root = table.root();
    let err = table
        .register_paths(
            root,
            Method::GET,
            &["/ok", "/bad/*rest/tail"],
            handler_fn(|_ctx| Ok(HandlerResponse::empty(200))),
        )
        .unwrap_err();
    assert!(matches!(err, PatternError::NotTerminal { .. }));
    assert!(table.is_empty());
}

#[test]
fn test_scope_builder() {
    let mut table = RouteTable::new();
    let root = table.root();
    table
        .scope(root, "/api", |api| {
            api.get("/health", |_ctx| Ok(HandlerResponse::empty(200)))?;
            api.scope("/pets", |pets| {
                pets.get("/", |_ctx| Ok(HandlerResponse::empty(200)))?;
                pets.delete("/:id", |_ctx| Ok(HandlerResponse::empty(204)))?;
                Ok(())
            })?;
            Ok(())
        })
        .unwrap();
    assert_eq!(table.len(), 3);

    let app = table.freeze(AppConfig::default());
    let patterns = app.router().get_all_path_patterns();
    assert_eq!(patterns, vec!["/api/health", "/api/pets", "/api/pets/:id"]);
    assert_eq!(
        app.handle(HandlerRequest::new(Method::DELETE, "/api/pets/1")).status,
        204
    );
}

#[test]
fn test_custom_not_found_is_wrapped_by_root_middleware() {
    let log: Log = Arc::default();
    let mut table = RouteTable::new();
    let root = table.root();
    table.use_middleware(root, tag(&log, "root"));
    let api = table.create_group(root, "/api");
    table.use_middleware(api, tag(&log, "api"));
    table.not_found(handler_fn(|ctx| {
        Ok(HandlerResponse::json(
            404,
            serde_json::json!({ "missing": ctx.path() }),
        ))
    }));
    let app = table.freeze(AppConfig::default());

    let res = app.handle(HandlerRequest::new(Method::GET, "/api/nope"));
    assert_eq!(res.status, 404);
    assert_eq!(res.body["missing"], "/api/nope");
    assert_eq!(*log.lock().unwrap(), vec!["root"]);
}

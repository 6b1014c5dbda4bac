//! The axum adapter, driven in-process with `oneshot`.

mod common;

use std::sync::Arc;
use std::time::Duration;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use common::done;
use rbac_router::http::into_axum;
use rbac_router::routing::{handler_fn, HeaderRoles, Mount, RouterOptions};
use rbac_router::{Dispatcher, HttpServer, RoleSpec};

fn dispatcher() -> Arc<Dispatcher> {
    let options = RouterOptions::new().with_role_fetcher(Arc::new(HeaderRoles("x-roles".into())));
    let mut dispatcher = Dispatcher::new(options);
    dispatcher
        .roles()
        .write()
        .unwrap()
        .setup([("reader", RoleSpec::from("items.read"))], true)
        .unwrap();

    let show = handler_fn(|ctx, _next| {
        Box::pin(async move {
            let id = ctx.param("id").unwrap_or_default().to_string();
            ctx.body = Some(json!({ "id": id }));
            Ok(())
        })
    });
    let create = handler_fn(|ctx, _next| {
        Box::pin(async move {
            ctx.status = Some(201);
            Ok(())
        })
    });
    let echo_path = handler_fn(|ctx, _next| {
        Box::pin(async move {
            ctx.body = Some(json!(ctx.path.clone()));
            Ok(())
        })
    });
    dispatcher
        .root()
        .get("/", done())
        .unwrap()
        .get_named("items.read", "/items/:id", show)
        .unwrap()
        .post_named("items.create", "/items", create)
        .unwrap()
        .mount("/admin", Mount::Middleware(echo_path))
        .unwrap();
    Arc::new(dispatcher)
}

async fn send(app: axum::Router, method: &str, uri: &str, roles: Option<&str>) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(roles) = roles {
        request = request.header("x-roles", roles);
    }
    let response = app
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_root_route() {
    let (status, body) = send(into_axum(dispatcher()), "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "done": true }));
}

#[tokio::test]
async fn test_authorized_named_route() {
    let (status, body) = send(into_axum(dispatcher()), "GET", "/items/7", Some("reader")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": "7" }));
}

#[tokio::test]
async fn test_forbidden_without_roles() {
    let (status, body) = send(into_axum(dispatcher()), "GET", "/items/7", None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));

    let (status, _) = send(into_axum(dispatcher()), "POST", "/items", Some("reader")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_handler_status_without_body() {
    let (status, body) = send(into_axum(dispatcher()), "POST", "/items", Some("reader, writer")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({ "error": "forbidden" }));

    let app = dispatcher();
    app.roles()
        .write()
        .unwrap()
        .apply("writer", Some(&RoleSpec::from("items.create")))
        .unwrap();
    let (status, body) = send(into_axum(app), "POST", "/items", Some("reader, writer")).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_not_found() {
    let (status, body) = send(into_axum(dispatcher()), "GET", "/nope", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "error": "not found" }));
}

#[tokio::test]
async fn test_middleware_sees_stripped_path() {
    let (status, body) = send(into_axum(dispatcher()), "GET", "/admin/users?page=2", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!("/users"));
}

#[tokio::test]
async fn test_server_router_layers() {
    let server = HttpServer::new(dispatcher(), Duration::from_secs(5));
    let (status, body) = send(server.router(), "GET", "/items/1", Some("reader")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "id": "1" }));
}

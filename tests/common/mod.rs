//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::collections::HashSet;

use serde_json::json;

use rbac_router::rbac::PermissionSet;
use rbac_router::routing::{handler_fn, SharedHandler};
use rbac_router::{RequestContext, RoleSpec};

/// Role table exercising grants, role references, exclusions, unknown
/// references and the wildcard.
pub fn test_roles() -> Vec<(&'static str, RoleSpec)> {
    vec![
        ("role_1", RoleSpec::from(["perm_1.1", "perm_1.2", "perm_1.3"])),
        ("role_2", RoleSpec::from("@role_1 !perm_1.3 perm_2.1 perm_2.2 @role_0.1")),
        ("role_3", RoleSpec::from(["@role_2", "perm_3.1", "perm_3.2"])),
        ("role_4", RoleSpec::from("@role_3 !@role_1 !@role_0.2")),
        ("role_5", RoleSpec::from("*")),
    ]
}

pub fn perms(items: &[&str]) -> PermissionSet {
    items.iter().map(|p| p.to_string()).collect::<HashSet<_>>()
}

/// Context from `"METHOD /path"`.
pub fn ctx(spec: &str) -> RequestContext {
    let (method, path) = spec.split_once(' ').unwrap_or(("GET", spec));
    RequestContext::new(method, path)
}

/// Sets `{"done": true}` on the body and continues.
pub fn done() -> SharedHandler {
    handler_fn(|ctx, next| {
        Box::pin(async move {
            ctx.body_object().insert("done".into(), json!(true));
            next.run(ctx).await
        })
    })
}

/// Sets `key` to `true` in the attribute bag and continues.
pub fn mark(key: &'static str) -> SharedHandler {
    handler_fn(move |ctx, next| {
        Box::pin(async move {
            ctx.set(key, true);
            next.run(ctx).await
        })
    })
}

pub fn body_flag(ctx: &RequestContext, key: &str) -> bool {
    ctx.body
        .as_ref()
        .and_then(|body| body.get(key))
        .and_then(|v| v.as_bool())
        .unwrap_or(false)
}

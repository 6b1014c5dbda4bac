//! Axum adapter for the dispatcher.
//!
//! # Responsibilities
//! - Turn an HTTP request into a `RequestContext`
//! - Turn the context (or the dispatch error) back into a response
//!
//! # Design Decisions
//! - One catch-all route; all matching happens in the dispatcher
//! - A body left by handlers is sent as JSON; no body means an empty response
//! - Server errors are logged and answered without internal detail

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use serde_json::json;

use crate::routing::{Dispatcher, HandlerResult, RequestContext};

/// Axum router sending every request through `dispatcher`.
pub fn into_axum(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/", any(dispatch_handler))
        .route("/{*path}", any(dispatch_handler))
        .with_state(dispatcher)
}

async fn dispatch_handler(
    State(dispatcher): State<Arc<Dispatcher>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
) -> Response {
    let mut ctx = RequestContext::new(method.as_str(), uri.path()).with_headers(headers);
    let outcome = dispatcher.dispatch(&mut ctx).await;
    into_response(ctx, outcome)
}

fn into_response(ctx: RequestContext, outcome: HandlerResult) -> Response {
    match outcome {
        Ok(()) => {
            let status = ctx
                .status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::OK);
            match ctx.body {
                Some(body) => (status, Json(body)).into_response(),
                None => status.into_response(),
            }
        }
        Err(err) => {
            let status = StatusCode::from_u16(err.status_code())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            let message = if status.is_server_error() {
                tracing::error!(error = %err, method = %ctx.method, path = %ctx.path, "Dispatch failed");
                "internal error".to_string()
            } else {
                err.to_string()
            };
            (status, Json(json!({ "error": message }))).into_response()
        }
    }
}

//! Request dispatch.
//!
//! # Responsibilities
//! - Match (method, path) against the root router, crossing mounted routers
//! - Attach the action name and captured parameters to the context
//! - Authorize named routes against the caller's roles
//! - Compose preamble and route handlers and drive the chain
//!
//! # Data Flow
//! ```text
//! RequestContext (method, path)
//!     → Routes::lookup
//!         Missing     → not-found handler (default: NotFound)
//!         Middleware  → strip prefix, call middleware with our continuation
//!         Route       → method descriptor (or "*"), else no-method handler
//!     → role fetcher + match_shared (named routes only)
//!         denied      → prohibition handler (default: Forbidden)
//!     → preamble ++ handlers, run through Next
//! ```
//!
//! # Design Decisions
//! - Effective options are merged per request so ancestor changes apply
//!   immediately
//! - Handler errors are returned to the caller untouched

use std::sync::atomic::AtomicUsize;
use std::sync::{Arc, RwLock};

use serde_json::{Map, Value};

use crate::observability::metrics;
use crate::rbac::{match_shared, RoleRegistry, SharedRoles};
use crate::routing::context::{RequestContext, RouteAction, RouteParams};
use crate::routing::error::{DispatchError, RouteError};
use crate::routing::handler::{BoxFuture, Handler, HandlerResult, Next, SharedHandler};
use crate::routing::mapping::ANY_METHOD;
use crate::routing::options::{RouterOptions, RouterSettings};
use crate::routing::router::{Lookup, RouterId, RouterMut, Routes};

/// Entry point owning every router, the action registry and the roles.
pub struct Dispatcher {
    routes: Routes,
    roles: SharedRoles,
    settings: RouterSettings,
}

impl Dispatcher {
    /// Dispatcher with default settings and an empty role registry. `options`
    /// become the root router's options.
    pub fn new(options: RouterOptions) -> Self {
        Self::with_settings(
            options,
            RouterSettings::default(),
            Arc::new(RwLock::new(RoleRegistry::new())),
        )
    }

    pub fn with_settings(options: RouterOptions, settings: RouterSettings, roles: SharedRoles) -> Self {
        Self {
            routes: Routes::new(options, settings.param_marker),
            roles,
            settings,
        }
    }

    /// The root router: the dispatch entry point.
    pub fn root(&mut self) -> RouterMut<'_> {
        let id = self.routes.root_id();
        RouterMut::new(&mut self.routes, id)
    }

    pub fn root_id(&self) -> RouterId {
        self.routes.root_id()
    }

    /// Create a detached router to be mounted later.
    pub fn create_router(&mut self, options: RouterOptions) -> RouterId {
        self.routes.create(options)
    }

    pub fn router(&mut self, id: RouterId) -> Result<RouterMut<'_>, RouteError> {
        if !self.routes.contains(id) {
            return Err(RouteError::UnknownRouter);
        }
        Ok(RouterMut::new(&mut self.routes, id))
    }

    pub fn roles(&self) -> &SharedRoles {
        &self.roles
    }

    pub fn settings(&self) -> &RouterSettings {
        &self.settings
    }

    /// Registered action names, sorted.
    pub fn actions(&self) -> Vec<String> {
        let mut actions: Vec<String> = self.routes.actions().iter().cloned().collect();
        actions.sort();
        actions
    }

    pub fn effective_options(&self, id: RouterId) -> Result<RouterOptions, RouteError> {
        self.routes.effective_options(id)
    }

    /// Replace the own options of `id`; in-flight and later requests see the
    /// new value from their next lookup on.
    pub fn set_options(&self, id: RouterId, options: RouterOptions) -> Result<(), RouteError> {
        self.routes.set_options(id, options)
    }

    /// Dispatch a request with nothing after the chain.
    pub async fn dispatch(&self, ctx: &mut RequestContext) -> HandlerResult {
        self.dispatch_with(ctx, Next::end()).await
    }

    /// Dispatch a request; `next` is handed to a matched middleware mount.
    pub fn dispatch_with<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        Box::pin(async move {
            let (router, node, params) = match self.routes.lookup(self.routes.root_id(), &ctx.path) {
                Lookup::Route {
                    router,
                    node,
                    params,
                } => (router, node, params),
                Lookup::Middleware { mount, rest } => {
                    let remainder = ctx.path.get(rest..).unwrap_or_default().to_string();
                    ctx.path = if remainder.is_empty() {
                        "/".to_string()
                    } else {
                        remainder
                    };
                    tracing::debug!(prefix = %mount.prefix, path = %ctx.path, "Delegating to middleware");
                    metrics::record_dispatch("middleware");
                    return mount.handler.call(ctx, next).await;
                }
                Lookup::Missing { router } => {
                    tracing::debug!(method = %ctx.method, path = %ctx.path, "No route");
                    metrics::record_dispatch("not_found");
                    let options = self.options_for(router);
                    return fallback(options.not_found_handler, DispatchError::NotFound, ctx).await;
                }
            };

            let options = self.options_for(router);
            let method = ctx.method.to_lowercase();
            let Some(descriptor) = node
                .methods
                .get(&method)
                .or_else(|| node.methods.get(ANY_METHOD))
            else {
                tracing::debug!(method = %ctx.method, path = %ctx.path, "No method");
                metrics::record_dispatch("no_method");
                let handler = options.no_method_handler.or(options.not_found_handler);
                return fallback(handler, DispatchError::NotFound, ctx).await;
            };

            let captured: Map<String, Value> = params
                .iter()
                .map(|(name, value)| (name.clone(), Value::String(value.clone())))
                .collect();
            ctx.set(self.settings.params_key.clone(), Value::Object(captured));
            ctx.extensions.insert(RouteParams(params));
            if let Some(name) = &descriptor.name {
                ctx.set(self.settings.action_key.clone(), name.clone());
                ctx.extensions.insert(RouteAction(name.clone()));
            }

            if let (Some(action), Some(fetcher)) = (&descriptor.name, &options.role_fetcher) {
                let roles = fetcher.fetch(ctx).await?;
                let granted = match_shared(&self.roles, action, &roles)?;
                metrics::record_authorization(granted);
                if !granted {
                    tracing::warn!(
                        action = %action,
                        roles = ?roles.tokens(),
                        path = %ctx.path,
                        "Authorization denied"
                    );
                    metrics::record_dispatch("forbidden");
                    return fallback(options.prohibition_handler, DispatchError::Forbidden, ctx).await;
                }
            }

            let mut stages = options.preamble.unwrap_or_default();
            stages.extend(descriptor.handlers.iter().cloned());
            tracing::debug!(
                method = %ctx.method,
                path = %ctx.path,
                action = descriptor.name.as_deref().unwrap_or("-"),
                stages = stages.len(),
                "Dispatching"
            );
            metrics::record_dispatch("matched");
            let cursor = AtomicUsize::new(0);
            Next::new(&stages, &cursor).run(ctx).await
        })
    }

    fn options_for(&self, router: RouterId) -> RouterOptions {
        self.routes.effective_options(router).unwrap_or_default()
    }
}

/// Run a configured fallback handler, or fail with `default`.
async fn fallback(
    handler: Option<SharedHandler>,
    default: DispatchError,
    ctx: &mut RequestContext,
) -> HandlerResult {
    match handler {
        Some(handler) => handler.call(ctx, Next::end()).await,
        None => Err(default),
    }
}

impl Handler for Dispatcher {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>) -> BoxFuture<'a, HandlerResult> {
        self.dispatch_with(ctx, next)
    }
}

//! Handlers and the continuation that links them into a chain.
//!
//! # Design Decisions
//! - A chain is a slice of stages plus a shared cursor; `Next` is a position
//!   in that slice, not a closure
//! - Running a `Next` whose stage was already entered is a no-op, so a handler
//!   that calls its continuation twice does not re-run downstream handlers
//! - A handler that never runs its `Next` ends the chain there

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::rbac::RoleSpec;
use crate::routing::context::RequestContext;
use crate::routing::error::DispatchError;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

pub type HandlerResult = Result<(), DispatchError>;

/// A request handler: route handler, preamble, middleware or fallback.
pub trait Handler: Send + Sync + 'static {
    fn call<'a>(&'a self, ctx: &'a mut RequestContext, next: Next<'a>)
        -> BoxFuture<'a, HandlerResult>;
}

pub type SharedHandler = Arc<dyn Handler>;

/// Adapter turning a closure into a [`Handler`].
pub struct HandlerFn<F>(F);

impl<F> Handler for HandlerFn<F>
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    fn call<'a>(
        &'a self,
        ctx: &'a mut RequestContext,
        next: Next<'a>,
    ) -> BoxFuture<'a, HandlerResult> {
        (self.0)(ctx, next)
    }
}

/// Wrap a closure as a shared handler.
///
/// ```ignore
/// let h = handler_fn(|ctx, next| Box::pin(async move {
///     ctx.set("seen", true);
///     next.run(ctx).await
/// }));
/// ```
pub fn handler_fn<F>(f: F) -> SharedHandler
where
    F: for<'a> Fn(&'a mut RequestContext, Next<'a>) -> BoxFuture<'a, HandlerResult>
        + Send
        + Sync
        + 'static,
{
    Arc::new(HandlerFn(f))
}

/// A single handler or an ordered list of them.
pub trait IntoHandlers {
    fn into_handlers(self) -> Vec<SharedHandler>;
}

impl IntoHandlers for SharedHandler {
    fn into_handlers(self) -> Vec<SharedHandler> {
        vec![self]
    }
}

impl IntoHandlers for Vec<SharedHandler> {
    fn into_handlers(self) -> Vec<SharedHandler> {
        self
    }
}

impl<const N: usize> IntoHandlers for [SharedHandler; N] {
    fn into_handlers(self) -> Vec<SharedHandler> {
        self.into_iter().collect()
    }
}

/// Continuation into the rest of a chain.
#[derive(Clone, Copy)]
pub struct Next<'a> {
    stages: &'a [SharedHandler],
    stage: usize,
    cursor: &'a AtomicUsize,
}

static END_CURSOR: AtomicUsize = AtomicUsize::new(0);

impl<'a> Next<'a> {
    /// Entry point of a chain. `cursor` must start at zero.
    pub(crate) fn new(stages: &'a [SharedHandler], cursor: &'a AtomicUsize) -> Self {
        Self {
            stages,
            stage: 0,
            cursor,
        }
    }

    /// Continuation with nothing left to run.
    pub fn end() -> Next<'static> {
        Next {
            stages: &[],
            stage: 0,
            cursor: &END_CURSOR,
        }
    }

    /// True when there is no further stage.
    pub fn is_end(&self) -> bool {
        self.stage >= self.stages.len()
    }

    /// Run the remaining chain. Completes when the downstream handler (and
    /// whatever it chose to run) has settled.
    pub fn run<'b>(self, ctx: &'b mut RequestContext) -> BoxFuture<'b, HandlerResult>
    where
        'a: 'b,
    {
        Box::pin(async move {
            let Some(handler) = self.stages.get(self.stage) else {
                return Ok(());
            };
            // the cursor counts stages entered; a stale continuation sees it ahead
            if self.cursor.fetch_max(self.stage + 1, Ordering::SeqCst) > self.stage {
                return Ok(());
            }
            let next = Next {
                stages: self.stages,
                stage: self.stage + 1,
                cursor: self.cursor,
            };
            handler.call(ctx, next).await
        })
    }
}

/// Supplies the role specifier of the caller, per request.
pub trait RoleFetcher: Send + Sync + 'static {
    fn fetch<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>>;
}

/// Adapter turning a closure into a [`RoleFetcher`].
pub struct FetcherFn<F>(F);

impl<F> RoleFetcher for FetcherFn<F>
where
    F: for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>>
        + Send
        + Sync
        + 'static,
{
    fn fetch<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>> {
        (self.0)(ctx)
    }
}

pub fn fetcher_fn<F>(f: F) -> Arc<dyn RoleFetcher>
where
    F: for<'a> Fn(&'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>>
        + Send
        + Sync
        + 'static,
{
    Arc::new(FetcherFn(f))
}

/// Fetcher answering the same specifier for every request.
pub struct StaticRoles(pub RoleSpec);

impl RoleFetcher for StaticRoles {
    fn fetch<'a>(&'a self, _ctx: &'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>> {
        Box::pin(async move { Ok(self.0.clone()) })
    }
}

/// Fetcher reading the role specifier from a request header. A missing
/// header yields an empty specifier, which grants nothing.
///
/// The caller states its own roles, so this authorizes nothing against an
/// untrusted client. Use it for demos and tests, or behind a proxy that
/// authenticates the caller and sets the header itself; otherwise supply a
/// [`RoleFetcher`] that derives roles from verified credentials.
pub struct HeaderRoles(pub String);

impl RoleFetcher for HeaderRoles {
    fn fetch<'a>(&'a self, ctx: &'a RequestContext) -> BoxFuture<'a, Result<RoleSpec, DispatchError>> {
        Box::pin(async move {
            Ok(RoleSpec::from(ctx.header(&self.0).unwrap_or_default()))
        })
    }
}

//! Handler and middleware traits.
//!
//! A [`Handler`] maps one request to an ordered list of responses or a [`Failure`]. A
//! [`Middleware`] is a value exposing a single `wrap(next)` capability; [`chain`] composes a list
//! of them once, leftmost outermost.

use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::context::RequestContext;
use crate::error::HandlerResult;
use crate::types::{Request, Response};

/// Handles one request. Implementations must be safe to call concurrently.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult;
}

pub type SharedHandler = Arc<dyn Handler>;

/// Wraps a handler with cross-cutting behavior.
pub trait Middleware: Send + Sync {
    fn wrap(&self, next: SharedHandler) -> SharedHandler;
}

pub type SharedMiddleware = Arc<dyn Middleware>;

impl<F> Middleware for F
where
    F: Fn(SharedHandler) -> SharedHandler + Send + Sync,
{
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        self(next)
    }
}

/// Wraps `leaf` with `middlewares`, applied right to left so that `middlewares[0]` is outermost:
/// it runs first on the way in and last on the way out.
pub fn chain(middlewares: &[SharedMiddleware], leaf: SharedHandler) -> SharedHandler {
    middlewares
        .iter()
        .rev()
        .fold(leaf, |next, middleware| middleware.wrap(next))
}

/// Handler backed by an async closure.
pub struct FnHandler<F> {
    f: F,
}

#[async_trait]
impl<F, Fut> Handler for FnHandler<F>
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        (self.f)(ctx, req).await
    }
}

/// Builds a shared handler from an async closure.
pub fn handler_fn<F, Fut>(f: F) -> SharedHandler
where
    F: Fn(RequestContext, Request) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = HandlerResult> + Send + 'static,
{
    Arc::new(FnHandler { f })
}

/// Default handler for text that matches no registered command.
#[derive(Debug, Clone, Default)]
pub struct NotFound;

#[async_trait]
impl Handler for NotFound {
    async fn handle(&self, _ctx: RequestContext, req: Request) -> HandlerResult {
        Ok(vec![Response::to(&req, "command not found")])
    }
}

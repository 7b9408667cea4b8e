//! Panic containment.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use newsfeed_core::{
    panic_message, Handler, HandlerError, HandlerResult, Middleware, Request, RequestContext,
    SharedHandler,
};
use tracing::error;

/// Catches a panic anywhere in the wrapped chain, logs it and returns
/// [`HandlerError::Internal`] so it flows through the normal error path.
#[derive(Debug, Clone, Default)]
pub struct Recover;

impl Middleware for Recover {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(RecoverHandler { next })
    }
}

struct RecoverHandler {
    next: SharedHandler,
}

#[async_trait]
impl Handler for RecoverHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let chat_id = req.chat.id.clone();
        match AssertUnwindSafe(self.next.handle(ctx, req))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                error!(chat_id = %chat_id, panic = %message, "panic recovered");
                Err(HandlerError::Internal(message).into())
            }
        }
    }
}

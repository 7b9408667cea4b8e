//! Wall-time bound for the wrapped chain.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use newsfeed_core::{
    Failure, Handler, HandlerError, HandlerResult, Middleware, Request, RequestContext, SharedHandler,
};
use tokio::time::Instant;
use tracing::warn;

/// Sets a deadline on the context and stops waiting for the wrapped handler once it passes.
///
/// The handler future is driven in place and dropped on expiry, so nothing keeps running after
/// [`HandlerError::Timeout`] is returned. A handler that returns on its own once the deadline has
/// passed also yields [`HandlerError::Timeout`], carrying whatever responses it produced. The context's cancellation token is cancelled when the
/// call ends, whichever way it ends, for collaborators that hold a clone of it.
#[derive(Debug, Clone)]
pub struct Timeout {
    duration: Duration,
}

impl Timeout {
    pub fn new(duration: Duration) -> Self {
        Self { duration }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}

impl Middleware for Timeout {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(TimeoutHandler {
            next,
            duration: self.duration,
        })
    }
}

struct TimeoutHandler {
    next: SharedHandler,
    duration: Duration,
}

#[async_trait]
impl Handler for TimeoutHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let ctx = ctx.with_timeout(self.duration);
        let deadline = ctx
            .deadline()
            .unwrap_or_else(|| Instant::now() + self.duration);
        let _cancel_on_exit = ctx.cancellation().clone().drop_guard();
        let chat_id = req.chat.id.clone();

        let result = match tokio::time::timeout_at(deadline, self.next.handle(ctx, req)).await {
            // A handler that watched the deadline and gave up still reports a timeout.
            Ok(result) if Instant::now() >= deadline => Err(Failure::with_responses(
                HandlerError::Timeout,
                match result {
                    Ok(responses) => responses,
                    Err(failure) => failure.responses,
                },
            )),
            Ok(result) => return result,
            Err(_) => Err(HandlerError::Timeout.into()),
        };
        warn!(
            chat_id = %chat_id,
            timeout_ms = self.duration.as_millis() as u64,
            "handler timed out"
        );
        result
    }
}

//! Correlation id middlewares.

use std::sync::Arc;

use async_trait::async_trait;
use newsfeed_core::{
    Handler, HandlerResult, Middleware, Request, RequestContext, Response, SharedHandler,
};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Text of the response synthesized for the requester when a failed chain produced none for them.
pub const GENERIC_FAILURE_MESSAGE: &str = "Something went wrong. Please, ask admin for help.";

/// Generates a fresh v4 UUID per invocation, stores it on the context and records everything
/// further down the chain under a `request` span carrying `request_id`.
#[derive(Debug, Clone, Default)]
pub struct RequestId;

impl Middleware for RequestId {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(RequestIdHandler { next })
    }
}

struct RequestIdHandler {
    next: SharedHandler,
}

#[async_trait]
impl Handler for RequestIdHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let request_id = Uuid::new_v4().to_string();
        let span = info_span!("request", request_id = %request_id);
        self.next
            .handle(ctx.with_request_id(request_id), req)
            .instrument(span)
            .await
    }
}

/// On failure, appends the correlation id to every produced response. When none of them goes to
/// the requester, adds a generic failure message for them. The error itself is returned unchanged.
#[derive(Debug, Clone, Default)]
pub struct AppendRequestIdOnError;

impl Middleware for AppendRequestIdOnError {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(AppendRequestIdHandler { next })
    }
}

struct AppendRequestIdHandler {
    next: SharedHandler,
}

#[async_trait]
impl Handler for AppendRequestIdHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let request_id = ctx.request_id().unwrap_or_default().to_string();
        let chat_id = req.chat.id.clone();

        let mut failure = match self.next.handle(ctx, req).await {
            Ok(responses) => return Ok(responses),
            Err(failure) => failure,
        };

        let suffix = format!("\n\nRequest ID: `{}`", request_id);
        let mut has_requester = false;
        for response in failure.responses.iter_mut() {
            response.text.push_str(&suffix);
            has_requester |= response.chat_id == chat_id;
        }

        if !has_requester {
            failure.responses.push(Response::new(
                chat_id,
                format!("{}{}", GENERIC_FAILURE_MESSAGE, suffix),
            ));
        }

        Err(failure)
    }
}

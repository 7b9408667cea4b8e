//! Unit test module
//!
//! Middleware unit tests live here, separate from source files.
//! Tests drive each middleware through `wrap` and the resulting handler.

mod recover_test;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use newsfeed_core::{handler_fn, HandlerError, Request, RequestContext, Response, SharedHandler};

/// Replies "echo: TEXT" to the requester.
pub(crate) fn echo() -> SharedHandler {
    handler_fn(|_ctx, req: Request| async move {
        let text = format!("echo: {}", req.text);
        Ok(vec![Response::to(&req, text)])
    })
}

/// Counts invocations and replies "ok".
pub(crate) fn counting(calls: Arc<AtomicUsize>) -> SharedHandler {
    handler_fn(move |_ctx, req: Request| {
        let calls = calls.clone();
        async move {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![Response::to(&req, "ok")])
        }
    })
}

/// Fails with `InvalidCommand` after producing the given responses.
pub(crate) fn failing(responses: Vec<Response>) -> SharedHandler {
    handler_fn(move |_ctx, _req| {
        let responses = responses.clone();
        async move {
            Err(newsfeed_core::Failure::with_responses(
                HandlerError::InvalidCommand("bad".to_string()),
                responses,
            ))
        }
    })
}

pub(crate) fn ctx() -> RequestContext {
    RequestContext::default()
}

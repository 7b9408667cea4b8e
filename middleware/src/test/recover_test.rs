//! Unit tests for Recover.

use std::sync::Arc;

use newsfeed_core::{chain, handler_fn, HandlerError, Middleware, Request, SharedMiddleware};

use super::{ctx, echo};
use crate::{AppendRequestIdOnError, Recover, RequestId, GENERIC_FAILURE_MESSAGE};

/// **Test: a panicking handler yields an Internal error carrying the panic message.**
#[tokio::test]
async fn test_recover_converts_panic() {
    let handler = Recover.wrap(handler_fn(|_ctx, req: Request| async move {
        if req.text == "/panic" {
            panic!("boom");
        }
        Ok(Vec::new())
    }));

    let failure = handler
        .handle(ctx(), Request::new("1", "/panic"))
        .await
        .unwrap_err();
    assert!(failure.is_internal());
    assert!(matches!(failure.error, HandlerError::Internal(ref m) if m == "boom"));
}

/// **Test: a recovered panic flows through the error translation path.**
///
/// **Setup:** RequestId → AppendRequestIdOnError → Recover → panicking handler.
/// **Expected:** one synthesized response to the requester with the request id.
#[tokio::test]
async fn test_recovered_panic_reaches_requester() {
    let mws: Vec<SharedMiddleware> = vec![
        Arc::new(RequestId),
        Arc::new(AppendRequestIdOnError),
        Arc::new(Recover),
    ];
    let handler = chain(
        &mws,
        handler_fn(|_ctx, req: Request| async move {
            let v: Vec<u32> = Vec::new();
            let x = v[3];
            Ok(vec![newsfeed_core::Response::to(&req, x.to_string())])
        }),
    );

    let failure = handler
        .handle(ctx(), Request::new("7", "x"))
        .await
        .unwrap_err();
    assert!(failure.is_internal());
    assert_eq!(failure.responses.len(), 1);
    assert_eq!(failure.responses[0].chat_id, "7");
    assert!(failure.responses[0].text.starts_with(GENERIC_FAILURE_MESSAGE));
}

/// **Test: Recover is transparent when nothing panics.**
#[tokio::test]
async fn test_recover_passes_through() {
    let res = Recover
        .wrap(echo())
        .handle(ctx(), Request::new("1", "hi"))
        .await
        .unwrap();
    assert_eq!(res[0].text, "echo: hi");
}

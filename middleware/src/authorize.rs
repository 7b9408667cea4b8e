//! Authorization gate backed by the user store.

use std::sync::Arc;

use async_trait::async_trait;
use newsfeed_core::{
    Handler, HandlerError, HandlerResult, Middleware, Request, RequestContext, Response,
    SharedHandler,
};
use storage::UserStore;
use tracing::{debug, info};

pub const AUTHORIZED_MESSAGE: &str = "You are now authorized.\n\
Now, you can send me a link to any article, in order to test my capability of shortening it.\n\
But do not overuse it, please, we don't have an unlimited amount of free API calls.";

pub const NOT_AUTHORIZED_MESSAGE: &str = "You are not authorized, please provide a token.";

/// Looks up the requester's record:
/// - no record: the `register` handler answers;
/// - record not authorized: the text is checked against the shared secret, and a match marks the
///   chat authorized and subscribed;
/// - authorized: the wrapped handler runs with the record attached to the context.
#[derive(Clone)]
pub struct Authorize {
    store: Arc<dyn UserStore>,
    secret: String,
    register: SharedHandler,
}

impl Authorize {
    pub fn new(store: Arc<dyn UserStore>, secret: impl Into<String>, register: SharedHandler) -> Self {
        Self {
            store,
            secret: secret.into(),
            register,
        }
    }
}

impl Middleware for Authorize {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(AuthorizeHandler {
            next,
            gate: self.clone(),
        })
    }
}

struct AuthorizeHandler {
    next: SharedHandler,
    gate: Authorize,
}

#[async_trait]
impl Handler for AuthorizeHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let mut user = match self.gate.store.get(&req.chat.id).await {
            Ok(user) => user,
            Err(e) if e.is_not_found() => {
                debug!(chat_id = %req.chat.id, "unknown chat, registering");
                return self.gate.register.handle(ctx, req).await;
            }
            Err(e) => return Err(HandlerError::from(e).into()),
        };

        if user.authorized {
            return self.next.handle(ctx.with_user(user), req).await;
        }

        if self.gate.secret.is_empty() || req.text != self.gate.secret {
            return Ok(vec![Response::to(&req, NOT_AUTHORIZED_MESSAGE)]);
        }

        user.authorized = true;
        user.subscribed = true;
        self.gate
            .store
            .put(&user)
            .await
            .map_err(HandlerError::from)?;
        info!(chat_id = %req.chat.id, "chat authorized");

        Ok(vec![Response::to(&req, AUTHORIZED_MESSAGE)])
    }
}

//! Role gate.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use newsfeed_core::{Handler, HandlerResult, Middleware, Request, RequestContext, SharedHandler};
use tracing::debug;

/// Passes requests from the listed chats through; everyone else gets no responses and no error.
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    chat_ids: Arc<HashSet<String>>,
}

impl AllowList {
    pub fn new<I, S>(chat_ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            chat_ids: Arc::new(chat_ids.into_iter().map(Into::into).collect()),
        }
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.chat_ids.contains(chat_id)
    }
}

impl Middleware for AllowList {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(AllowListHandler {
            next,
            allow: self.clone(),
        })
    }
}

struct AllowListHandler {
    next: SharedHandler,
    allow: AllowList,
}

#[async_trait]
impl Handler for AllowListHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        if !self.allow.contains(&req.chat.id) {
            debug!(chat_id = %req.chat.id, "chat not in allow list, ignoring");
            return Ok(Vec::new());
        }
        self.next.handle(ctx, req).await
    }
}

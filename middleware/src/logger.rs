//! Request/response logging.

use std::sync::Arc;

use async_trait::async_trait;
use newsfeed_core::{
    Handler, HandlerResult, Middleware, Request, RequestContext, Response, SharedHandler,
};
use tracing::{debug, info};

/// How much the [`Logger`] records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verbosity {
    /// Chat id and username in, response chat ids out. Logged at `info`.
    #[default]
    Normal,
    /// Adds the request text and full responses as JSON. Logged at `debug`.
    Verbose,
}

impl Verbosity {
    pub fn from_debug(debug: bool) -> Self {
        if debug {
            Verbosity::Verbose
        } else {
            Verbosity::Normal
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Logger {
    verbosity: Verbosity,
}

impl Logger {
    pub fn new(verbosity: Verbosity) -> Self {
        Self { verbosity }
    }

    pub fn verbosity(&self) -> Verbosity {
        self.verbosity
    }
}

impl Middleware for Logger {
    fn wrap(&self, next: SharedHandler) -> SharedHandler {
        Arc::new(LoggerHandler {
            next,
            verbosity: self.verbosity,
        })
    }
}

struct LoggerHandler {
    next: SharedHandler,
    verbosity: Verbosity,
}

fn to_json(responses: &[Response]) -> String {
    serde_json::to_string(responses).unwrap_or_else(|e| format!("<unserializable: {}>", e))
}

fn chat_ids(responses: &[Response]) -> Vec<&str> {
    responses.iter().map(|r| r.chat_id.as_str()).collect()
}

#[async_trait]
impl Handler for LoggerHandler {
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let chat_id = req.chat.id.clone();
        let username = req.chat.username.clone().unwrap_or_default();

        match self.verbosity {
            Verbosity::Verbose => debug!(
                chat_id = %chat_id,
                chat_username = %username,
                command = %req.text,
                "request received"
            ),
            Verbosity::Normal => info!(
                chat_id = %chat_id,
                chat_username = %username,
                "request received"
            ),
        }

        let result = self.next.handle(ctx, req).await;

        let (responses, error) = match &result {
            Ok(responses) => (responses.as_slice(), None),
            Err(failure) => (failure.responses.as_slice(), Some(failure.error.to_string())),
        };

        match self.verbosity {
            Verbosity::Verbose => debug!(
                chat_id = %chat_id,
                responses = %to_json(responses),
                error = ?error,
                "request processed"
            ),
            Verbosity::Normal => info!(
                chat_id = %chat_id,
                responses = ?chat_ids(responses),
                error = ?error,
                "request processed"
            ),
        }

        result
    }
}

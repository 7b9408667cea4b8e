//! # Router
//!
//! Matches inbound requests to handlers by command prefix. A [`Router`] is assembled once with
//! `add` / `add_middleware` / `group` / `not_found` and then frozen with [`Router::build`] into
//! [`Routes`], an immutable table that implements [`Handler`] and is safe to share across workers.
//!
//! Matching is longest-prefix-wins over a list sorted by descending prefix length, so the outcome
//! never depends on registration order. Middlewares are composed into each route at build time:
//! router-level middlewares outermost, group middlewares closer to the leaf.

use std::sync::Arc;

use async_trait::async_trait;
use newsfeed_core::{
    chain, Handler, HandlerResult, NotFound, Request, RequestContext, SharedHandler,
    SharedMiddleware,
};
use tracing::{debug, instrument};

/// Mutable router used during construction.
pub struct Router {
    routes: Vec<(String, SharedHandler)>,
    middlewares: Vec<SharedMiddleware>,
    not_found: SharedHandler,
}

impl Router {
    /// Creates an empty router whose default handler is [`NotFound`].
    pub fn new() -> Self {
        Self {
            routes: Vec::new(),
            middlewares: Vec::new(),
            not_found: Arc::new(NotFound),
        }
    }

    /// Registers `handler` for requests whose text starts with `prefix`. Registering the same
    /// prefix again replaces the previous handler. The empty prefix designates the default handler.
    pub fn add(&mut self, prefix: impl Into<String>, handler: SharedHandler) -> &mut Self {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return self.not_found(handler);
        }
        match self.routes.iter_mut().find(|(p, _)| *p == prefix) {
            Some(route) => route.1 = handler,
            None => self.routes.push((prefix, handler)),
        }
        self
    }

    /// Appends a middleware applied to every route and to the default handler. The first
    /// middleware added is the outermost.
    pub fn add_middleware(&mut self, middleware: SharedMiddleware) -> &mut Self {
        self.middlewares.push(middleware);
        self
    }

    /// Appends several middlewares, keeping their order.
    pub fn add_middlewares<I>(&mut self, middlewares: I) -> &mut Self
    where
        I: IntoIterator<Item = SharedMiddleware>,
    {
        self.middlewares.extend(middlewares);
        self
    }

    /// Sets the handler for text that matches no registered prefix.
    pub fn not_found(&mut self, handler: SharedHandler) -> &mut Self {
        self.not_found = handler;
        self
    }

    /// Builds an isolated nested router with `f`, then registers its routes here under their
    /// registered prefixes, each pre-wrapped with the nested router's middlewares. Those middlewares
    /// never apply outside the group. A default handler set inside the group is ignored.
    pub fn group<F>(&mut self, f: F) -> &mut Self
    where
        F: FnOnce(&mut Router),
    {
        let mut nested = Router::new();
        f(&mut nested);

        for (prefix, handler) in nested.routes {
            debug!(prefix = %prefix, middlewares = nested.middlewares.len(), "group route registered");
            let wrapped = chain(&nested.middlewares, handler);
            self.add(prefix, wrapped);
        }
        self
    }

    /// Registered prefixes, in registration order.
    pub fn prefixes(&self) -> impl Iterator<Item = &str> {
        self.routes.iter().map(|(prefix, _)| prefix.as_str())
    }

    /// Freezes the router: wraps every route and the default handler with the router
    /// middlewares and sorts the table by descending prefix length.
    pub fn build(self) -> Routes {
        let mut routes: Vec<Route> = self
            .routes
            .into_iter()
            .map(|(prefix, handler)| Route {
                handler: chain(&self.middlewares, handler),
                prefix,
            })
            .collect();
        routes.sort_by(|a, b| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then_with(|| a.prefix.cmp(&b.prefix))
        });

        Routes {
            routes: routes.into(),
            not_found: chain(&self.middlewares, self.not_found),
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new()
    }
}

struct Route {
    prefix: String,
    handler: SharedHandler,
}

/// Immutable, fully wrapped routing table.
#[derive(Clone)]
pub struct Routes {
    routes: Arc<[Route]>,
    not_found: SharedHandler,
}

impl Routes {
    /// The prefix that `text` would be dispatched to; `None` means the default handler.
    pub fn resolve(&self, text: &str) -> Option<&str> {
        self.find(text).map(|route| route.prefix.as_str())
    }

    fn find(&self, text: &str) -> Option<&Route> {
        self.routes
            .iter()
            .find(|route| text.starts_with(route.prefix.as_str()))
    }

    pub fn into_handler(self) -> SharedHandler {
        Arc::new(self)
    }
}

#[async_trait]
impl Handler for Routes {
    #[instrument(skip_all, fields(chat_id = %req.chat.id))]
    async fn handle(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        if req.text.is_empty() {
            debug!("empty request text, nothing to do");
            return Ok(Vec::new());
        }

        let handler = match self.find(&req.text) {
            Some(route) => {
                debug!(prefix = %route.prefix, "route matched");
                route.handler.clone()
            }
            None => {
                debug!("no route matched, using default handler");
                self.not_found.clone()
            }
        };

        handler.handle(ctx, req).await
    }
}

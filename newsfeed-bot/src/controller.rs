//! Bot controller: command handlers and route assembly.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use middleware::{
    AllowList, AppendRequestIdOnError, Authorize, Logger, Recover, RequestId, Timeout, Verbosity,
};
use newsfeed_core::{
    handler_fn, BotError, HandlerError, HandlerResult, Middleware, Request, RequestContext,
    Response, SharedHandler, SharedMiddleware, Transport,
};
use router::{Router, Routes};
use storage::UserStore;
use tracing::{debug, info, warn, Span};
use url::Url;

use crate::article::{Article, ArticleError, ArticleService};
use crate::markdown::escape_markdown;

/// User-facing texts.
pub mod messages {
    pub const REGISTER: &str = "Hello! In order to subscribe to news, you need to provide a token,\n\
please ask admin for it and then send it to me.";

    pub const SUBSCRIBED: &str = "You have been subscribed to news updates.";

    pub const UNSUBSCRIBED: &str = "You will no longer receive news updates.";

    pub const WORKING: &str = "I'm working on it, please wait...";

    pub const SEND_LINK: &str = "Please, send me just a link without any other text.\n\
You can send me a link to any article, in order to test my capability of shortening it.\n\
But do not overuse it, please, we don't have an unlimited amount of free API calls.";

    pub const TOO_LONG: &str = "Article you provided is too long, I can't summarize it.\n\
Article content should be less than 4000 words.";
}

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Chats allowed to run admin commands and notified about bot lifecycle.
    pub admin_ids: Vec<String>,
    /// Shared secret an unauthorized chat sends to become authorized.
    pub auth_token: String,
    /// Wall-time bound for one request.
    pub handler_timeout: Duration,
    pub verbosity: Verbosity,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            admin_ids: Vec::new(),
            auth_token: String::new(),
            handler_timeout: Duration::from_secs(360),
            verbosity: Verbosity::Normal,
        }
    }
}

pub struct Controller {
    store: Arc<dyn UserStore>,
    articles: Arc<dyn ArticleService>,
    transport: Arc<dyn Transport>,
    config: ControllerConfig,
    span: Span,
}

impl Controller {
    pub fn new(
        config: ControllerConfig,
        store: Arc<dyn UserStore>,
        articles: Arc<dyn ArticleService>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            store,
            articles,
            transport,
            config,
            span: Span::none(),
        }
    }

    /// Records controller events under `span`.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Builds the routing table:
    /// RequestId, AppendRequestIdOnError, Recover, Logger and Timeout around everything; the
    /// authorization gate around every command and the article handler; the admin allow list
    /// around `/list` and `/delete`.
    pub fn routes(self: &Arc<Self>) -> Routes {
        let standard: Vec<SharedMiddleware> = vec![
            Arc::new(RequestId),
            Arc::new(AppendRequestIdOnError),
            Arc::new(Recover),
            Arc::new(Logger::new(self.config.verbosity)),
            Arc::new(Timeout::new(self.config.handler_timeout)),
        ];
        let authorize = Authorize::new(
            self.store.clone(),
            self.config.auth_token.clone(),
            self.bind(|c, ctx, req| async move { c.register(ctx, req).await }),
        );
        let admins = AllowList::new(self.config.admin_ids.iter().cloned());

        let mut rtr = Router::new();
        rtr.add_middlewares(standard);
        rtr.group(|authorized| {
            authorized.add_middleware(Arc::new(authorize.clone()));
            authorized.add(
                "/start",
                self.bind(|c, ctx, req| async move { c.start(ctx, req).await }),
            );
            authorized.add(
                "/stop",
                self.bind(|c, ctx, req| async move { c.stop(ctx, req).await }),
            );
            authorized.group(|admin| {
                admin.add_middleware(Arc::new(admins));
                admin.add(
                    "/list",
                    self.bind(|c, ctx, req| async move { c.list(ctx, req).await }),
                );
                admin.add(
                    "/delete",
                    self.bind(|c, ctx, req| async move { c.delete(ctx, req).await }),
                );
            });
        });
        rtr.not_found(
            authorize.wrap(self.bind(|c, ctx, req| async move { c.article(ctx, req).await })),
        );

        rtr.build()
    }

    fn bind<F, Fut>(self: &Arc<Self>, f: F) -> SharedHandler
    where
        F: Fn(Arc<Controller>, RequestContext, Request) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = HandlerResult> + Send + 'static,
    {
        let ctrl = self.clone();
        handler_fn(move |ctx, req| f(ctrl.clone(), ctx, req))
    }

    /// Sends `text` to every admin. Every admin is tried; the last failure is returned.
    pub async fn notify_admins(&self, text: &str) -> newsfeed_core::Result<()> {
        let mut last_err = None;
        for admin in &self.config.admin_ids {
            if let Err(e) = self.transport.send_message(&Response::new(admin, text)).await {
                warn!(parent: &self.span, chat_id = %admin, error = %e, "failed to notify admin");
                last_err = Some(e);
            }
        }
        match last_err {
            Some(e) => Err(e),
            None => {
                debug!(parent: &self.span, admins = self.config.admin_ids.len(), "admins notified");
                Ok(())
            }
        }
    }

    /// Stores a fresh, unauthorized record for the requester and asks for the token.
    pub async fn register(&self, _ctx: RequestContext, req: Request) -> HandlerResult {
        let user = newsfeed_core::User::new(&req.chat);
        self.store.put(&user).await.map_err(HandlerError::from)?;
        info!(parent: &self.span, chat_id = %req.chat.id, "chat registered");
        Ok(vec![Response::to(&req, messages::REGISTER)])
    }

    pub async fn start(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let mut user = match ctx.user() {
            Some(user) => user.clone(),
            None => return self.register(ctx, req).await,
        };
        user.subscribed = true;
        self.store.put(&user).await.map_err(HandlerError::from)?;
        Ok(vec![Response::to(&req, messages::SUBSCRIBED)])
    }

    pub async fn stop(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let mut user = ctx.user().cloned().ok_or(HandlerError::Unauthorized)?;
        user.subscribed = false;
        self.store.put(&user).await.map_err(HandlerError::from)?;
        Ok(vec![Response::to(&req, messages::UNSUBSCRIBED)])
    }

    pub async fn list(&self, _ctx: RequestContext, req: Request) -> HandlerResult {
        let users = self.store.list().await.map_err(HandlerError::from)?;

        let mut text = String::from("Subscribers:\n");
        for user in &users {
            text.push_str(&format!(
                "id: {}, username: {}, authorized: {}, subscribed: {}\n",
                user.chat_id,
                escape_markdown(user.username.as_deref().unwrap_or_default()),
                user.authorized,
                user.subscribed
            ));
        }

        Ok(vec![Response::to(&req, text)])
    }

    /// `/delete <chat_id>`
    pub async fn delete(&self, _ctx: RequestContext, req: Request) -> HandlerResult {
        let tokens: Vec<&str> = req.text.split(' ').collect();
        let chat_id = match tokens.as_slice() {
            [_, chat_id] if !chat_id.is_empty() => chat_id.to_string(),
            _ => {
                return Err(
                    HandlerError::InvalidCommand("usage: /delete <chat_id>".to_string()).into(),
                )
            }
        };

        self.store.delete(&chat_id).await.map_err(HandlerError::from)?;
        info!(parent: &self.span, chat_id = %chat_id, "user deleted");
        Ok(vec![Response::to(
            &req,
            format!("User with id {} was deleted.", chat_id),
        )])
    }

    /// Summarizes the linked article. The requester gets a progress message right away, sent
    /// directly through the transport.
    pub async fn article(&self, ctx: RequestContext, req: Request) -> HandlerResult {
        let link = req.text.trim();
        if !is_article_link(link) {
            return Ok(vec![Response::to(&req, messages::SEND_LINK)]);
        }

        self.transport
            .send_message(&Response::to(&req, messages::WORKING))
            .await
            .map_err(|e: BotError| HandlerError::Transport(e.to_string()))?;

        match self.articles.get_article(&ctx, link).await {
            Ok(article) => Ok(vec![Response::to(&req, render_article(&article, link))]),
            Err(ArticleError::TooLong) => Ok(vec![Response::to(&req, messages::TOO_LONG)]),
            Err(e) => Err(HandlerError::Service(e.to_string()).into()),
        }
    }
}

fn is_article_link(text: &str) -> bool {
    match Url::parse(text) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.has_host(),
        Err(_) => false,
    }
}

fn render_article(article: &Article, link: &str) -> String {
    let url = if article.url.is_empty() {
        link
    } else {
        article.url.as_str()
    };
    format!(
        "*{} by {}*\n\n{}\n\n[source]({})",
        escape_markdown(&article.title),
        escape_markdown(&article.author),
        article.bullet_points,
        url
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_article_link() {
        assert!(is_article_link("https://example.com/post/1"));
        assert!(is_article_link("http://example.com"));
        assert!(!is_article_link("example.com"));
        assert!(!is_article_link("check https://example.com"));
        assert!(!is_article_link("mailto:someone@example.com"));
        assert!(!is_article_link("/unknown"));
    }

    #[test]
    fn test_render_article_escapes_title_and_author() {
        let article = Article {
            url: String::new(),
            title: "Rust_2024".to_string(),
            author: "*anon*".to_string(),
            excerpt: String::new(),
            bullet_points: "- one\n- two".to_string(),
        };
        assert_eq!(
            render_article(&article, "https://a.b/c"),
            "*Rust\\_2024 by \\*anon\\**\n\n- one\n- two\n\n[source](https://a.b/c)"
        );
    }
}

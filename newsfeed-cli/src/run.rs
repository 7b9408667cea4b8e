//! Wires the bot together and runs it until input ends or an interrupt or SIGTERM arrives.

use std::io::BufReader;
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use dispatcher::{Dispatcher, DispatcherOptions};
use newsfeed_bot::{Article, ArticleError, ArticleService, Controller};
use newsfeed_core::RequestContext;
use storage::InMemoryUserStore;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, info_span, instrument, warn};

use crate::config::RunConfig;
use crate::console::{read_requests, ConsoleTransport};

/// Article service used when no summarization backend is wired in: every link is answered with
/// a failure.
#[derive(Debug, Clone, Default)]
pub struct UnconfiguredArticles;

#[async_trait]
impl ArticleService for UnconfiguredArticles {
    async fn get_article(&self, _ctx: &RequestContext, url: &str) -> Result<Article, ArticleError> {
        Err(ArticleError::Unavailable(format!(
            "no summarization backend configured for {}",
            url
        )))
    }
}

/// Runs the console bot. Admins are notified when the bot starts and stops.
#[instrument(skip_all, fields(workers = config.workers, affinity = %config.affinity))]
pub async fn run(config: RunConfig, articles: Arc<dyn ArticleService>) -> Result<()> {
    config.validate().context("invalid configuration")?;

    let (transport, tx) = ConsoleTransport::stdout(config.queue_capacity);
    let transport = Arc::new(transport);
    let store = Arc::new(InMemoryUserStore::new());

    let controller = Arc::new(
        Controller::new(config.controller.clone(), store, articles, transport.clone())
            .with_span(info_span!("bot")),
    );
    let dispatcher = Dispatcher::new(
        controller.routes().into_handler(),
        transport,
        DispatcherOptions::new(config.workers)
            .with_affinity(config.affinity)
            .with_span(info_span!("dispatcher")),
    );

    controller
        .notify_admins("bot started")
        .await
        .context("notify admins about started bot")?;

    let cancel = CancellationToken::new();

    // std thread: a blocking stdin read cannot be cancelled and must not hold up runtime shutdown.
    let chat = config.console_chat.clone();
    std::thread::Builder::new()
        .name("console-input".to_string())
        .spawn(move || read_requests(BufReader::new(std::io::stdin()), tx, chat))
        .context("spawn console reader")?;

    let signals = tokio::spawn({
        let cancel = cancel.clone();
        async move {
            tokio::select! {
                res = tokio::signal::ctrl_c() => {
                    match res {
                        Ok(()) => warn!("caught interrupt, stopping"),
                        Err(e) => error!(error = %e, "failed to listen for interrupt, stopping"),
                    }
                    cancel.cancel();
                }
                res = terminate() => {
                    match res {
                        Ok(()) => warn!("caught terminate signal, stopping"),
                        Err(e) => error!(error = %e, "failed to listen for terminate signal, stopping"),
                    }
                    cancel.cancel();
                }
                _ = cancel.cancelled() => {}
            }
        }
    });

    info!("starting bot");
    let outcome = dispatcher.run(cancel.clone()).await;
    cancel.cancel();
    let _ = signals.await;
    warn!(stats = ?dispatcher.stats(), "bot stopped");

    if let Err(e) = outcome {
        let message = format!("bot stopped with error: {}", e);
        controller
            .notify_admins(&message)
            .await
            .with_context(|| format!("notify admins about stopped bot (reason: {})", e))?;
        return Err(e.into());
    }

    controller
        .notify_admins("bot stopped")
        .await
        .context("notify admins about stopped bot")?;
    Ok(())
}

/// Resolves on SIGTERM.
#[cfg(unix)]
async fn terminate() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    signal(SignalKind::terminate())?.recv().await;
    Ok(())
}

/// No SIGTERM outside unix; only the interrupt stops the bot.
#[cfg(not(unix))]
async fn terminate() -> std::io::Result<()> {
    std::future::pending().await
}

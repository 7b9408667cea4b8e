//! The worker pool.

use std::collections::hash_map::DefaultHasher;
use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use newsfeed_core::{
    inbound_queue, panic_message, BotError, Inbound, Request, RequestContext, Result,
    SharedHandler, Transport,
};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn, Instrument};

use crate::options::{Affinity, DispatcherOptions};
use crate::stats::{DispatcherStats, StatsSnapshot};

/// Worker pool bound to one root handler and one transport.
pub struct Dispatcher {
    shared: Arc<Shared>,
    options: DispatcherOptions,
}

struct Shared {
    handler: SharedHandler,
    transport: Arc<dyn Transport>,
    stats: DispatcherStats,
}

impl Dispatcher {
    pub fn new(
        handler: SharedHandler,
        transport: Arc<dyn Transport>,
        options: DispatcherOptions,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                handler,
                transport,
                stats: DispatcherStats::default(),
            }),
            options,
        }
    }

    pub fn options(&self) -> &DispatcherOptions {
        &self.options
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Starts `workers` loops and waits for all of them to stop.
    ///
    /// A worker stops when `cancel` fires (checked before taking each request, so a request
    /// already being handled is finished first) or when the inbound queue is closed and drained.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        let workers = self.options.workers;
        if workers == 0 {
            return Err(BotError::Config(
                "dispatcher needs at least one worker".to_string(),
            ));
        }

        let span = self.options.span.clone();
        let inbound = self.shared.transport.updates();
        let mut tasks = JoinSet::new();

        let sources: Vec<Inbound> = match self.options.affinity {
            Affinity::Shared => (0..workers).map(|_| inbound.clone()).collect(),
            Affinity::Chat => {
                let (senders, sources): (Vec<_>, Vec<_>) = (0..workers)
                    .map(|_| inbound_queue(self.options.chat_queue_capacity))
                    .unzip();
                tasks.spawn(
                    feed_by_chat(inbound, senders, cancel.clone())
                        .instrument(info_span!(parent: &span, "feeder")),
                );
                sources
            }
        };

        info!(
            parent: &span,
            workers,
            affinity = %self.options.affinity,
            "dispatcher started"
        );

        for (id, source) in sources.into_iter().enumerate() {
            let shared = self.shared.clone();
            let cancel = cancel.clone();
            tasks.spawn(
                shared
                    .work(id, source, cancel)
                    .instrument(info_span!(parent: &span, "worker", worker = id)),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(parent: &span, error = %e, "dispatcher task aborted");
            }
        }

        info!(parent: &span, stats = ?self.stats(), "dispatcher stopped");
        Ok(())
    }
}

impl Shared {
    async fn work(self: Arc<Self>, id: usize, source: Inbound, cancel: CancellationToken) {
        debug!(worker = id, "worker started");
        loop {
            let req = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                req = source.recv() => match req {
                    Some(req) => req,
                    None => break,
                },
            };
            self.process(req, &cancel).await;
        }
        debug!(worker = id, "worker stopped");
    }

    async fn process(&self, req: Request, cancel: &CancellationToken) {
        let ctx = RequestContext::new(cancel.child_token());
        let chat_id = req.chat.id.clone();

        let outcome = AssertUnwindSafe(self.handler.handle(ctx, req))
            .catch_unwind()
            .await;
        self.stats.record_handled();

        let responses = match outcome {
            Ok(Ok(responses)) => responses,
            Ok(Err(failure)) => {
                self.stats.record_failure();
                warn!(chat_id = %chat_id, error = %failure.error, "failed to handle request");
                failure.responses
            }
            Err(payload) => {
                self.stats.record_failure();
                error!(
                    chat_id = %chat_id,
                    panic = %panic_message(payload.as_ref()),
                    "handler panicked"
                );
                Vec::new()
            }
        };

        for response in &responses {
            match self.transport.send_message(response).await {
                Ok(()) => self.stats.record_delivered(),
                Err(e) => {
                    self.stats.record_delivery_failure();
                    warn!(chat_id = %response.chat_id, error = %e, "failed to send message");
                }
            }
        }
    }
}

/// Moves requests from the shared queue to per-worker queues keyed by chat id.
///
/// A request whose worker queue is full is parked in that worker's backlog instead of holding up
/// the feeder, so a stalled chat stalls only its own worker. Backlogs are flushed in arrival order
/// as capacity frees. Dropping the senders on exit closes the worker queues.
async fn feed_by_chat(
    inbound: Inbound,
    senders: Vec<mpsc::Sender<Request>>,
    cancel: CancellationToken,
) {
    let mut backlog: Vec<VecDeque<Request>> = senders.iter().map(|_| VecDeque::new()).collect();
    let mut open = true;

    'feed: loop {
        for (slot, queue) in backlog.iter_mut().enumerate() {
            while let Some(req) = queue.pop_front() {
                match senders[slot].try_send(req) {
                    Ok(()) => {}
                    Err(TrySendError::Full(req)) => {
                        queue.push_front(req);
                        break;
                    }
                    Err(TrySendError::Closed(_)) => {
                        warn!(worker = slot, "worker queue closed");
                        break 'feed;
                    }
                }
            }
        }

        let blocked: Vec<usize> = (0..backlog.len())
            .filter(|&slot| !backlog[slot].is_empty())
            .collect();
        if !open && blocked.is_empty() {
            break;
        }
        if !blocked.is_empty() {
            debug!(blocked = blocked.len(), "worker queues full, requests parked");
        }

        let senders = &senders;
        let capacity = async {
            if blocked.is_empty() {
                return futures::future::pending().await;
            }
            let waits = blocked
                .iter()
                .map(|&slot| Box::pin(async move { (slot, senders[slot].reserve().await) }));
            futures::future::select_all(waits).await.0
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            (slot, permit) = capacity => match (permit, backlog[slot].pop_front()) {
                (Ok(permit), Some(req)) => permit.send(req),
                (Ok(_), None) => {}
                (Err(_), _) => {
                    warn!(worker = slot, "worker queue closed");
                    break;
                }
            },
            req = inbound.recv(), if open => match req {
                Some(req) => {
                    let slot = worker_for(&req.chat.id, senders.len());
                    backlog[slot].push_back(req);
                }
                None => open = false,
            },
        }
    }
    debug!("feeder stopped");
}

/// The worker that every request from `chat_id` is routed to in [`Affinity::Chat`] mode.
pub fn worker_for(chat_id: &str, workers: usize) -> usize {
    let mut hasher = DefaultHasher::new();
    chat_id.hash(&mut hasher);
    (hasher.finish() % workers.max(1) as u64) as usize
}

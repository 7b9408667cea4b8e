//! Console transport: one request per stdin line, responses printed to stdout.

use std::io::BufRead;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use newsfeed_core::{inbound_queue, BotError, Chat, Inbound, Request, Response, Transport};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::{mpsc, Mutex, MutexGuard};
use tracing::debug;

pub struct ConsoleTransport<W = tokio::io::Stdout> {
    inbound: Inbound,
    out: Mutex<W>,
}

impl ConsoleTransport<tokio::io::Stdout> {
    /// Transport printing to stdout, plus the sender feeding its inbound queue.
    pub fn stdout(capacity: usize) -> (Self, mpsc::Sender<Request>) {
        Self::with_writer(capacity, tokio::io::stdout())
    }
}

impl<W> ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    pub fn with_writer(capacity: usize, out: W) -> (Self, mpsc::Sender<Request>) {
        let (tx, inbound) = inbound_queue(capacity);
        (
            Self {
                inbound,
                out: Mutex::new(out),
            },
            tx,
        )
    }

    pub async fn writer(&self) -> MutexGuard<'_, W> {
        self.out.lock().await
    }
}

#[async_trait]
impl<W> Transport for ConsoleTransport<W>
where
    W: AsyncWrite + Unpin + Send,
{
    fn updates(&self) -> Inbound {
        self.inbound.clone()
    }

    async fn send_message(&self, response: &Response) -> newsfeed_core::Result<()> {
        let line = format!("[to {}] {}\n", response.chat_id, response.text);
        let mut out = self.out.lock().await;
        out.write_all(line.as_bytes()).await.map_err(BotError::Io)?;
        out.flush().await.map_err(BotError::Io)?;
        Ok(())
    }
}

/// Turns every non-empty line of `reader` into a request from `chat` and pushes it into the
/// inbound queue, waiting when the queue is full. Blocking; run it on a dedicated thread.
/// Returns the number of requests queued, once the input ends or the queue is closed.
pub fn read_requests<R: BufRead>(reader: R, tx: mpsc::Sender<Request>, chat: Chat) -> u64 {
    static NEXT_MESSAGE_ID: AtomicU64 = AtomicU64::new(1);

    let mut queued = 0;
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                debug!(error = %e, "console input failed");
                break;
            }
        };
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        let req = Request {
            chat: chat.clone(),
            text: text.to_string(),
            message_id: Some(NEXT_MESSAGE_ID.fetch_add(1, Ordering::Relaxed).to_string()),
        };
        if tx.blocking_send(req).is_err() {
            debug!("inbound queue closed, console reader stopping");
            break;
        }
        queued += 1;
    }
    debug!(queued, "console input finished");
    queued
}

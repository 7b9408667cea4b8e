//! Transport abstraction: a shared inbound queue of requests and a fallible send operation.
//!
//! The inbound side is a bounded `tokio::sync::mpsc` channel. Its capacity is the only throttle
//! between the producer of requests and the worker pool: when full, the producer's `send` waits.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::{mpsc, Mutex};

use crate::error::Result;
use crate::types::{Request, Response};

/// Receive side of the inbound queue. Cloning shares the same underlying receiver, so every clone
/// competes for the same requests and each request is received exactly once.
#[derive(Debug, Clone)]
pub struct Inbound {
    rx: Arc<Mutex<mpsc::Receiver<Request>>>,
}

impl Inbound {
    pub fn new(rx: mpsc::Receiver<Request>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Receives the next request; `None` once every sender is dropped and the queue is drained.
    /// Cancel safe: dropping the future never loses a request.
    pub async fn recv(&self) -> Option<Request> {
        self.rx.lock().await.recv().await
    }
}

/// Creates the inbound queue with the given capacity (at least 1).
pub fn inbound_queue(capacity: usize) -> (mpsc::Sender<Request>, Inbound) {
    let (tx, rx) = mpsc::channel(capacity.max(1));
    (tx, Inbound::new(rx))
}

/// A chat transport. Implementations map to a concrete channel (console, chat network, test mock).
#[async_trait]
pub trait Transport: Send + Sync {
    /// The shared stream of inbound requests.
    fn updates(&self) -> Inbound;

    /// Delivers one response. Failures are reported, not retried.
    async fn send_message(&self, response: &Response) -> Result<()>;
}

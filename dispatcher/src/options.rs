use std::fmt;
use std::str::FromStr;

use tracing::Span;

/// How requests are spread over workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Affinity {
    /// Every worker competes for the next request on the shared queue.
    #[default]
    Shared,
    /// Requests from one chat always go to the same worker, so they are handled one at a time
    /// in arrival order.
    Chat,
}

impl fmt::Display for Affinity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Affinity::Shared => write!(f, "shared"),
            Affinity::Chat => write!(f, "chat"),
        }
    }
}

impl FromStr for Affinity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Affinity::Shared),
            "chat" => Ok(Affinity::Chat),
            other => Err(format!(
                "unknown affinity '{}', expected 'shared' or 'chat'",
                other
            )),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DispatcherOptions {
    /// Number of worker loops. Must be positive.
    pub workers: usize,
    pub affinity: Affinity,
    /// Capacity of each per-worker queue in [`Affinity::Chat`] mode.
    pub chat_queue_capacity: usize,
    /// Parent span for every event the pool records.
    pub span: Span,
}

impl DispatcherOptions {
    pub fn new(workers: usize) -> Self {
        Self {
            workers,
            ..Self::default()
        }
    }

    pub fn with_affinity(mut self, affinity: Affinity) -> Self {
        self.affinity = affinity;
        self
    }

    pub fn with_chat_queue_capacity(mut self, capacity: usize) -> Self {
        self.chat_queue_capacity = capacity;
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

impl Default for DispatcherOptions {
    fn default() -> Self {
        Self {
            workers: 10,
            affinity: Affinity::Shared,
            chat_queue_capacity: 16,
            span: Span::none(),
        }
    }
}

//! Per-request context threaded explicitly through the middleware chain.
//!
//! Carries the correlation id, the deadline set by the timeout middleware, a cancellation token
//! derived from the dispatcher's shutdown token, and the authorized user record attached by the
//! authorization gate. Every field has a typed accessor; there is no untyped value map.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::error::HandlerError;
use crate::types::User;

#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    request_id: Option<String>,
    deadline: Option<Instant>,
    cancel: CancellationToken,
    user: Option<User>,
}

impl RequestContext {
    /// Creates a context governed by `cancel` (usually a child of the dispatcher shutdown token).
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            ..Self::default()
        }
    }

    pub fn request_id(&self) -> Option<&str> {
        self.request_id.as_deref()
    }

    pub fn with_request_id(mut self, request_id: impl Into<String>) -> Self {
        self.request_id = Some(request_id.into());
        self
    }

    /// The authorized user, if the authorization gate ran for this request.
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.user = Some(user);
        self
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Returns a context whose deadline is the earlier of the current one and `deadline`.
    /// The returned context gets a child cancellation token, so cancelling it does not affect
    /// the parent while parent cancellation still propagates down.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(current) if current <= deadline => current,
            _ => deadline,
        };
        self.deadline = Some(deadline);
        self.cancel = self.cancel.child_token();
        self
    }

    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Time left until the deadline; `None` when no deadline is set.
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(Instant::now()))
    }

    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// True once the context is cancelled or its deadline has passed.
    pub fn is_done(&self) -> bool {
        self.err().is_some()
    }

    /// Why the context is done: [`HandlerError::Cancelled`] or [`HandlerError::Timeout`].
    pub fn err(&self) -> Option<HandlerError> {
        if self.cancel.is_cancelled() {
            return Some(HandlerError::Cancelled);
        }
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Some(HandlerError::Timeout),
            _ => None,
        }
    }

    /// Resolves when the context is cancelled or the deadline passes. Long-running handlers
    /// select on this to stop work promptly.
    pub async fn done(&self) {
        match self.deadline {
            Some(deadline) => {
                tokio::select! {
                    _ = self.cancel.cancelled() => {}
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => self.cancel.cancelled().await,
        }
    }
}

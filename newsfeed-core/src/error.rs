//! Error types for the bot core.
//!
//! [`HandlerError`] is what handlers and middlewares fail with; [`Failure`] is the failing arm of a
//! [`HandlerResult`] and carries any responses produced alongside the error. [`BotError`] is the
//! top-level error for transport, config and IO.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use crate::types::Response;

/// Errors produced while handling a request.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler did not finish before its deadline.
    #[error("timed out")]
    Timeout,

    /// The handler panicked; the payload message is kept for logging.
    #[error("internal fault: {0}")]
    Internal(String),

    #[error("cancelled")]
    Cancelled,

    #[error("invalid command: {0}")]
    InvalidCommand(String),

    #[error("unauthorized access")]
    Unauthorized,

    #[error("storage error: {0}")]
    Storage(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("service error: {0}")]
    Service(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<BotError> for HandlerError {
    fn from(err: BotError) -> Self {
        match err {
            BotError::Handler(inner) => inner,
            other => HandlerError::Transport(other.to_string()),
        }
    }
}

/// A failed handling pass. `responses` holds whatever the chain produced before or while failing;
/// the dispatcher still delivers them.
#[derive(Debug)]
pub struct Failure {
    pub error: HandlerError,
    pub responses: Vec<Response>,
}

impl Failure {
    pub fn new(error: HandlerError) -> Self {
        Self {
            error,
            responses: Vec::new(),
        }
    }

    pub fn with_responses(error: HandlerError, responses: Vec<Response>) -> Self {
        Self { error, responses }
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.error, HandlerError::Timeout)
    }

    pub fn is_internal(&self) -> bool {
        matches!(self.error, HandlerError::Internal(_))
    }
}

impl fmt::Display for Failure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.error.fmt(f)
    }
}

impl std::error::Error for Failure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

impl From<HandlerError> for Failure {
    fn from(error: HandlerError) -> Self {
        Self::new(error)
    }
}

impl From<BotError> for Failure {
    fn from(err: BotError) -> Self {
        Self::new(err.into())
    }
}

/// Best-effort text of a caught panic payload.
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Outcome of one handling pass: ordered responses, or a failure.
pub type HandlerResult = std::result::Result<Vec<Response>, Failure>;

/// Top-level error (transport, handler, config, IO).
#[derive(Error, Debug)]
pub enum BotError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for core operations; uses [`BotError`].
pub type Result<T> = std::result::Result<T, BotError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> std::result::Result<u32, HandlerError> {
        text.parse()
            .map_err(|_| HandlerError::InvalidCommand(text.to_string()))
    }

    fn fails() -> HandlerResult {
        let _ = parse("nope")?;
        Ok(Vec::new())
    }

    #[test]
    fn test_question_mark_converts_handler_error() {
        let failure = fails().unwrap_err();
        assert!(matches!(failure.error, HandlerError::InvalidCommand(_)));
        assert!(failure.responses.is_empty());
        assert_eq!(failure.to_string(), "invalid command: nope");
    }

    #[test]
    fn test_transport_error_maps_to_handler_transport() {
        let err: HandlerError = BotError::Transport("network down".to_string()).into();
        assert!(matches!(err, HandlerError::Transport(_)));
    }

    #[test]
    fn test_panic_message_payload_kinds() {
        assert_eq!(panic_message(&"static"), "static");
        assert_eq!(panic_message(&String::from("owned")), "owned");
        assert_eq!(panic_message(&42u8), "unknown panic payload");
    }

    #[test]
    fn test_failure_kinds() {
        assert!(Failure::new(HandlerError::Timeout).is_timeout());
        assert!(Failure::new(HandlerError::Internal("boom".into())).is_internal());
        assert!(!Failure::new(HandlerError::Unauthorized).is_timeout());
    }
}

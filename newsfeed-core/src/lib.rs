//! # newsfeed-core
//!
//! Core types and traits for the newsfeed bot: [`Request`], [`Response`], [`Handler`], [`Middleware`],
//! [`Transport`], the per-request [`RequestContext`], error types and tracing initialization.
//! Transport-agnostic; used by router, middleware, dispatcher and the bot controller.

pub mod context;
pub mod error;
pub mod handler;
pub mod logger;
pub mod transport;
pub mod types;

pub use context::RequestContext;
pub use error::{panic_message, BotError, Failure, HandlerError, HandlerResult, Result};
pub use handler::{chain, handler_fn, Handler, Middleware, NotFound, SharedHandler, SharedMiddleware};
pub use logger::{init_tracing, LogConfig};
pub use transport::{inbound_queue, Inbound, Transport};
pub use types::{Chat, Request, Response, User};

//! # middleware
//!
//! The standard middleware set. Each type implements [`newsfeed_core::Middleware`] and is composed
//! once, at router build time:
//!
//! | middleware | effect |
//! |---|---|
//! | [`RequestId`] | fresh correlation id on the context and a `request` span |
//! | [`AppendRequestIdOnError`] | tags failure responses with the correlation id |
//! | [`Recover`] | turns a panic into [`newsfeed_core::HandlerError::Internal`] |
//! | [`Logger`] | logs requests and responses at the given [`Verbosity`] |
//! | [`Timeout`] | bounds wall time through a context deadline |
//! | [`AllowList`] | role gate: silently drops requests from chats outside the set |
//! | [`Authorize`] | per-chat authorization against a [`storage::UserStore`] |

mod allow_list;
mod authorize;
mod logger;
mod recover;
mod request_id;
mod timeout;

pub use allow_list::AllowList;
pub use authorize::{Authorize, AUTHORIZED_MESSAGE, NOT_AUTHORIZED_MESSAGE};
pub use logger::{Logger, Verbosity};
pub use recover::Recover;
pub use request_id::{AppendRequestIdOnError, RequestId, GENERIC_FAILURE_MESSAGE};
pub use timeout::Timeout;

#[cfg(test)]
mod test;

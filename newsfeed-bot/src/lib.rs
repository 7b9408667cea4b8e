//! # newsfeed-bot
//!
//! The bot's business layer on top of the dispatch core. [`Controller`] owns the collaborators
//! (user store, article service, transport) and assembles the full routing table with
//! [`Controller::routes`].

mod article;
mod controller;
mod markdown;

pub use article::{Article, ArticleError, ArticleService};
pub use controller::{messages, Controller, ControllerConfig};
pub use markdown::escape_markdown;

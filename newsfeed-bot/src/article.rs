//! Article summarization collaborator.

use async_trait::async_trait;
use newsfeed_core::RequestContext;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A summarized article, ready to be rendered for the chat.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Article {
    pub url: String,
    pub title: String,
    pub author: String,
    pub excerpt: String,
    /// Pre-formatted summary, one point per line.
    pub bullet_points: String,
}

#[derive(Error, Debug)]
pub enum ArticleError {
    /// The article exceeds what the summarizer accepts.
    #[error("article is too long to summarize")]
    TooLong,

    #[error("article service unavailable: {0}")]
    Unavailable(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Fetches and summarizes an article. May take long; implementations should stop when
/// [`RequestContext::done`] resolves.
#[async_trait]
pub trait ArticleService: Send + Sync {
    async fn get_article(&self, ctx: &RequestContext, url: &str) -> Result<Article, ArticleError>;
}

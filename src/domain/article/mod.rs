pub mod cache;
pub mod error;
pub mod model;
pub mod service;

pub use cache::{ArticleListCache, ArticlePageKey};
pub use error::ArticleServiceError;
pub use model::{Article, NewArticle, ReaderStats, SourceStats, UpsertOutcome};
pub use service::{ArticleService, ArticleServiceApi};

use crate::domain::interaction::Interaction;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;

/// Article as seen by one user
#[derive(Debug, Serialize, Deserialize)]
pub struct ArticleResponse {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub guid: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
    pub read: bool,
    pub favorite: bool,
}

/// Query string of the article listing
#[derive(Debug, Default, Deserialize)]
pub struct ListArticlesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

/// Query string of the article search
#[derive(Debug, Default, Deserialize)]
pub struct SearchArticlesQuery {
    pub q: Option<String>,
    pub limit: Option<i64>,
}

impl ArticleResponse {
    pub fn new(article: Article, interaction: Option<&Interaction>) -> Self {
        Self {
            id: article.id,
            source_id: article.source_id,
            title: article.title,
            link: article.link,
            description: article.description,
            author: article.author,
            published_at: article.published_at,
            guid: article.guid,
            content: article.content,
            thumbnail: article.thumbnail,
            created_at: article.created_at,
            read: interaction.map(|i| i.read).unwrap_or(false),
            favorite: interaction.map(|i| i.favorite).unwrap_or(false),
        }
    }
}

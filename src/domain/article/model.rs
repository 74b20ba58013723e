use crate::domain::ingestion::NormalizedEntry;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub guid: String,
    pub content: String,
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Article {
    /// Age used by retention: publication date, else ingestion time.
    pub fn effective_date(&self) -> DateTime<Utc> {
        self.published_at.unwrap_or(self.created_at)
    }
}

/// Insert payload keyed on `(source_id, guid)`
#[derive(Debug, Clone, PartialEq)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub description: String,
    pub author: Option<String>,
    pub published_at: Option<DateTime<Utc>>,
    pub guid: String,
    pub content: String,
    pub thumbnail: Option<String>,
}

impl NewArticle {
    pub fn from_entry(source_id: i64, entry: &NormalizedEntry) -> Self {
        Self {
            source_id,
            title: entry.title.clone(),
            link: entry.link.clone(),
            description: entry.description.clone(),
            author: entry.author.clone(),
            published_at: entry.published_at,
            guid: entry.guid.clone(),
            content: entry.content.clone(),
            thumbnail: entry.thumbnail.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpsertOutcome {
    pub created: bool,
}

/// Per-source counters from one reader's point of view
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct SourceStats {
    pub source_id: i64,
    pub title: String,
    pub total: i64,
    pub read: i64,
    pub unread: i64,
    pub favorites: i64,
}

/// Totals across every source a reader can see
#[derive(Debug, Clone, Default, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct ReaderStats {
    pub total_articles: i64,
    pub read_articles: i64,
    pub unread_articles: i64,
    pub favorite_articles: i64,
}

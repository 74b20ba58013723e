pub mod error;
pub mod model;
pub mod service;

pub use error::SourceServiceError;
pub use model::{canonicalize_url, NewSource, Source, SourceChanges, DEFAULT_FETCH_INTERVAL_SECS};
pub use service::{SourceService, SourceServiceApi};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Response for source endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct SourceResponse {
    pub id: i64,
    pub url: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub active: bool,
    pub is_public: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub fetch_interval_secs: i32,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// Request to register a new source. Only the URL is required.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct RegisterSourceRequest {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub is_public: Option<bool>,
    #[serde(default)]
    pub fetch_interval_secs: Option<i32>,
}

/// Owner edit of a source
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct UpdateSourceRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub active: Option<bool>,
    #[serde(default)]
    pub fetch_interval_secs: Option<i32>,
    #[serde(default)]
    pub is_public: Option<bool>,
}

/// Registration result: the stored source and what the initial fetch added
#[derive(Debug, Serialize, Deserialize)]
pub struct RegisteredSourceResponse {
    #[serde(flatten)]
    pub source: SourceResponse,
    pub new_articles: u64,
}

impl From<Source> for SourceResponse {
    fn from(source: Source) -> Self {
        Self {
            id: source.id,
            url: source.url,
            title: source.title,
            description: source.description,
            tags: source.tags,
            active: source.active,
            is_public: source.is_public,
            last_fetched_at: source.last_fetched_at,
            fetch_interval_secs: source.fetch_interval_secs,
            owner_id: source.owner_id,
            created_at: source.created_at,
        }
    }
}

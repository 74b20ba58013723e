use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-user state of one article, created lazily on the first toggle.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Interaction {
    pub user_id: Uuid,
    pub article_id: i64,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub favorite: bool,
    pub favorite_at: Option<DateTime<Utc>>,
}

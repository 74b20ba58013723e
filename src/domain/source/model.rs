use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const DEFAULT_FETCH_INTERVAL_SECS: i32 = 3600;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Source {
    pub id: i64,
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub active: bool,
    pub is_public: bool,
    pub last_fetched_at: Option<DateTime<Utc>>,
    pub fetch_interval_secs: i32,
    pub owner_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Source {
    /// Staleness gate. A timestamp in the future counts as fresh.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        match self.last_fetched_at {
            None => true,
            Some(last) => {
                now.signed_duration_since(last)
                    >= chrono::Duration::seconds(i64::from(self.fetch_interval_secs))
            }
        }
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    /// Public sources are shared with every user.
    pub fn is_visible_to(&self, user_id: Uuid) -> bool {
        self.is_public || self.is_owned_by(user_id)
    }
}

/// A source about to be inserted
#[derive(Debug, Clone)]
pub struct NewSource {
    pub url: String,
    pub title: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub is_public: bool,
    pub fetch_interval_secs: i32,
    pub owner_id: Uuid,
}

/// Partial owner edit; `None` leaves the column untouched
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub active: Option<bool>,
    pub fetch_interval_secs: Option<i32>,
    pub is_public: Option<bool>,
}

/// Lowercases scheme and host and drops the fragment so that trivially
/// different spellings of one feed collide on the unique URL constraint.
pub fn canonicalize_url(raw: &str) -> Result<String, String> {
    let mut url = url::Url::parse(raw.trim()).map_err(|e| format!("Invalid URL: {}", e))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err("Invalid URL format: only http and https are supported".to_string());
    }
    if url.host_str().map(str::is_empty).unwrap_or(true) {
        return Err("Invalid URL format: missing host".to_string());
    }

    url.set_fragment(None);
    Ok(url.to_string())
}

use crate::domain::article::ArticleListCache;
use crate::error::AppResult;
use crate::infrastructure::repositories::ArticleRepository;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

/// How long an article is kept, shared by ingestion and the sweeper so an
/// entry the sweeper would delete is never stored in the first place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetentionPolicy {
    horizon: Duration,
}

impl RetentionPolicy {
    pub fn new(horizon: Duration) -> Self {
        Self { horizon }
    }

    pub fn cutoff(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.horizon
    }

    /// Undated entries age from ingestion, so they are never expired on arrival.
    pub fn is_expired(&self, published_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> bool {
        published_at.is_some_and(|published| published < self.cutoff(now))
    }
}

/// Bounds corpus growth by deleting articles older than a fixed horizon.
///
/// Age is the publication date, or the ingestion time for undated entries.
pub struct RetentionSweeper {
    article_repo: Arc<dyn ArticleRepository>,
    cache: ArticleListCache,
    policy: RetentionPolicy,
}

impl RetentionSweeper {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        cache: ArticleListCache,
        policy: RetentionPolicy,
    ) -> Self {
        Self {
            article_repo,
            cache,
            policy,
        }
    }

    pub async fn sweep(&self) -> AppResult<u64> {
        self.sweep_at(Utc::now()).await
    }

    pub async fn sweep_at(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let cutoff = self.policy.cutoff(now);
        let removed = self.article_repo.delete_older_than(cutoff).await?;

        if removed > 0 {
            self.cache.invalidate_all();
            tracing::info!(removed, cutoff = %cutoff, "Expired articles removed");
        }

        Ok(removed)
    }
}

use super::error::IngestError;
use super::fetcher::FeedFetcher;
use super::normalizer::{normalize, NormalizedFeed};
use crate::domain::article::{ArticleListCache, NewArticle};
use crate::domain::retention::RetentionPolicy;
use crate::infrastructure::repositories::ArticleRepository;
use chrono::Utc;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestReport {
    pub total_entries: usize,
    pub new_articles: u64,
}

/// Fetch -> normalize -> store for a single source.
pub struct IngestionPipeline {
    fetcher: Arc<dyn FeedFetcher>,
    article_repo: Arc<dyn ArticleRepository>,
    cache: ArticleListCache,
    retention: RetentionPolicy,
}

impl IngestionPipeline {
    pub fn new(
        fetcher: Arc<dyn FeedFetcher>,
        article_repo: Arc<dyn ArticleRepository>,
        cache: ArticleListCache,
        retention: RetentionPolicy,
    ) -> Self {
        Self {
            fetcher,
            article_repo,
            cache,
            retention,
        }
    }

    pub async fn fetch_feed(&self, url: &str) -> Result<NormalizedFeed, IngestError> {
        let bytes = self.fetcher.fetch(url).await?;
        let feed = normalize(&bytes)?;

        tracing::debug!(
            url = %url,
            bytes = bytes.len(),
            entries = feed.entries.len(),
            "Feed fetched and normalized"
        );

        Ok(feed)
    }

    /// Upserts every entry still inside the retention horizon. Articles
    /// stored before a storage failure stay stored and visible; the next run
    /// deduplicates them.
    pub async fn store_entries(
        &self,
        source_id: i64,
        feed: &NormalizedFeed,
    ) -> Result<IngestReport, IngestError> {
        let now = Utc::now();
        let mut new_articles = 0;

        for entry in &feed.entries {
            if self.retention.is_expired(entry.published_at, now) {
                tracing::debug!(
                    source_id,
                    guid = %entry.guid,
                    "Skipping entry older than the retention horizon"
                );
                continue;
            }

            match self
                .article_repo
                .upsert(&NewArticle::from_entry(source_id, entry))
                .await
            {
                Ok(outcome) if outcome.created => new_articles += 1,
                Ok(_) => {}
                Err(e) => {
                    if new_articles > 0 {
                        self.cache.invalidate_source(source_id);
                    }
                    return Err(e.into());
                }
            }
        }

        if new_articles > 0 {
            self.cache.invalidate_source(source_id);
        }

        Ok(IngestReport {
            total_entries: feed.entries.len(),
            new_articles,
        })
    }

    pub async fn ingest(&self, source_id: i64, url: &str) -> Result<IngestReport, IngestError> {
        let feed = self.fetch_feed(url).await?;
        self.store_entries(source_id, &feed).await
    }
}

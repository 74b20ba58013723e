use super::error::RefreshError;
use super::guard::RefreshGuard;
use crate::domain::ingestion::{IngestError, IngestionPipeline};
use crate::domain::retention::RetentionSweeper;
use crate::domain::source::Source;
use crate::infrastructure::repositories::SourceRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshAllSummary {
    pub refreshed_feeds: u64,
    pub total_new_articles: u64,
    pub total_feeds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshOneSummary {
    pub source_id: i64,
    pub new_articles: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PassOutcome {
    Completed(RefreshAllSummary),
    /// Another pass held the guard
    Skipped,
}

pub struct RefreshService {
    source_repo: Arc<dyn SourceRepository>,
    pipeline: Arc<IngestionPipeline>,
    sweeper: Arc<RetentionSweeper>,
    guard: RefreshGuard,
    pause: Duration,
}

impl RefreshService {
    pub fn new(
        source_repo: Arc<dyn SourceRepository>,
        pipeline: Arc<IngestionPipeline>,
        sweeper: Arc<RetentionSweeper>,
        pause: Duration,
    ) -> Self {
        Self {
            source_repo,
            pipeline,
            sweeper,
            guard: RefreshGuard::default(),
            pause,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        self.guard.is_running()
    }
}

#[async_trait]
pub trait RefreshServiceApi: Send + Sync {
    /// One pass over every due source followed by a retention sweep.
    ///
    /// Per-source failures are logged and skipped; only a failure to list
    /// sources is returned. A pass already in flight yields
    /// [`PassOutcome::Skipped`] without touching anything.
    async fn run_pass(&self) -> Result<PassOutcome, RefreshError>;

    /// [`RefreshServiceApi::run_pass`] with a skipped pass reported as all zeros
    async fn refresh_all(&self) -> Result<RefreshAllSummary, RefreshError>;

    /// Refresh a single source now, ignoring its interval and any pass in
    /// flight. Failures are surfaced.
    async fn refresh_one(&self, source_id: i64) -> Result<RefreshOneSummary, RefreshError>;
}

#[async_trait]
impl RefreshServiceApi for RefreshService {
    async fn run_pass(&self) -> Result<PassOutcome, RefreshError> {
        let Some(_permit) = self.guard.try_acquire() else {
            tracing::info!("Refresh pass already running, skipping");
            return Ok(PassOutcome::Skipped);
        };

        let started = Instant::now();
        let pass_started_at = Utc::now();

        // 1. Enumerate candidates
        let sources = self
            .source_repo
            .find_refreshable()
            .await
            .map_err(|e| RefreshError::Dependency(e.to_string()))?;

        let mut summary = RefreshAllSummary {
            total_feeds: sources.len() as u64,
            ..Default::default()
        };

        tracing::info!(total_feeds = summary.total_feeds, "Refresh pass started");

        // 2. Walk sources sequentially
        let mut fetched_any = false;
        for source in &sources {
            if !source.is_due(pass_started_at) {
                tracing::debug!(
                    source_id = source.id,
                    last_fetched_at = ?source.last_fetched_at,
                    "Source not due, skipping"
                );
                continue;
            }

            if fetched_any && !self.pause.is_zero() {
                tokio::time::sleep(self.pause).await;
            }
            fetched_any = true;

            if let Some(new_articles) = self.refresh_in_pass(source, pass_started_at).await {
                summary.refreshed_feeds += 1;
                summary.total_new_articles += new_articles;
            }
        }

        // 3. Retention
        match self.sweeper.sweep().await {
            Ok(removed) => tracing::debug!(removed, "Retention sweep after pass"),
            Err(e) => tracing::warn!(error = %e, "Retention sweep failed"),
        }

        tracing::info!(
            refreshed_feeds = summary.refreshed_feeds,
            total_new_articles = summary.total_new_articles,
            total_feeds = summary.total_feeds,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Refresh pass finished"
        );

        Ok(PassOutcome::Completed(summary))
    }

    async fn refresh_all(&self) -> Result<RefreshAllSummary, RefreshError> {
        match self.run_pass().await? {
            PassOutcome::Completed(summary) => Ok(summary),
            PassOutcome::Skipped => Ok(RefreshAllSummary::default()),
        }
    }

    async fn refresh_one(&self, source_id: i64) -> Result<RefreshOneSummary, RefreshError> {
        let source = self
            .source_repo
            .find_by_id(source_id)
            .await
            .map_err(|e| RefreshError::Dependency(e.to_string()))?
            .ok_or(RefreshError::NotFound)?;

        let fetched_at = Utc::now();
        let report = self
            .pipeline
            .ingest(source.id, &source.url)
            .await
            .map_err(|e| match e {
                IngestError::Storage(e) => RefreshError::Dependency(e.to_string()),
                upstream => RefreshError::Upstream(upstream.to_string()),
            })?;

        // Articles are already committed; a missing stamp only means an early retry
        if let Err(e) = self.source_repo.mark_fetched(source.id, fetched_at).await {
            tracing::warn!(source_id = source.id, error = %e, "Failed to stamp source");
        }

        tracing::info!(
            source_id = source.id,
            new_articles = report.new_articles,
            "Source refreshed on demand"
        );

        Ok(RefreshOneSummary {
            source_id: source.id,
            new_articles: report.new_articles,
        })
    }
}

impl RefreshService {
    /// Returns the number of new articles, or `None` when the fetch failed
    /// and the source keeps its previous timestamp. A failed stamp after a
    /// successful ingest still counts the committed articles.
    async fn refresh_in_pass(&self, source: &Source, pass_started_at: DateTime<Utc>) -> Option<u64> {
        let report = match self.pipeline.ingest(source.id, &source.url).await {
            Ok(report) => report,
            Err(e) => {
                tracing::warn!(
                    source_id = source.id,
                    url = %source.url,
                    error = %e,
                    upstream = e.is_upstream(),
                    "Source refresh failed"
                );
                return None;
            }
        };

        if let Err(e) = self.source_repo.mark_fetched(source.id, pass_started_at).await {
            tracing::warn!(source_id = source.id, error = %e, "Failed to stamp source");
        }

        tracing::info!(
            source_id = source.id,
            entries = report.total_entries,
            new_articles = report.new_articles,
            "Source refreshed"
        );

        Some(report.new_articles)
    }
}

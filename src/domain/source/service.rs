use super::error::SourceServiceError;
use super::model::{canonicalize_url, NewSource, Source, SourceChanges, DEFAULT_FETCH_INTERVAL_SECS};
use super::{RegisterSourceRequest, RegisteredSourceResponse, SourceResponse, UpdateSourceRequest};
use crate::domain::article::ArticleListCache;
use crate::domain::ingestion::IngestionPipeline;
use crate::infrastructure::repositories::SourceRepository;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct SourceService {
    source_repo: Arc<dyn SourceRepository>,
    pipeline: Arc<IngestionPipeline>,
    cache: ArticleListCache,
}

impl SourceService {
    pub fn new(
        source_repo: Arc<dyn SourceRepository>,
        pipeline: Arc<IngestionPipeline>,
        cache: ArticleListCache,
    ) -> Self {
        Self {
            source_repo,
            pipeline,
            cache,
        }
    }
}

#[async_trait]
pub trait SourceServiceApi: Send + Sync {
    /// Register a feed after a validating fetch.
    ///
    /// Nothing is persisted when the URL cannot be fetched or parsed. The
    /// validating fetch doubles as the initial ingestion.
    async fn register_source(
        &self,
        owner_id: Uuid,
        request: RegisterSourceRequest,
    ) -> Result<RegisteredSourceResponse, SourceServiceError>;

    async fn list_sources(&self, user_id: Uuid) -> Result<Vec<SourceResponse>, SourceServiceError>;

    async fn get_source(
        &self,
        user_id: Uuid,
        source_id: i64,
    ) -> Result<SourceResponse, SourceServiceError>;

    async fn update_source(
        &self,
        user_id: Uuid,
        source_id: i64,
        request: UpdateSourceRequest,
    ) -> Result<SourceResponse, SourceServiceError>;

    async fn delete_source(&self, user_id: Uuid, source_id: i64) -> Result<(), SourceServiceError>;
}

#[async_trait]
impl SourceServiceApi for SourceService {
    async fn register_source(
        &self,
        owner_id: Uuid,
        request: RegisterSourceRequest,
    ) -> Result<RegisteredSourceResponse, SourceServiceError> {
        // 1. Validate input
        let url = canonicalize_url(&request.url).map_err(SourceServiceError::Invalid)?;
        let fetch_interval_secs = request
            .fetch_interval_secs
            .unwrap_or(DEFAULT_FETCH_INTERVAL_SECS);
        validate_interval(fetch_interval_secs)?;

        // 2. Reject known URLs before touching the network
        if self
            .source_repo
            .find_by_url(&url)
            .await
            .map_err(|e| SourceServiceError::Dependency(e.to_string()))?
            .is_some()
        {
            return Err(SourceServiceError::Conflict);
        }

        // 3. Validating fetch
        let fetched_at = Utc::now();
        let feed = self.pipeline.fetch_feed(&url).await.map_err(|e| {
            tracing::warn!(url = %url, error = %e, "Source registration rejected");
            SourceServiceError::InvalidSource(e.to_string())
        })?;

        // 4. Persist; the unique constraint settles concurrent registrations
        let title = non_empty(request.title)
            .or_else(|| non_empty(Some(feed.title.clone())))
            .unwrap_or_else(|| url.clone());

        let mut source = self
            .source_repo
            .create(&NewSource {
                url,
                title,
                description: non_empty(request.description)
                    .or_else(|| non_empty(Some(feed.description.clone()))),
                tags: request.tags.unwrap_or_default(),
                is_public: request.is_public.unwrap_or(true),
                fetch_interval_secs,
                owner_id,
            })
            .await?;

        tracing::info!(
            source_id = source.id,
            url = %source.url,
            owner_id = %owner_id,
            entries = feed.entries.len(),
            "Source registered"
        );

        // 5. Initial ingestion from the document already in hand
        let new_articles = match self.pipeline.store_entries(source.id, &feed).await {
            Ok(report) => {
                match self.source_repo.mark_fetched(source.id, fetched_at).await {
                    Ok(()) => source.last_fetched_at = Some(fetched_at),
                    Err(e) => tracing::warn!(
                        source_id = source.id,
                        error = %e,
                        "Failed to stamp initial fetch"
                    ),
                }
                report.new_articles
            }
            Err(e) => {
                tracing::warn!(
                    source_id = source.id,
                    error = %e,
                    "Initial ingestion failed, next refresh will retry"
                );
                0
            }
        };

        Ok(RegisteredSourceResponse {
            source: SourceResponse::from(source),
            new_articles,
        })
    }

    async fn list_sources(&self, user_id: Uuid) -> Result<Vec<SourceResponse>, SourceServiceError> {
        let sources = self
            .source_repo
            .find_visible(user_id)
            .await
            .map_err(|e| SourceServiceError::Dependency(e.to_string()))?;
        Ok(sources.into_iter().map(SourceResponse::from).collect())
    }

    async fn get_source(
        &self,
        user_id: Uuid,
        source_id: i64,
    ) -> Result<SourceResponse, SourceServiceError> {
        let source = self.find_visible_source(user_id, source_id).await?;
        Ok(SourceResponse::from(source))
    }

    async fn update_source(
        &self,
        user_id: Uuid,
        source_id: i64,
        request: UpdateSourceRequest,
    ) -> Result<SourceResponse, SourceServiceError> {
        let source = self.find_visible_source(user_id, source_id).await?;

        if !source.is_owned_by(user_id) {
            return Err(SourceServiceError::Forbidden(
                "Only the owner can edit this source".to_string(),
            ));
        }

        if let Some(title) = &request.title {
            if title.trim().is_empty() {
                return Err(SourceServiceError::Invalid(
                    "title cannot be empty".to_string(),
                ));
            }
        }
        if let Some(interval) = request.fetch_interval_secs {
            validate_interval(interval)?;
        }

        let changes = SourceChanges {
            title: request.title.map(|t| t.trim().to_string()),
            description: request.description,
            tags: request.tags,
            active: request.active,
            fetch_interval_secs: request.fetch_interval_secs,
            is_public: request.is_public,
        };

        let updated = self
            .source_repo
            .update(source_id, &changes)
            .await
            .map_err(|e| SourceServiceError::Dependency(e.to_string()))?
            .ok_or(SourceServiceError::NotFound)?;

        Ok(SourceResponse::from(updated))
    }

    async fn delete_source(&self, user_id: Uuid, source_id: i64) -> Result<(), SourceServiceError> {
        // Visible means deletable: public sources are shared, private ones owner-only
        self.find_visible_source(user_id, source_id).await?;

        let deleted = self
            .source_repo
            .delete(source_id)
            .await
            .map_err(|e| SourceServiceError::Dependency(e.to_string()))?;
        if !deleted {
            return Err(SourceServiceError::NotFound);
        }

        self.cache.invalidate_source(source_id);
        tracing::info!(source_id, user_id = %user_id, "Source deleted");

        Ok(())
    }
}

impl SourceService {
    async fn find_visible_source(
        &self,
        user_id: Uuid,
        source_id: i64,
    ) -> Result<Source, SourceServiceError> {
        let source = self
            .source_repo
            .find_by_id(source_id)
            .await
            .map_err(|e| SourceServiceError::Dependency(e.to_string()))?
            .ok_or(SourceServiceError::NotFound)?;

        if !source.is_visible_to(user_id) {
            return Err(SourceServiceError::NotFound);
        }

        Ok(source)
    }
}

fn validate_interval(secs: i32) -> Result<(), SourceServiceError> {
    if secs <= 0 {
        return Err(SourceServiceError::Invalid(
            "fetch_interval_secs must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

use crate::domain::source::{NewSource, Source, SourceChanges};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

const SOURCE_COLUMNS: &str = "id, url, title, description, tags, active, is_public, \
     last_fetched_at, fetch_interval_secs, owner_id, created_at, updated_at";

/// Persistence of registered feed sources.
#[async_trait]
pub trait SourceRepository: Send + Sync {
    async fn find_by_id(&self, source_id: i64) -> AppResult<Option<Source>>;

    async fn find_by_url(&self, url: &str) -> AppResult<Option<Source>>;

    /// Public sources plus the user's private ones
    async fn find_visible(&self, user_id: Uuid) -> AppResult<Vec<Source>>;

    /// Sources a scheduled pass walks: active and public, oldest first
    async fn find_refreshable(&self) -> AppResult<Vec<Source>>;

    /// Fails with [`AppError::Conflict`] when the URL is already registered
    async fn create(&self, source: &NewSource) -> AppResult<Source>;

    async fn update(&self, source_id: i64, changes: &SourceChanges) -> AppResult<Option<Source>>;

    async fn mark_fetched(&self, source_id: i64, fetched_at: DateTime<Utc>) -> AppResult<()>;

    /// Removes the source, its articles and their interactions atomically
    async fn delete(&self, source_id: i64) -> AppResult<bool>;
}

pub struct PostgresSourceRepository {
    pool: Arc<DbPool>,
}

impl PostgresSourceRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SourceRepository for PostgresSourceRepository {
    async fn find_by_id(&self, source_id: i64) -> AppResult<Option<Source>> {
        let pool = self.pool.as_ref();
        let source = sqlx::query_as::<_, Source>(&format!(
            "SELECT {} FROM sources WHERE id = $1",
            SOURCE_COLUMNS
        ))
        .bind(source_id)
        .fetch_optional(pool)
        .await?;

        Ok(source)
    }

    async fn find_by_url(&self, url: &str) -> AppResult<Option<Source>> {
        let pool = self.pool.as_ref();
        let source = sqlx::query_as::<_, Source>(&format!(
            "SELECT {} FROM sources WHERE url = $1",
            SOURCE_COLUMNS
        ))
        .bind(url)
        .fetch_optional(pool)
        .await?;

        Ok(source)
    }

    async fn find_visible(&self, user_id: Uuid) -> AppResult<Vec<Source>> {
        let pool = self.pool.as_ref();
        let sources = sqlx::query_as::<_, Source>(&format!(
            r#"
            SELECT {}
            FROM sources
            WHERE is_public OR owner_id = $1
            ORDER BY created_at DESC, id DESC
            "#,
            SOURCE_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(sources)
    }

    async fn find_refreshable(&self) -> AppResult<Vec<Source>> {
        let pool = self.pool.as_ref();
        let sources = sqlx::query_as::<_, Source>(&format!(
            r#"
            SELECT {}
            FROM sources
            WHERE active AND is_public
            ORDER BY id
            "#,
            SOURCE_COLUMNS
        ))
        .fetch_all(pool)
        .await?;

        Ok(sources)
    }

    async fn create(&self, source: &NewSource) -> AppResult<Source> {
        let pool = self.pool.as_ref();
        let now = Utc::now();

        let created = sqlx::query_as::<_, Source>(&format!(
            r#"
            INSERT INTO sources (url, title, description, tags, is_public, fetch_interval_secs, owner_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {}
            "#,
            SOURCE_COLUMNS
        ))
        .bind(&source.url)
        .bind(&source.title)
        .bind(&source.description)
        .bind(&source.tags)
        .bind(source.is_public)
        .bind(source.fetch_interval_secs)
        .bind(source.owner_id)
        .bind(now)
        .fetch_one(pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e {
                if db_err.is_unique_violation() {
                    return AppError::Conflict("Source URL already exists".to_string());
                }
            }
            AppError::Database(e)
        })?;

        Ok(created)
    }

    async fn update(&self, source_id: i64, changes: &SourceChanges) -> AppResult<Option<Source>> {
        let pool = self.pool.as_ref();
        let updated = sqlx::query_as::<_, Source>(&format!(
            r#"
            UPDATE sources
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                tags = COALESCE($4, tags),
                active = COALESCE($5, active),
                fetch_interval_secs = COALESCE($6, fetch_interval_secs),
                is_public = COALESCE($7, is_public),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            SOURCE_COLUMNS
        ))
        .bind(source_id)
        .bind(&changes.title)
        .bind(&changes.description)
        .bind(&changes.tags)
        .bind(changes.active)
        .bind(changes.fetch_interval_secs)
        .bind(changes.is_public)
        .fetch_optional(pool)
        .await?;

        Ok(updated)
    }

    async fn mark_fetched(&self, source_id: i64, fetched_at: DateTime<Utc>) -> AppResult<()> {
        let pool = self.pool.as_ref();
        sqlx::query(
            r#"
            UPDATE sources
            SET last_fetched_at = $2
            WHERE id = $1
            "#,
        )
        .bind(source_id)
        .bind(fetched_at)
        .execute(pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, source_id: i64) -> AppResult<bool> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM article_interactions
            WHERE article_id IN (SELECT id FROM articles WHERE source_id = $1)
            "#,
        )
        .bind(source_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM articles WHERE source_id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM sources WHERE id = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}

use crate::domain::article::{Article, NewArticle, ReaderStats, SourceStats, UpsertOutcome};
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Persistence of ingested articles.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    /// Insert keyed on `(source_id, guid)`. An existing row is left untouched
    /// and reported as `created = false`.
    async fn upsert(&self, article: &NewArticle) -> AppResult<UpsertOutcome>;

    async fn find_by_id(&self, article_id: i64) -> AppResult<Option<Article>>;

    /// Newest first
    async fn list_for_source(
        &self,
        source_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Article>>;

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Article>>;

    /// Newest first across every source visible to `user_id`
    async fn list_visible(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Article>>;

    /// Case-insensitive substring match on title, description and content,
    /// restricted to visible sources. `needle` is matched literally.
    async fn search_visible(
        &self,
        user_id: Uuid,
        needle: &str,
        limit: i64,
    ) -> AppResult<Vec<Article>>;

    async fn source_stats(&self, user_id: Uuid) -> AppResult<Vec<SourceStats>>;

    async fn reader_stats(&self, user_id: Uuid) -> AppResult<ReaderStats>;

    /// Deletes articles whose publication date (or ingestion time when
    /// undated) is before `cutoff`, interactions first, in one transaction.
    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64>;
}

pub struct PostgresArticleRepository {
    pool: Arc<DbPool>,
}

impl PostgresArticleRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ArticleRepository for PostgresArticleRepository {
    async fn upsert(&self, article: &NewArticle) -> AppResult<UpsertOutcome> {
        let pool = self.pool.as_ref();
        let result = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO articles (source_id, title, link, description, author, published_at, guid, content, thumbnail, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING id
            "#,
        )
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.link)
        .bind(&article.description)
        .bind(&article.author)
        .bind(article.published_at)
        .bind(&article.guid)
        .bind(&article.content)
        .bind(&article.thumbnail)
        .bind(Utc::now())
        .fetch_one(pool)
        .await;

        match result {
            Ok(_) => Ok(UpsertOutcome { created: true }),
            Err(sqlx::Error::Database(ref db_err)) if db_err.is_unique_violation() => {
                Ok(UpsertOutcome { created: false })
            }
            Err(e) => Err(AppError::Database(e)),
        }
    }

    async fn find_by_id(&self, article_id: i64) -> AppResult<Option<Article>> {
        let pool = self.pool.as_ref();
        let article = sqlx::query_as::<_, Article>("SELECT * FROM articles WHERE id = $1")
            .bind(article_id)
            .fetch_optional(pool)
            .await?;

        Ok(article)
    }

    async fn list_for_source(
        &self,
        source_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Article>> {
        let pool = self.pool.as_ref();
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT *
            FROM articles
            WHERE source_id = $1
            ORDER BY published_at DESC NULLS LAST, id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(source_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(articles)
    }

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Article>> {
        let pool = self.pool.as_ref();
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.*
            FROM articles a
            JOIN article_interactions i ON i.article_id = a.id
            WHERE i.user_id = $1 AND i.favorite
            ORDER BY i.favorite_at DESC NULLS LAST, a.id DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(articles)
    }

    async fn list_visible(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Article>> {
        let pool = self.pool.as_ref();
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.*
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            WHERE s.is_public OR s.owner_id = $1
            ORDER BY a.published_at DESC NULLS LAST, a.id DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(articles)
    }

    async fn search_visible(
        &self,
        user_id: Uuid,
        needle: &str,
        limit: i64,
    ) -> AppResult<Vec<Article>> {
        let pool = self.pool.as_ref();
        let pattern = format!("%{}%", escape_like(needle));
        let articles = sqlx::query_as::<_, Article>(
            r#"
            SELECT a.*
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            WHERE (s.is_public OR s.owner_id = $1)
              AND (a.title ILIKE $2 OR a.description ILIKE $2 OR a.content ILIKE $2)
            ORDER BY a.published_at DESC NULLS LAST, a.id DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(pattern)
        .bind(limit)
        .fetch_all(pool)
        .await?;

        Ok(articles)
    }

    async fn source_stats(&self, user_id: Uuid) -> AppResult<Vec<SourceStats>> {
        let pool = self.pool.as_ref();
        let stats = sqlx::query_as::<_, SourceStats>(
            r#"
            SELECT
                s.id AS source_id,
                s.title,
                COUNT(a.id) AS total,
                COUNT(a.id) FILTER (WHERE COALESCE(i.read, FALSE)) AS read,
                COUNT(a.id) FILTER (WHERE NOT COALESCE(i.read, FALSE)) AS unread,
                COUNT(a.id) FILTER (WHERE COALESCE(i.favorite, FALSE)) AS favorites
            FROM sources s
            LEFT JOIN articles a ON a.source_id = s.id
            LEFT JOIN article_interactions i ON i.article_id = a.id AND i.user_id = $1
            WHERE s.is_public OR s.owner_id = $1
            GROUP BY s.id, s.title
            ORDER BY s.title, s.id
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(stats)
    }

    async fn reader_stats(&self, user_id: Uuid) -> AppResult<ReaderStats> {
        let pool = self.pool.as_ref();
        let stats = sqlx::query_as::<_, ReaderStats>(
            r#"
            SELECT
                COUNT(a.id) AS total_articles,
                COUNT(a.id) FILTER (WHERE COALESCE(i.read, FALSE)) AS read_articles,
                COUNT(a.id) FILTER (WHERE NOT COALESCE(i.read, FALSE)) AS unread_articles,
                COUNT(a.id) FILTER (WHERE COALESCE(i.favorite, FALSE)) AS favorite_articles
            FROM articles a
            JOIN sources s ON s.id = a.source_id
            LEFT JOIN article_interactions i ON i.article_id = a.id AND i.user_id = $1
            WHERE s.is_public OR s.owner_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await?;

        Ok(stats)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            DELETE FROM article_interactions
            WHERE article_id IN (
                SELECT id FROM articles
                WHERE COALESCE(published_at, created_at) < $1
            )
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            r#"
            DELETE FROM articles
            WHERE COALESCE(published_at, created_at) < $1
            "#,
        )
        .bind(cutoff)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(result.rows_affected())
    }
}

/// Backslash is the default LIKE escape character in Postgres
fn escape_like(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len());
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

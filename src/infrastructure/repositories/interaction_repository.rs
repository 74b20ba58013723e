use crate::domain::interaction::Interaction;
use crate::error::{AppError, AppResult};
use crate::infrastructure::db::DbPool;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

/// Per-user article state, one row per `(user_id, article_id)`.
#[async_trait]
pub trait InteractionRepository: Send + Sync {
    async fn set_read(
        &self,
        user_id: Uuid,
        article_id: i64,
        read: bool,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction>;

    /// Flips the favorite flag; a missing row starts as a favorite
    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        article_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction>;

    async fn find_for_articles(
        &self,
        user_id: Uuid,
        article_ids: &[i64],
    ) -> AppResult<Vec<Interaction>>;
}

pub struct PostgresInteractionRepository {
    pool: Arc<DbPool>,
}

impl PostgresInteractionRepository {
    pub fn new(pool: Arc<DbPool>) -> Self {
        Self { pool }
    }
}

fn map_write_error(e: sqlx::Error) -> AppError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_foreign_key_violation() {
            return AppError::NotFound("Article not found".to_string());
        }
    }
    AppError::Database(e)
}

#[async_trait]
impl InteractionRepository for PostgresInteractionRepository {
    async fn set_read(
        &self,
        user_id: Uuid,
        article_id: i64,
        read: bool,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction> {
        let pool = self.pool.as_ref();
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO article_interactions (user_id, article_id, read, read_at)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (user_id, article_id) DO UPDATE
            SET read = EXCLUDED.read,
                read_at = EXCLUDED.read_at
            RETURNING user_id, article_id, read, read_at, favorite, favorite_at
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .bind(read)
        .bind(read.then_some(at))
        .fetch_one(pool)
        .await
        .map_err(map_write_error)?;

        Ok(interaction)
    }

    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        article_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction> {
        let pool = self.pool.as_ref();
        let interaction = sqlx::query_as::<_, Interaction>(
            r#"
            INSERT INTO article_interactions (user_id, article_id, favorite, favorite_at)
            VALUES ($1, $2, TRUE, $3)
            ON CONFLICT (user_id, article_id) DO UPDATE
            SET favorite = NOT article_interactions.favorite,
                favorite_at = CASE WHEN article_interactions.favorite THEN NULL ELSE $3 END
            RETURNING user_id, article_id, read, read_at, favorite, favorite_at
            "#,
        )
        .bind(user_id)
        .bind(article_id)
        .bind(at)
        .fetch_one(pool)
        .await
        .map_err(map_write_error)?;

        Ok(interaction)
    }

    async fn find_for_articles(
        &self,
        user_id: Uuid,
        article_ids: &[i64],
    ) -> AppResult<Vec<Interaction>> {
        if article_ids.is_empty() {
            return Ok(Vec::new());
        }

        let pool = self.pool.as_ref();
        let interactions = sqlx::query_as::<_, Interaction>(
            r#"
            SELECT user_id, article_id, read, read_at, favorite, favorite_at
            FROM article_interactions
            WHERE user_id = $1 AND article_id = ANY($2)
            "#,
        )
        .bind(user_id)
        .bind(article_ids)
        .fetch_all(pool)
        .await?;

        Ok(interactions)
    }
}

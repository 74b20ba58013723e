use super::error::InteractionServiceError;
use super::InteractionResponse;
use crate::domain::notifier::{ArticleChanged, ArticlePatch, ChangeNotifier};
use crate::infrastructure::repositories::{ArticleRepository, InteractionRepository};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use uuid::Uuid;

pub struct InteractionService {
    article_repo: Arc<dyn ArticleRepository>,
    interaction_repo: Arc<dyn InteractionRepository>,
    notifier: Arc<dyn ChangeNotifier>,
}

impl InteractionService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        interaction_repo: Arc<dyn InteractionRepository>,
        notifier: Arc<dyn ChangeNotifier>,
    ) -> Self {
        Self {
            article_repo,
            interaction_repo,
            notifier,
        }
    }
}

#[async_trait]
pub trait InteractionServiceApi: Send + Sync {
    async fn mark_read(
        &self,
        user_id: Uuid,
        article_id: i64,
        read: bool,
    ) -> Result<InteractionResponse, InteractionServiceError>;

    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        article_id: i64,
    ) -> Result<InteractionResponse, InteractionServiceError>;
}

#[async_trait]
impl InteractionServiceApi for InteractionService {
    async fn mark_read(
        &self,
        user_id: Uuid,
        article_id: i64,
        read: bool,
    ) -> Result<InteractionResponse, InteractionServiceError> {
        self.ensure_article(article_id).await?;

        let interaction = self
            .interaction_repo
            .set_read(user_id, article_id, read, Utc::now())
            .await?;

        self.notifier.notify(ArticleChanged {
            article_id,
            user_id,
            patch: ArticlePatch {
                read: Some(interaction.read),
                favorite: None,
            },
        });

        Ok(InteractionResponse::from(interaction))
    }

    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        article_id: i64,
    ) -> Result<InteractionResponse, InteractionServiceError> {
        self.ensure_article(article_id).await?;

        let interaction = self
            .interaction_repo
            .toggle_favorite(user_id, article_id, Utc::now())
            .await?;

        tracing::debug!(
            user_id = %user_id,
            article_id,
            favorite = interaction.favorite,
            "Favorite toggled"
        );

        self.notifier.notify(ArticleChanged {
            article_id,
            user_id,
            patch: ArticlePatch {
                read: None,
                favorite: Some(interaction.favorite),
            },
        });

        Ok(InteractionResponse::from(interaction))
    }
}

impl InteractionService {
    async fn ensure_article(&self, article_id: i64) -> Result<(), InteractionServiceError> {
        self.article_repo
            .find_by_id(article_id)
            .await
            .map_err(|e| InteractionServiceError::Dependency(e.to_string()))?
            .ok_or(InteractionServiceError::NotFound)?;
        Ok(())
    }
}

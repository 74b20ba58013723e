use super::cache::{ArticleListCache, ArticlePageKey};
use super::error::ArticleServiceError;
use super::model::{Article, ReaderStats, SourceStats};
use super::{
    ArticleResponse, ListArticlesQuery, SearchArticlesQuery, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use crate::domain::interaction::Interaction;
use crate::infrastructure::repositories::{
    ArticleRepository, InteractionRepository, SourceRepository,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

pub struct ArticleService {
    article_repo: Arc<dyn ArticleRepository>,
    interaction_repo: Arc<dyn InteractionRepository>,
    source_repo: Arc<dyn SourceRepository>,
    cache: ArticleListCache,
}

impl ArticleService {
    pub fn new(
        article_repo: Arc<dyn ArticleRepository>,
        interaction_repo: Arc<dyn InteractionRepository>,
        source_repo: Arc<dyn SourceRepository>,
        cache: ArticleListCache,
    ) -> Self {
        Self {
            article_repo,
            interaction_repo,
            source_repo,
            cache,
        }
    }
}

#[async_trait]
pub trait ArticleServiceApi: Send + Sync {
    /// Page of a source's articles, newest first, with the caller's state
    async fn list_for_source(
        &self,
        user_id: Uuid,
        source_id: i64,
        query: ListArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError>;

    async fn list_favorites(&self, user_id: Uuid)
        -> Result<Vec<ArticleResponse>, ArticleServiceError>;

    /// Page of articles across every source the caller can see
    async fn list_articles(
        &self,
        user_id: Uuid,
        query: ListArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError>;

    async fn search(
        &self,
        user_id: Uuid,
        query: SearchArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError>;

    async fn source_stats(&self, user_id: Uuid) -> Result<Vec<SourceStats>, ArticleServiceError>;

    async fn reader_stats(&self, user_id: Uuid) -> Result<ReaderStats, ArticleServiceError>;
}

#[async_trait]
impl ArticleServiceApi for ArticleService {
    async fn list_for_source(
        &self,
        user_id: Uuid,
        source_id: i64,
        query: ListArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError> {
        let key = page_key(source_id, &query)?;

        let source = self
            .source_repo
            .find_by_id(source_id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?
            .ok_or(ArticleServiceError::SourceNotFound)?;
        if !source.is_visible_to(user_id) {
            return Err(ArticleServiceError::SourceNotFound);
        }

        let page = match self.cache.get(&key).await {
            Some(page) => {
                tracing::debug!(source_id, "Article page cache hit");
                page
            }
            None => {
                let ticket = self.cache.ticket();
                let articles = self
                    .article_repo
                    .list_for_source(source_id, key.limit, key.offset)
                    .await
                    .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;
                let page = Arc::new(articles);
                self.cache.insert_if_current(key, page.clone(), ticket).await;
                page
            }
        };

        self.with_user_state(user_id, page.iter().cloned().collect())
            .await
    }

    async fn list_favorites(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError> {
        let articles = self
            .article_repo
            .list_favorites(user_id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;

        self.with_user_state(user_id, articles).await
    }

    async fn list_articles(
        &self,
        user_id: Uuid,
        query: ListArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError> {
        let (limit, offset) = paging(query.limit, query.offset)?;

        let articles = self
            .article_repo
            .list_visible(user_id, limit, offset)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;

        self.with_user_state(user_id, articles).await
    }

    async fn search(
        &self,
        user_id: Uuid,
        query: SearchArticlesQuery,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError> {
        let needle = query.q.as_deref().map(str::trim).unwrap_or_default();
        if needle.is_empty() {
            return Err(ArticleServiceError::Invalid(
                "search query cannot be empty".to_string(),
            ));
        }
        let (limit, _) = paging(query.limit, None)?;

        let articles = self
            .article_repo
            .search_visible(user_id, needle, limit)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?;

        tracing::debug!(user_id = %user_id, matches = articles.len(), "Article search");

        self.with_user_state(user_id, articles).await
    }

    async fn source_stats(&self, user_id: Uuid) -> Result<Vec<SourceStats>, ArticleServiceError> {
        self.article_repo
            .source_stats(user_id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))
    }

    async fn reader_stats(&self, user_id: Uuid) -> Result<ReaderStats, ArticleServiceError> {
        self.article_repo
            .reader_stats(user_id)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))
    }
}

impl ArticleService {
    async fn with_user_state(
        &self,
        user_id: Uuid,
        articles: Vec<Article>,
    ) -> Result<Vec<ArticleResponse>, ArticleServiceError> {
        let ids: Vec<i64> = articles.iter().map(|a| a.id).collect();
        let interactions: HashMap<i64, Interaction> = self
            .interaction_repo
            .find_for_articles(user_id, &ids)
            .await
            .map_err(|e| ArticleServiceError::Dependency(e.to_string()))?
            .into_iter()
            .map(|i| (i.article_id, i))
            .collect();

        Ok(articles
            .into_iter()
            .map(|article| {
                let interaction = interactions.get(&article.id);
                ArticleResponse::new(article, interaction)
            })
            .collect())
    }
}

fn page_key(source_id: i64, query: &ListArticlesQuery) -> Result<ArticlePageKey, ArticleServiceError> {
    let (limit, offset) = paging(query.limit, query.offset)?;

    Ok(ArticlePageKey {
        source_id,
        limit,
        offset,
    })
}

fn paging(limit: Option<i64>, offset: Option<i64>) -> Result<(i64, i64), ArticleServiceError> {
    let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = offset.unwrap_or(0);

    if !(1..=MAX_PAGE_SIZE).contains(&limit) {
        return Err(ArticleServiceError::Invalid(format!(
            "limit must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    if offset < 0 {
        return Err(ArticleServiceError::Invalid(
            "offset cannot be negative".to_string(),
        ));
    }

    Ok((limit, offset))
}

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::domain::article::{
    ArticleResponse, ListArticlesQuery, ReaderStats, SearchArticlesQuery, SourceStats,
};
use crate::domain::interaction::{InteractionResponse, MarkReadRequest};
use crate::{
    domain::article::{ArticleService, ArticleServiceApi},
    domain::interaction::{InteractionService, InteractionServiceApi},
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct ArticleController {
    article_service: Arc<ArticleService>,
    interaction_service: Arc<InteractionService>,
}

impl ArticleController {
    pub fn new(
        article_service: Arc<ArticleService>,
        interaction_service: Arc<InteractionService>,
    ) -> Self {
        Self {
            article_service,
            interaction_service,
        }
    }

    /// GET /api/sources/{sourceId}/articles?limit=&offset=
    pub async fn list_source_articles(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(source_id): Path<i64>,
        Query(query): Query<ListArticlesQuery>,
    ) -> AppResult<Json<Vec<ArticleResponse>>> {
        let articles = controller
            .article_service
            .list_for_source(auth_user.user_id, source_id, query)
            .await?;
        Ok(Json(articles))
    }

    /// GET /api/articles/favorites
    pub async fn list_favorites(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<Vec<ArticleResponse>>> {
        let articles = controller
            .article_service
            .list_favorites(auth_user.user_id)
            .await?;
        Ok(Json(articles))
    }

    /// GET /api/articles?limit=&offset= - Across all visible sources
    pub async fn list_articles(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
        Query(query): Query<ListArticlesQuery>,
    ) -> AppResult<Json<Vec<ArticleResponse>>> {
        let articles = controller
            .article_service
            .list_articles(auth_user.user_id, query)
            .await?;
        Ok(Json(articles))
    }

    /// GET /api/articles/search?q=&limit=
    pub async fn search_articles(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
        Query(query): Query<SearchArticlesQuery>,
    ) -> AppResult<Json<Vec<ArticleResponse>>> {
        let articles = controller
            .article_service
            .search(auth_user.user_id, query)
            .await?;
        Ok(Json(articles))
    }

    /// GET /api/stats/sources
    pub async fn source_stats(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<Vec<SourceStats>>> {
        let stats = controller
            .article_service
            .source_stats(auth_user.user_id)
            .await?;
        Ok(Json(stats))
    }

    /// GET /api/stats
    pub async fn reader_stats(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<ReaderStats>> {
        let stats = controller
            .article_service
            .reader_stats(auth_user.user_id)
            .await?;
        Ok(Json(stats))
    }

    /// POST /api/articles/{articleId}/read
    pub async fn mark_read(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(article_id): Path<i64>,
        Json(request): Json<MarkReadRequest>,
    ) -> AppResult<Json<InteractionResponse>> {
        let interaction = controller
            .interaction_service
            .mark_read(auth_user.user_id, article_id, request.read)
            .await?;
        Ok(Json(interaction))
    }

    /// POST /api/articles/{articleId}/favorite - Toggle favorite
    pub async fn toggle_favorite(
        State(controller): State<Arc<ArticleController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(article_id): Path<i64>,
    ) -> AppResult<Json<InteractionResponse>> {
        let interaction = controller
            .interaction_service
            .toggle_favorite(auth_user.user_id, article_id)
            .await?;
        Ok(Json(interaction))
    }
}

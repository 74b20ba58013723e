use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::domain::source::{
    RegisterSourceRequest, RegisteredSourceResponse, SourceResponse, UpdateSourceRequest,
};
use crate::{
    domain::source::{SourceService, SourceServiceApi},
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct SourceController {
    source_service: Arc<SourceService>,
}

impl SourceController {
    pub fn new(source_service: Arc<SourceService>) -> Self {
        Self { source_service }
    }

    /// GET /api/sources - Sources visible to the caller
    pub async fn list_sources(
        State(controller): State<Arc<SourceController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<Vec<SourceResponse>>> {
        let sources = controller
            .source_service
            .list_sources(auth_user.user_id)
            .await?;
        Ok(Json(sources))
    }

    /// POST /api/sources - Register a feed
    pub async fn register_source(
        State(controller): State<Arc<SourceController>>,
        Extension(auth_user): Extension<AuthUser>,
        Json(request): Json<RegisterSourceRequest>,
    ) -> AppResult<(StatusCode, Json<RegisteredSourceResponse>)> {
        let registered = controller
            .source_service
            .register_source(auth_user.user_id, request)
            .await?;
        Ok((StatusCode::CREATED, Json(registered)))
    }

    /// GET /api/sources/{sourceId}
    pub async fn get_source(
        State(controller): State<Arc<SourceController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(source_id): Path<i64>,
    ) -> AppResult<Json<SourceResponse>> {
        let source = controller
            .source_service
            .get_source(auth_user.user_id, source_id)
            .await?;
        Ok(Json(source))
    }

    /// PUT /api/sources/{sourceId} - Owner edit
    pub async fn update_source(
        State(controller): State<Arc<SourceController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(source_id): Path<i64>,
        Json(request): Json<UpdateSourceRequest>,
    ) -> AppResult<Json<SourceResponse>> {
        let source = controller
            .source_service
            .update_source(auth_user.user_id, source_id, request)
            .await?;
        Ok(Json(source))
    }

    /// DELETE /api/sources/{sourceId} - Delete source with its articles
    pub async fn delete_source(
        State(controller): State<Arc<SourceController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(source_id): Path<i64>,
    ) -> AppResult<StatusCode> {
        controller
            .source_service
            .delete_source(auth_user.user_id, source_id)
            .await?;
        Ok(StatusCode::NO_CONTENT)
    }
}

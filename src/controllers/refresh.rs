use axum::{
    extract::{Path, State},
    Extension, Json,
};
use std::sync::Arc;

use crate::domain::refresh::{RefreshAllSummary, RefreshOneSummary};
use crate::{
    domain::refresh::{RefreshService, RefreshServiceApi},
    domain::source::{SourceService, SourceServiceApi},
    error::AppResult,
    infrastructure::auth::AuthUser,
};

pub struct RefreshController {
    refresh_service: Arc<RefreshService>,
    source_service: Arc<SourceService>,
}

impl RefreshController {
    pub fn new(refresh_service: Arc<RefreshService>, source_service: Arc<SourceService>) -> Self {
        Self {
            refresh_service,
            source_service,
        }
    }

    /// POST /api/sources/{sourceId}/refresh - Refresh one source now
    pub async fn refresh_source(
        State(controller): State<Arc<RefreshController>>,
        Extension(auth_user): Extension<AuthUser>,
        Path(source_id): Path<i64>,
    ) -> AppResult<Json<RefreshOneSummary>> {
        // Hidden sources look missing
        controller
            .source_service
            .get_source(auth_user.user_id, source_id)
            .await?;

        let summary = controller.refresh_service.refresh_one(source_id).await?;
        Ok(Json(summary))
    }

    /// POST /api/refresh-all - Run a pass now; all zeros if one is in flight
    pub async fn refresh_all(
        State(controller): State<Arc<RefreshController>>,
        Extension(auth_user): Extension<AuthUser>,
    ) -> AppResult<Json<RefreshAllSummary>> {
        tracing::info!(user_id = %auth_user.user_id, "Manual refresh of all sources requested");
        let summary = controller.refresh_service.refresh_all().await?;
        Ok(Json(summary))
    }
}

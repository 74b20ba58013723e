use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::future::Future;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::domain::auth::JwtManager;
use crate::infrastructure::config::Config;
use crate::infrastructure::db::DbPool;
use crate::{
    controllers::{
        article::ArticleController, health, refresh::RefreshController, source::SourceController,
    },
    infrastructure::auth::{auth_middleware, request_id_middleware},
};

/// Build the application router with all routes configured
pub fn create_router(
    pool: Arc<DbPool>,
    jwt_manager: Arc<JwtManager>,
    source_controller: Arc<SourceController>,
    article_controller: Arc<ArticleController>,
    refresh_controller: Arc<RefreshController>,
) -> Router {
    // Source routes (require authentication)
    let source_routes = Router::new()
        .route(
            "/api/sources",
            get(SourceController::list_sources).post(SourceController::register_source),
        )
        .route(
            "/api/sources/:sourceId",
            get(SourceController::get_source)
                .put(SourceController::update_source)
                .delete(SourceController::delete_source),
        )
        .with_state(source_controller)
        .layer(middleware::from_fn_with_state(
            jwt_manager.clone(),
            auth_middleware,
        ));

    // Article and interaction routes (require authentication)
    let article_routes = Router::new()
        .route(
            "/api/sources/:sourceId/articles",
            get(ArticleController::list_source_articles),
        )
        .route("/api/articles", get(ArticleController::list_articles))
        .route("/api/articles/search", get(ArticleController::search_articles))
        .route("/api/articles/favorites", get(ArticleController::list_favorites))
        .route("/api/articles/:articleId/read", post(ArticleController::mark_read))
        .route(
            "/api/articles/:articleId/favorite",
            post(ArticleController::toggle_favorite),
        )
        .route("/api/stats", get(ArticleController::reader_stats))
        .route("/api/stats/sources", get(ArticleController::source_stats))
        .with_state(article_controller)
        .layer(middleware::from_fn_with_state(
            jwt_manager.clone(),
            auth_middleware,
        ));

    // Manual refresh routes (require authentication)
    let refresh_routes = Router::new()
        .route(
            "/api/sources/:sourceId/refresh",
            post(RefreshController::refresh_source),
        )
        .route("/api/refresh-all", post(RefreshController::refresh_all))
        .with_state(refresh_controller)
        .layer(middleware::from_fn_with_state(
            jwt_manager.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::health_ready))
        .with_state(pool)
        .merge(source_routes)
        .merge(article_routes)
        .merge(refresh_routes)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

/// Serve `app` until `shutdown` resolves
pub async fn start_http_server(
    config: Arc<Config>,
    app: Router,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<(), Box<dyn std::error::Error>> {
    let listener =
        tokio::net::TcpListener::bind(format!("{}:{}", config.host, config.port)).await?;

    tracing::info!("Server listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    Ok(())
}

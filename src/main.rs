use feedhive_backend::controllers::{
    article::ArticleController, refresh::RefreshController, source::SourceController,
};
use feedhive_backend::domain::article::{ArticleListCache, ArticleService};
use feedhive_backend::domain::auth::JwtManager;
use feedhive_backend::domain::ingestion::IngestionPipeline;
use feedhive_backend::domain::interaction::InteractionService;
use feedhive_backend::domain::refresh::{RefreshScheduler, RefreshService};
use feedhive_backend::domain::retention::{RetentionPolicy, RetentionSweeper};
use feedhive_backend::domain::source::SourceService;
use feedhive_backend::infrastructure::config::{Config, LogFormat};
use feedhive_backend::infrastructure::db::{check_connection, create_pool, run_migrations};
use feedhive_backend::infrastructure::fetcher::HttpFeedFetcher;
use feedhive_backend::infrastructure::http::{create_router, start_http_server};
use feedhive_backend::infrastructure::notifier::BroadcastNotifier;
use feedhive_backend::infrastructure::repositories::{
    PostgresArticleRepository, PostgresInteractionRepository, PostgresSourceRepository,
};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    init_logging(&config);

    tracing::info!(
        "Starting FeedHive Backend on {}:{}",
        config.host,
        config.port
    );

    // Create database connection pool
    let pool = create_pool(&config.database_url).await?;
    tracing::info!("Database connection pool created");

    // Verify database connection
    check_connection(&pool).await?;
    tracing::info!("Database connection verified");

    run_migrations(&pool).await?;
    tracing::info!("Database migrations applied");

    let pool = Arc::new(pool);
    let config = Arc::new(config);

    // === DEPENDENCY INJECTION SETUP ===
    // 1. Instantiate repositories (inject db pool)
    tracing::info!("Instantiating repositories...");
    let source_repo = Arc::new(PostgresSourceRepository::new(pool.clone()));
    let article_repo = Arc::new(PostgresArticleRepository::new(pool.clone()));
    let interaction_repo = Arc::new(PostgresInteractionRepository::new(pool.clone()));

    // 2. Instantiate outbound clients
    tracing::info!(
        user_agent = %config.fetch_user_agent,
        timeout_secs = config.fetch_timeout_secs,
        "Instantiating feed fetcher..."
    );
    let fetcher = Arc::new(HttpFeedFetcher::new(
        config.fetch_timeout(),
        &config.fetch_user_agent,
    )?);
    let notifier = Arc::new(BroadcastNotifier::new());
    let jwt_manager = Arc::new(JwtManager::new(config.jwt_secret.clone()));

    // 3. Instantiate services (inject repositories and clients)
    tracing::info!("Instantiating services...");
    let cache = ArticleListCache::new(config.article_cache_ttl());
    let retention = RetentionPolicy::new(config.retention_horizon());
    let pipeline = Arc::new(IngestionPipeline::new(
        fetcher,
        article_repo.clone(),
        cache.clone(),
        retention,
    ));
    let sweeper = Arc::new(RetentionSweeper::new(
        article_repo.clone(),
        cache.clone(),
        retention,
    ));
    let source_service = Arc::new(SourceService::new(
        source_repo.clone(),
        pipeline.clone(),
        cache.clone(),
    ));
    let article_service = Arc::new(ArticleService::new(
        article_repo.clone(),
        interaction_repo.clone(),
        source_repo.clone(),
        cache,
    ));
    let interaction_service = Arc::new(InteractionService::new(
        article_repo,
        interaction_repo,
        notifier,
    ));
    let refresh_service = Arc::new(RefreshService::new(
        source_repo,
        pipeline,
        sweeper,
        config.refresh_pause(),
    ));

    // 4. Instantiate controllers (inject services)
    tracing::info!("Instantiating controllers...");
    let source_controller = Arc::new(SourceController::new(source_service.clone()));
    let article_controller = Arc::new(ArticleController::new(
        article_service,
        interaction_service,
    ));
    let refresh_controller = Arc::new(RefreshController::new(
        refresh_service.clone(),
        source_service,
    ));

    // 5. Start the refresh scheduler
    let scheduler = if config.scheduler_enabled {
        Some(
            RefreshScheduler::new(
                refresh_service,
                config.refresh_interval(),
                config.refresh_initial_delay(),
            )
            .start(),
        )
    } else {
        tracing::warn!("Refresh scheduler disabled by configuration");
        None
    };

    // Start HTTP server with all routes
    let app = create_router(
        pool,
        jwt_manager,
        source_controller,
        article_controller,
        refresh_controller,
    );
    start_http_server(config, app, shutdown_signal()).await?;

    if let Some(scheduler) = scheduler {
        scheduler.stop().await;
    }

    tracing::info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}

fn init_logging(config: &Config) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "feedhive_backend=debug,tower_http=debug".into());

    if config.log_format == LogFormat::Json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().pretty())
            .init();
    }
}

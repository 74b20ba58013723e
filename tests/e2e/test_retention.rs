use crate::e2e::helpers;

use chrono::{Duration, Utc};
use feedhive_backend::domain::article::ArticleListCache;
use feedhive_backend::domain::retention::{RetentionPolicy, RetentionSweeper};
use feedhive_backend::infrastructure::repositories::PostgresArticleRepository;
use helpers::TestContext;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use test_context::test_context;
use uuid::Uuid;

fn sweeper(ctx: &TestContext) -> RetentionSweeper {
    RetentionSweeper::new(
        Arc::new(PostgresArticleRepository::new(Arc::new(ctx.pool.clone()))),
        ArticleListCache::new(std::time::Duration::from_secs(60)),
        RetentionPolicy::new(Duration::days(30)),
    )
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_remove_expired_articles_and_their_state(ctx: &TestContext) {
    let user = Uuid::new_v4();
    let source_id = ctx
        .fixtures
        .create_source(user, "http://publisher.test/feed.xml", true)
        .await
        .unwrap();
    let now = Utc::now();
    let expired = ctx
        .fixtures
        .create_article(source_id, "expired", Some(now - Duration::days(31)), now)
        .await
        .unwrap();
    ctx.fixtures
        .create_article(source_id, "fresh", Some(now - Duration::days(29)), now)
        .await
        .unwrap();
    // Undated entries age from ingestion
    ctx.fixtures
        .create_article(source_id, "stale-undated", None, now - Duration::days(40))
        .await
        .unwrap();
    ctx.fixtures.favorite(user, expired).await.unwrap();

    let removed = sweeper(ctx).sweep_at(now).await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(
        ctx.fixtures.article_guids(source_id).await.unwrap(),
        vec!["fresh".to_string()]
    );
    assert_eq!(ctx.fixtures.interaction_count(user).await.unwrap(), 0);
}

#[test_context(TestContext)]
#[tokio::test]
async fn it_should_be_a_no_op_when_nothing_expired(ctx: &TestContext) {
    let source_id = ctx
        .fixtures
        .create_source(Uuid::new_v4(), "http://publisher.test/feed.xml", true)
        .await
        .unwrap();
    ctx.fixtures
        .create_article(source_id, "recent", Some(Utc::now()), Utc::now())
        .await
        .unwrap();
    let sweeper = sweeper(ctx);

    assert_eq!(sweeper.sweep().await.unwrap(), 0);
    assert_eq!(sweeper.sweep().await.unwrap(), 0);
    assert_eq!(ctx.fixtures.article_count(source_id).await.unwrap(), 1);
}

//! In-memory doubles for the repository, fetcher and notifier seams.

use crate::domain::article::{Article, NewArticle, ReaderStats, SourceStats, UpsertOutcome};
use crate::domain::ingestion::{FeedFetcher, IngestError};
use crate::domain::interaction::Interaction;
use crate::domain::notifier::{ArticleChanged, ChangeNotifier};
use crate::domain::source::{NewSource, Source, SourceChanges, DEFAULT_FETCH_INTERVAL_SECS};
use crate::error::{AppError, AppResult};
use crate::infrastructure::repositories::{
    ArticleRepository, InteractionRepository, SourceRepository,
};
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use uuid::Uuid;

/// RSS 2.0 document whose items carry a link but no `<guid>`
pub fn rss_feed(items: &[(&str, &str)]) -> String {
    let items: String = items
        .iter()
        .map(|(title, link)| {
            format!(
                "<item><title>{}</title><link>{}</link><description>About {}</description></item>",
                title, link, title
            )
        })
        .collect();

    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><rss version="2.0"><channel><title>Test Feed</title><link>http://feeds.test/</link><description>Fixture</description>{}</channel></rss>"#,
        items
    )
}

#[derive(Default)]
struct StoreState {
    sources: Vec<Source>,
    articles: Vec<Article>,
    interactions: Vec<Interaction>,
    next_source_id: i64,
    next_article_id: i64,
    fail_source_listing: bool,
    fail_mark_fetched: bool,
    upserts_before_failure: Option<usize>,
}

/// One shared state behind all three repository traits, so cascades and
/// sweeps see the same rows.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn add_source(
        &self,
        url: &str,
        owner_id: Uuid,
        is_public: bool,
        last_fetched_at: Option<DateTime<Utc>>,
    ) -> Source {
        let mut state = self.state.lock();
        state.next_source_id += 1;
        let now = Utc::now();
        let source = Source {
            id: state.next_source_id,
            url: url.to_string(),
            title: url.to_string(),
            description: None,
            tags: vec![],
            active: true,
            is_public,
            last_fetched_at,
            fetch_interval_secs: DEFAULT_FETCH_INTERVAL_SECS,
            owner_id,
            created_at: now,
            updated_at: now,
        };
        state.sources.push(source.clone());
        source
    }

    pub fn add_article(
        &self,
        source_id: i64,
        guid: &str,
        published_at: Option<DateTime<Utc>>,
        created_at: DateTime<Utc>,
    ) -> Article {
        let mut state = self.state.lock();
        state.next_article_id += 1;
        let article = Article {
            id: state.next_article_id,
            source_id,
            title: guid.to_string(),
            link: guid.to_string(),
            description: String::new(),
            author: None,
            published_at,
            guid: guid.to_string(),
            content: String::new(),
            thumbnail: None,
            created_at,
        };
        state.articles.push(article.clone());
        article
    }

    pub fn source(&self, source_id: i64) -> Option<Source> {
        self.state
            .lock()
            .sources
            .iter()
            .find(|s| s.id == source_id)
            .cloned()
    }

    pub fn articles(&self) -> Vec<Article> {
        self.state.lock().articles.clone()
    }

    pub fn article_count(&self) -> usize {
        self.state.lock().articles.len()
    }

    pub fn interactions(&self) -> Vec<Interaction> {
        self.state.lock().interactions.clone()
    }

    pub fn fail_source_listing(&self) {
        self.state.lock().fail_source_listing = true;
    }

    pub fn fail_mark_fetched(&self) {
        self.state.lock().fail_mark_fetched = true;
    }

    /// Lets `n` more upserts through, then fails every following one.
    pub fn fail_upserts_after(&self, n: usize) {
        self.state.lock().upserts_before_failure = Some(n);
    }
}

#[async_trait]
impl SourceRepository for InMemoryStore {
    async fn find_by_id(&self, source_id: i64) -> AppResult<Option<Source>> {
        Ok(self.source(source_id))
    }

    async fn find_by_url(&self, url: &str) -> AppResult<Option<Source>> {
        Ok(self
            .state
            .lock()
            .sources
            .iter()
            .find(|s| s.url == url)
            .cloned())
    }

    async fn find_visible(&self, user_id: Uuid) -> AppResult<Vec<Source>> {
        Ok(self
            .state
            .lock()
            .sources
            .iter()
            .filter(|s| s.is_visible_to(user_id))
            .cloned()
            .collect())
    }

    async fn find_refreshable(&self) -> AppResult<Vec<Source>> {
        let state = self.state.lock();
        if state.fail_source_listing {
            return Err(AppError::Internal("source listing unavailable".to_string()));
        }
        Ok(state
            .sources
            .iter()
            .filter(|s| s.active && s.is_public)
            .cloned()
            .collect())
    }

    async fn create(&self, source: &NewSource) -> AppResult<Source> {
        let mut state = self.state.lock();
        if state.sources.iter().any(|s| s.url == source.url) {
            return Err(AppError::Conflict("Source URL already exists".to_string()));
        }
        state.next_source_id += 1;
        let now = Utc::now();
        let created = Source {
            id: state.next_source_id,
            url: source.url.clone(),
            title: source.title.clone(),
            description: source.description.clone(),
            tags: source.tags.clone(),
            active: true,
            is_public: source.is_public,
            last_fetched_at: None,
            fetch_interval_secs: source.fetch_interval_secs,
            owner_id: source.owner_id,
            created_at: now,
            updated_at: now,
        };
        state.sources.push(created.clone());
        Ok(created)
    }

    async fn update(&self, source_id: i64, changes: &SourceChanges) -> AppResult<Option<Source>> {
        let mut state = self.state.lock();
        let Some(source) = state.sources.iter_mut().find(|s| s.id == source_id) else {
            return Ok(None);
        };
        if let Some(title) = &changes.title {
            source.title = title.clone();
        }
        if let Some(description) = &changes.description {
            source.description = Some(description.clone());
        }
        if let Some(tags) = &changes.tags {
            source.tags = tags.clone();
        }
        if let Some(active) = changes.active {
            source.active = active;
        }
        if let Some(interval) = changes.fetch_interval_secs {
            source.fetch_interval_secs = interval;
        }
        if let Some(is_public) = changes.is_public {
            source.is_public = is_public;
        }
        source.updated_at = Utc::now();
        Ok(Some(source.clone()))
    }

    async fn mark_fetched(&self, source_id: i64, fetched_at: DateTime<Utc>) -> AppResult<()> {
        let mut state = self.state.lock();
        if state.fail_mark_fetched {
            return Err(AppError::Internal("sources table locked".to_string()));
        }
        if let Some(source) = state
            .sources
            .iter_mut()
            .find(|s| s.id == source_id)
        {
            source.last_fetched_at = Some(fetched_at);
        }
        Ok(())
    }

    async fn delete(&self, source_id: i64) -> AppResult<bool> {
        let mut state = self.state.lock();
        let doomed: Vec<i64> = state
            .articles
            .iter()
            .filter(|a| a.source_id == source_id)
            .map(|a| a.id)
            .collect();
        state.interactions.retain(|i| !doomed.contains(&i.article_id));
        state.articles.retain(|a| a.source_id != source_id);
        let before = state.sources.len();
        state.sources.retain(|s| s.id != source_id);
        Ok(state.sources.len() < before)
    }
}

#[async_trait]
impl ArticleRepository for InMemoryStore {
    async fn upsert(&self, article: &NewArticle) -> AppResult<UpsertOutcome> {
        let mut state = self.state.lock();
        let remaining = state.upserts_before_failure;
        match remaining {
            Some(0) => return Err(AppError::Internal("articles table unavailable".to_string())),
            Some(n) => state.upserts_before_failure = Some(n - 1),
            None => {}
        }
        if state
            .articles
            .iter()
            .any(|a| a.source_id == article.source_id && a.guid == article.guid)
        {
            return Ok(UpsertOutcome { created: false });
        }
        state.next_article_id += 1;
        let stored = Article {
            id: state.next_article_id,
            source_id: article.source_id,
            title: article.title.clone(),
            link: article.link.clone(),
            description: article.description.clone(),
            author: article.author.clone(),
            published_at: article.published_at,
            guid: article.guid.clone(),
            content: article.content.clone(),
            thumbnail: article.thumbnail.clone(),
            created_at: Utc::now(),
        };
        state.articles.push(stored);
        Ok(UpsertOutcome { created: true })
    }

    async fn find_by_id(&self, article_id: i64) -> AppResult<Option<Article>> {
        Ok(self
            .state
            .lock()
            .articles
            .iter()
            .find(|a| a.id == article_id)
            .cloned())
    }

    async fn list_for_source(
        &self,
        source_id: i64,
        limit: i64,
        offset: i64,
    ) -> AppResult<Vec<Article>> {
        let mut articles: Vec<Article> = self
            .state
            .lock()
            .articles
            .iter()
            .filter(|a| a.source_id == source_id)
            .cloned()
            .collect();
        articles.sort_by(newest_first);
        Ok(articles
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn list_favorites(&self, user_id: Uuid) -> AppResult<Vec<Article>> {
        let state = self.state.lock();
        Ok(state
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id && i.favorite)
            .filter_map(|i| state.articles.iter().find(|a| a.id == i.article_id))
            .cloned()
            .collect())
    }

    async fn list_visible(&self, user_id: Uuid, limit: i64, offset: i64) -> AppResult<Vec<Article>> {
        let mut articles = self.state.lock().visible_articles(user_id);
        articles.sort_by(newest_first);
        Ok(articles
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }

    async fn search_visible(
        &self,
        user_id: Uuid,
        needle: &str,
        limit: i64,
    ) -> AppResult<Vec<Article>> {
        let needle = needle.to_lowercase();
        let mut articles: Vec<Article> = self
            .state
            .lock()
            .visible_articles(user_id)
            .into_iter()
            .filter(|a| {
                [&a.title, &a.description, &a.content]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&needle))
            })
            .collect();
        articles.sort_by(newest_first);
        articles.truncate(limit as usize);
        Ok(articles)
    }

    async fn source_stats(&self, user_id: Uuid) -> AppResult<Vec<SourceStats>> {
        let state = self.state.lock();
        let mut stats: Vec<SourceStats> = state
            .sources
            .iter()
            .filter(|s| s.is_visible_to(user_id))
            .map(|source| {
                let mut row = SourceStats {
                    source_id: source.id,
                    title: source.title.clone(),
                    total: 0,
                    read: 0,
                    unread: 0,
                    favorites: 0,
                };
                for article in state.articles.iter().filter(|a| a.source_id == source.id) {
                    let (read, favorite) = state.flags(user_id, article.id);
                    row.total += 1;
                    if read {
                        row.read += 1;
                    } else {
                        row.unread += 1;
                    }
                    if favorite {
                        row.favorites += 1;
                    }
                }
                row
            })
            .collect();
        stats.sort_by(|a, b| a.title.cmp(&b.title).then(a.source_id.cmp(&b.source_id)));
        Ok(stats)
    }

    async fn reader_stats(&self, user_id: Uuid) -> AppResult<ReaderStats> {
        let state = self.state.lock();
        let mut stats = ReaderStats::default();
        for article in state.visible_articles(user_id) {
            let (read, favorite) = state.flags(user_id, article.id);
            stats.total_articles += 1;
            if read {
                stats.read_articles += 1;
            } else {
                stats.unread_articles += 1;
            }
            if favorite {
                stats.favorite_articles += 1;
            }
        }
        Ok(stats)
    }

    async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.state.lock();
        let doomed: Vec<i64> = state
            .articles
            .iter()
            .filter(|a| a.effective_date() < cutoff)
            .map(|a| a.id)
            .collect();
        state.interactions.retain(|i| !doomed.contains(&i.article_id));
        state.articles.retain(|a| !doomed.contains(&a.id));
        Ok(doomed.len() as u64)
    }
}

/// `published_at DESC NULLS LAST, id DESC`
fn newest_first(a: &Article, b: &Article) -> std::cmp::Ordering {
    match (a.published_at, b.published_at) {
        (Some(x), Some(y)) => y.cmp(&x),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => std::cmp::Ordering::Equal,
    }
    .then(b.id.cmp(&a.id))
}

impl StoreState {
    fn visible_articles(&self, user_id: Uuid) -> Vec<Article> {
        self.articles
            .iter()
            .filter(|a| {
                self.sources
                    .iter()
                    .any(|s| s.id == a.source_id && s.is_visible_to(user_id))
            })
            .cloned()
            .collect()
    }

    /// `(read, favorite)` for one user and article
    fn flags(&self, user_id: Uuid, article_id: i64) -> (bool, bool) {
        self.interactions
            .iter()
            .find(|i| i.user_id == user_id && i.article_id == article_id)
            .map_or((false, false), |i| (i.read, i.favorite))
    }

    fn interaction_mut(&mut self, user_id: Uuid, article_id: i64) -> AppResult<&mut Interaction> {
        if !self.articles.iter().any(|a| a.id == article_id) {
            return Err(AppError::NotFound("Article not found".to_string()));
        }
        let position = self
            .interactions
            .iter()
            .position(|i| i.user_id == user_id && i.article_id == article_id);
        let index = match position {
            Some(index) => index,
            None => {
                self.interactions.push(Interaction {
                    user_id,
                    article_id,
                    read: false,
                    read_at: None,
                    favorite: false,
                    favorite_at: None,
                });
                self.interactions.len() - 1
            }
        };
        Ok(&mut self.interactions[index])
    }
}

#[async_trait]
impl InteractionRepository for InMemoryStore {
    async fn set_read(
        &self,
        user_id: Uuid,
        article_id: i64,
        read: bool,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction> {
        let mut state = self.state.lock();
        let interaction = state.interaction_mut(user_id, article_id)?;
        interaction.read = read;
        interaction.read_at = read.then_some(at);
        Ok(interaction.clone())
    }

    async fn toggle_favorite(
        &self,
        user_id: Uuid,
        article_id: i64,
        at: DateTime<Utc>,
    ) -> AppResult<Interaction> {
        let mut state = self.state.lock();
        let interaction = state.interaction_mut(user_id, article_id)?;
        interaction.favorite = !interaction.favorite;
        interaction.favorite_at = interaction.favorite.then_some(at);
        Ok(interaction.clone())
    }

    async fn find_for_articles(
        &self,
        user_id: Uuid,
        article_ids: &[i64],
    ) -> AppResult<Vec<Interaction>> {
        Ok(self
            .state
            .lock()
            .interactions
            .iter()
            .filter(|i| i.user_id == user_id && article_ids.contains(&i.article_id))
            .cloned()
            .collect())
    }
}

enum StubResponse {
    Body(Bytes),
    NetworkError,
    Timeout,
}

/// Serves canned documents by URL. Unknown URLs fail like a 404.
#[derive(Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, StubResponse>>,
    calls: Mutex<Vec<String>>,
    hold: Mutex<Option<(Arc<Notify>, Arc<Notify>)>>,
}

impl StubFetcher {
    pub fn serve(&self, url: &str, body: impl Into<String>) {
        self.responses
            .lock()
            .insert(url.to_string(), StubResponse::Body(Bytes::from(body.into())));
    }

    pub fn fail(&self, url: &str) {
        self.responses
            .lock()
            .insert(url.to_string(), StubResponse::NetworkError);
    }

    pub fn time_out(&self, url: &str) {
        self.responses
            .lock()
            .insert(url.to_string(), StubResponse::Timeout);
    }

    /// Makes the next fetch block. Returns `(entered, release)`: `entered`
    /// fires once a fetch is parked, `release` lets it continue.
    pub fn hold_next(&self) -> (Arc<Notify>, Arc<Notify>) {
        let entered = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        *self.hold.lock() = Some((entered.clone(), release.clone()));
        (entered, release)
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl FeedFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, IngestError> {
        self.calls.lock().push(url.to_string());

        let hold = self.hold.lock().take();
        if let Some((entered, release)) = hold {
            entered.notify_one();
            release.notified().await;
        }

        match self.responses.lock().get(url) {
            Some(StubResponse::Body(body)) => Ok(body.clone()),
            Some(StubResponse::NetworkError) => {
                Err(IngestError::Network("connection refused".to_string()))
            }
            Some(StubResponse::Timeout) => Err(IngestError::Timeout(Duration::from_secs(30))),
            None => Err(IngestError::Network("HTTP 404 Not Found".to_string())),
        }
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<ArticleChanged>>,
}

impl RecordingNotifier {
    pub fn events(&self) -> Vec<ArticleChanged> {
        self.events.lock().clone()
    }
}

impl ChangeNotifier for RecordingNotifier {
    fn notify(&self, event: ArticleChanged) {
        self.events.lock().push(event);
    }
}

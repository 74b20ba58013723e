use super::model::Article;
use moka::future::Cache;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ArticlePageKey {
    pub source_id: i64,
    pub limit: i64,
    pub offset: i64,
}

/// Short-lived cache of per-source article pages, shared by all readers.
///
/// Every invalidation bumps an epoch. A reader takes a ticket before going to
/// the database and its page is only kept if no invalidation happened since,
/// so a page read before new articles were stored cannot outlive them.
#[derive(Clone)]
pub struct ArticleListCache {
    inner: Cache<ArticlePageKey, Arc<Vec<Article>>>,
    epoch: Arc<AtomicU64>,
}

impl ArticleListCache {
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(1_000)
            .time_to_live(ttl)
            .support_invalidation_closures()
            .build();
        Self {
            inner,
            epoch: Arc::new(AtomicU64::new(0)),
        }
    }

    pub async fn get(&self, key: &ArticlePageKey) -> Option<Arc<Vec<Article>>> {
        self.inner.get(key).await
    }

    /// Take before reading the page from storage.
    pub fn ticket(&self) -> u64 {
        self.epoch.load(Ordering::SeqCst)
    }

    /// Cache `page` unless an invalidation ran after `ticket` was taken.
    /// Returns whether the page was kept.
    pub async fn insert_if_current(
        &self,
        key: ArticlePageKey,
        page: Arc<Vec<Article>>,
        ticket: u64,
    ) -> bool {
        self.inner.insert(key.clone(), page).await;
        // An invalidation after this check also sees the entry just inserted
        if self.epoch.load(Ordering::SeqCst) != ticket {
            self.inner.invalidate(&key).await;
            return false;
        }
        true
    }

    /// Drop every cached page of one source
    pub fn invalidate_source(&self, source_id: i64) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        if let Err(e) = self
            .inner
            .invalidate_entries_if(move |key, _| key.source_id == source_id)
        {
            tracing::warn!(source_id, error = %e, "Failed to invalidate article cache, clearing it");
            self.inner.invalidate_all();
        }
    }

    pub fn invalidate_all(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.invalidate_all();
    }
}

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Only the fields that actually changed are set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArticlePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub favorite: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleChanged {
    pub article_id: i64,
    pub user_id: Uuid,
    pub patch: ArticlePatch,
}

/// Sink for per-article state changes.
///
/// Fire-and-forget: implementations must not block and must not fail the
/// caller. Delivery to live subscribers is best effort.
pub trait ChangeNotifier: Send + Sync {
    fn notify(&self, event: ArticleChanged);
}

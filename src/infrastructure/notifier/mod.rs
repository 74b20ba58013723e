use crate::domain::notifier::{ArticleChanged, ChangeNotifier};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 1024;

/// Publishes change events to every live subscriber.
///
/// Slow subscribers lag and lose the oldest events rather than blocking
/// the publisher.
#[derive(Clone)]
pub struct BroadcastNotifier {
    sender: broadcast::Sender<ArticleChanged>,
}

impl BroadcastNotifier {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArticleChanged> {
        self.sender.subscribe()
    }
}

impl Default for BroadcastNotifier {
    fn default() -> Self {
        Self::new()
    }
}

impl ChangeNotifier for BroadcastNotifier {
    fn notify(&self, event: ArticleChanged) {
        let article_id = event.article_id;
        match self.sender.send(event) {
            Ok(receivers) => {
                tracing::debug!(article_id, receivers, "Article change published");
            }
            Err(_) => {
                tracing::debug!(article_id, "Article change dropped, no subscribers");
            }
        }
    }
}

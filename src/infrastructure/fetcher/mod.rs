use crate::domain::ingestion::{FeedFetcher, IngestError};
use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use std::time::Duration;

const CONNECT_TIMEOUT_SECS: u64 = 10;

const MAX_REDIRECTS: usize = 5;

/// Upper bound on a feed document (10 MiB)
pub const MAX_FEED_SIZE: usize = 10 * 1024 * 1024;

/// Fetches feeds over HTTP with bounded time and size.
pub struct HttpFeedFetcher {
    client: Client,
    timeout: Duration,
    max_size: usize,
}

impl HttpFeedFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS).min(timeout))
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            timeout,
            max_size: MAX_FEED_SIZE,
        })
    }

    pub fn with_max_size(mut self, max_size: usize) -> Self {
        self.max_size = max_size;
        self
    }

    fn classify(&self, e: reqwest::Error) -> IngestError {
        if e.is_timeout() {
            IngestError::Timeout(self.timeout)
        } else {
            IngestError::Network(e.to_string())
        }
    }

    fn too_large(&self, size: u64) -> IngestError {
        IngestError::Network(format!(
            "feed too large: {} bytes (max {} bytes)",
            size, self.max_size
        ))
    }
}

#[async_trait]
impl FeedFetcher for HttpFeedFetcher {
    async fn fetch(&self, url: &str) -> Result<Bytes, IngestError> {
        let mut response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(IngestError::Network(format!("HTTP error: {}", status)));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_size as u64 {
                return Err(self.too_large(content_length));
            }
        }

        // Content-Length may be absent or wrong, so enforce the cap while streaming
        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| self.classify(e))? {
            if body.len() + chunk.len() > self.max_size {
                return Err(self.too_large((body.len() + chunk.len()) as u64));
            }
            body.extend_from_slice(&chunk);
        }

        Ok(body.freeze())
    }
}

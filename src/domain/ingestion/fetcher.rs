use super::error::IngestError;
use async_trait::async_trait;
use bytes::Bytes;

/// Retrieves raw feed documents.
///
/// Implementations only ever fail with [`IngestError::Network`] (non-2xx
/// status, I/O failure, oversized body) or [`IngestError::Timeout`].
#[async_trait]
pub trait FeedFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Bytes, IngestError>;
}

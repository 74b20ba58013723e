pub mod error;
pub mod fetcher;
pub mod normalizer;
pub mod pipeline;

pub use error::IngestError;
pub use fetcher::FeedFetcher;
pub use normalizer::{normalize, parse_date, FeedDocument, NormalizedEntry, NormalizedFeed};
pub use pipeline::{IngestReport, IngestionPipeline};

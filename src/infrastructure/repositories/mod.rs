pub mod article_repository;
pub mod interaction_repository;
pub mod source_repository;

pub use article_repository::{ArticleRepository, PostgresArticleRepository};
pub use interaction_repository::{InteractionRepository, PostgresInteractionRepository};
pub use source_repository::{PostgresSourceRepository, SourceRepository};

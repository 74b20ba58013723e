pub mod error;
pub mod model;
pub mod service;

pub use error::InteractionServiceError;
pub use model::Interaction;
pub use service::{InteractionService, InteractionServiceApi};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct MarkReadRequest {
    pub read: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InteractionResponse {
    pub article_id: i64,
    pub read: bool,
    pub read_at: Option<DateTime<Utc>>,
    pub favorite: bool,
    pub favorite_at: Option<DateTime<Utc>>,
}

impl From<Interaction> for InteractionResponse {
    fn from(interaction: Interaction) -> Self {
        Self {
            article_id: interaction.article_id,
            read: interaction.read,
            read_at: interaction.read_at,
            favorite: interaction.favorite,
            favorite_at: interaction.favorite_at,
        }
    }
}
